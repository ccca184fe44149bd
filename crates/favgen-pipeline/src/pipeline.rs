use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use favgen_core::{
    fingerprint, needs_rebuild, DocId, PipelineError, RunOutcome, SettingsDoc, UserId, ICON_SIZES,
};
use favgen_store::{AssetStore, DocStore, NotificationSink, NotifyOptions};
use favgen_transcode::Transcoder;

use crate::config::Config;
use crate::persist::{persist, persist_cleared};
use crate::publish::Publisher;
use crate::resolve::SourceResolver;
use crate::workspace::Workspace;

/// Sequences one favicon build: fingerprint check, then
/// reset workspace -> resolve -> transcode -> publish -> persist, with
/// unconditional workspace cleanup on exit. Runs for the same document are
/// serialized through a per-document lock; the fingerprint compare-then-write
/// happens entirely inside it.
pub struct Pipeline {
    cfg: Config,
    assets: Arc<dyn AssetStore>,
    docs: Arc<dyn DocStore>,
    transcoder: Arc<dyn Transcoder>,
    notifier: Arc<dyn NotificationSink>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Pipeline {
    pub fn new(
        cfg: Config,
        assets: Arc<dyn AssetStore>,
        docs: Arc<dyn DocStore>,
        transcoder: Arc<dyn Transcoder>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            cfg,
            assets,
            docs,
            transcoder,
            notifier,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn lock_for(&self, doc_id: &DocId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(doc_id.0.clone()).or_default().clone()
    }

    fn notify(&self, user: Option<&UserId>, message: &str, options: NotifyOptions) {
        if let Some(user) = user {
            self.notifier.notify(user, message, &options);
        }
    }

    /// Run the build for one settings document, synchronously relative to the
    /// caller. The on-demand task entry point calls this directly.
    pub fn build(&self, doc_id: &DocId, notify_user: Option<&UserId>) -> Result<RunOutcome, PipelineError> {
        let lock = self.lock_for(doc_id);
        // The lock only orders runs; a run that panicked must not wedge
        // every later build for this document.
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        let doc = self
            .docs
            .load_settings(doc_id)
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;

        if doc.selection.is_empty() {
            tracing::info!(doc = doc_id.as_str(), "selection empty, clearing generated favicon state");
            persist_cleared(self.docs.as_ref(), &doc)?;
            return Ok(RunOutcome::Cleared);
        }

        let current = fingerprint(&doc.selection);
        if !needs_rebuild(&current, &doc.favicon_fingerprint) {
            tracing::debug!(doc = doc_id.as_str(), "selection unchanged, skipping favicon build");
            return Ok(RunOutcome::Skipped);
        }

        self.notify(notify_user, "Processing favicon files...", NotifyOptions::info());

        let workspace = Workspace::for_doc(&self.cfg.temp_root(), doc_id.as_str());
        let result = self.run_steps(&workspace, &doc, &current);
        if let Err(e) = workspace.remove() {
            tracing::warn!(error = %e, "workspace cleanup after run failed");
        }

        match result {
            Ok(RunOutcome::Built) => {
                tracing::info!(doc = doc_id.as_str(), "favicon build complete");
                self.notify(notify_user, "Favicon processing complete.", NotifyOptions::info());
                Ok(RunOutcome::Built)
            }
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(doc = doc_id.as_str(), error = %e, "favicon build failed");
                self.notify(
                    notify_user,
                    "An error occurred processing the favicon files.",
                    NotifyOptions::error(),
                );
                Err(e)
            }
        }
    }

    fn run_steps(&self, workspace: &Workspace, doc: &SettingsDoc, current: &str) -> Result<RunOutcome, PipelineError> {
        workspace
            .reset()
            .map_err(|e| PipelineError::Storage(e.to_string()))?;

        let resolver = SourceResolver::new(self.assets.clone());
        let source = match resolver.resolve(&doc.selection, workspace) {
            Ok(source) => source,
            // The asset vanished between selection and download; treat like an
            // emptied selection.
            Err(PipelineError::NotFound) => {
                persist_cleared(self.docs.as_ref(), doc)?;
                return Ok(RunOutcome::Cleared);
            }
            Err(e) => return Err(e),
        };

        let outputs = self
            .transcoder
            .transcode(&source.local_path, workspace.path(), &ICON_SIZES)
            .map_err(|e| PipelineError::Processing(e.to_string()))?;

        let publisher = Publisher::new(self.assets.clone(), self.cfg.project.destination_dir.clone());
        let links = publisher.publish(&outputs)?;

        persist(self.docs.as_ref(), doc, &links, current)?;
        Ok(RunOutcome::Built)
    }

    /// Post-save trigger: fire the build on its own thread and return control
    /// immediately. The save's outcome never depends on the build's; failures
    /// are logged, which is all that can be done this side of the response.
    /// Skipped entirely in asset-generation-only mode.
    pub fn on_document_saved(self: &Arc<Self>, doc_id: DocId, user: Option<UserId>) -> Option<JoinHandle<()>> {
        if self.cfg.runtime.asset_build_only {
            tracing::debug!("asset-build-only mode, not building favicons after save");
            return None;
        }
        let pipeline = Arc::clone(self);
        Some(std::thread::spawn(move || {
            if let Err(e) = pipeline.build(&doc_id, user.as_ref()) {
                tracing::error!(doc = doc_id.as_str(), error = %e, "favicon build after save failed");
            }
        }))
    }
}
