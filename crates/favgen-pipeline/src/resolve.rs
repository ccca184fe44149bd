use std::path::PathBuf;
use std::sync::Arc;

use favgen_core::{PipelineError, Rendition, Selection};
use favgen_store::AssetStore;

use crate::workspace::Workspace;

/// Width and height a rendition must exceed to cover the largest target icon
/// size (196px).
const MIN_RENDITION_PX: u32 = 196;

#[derive(Clone, Debug)]
pub struct ResolvedSource {
    pub local_path: PathBuf,
    pub extension: String,
}

/// Resolves a selection to a local source file inside the workspace.
pub struct SourceResolver {
    assets: Arc<dyn AssetStore>,
}

impl SourceResolver {
    pub fn new(assets: Arc<dyn AssetStore>) -> Self {
        Self { assets }
    }

    /// Smallest catalogued rendition that still exceeds the largest icon
    /// target in both dimensions. Resizing from it is much cheaper than
    /// re-decoding the original for every run.
    fn pick_rendition(&self) -> Option<Rendition> {
        self.assets
            .renditions()
            .into_iter()
            .filter(|r| r.width > MIN_RENDITION_PX && r.height > MIN_RENDITION_PX)
            .min_by_key(|r| r.width.max(r.height))
    }

    pub fn resolve(&self, selection: &Selection, workspace: &Workspace) -> Result<ResolvedSource, PipelineError> {
        let asset = selection.asset.as_ref().ok_or(PipelineError::NotFound)?;

        // Vector sources skip rendition selection; the original scales freely.
        let remote_key = if asset.is_vector() {
            self.assets.rendition_key(asset, None, None)
        } else {
            let rendition = self.pick_rendition();
            self.assets
                .rendition_key(asset, rendition.as_ref(), selection.crop.as_ref())
        };

        let local_path = workspace.path().join(format!("original.{}", asset.extension));
        self.assets.copy_out(&remote_key, &local_path).map_err(|e| {
            match e.downcast_ref::<PipelineError>() {
                Some(PipelineError::NotFound) => PipelineError::NotFound,
                _ => PipelineError::Storage(e.to_string()),
            }
        })?;

        Ok(ResolvedSource { local_path, extension: asset.extension.clone() })
    }
}
