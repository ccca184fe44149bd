use std::path::Path;

use favgen_core::{AssetRef, Crop, DocId, GroupKey, Rendition, SettingsDoc, UserId};

/// Durable object storage holding original assets, their renditions, and the
/// published favicon files.
pub trait AssetStore: Send + Sync {
    /// Catalog of pre-generated rendition sizes available for every asset.
    fn renditions(&self) -> Vec<Rendition>;

    /// Storage key for an asset at the given rendition (None = the original),
    /// with the crop applied when present.
    fn rendition_key(&self, asset: &AssetRef, rendition: Option<&Rendition>, crop: Option<&Crop>) -> String;

    /// Download a stored object to a local path. A missing object surfaces as
    /// `PipelineError::NotFound` in the error chain.
    fn copy_out(&self, remote_key: &str, local: &Path) -> anyhow::Result<()>;

    /// Upload a local file under the given storage key.
    fn copy_in(&self, local: &Path, remote_key: &str) -> anyhow::Result<()>;

    /// Public base URL the published keys resolve under.
    fn base_url(&self) -> String;
}

/// Primary document store for settings documents and their draft/live
/// variants.
pub trait DocStore: Send + Sync {
    fn load_settings(&self, id: &DocId) -> anyhow::Result<SettingsDoc>;

    /// Write markup and fingerprint on one document. The pair is always
    /// written together.
    fn update_favicon_fields(&self, id: &DocId, links: &str, fingerprint: &str) -> anyhow::Result<()>;

    /// Write the same markup/fingerprint pair on every document sharing the
    /// group key. Returns the number of documents touched.
    fn update_group(&self, key: &GroupKey, links: &str, fingerprint: &str) -> anyhow::Result<usize>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyKind {
    Info,
    Error,
}

#[derive(Clone, Copy, Debug)]
pub struct NotifyOptions {
    pub dismiss: bool,
    pub kind: NotifyKind,
}

impl NotifyOptions {
    pub fn info() -> Self {
        Self { dismiss: true, kind: NotifyKind::Info }
    }
    pub fn error() -> Self {
        Self { dismiss: false, kind: NotifyKind::Error }
    }
}

/// Best-effort user-facing progress messages. Callers skip the call entirely
/// when no user identity is available.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user: &UserId, message: &str, options: &NotifyOptions);
}
