use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use favgen_core::{
    AssetRef, Crop, DocId, GroupKey, PipelineError, Rendition, SettingsDoc, UserId,
};

use crate::traits::{AssetStore, DocStore, NotificationSink, NotifyOptions};

/// In-memory asset store for tests. Objects live in a map; download and
/// upload traffic is recorded so tests can count batches.
pub struct InMemoryAssetStore {
    base_url: String,
    renditions: Vec<Rendition>,
    inner: Mutex<AssetInner>,
}

#[derive(Default)]
struct AssetInner {
    objects: HashMap<String, Vec<u8>>,
    uploads: Vec<String>,
    downloads: Vec<String>,
}

impl InMemoryAssetStore {
    pub fn new(base_url: impl Into<String>, renditions: Vec<Rendition>) -> Self {
        Self {
            base_url: base_url.into(),
            renditions,
            inner: Mutex::new(AssetInner::default()),
        }
    }

    pub fn put_object(&self, key: impl Into<String>, bytes: Vec<u8>) {
        self.inner.lock().unwrap().objects.insert(key.into(), bytes);
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().objects.get(key).cloned()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.inner.lock().unwrap().uploads.clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.inner.lock().unwrap().downloads.clone()
    }
}

impl AssetStore for InMemoryAssetStore {
    fn renditions(&self) -> Vec<Rendition> {
        self.renditions.clone()
    }

    fn rendition_key(&self, asset: &AssetRef, rendition: Option<&Rendition>, crop: Option<&Crop>) -> String {
        rendition_key(asset, rendition, crop)
    }

    fn copy_out(&self, remote_key: &str, local: &Path) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let bytes = inner
            .objects
            .get(remote_key)
            .cloned()
            .ok_or(PipelineError::NotFound)?;
        inner.downloads.push(remote_key.to_string());
        std::fs::write(local, bytes)?;
        Ok(())
    }

    fn copy_in(&self, local: &Path, remote_key: &str) -> anyhow::Result<()> {
        let bytes = std::fs::read(local)?;
        let mut inner = self.inner.lock().unwrap();
        inner.objects.insert(remote_key.to_string(), bytes);
        inner.uploads.push(remote_key.to_string());
        Ok(())
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }
}

/// Shared key scheme for asset objects: original extension preserved, crop
/// and rendition name folded into the key.
pub fn rendition_key(asset: &AssetRef, rendition: Option<&Rendition>, crop: Option<&Crop>) -> String {
    let crop_part = match crop {
        Some(c) => format!(".{}.{}.{}.{}", c.left, c.top, c.width, c.height),
        None => String::new(),
    };
    let size_part = match rendition {
        Some(r) => format!(".{}", r.name),
        None => ".original".to_string(),
    };
    format!(
        "attachments/{}{}{}.{}",
        asset.id.as_str(),
        crop_part,
        size_part,
        asset.extension
    )
}

/// In-memory document store for tests.
#[derive(Default)]
pub struct InMemoryDocStore {
    docs: Mutex<HashMap<String, SettingsDoc>>,
}

impl InMemoryDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: SettingsDoc) {
        self.docs.lock().unwrap().insert(doc.id.0.clone(), doc);
    }

    pub fn get(&self, id: &DocId) -> Option<SettingsDoc> {
        self.docs.lock().unwrap().get(&id.0).cloned()
    }
}

impl DocStore for InMemoryDocStore {
    fn load_settings(&self, id: &DocId) -> anyhow::Result<SettingsDoc> {
        self.docs
            .lock()
            .unwrap()
            .get(&id.0)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("settings doc {} not found", id.as_str()))
    }

    fn update_favicon_fields(&self, id: &DocId, links: &str, fingerprint: &str) -> anyhow::Result<()> {
        let mut docs = self.docs.lock().unwrap();
        let doc = docs
            .get_mut(&id.0)
            .ok_or_else(|| anyhow::anyhow!("settings doc {} not found", id.as_str()))?;
        doc.favicon_links = links.to_string();
        doc.favicon_fingerprint = fingerprint.to_string();
        Ok(())
    }

    fn update_group(&self, key: &GroupKey, links: &str, fingerprint: &str) -> anyhow::Result<usize> {
        let mut docs = self.docs.lock().unwrap();
        let mut touched = 0;
        for doc in docs.values_mut() {
            if doc.group_key.as_ref() == Some(key) {
                doc.favicon_links = links.to_string();
                doc.favicon_fingerprint = fingerprint.to_string();
                touched += 1;
            }
        }
        Ok(touched)
    }
}

/// Captures notifications for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(UserId, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(UserId, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, user: &UserId, message: &str, _options: &NotifyOptions) {
        self.messages
            .lock()
            .unwrap()
            .push((user.clone(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use favgen_core::{AssetId, Selection, UNSET_FINGERPRINT};
    use tempfile::tempdir;

    fn asset(id: &str, ext: &str) -> AssetRef {
        AssetRef { id: AssetId::from_str(id), extension: ext.to_string() }
    }

    #[test]
    fn copy_out_missing_object_is_not_found() {
        let store = InMemoryAssetStore::new("https://cdn.example.com", vec![]);
        let dir = tempdir().unwrap();
        let err = store
            .copy_out("attachments/nope.original.png", &dir.path().join("x.png"))
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::NotFound)));
    }

    #[test]
    fn copy_in_then_out_round_trips() {
        let store = InMemoryAssetStore::new("https://cdn.example.com", vec![]);
        let dir = tempdir().unwrap();
        let src = dir.path().join("a.png");
        std::fs::write(&src, b"png-bytes").unwrap();
        store.copy_in(&src, "favicons/favicon-32.png").unwrap();

        let dst = dir.path().join("b.png");
        store.copy_out("favicons/favicon-32.png", &dst).unwrap();
        assert_eq!(std::fs::read(dst).unwrap(), b"png-bytes");
        assert_eq!(store.uploads(), vec!["favicons/favicon-32.png".to_string()]);
    }

    #[test]
    fn rendition_key_encodes_crop_and_size() {
        let key = rendition_key(
            &asset("a1", "jpg"),
            Some(&Rendition { name: "one-third".into(), width: 760, height: 760 }),
            Some(&Crop { left: 5, top: 10, width: 300, height: 300 }),
        );
        assert_eq!(key, "attachments/a1.5.10.300.300.one-third.jpg");
    }

    #[test]
    fn group_update_touches_only_members() {
        let docs = InMemoryDocStore::new();
        let key = GroupKey::from_str("g1");
        let mut live = SettingsDoc::new(DocId::from_str("live"), Some(key.clone()));
        live.selection = Selection::default();
        docs.insert(live);
        docs.insert(SettingsDoc::new(DocId::from_str("draft"), Some(key.clone())));
        docs.insert(SettingsDoc::new(DocId::from_str("other"), None));

        let touched = docs.update_group(&key, "<link>", "fp").unwrap();
        assert_eq!(touched, 2);
        let other = docs.get(&DocId::from_str("other")).unwrap();
        assert_eq!(other.favicon_links, "");
        assert_eq!(other.favicon_fingerprint, UNSET_FINGERPRINT);
    }
}
