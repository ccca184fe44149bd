use std::path::{Path, PathBuf};

use anyhow::Context;
use favgen_core::{AssetRef, Crop, PipelineError, Rendition};

use crate::memory::rendition_key;
use crate::traits::AssetStore;

/// Object storage backed by a local directory. Keys map to relative paths
/// under the root; the public base URL is whatever the deployment serves the
/// root under.
#[derive(Clone)]
pub struct FsAssetStore {
    root: PathBuf,
    base_url: String,
    renditions: Vec<Rendition>,
}

impl FsAssetStore {
    pub fn new(root: PathBuf, base_url: impl Into<String>, renditions: Vec<Rendition>) -> Self {
        Self { root, base_url: base_url.into(), renditions }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key.trim_start_matches('/'))
    }
}

impl AssetStore for FsAssetStore {
    fn renditions(&self) -> Vec<Rendition> {
        self.renditions.clone()
    }

    fn rendition_key(&self, asset: &AssetRef, rendition: Option<&Rendition>, crop: Option<&Crop>) -> String {
        rendition_key(asset, rendition, crop)
    }

    fn copy_out(&self, remote_key: &str, local: &Path) -> anyhow::Result<()> {
        let src = self.object_path(remote_key);
        if !src.exists() {
            return Err(PipelineError::NotFound.into());
        }
        std::fs::copy(&src, local)
            .with_context(|| format!("copy out {} -> {}", src.display(), local.display()))?;
        Ok(())
    }

    fn copy_in(&self, local: &Path, remote_key: &str) -> anyhow::Result<()> {
        let dst = self.object_path(remote_key);
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local, &dst)
            .with_context(|| format!("copy in {} -> {}", local.display(), dst.display()))?;
        Ok(())
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }
}
