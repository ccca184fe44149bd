use std::sync::Arc;

use favgen_core::{icon_file_name, render_links, IconFile, PipelineError};
use favgen_store::AssetStore;

/// Uploads generated icon files and synthesizes the link markup. Any upload
/// failure aborts: markup is never produced from a partial upload set.
pub struct Publisher {
    assets: Arc<dyn AssetStore>,
    destination_dir: String,
}

impl Publisher {
    pub fn new(assets: Arc<dyn AssetStore>, destination_dir: impl Into<String>) -> Self {
        Self { assets, destination_dir: destination_dir.into() }
    }

    pub fn publish(&self, outputs: &[IconFile]) -> Result<String, PipelineError> {
        for file in outputs {
            let remote_key = format!("{}{}", self.destination_dir, icon_file_name(file.size));
            self.assets
                .copy_in(&file.path, &remote_key)
                .map_err(|e| PipelineError::Storage(e.to_string()))?;
        }
        let sizes: Vec<u32> = outputs.iter().map(|f| f.size).collect();
        Ok(render_links(&self.assets.base_url(), &self.destination_dir, &sizes))
    }
}
