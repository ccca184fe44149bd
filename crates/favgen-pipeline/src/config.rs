use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use favgen_core::Rendition;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub storage: StorageConfig,
    pub runtime: RuntimeConfig,
    #[serde(default = "default_renditions")]
    pub renditions: Vec<RenditionConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Id of the settings document the favicon selection lives on.
    pub primary_doc_id: String,
    /// Key prefix the published icon files land under.
    pub destination_dir: String,
    /// Public base URL the asset store serves under; baked into the markup.
    pub public_base_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: String,
    pub asset_root: String,
    pub temp_root: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Set when the process exists only to generate static assets; the
    /// save-hook trigger is skipped entirely in that mode.
    #[serde(default)]
    pub asset_build_only: bool,
    #[serde(default = "default_convert_binary")]
    pub convert_binary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RenditionConfig {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

fn default_convert_binary() -> String {
    "convert".to_string()
}

/// The stock rendition catalog of the hosting CMS.
fn default_renditions() -> Vec<RenditionConfig> {
    vec![
        RenditionConfig { name: "max".into(), width: 1600, height: 1600 },
        RenditionConfig { name: "full".into(), width: 1140, height: 1140 },
        RenditionConfig { name: "two-thirds".into(), width: 760, height: 760 },
        RenditionConfig { name: "one-half".into(), width: 570, height: 700 },
        RenditionConfig { name: "one-third".into(), width: 380, height: 700 },
        RenditionConfig { name: "one-sixth".into(), width: 190, height: 350 },
    ]
}

impl Config {
    pub fn default_for(root: &Path) -> Self {
        Self {
            project: ProjectConfig {
                primary_doc_id: "global".to_string(),
                destination_dir: "/favicons/".to_string(),
                public_base_url: "http://localhost:3000/uploads".to_string(),
            },
            storage: StorageConfig {
                db_path: root.join(".favgen").join("favgen.db").to_string_lossy().into_owned(),
                asset_root: root.join(".favgen").join("uploads").to_string_lossy().into_owned(),
                temp_root: "~/.favgen/tmp".to_string(),
            },
            runtime: RuntimeConfig {
                asset_build_only: false,
                convert_binary: default_convert_binary(),
            },
            renditions: default_renditions(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: Config = toml::from_str(&s).with_context(|| "parse favgen.toml")?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn config_path(root: &Path) -> PathBuf {
        root.join(".favgen").join("favgen.toml")
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.db_path).into_owned())
    }

    pub fn asset_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.asset_root).into_owned())
    }

    pub fn temp_root(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.temp_root).into_owned())
    }

    pub fn rendition_catalog(&self) -> Vec<Rendition> {
        self.renditions
            .iter()
            .map(|r| Rendition { name: r.name.clone(), width: r.width, height: r.height })
            .collect()
    }
}
