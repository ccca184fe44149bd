use serde::{Deserialize, Serialize};

use crate::ids::AssetId;

/// Crop applied to the source image before any rendition is requested.
/// Mirrors the relationship descriptor stored by the editing interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Reference to an uploaded asset as the editor stored it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: AssetId,
    /// Original file extension, e.g. "png", "jpg", "svg".
    pub extension: String,
}

impl AssetRef {
    pub fn is_vector(&self) -> bool {
        self.extension.eq_ignore_ascii_case("svg")
    }
}

/// The editorially chosen source image. A singleton field on the settings
/// document: zero or one asset, plus an optional crop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub asset: Option<AssetRef>,
    #[serde(default)]
    pub crop: Option<Crop>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.asset.is_none()
    }
}
