use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The versioned target size table. Role assignment is size-driven; the list
/// is not configurable at run time.
pub const ICON_SIZES: [u32; 7] = [32, 128, 152, 167, 180, 192, 196];

/// Markup role an icon file is referenced under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IconRole {
    Icon,
    ShortcutIcon,
    TouchIcon,
}

impl IconRole {
    pub fn rel(&self) -> &'static str {
        match self {
            IconRole::Icon => "icon",
            IconRole::ShortcutIcon => "shortcut icon",
            IconRole::TouchIcon => "apple-touch-icon",
        }
    }
}

pub fn role_for_size(size: u32) -> IconRole {
    match size {
        196 => IconRole::ShortcutIcon,
        152 | 167 | 180 => IconRole::TouchIcon,
        _ => IconRole::Icon,
    }
}

/// Generated file name for one icon size, used both locally and as the
/// storage key suffix.
pub fn icon_file_name(size: u32) -> String {
    format!("favicon-{}.png", size)
}

/// One generated output of a transcode run.
#[derive(Clone, Debug)]
pub struct IconFile {
    pub size: u32,
    pub path: PathBuf,
}
