use serde::{Deserialize, Serialize};

use crate::fingerprint::UNSET_FINGERPRINT;
use crate::ids::{DocId, GroupKey};
use crate::selection::Selection;

/// A pre-generated resized copy of an original asset, as catalogued by the
/// asset store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// The settings document that owns the favicon selection and carries the
/// generated markup. Draft/live variants of the same logical document share
/// a group key.
#[derive(Clone, Debug)]
pub struct SettingsDoc {
    pub id: DocId,
    pub group_key: Option<GroupKey>,
    pub selection: Selection,
    pub favicon_links: String,
    pub favicon_fingerprint: String,
}

impl SettingsDoc {
    pub fn new(id: DocId, group_key: Option<GroupKey>) -> Self {
        Self {
            id,
            group_key,
            selection: Selection::default(),
            favicon_links: String::new(),
            favicon_fingerprint: UNSET_FINGERPRINT.to_string(),
        }
    }
}
