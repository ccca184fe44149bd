use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::selection::{AssetRef, Crop, Selection};

/// Stored fingerprint value for a document that has no generated favicons.
pub const UNSET_FINGERPRINT: &str = "unset";

#[derive(Serialize)]
struct FingerprintInput<'a> {
    asset: Option<&'a AssetRef>,
    crop: &'a Option<Crop>,
}

/// Deterministic digest of a selection, used as the idempotency key.
/// Equal selections always hash identically; any change to the asset or
/// the crop changes the result. Callers handle empty selections before
/// consulting the fingerprint; clearing stores [`UNSET_FINGERPRINT`] instead.
pub fn fingerprint(selection: &Selection) -> String {
    let input = FingerprintInput {
        asset: selection.asset.as_ref(),
        crop: &selection.crop,
    };
    let canonical = serde_json::to_vec(&input).expect("fingerprint input always serializes");
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}

/// The sole idempotency gate: rebuild only when the selection's fingerprint
/// differs from the one stored at the last successful run.
pub fn needs_rebuild(current: &str, previous: &str) -> bool {
    current != previous
}
