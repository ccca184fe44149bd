use favgen_core::{PipelineError, SettingsDoc, UNSET_FINGERPRINT};
use favgen_store::DocStore;

/// Write markup and fingerprint on the primary document, then mirror the
/// identical pair onto every document sharing its group key. A document with
/// no group key is complete after the primary write.
pub fn persist(docs: &dyn DocStore, doc: &SettingsDoc, links: &str, fingerprint: &str) -> Result<(), PipelineError> {
    docs.update_favicon_fields(&doc.id, links, fingerprint)
        .map_err(|e| PipelineError::Persistence(e.to_string()))?;
    if let Some(key) = &doc.group_key {
        docs.update_group(key, links, fingerprint)
            .map_err(|e| PipelineError::Persistence(e.to_string()))?;
    }
    Ok(())
}

/// An explicitly removed image erases previously generated markup rather than
/// leaving it behind. Clearing propagates to the group exactly like an update.
pub fn persist_cleared(docs: &dyn DocStore, doc: &SettingsDoc) -> Result<(), PipelineError> {
    persist(docs, doc, "", UNSET_FINGERPRINT)
}
