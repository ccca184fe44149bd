/// How a pipeline run concluded. All three variants are success from the
/// caller's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Fingerprint unchanged; nothing was rebuilt.
    Skipped,
    /// Selection was empty; persisted markup and fingerprint were cleared.
    Cleared,
    /// Full rebuild: transcode, upload, persist.
    Built,
}
