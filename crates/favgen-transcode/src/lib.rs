use std::path::Path;

use favgen_core::IconFile;

/// Adapter seam for the external image-processing tool.
///
/// A single call emits every requested size from one decoded source, as PNG,
/// shrink-to-fit (a source smaller than a target is never enlarged). No
/// partial output set is usable: implementations fail the whole call if any
/// size cannot be produced.
pub trait Transcoder: Send + Sync {
    fn transcode(&self, source: &Path, out_dir: &Path, sizes: &[u32]) -> anyhow::Result<Vec<IconFile>>;
}
