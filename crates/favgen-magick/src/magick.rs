use std::path::Path;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use favgen_core::{icon_file_name, IconFile};
use favgen_transcode::Transcoder;

/// ImageMagick-backed transcoder. One `convert` invocation decodes the source
/// once and clone-resize-writes every target size, so process-spawn and
/// re-decode cost stays constant regardless of the size table length.
#[derive(Clone, Debug)]
pub struct MagickTranscoder {
    pub binary: String,
}

impl Default for MagickTranscoder {
    fn default() -> Self {
        Self { binary: "convert".to_string() }
    }
}

impl MagickTranscoder {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// `convert -version` succeeds when the tool is usable.
    pub fn available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Argument list for one batch invocation. The `NxN>` geometry shrinks to
    /// fit and never enlarges; `null:` discards the intermediate image that
    /// would otherwise be convert's own output.
    pub fn build_args(source: &Path, out_dir: &Path, sizes: &[u32]) -> Vec<String> {
        let mut args = vec![source.to_string_lossy().into_owned()];
        for &size in sizes {
            args.push("(".to_string());
            args.push("-clone".to_string());
            args.push("0--1".to_string());
            args.push("-resize".to_string());
            args.push(format!("{}x{}>", size, size));
            args.push("-write".to_string());
            args.push(out_dir.join(icon_file_name(size)).to_string_lossy().into_owned());
            args.push("+delete".to_string());
            args.push(")".to_string());
        }
        args.push("null:".to_string());
        args
    }
}

impl Transcoder for MagickTranscoder {
    fn transcode(&self, source: &Path, out_dir: &Path, sizes: &[u32]) -> Result<Vec<IconFile>> {
        let args = Self::build_args(source, out_dir, sizes);
        let out = Command::new(&self.binary)
            .args(&args)
            .output()
            .with_context(|| format!("spawn {}", self.binary))?;
        if !out.status.success() {
            return Err(anyhow!(
                "{} exited with {}: {}",
                self.binary,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ));
        }

        let mut files = Vec::with_capacity(sizes.len());
        for &size in sizes {
            let path = out_dir.join(icon_file_name(size));
            if !path.exists() {
                return Err(anyhow!("{} reported success but {} is missing", self.binary, path.display()));
            }
            files.push(IconFile { size, path });
        }
        Ok(files)
    }
}
