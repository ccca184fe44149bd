use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Disposable working directory for one pipeline run. Exclusively owned by
/// that run; reset on entry and removed on exit regardless of outcome, so no
/// stale files survive into the next run and nothing accumulates on disk.
#[derive(Clone, Debug)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// One directory per settings document. Runs for the same document are
    /// serialized by the orchestrator, so the directory is never shared.
    pub fn for_doc(temp_root: &Path, doc_id: &str) -> Self {
        Self { dir: temp_root.join(format!("favgen-{}", doc_id)) }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Recursive delete, then recreate. Idempotent.
    pub fn reset(&self) -> Result<()> {
        self.remove()?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create workspace {}", self.dir.display()))?;
        Ok(())
    }

    /// Recursive delete without recreate; a missing directory is fine.
    pub fn remove(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove workspace {}", self.dir.display())),
        }
    }
}
