use anyhow::{anyhow, Result};

use crate::config::Config;

/// Validate the environment before a build can be trusted: the image tool
/// must answer, and the local roots must be usable.
pub fn doctor(cfg: &Config) -> Result<()> {
    let out = std::process::Command::new(&cfg.runtime.convert_binary)
        .arg("-version")
        .output();
    match out {
        Ok(o) if o.status.success() => {}
        _ => {
            return Err(anyhow!(
                "{} not found on PATH; install ImageMagick",
                cfg.runtime.convert_binary
            ))
        }
    }

    let temp_root = cfg.temp_root();
    std::fs::create_dir_all(&temp_root)
        .map_err(|e| anyhow!("temp root {} is not writable: {}", temp_root.display(), e))?;

    let asset_root = cfg.asset_root();
    std::fs::create_dir_all(&asset_root)
        .map_err(|e| anyhow!("asset root {} is not writable: {}", asset_root.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_convert_binary_fails_doctor() {
        let dir = tempdir().unwrap();
        let mut cfg = Config::default_for(dir.path());
        cfg.runtime.convert_binary = "favgen-test-no-such-binary".to_string();
        let err = doctor(&cfg).unwrap_err();
        assert!(err.to_string().contains("not found on PATH"));
    }
}
