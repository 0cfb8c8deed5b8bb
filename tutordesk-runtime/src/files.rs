use anyhow::Context;
use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create dir: {}", path.display()))
}

/// Replace `dst` with `tmp`, keeping a backup so a failed rename can be
/// rolled back. Windows `rename` fails when the destination exists, hence
/// the two-step dance.
pub fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = fs::remove_file(&backup);
        fs::rename(dst, &backup)
            .with_context(|| format!("failed rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = fs::rename(tmp, dst) {
        // Try to restore previous file if we had one.
        if backup.exists() {
            let _ = fs::rename(&backup, dst);
        }
        let _ = fs::remove_file(tmp);
        return Err(anyhow::Error::new(e).context(format!(
            "failed rename {} -> {}",
            tmp.display(),
            dst.display()
        )));
    }

    let _ = fs::remove_file(&backup);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_content_and_drops_backup() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("state.json");
        let tmp = dir.path().join("state.json.tmp");

        fs::write(&dst, b"old").unwrap();
        fs::write(&tmp, b"new").unwrap();

        replace_file(&tmp, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"new");
        assert!(!dst.with_extension("bak").exists());
        assert!(!tmp.exists());
    }

    #[test]
    fn replace_works_without_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("fresh.json");
        let tmp = dir.path().join("fresh.json.tmp");

        fs::write(&tmp, b"first").unwrap();
        replace_file(&tmp, &dst).unwrap();
        assert_eq!(fs::read(&dst).unwrap(), b"first");
    }
}
