//! Crash-safe file replacement: write a sibling temp file, then rename.

use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Bytes already on disk under a temporary name, waiting to replace `target`.
#[derive(Debug)]
pub struct StagedFile {
    temp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    /// Write `bytes` next to `target` without touching `target`.
    pub async fn write(target: &Path, bytes: &[u8]) -> io::Result<Self> {
        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"))?;

        // A rename onto a directory fails; find out before anything is staged.
        if let Ok(meta) = tokio::fs::metadata(target).await {
            if meta.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} is a directory", target.display()),
                ));
            }
        }
        let temp = target.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Move the staged bytes into place.
    pub async fn commit(self) -> io::Result<()> {
        tokio::fs::rename(&self.temp, &self.target).await
    }

    /// Drop the staged bytes, leaving `target` untouched.
    pub async fn discard(self) {
        let _ = tokio::fs::remove_file(&self.temp).await;
    }
}

/// Replace `target` with `bytes` in one rename.
pub async fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    StagedFile::write(target, bytes).await?.commit().await
}
