use crate::api::error::AppError;
use crate::utils::validation::SanitizedFilename;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Local directory that receives every accepted upload.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the upload directory if needed. Safe to call on every request.
    pub async fn prepare(&self) -> Result<(), AppError> {
        prepare_upload_dir(&self.root).await
    }

    /// Where a sanitized name lands; always a direct child of the root.
    pub fn destination(&self, filename: &SanitizedFilename) -> PathBuf {
        self.root.join(filename.as_str())
    }
}

/// Ensures `path` exists as a directory and tries to make it owner-only.
pub async fn prepare_upload_dir(path: &Path) -> Result<(), AppError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(AppError::StorageUnavailable)?;

    best_effort("restrict upload dir permissions", restrict_permissions(path).await);
    Ok(())
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Removes a partially written file. A file that is already gone is fine.
pub async fn remove_partial(path: &Path) {
    let result = match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    };
    best_effort("remove partial upload", result);
}

/// Deletes the destination when dropped unless [`PartialFile::keep`] was called.
///
/// Covers the paths where no error is ever returned, such as the request
/// future being dropped when the client disconnects mid-upload.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// The upload completed; leave the file in place.
    pub fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let result = match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        };
        best_effort("remove abandoned upload", result);
    }
}

/// Runs the hardening/cleanup outcome through the log and drops it.
/// Never authoritative: the caller's own error always wins.
pub fn best_effort<T, E: std::fmt::Display>(what: &str, result: Result<T, E>) {
    if let Err(e) = result {
        debug!("Best-effort step '{}' failed: {}", what, e);
    }
}
