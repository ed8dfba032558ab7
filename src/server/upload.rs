//! Scoped storage for uploaded batch files

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// An uploaded file written to the upload directory.
///
/// The file is removed when the guard is dropped, whichever way the request
/// finishes.
#[derive(Debug)]
pub struct TempUpload {
    path: PathBuf,
}

impl TempUpload {
    /// Write `data` under `dir` with a unique, sanitized name
    pub async fn write(dir: &Path, original_name: &str, data: &[u8]) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;

        let path = dir.join(format!("{}_{}", Uuid::new_v4().simple(), sanitize_file_name(original_name)));
        let upload = Self { path };
        tokio::fs::write(&upload.path, data).await?;

        debug!(path = %upload.path.display(), bytes = data.len(), "Stored upload");
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

/// Last path component with anything outside `[A-Za-z0-9._-]` replaced
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload.csv".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("customers.csv"), "customers.csv");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\data\\my file.csv"), "my_file.csv");
        assert_eq!(sanitize_file_name(".."), "upload.csv");
        assert_eq!(sanitize_file_name(""), "upload.csv");
    }

    #[tokio::test]
    async fn test_upload_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::write(dir.path(), "batch.csv", b"a,b\n1,2\n").await.unwrap();
        let path = upload.path().to_path_buf();

        assert!(path.exists());
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("_batch.csv"));

        drop(upload);
        assert!(!path.exists());
    }
}
