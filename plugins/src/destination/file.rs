use std::path::{Path, PathBuf};

use async_trait::async_trait;

use dbbackup_core::api::{BackupError, DestinationManager, ExtensionBuilder, PathDecoder};

pub const SCHEME: &str = "file";

/// Saves archives on the local filesystem. Destination paths go through
/// [`PathDecoder`], so `file://backups/{d=%Y-%m-%d}/shop` is valid.
#[derive(Debug, Default, Clone)]
pub struct FileDestinationManager {
    decoder: PathDecoder,
}

impl FileDestinationManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DestinationManager for FileDestinationManager {
    fn scheme(&self) -> &str {
        SCHEME
    }

    fn validate(&self, path: &str, extension: &ExtensionBuilder) -> Result<String, BackupError> {
        if path.trim().is_empty() {
            return Err(BackupError::InvalidArgument(
                "file destination path is empty".to_string(),
            ));
        }
        Ok(self.decoder.decode_with(path, extension)?)
    }

    async fn send(&self, archive: &Path, _size: u64, target: &str) -> Result<String, BackupError> {
        let dest = absolute(Path::new(target))?;
        let send_err = |source| BackupError::Send {
            destination: dest.display().to_string(),
            source,
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(send_err)?;
        }
        let copied = tokio::fs::copy(archive, &dest).await.map_err(send_err)?;
        tracing::debug!(target: "dbbackup.file", path = %dest.display(), bytes = copied, "archive copied");
        Ok(format!("Saved to: {}", dest.display()))
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validate_applies_extension() {
        let m = FileDestinationManager::new();
        let ext = ExtensionBuilder::new("sql.gz");
        assert_eq!(m.validate("/tmp/backups/shop", &ext).unwrap(), "/tmp/backups/shop.sql.gz");
        assert_eq!(m.validate("/tmp/shop.gz", &ext).unwrap(), "/tmp/shop.gz");
    }

    #[test]
    fn validate_rejects_bad_patterns_and_empty_paths() {
        let m = FileDestinationManager::new();
        let ext = ExtensionBuilder::new("sql.gz");
        assert!(matches!(m.validate("x{zz=1}", &ext), Err(BackupError::PathPattern(_))));
        assert!(matches!(m.validate("", &ext), Err(BackupError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn send_copies_into_new_directories_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("archive.gz");
        std::fs::write(&archive, b"first").unwrap();
        let target = dir.path().join("nested/out/shop.sql.gz");
        let target_str = target.to_str().unwrap();

        let m = FileDestinationManager::new();
        let msg = m.send(&archive, 5, target_str).await.unwrap();
        assert_eq!(msg, format!("Saved to: {}", target.display()));
        assert_eq!(std::fs::read(&target).unwrap(), b"first");

        std::fs::write(&archive, b"second").unwrap();
        m.send(&archive, 6, target_str).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second");
    }

    #[tokio::test]
    async fn send_reports_the_destination_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist.gz");
        let target = dir.path().join("out.gz");
        let err = FileDestinationManager::new()
            .send(&missing, 0, target.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Send { .. }));
    }
}
