//! Backup destinations: `scheme://path` addresses and the managers that
//! deliver an archive to them.

mod path;

use std::path::Path;

use async_trait::async_trait;

use crate::error::BackupError;

pub use path::{ExtensionBuilder, PathDecoder};

/// A parsed `scheme://path` address. The path may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    scheme: String,
    path: String,
}

impl Destination {
    pub fn parse(dest: &str) -> Result<Self, BackupError> {
        let index = match dest.find(':') {
            Some(i) if i > 0 => i,
            _ => {
                return Err(BackupError::InvalidArgument(format!(
                    "destination type is missing in {dest}"
                )))
            }
        };
        let path = dest[index + 1..].strip_prefix("//").ok_or_else(|| {
            BackupError::InvalidArgument(format!(
                "destination has not the right format: {dest} does not match type://path"
            ))
        })?;
        Ok(Self {
            scheme: dest[..index].to_string(),
            path: path.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
pub trait DestinationManager: Send + Sync {
    /// URI scheme served by this manager, e.g. `file`.
    fn scheme(&self) -> &str;

    /// Resolves a templated destination path into the concrete target the
    /// archive will be sent to. Runs before the dump starts, so a bad
    /// destination never costs a dump.
    fn validate(&self, path: &str, extension: &ExtensionBuilder) -> Result<String, BackupError>;

    /// Delivers the archive at `archive` (`size` bytes) to `target` and
    /// returns a human-readable report.
    async fn send(&self, archive: &Path, size: u64, target: &str) -> Result<String, BackupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_and_templated_path() {
        let path = "gkfsdjg-Sp_c/{d=%y}/photos-{d=%d-%m}";
        let dest = Destination::parse(&format!("dropbox://{path}")).unwrap();
        assert_eq!(dest.scheme(), "dropbox");
        assert_eq!(dest.path(), path);
    }

    #[test]
    fn empty_path_is_allowed() {
        let dest = Destination::parse("xxx://").unwrap();
        assert_eq!(dest.scheme(), "xxx");
        assert_eq!(dest.path(), "");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "gdfsjmlk", "://x", "file:/tmp", "file:"] {
            assert!(
                matches!(Destination::parse(bad), Err(BackupError::InvalidArgument(_))),
                "{bad} should be rejected"
            );
        }
    }
}
