use dbbackup_core::api::{BackupError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("setup failed: {0:#}")]
    Setup(#[from] anyhow::Error),

    #[error("{0}")]
    Backup(#[from] BackupError),

    #[error("failed to render report: {0}")]
    Report(#[from] serde_json::Error),
}

impl CliError {
    /// 1 for anything the user can fix by changing arguments or config,
    /// 2 for failures while running the backup.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Setup(_) => 1,
            CliError::Backup(e) if e.is_invalid_input() => 1,
            CliError::Backup(_) | CliError::Logging(_) | CliError::Report(_) => 2,
        }
    }
}
