//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `dbbackup_core::api` instead of reaching into internal modules.

pub use crate::backup::{Backup, BackupReport};
pub use crate::config::{AppConfig, BackupConfig, DumpConfig, LoggingConfig, MySqlConfig};
pub use crate::destination::{Destination, DestinationManager, ExtensionBuilder, PathDecoder};
pub use crate::dump::{
    CommandBuilder, DiagnosticSink, DumpCommand, DumpPipeline, DumpStats, KillSwitch,
    TracingSink,
};
pub use crate::error::{BackupError, ConfigError, DumpError, InvalidCommand, PathPatternError};
pub use crate::login::Login;
pub use crate::source::{ProcessSourceManager, SourceManager, DEFAULT_EXTENSION};
pub use tokio_util::sync::CancellationToken;
