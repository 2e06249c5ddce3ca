use std::time::Duration;

use thiserror::Error;

/// A source address that cannot be turned into a dump command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid command: {reason}")]
pub struct InvalidCommand {
    pub reason: String,
}

impl InvalidCommand {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    InvalidCommand(#[from] InvalidCommand),

    #[error("failed to spawn process: {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error while streaming dump output")]
    StreamIo(#[source] std::io::Error),

    #[error("failed to wait for dump process")]
    Wait(#[source] std::io::Error),

    #[error("process failed with code {code}")]
    ExitCode { code: i32 },

    #[error("dump was cancelled")]
    Cancelled,

    #[error("dump timed out after {}ms", .after.as_millis())]
    TimedOut { after: Duration },
}

impl DumpError {
    /// True for failures caused by a bad source address rather than by IO.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, DumpError::InvalidCommand(_))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathPatternError {
    #[error("{name} is not a valid pattern name")]
    UnknownPattern { name: String },

    #[error("{value} is not a valid value for date pattern")]
    InvalidDatePattern { value: String },

    #[error("no {name} environment variable defined")]
    MissingEnvVar { name: String },

    #[error("file {path} does not exist")]
    MissingFile { path: String },

    #[error("unable to read file {path}: {reason}")]
    UnreadableFile { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    PathPattern(#[from] PathPatternError),

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error("failed to send backup to {destination}")]
    Send {
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackupError {
    /// Mirrors the CLI split between rejected arguments and runtime failures.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            BackupError::InvalidArgument(_) | BackupError::PathPattern(_) => true,
            BackupError::Dump(e) => e.is_invalid_input(),
            BackupError::Send { .. } | BackupError::Io(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}
