pub mod api;
pub mod backup;
pub mod config;
pub mod destination;
pub mod dump;
pub mod error;
pub mod login;
pub mod source;

pub use backup::{Backup, BackupReport};
