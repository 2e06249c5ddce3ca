use std::sync::Arc;

use anyhow::Result;

use dbbackup_core::api::{AppConfig, Backup, DumpPipeline, ProcessSourceManager};

use crate::destination::file::FileDestinationManager;
use crate::source::mysql::{self, MySqlCommandBuilder};

/// Source manager dumping MySQL databases through `mysqldump`.
pub fn build_mysql_source(cfg: &AppConfig) -> ProcessSourceManager {
    ProcessSourceManager::new(
        mysql::SCHEME,
        Arc::new(MySqlCommandBuilder::new(&cfg.mysql)),
        DumpPipeline::new(cfg.dump.clone()),
    )
}

/// A [`Backup`] with every built-in source and destination registered.
pub fn build_backup(cfg: &AppConfig) -> Result<Backup> {
    if let Some(dir) = &cfg.backup.temp_dir {
        anyhow::ensure!(dir.is_dir(), "temp dir {} is not a directory", dir.display());
    }

    let mut backup = Backup::new(&cfg.backup);
    backup.register_source(Arc::new(build_mysql_source(cfg)));
    backup.register_destination(Arc::new(FileDestinationManager::new()));

    tracing::debug!(
        sources = ?backup.source_schemes().collect::<Vec<_>>(),
        destinations = ?backup.destination_schemes().collect::<Vec<_>>(),
        "backup registry built"
    );
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbbackup_core::api::SourceManager;

    #[test]
    fn registers_builtin_schemes() {
        let backup = build_backup(&AppConfig::default()).unwrap();
        assert_eq!(backup.source_schemes().collect::<Vec<_>>(), vec!["mysql"]);
        assert_eq!(backup.destination_schemes().collect::<Vec<_>>(), vec!["file"]);
    }

    #[test]
    fn mysql_source_uses_sql_gz() {
        let source = build_mysql_source(&AppConfig::default());
        assert_eq!(source.scheme(), "mysql");
        assert_eq!(source.extension(), "sql.gz");
    }

    #[test]
    fn rejects_missing_temp_dir() {
        let mut cfg = AppConfig::default();
        cfg.backup.temp_dir = Some("/definitely/not/a/dir".into());
        assert!(build_backup(&cfg).is_err());
    }
}
