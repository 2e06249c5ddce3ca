use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

use crate::config::BackupConfig;
use crate::destination::{Destination, DestinationManager, ExtensionBuilder};
use crate::dump::DumpStats;
use crate::error::BackupError;
use crate::source::SourceManager;

#[derive(Debug, Clone)]
pub struct BackupReport {
    pub stats: DumpStats,
    /// One message per destination, in the order they were given.
    pub deliveries: Vec<String>,
}

/// Dumps a source into a private temporary archive, then delivers that
/// archive to every destination.
#[derive(Default)]
pub struct Backup {
    sources: HashMap<String, Arc<dyn SourceManager>>,
    destinations: HashMap<String, Arc<dyn DestinationManager>>,
    temp_dir: Option<PathBuf>,
}

struct Delivery {
    address: String,
    manager: Arc<dyn DestinationManager>,
    target: String,
}

impl Backup {
    pub fn new(cfg: &BackupConfig) -> Self {
        Self {
            temp_dir: cfg.temp_dir.clone(),
            ..Self::default()
        }
    }

    /// Registers a source manager under its scheme, replacing any previous one.
    pub fn register_source(&mut self, manager: Arc<dyn SourceManager>) {
        self.sources.insert(manager.scheme().to_string(), manager);
    }

    pub fn register_destination(&mut self, manager: Arc<dyn DestinationManager>) {
        self.destinations.insert(manager.scheme().to_string(), manager);
    }

    pub fn source_schemes(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn destination_schemes(&self) -> impl Iterator<Item = &str> {
        self.destinations.keys().map(String::as_str)
    }

    pub async fn backup(
        &self,
        source: &str,
        destinations: &[String],
        cancel: CancellationToken,
    ) -> Result<BackupReport, BackupError> {
        if destinations.is_empty() {
            return Err(BackupError::InvalidArgument(
                "at least one destination is required".to_string(),
            ));
        }

        let resolved = destinations
            .iter()
            .map(|address| {
                let dest = Destination::parse(address)?;
                let manager = self.destinations.get(dest.scheme()).ok_or_else(|| {
                    BackupError::InvalidArgument(format!("unknown protocol: {}", dest.scheme()))
                })?;
                Ok((address, dest, Arc::clone(manager)))
            })
            .collect::<Result<Vec<_>, BackupError>>()?;

        let source_manager = self.source_manager(&Destination::parse(source)?)?;
        let extension = ExtensionBuilder::new(source_manager.extension());

        let deliveries = resolved
            .into_iter()
            .map(|(address, dest, manager)| {
                let target = manager.validate(dest.path(), &extension)?;
                Ok(Delivery {
                    address: address.clone(),
                    manager,
                    target,
                })
            })
            .collect::<Result<Vec<_>, BackupError>>()?;

        let archive = self.create_temp_file()?;
        let file = tokio::fs::File::from_std(archive.as_file().try_clone()?);

        tracing::info!(
            target: "dbbackup.backup",
            scheme = source_manager.scheme(),
            destinations = deliveries.len(),
            "backup started"
        );
        let stats = source_manager.save(source, file, cancel).await?;
        let size = tokio::fs::metadata(archive.path()).await?.len();

        let mut report = BackupReport {
            stats,
            deliveries: Vec::with_capacity(deliveries.len()),
        };
        for delivery in deliveries {
            let message = delivery
                .manager
                .send(archive.path(), size, &delivery.target)
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        target: "dbbackup.backup",
                        destination = %delivery.address,
                        error = %e,
                        "delivery failed"
                    )
                })?;
            tracing::info!(target: "dbbackup.backup", destination = %delivery.address, "{message}");
            report.deliveries.push(message);
        }

        // `archive` is removed from disk when dropped here.
        Ok(report)
    }

    fn source_manager(&self, source: &Destination) -> Result<&Arc<dyn SourceManager>, BackupError> {
        self.sources.get(source.scheme()).ok_or_else(|| {
            BackupError::InvalidArgument(format!("unknown data source type: {}", source.scheme()))
        })
    }

    fn create_temp_file(&self) -> Result<NamedTempFile, BackupError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("dbbackup").suffix(".gz");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        tracing::debug!(target: "dbbackup.backup", path = %file.path().display(), "temporary archive created");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::{DumpPipeline, DumpStats};
    use crate::error::DumpError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::fs::File;
    use tokio::io::AsyncWriteExt;

    /// Writes a fixed payload without spawning anything.
    struct StaticSource {
        payload: &'static [u8],
        saves: Mutex<u32>,
    }

    #[async_trait]
    impl SourceManager for StaticSource {
        fn scheme(&self) -> &str {
            "static"
        }

        fn extension(&self) -> &str {
            "txt.gz"
        }

        async fn save(
            &self,
            _source: &str,
            mut dest: File,
            _cancel: CancellationToken,
        ) -> Result<DumpStats, DumpError> {
            *self.saves.lock().unwrap() += 1;
            dest.write_all(self.payload).await.map_err(DumpError::StreamIo)?;
            dest.flush().await.map_err(DumpError::StreamIo)?;
            Ok(DumpStats {
                bytes_read: self.payload.len() as u64,
                diagnostic_lines: 0,
                elapsed: Duration::ZERO,
            })
        }
    }

    /// Records what it was asked to deliver.
    #[derive(Default)]
    struct MemoryDestination {
        sent: Mutex<Vec<(String, Vec<u8>, PathBuf)>>,
    }

    #[async_trait]
    impl DestinationManager for MemoryDestination {
        fn scheme(&self) -> &str {
            "mem"
        }

        fn validate(&self, path: &str, extension: &ExtensionBuilder) -> Result<String, BackupError> {
            if path.contains("reject") {
                return Err(BackupError::InvalidArgument(format!("bad path {path}")));
            }
            Ok(extension.apply(path))
        }

        async fn send(&self, archive: &Path, size: u64, target: &str) -> Result<String, BackupError> {
            let bytes = std::fs::read(archive)?;
            assert_eq!(bytes.len() as u64, size);
            self.sent
                .lock()
                .unwrap()
                .push((target.to_string(), bytes, archive.to_path_buf()));
            Ok(format!("stored {target}"))
        }
    }

    fn backup_with(source: Arc<StaticSource>, dest: Arc<MemoryDestination>) -> Backup {
        let mut backup = Backup::default();
        backup.register_source(source);
        backup.register_destination(dest);
        backup
    }

    fn static_source() -> Arc<StaticSource> {
        Arc::new(StaticSource {
            payload: b"archive bytes",
            saves: Mutex::new(0),
        })
    }

    #[tokio::test]
    async fn delivers_archive_to_every_destination_then_cleans_up() {
        let dest = Arc::new(MemoryDestination::default());
        let backup = backup_with(static_source(), dest.clone());

        let report = backup
            .backup(
                "static://db",
                &["mem://a".to_string(), "mem://b.bak".to_string()],
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(report.deliveries, vec!["stored a.txt.gz", "stored b.bak"]);
        assert_eq!(report.stats.bytes_read, 13);
        let sent = dest.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, b"archive bytes".to_vec());
        assert!(!sent[0].2.exists(), "temporary archive must be deleted");
    }

    #[tokio::test]
    async fn destinations_are_validated_before_dumping() {
        let source = static_source();
        let backup = backup_with(source.clone(), Arc::new(MemoryDestination::default()));

        let err = backup
            .backup(
                "static://db",
                &["mem://ok".to_string(), "mem://reject".to_string()],
                CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::InvalidArgument(_)));
        assert_eq!(*source.saves.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_schemes_are_invalid_arguments() {
        let backup = backup_with(static_source(), Arc::new(MemoryDestination::default()));
        let cancel = CancellationToken::new;

        let err = backup
            .backup("static://db", &["ftp://x".to_string()], cancel())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown protocol: ftp"));

        let err = backup
            .backup("oracle://db", &["mem://x".to_string()], cancel())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown data source type: oracle"));

        let err = backup.backup("static://db", &[], cancel()).await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dump_failure_skips_delivery() {
        let dest = Arc::new(MemoryDestination::default());
        let mut backup = Backup::default();
        let builder = |_: &str| crate::dump::DumpCommand::new(["sh", "-c", "exit 4"]);
        backup.register_source(Arc::new(crate::source::ProcessSourceManager::new(
            "failing",
            Arc::new(builder),
            DumpPipeline::default(),
        )));
        backup.register_destination(dest.clone());

        let err = backup
            .backup("failing://x", &["mem://out".to_string()], CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Dump(DumpError::ExitCode { code: 4 })));
        assert!(dest.sent.lock().unwrap().is_empty());
    }
}
