//! Data sources: things that can dump themselves into a file.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::File;
use tokio_util::sync::CancellationToken;

use crate::dump::{CommandBuilder, DumpPipeline, DumpStats};
use crate::error::DumpError;

/// Extension appended to destination paths that have none.
pub const DEFAULT_EXTENSION: &str = "sql.gz";

#[async_trait]
pub trait SourceManager: Send + Sync {
    /// URI scheme this manager dumps, e.g. `mysql`.
    fn scheme(&self) -> &str;

    /// Extension (without the leading dot) of the archives it produces.
    fn extension(&self) -> &str {
        DEFAULT_EXTENSION
    }

    /// Dumps `source` into `dest`, an empty file opened for writing.
    async fn save(
        &self,
        source: &str,
        dest: File,
        cancel: CancellationToken,
    ) -> Result<DumpStats, DumpError>;
}

/// A source whose dump comes from an external command.
pub struct ProcessSourceManager {
    scheme: String,
    builder: Arc<dyn CommandBuilder>,
    pipeline: DumpPipeline,
}

impl ProcessSourceManager {
    pub fn new(
        scheme: impl Into<String>,
        builder: Arc<dyn CommandBuilder>,
        pipeline: DumpPipeline,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            builder,
            pipeline,
        }
    }
}

#[async_trait]
impl SourceManager for ProcessSourceManager {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    async fn save(
        &self,
        source: &str,
        dest: File,
        cancel: CancellationToken,
    ) -> Result<DumpStats, DumpError> {
        self.pipeline
            .run(self.builder.as_ref(), source, dest, cancel)
            .await
    }
}
