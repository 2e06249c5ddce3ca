use std::time::Duration;

use crate::error::DumpError;

/// How a drain worker ended.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Reached end of stream. `units` is bytes for the compressor and lines
    /// for the diagnostic drain.
    Completed { units: u64 },
    /// Failed after somebody else had already requested the kill.
    SuppressedCancellation,
    /// First real failure; this worker requested the kill.
    Failed(std::io::Error),
}

impl WorkerOutcome {
    pub fn units(&self) -> u64 {
        match self {
            WorkerOutcome::Completed { units } => *units,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpStats {
    pub bytes_read: u64,
    pub diagnostic_lines: u64,
    pub elapsed: Duration,
}

/// Final verdict for a dump whose process ran to completion.
///
/// A compressor failure wins over the exit code: a non-zero exit is usually
/// the consequence of the kill that failure triggered.
pub fn resolve_verdict(compressor: WorkerOutcome, exit_code: i32) -> Result<u64, DumpError> {
    match compressor {
        WorkerOutcome::Failed(e) => Err(DumpError::StreamIo(e)),
        _ if exit_code != 0 => Err(DumpError::ExitCode { code: exit_code }),
        other => Ok(other.units()),
    }
}
