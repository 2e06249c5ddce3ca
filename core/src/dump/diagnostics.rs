use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::context::KillSwitch;
use super::outcome::WorkerOutcome;

/// Receives the dump's diagnostic output.
pub trait DiagnosticSink: Send + Sync {
    /// One line of the process's stderr, in source order.
    fn warn(&self, line: &str);
    /// A failure of the drain itself.
    fn error(&self, message: &str);
}

/// Forwards diagnostics to `tracing` under the `dbbackup.dump` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn warn(&self, line: &str) {
        tracing::warn!(target: "dbbackup.dump", "{line}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "dbbackup.dump", "{message}");
    }
}

/// Reads the secondary stream line by line and hands every line to `sink`.
///
/// Lines are split on `\n` with a trailing `\r` removed; invalid UTF-8 is
/// replaced rather than treated as an error. A final unterminated line is
/// still forwarded.
pub async fn drain_diagnostics<R, S>(source: R, kill: KillSwitch, sink: &S) -> WorkerOutcome
where
    R: AsyncRead + Unpin,
    S: DiagnosticSink + ?Sized,
{
    let mut reader = BufReader::new(source);
    let mut buf = Vec::with_capacity(256);
    let mut lines = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => return WorkerOutcome::Completed { units: lines },
            Ok(_) => {
                sink.warn(&String::from_utf8_lossy(trim_line_end(&buf)));
                lines += 1;
            }
            Err(e) => {
                return if kill.kill() {
                    sink.error(&format!("error while reading error stream: {e}"));
                    WorkerOutcome::Failed(e)
                } else {
                    WorkerOutcome::SuppressedCancellation
                };
            }
        }
    }
}

fn trim_line_end(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
