use async_compression::tokio::write::GzipEncoder;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufWriter};

use super::context::KillSwitch;
use super::outcome::WorkerOutcome;

/// Copies the dump's primary stream through gzip into `dest`.
///
/// On clean end of stream the gzip trailer is written, so `dest` holds a
/// complete archive. On an IO failure the worker requests the kill; if the
/// kill had already been requested the failure is an expected side effect
/// and is suppressed.
pub async fn compress<R, W>(mut source: R, dest: W, kill: KillSwitch) -> WorkerOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut encoder = GzipEncoder::new(BufWriter::new(dest));

    let copied = async {
        let n = tokio::io::copy(&mut source, &mut encoder).await?;
        encoder.shutdown().await?;
        Ok::<u64, std::io::Error>(n)
    }
    .await;

    match copied {
        Ok(n) => {
            tracing::debug!(target: "dbbackup.dump", bytes = n, "primary stream compressed");
            WorkerOutcome::Completed { units: n }
        }
        Err(e) => {
            if kill.kill() {
                tracing::debug!(target: "dbbackup.dump", error = %e, "compressor failed, process killed");
                WorkerOutcome::Failed(e)
            } else {
                tracing::debug!(target: "dbbackup.dump", error = %e, "compressor stopped by kill");
                WorkerOutcome::SuppressedCancellation
            }
        }
    }
}
