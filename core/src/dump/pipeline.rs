use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::DumpConfig;
use crate::error::DumpError;

use super::command::{CommandBuilder, DumpCommand};
use super::compressor::compress;
use super::context::ProcessContext;
use super::diagnostics::{drain_diagnostics, DiagnosticSink, TracingSink};
use super::exit::normalize_exit;
use super::outcome::{resolve_verdict, DumpStats, WorkerOutcome};

/// Runs a dump command, gzip-compressing its stdout into a destination while
/// its stderr goes to a [`DiagnosticSink`].
#[derive(Clone)]
pub struct DumpPipeline {
    config: DumpConfig,
    sink: Arc<dyn DiagnosticSink>,
}

/// Why a running dump is being torn down early.
enum Stop {
    Cancelled,
    TimedOut(Duration),
}

impl DumpPipeline {
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            sink: Arc::new(TracingSink),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Builds the command for `source` and runs it. An address the builder
    /// rejects fails before any process is started.
    pub async fn run<B, W>(
        &self,
        builder: &B,
        source: &str,
        dest: W,
        cancel: CancellationToken,
    ) -> Result<DumpStats, DumpError>
    where
        B: CommandBuilder + ?Sized,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let command = builder.build_command(source)?;
        self.run_command(&command, dest, cancel).await
    }

    /// Runs an already built command.
    ///
    /// Both workers are always joined before this returns. `cancel` and the
    /// configured timeout are watched until then, including after the
    /// process exited while something else still holds its streams open.
    /// Either one kills the process and bounds the joins by `cancel_grace_ms`.
    pub async fn run_command<W>(
        &self,
        command: &DumpCommand,
        dest: W,
        cancel: CancellationToken,
    ) -> Result<DumpStats, DumpError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let started = Instant::now();
        let deadline = self.config.timeout().map(|after| (started + after, after));
        let mut ctx = ProcessContext::spawn(command)?;

        let (Some(stdout), Some(stderr)) = (ctx.take_stdout(), ctx.take_stderr()) else {
            ctx.kill();
            let _ = ctx.wait().await;
            return Err(DumpError::Launch {
                program: command.program().to_string(),
                source: std::io::Error::other("process streams were not captured"),
            });
        };

        tracing::info!(target: "dbbackup.dump", command = %command, "dump running");

        let kill = ctx.kill_switch();
        let mut compressor = Some(tokio::spawn(compress(stdout, dest, kill.clone())));
        let sink = Arc::clone(&self.sink);
        let mut diagnostics = Some(tokio::spawn(async move {
            drain_diagnostics(stderr, kill, sink.as_ref()).await
        }));

        let stop = async {
            tokio::select! {
                () = cancel.cancelled() => Stop::Cancelled,
                after = expire(deadline) => Stop::TimedOut(after),
            }
        };
        tokio::pin!(stop);

        let exited = tokio::select! {
            status = ctx.wait() => Ok(status),
            reason = &mut stop => Err(reason),
        };

        let result = match exited {
            Ok(Ok(status)) => {
                let code = normalize_exit(status);
                let joined = tokio::select! {
                    joined = async {
                        let compressed = join_worker("compressor", &mut compressor, None).await;
                        let drained = join_worker("diagnostics", &mut diagnostics, None).await;
                        (compressed, drained)
                    } => Ok(joined),
                    reason = &mut stop => Err(reason),
                };
                match joined {
                    Ok((compressed, drained)) => {
                        tracing::debug!(
                            target: "dbbackup.dump",
                            exit_code = code,
                            compressor = ?compressed,
                            diagnostics = ?drained,
                            "dump process exited"
                        );
                        resolve_verdict(compressed, code).map(|bytes_read| DumpStats {
                            bytes_read,
                            diagnostic_lines: drained.units(),
                            elapsed: started.elapsed(),
                        })
                    }
                    Err(reason) => {
                        tracing::warn!(
                            target: "dbbackup.dump",
                            exit_code = code,
                            "process exited but its streams are still open"
                        );
                        Err(self.interrupt(reason, &mut ctx, &mut compressor, &mut diagnostics).await)
                    }
                }
            }
            Ok(Err(e)) => {
                self.shutdown(&mut ctx, &mut compressor, &mut diagnostics).await;
                Err(DumpError::Wait(e))
            }
            Err(reason) => Err(self.interrupt(reason, &mut ctx, &mut compressor, &mut diagnostics).await),
        };

        match &result {
            Ok(stats) => tracing::info!(
                target: "dbbackup.dump",
                bytes = stats.bytes_read,
                diagnostic_lines = stats.diagnostic_lines,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "dump finished"
            ),
            Err(e) => self.sink.error(&format!("dump failed: {e}")),
        }
        result
    }

    async fn interrupt(
        &self,
        reason: Stop,
        ctx: &mut ProcessContext,
        compressor: &mut Option<JoinHandle<WorkerOutcome>>,
        diagnostics: &mut Option<JoinHandle<WorkerOutcome>>,
    ) -> DumpError {
        let err = match reason {
            Stop::Cancelled => {
                tracing::warn!(target: "dbbackup.dump", "backup was interrupted");
                DumpError::Cancelled
            }
            Stop::TimedOut(after) => {
                tracing::warn!(
                    target: "dbbackup.dump",
                    timeout_ms = after.as_millis() as u64,
                    "dump exceeded its timeout"
                );
                DumpError::TimedOut { after }
            }
        };
        self.shutdown(ctx, compressor, diagnostics).await;
        err
    }

    /// Kills the process, reaps it, and joins both workers, each step bounded
    /// by the grace period.
    async fn shutdown(
        &self,
        ctx: &mut ProcessContext,
        compressor: &mut Option<JoinHandle<WorkerOutcome>>,
        diagnostics: &mut Option<JoinHandle<WorkerOutcome>>,
    ) {
        let grace = self.config.cancel_grace();
        ctx.kill();
        if tokio::time::timeout(grace, ctx.wait()).await.is_err() {
            tracing::warn!(target: "dbbackup.dump", "process not reaped within grace period");
        }
        join_worker("compressor", compressor, Some(grace)).await;
        join_worker("diagnostics", diagnostics, Some(grace)).await;
    }
}

/// Resolves with the configured timeout once `deadline` passes; never
/// resolves without one.
async fn expire(deadline: Option<(Instant, Duration)>) -> Duration {
    match deadline {
        Some((at, after)) => {
            tokio::time::sleep_until(at).await;
            after
        }
        None => std::future::pending().await,
    }
}

/// Joins a worker task and clears its slot. With a bound, a task still
/// running when it expires is aborted. A panicked worker counts as a failure.
///
/// The slot stays filled if this future is dropped mid-join, so a later
/// bounded join still reaches the task. An empty slot was joined already and
/// yields `SuppressedCancellation`.
async fn join_worker(
    name: &'static str,
    slot: &mut Option<JoinHandle<WorkerOutcome>>,
    bound: Option<Duration>,
) -> WorkerOutcome {
    let Some(handle) = slot.as_mut() else {
        return WorkerOutcome::SuppressedCancellation;
    };
    let joined = match bound {
        None => handle.await,
        Some(grace) => match tokio::time::timeout(grace, &mut *handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                *slot = None;
                tracing::warn!(target: "dbbackup.dump", worker = name, "worker aborted after grace period");
                return WorkerOutcome::SuppressedCancellation;
            }
        },
    };
    *slot = None;
    joined.unwrap_or_else(|e| {
        tracing::error!(target: "dbbackup.dump", worker = name, error = %e, "worker task failed");
        WorkerOutcome::Failed(std::io::Error::other(format!("{name} worker failed: {e}")))
    })
}

impl Default for DumpPipeline {
    fn default() -> Self {
        Self::new(DumpConfig::default())
    }
}
