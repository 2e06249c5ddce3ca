use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::Notify;

use crate::error::DumpError;

use super::command::DumpCommand;

/// Shared one-way "kill requested" flag.
///
/// Every clone observes the same flag. The first `kill()` flips it and wakes
/// the owner of the process; later calls are no-ops.
#[derive(Clone, Default)]
pub struct KillSwitch {
    inner: Arc<KillState>,
}

#[derive(Default)]
struct KillState {
    killed: AtomicBool,
    requested: Notify,
}

impl KillSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the kill. Returns `true` only for the call that performed the
    /// transition, so exactly one caller ever owns it.
    pub fn kill(&self) -> bool {
        let won = self
            .inner
            .killed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            // notify_one keeps a permit if nobody is waiting yet.
            self.inner.requested.notify_one();
        }
        won
    }

    pub fn is_killed(&self) -> bool {
        self.inner.killed.load(Ordering::Acquire)
    }

    /// Resolves once a kill has been requested.
    pub async fn requested(&self) {
        if self.is_killed() {
            return;
        }
        self.inner.requested.notified().await;
    }
}

impl std::fmt::Debug for KillSwitch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KillSwitch")
            .field("killed", &self.is_killed())
            .finish()
    }
}

/// A running dump process together with its kill switch.
pub struct ProcessContext {
    child: Child,
    kill: KillSwitch,
    program: String,
}

impl ProcessContext {
    /// Starts `command` with stdout and stderr piped and stdin closed.
    pub fn spawn(command: &DumpCommand) -> Result<Self, DumpError> {
        let mut cmd = Command::new(command.program());
        cmd.args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| DumpError::Launch {
            program: command.program().to_string(),
            source,
        })?;

        tracing::debug!(
            target: "dbbackup.dump",
            program = %command.program(),
            pid = ?child.id(),
            "dump process started"
        );

        Ok(Self {
            child,
            kill: KillSwitch::new(),
            program: command.program().to_string(),
        })
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    pub fn kill_switch(&self) -> KillSwitch {
        self.kill.clone()
    }

    pub fn is_killed(&self) -> bool {
        self.kill.is_killed()
    }

    /// Flags the process as killed and terminates it.
    pub fn kill(&mut self) {
        self.kill.kill();
        self.terminate();
    }

    /// Waits for the process to exit. A kill requested through any clone of
    /// the switch while waiting terminates the process first.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        if !self.kill.is_killed() {
            tokio::select! {
                status = self.child.wait() => return status,
                () = self.kill.requested() => {}
            }
        }
        self.terminate();
        self.child.wait().await
    }

    fn terminate(&mut self) {
        // Fails with InvalidInput once the child has already been reaped.
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(
                target: "dbbackup.dump",
                program = %self.program,
                error = %e,
                "kill signal not delivered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn kill_switch_transitions_once() {
        let switch = KillSwitch::new();
        assert!(!switch.is_killed());
        assert!(switch.kill());
        assert!(switch.is_killed());
        assert!(!switch.kill());
        assert!(switch.clone().is_killed());
    }

    #[tokio::test]
    async fn concurrent_kills_have_a_single_winner() {
        let switch = KillSwitch::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let s = switch.clone();
                tokio::spawn(async move { s.kill() })
            })
            .collect();
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert!(switch.is_killed());
    }

    #[tokio::test]
    async fn requested_resolves_after_an_earlier_kill() {
        let switch = KillSwitch::new();
        switch.kill();
        tokio::time::timeout(Duration::from_secs(1), switch.requested())
            .await
            .expect("kill already requested");
    }

    #[tokio::test]
    async fn spawn_reports_missing_binary() {
        let cmd = DumpCommand::new(["/nonexistent/dbbackup-test-binary"]).unwrap();
        let err = ProcessContext::spawn(&cmd).err().unwrap();
        assert!(matches!(err, DumpError::Launch { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_from_a_worker_terminates_a_waiting_process() {
        let cmd = DumpCommand::new(["sleep", "30"]).unwrap();
        let mut ctx = ProcessContext::spawn(&cmd).unwrap();
        let switch = ctx.kill_switch();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            switch.kill();
        });
        let status = tokio::time::timeout(Duration::from_secs(5), ctx.wait())
            .await
            .expect("wait must return after kill")
            .unwrap();
        assert!(!status.success());
        assert!(ctx.is_killed());
    }
}
