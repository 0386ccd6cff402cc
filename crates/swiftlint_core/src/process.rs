//! Subprocess execution with cooperative cancellation.
//!
//! Every spawned child is tracked in an [`ActiveProcesses`] set so that
//! [`ProcessRunner::kill_all`] can tear everything down at shutdown.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::ProcessError;

/// Environment variable used to select an alternate Swift toolchain.
pub const TOOLCHAIN_ENV: &str = "TOOLCHAINS";

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub cwd: Option<PathBuf>,
    /// Added on top of the inherited environment.
    pub env: HashMap<String, String>,
    /// Injected as [`TOOLCHAIN_ENV`] when set.
    pub toolchain: Option<String>,
    pub stdin: Option<String>,
    pub cancel: Option<CancellationToken>,
}

/// Captured output of a finished process.
///
/// A non-zero exit code is not an error at this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Set of live subprocesses.
#[derive(Debug, Default)]
pub struct ActiveProcesses {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, CancellationToken>>,
}

impl ActiveProcesses {
    /// Number of live processes.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn register(self: &Arc<Self>) -> ActiveGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let kill = CancellationToken::new();
        self.entries.lock().insert(id, kill.clone());
        ActiveGuard {
            id,
            kill,
            set: Arc::clone(self),
        }
    }

    /// Terminates every registered process and empties the set.
    fn kill_all(&self) -> usize {
        // Snapshot first: killed runs deregister themselves concurrently.
        let snapshot: Vec<CancellationToken> =
            self.entries.lock().drain().map(|(_, kill)| kill).collect();
        for kill in &snapshot {
            kill.cancel();
        }
        snapshot.len()
    }
}

/// Deregisters a process when its run ends, however it ends.
struct ActiveGuard {
    id: u64,
    kill: CancellationToken,
    set: Arc<ActiveProcesses>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.set.entries.lock().remove(&self.id);
    }
}

/// Spawns external processes and relays their output.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    active: Arc<ActiveProcesses>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live process set, shared by all clones of this runner.
    pub fn active(&self) -> &ActiveProcesses {
        &self.active
    }

    /// Runs `program` to completion.
    ///
    /// Fails with [`ProcessError::Aborted`] if the cancellation token fires
    /// before the spawn (nothing is launched) or while the child runs (the
    /// child is killed), and with [`ProcessError::Spawn`] if the executable
    /// cannot be launched.
    pub async fn run(
        &self,
        program: &str,
        args: &[String],
        options: RunOptions,
    ) -> Result<ProcessOutput, ProcessError> {
        let cancel = options.cancel.unwrap_or_else(CancellationToken::new);
        if cancel.is_cancelled() {
            return Err(ProcessError::Aborted);
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&options.env)
            .stdin(if options.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &options.cwd {
            command.current_dir(cwd);
        }
        if let Some(toolchain) = &options.toolchain {
            command.env(TOOLCHAIN_ENV, toolchain);
        }

        debug!("Spawning {} {:?}", program, args);
        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: program.to_string(),
            source,
        })?;
        let guard = self.active.register();

        if let (Some(text), Some(mut pipe)) = (options.stdin, child.stdin.take()) {
            tokio::spawn(async move {
                if let Err(e) = pipe.write_all(text.as_bytes()).await {
                    warn!("Failed to write stdin: {}", e);
                }
            });
        }

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = {
            let collect = async {
                tokio::try_join!(read_pipe(stdout), read_pipe(stderr), child.wait())
            };
            tokio::select! {
                result = collect => Some(result),
                _ = cancel.cancelled() => None,
                _ = guard.kill.cancelled() => None,
            }
        };

        match finished {
            Some(result) => {
                let (stdout, stderr, status) = result?;
                Ok(ProcessOutput {
                    stdout,
                    stderr,
                    exit_code: status.code().unwrap_or(1),
                })
            }
            None => {
                debug!("Killing {} after cancellation", program);
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", program, e);
                }
                Err(ProcessError::Aborted)
            }
        }
    }

    /// Terminates every live process started by this runner (or its clones).
    ///
    /// Their pending runs resolve with [`ProcessError::Aborted`].
    pub fn kill_all(&self) {
        let killed = self.active.kill_all();
        if killed > 0 {
            debug!("Terminated {} running process(es)", killed);
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_run_captures_output_and_exit_code() {
        let runner = ProcessRunner::new();
        let output = runner
            .run("sh", &sh("echo out; echo err >&2; exit 3"), RunOptions::default())
            .await
            .unwrap();

        assert_eq!(
            output,
            ProcessOutput {
                stdout: "out\n".to_string(),
                stderr: "err\n".to_string(),
                exit_code: 3,
            }
        );
        assert!(runner.active().is_empty());
    }

    #[tokio::test]
    async fn test_run_missing_program_is_spawn_error() {
        let runner = ProcessRunner::new();
        let err = runner
            .run("definitely-not-swiftlint-xyz", &[], RunOptions::default())
            .await
            .unwrap_err();

        match err {
            ProcessError::Spawn { program, source } => {
                assert_eq!(program, "definitely-not-swiftlint-xyz");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
        assert!(runner.active().is_empty());
    }

    #[tokio::test]
    async fn test_run_pre_cancelled_does_not_spawn() {
        let runner = ProcessRunner::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Would fail with a spawn error if it were launched.
        let err = runner
            .run(
                "definitely-not-swiftlint-xyz",
                &[],
                RunOptions {
                    cancel: Some(cancel),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Aborted));
    }

    #[tokio::test]
    async fn test_cancel_during_run_kills_child() {
        let runner = ProcessRunner::new();
        let cancel = CancellationToken::new();

        let task = {
            let runner = runner.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                runner
                    .run(
                        "sh",
                        &sh("sleep 30"),
                        RunOptions {
                            cancel: Some(cancel),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };

        wait_until(|| runner.active().len() == 1).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(ProcessError::Aborted)));
        assert!(runner.active().is_empty());
    }

    #[tokio::test]
    async fn test_kill_all_empties_set_and_discards_output() {
        let runner = ProcessRunner::new();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let runner = runner.clone();
                tokio::spawn(async move {
                    runner
                        .run("sh", &sh("sleep 30; echo late"), RunOptions::default())
                        .await
                })
            })
            .collect();

        wait_until(|| runner.active().len() == 3).await;
        runner.kill_all();
        assert!(runner.active().is_empty());

        for task in tasks {
            let result = tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(result, Err(ProcessError::Aborted)));
        }
        assert!(runner.active().is_empty());
    }

    #[tokio::test]
    async fn test_run_injects_toolchain_and_env() {
        let runner = ProcessRunner::new();
        let options = RunOptions {
            toolchain: Some("swift-5.10".to_string()),
            env: HashMap::from([("EXTRA".to_string(), "yes".to_string())]),
            ..Default::default()
        };

        let output = runner
            .run("sh", &sh(r#"printf '%s %s' "$TOOLCHAINS" "$EXTRA""#), options)
            .await
            .unwrap();
        assert_eq!(output.stdout, "swift-5.10 yes");
    }

    #[tokio::test]
    async fn test_run_feeds_stdin_and_uses_cwd() {
        let temp_dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();
        let options = RunOptions {
            cwd: Some(temp_dir.path().to_path_buf()),
            stdin: Some("let x = 1\n".to_string()),
            ..Default::default()
        };

        let output = runner
            .run("sh", &sh("cat; pwd"), options)
            .await
            .unwrap();

        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("let x = 1"));
        let cwd = std::fs::canonicalize(lines.next().unwrap()).unwrap();
        assert_eq!(cwd, std::fs::canonicalize(temp_dir.path()).unwrap());
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }
}
