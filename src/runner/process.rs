//! Vendor process spawning and streaming.
//!
//! A [`ProcessSession`] drives one CLI invocation from spawn to exit:
//! stdout and stderr are read in raw chunks, framed into lines, decoded by
//! the adapter's parser and forwarded to an [`EventSink`]. The child's own
//! exit resolves the run, even if a descendant keeps the pipes open.
//! Cancellation sends SIGTERM once; the run still resolves through the
//! normal exit path.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{EventSink, ExitOutcome, RunContext, RunRequest, RunResult, RunState, RunStateMachine};
use crate::shell::{self, ShellFamily};
use crate::vendor::{Invocation, VendorAdapter};

/// Size of each raw read from the child's pipes.
pub const READ_CHUNK_SIZE: usize = 8192;

/// How long output is still read once the child has exited.
pub const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The binary or working directory was not found.
    #[error("Failed to start {program}: {source}")]
    NotFound {
        program: String,
        source: std::io::Error,
    },
    /// Permission denied when spawning.
    #[error("Failed to start {program}: {source}")]
    PermissionDenied {
        program: String,
        source: std::io::Error,
    },
    /// Other I/O error.
    #[error("Failed to start {program}: {source}")]
    Io {
        program: String,
        source: std::io::Error,
    },
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(program: &str, source: std::io::Error) -> Self {
        let program = program.to_string();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { program, source },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { program, source },
            _ => Self::Io { program, source },
        }
    }
}

/// Spawn an invocation through the host shell with piped output.
///
/// # Errors
///
/// Returns `SpawnError` if the process fails to spawn.
pub fn spawn_invocation(
    invocation: &Invocation,
    working_dir: Option<&Path>,
) -> Result<Child, SpawnError> {
    let mut cmd = shell::shell_command(&invocation.program, &invocation.args);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    cmd.spawn()
        .map_err(|e| SpawnError::from_io(&invocation.program, e))
}

/// One vendor run, from spawn to resolved result.
pub struct ProcessSession {
    adapter: Box<dyn VendorAdapter>,
    debug: bool,
    state: RunStateMachine,
    result: Option<RunResult>,
    termination_requests: usize,
}

impl ProcessSession {
    #[must_use]
    pub fn new(adapter: Box<dyn VendorAdapter>) -> Self {
        Self {
            adapter,
            debug: false,
            state: RunStateMachine::new(),
            result: None,
            termination_requests: 0,
        }
    }

    /// Log the command line and raw stderr at info level.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state.state()
    }

    /// Number of termination signals sent to the child.
    #[must_use]
    pub fn termination_requests(&self) -> usize {
        self.termination_requests
    }

    /// Result of the run, once resolved.
    #[must_use]
    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    /// Run the request to completion, streaming events into `sink`.
    ///
    /// Every failure is reported through the returned [`RunResult`]. A
    /// session runs once; later calls return the stored result.
    pub async fn run(&mut self, request: RunRequest, sink: &mut dyn EventSink) -> RunResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        let vendor = self.adapter.kind();
        self.state.transition(RunState::Spawning);

        if request.cancel.is_cancelled() {
            return self.resolve(RunResult::failure(
                format!("{vendor} run cancelled before start"),
                String::new(),
                None,
            ));
        }

        let invocation = self.adapter.build_invocation(&request.invocation_request());
        let command_line = invocation.command_line(ShellFamily::host());
        if self.debug {
            tracing::info!(vendor = %vendor, command = %command_line, "Spawning vendor CLI");
        } else {
            tracing::debug!(vendor = %vendor, command = %command_line, "Spawning vendor CLI");
        }

        let working_dir = self.adapter.working_dir();
        let mut child = match spawn_invocation(&invocation, working_dir.as_deref()) {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(vendor = %vendor, error = %e, "Spawn failed");
                return self.resolve(RunResult::failure(e.to_string(), String::new(), None));
            }
        };

        self.state.transition(RunState::Streaming);
        let mut ctx = RunContext::new(
            vendor,
            self.adapter.parser(),
            self.adapter.parses_stderr(),
        );
        let outcome = self.stream(&mut child, &mut ctx, &request.cancel, sink).await;
        ctx.drain(sink);

        let stats = ctx.stats();
        tracing::debug!(
            vendor = %vendor,
            outcome = ?outcome,
            lines = stats.lines,
            events = stats.events,
            sink_failures = stats.sink_failures,
            "Vendor process exited"
        );

        self.resolve(ctx.finish(&outcome))
    }

    /// Pump both pipes until the child has exited.
    ///
    /// The child's exit moves the run to Draining. Output already buffered in
    /// the pipes is still read, but a descendant holding them open only gets
    /// [`PIPE_DRAIN_GRACE`] before they are dropped.
    async fn stream(
        &mut self,
        child: &mut Child,
        ctx: &mut RunContext,
        cancel: &CancellationToken,
        sink: &mut dyn EventSink,
    ) -> ExitOutcome {
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut stdout_open = stdout.is_some();
        let mut stderr_open = stderr.is_some();
        let mut watching_cancel = true;
        let mut exit: Option<ExitOutcome> = None;
        let mut drain_deadline: Option<Instant> = None;
        let mut stdout_buf = vec![0u8; READ_CHUNK_SIZE];
        let mut stderr_buf = vec![0u8; READ_CHUNK_SIZE];

        loop {
            if !stdout_open && !stderr_open {
                if let Some(outcome) = exit.take() {
                    return outcome;
                }
            }

            tokio::select! {
                read = read_chunk(&mut stdout, &mut stdout_buf), if stdout_open => match read {
                    Ok(0) => stdout_open = false,
                    Ok(n) => ctx.on_stdout(&stdout_buf[..n], sink),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdout");
                        stdout_open = false;
                    }
                },
                read = read_chunk(&mut stderr, &mut stderr_buf), if stderr_open => match read {
                    Ok(0) => stderr_open = false,
                    Ok(n) => {
                        let chunk = &stderr_buf[..n];
                        if self.debug {
                            tracing::info!(stderr = %String::from_utf8_lossy(chunk).trim_end(), "Vendor stderr");
                        } else {
                            tracing::trace!(stderr = %String::from_utf8_lossy(chunk).trim_end(), "Vendor stderr");
                        }
                        ctx.on_stderr(chunk, sink);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stderr");
                        stderr_open = false;
                    }
                },
                status = child.wait(), if exit.is_none() => {
                    self.state.transition(RunState::Draining);
                    exit = Some(match status {
                        Ok(status) => ExitOutcome::from(status),
                        Err(e) => ExitOutcome::WaitFailed(e.to_string()),
                    });
                    if stdout_open || stderr_open {
                        drain_deadline = Some(Instant::now() + PIPE_DRAIN_GRACE);
                    }
                },
                () = cancel.cancelled(), if watching_cancel && exit.is_none() => {
                    watching_cancel = false;
                    self.request_termination(child);
                },
                () = sleep_until(drain_deadline), if drain_deadline.is_some() => {
                    tracing::debug!(
                        vendor = %self.adapter.kind(),
                        "Output pipes still held open after exit, closing them"
                    );
                    stdout_open = false;
                    stderr_open = false;
                },
            }
        }
    }

    fn request_termination(&mut self, child: &mut Child) {
        if self.termination_requests > 0 {
            return;
        }
        self.termination_requests += 1;
        tracing::info!(vendor = %self.adapter.kind(), "Cancellation requested, terminating");
        if let Err(e) = terminate(child) {
            tracing::warn!(error = %e, "Failed to signal vendor process");
        }
    }

    fn resolve(&mut self, result: RunResult) -> RunResult {
        self.state.transition(RunState::Resolved);
        self.result = Some(result.clone());
        result
    }
}

impl std::fmt::Debug for ProcessSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSession")
            .field("vendor", &self.adapter.kind())
            .field("debug", &self.debug)
            .field("state", &self.state.state())
            .field("termination_requests", &self.termination_requests)
            .finish_non_exhaustive()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn read_chunk<R>(reader: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => Ok(0),
    }
}

/// Ask the child to exit: SIGTERM on Unix, a hard kill elsewhere.
#[cfg(unix)]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    match child.id() {
        Some(pid) => {
            let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
            kill(nix_pid, Signal::SIGTERM).map_err(std::io::Error::from)
        }
        // Already reaped.
        None => Ok(()),
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
