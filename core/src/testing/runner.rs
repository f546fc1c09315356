use std::{
    ffi::OsString,
    io,
    path::PathBuf,
    process::Stdio,
    time::Duration,
};

use anyhow::Context as _;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWriteExt},
    process::Command,
    time::Instant,
};

use super::result::{Captured, ExecutionResult};

/// The program under judgment, with the arguments it is started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Candidate {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    stdout_capture_max_bytes: usize,
    stderr_capture_max_bytes: usize,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner {
    pub const DEFAULT_STDOUT_CAPTURE_MAX_BYTES: usize = 16 << 20;
    pub const DEFAULT_STDERR_CAPTURE_MAX_BYTES: usize = 1 << 20;
    pub const WARMUP_INPUT: &str = "\n";

    pub fn new() -> Self {
        Self {
            stdout_capture_max_bytes: Self::DEFAULT_STDOUT_CAPTURE_MAX_BYTES,
            stderr_capture_max_bytes: Self::DEFAULT_STDERR_CAPTURE_MAX_BYTES,
        }
    }

    pub fn stdout_capture_max_bytes(mut self, n: usize) -> Self {
        self.stdout_capture_max_bytes = n;
        self
    }

    pub fn stderr_capture_max_bytes(mut self, n: usize) -> Self {
        self.stderr_capture_max_bytes = n;
        self
    }

    /// Runs `candidate` once, feeding it `stdin_text` and then closing its stdin.
    ///
    /// Returns after the process exits or, when `deadline` elapses first, after
    /// killing it. A timed-out run discards whatever output was captured.
    /// `Err` is reserved for failures to spawn or to talk to the process.
    pub async fn run(
        &self,
        candidate: &Candidate,
        stdin_text: &str,
        deadline: Duration,
    ) -> anyhow::Result<ExecutionResult> {
        let start_at = Instant::now();

        // kill_on_drop: an early return below must not leave the child running.
        let mut proc = Command::new(&candidate.program)
            .args(&candidate.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn {:?}", candidate.program))?;

        let mut stdin = proc.stdin.take().context("Failed to open stdin")?;
        let stdout = proc.stdout.take().context("Failed to open stdout")?;
        let stderr = proc.stderr.take().context("Failed to open stderr")?;

        let res = {
            let fut_stdin = async move {
                let res = stdin.write_all(stdin_text.as_bytes()).await;
                drop(stdin); // NOTE: closing stdin is what signals end of input
                match res {
                    // The candidate may exit without reading its input.
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
                    r => r.context("Failed to pass input-data to stdin"),
                }
            };
            let fut_stdout = async {
                capture(stdout, self.stdout_capture_max_bytes)
                    .await
                    .context("Failed to read stdout")
            };
            let fut_stderr = async {
                capture(stderr, self.stderr_capture_max_bytes)
                    .await
                    .context("Failed to read stderr")
            };
            let fut_exit_status = async { proc.wait().await.context("Failed to wait for process") };

            tokio::time::timeout(deadline, async {
                tokio::try_join!(fut_stdin, fut_stdout, fut_stderr, fut_exit_status)
            })
            .await
        };

        match res {
            Err(_) => {
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill timed-out process: {:#}", e));
                Ok(ExecutionResult::timed_out(start_at.elapsed()))
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(((), stdout, stderr, exit_status))) => Ok(ExecutionResult::exited(
                exit_status.code(),
                stdout,
                stderr,
                start_at.elapsed(),
            )),
        }
    }

    /// Runs `candidate` once with a single newline as input and throws the outcome away,
    /// whatever it was. This absorbs first-launch latency before timed runs begin.
    pub async fn warm_up(&self, candidate: &Candidate, deadline: Duration) {
        let outcome = self.run(candidate, Self::WARMUP_INPUT, deadline).await;
        match &outcome {
            Ok(r) if r.timed_out => log::debug!("Warm-up timed out after {}ms", r.elapsed_ms()),
            Ok(r) => log::debug!(
                "Warm-up finished in {}ms (exit code {:?})",
                r.elapsed_ms(),
                r.exit_code
            ),
            Err(e) => log::debug!("Warm-up failed: {:#}", e),
        }
        drop(outcome);
    }
}

/// Reads `reader` to EOF, keeping at most `max_bytes`. The rest is drained so the
/// writer never blocks on a full pipe.
async fn capture<R>(mut reader: R, max_bytes: usize) -> io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    (&mut reader)
        .take(max_bytes as u64)
        .read_to_end(&mut buf)
        .await?;
    let dropped = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(Captured {
        text: String::from_utf8_lossy(&buf).into_owned(),
        truncated: dropped > 0,
    })
}
