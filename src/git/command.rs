use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{humanish, GitOp, SUBMODULE_MANIFEST};
use crate::logger::trace_to_file;

/// How often a running git process is polled when a timeout is set
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why a git invocation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The process could not be started (binary missing, permission denied)
    Spawn(String),
    /// The process exited non-zero; `None` when killed by a signal
    Exit(Option<i32>),
    /// The process was killed after running longer than the configured limit
    TimedOut(Duration),
}

/// Details of a failed git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitFailure {
    pub kind: FailureKind,
    /// Exact argv, program name included
    pub argv: Vec<String>,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl GitFailure {
    /// The command line as a single string
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    /// Exit code, when the process ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            FailureKind::Exit(code) => code,
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Spawn(reason) => write!(f, "could not start git: {reason}"),
            FailureKind::Exit(Some(code)) => write!(f, "exit code {code}"),
            FailureKind::Exit(None) => write!(f, "terminated by signal"),
            FailureKind::TimedOut(after) => write!(f, "timed out after {}s", after.as_secs()),
        }
    }
}

impl fmt::Display for GitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` failed ({})", self.command_line(), self.kind)?;
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {stderr}")?;
        }
        Ok(())
    }
}

/// Trimmed stdout on success, failure details otherwise
pub type GitResult = Result<String, GitFailure>;

/// Runs [`GitOp`]s against the git CLI.
#[derive(Debug, Clone)]
pub struct Git {
    program: OsString,
    timeout: Option<Duration>,
}

impl Default for Git {
    fn default() -> Self {
        Self::new()
    }
}

impl Git {
    /// Runner using `git` from `PATH`, without a timeout
    pub fn new() -> Self {
        Self {
            program: OsString::from("git"),
            timeout: None,
        }
    }

    /// Runner using a specific git binary
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill any single invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check whether the git binary can be executed at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run one logical operation.
    ///
    /// A successful clone or pull of a repository carrying a `.gitmodules`
    /// file is followed by a submodule init (clone) or update (pull) whose
    /// result replaces the outer one.
    pub fn run(&self, dir: &Path, op: &GitOp) -> GitResult {
        let stdout = self.exec(op.args(dir))?;

        let follow_up = match op {
            GitOp::Clone(url) => Some((dir.join(humanish(url)), GitOp::SubmoduleInit)),
            GitOp::Pull => Some((dir.to_path_buf(), GitOp::SubmoduleUpdate)),
            _ => None,
        };

        match follow_up {
            Some((repo, sub_op)) if repo.join(SUBMODULE_MANIFEST).is_file() => {
                log::debug!("{} has submodules, running {}", repo.display(), sub_op.name());
                self.exec(sub_op.args(&repo)).map(|_| stdout)
            }
            _ => Ok(stdout),
        }
    }

    fn exec(&self, args: Vec<OsString>) -> GitResult {
        let argv: Vec<String> = std::iter::once(&self.program)
            .chain(args.iter())
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        log::debug!("Running: {}", argv.join(" "));
        trace_to_file(&format!("run: {}", argv.join(" ")));

        let spawned = Command::new(&self.program)
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let failure = GitFailure {
                    kind: FailureKind::Spawn(e.to_string()),
                    argv,
                    stderr: String::new(),
                };
                trace_to_file(&format!("fail: {failure}"));
                return Err(failure);
            }
        };

        let stdout = Output::default();
        let stderr = Output::default();
        let stdout_reader = child.stdout.take().map(|r| stdout.drain(r));
        let stderr_reader = child.stderr.take().map(|r| stderr.drain(r));

        let waited = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit),
            None => child.wait().map(Some),
        };

        let result = match waited {
            Err(e) => Err(GitFailure {
                kind: FailureKind::Spawn(e.to_string()),
                argv,
                stderr: String::new(),
            }),
            // Reader threads are left detached here: helpers spawned by git
            // may still hold the pipes open after git itself was killed.
            Ok(None) => Err(GitFailure {
                kind: FailureKind::TimedOut(self.timeout.unwrap_or_default()),
                argv,
                stderr: String::from_utf8_lossy(&stderr.snapshot()).into_owned(),
            }),
            Ok(Some(status)) => {
                join(stdout_reader);
                join(stderr_reader);
                finish(status, argv, stdout.snapshot(), stderr.snapshot())
            }
        };

        match &result {
            Ok(_) => trace_to_file("ok"),
            Err(failure) => trace_to_file(&format!("fail: {failure}")),
        }
        result
    }
}

fn finish(status: ExitStatus, argv: Vec<String>, stdout: Vec<u8>, stderr: Vec<u8>) -> GitResult {
    if status.success() {
        Ok(String::from_utf8_lossy(&stdout).trim_end().to_string())
    } else {
        Err(GitFailure {
            kind: FailureKind::Exit(status.code()),
            argv,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// `Ok(None)` means the deadline passed and the child was killed.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Pipe contents collected by a reader thread, readable while it still runs
#[derive(Clone, Default)]
struct Output(Arc<Mutex<Vec<u8>>>);

impl Output {
    fn drain<R: Read + Send + 'static>(&self, mut reader: R) -> JoinHandle<()> {
        let sink = self.clone();
        thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                let n = match reader.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                match sink.0.lock() {
                    Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                    Err(_) => break,
                }
            }
        })
    }

    fn snapshot(&self) -> Vec<u8> {
        self.0.lock().map(|buf| buf.clone()).unwrap_or_default()
    }
}

fn join(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        let _ = handle.join();
    }
}
