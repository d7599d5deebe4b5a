//! Command execution boundary.
//!
//! Every filesystem probe and mutation goes through a spawned command so
//! that protected locations behave exactly like unprotected ones, just with
//! a different privilege level. Unelevated runs pass their argument vector
//! straight to the OS with no shell in between; elevated runs are rendered
//! to a single quoted string exactly once, in [`CommandLine::render`], and
//! wrapped by the platform's privilege helper.

#[cfg(any(test, feature = "test-helpers"))]
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::{Command, Output, Stdio};
#[cfg(any(test, feature = "test-helpers"))]
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::errors::LinkError;
use crate::platform;

/// Privilege level for a single command run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    None,
    Admin,
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Elevation::None => write!(f, "user"),
            Elevation::Admin => write!(f, "admin"),
        }
    }
}

/// A program plus its argument vector, kept structural until the last
/// possible moment so paths never pass through ad-hoc string splicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<OsString>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        CommandLine {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Render to one `sh`-compatible line with every word quoted. This is
    /// the single place quoting happens; callers never pre-quote arguments.
    /// Non-UTF-8 arguments are refused rather than mangled.
    pub fn render(&self) -> Result<String, LinkError> {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.clone());
        for arg in &self.args {
            match arg.to_str() {
                Some(s) => words.push(s.to_owned()),
                None => {
                    return Err(LinkError::CommandRender {
                        detail: format!(
                            "argument of '{}' is not valid UTF-8: {:?}",
                            self.program, arg
                        ),
                    });
                }
            }
        }
        Ok(shell_words::join(&words))
    }
}

impl fmt::Display for CommandLine {
    /// Lossy rendering for logs only. Execution never uses this form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of one command run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl ExecOutput {
    pub fn ok() -> Self {
        ExecOutput {
            success: true,
            ..ExecOutput::default()
        }
    }

    pub fn ok_with(stdout: impl Into<String>) -> Self {
        ExecOutput {
            stdout: stdout.into(),
            success: true,
            ..ExecOutput::default()
        }
    }

    pub fn fail(stderr: impl Into<String>) -> Self {
        ExecOutput {
            stderr: stderr.into(),
            success: false,
            ..ExecOutput::default()
        }
    }

    pub(crate) fn spawn_failure(program: &str, err: &std::io::Error) -> Self {
        ExecOutput::fail(format!("failed to spawn {program}: {err}"))
    }

    pub fn failed(&self) -> bool {
        !self.success
    }

    /// Stdout and stderr glued together and trimmed, for messages and logs.
    pub fn combined(&self) -> String {
        let mut all = String::new();
        let out = self.stdout.trim();
        let err = self.stderr.trim();
        all.push_str(out);
        if !out.is_empty() && !err.is_empty() {
            all.push('\n');
        }
        all.push_str(err);
        all
    }

    /// True when the output carries one of the platform's markers for a
    /// cancelled or failed authorization prompt.
    pub fn cancelled(&self) -> bool {
        let all = self.combined().to_lowercase();
        platform::AUTH_CANCEL_MARKERS
            .iter()
            .any(|marker| all.contains(marker))
    }
}

impl From<Output> for ExecOutput {
    fn from(out: Output) -> Self {
        ExecOutput {
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
            success: out.status.success(),
        }
    }
}

/// Runs [`CommandLine`]s at a chosen privilege level.
///
/// Spawn failures (missing binary, resource limits) fold into a failed
/// [`ExecOutput`] carrying the OS error text; `Err` is reserved for requests
/// that cannot even be composed, such as non-UTF-8 arguments in an elevated
/// run.
pub trait CommandRunner: Send + Sync {
    fn run(&self, cmd: &CommandLine, elevate: Elevation) -> Result<ExecOutput, LinkError>;
}

/// The production runner: spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &CommandLine, elevate: Elevation) -> Result<ExecOutput, LinkError> {
        let invocation = match elevate {
            Elevation::None => cmd.clone(),
            Elevation::Admin => {
                let line = cmd.render()?;
                platform::elevated_invocation(&line)
            }
        };
        trace!(cmd = %invocation, level = %elevate, "spawn");
        let spawned = Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .output();
        let out = match spawned {
            Ok(raw) => ExecOutput::from(raw),
            Err(err) => ExecOutput::spawn_failure(invocation.program(), &err),
        };
        if out.failed() {
            debug!(cmd = %cmd, level = %elevate, output = %out.combined(), "command failed");
        }
        Ok(out)
    }
}

/// A runner that replays a scripted sequence of outputs and records every
/// call it sees. Drives escalation and cancellation paths in tests without
/// touching the real system.
#[cfg(any(test, feature = "test-helpers"))]
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<ExecOutput>>,
    calls: Mutex<Vec<(String, Elevation)>>,
}

#[cfg(any(test, feature = "test-helpers"))]
impl ScriptedRunner {
    pub fn new() -> Self {
        ScriptedRunner::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = ExecOutput>) -> Self {
        let runner = ScriptedRunner::new();
        runner.enqueue_all(responses);
        runner
    }

    pub fn enqueue(&self, response: ExecOutput) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn enqueue_all(&self, responses: impl IntoIterator<Item = ExecOutput>) {
        let mut queue = self.responses.lock().unwrap();
        queue.extend(responses);
    }

    /// Every call made so far, as (display form, elevation) pairs.
    pub fn calls(&self) -> Vec<(String, Elevation)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl CommandRunner for ScriptedRunner {
    fn run(&self, cmd: &CommandLine, elevate: Elevation) -> Result<ExecOutput, LinkError> {
        self.calls
            .lock()
            .unwrap()
            .push((cmd.to_string(), elevate));
        let scripted = self.responses.lock().unwrap().pop_front();
        // An exhausted script answers success; tests that care about a
        // response enqueue it explicitly.
        Ok(scripted.unwrap_or_else(ExecOutput::ok))
    }
}
