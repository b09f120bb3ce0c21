//! Subprocess execution with per-call timeouts.
//!
//! Every external tool (capture utilities, `evemu-*`, `gsettings`, `pactl`,
//! `ydotool`, `xdotool`, `slurp`) is invoked through the `CommandRunner`
//! trait so probes and backends can be exercised against a fake in tests.
//!
//! `SystemRunner` spawns the child with `kill_on_drop`, so a call that hits
//! its timeout also terminates the process instead of leaving it behind.

use std::ffi::OsString;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::fallback::BackendError;

// ---------------------------------------------------------------------------
// Command description and outcome
// ---------------------------------------------------------------------------

/// A single external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined by spaces, for log lines and tests.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Why a command did not succeed.
///
/// Never escapes a probe or backend: callers log it and treat the candidate
/// as unusable.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{program} not found")]
    NotFound { program: String },

    #[error("{program} timed out after {:.1}s", .timeout.as_secs_f32())]
    TimedOut { program: String, timeout: Duration },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl From<CommandError> for BackendError {
    fn from(e: CommandError) -> Self {
        BackendError(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Runner trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion or until its timeout elapses.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError>;

    /// Returns `true` when `program` resolves to an executable on `PATH`.
    fn has_binary(&self, program: &str) -> bool;
}

/// Runs real processes via `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
        log::debug!("process: running {}", spec.command_line());

        let mut cmd = tokio::process::Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(spec.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CommandError::NotFound {
                    program: spec.program.clone(),
                })
            }
            Ok(Err(e)) => {
                return Err(CommandError::Io {
                    program: spec.program.clone(),
                    source: e,
                })
            }
            Err(_) => {
                return Err(CommandError::TimedOut {
                    program: spec.program.clone(),
                    timeout: spec.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(CommandError::Failed {
                program: spec.program.clone(),
                status: output.status.to_string(),
                stderr,
            })
        }
    }

    fn has_binary(&self, program: &str) -> bool {
        find_binary(program).is_some()
    }
}

// ---------------------------------------------------------------------------
// PATH lookup
// ---------------------------------------------------------------------------

/// Resolves `program` against `$PATH`, like `which`.
pub fn find_binary(program: &str) -> Option<PathBuf> {
    find_in_path(program, std::env::var_os("PATH")?)
}

fn find_in_path(program: &str, path: OsString) -> Option<PathBuf> {
    if program.contains('/') {
        let candidate = PathBuf::from(program);
        return is_executable(&candidate).then_some(candidate);
    }
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use super::*;

    type Responder = Box<dyn Fn(&CommandSpec) -> Result<CommandOutput, CommandError> + Send + Sync>;

    /// Records every command and answers from a scripted responder.
    /// Commands succeed with empty output unless the responder says otherwise.
    pub(crate) struct FakeRunner {
        installed: HashSet<String>,
        responder: Responder,
        delays: HashMap<String, Duration>,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl FakeRunner {
        pub(crate) fn new() -> Self {
            Self {
                installed: HashSet::new(),
                responder: Box::new(|_| Ok(CommandOutput::default())),
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn installed(mut self, programs: &[&str]) -> Self {
            self.installed.extend(programs.iter().map(|p| p.to_string()));
            self
        }

        pub(crate) fn respond<F>(mut self, f: F) -> Self
        where
            F: Fn(&CommandSpec) -> Result<CommandOutput, CommandError> + Send + Sync + 'static,
        {
            self.responder = Box::new(f);
            self
        }

        /// Makes `program` take `delay` before answering.
        pub(crate) fn delay(mut self, program: &str, delay: Duration) -> Self {
            self.delays.insert(program.to_owned(), delay);
            self
        }

        pub(crate) fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn command_lines(&self) -> Vec<String> {
            self.calls().iter().map(CommandSpec::command_line).collect()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            self.calls.lock().unwrap().push(spec.clone());
            if let Some(delay) = self.delays.get(&spec.program) {
                tokio::time::sleep(*delay).await;
            }
            (self.responder)(spec)
        }

        fn has_binary(&self, program: &str) -> bool {
            self.installed.contains(program)
        }
    }

    pub(crate) fn stdout(text: &str) -> Result<CommandOutput, CommandError> {
        Ok(CommandOutput {
            stdout: text.to_owned(),
            stderr: String::new(),
        })
    }

    pub(crate) fn failed(program: &str) -> Result<CommandOutput, CommandError> {
        Err(CommandError::Failed {
            program: program.to_owned(),
            status: "exit status: 1".to_owned(),
            stderr: String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str], timeout_ms: u64) -> CommandSpec {
        CommandSpec::new(program, Duration::from_millis(timeout_ms)).args(args.iter().copied())
    }

    #[test]
    fn command_line_joins_program_and_args() {
        let s = spec("grim", &["-g", "0,0 10x10", "out.png"], 10);
        assert_eq!(s.command_line(), "grim -g 0,0 10x10 out.png");
    }

    #[tokio::test]
    async fn successful_command_captures_stdout() {
        let out = SystemRunner
            .run(&spec("sh", &["-c", "echo hello"], 5_000))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_is_failed() {
        let err = SystemRunner
            .run(&spec("sh", &["-c", "echo oops >&2; exit 3"], 5_000))
            .await
            .unwrap_err();
        match err {
            CommandError::Failed { stderr, .. } => assert_eq!(stderr, "oops"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let err = SystemRunner
            .run(&spec("sleep", &["5"], 50))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn missing_program_is_not_found() {
        let err = SystemRunner
            .run(&spec("deskpilot-no-such-tool", &[], 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound { .. }));
    }

    #[tokio::test]
    async fn extra_env_reaches_the_child() {
        let out = SystemRunner
            .run(&spec("sh", &["-c", "echo $DESKPILOT_PROBE"], 5_000).env("DESKPILOT_PROBE", "yes"))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "yes");
    }

    #[test]
    fn find_in_path_requires_exec_bit() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        let path = dir.path().as_os_str().to_owned();

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(find_in_path("tool", path.clone()), None);

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(find_in_path("tool", path), Some(tool));
    }

    #[test]
    fn find_in_path_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ksnip")).unwrap();
        assert_eq!(find_in_path("ksnip", dir.path().as_os_str().to_owned()), None);
    }
}
