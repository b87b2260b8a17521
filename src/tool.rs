// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External version manager access.
//!
//! asdfsync does not manage plugins or tool versions itself. All of that is
//! delegated to an external version manager, asdf by default, that is driven
//! through its command-line interface. Only four operations are needed:
//!
//! 1. List installed plugins.
//! 2. Add a plugin, optionally from an explicit repository URL.
//! 3. Install a version of a plugin, or "latest".
//! 4. Set the global version of a plugin, or "latest".
//!
//! Every command runs to completion before the next one starts. Standard
//! output and standard error are drained together while the child runs, and
//! the child is always reaped. Output is logged line by line, and handed back
//! to the caller as a [`CommandOutput`] so the caller decides what failure
//! means.

#[cfg(test)]
pub(crate) mod fake;

use std::{
    ffi::OsString,
    fmt::{Display, Formatter, Result as FmtResult},
    process::{Output, Stdio},
    time::Duration,
};
use tokio::{process::Command, time::timeout};
use tracing::{error, info, instrument};

/// Version token that resolves to the newest available release.
pub const LATEST: &str = "latest";

/// Layer of indirection for version manager access.
#[allow(async_fn_in_trait)]
pub trait VersionManager {
    /// List names of installed plugins.
    async fn list_plugins(&self) -> Result<CommandOutput>;

    /// Add plugin, from explicit repository URL if given.
    async fn add_plugin(&self, name: &str, url: Option<&str>) -> Result<CommandOutput>;

    /// Install version of plugin.
    async fn install_version(&self, name: &str, version: &str) -> Result<CommandOutput>;

    /// Set global version of plugin.
    async fn set_global(&self, name: &str, version: &str) -> Result<CommandOutput>;
}

/// Captured result of a finished command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code. Absent if command was terminated by a signal.
    pub code: Option<i32>,

    /// Everything written to standard output.
    pub stdout: String,

    /// Everything written to standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Construct output of command that exited successfully.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Construct output of command that failed with exit code.
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Check if command exited with zero status.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Non-empty lines of standard output, trimmed.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        non_empty_lines(&self.stdout)
    }

    /// Non-empty lines of standard error, trimmed.
    pub fn stderr_lines(&self) -> impl Iterator<Item = &str> {
        non_empty_lines(&self.stderr)
    }

    /// Brief reason for failure.
    ///
    /// Uses last line of standard error when available, because that is where
    /// most command-line tools put their final diagnostic.
    pub fn failure_reason(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".into(),
        };

        match self.stderr_lines().last() {
            Some(line) => format!("{status}: {line}"),
            None => status,
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(output.stdout.as_slice()).into_owned(),
            stderr: String::from_utf8_lossy(output.stderr.as_slice()).into_owned(),
        }
    }
}

fn non_empty_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Version manager access through the asdf binary.
#[derive(Debug, Clone)]
pub struct AsdfCli {
    program: OsString,
    timeout: Option<Duration>,
}

impl AsdfCli {
    /// Construct new asdf command runner for target program.
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill any command that runs longer than given limit.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip(self), level = "debug")]
    async fn call(&self, args: &[&str]) -> Result<CommandOutput> {
        let invocation = Invocation::new(&self.program, args);
        info!("running command: {invocation}");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ToolError::Spawn {
                source: err,
                invocation: invocation.clone(),
            })?;

        // INVARIANT: Dropping the pending child on timeout kills it.
        let output = match self.timeout {
            Some(limit) => timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| ToolError::Timeout {
                    invocation: invocation.clone(),
                    limit,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|err| ToolError::Wait {
            source: err,
            invocation: invocation.clone(),
        })?;

        let output = CommandOutput::from(output);
        log_output(&output);

        Ok(output)
    }
}

impl Default for AsdfCli {
    fn default() -> Self {
        Self::new("asdf")
    }
}

impl VersionManager for AsdfCli {
    async fn list_plugins(&self) -> Result<CommandOutput> {
        self.call(&["plugin", "list"]).await
    }

    async fn add_plugin(&self, name: &str, url: Option<&str>) -> Result<CommandOutput> {
        match url {
            Some(url) => self.call(&["plugin", "add", name, url]).await,
            None => self.call(&["plugin", "add", name]).await,
        }
    }

    async fn install_version(&self, name: &str, version: &str) -> Result<CommandOutput> {
        self.call(&["install", name, version]).await
    }

    async fn set_global(&self, name: &str, version: &str) -> Result<CommandOutput> {
        self.call(&["global", name, version]).await
    }
}

fn log_output(output: &CommandOutput) {
    for line in output.stdout_lines() {
        info!("{line}");
    }

    for line in output.stderr_lines() {
        if output.is_success() {
            info!("{line}");
        } else {
            error!("{line}");
        }
    }
}

/// Printable command line of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation(String);

impl Invocation {
    fn new(program: &OsString, args: &[&str]) -> Self {
        let mut line = program.to_string_lossy().into_owned();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }

        Self(line)
    }
}

impl Display for Invocation {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.0.as_str())
    }
}

/// Version manager access error types.
///
/// A command that runs and exits with non-zero status is not an error here.
/// That is reported through [`CommandOutput`] instead.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Command cannot be started.
    #[error("failed to run {invocation}")]
    Spawn {
        #[source]
        source: std::io::Error,
        invocation: Invocation,
    },

    /// Command output cannot be collected.
    #[error("failed to wait on {invocation}")]
    Wait {
        #[source]
        source: std::io::Error,
        invocation: Invocation,
    },

    /// Command took longer than allowed.
    #[error("{invocation} did not finish within {limit:?}")]
    Timeout {
        invocation: Invocation,
        limit: Duration,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ToolError> = std::result::Result<T, E>;
