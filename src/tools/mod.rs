// External tool plumbing
//
// - ToolCommand: one fully-resolved command line with its timeout
// - CommandRunner: the seam every invocation goes through (SystemRunner in production)
// - Toolbox: builds the lsscsi / skdump / sktest / nwipe command lines from config
// - Tooling: a runner and a toolbox bundled for the operations

pub mod runner;
pub mod toolbox;

pub use runner::SystemRunner;
pub use toolbox::Toolbox;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }

    /// Run this command through a privilege prefix such as `sudo -n`
    pub fn elevated(self, prefix: &[String]) -> Self {
        let Some((wrapper, wrapper_args)) = prefix.split_first() else {
            return self;
        };

        let mut args = wrapper_args.to_vec();
        args.push(self.program);
        args.extend(self.args);

        Self {
            program: wrapper.clone(),
            args,
            timeout: self.timeout,
        }
    }

    /// The command as it would be typed in a shell (used for logs and test scripts)
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Name of the actual tool, skipping any privilege wrapper
    pub fn tool_name(&self) -> &str {
        const WRAPPERS: [&str; 3] = ["sudo", "doas", "pkexec"];
        if !WRAPPERS.contains(&self.program.as_str()) {
            return &self.program;
        }
        self.args
            .iter()
            .find(|arg| !arg.starts_with('-'))
            .map(String::as_str)
            .unwrap_or(&self.program)
    }
}

/// Captured result of a tool that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a non-zero exit into [`ToolError::NonZeroExit`]
    pub fn into_checked(self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::NonZeroExit {
                tool: command.tool_name().to_string(),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// A tool that could not be run to a usable result
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{tool} is not installed or not on PATH")]
    Missing { tool: String },

    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {}: {stderr}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    NonZeroExit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {}", humantime::format_duration(*after))]
    TimedOut { tool: String, after: Duration },

    #[error("{tool} was interrupted by the operator")]
    Interrupted { tool: String },
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolError::TimedOut { .. })
    }
}

/// Executes external commands.
///
/// `run` only fails when the process could not produce an exit status
/// (missing binary, timeout, interrupt). A non-zero exit is returned as a
/// normal [`ToolOutput`] so callers that read failure reports can see it.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError>;
}

/// A runner plus the command builder, shared by the poller and the operations
#[derive(Clone)]
pub struct Tooling {
    runner: Arc<dyn CommandRunner>,
    toolbox: Toolbox,
}

impl Tooling {
    pub fn new(runner: Arc<dyn CommandRunner>, toolbox: Toolbox) -> Self {
        Self { runner, toolbox }
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    pub fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        tracing::debug!(command = %command.command_line(), "running tool");
        let output = self.runner.run(command)?;
        tracing::debug!(
            tool = command.tool_name(),
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            "tool finished"
        );
        Ok(output)
    }

    /// Run and require exit status zero
    pub fn run_checked(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        self.run(command)?.into_checked(command)
    }
}
