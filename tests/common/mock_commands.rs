//! Scripted command execution for integration tests
//!
//! Every external tool call goes through `CommandRunner`, so tests replace
//! lsscsi / skdump / sktest / nwipe with canned responses keyed by the full
//! command line (privilege prefix included).

use baywipe::{CommandRunner, ToolCommand, ToolError, ToolOutput};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// One canned response
#[derive(Clone, Debug)]
pub enum Scripted {
    Output(ToolOutput),
    Missing,
    TimedOut,
}

impl Scripted {
    pub fn ok(stdout: &str) -> Self {
        Scripted::Output(ToolOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }

    pub fn exit(code: i32, stdout: &str, stderr: &str) -> Self {
        Scripted::Output(ToolOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(code),
        })
    }
}

/// Responses are consumed in order; the last one repeats forever.
/// Unscripted commands behave like a missing binary.
#[derive(Default)]
pub struct ScriptedRunner {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Replace whatever was scripted for `command_line`
    pub fn script(&self, command_line: &str, responses: Vec<Scripted>) {
        self.responses
            .lock()
            .unwrap()
            .insert(command_line.to_string(), responses.into());
    }

    pub fn respond(&self, command_line: &str, response: Scripted) {
        self.script(command_line, vec![response]);
    }

    pub fn forget(&self, command_line: &str) {
        self.responses.lock().unwrap().remove(command_line);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose command line starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        let line = command.command_line();
        self.calls.lock().unwrap().push(line.clone());

        let next = {
            let mut responses = self.responses.lock().unwrap();
            match responses.get_mut(&line) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match next {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::TimedOut) => Err(ToolError::TimedOut {
                tool: command.tool_name().to_string(),
                after: command.timeout,
            }),
            Some(Scripted::Missing) | None => Err(ToolError::Missing {
                tool: command.tool_name().to_string(),
            }),
        }
    }
}
