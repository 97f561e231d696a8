use super::{CommandRunner, ToolCommand, ToolError, ToolOutput};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Time a terminated tool gets to exit before it is killed outright
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Runs tools as child processes with a deadline.
///
/// The child is polled rather than waited on so that the timeout and the
/// Ctrl+C flag are honoured while long wipes run. On either, the child gets
/// SIGTERM first (sudo relays it to the real tool) and SIGKILL after a grace
/// period.
pub struct SystemRunner {
    poll_interval: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
        }
    }

    fn spawn(&self, command: &ToolCommand) -> Result<Child, ToolError> {
        Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                let tool = command.tool_name().to_string();
                if e.kind() == ErrorKind::NotFound {
                    ToolError::Missing { tool }
                } else {
                    ToolError::Spawn { tool, source: e }
                }
            })
    }

    fn terminate(&self, child: &mut Child) {
        let pid = Pid::from_raw(child.id() as i32);
        if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
            tracing::warn!(pid = child.id(), error = %e, "SIGTERM failed");
        }

        let deadline = Instant::now() + TERMINATE_GRACE;
        while Instant::now() < deadline {
            if let Ok(Some(_)) = child.try_wait() {
                return;
            }
            thread::sleep(self.poll_interval);
        }

        let _ = child.kill();
        let _ = child.wait();
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput, ToolError> {
        let tool = command.tool_name().to_string();
        let mut child = self.spawn(command)?;

        // Drain both pipes concurrently so a chatty tool never blocks on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + command.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => return Err(ToolError::Spawn { tool, source: e }),
            }

            if crate::is_interrupted() {
                tracing::warn!(tool = %tool, "interrupt received, stopping tool");
                self.terminate(&mut child);
                return Err(ToolError::Interrupted { tool });
            }

            if Instant::now() >= deadline {
                tracing::warn!(tool = %tool, timeout = ?command.timeout, "tool timed out");
                self.terminate(&mut child);
                // Reader threads are left detached: a grandchild may still hold the pipes
                return Err(ToolError::TimedOut {
                    tool,
                    after: command.timeout,
                });
            }

            thread::sleep(self.poll_interval);
        };

        Ok(ToolOutput {
            stdout: collect(stdout),
            stderr: collect(stderr),
            exit_code: status.code(),
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
