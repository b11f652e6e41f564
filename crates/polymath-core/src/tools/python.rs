//! Python execution in an external sandbox
//!
//! The code is model-authored and untrusted. It is never run in-process: the
//! configured command (normally a network-less container) receives it on
//! stdin and its output is returned as the tool result.

use super::{strip_code_fence, Tool, ToolError};
use crate::PolymathError;
use std::io::{self, ErrorKind, Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub struct PythonSandboxTool {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl PythonSandboxTool {
    pub fn new(command: Vec<String>, timeout: Duration) -> crate::Result<Self> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| PolymathError::config("tools.sandbox.command must not be empty"))?;

        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    fn run(&self, code: &str) -> Result<String, ToolError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ToolError::Execution(format!("cannot start sandbox '{}': {}", self.program, e)))?;
        let deadline = Instant::now() + self.timeout;

        // The child may never read its input
        let stdin = spawn_writer(child.stdin.take(), code.to_string());
        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                kill(&mut child);
                return Err(ToolError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(Ok(Err(e))) = stdin.map(JoinHandle::join) {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }

        let out = join_reader(stdout);
        let err = join_reader(stderr);

        if status.success() {
            let mut result = out.trim_end().to_string();
            if !err.trim().is_empty() {
                result.push_str("\n[stderr]\n");
                result.push_str(err.trim_end());
            }
            if result.is_empty() {
                result = "(no output; use print() to show results)".to_string();
            }
            Ok(result)
        } else {
            let detail = if err.trim().is_empty() { out } else { err };
            Err(ToolError::Execution(format!(
                "exit status {}: {}",
                status.code().map_or("signal".to_string(), |c| c.to_string()),
                detail.trim_end()
            )))
        }
    }
}

/// Feed `input` to the child and close its stdin
fn spawn_writer<W: Write + Send + 'static>(
    sink: Option<W>,
    input: String,
) -> Option<JoinHandle<io::Result<()>>> {
    sink.map(|mut sink| thread::spawn(move || sink.write_all(input.as_bytes())))
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<String>> {
    source.map(|mut source| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = source.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl Tool for PythonSandboxTool {
    fn name(&self) -> &str {
        "python_repl"
    }

    fn description(&self) -> &str {
        "Execute Python 3 code in an isolated sandbox and return what it prints. Input: Python source code; print() the values you need."
    }

    fn call(&self, input: &str) -> Result<String, ToolError> {
        let code = strip_code_fence(input);
        tracing::debug!(program = %self.program, code_len = code.len(), "running sandboxed code");
        self.run(code)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str, timeout: Duration) -> PythonSandboxTool {
        PythonSandboxTool::new(
            vec!["sh".to_string(), "-c".to_string(), script.to_string()],
            timeout,
        )
        .unwrap()
    }

    #[test]
    fn test_code_is_piped_to_stdin() {
        let tool = sh("cat", Duration::from_secs(5));
        assert_eq!(tool.call("```python\nprint(2 + 2)\n```").unwrap(), "print(2 + 2)");
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let tool = sh("echo 'NameError: x' >&2; exit 1", Duration::from_secs(5));
        let err = tool.call("x").unwrap_err();
        assert_eq!(err.to_string(), "execution failed: exit status 1: NameError: x");
    }

    #[test]
    fn test_timeout_kills_child() {
        let tool = sh("sleep 5", Duration::from_millis(200));
        assert!(matches!(tool.call("pass"), Err(ToolError::Timeout(_))));
    }

    #[test]
    fn test_timeout_holds_when_input_is_never_read() {
        // Far larger than a pipe buffer, so writing would block forever
        let code = "x = 1\n".repeat(400_000);
        let tool = sh("sleep 5", Duration::from_millis(200));

        let started = Instant::now();
        assert!(matches!(tool.call(&code), Err(ToolError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_large_input_is_delivered() {
        let code = "x = 1\n".repeat(100_000);
        let tool = sh("wc -c", Duration::from_secs(5));
        assert_eq!(tool.call(&code).unwrap().trim(), (code.trim_end().len()).to_string());
    }

    #[test]
    fn test_empty_command_rejected() {
        assert!(PythonSandboxTool::new(vec![], Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_missing_program() {
        let tool = PythonSandboxTool::new(
            vec!["polymath-no-such-sandbox".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(matches!(tool.call("print(1)"), Err(ToolError::Execution(_))));
    }
}
