//! Process-backed shadow executors: shell the body out to a real `node`,
//! `python3`, or `sh` binary (§4.4 body variants 2-3), one fresh process per
//! call. Timeouts kill the child automatically (tokio's `Child` is killed
//! on drop once the `tokio::time::timeout` future is abandoned), which is
//! this crate's whole answer to §4.4's "release timers, VM contexts, and
//! subprocess handles" cleanup requirement — there is no longer-lived
//! handle to leak.

use crate::executor::{demarshal_stdout, ExecRequest, ShadowExecutor};
use crate::script::{build_js_script, build_python_script, build_shell_script};
use async_trait::async_trait;
use mlld_ast::Lang;
use mlld_errors::CommandError;
use mlld_value::Value;
use tokio::process::Command;

async fn run(mut cmd: Command, script: String, description: &str, timeout: std::time::Duration) -> Result<Value, CommandError> {
    cmd.arg(&script);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(io_err)) => {
            return Err(CommandError::CommandFailed {
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("{description} failed to spawn: {io_err}"),
            })
        }
        Err(_elapsed) => {
            return Err(CommandError::Timeout {
                seconds: timeout.as_secs(),
            })
        }
    };
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(CommandError::CommandFailed {
            exit_code: output.status.code().unwrap_or(-1),
            stdout,
            stderr,
        });
    }
    Ok(demarshal_stdout(&stdout))
}

/// `js`/`node` bodies both run under a real Node.js binary: `js` is meant
/// to read as a quick, sandboxed expression body while `node` implies full
/// CommonJS semantics, but neither distinction matters once the body is
/// handed to the same interpreter binary. One executor serves both,
/// registered twice under the two `Lang` variants.
pub struct NodeExecutor {
    pub binary: String,
    pub lang: Lang,
}

impl NodeExecutor {
    /// The `node` lang: full CommonJS semantics.
    pub fn new() -> Self {
        Self { binary: "node".to_string(), lang: Lang::Node }
    }

    /// The `js` lang: same binary, registered under `Lang::Js`.
    pub fn js() -> Self {
        Self { binary: "node".to_string(), lang: Lang::Js }
    }
}

impl Default for NodeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShadowExecutor for NodeExecutor {
    fn lang(&self) -> Lang {
        self.lang
    }

    async fn execute(&self, request: &ExecRequest) -> Result<Value, CommandError> {
        let script = build_js_script(request);
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-e");
        run(cmd, script, "node", request.timeout).await
    }
}

pub struct PythonExecutor {
    pub binary: String,
}

impl PythonExecutor {
    pub fn new() -> Self {
        Self { binary: "python3".to_string() }
    }
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShadowExecutor for PythonExecutor {
    fn lang(&self) -> Lang {
        Lang::Python
    }

    async fn execute(&self, request: &ExecRequest) -> Result<Value, CommandError> {
        let script = build_python_script(request);
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-c");
        run(cmd, script, "python3", request.timeout).await
    }
}

pub struct ShellExecutor {
    pub binary: String,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self { binary: "sh".to_string() }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShadowExecutor for ShellExecutor {
    fn lang(&self) -> Lang {
        Lang::Sh
    }

    async fn execute(&self, request: &ExecRequest) -> Result<Value, CommandError> {
        let script = build_shell_script(request);
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-c");
        run(cmd, script, "sh", request.timeout).await
    }
}
