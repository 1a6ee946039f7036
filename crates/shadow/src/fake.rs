//! A scripted fake `ShadowExecutor` for tests that exercise exec
//! invocation/pipeline plumbing without shelling out to a real language
//! runtime (§1 ambient stack: "fakes over real I/O").

use crate::executor::{ExecRequest, ShadowExecutor};
use async_trait::async_trait;
use mlld_ast::Lang;
use mlld_errors::CommandError;
use mlld_value::Value;
use parking_lot::Mutex;

/// What the fake does when called: return a fixed value, compute one from
/// the request, or fail.
pub enum FakeResponse {
    Value(Value),
    Compute(Box<dyn Fn(&ExecRequest) -> Value + Send + Sync>),
    Fail(CommandError),
}

/// Records every call it receives and replays scripted responses in order;
/// the last response repeats once the script is exhausted.
pub struct FakeShadowExecutor {
    lang: Lang,
    responses: Vec<FakeResponse>,
    calls: Mutex<Vec<ExecRequest>>,
}

impl FakeShadowExecutor {
    pub fn new(lang: Lang) -> Self {
        Self {
            lang,
            responses: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(mut self, value: Value) -> Self {
        self.responses.push(FakeResponse::Value(value));
        self
    }

    pub fn failing(mut self, error: CommandError) -> Self {
        self.responses.push(FakeResponse::Fail(error));
        self
    }

    pub fn computing(mut self, f: impl Fn(&ExecRequest) -> Value + Send + Sync + 'static) -> Self {
        self.responses.push(FakeResponse::Compute(Box::new(f)));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<ExecRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ShadowExecutor for FakeShadowExecutor {
    fn lang(&self) -> Lang {
        self.lang
    }

    async fn execute(&self, request: &ExecRequest) -> Result<Value, CommandError> {
        let index = {
            let mut calls = self.calls.lock();
            calls.push(request.clone());
            (calls.len() - 1).min(self.responses.len().saturating_sub(1))
        };
        match self.responses.get(index) {
            Some(FakeResponse::Value(v)) => Ok(v.clone()),
            Some(FakeResponse::Compute(f)) => Ok(f(request)),
            Some(FakeResponse::Fail(e)) => Err(clone_command_error(e)),
            None => Ok(Value::null()),
        }
    }
}

fn clone_command_error(e: &CommandError) -> CommandError {
    match e {
        CommandError::CommandFailed { exit_code, stdout, stderr } => CommandError::CommandFailed {
            exit_code: *exit_code,
            stdout: stdout.clone(),
            stderr: stderr.clone(),
        },
        CommandError::Timeout { seconds } => CommandError::Timeout { seconds: *seconds },
    }
}
