use super::*;
use crate::context::{PipelineVars, StageContext};
use crate::invoker::{StageInvoker, StageResult, StageSpec};
use async_trait::async_trait;
use mlld_errors::EvalError;
use parking_lot::Mutex;

/// A scripted invoker: stage N's script is a queue of canned outcomes,
/// consumed one per call. A stage with an empty queue always completes by
/// echoing its input back.
struct ScriptedInvoker {
    scripts: Mutex<std::collections::HashMap<usize, Vec<StageResult>>>,
    source_script: Mutex<Vec<Value>>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedInvoker {
    fn new(scripts: std::collections::HashMap<usize, Vec<StageResult>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            source_script: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StageInvoker for ScriptedInvoker {
    async fn invoke_transformer(
        &self,
        stage_index: usize,
        _spec: &StageSpec,
        input: &Value,
        _ctx: &StageContext,
        _pipeline: &PipelineVars,
    ) -> Result<StageResult, EvalError> {
        self.calls.lock().push(stage_index);
        let mut scripts = self.scripts.lock();
        let queue = scripts.entry(stage_index).or_default();
        if queue.is_empty() {
            Ok(StageResult::Complete(input.clone()))
        } else {
            Ok(queue.remove(0))
        }
    }

    async fn reinvoke_source(&self) -> Result<Value, EvalError> {
        let mut script = self.source_script.lock();
        Ok(script.pop().unwrap_or_else(Value::null))
    }
}

fn spec(name: &str) -> StageSpec {
    StageSpec::new(name)
}

#[tokio::test]
async fn runs_every_stage_to_completion_without_retries() {
    let invoker = ScriptedInvoker::new(std::collections::HashMap::new());
    let mut engine = PipelineEngine::new();
    let stages = vec![spec("upper"), spec("trim")];
    let result = engine
        .run(Value::string("hi"), &stages, &invoker)
        .await
        .expect("no retries requested");
    assert_eq!(result, Value::string("hi"));
    assert_eq!(*invoker.calls.lock(), vec![1, 2]);
}

#[tokio::test]
async fn upstream_retry_reruns_the_previous_stage() {
    let mut scripts = std::collections::HashMap::new();
    scripts.insert(2, vec![StageResult::RetryUpstream]);
    let invoker = ScriptedInvoker::new(scripts);
    let mut engine = PipelineEngine::new();
    let stages = vec![spec("a"), spec("b")];
    let result = engine
        .run(Value::string("seed"), &stages, &invoker)
        .await
        .expect("retry should resolve");
    assert_eq!(result, Value::string("seed"));
    // stage 1 runs once, stage 2 requests retry, stage 1 reruns, stage 2 reruns
    assert_eq!(*invoker.calls.lock(), vec![1, 2, 1, 2]);
}

#[tokio::test]
async fn stage_one_retry_falls_back_to_the_source_when_retryable() {
    let mut scripts = std::collections::HashMap::new();
    scripts.insert(1, vec![StageResult::RetryUpstream]);
    let invoker = ScriptedInvoker::new(scripts);
    invoker.source_script.lock().push(Value::string("refreshed"));
    let mut engine = PipelineEngine::new();
    let mut source = Value::string("stale");
    source.meta.retryable = true;
    let stages = vec![spec("a")];
    let result = engine.run(source, &stages, &invoker).await.expect("ok");
    assert_eq!(result, Value::string("refreshed"));
}

#[tokio::test]
async fn stage_one_retry_fails_when_source_is_not_retryable() {
    let mut scripts = std::collections::HashMap::new();
    scripts.insert(1, vec![StageResult::RetryUpstream]);
    let invoker = ScriptedInvoker::new(scripts);
    let mut engine = PipelineEngine::new();
    let stages = vec![spec("a")];
    let err = engine
        .run(Value::string("stale"), &stages, &invoker)
        .await
        .unwrap_err();
    assert!(matches!(err, mlld_errors::PipelineError::NonRetryableSource));
}

#[tokio::test]
async fn a_stage_asked_to_rerun_cannot_itself_request_a_retry() {
    // Stage 2 asks for stage 1 to rerun; on its rerun stage 1 asks for a
    // retry too, which would target itself and must be rejected.
    let mut scripts = std::collections::HashMap::new();
    scripts.insert(2, vec![StageResult::RetryUpstream]);
    scripts.insert(
        1,
        vec![StageResult::Complete(Value::null()), StageResult::RetryUpstream],
    );
    let invoker = ScriptedInvoker::new(scripts);
    let mut engine = PipelineEngine::new();
    let stages = vec![spec("a"), spec("b")];
    let err = engine
        .run(Value::string("seed"), &stages, &invoker)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        mlld_errors::PipelineError::SelfRetryForbidden { stage: 1 }
    ));
}

#[tokio::test]
async fn stage_attempt_cap_is_enforced_through_the_engine() {
    let mut scripts = std::collections::HashMap::new();
    scripts.insert(2, vec![StageResult::RetryUpstream; 20]);
    let invoker = ScriptedInvoker::new(scripts);
    let mut engine = PipelineEngine::new();
    let stages = vec![spec("a"), spec("b")];
    let err = engine
        .run(Value::string("seed"), &stages, &invoker)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        mlld_errors::PipelineError::RetryLimitExceeded { .. }
    ));
}
