//! The pipeline engine (§4.6): drives a source value through a chain of
//! transformer stages, handling upstream retry requests, attempt caps, and
//! the attempt log, independent of whatever actually evaluates a stage.

use crate::context::{PipelineVars, StageContext};
use crate::invoker::{StageInvoker, StageResult, StageSpec};
use crate::ledger::RetryLedger;
use mlld_errors::PipelineError;
use mlld_value::Value;
use std::collections::HashMap;

pub struct PipelineEngine {
    ledger: RetryLedger,
}

impl PipelineEngine {
    pub fn new() -> Self {
        Self {
            ledger: RetryLedger::new(),
        }
    }

    /// `@pipeline` as it should read for `stage` right now.
    fn pipeline_vars(&self, stage: usize) -> PipelineVars {
        PipelineVars {
            try_count: self.ledger.stage_attempt_count(stage),
            tries: self.ledger.tries_in_context(stage),
            all_tries: self.ledger.all_tries().to_vec(),
        }
    }

    /// Run `stages` (1-indexed transformers) starting from `source`.
    /// Returns the final value, or the error from whichever stage failed.
    pub async fn run(
        &mut self,
        source: Value,
        stages: &[StageSpec],
        invoker: &dyn StageInvoker,
    ) -> Result<Value, PipelineError> {
        let total = stages.len();
        let source_retryable = source.meta.retryable;
        let mut current = source;
        // Input each stage last received, so an upstream retry can redo
        // stage N-1 with the same input it was given the first time.
        let mut stage_inputs: HashMap<usize, Value> = HashMap::new();
        let mut stage_idx = 1usize;

        while stage_idx <= total {
            if stage_idx == 0 {
                unreachable!("loop only enters at stage_idx >= 1");
            }
            stage_inputs.insert(stage_idx, current.clone());
            let ctx = StageContext {
                stage: stage_idx,
                total,
                attempt: self.ledger.stage_attempt_count(stage_idx) + 1,
                index: None,
            };
            let spec = &stages[stage_idx - 1];
            let attempt_record = crate::attempt::AttemptRecord::started(stage_idx, ctx.attempt, current.clone());
            self.ledger.begin_attempt(stage_idx, attempt_record)?;

            let vars = self.pipeline_vars(stage_idx);
            let outcome = invoker
                .invoke_transformer(stage_idx, spec, &current, &ctx, &vars)
                .await;

            match outcome {
                Ok(StageResult::Complete(value)) => {
                    self.ledger.complete_attempt(value.clone());
                    current = value;
                    stage_idx += 1;
                }
                Ok(StageResult::RetryUpstream) => {
                    self.ledger.fail_attempt("retry requested".to_string());
                    if stage_idx == 1 {
                        if !source_retryable {
                            return Err(PipelineError::NonRetryableSource);
                        }
                        self.ledger.begin_retry()?;
                        current = invoker
                            .reinvoke_source()
                            .await
                            .map_err(|e| PipelineError::StageError {
                                stage: 0,
                                cause: Box::new(e),
                            })?;
                        // stage_idx stays at 1: redo it with the fresh source
                    } else {
                        self.ledger.begin_retry()?;
                        let target = stage_idx - 1;
                        let target_input = stage_inputs
                            .get(&target)
                            .cloned()
                            .unwrap_or_else(|| current.clone());
                        let target_ctx = StageContext {
                            stage: target,
                            total,
                            attempt: self.ledger.stage_attempt_count(target) + 1,
                            index: None,
                        };
                        let target_spec = &stages[target - 1];
                        let record = crate::attempt::AttemptRecord::started(
                            target,
                            target_ctx.attempt,
                            target_input.clone(),
                        );
                        self.ledger.begin_attempt(target, record)?;
                        let target_vars = self.pipeline_vars(target);
                        match invoker
                            .invoke_transformer(target, target_spec, &target_input, &target_ctx, &target_vars)
                            .await
                        {
                            Ok(StageResult::Complete(value)) => {
                                self.ledger.complete_attempt(value.clone());
                                current = value;
                                stage_idx = target + 1;
                            }
                            Ok(StageResult::RetryUpstream) => {
                                return Err(PipelineError::SelfRetryForbidden { stage: target });
                            }
                            Err(e) => {
                                self.ledger.fail_attempt(e.to_string());
                                return Err(PipelineError::StageError {
                                    stage: target,
                                    cause: Box::new(e),
                                });
                            }
                        }
                    }
                }
                Err(e) => {
                    self.ledger.fail_attempt(e.to_string());
                    return Err(PipelineError::StageError {
                        stage: stage_idx,
                        cause: Box::new(e),
                    });
                }
            }
        }

        Ok(current)
    }
}

impl Default for PipelineEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
