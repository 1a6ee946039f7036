//! Retry bookkeeping (§3.3, §4.6): per-stage and per-context attempt caps,
//! a global retry cap, and the attempt log `@pipeline.all.tries` reads from.
//!
//! Keys off `(stage_index, context_id)` pairs in a `HashMap`, the same
//! shape as a job-scheduling action-attempt counter keyed by
//! `(action_name, attempt_index)`.

use crate::attempt::AttemptRecord;
use mlld_errors::PipelineError;
use std::collections::HashMap;

/// Invocations of any single stage, across the whole pipeline run.
pub const STAGE_ATTEMPT_CAP: u32 = 10;
/// Attempts recorded within one retry window (the span between two
/// upstream-retry events) for whichever stage is being retried.
pub const CONTEXT_ATTEMPT_CAP: u32 = 10;
/// Retry *events* (not first-pass invocations) across the whole run.
pub const GLOBAL_RETRY_CAP: u32 = 50;

#[derive(Debug, Default)]
pub struct RetryLedger {
    global_retries: u32,
    stage_attempts: HashMap<usize, u32>,
    context_id: u32,
    context_attempts: HashMap<(usize, u32), u32>,
    all_tries: Vec<AttemptRecord>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_tries(&self) -> &[AttemptRecord] {
        &self.all_tries
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    /// Attempts so far for `stage` within the current context window,
    /// i.e. the list `@pipeline.tries` exposes.
    pub fn tries_in_context(&self, stage: usize) -> Vec<AttemptRecord> {
        self.all_tries
            .iter()
            .filter(|r| r.stage == stage && r.context_id == self.context_id)
            .cloned()
            .collect()
    }

    pub fn stage_attempt_count(&self, stage: usize) -> u32 {
        self.stage_attempts.get(&stage).copied().unwrap_or(0)
    }

    /// Record the start of an invocation of `stage`, enforcing the
    /// per-stage and per-context caps before bookkeeping the attempt.
    pub fn begin_attempt(&mut self, stage: usize, record: AttemptRecord) -> Result<u32, PipelineError> {
        let record = record.in_context(self.context_id);
        let stage_count = self.stage_attempts.entry(stage).or_insert(0);
        *stage_count += 1;
        if *stage_count > STAGE_ATTEMPT_CAP {
            return Err(PipelineError::RetryLimitExceeded {
                scope: format!("stage {stage} exceeded {STAGE_ATTEMPT_CAP} attempts"),
            });
        }
        let context_count = self
            .context_attempts
            .entry((stage, self.context_id))
            .or_insert(0);
        *context_count += 1;
        if *context_count > CONTEXT_ATTEMPT_CAP {
            return Err(PipelineError::RetryLimitExceeded {
                scope: format!("stage {stage} exceeded {CONTEXT_ATTEMPT_CAP} attempts in this retry window"),
            });
        }
        let attempt_number = *stage_count;
        self.all_tries.push(record);
        Ok(attempt_number)
    }

    pub fn complete_attempt(&mut self, output: mlld_value::Value) {
        if let Some(last) = self.all_tries.last_mut() {
            last.output = Some(output);
        }
    }

    pub fn fail_attempt(&mut self, error: String) {
        if let Some(last) = self.all_tries.last_mut() {
            last.error = Some(error);
        }
    }

    /// Record that an upstream retry is about to happen, opening a new
    /// context window and bumping the global retry cap.
    pub fn begin_retry(&mut self) -> Result<(), PipelineError> {
        self.global_retries += 1;
        if self.global_retries > GLOBAL_RETRY_CAP {
            return Err(PipelineError::RetryLimitExceeded {
                scope: format!("pipeline exceeded {GLOBAL_RETRY_CAP} total retries"),
            });
        }
        self.context_id += 1;
        Ok(())
    }
}
