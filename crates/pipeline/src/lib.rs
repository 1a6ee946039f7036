// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pipeline engine (§3.3, §4.6): threads a value through a chain of
//! transformer stages, tracking attempts and enforcing the per-stage,
//! per-context, and global retry caps. Stage invocation itself is a trait
//! ([`StageInvoker`]) implemented by mlld-eval, which depends on this
//! crate for the engine — keeping the dependency one-directional.

mod attempt;
mod context;
mod engine;
mod invoker;
mod ledger;

pub use attempt::AttemptRecord;
pub use context::{PipelineVars, StageContext};
pub use engine::PipelineEngine;
pub use invoker::{StageInvoker, StageResult, StageSpec};
pub use ledger::{RetryLedger, CONTEXT_ATTEMPT_CAP, GLOBAL_RETRY_CAP, STAGE_ATTEMPT_CAP};
