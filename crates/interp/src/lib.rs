// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The SDK entry point (§6.3): wires every subsystem crate into one
//! `EvalContext`, drives a parsed program through it, and exposes the
//! ambient host-facing concerns the interpreter core itself stays free of —
//! environment-variable configuration, module manifest parsing, the
//! validator report, and the bordered error box the CLI collaborator
//! prints.

mod config;
mod events;
mod manifest;
mod process;
mod render;
mod validate;

pub use config::HostConfig;
pub use events::InterpEvent;
pub use manifest::{ManifestError, ModuleManifest, ModuleType};
pub use process::{
    process_mlld, process_program, DynamicModule, ExitCode, ProcessOptions, ProcessOutput,
};
pub use render::bordered_box;
pub use validate::{AntiPattern, Report};
