// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The scoped binding environment (§3.2, §4.1): an arena of slots
//! referenced by handle, so child/capture/merge lifecycle has a single
//! clear owner (the arena) instead of a reference-counted graph.

mod arena;
mod handle;
mod kind;
mod reserved;

pub use arena::EnvArena;
pub use handle::EnvHandle;
pub use kind::EnvKind;
pub use reserved::{is_reserved, ReservedValue, RESERVED_NAMES};
