// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The ordered effect bus (§4.8): user-visible output actions as plain
//! data, realized by a pluggable [`EffectSink`].

mod effect;
mod sink;

pub use effect::{Effect, Stream, WriteFormat};
pub use sink::{EffectSink, InMemorySink, RealSink};
