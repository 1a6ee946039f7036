//! Arena handles (§9 re-architecture guidance): child environments hold a
//! parent handle instead of a pointer/reference, so the whole environment
//! graph lives in one arena scoped to a single interpreter invocation.

/// A reference into an [`crate::arena::EnvArena`]. The generation guards
/// against using a handle after its slot has been destroyed and reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvHandle {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}
