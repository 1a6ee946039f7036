// SPDX-License-Identifier: MIT
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The resolver/import layer (§3.4, §4.5): classifies import references,
//! dispatches them to a priority-ordered chain of named resolvers, caches
//! and lock-pins their content, and tracks the import stack for cycle
//! detection. Recursive parse-and-evaluate of imported mlld source is out
//! of scope here; callers (`mlld_eval`/`mlld_interp`) supply that via their
//! own module-parser collaborator, keeping this crate free of a dependency
//! on the evaluator.

mod builtins;
mod cache;
mod dynamic;
mod filesystem;
mod html;
mod import_stack;
mod integrity;
mod lock;
mod reference;
mod registry;
mod resolver_trait;

pub use builtins::{
    BuiltinResolver, DynamicResolver, HttpResolver, KeychainResolver, LocalResolver,
    ProjectResolver, RegistryResolver,
};
pub use cache::{Cache, CacheKey};
pub use dynamic::serialize_dynamic_module;
pub use filesystem::{FakeFileSystem, FileSystem, RealFileSystem};
pub use html::html_to_markdown;
pub use import_stack::ImportStack;
pub use integrity::{content_hash, verify};
pub use lock::{LockConfig, LockEntry, LockFile};
pub use reference::Reference;
pub use registry::ResolverRegistry;
pub use resolver_trait::{ContextKind, FetchMeta, FetchedContent, Resolver, ResolverDescriptor, ResolverKind, ResolverTable};
