//! The `Resolver` trait and the shape of a fetched import (§3.4, §4.5).

use crate::reference::Reference;
use async_trait::async_trait;
use indexmap::IndexMap;
use mlld_errors::ImportError;

/// What a resolver is built to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    Input,
    Output,
    Both,
}

/// Where a resolver may be invoked from (§3.4 "context compatibility").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Import,
    Path,
    Output,
}

/// Provenance attached to fetched content (§4.5 step 5 `mx`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchMeta {
    pub source: String,
    pub taint: Vec<String>,
    pub labels: Vec<String>,
    pub timestamp_ms: u64,
    pub size: Option<u64>,
}

/// What a resolver returns for a successfully resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub content: String,
    pub content_type: Option<String>,
    pub meta: FetchMeta,
}

/// A named handler in the resolver chain (§3.4). Async because real
/// resolvers do I/O (file reads, HTTP fetches); the local/dynamic resolvers
/// simply resolve their future immediately.
#[async_trait]
pub trait Resolver: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> ResolverKind;
    /// Dispatch order: higher priority is tried first.
    fn priority(&self) -> i32;
    fn supports_context(&self, context: ContextKind) -> bool;
    fn can_resolve(&self, reference: &Reference) -> bool;
    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError>;
}

/// Fixed metadata describing a resolver, for diagnostics/introspection
/// (§3.4's resolver table), independent of any live instance.
#[derive(Debug, Clone)]
pub struct ResolverDescriptor {
    pub name: String,
    pub kind: ResolverKind,
    pub content_types: Vec<String>,
    pub contexts: Vec<ContextKind>,
}

pub type ResolverTable = IndexMap<String, ResolverDescriptor>;
