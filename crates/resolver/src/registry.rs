//! Resolver dispatch: priority-ordered, first-match-wins (§3.4, §4.5 step 3).

use crate::reference::Reference;
use crate::resolver_trait::{ContextKind, FetchedContent, Resolver};
use mlld_errors::ImportError;

/// Holds the live resolver chain for one interpreter invocation. Resolvers
/// are tried in descending `priority()` order; the first whose
/// `can_resolve` and `supports_context` both agree gets the fetch.
#[derive(Default)]
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resolver: Box<dyn Resolver>) {
        let priority = resolver.priority();
        let pos = self
            .resolvers
            .iter()
            .position(|r| r.priority() < priority)
            .unwrap_or(self.resolvers.len());
        self.resolvers.insert(pos, resolver);
    }

    fn find(&self, reference: &Reference, context: ContextKind) -> Option<&dyn Resolver> {
        self.resolvers
            .iter()
            .find(|r| r.supports_context(context) && r.can_resolve(reference))
            .map(|r| r.as_ref())
    }

    /// Resolve `reference` against the first matching resolver in priority
    /// order, failing with `ResolverUnavailable` if none claims it.
    pub async fn dispatch(
        &self,
        reference: &Reference,
        context: ContextKind,
    ) -> Result<FetchedContent, ImportError> {
        match self.find(reference, context) {
            Some(resolver) => resolver.fetch(reference).await,
            None => Err(ImportError::ResolverUnavailable {
                reference: reference.canonical(),
            }),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{DynamicResolver, LocalResolver};
    use crate::filesystem::FakeFileSystem;
    use std::sync::Arc;

    #[tokio::test]
    async fn higher_priority_resolver_wins() {
        let mut registry = ResolverRegistry::new();
        let fs = Arc::new(FakeFileSystem::new().with_file("/a.mld", "from-local"));
        registry.register(Box::new(LocalResolver::new(fs)));

        let mut dynamic = DynamicResolver::new();
        dynamic.register("/a.mld", "from-dynamic");
        registry.register(Box::new(dynamic));

        let reference = Reference::AbsolutePath("/a.mld".to_string());
        let fetched = registry.dispatch(&reference, ContextKind::Import).await.unwrap();
        assert_eq!(fetched.content, "from-dynamic");
    }

    #[tokio::test]
    async fn no_matching_resolver_is_unavailable() {
        let registry = ResolverRegistry::new();
        let reference = Reference::AbsolutePath("/a.mld".to_string());
        let err = registry.dispatch(&reference, ContextKind::Import).await.unwrap_err();
        assert!(matches!(err, ImportError::ResolverUnavailable { .. }));
    }

    #[test]
    fn names_reflect_registration_order_by_priority() {
        let mut registry = ResolverRegistry::new();
        registry.register(Box::new(LocalResolver::new(Arc::new(FakeFileSystem::new()))));
        registry.register(Box::new(DynamicResolver::new()));
        assert_eq!(registry.names(), vec!["dynamic", "local"]);
    }
}
