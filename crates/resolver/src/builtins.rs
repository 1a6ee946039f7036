//! Built-in resolvers (§3.4 table): local, project, http, registry,
//! dynamic, keychain, mcp, builtin.

use crate::filesystem::FileSystem;
use crate::html::html_to_markdown;
use crate::reference::Reference;
use crate::resolver_trait::{ContextKind, FetchMeta, FetchedContent, Resolver, ResolverKind};
use async_trait::async_trait;
use indexmap::IndexMap;
use mlld_errors::ImportError;
use std::path::Path;
use std::sync::Arc;

/// `local` — file paths and globs. A glob reference fetches every matched
/// file and joins them with a blank line, matching `LoadContentArray`'s
/// textual coercion (§3.1); structured access to individual files happens
/// one level up, in `mlld_eval`'s file-load expression handling, which
/// calls [`Resolver::fetch`] per-match instead when it needs a
/// `LoadContentArray`.
pub struct LocalResolver {
    fs: Arc<dyn FileSystem>,
}

impl LocalResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl Resolver for LocalResolver {
    fn name(&self) -> &str {
        "local"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        100
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import | ContextKind::Path)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        matches!(reference, Reference::AbsolutePath(_) | Reference::RelativePath(_))
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        let path = reference.canonical();
        if path.contains('*') || path.contains('?') || path.contains('[') {
            let matches = self
                .fs
                .glob(&path)
                .map_err(|_| ImportError::FileNotFound { path: path.clone() })?;
            let mut joined = String::new();
            for (i, m) in matches.iter().enumerate() {
                if i > 0 {
                    joined.push('\n');
                }
                let content = self
                    .fs
                    .read_to_string(m)
                    .map_err(|_| ImportError::FileNotFound {
                        path: m.to_string_lossy().into_owned(),
                    })?;
                joined.push_str(&content);
            }
            return Ok(FetchedContent {
                content: joined,
                content_type: None,
                meta: FetchMeta {
                    source: path,
                    ..Default::default()
                },
            });
        }
        let content = self
            .fs
            .read_to_string(Path::new(&path))
            .map_err(|_| ImportError::FileNotFound { path: path.clone() })?;
        Ok(FetchedContent {
            content,
            content_type: None,
            meta: FetchMeta {
                source: path,
                size: None,
                ..Default::default()
            },
        })
    }
}

/// `project` — `@base/…`, `@./…`. Reference normalization (§4.5 step 1)
/// already rewrites these to absolute paths rooted at the project/file
/// directory, so this resolver shares the local resolver's fetch logic and
/// differs only in priority (tried first, since an explicit `@base/`/`@./`
/// reference should never fall through to a plain local lookup of the same
/// absolute path by coincidence).
pub struct ProjectResolver {
    inner: LocalResolver,
    project_root: String,
}

impl ProjectResolver {
    pub fn new(fs: Arc<dyn FileSystem>, project_root: impl Into<String>) -> Self {
        Self {
            inner: LocalResolver::new(fs),
            project_root: project_root.into(),
        }
    }
}

#[async_trait]
impl Resolver for ProjectResolver {
    fn name(&self) -> &str {
        "project"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        110
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import | ContextKind::Path)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        matches!(reference, Reference::AbsolutePath(p) if p.starts_with(&self.project_root))
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        self.inner.fetch(reference).await
    }
}

/// `http` — `http(s)://…` URLs. HTML responses are converted to Markdown
/// (article-extraction is out of scope; `html_to_markdown` does a
/// tag-stripping approximation, see `html.rs`).
pub struct HttpResolver {
    client: reqwest::Client,
}

impl HttpResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    fn name(&self) -> &str {
        "http"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        50
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import | ContextKind::Path)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        matches!(reference, Reference::Url(_))
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        let url = reference.canonical();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| ImportError::ResolverUnavailable { reference: url.clone() })?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .text()
            .await
            .map_err(|_| ImportError::ResolverUnavailable { reference: url.clone() })?;
        let is_html = content_type.as_deref().is_some_and(|ct| ct.contains("text/html"));
        let content = if is_html { html_to_markdown(&body) } else { body };
        Ok(FetchedContent {
            content,
            content_type,
            meta: FetchMeta {
                source: url,
                ..Default::default()
            },
        })
    }
}

/// `registry` — `@author/module` names, resolved against the public
/// registry's content-addressed module store.
pub struct RegistryResolver {
    client: reqwest::Client,
    base_url: String,
}

impl RegistryResolver {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn module_url(&self, author: &str, name: &str) -> String {
        format!("{}/{author}/{name}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Resolver for RegistryResolver {
    fn name(&self) -> &str {
        "registry"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        40
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        matches!(reference, Reference::Registry { .. })
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        let Reference::Registry { author, name } = reference else {
            return Err(ImportError::ResolverUnavailable {
                reference: reference.canonical(),
            });
        };
        let url = self.module_url(author, name);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|_| ImportError::ResolverUnavailable { reference: url.clone() })?;
        let content = response
            .text()
            .await
            .map_err(|_| ImportError::ResolverUnavailable { reference: url.clone() })?;
        Ok(FetchedContent {
            content,
            content_type: Some("text/plain".to_string()),
            meta: FetchMeta {
                source: url,
                ..Default::default()
            },
        })
    }
}

/// `dynamic` — in-memory modules injected via the SDK (§4.5 "Dynamic
/// modules"). Takes priority over filesystem/registry of the same name.
#[derive(Default)]
pub struct DynamicResolver {
    modules: IndexMap<String, String>,
}

impl DynamicResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.modules.insert(name.into(), source.into());
    }
}

#[async_trait]
impl Resolver for DynamicResolver {
    fn name(&self) -> &str {
        "dynamic"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        200
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        self.modules.contains_key(&reference.canonical())
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        let key = reference.canonical();
        let content = self
            .modules
            .get(&key)
            .cloned()
            .ok_or_else(|| ImportError::ResolverUnavailable { reference: key.clone() })?;
        Ok(FetchedContent {
            content,
            content_type: None,
            meta: FetchMeta {
                source: key,
                taint: vec!["src:dynamic".to_string()],
                labels: vec!["src:dynamic".to_string()],
                ..Default::default()
            },
        })
    }
}

/// `keychain` — `keychain:scope/name` secrets. Backed by environment
/// variables `MLLD_KEYCHAIN_<SCOPE>_<NAME>` as the opportunistic (not a
/// security boundary, §1 Non-goals) secret store.
#[derive(Default)]
pub struct KeychainResolver;

impl KeychainResolver {
    pub fn new() -> Self {
        Self
    }

    fn env_var_name(scope: &str, name: &str) -> String {
        format!(
            "MLLD_KEYCHAIN_{}_{}",
            scope.to_uppercase().replace(['-', '.'], "_"),
            name.to_uppercase().replace(['-', '.'], "_")
        )
    }
}

#[async_trait]
impl Resolver for KeychainResolver {
    fn name(&self) -> &str {
        "keychain"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        90
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        matches!(reference, Reference::ResolverPrefixed { resolver, .. } if resolver == "keychain")
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        let Reference::ResolverPrefixed { path, .. } = reference else {
            return Err(ImportError::ResolverUnavailable {
                reference: reference.canonical(),
            });
        };
        let (scope, name) = path.split_once('/').ok_or_else(|| ImportError::ResolverUnavailable {
            reference: path.clone(),
        })?;
        let var = Self::env_var_name(scope, name);
        let content = std::env::var(&var).map_err(|_| ImportError::ResolverUnavailable {
            reference: reference.canonical(),
        })?;
        Ok(FetchedContent {
            content,
            content_type: None,
            meta: FetchMeta {
                source: format!("keychain:{path}"),
                taint: vec!["untrusted".to_string()],
                ..Default::default()
            },
        })
    }
}

/// `builtin` — pseudo-modules like `now`, `base` when imported by name
/// rather than read from the reserved environment slot.
#[derive(Default)]
pub struct BuiltinResolver {
    values: IndexMap<String, String>,
}

impl BuiltinResolver {
    pub fn new() -> Self {
        let mut values = IndexMap::new();
        values.insert("now".to_string(), String::new());
        values.insert("base".to_string(), String::new());
        Self { values }
    }
}

#[async_trait]
impl Resolver for BuiltinResolver {
    fn name(&self) -> &str {
        "builtin"
    }

    fn kind(&self) -> ResolverKind {
        ResolverKind::Input
    }

    fn priority(&self) -> i32 {
        10
    }

    fn supports_context(&self, context: ContextKind) -> bool {
        matches!(context, ContextKind::Import)
    }

    fn can_resolve(&self, reference: &Reference) -> bool {
        self.values.contains_key(&reference.canonical())
    }

    async fn fetch(&self, reference: &Reference) -> Result<FetchedContent, ImportError> {
        Ok(FetchedContent {
            content: String::new(),
            content_type: None,
            meta: FetchMeta {
                source: reference.canonical(),
                ..Default::default()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::FakeFileSystem;
    use mlld_ast::PathContext;

    fn ctx() -> PathContext {
        PathContext::new("/project", "/project", "/project")
    }

    #[tokio::test]
    async fn local_resolver_reads_plain_file() {
        let fs: Arc<dyn FileSystem> = Arc::new(FakeFileSystem::new().with_file("/a.mld", "hi"));
        let resolver = LocalResolver::new(fs);
        let reference = Reference::normalize("/a.mld", &ctx());
        assert!(resolver.can_resolve(&reference));
        let fetched = resolver.fetch(&reference).await.unwrap();
        assert_eq!(fetched.content, "hi");
    }

    #[tokio::test]
    async fn local_resolver_joins_glob_matches() {
        let fs: Arc<dyn FileSystem> = Arc::new(
            FakeFileSystem::new()
                .with_file("/dir/a.md", "a")
                .with_file("/dir/b.md", "b"),
        );
        let resolver = LocalResolver::new(fs);
        let reference = Reference::normalize("/dir/*.md", &ctx());
        let fetched = resolver.fetch(&reference).await.unwrap();
        assert_eq!(fetched.content, "a\nb");
    }

    #[test]
    fn project_resolver_only_claims_paths_under_root() {
        let fs: Arc<dyn FileSystem> = Arc::new(FakeFileSystem::new());
        let resolver = ProjectResolver::new(fs, "/project");
        let reference = Reference::normalize("@base/lib/a.mld", &ctx());
        assert!(resolver.can_resolve(&reference));
        let outside = Reference::AbsolutePath("/other/a.mld".to_string());
        assert!(!resolver.can_resolve(&outside));
    }

    #[test]
    fn dynamic_resolver_prioritized_highest() {
        let resolver = DynamicResolver::new();
        assert!(resolver.priority() > ProjectResolver::new(Arc::new(FakeFileSystem::new()), "/p").priority());
    }

    #[tokio::test]
    async fn dynamic_resolver_tags_src_dynamic() {
        let mut resolver = DynamicResolver::new();
        resolver.register("@mem/config", "/var @x = 1");
        let reference = Reference::RelativePath("@mem/config".to_string());
        let fetched = resolver.fetch(&reference).await.unwrap();
        assert!(fetched.meta.labels.contains(&"src:dynamic".to_string()));
    }

    #[tokio::test]
    async fn keychain_resolver_reads_env_var() {
        let var = KeychainResolver::env_var_name("scope", "name");
        std::env::set_var(&var, "secret-value");
        let resolver = KeychainResolver::new();
        let reference = Reference::ResolverPrefixed {
            resolver: "keychain".to_string(),
            path: "scope/name".to_string(),
        };
        let fetched = resolver.fetch(&reference).await.unwrap();
        assert_eq!(fetched.content, "secret-value");
        assert!(fetched.meta.taint.contains(&"untrusted".to_string()));
        std::env::remove_var(&var);
    }

    #[tokio::test]
    async fn keychain_resolver_errors_on_missing_var() {
        let resolver = KeychainResolver::new();
        let reference = Reference::ResolverPrefixed {
            resolver: "keychain".to_string(),
            path: "missing/name".to_string(),
        };
        assert!(resolver.fetch(&reference).await.is_err());
    }
}
