//! Import-reference classification (§4.5 step 1: "Normalize reference").

use mlld_ast::PathContext;

/// A classified import/path reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Starts with `/`.
    AbsolutePath(String),
    /// `./...`, `../...`, or a bare filename.
    RelativePath(String),
    /// `http(s)://...`.
    Url(String),
    /// `@author/module`.
    Registry { author: String, name: String },
    /// `resolver-name/path`, e.g. `keychain:scope/name`, `mcp "cmd"`.
    ResolverPrefixed { resolver: String, path: String },
}

impl Reference {
    /// Classify a raw reference string (§4.5 step 1). `@base/...` and
    /// `@./...` are recognized as project-relative and normalized against
    /// `ctx.project_root`/`ctx.file_dir` before further resolution.
    pub fn normalize(raw: &str, ctx: &PathContext) -> Self {
        if let Some(rest) = raw.strip_prefix("http://").or_else(|| raw.strip_prefix("https://")) {
            let _ = rest;
            return Reference::Url(raw.to_string());
        }
        if let Some(rest) = raw.strip_prefix('@') {
            if let Some(path) = rest.strip_prefix("base/") {
                return Reference::AbsolutePath(join(&ctx.project_root.to_string_lossy(), path));
            }
            if let Some(path) = rest.strip_prefix("./") {
                return Reference::AbsolutePath(join(&ctx.file_dir.to_string_lossy(), path));
            }
            if let Some((author, name)) = rest.split_once('/') {
                if !KNOWN_RESOLVER_PREFIXES.contains(&author) {
                    return Reference::Registry {
                        author: author.to_string(),
                        name: name.to_string(),
                    };
                }
            }
        }
        if let Some((resolver, path)) = raw.split_once(':') {
            if KNOWN_RESOLVER_PREFIXES.contains(&resolver) {
                return Reference::ResolverPrefixed {
                    resolver: resolver.to_string(),
                    path: path.to_string(),
                };
            }
        }
        if raw.starts_with('/') {
            return Reference::AbsolutePath(raw.to_string());
        }
        Reference::RelativePath(raw.to_string())
    }

    /// A stable string for cache keys, lock-file keys, and import-stack
    /// cycle checks (§4.5 step 2 "exact-path heuristic").
    pub fn canonical(&self) -> String {
        match self {
            Reference::AbsolutePath(p) => p.clone(),
            Reference::RelativePath(p) => p.clone(),
            Reference::Url(u) => u.clone(),
            Reference::Registry { author, name } => format!("@{author}/{name}"),
            Reference::ResolverPrefixed { resolver, path } => format!("{resolver}:{path}"),
        }
    }

    /// The basename heuristic used alongside the exact-path check for
    /// cycle detection (§4.5 step 2).
    pub fn basename(&self) -> String {
        let canon = self.canonical();
        canon
            .rsplit('/')
            .next()
            .unwrap_or(&canon)
            .to_string()
    }
}

const KNOWN_RESOLVER_PREFIXES: &[&str] = &["keychain", "mcp"];

fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else if base.ends_with('/') {
        format!("{base}{rest}")
    } else {
        format!("{base}/{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PathContext {
        PathContext::new("/project", "/project/src", "/project/src")
    }

    #[test]
    fn classifies_url() {
        assert_eq!(
            Reference::normalize("https://example.com/a.mld", &ctx()),
            Reference::Url("https://example.com/a.mld".to_string())
        );
    }

    #[test]
    fn classifies_registry_module() {
        assert_eq!(
            Reference::normalize("@alice/utils", &ctx()),
            Reference::Registry {
                author: "alice".to_string(),
                name: "utils".to_string()
            }
        );
    }

    #[test]
    fn classifies_base_relative() {
        assert_eq!(
            Reference::normalize("@base/lib/a.mld", &ctx()),
            Reference::AbsolutePath("/project/lib/a.mld".to_string())
        );
    }

    #[test]
    fn classifies_project_relative() {
        assert_eq!(
            Reference::normalize("@./a.mld", &ctx()),
            Reference::AbsolutePath("/project/src/a.mld".to_string())
        );
    }

    #[test]
    fn classifies_resolver_prefixed() {
        assert_eq!(
            Reference::normalize("keychain:scope/name", &ctx()),
            Reference::ResolverPrefixed {
                resolver: "keychain".to_string(),
                path: "scope/name".to_string()
            }
        );
    }

    #[test]
    fn classifies_relative_path_default() {
        assert_eq!(
            Reference::normalize("./a.mld", &ctx()),
            Reference::RelativePath("./a.mld".to_string())
        );
    }

    #[test]
    fn basename_strips_directories() {
        let reference = Reference::AbsolutePath("/a/b/c.mld".to_string());
        assert_eq!(reference.basename(), "c.mld");
    }
}
