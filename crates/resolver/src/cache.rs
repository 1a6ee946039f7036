//! The import cache (§3.4): keyed by `(resolver, reference, version?)` with
//! per-resolver TTL policy.

use indexmap::IndexMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resolver: String,
    pub reference: String,
    pub version: Option<String>,
}

impl CacheKey {
    pub fn new(
        resolver: impl Into<String>,
        reference: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            resolver: resolver.into(),
            reference: reference.into(),
            version,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    content: String,
    content_type: Option<String>,
    content_hash: String,
    fetched_at_ms: u64,
}

/// In-memory fetch cache. One instance per interpreter invocation (§9: "no
/// process-wide state").
#[derive(Debug, Default)]
pub struct Cache {
    entries: IndexMap<CacheKey, CacheEntry>,
    ttls: IndexMap<String, Duration>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the TTL for a given resolver's entries. Resolvers with no
    /// configured TTL never expire by time (only by explicit `live` mode
    /// bypass at the call site).
    pub fn set_ttl(&mut self, resolver: impl Into<String>, ttl: Duration) {
        self.ttls.insert(resolver.into(), ttl);
    }

    pub fn insert(
        &mut self,
        key: CacheKey,
        content: String,
        content_type: Option<String>,
        content_hash: String,
        now_ms: u64,
    ) {
        self.entries.insert(
            key,
            CacheEntry {
                content,
                content_type,
                content_hash,
                fetched_at_ms: now_ms,
            },
        );
    }

    /// Look up a cached entry, honoring the resolver's configured TTL. A
    /// resolver with no TTL is treated as never expiring.
    pub fn get(&self, key: &CacheKey, now_ms: u64) -> Option<(&str, Option<&str>, &str)> {
        let entry = self.entries.get(key)?;
        if let Some(ttl) = self.ttls.get(&key.resolver) {
            let age_ms = now_ms.saturating_sub(entry.fetched_at_ms);
            if age_ms > ttl.as_millis() as u64 {
                return None;
            }
        }
        Some((
            entry.content.as_str(),
            entry.content_type.as_deref(),
            entry.content_hash.as_str(),
        ))
    }

    pub fn invalidate(&mut self, key: &CacheKey) {
        self.entries.shift_remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_hit_returns_stored_content() {
        let mut cache = Cache::new();
        let key = CacheKey::new("local", "a.mld", None);
        cache.insert(key.clone(), "body".into(), None, "sha256:x".into(), 0);
        let hit = cache.get(&key, 0);
        assert_eq!(hit, Some(("body", None, "sha256:x")));
    }

    #[test]
    fn ttl_expiry_evicts_stale_entries() {
        let mut cache = Cache::new();
        cache.set_ttl("http", Duration::from_millis(100));
        let key = CacheKey::new("http", "https://a", None);
        cache.insert(key.clone(), "body".into(), None, "sha256:x".into(), 0);
        assert!(cache.get(&key, 50).is_some());
        assert!(cache.get(&key, 200).is_none());
    }

    #[test]
    fn no_configured_ttl_never_expires() {
        let mut cache = Cache::new();
        let key = CacheKey::new("local", "a.mld", None);
        cache.insert(key.clone(), "body".into(), None, "sha256:x".into(), 0);
        assert!(cache.get(&key, 1_000_000_000).is_some());
    }

    #[test]
    fn invalidate_removes_entry() {
        let mut cache = Cache::new();
        let key = CacheKey::new("local", "a.mld", None);
        cache.insert(key.clone(), "body".into(), None, "sha256:x".into(), 0);
        cache.invalidate(&key);
        assert!(cache.get(&key, 0).is_none());
    }
}
