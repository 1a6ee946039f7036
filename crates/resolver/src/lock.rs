//! `mlld.lock.json` (§6.2): pins each registry/URL import by content hash,
//! source URL, and fetch time. Written atomically (temp file + rename),
//! the same pattern as a snapshot/checkpoint writer guarding against a
//! crash mid-write.

use indexmap::IndexMap;
use mlld_errors::{ImportError, SystemError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LockConfig {
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "user".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockEntry {
    pub version: String,
    pub resolved: String,
    pub source: String,
    #[serde(rename = "sourceUrl")]
    pub source_url: String,
    pub integrity: String,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: String,
    #[serde(rename = "registryVersion")]
    pub registry_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(rename = "lockfileVersion")]
    pub lockfile_version: u32,
    #[serde(default)]
    pub config: LockConfig,
    #[serde(default)]
    pub modules: IndexMap<String, LockEntry>,
}

impl Default for LockFile {
    fn default() -> Self {
        Self {
            lockfile_version: 1,
            config: LockConfig::default(),
            modules: IndexMap::new(),
        }
    }
}

impl LockFile {
    /// Load from disk, defaulting to an empty lock file if none exists yet
    /// (a project's first registry import creates it).
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| ImportError::ResolverUnavailable {
                reference: format!("malformed lock file {}: {e}", path.display()),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ImportError::FileNotFound {
                path: format!("{}: {e}", path.display()),
            }),
        }
    }

    /// Atomic replace: never leaves a partially written lock file (§6.2).
    pub fn save(&self, path: &Path) -> Result<(), SystemError> {
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| SystemError::IoError(std::io::Error::other(e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(body.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn pin(&mut self, name: impl Into<String>, entry: LockEntry) {
        self.modules.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&LockEntry> {
        self.modules.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry() -> LockEntry {
        LockEntry {
            version: "1.0.0".into(),
            resolved: "sha256:abc".into(),
            source: "@alice/utils".into(),
            source_url: "https://example.com/alice/utils".into(),
            integrity: "sha256:abc".into(),
            fetched_at: "2026-01-01T00:00:00Z".into(),
            registry_version: "1.0.0".into(),
        }
    }

    #[test]
    fn round_trip_preserves_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mlld.lock.json");
        let mut lock = LockFile::default();
        lock.pin("@alice/utils", entry());
        lock.save(&path).unwrap();

        let loaded = LockFile::load(&path).unwrap();
        assert_eq!(loaded.get("@alice/utils").unwrap().resolved, "sha256:abc");
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mlld.lock.json");
        let lock = LockFile::load(&path).unwrap();
        assert!(lock.modules.is_empty());
        assert_eq!(lock.lockfile_version, 1);
    }

    #[test]
    fn save_never_leaves_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mlld.lock.json");
        let lock = LockFile::default();
        lock.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.exists());
    }
}
