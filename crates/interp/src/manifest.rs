//! `module.yml` parsing (§6.4). The registry publishing workflow itself is
//! out of scope (§1 non-goals), but reading a module's manifest to surface
//! its declared language needs is ambient metadata the core's validator
//! (`validate::Report::needs`) consumes, so it lives here rather than in
//! `mlld_eval`. Parsed with `serde_yaml`, the same crate
//! `examples/arthur-zhang-just-bash` reaches for alongside `serde_json` and
//! `toml` for its own config-file variety.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot read module manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed module manifest {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Library,
    App,
    Command,
    Skill,
    Environment,
}

/// Per-language detail block (`needs-js`, `needs-node`, `needs-py`,
/// `needs-sh`) — shape is intentionally open since each runtime's detail
/// fields are its own concern; the manifest only needs to round-trip them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NeedsDetail {
    #[serde(flatten)]
    pub fields: std::collections::BTreeMap<String, serde_yaml::Value>,
}

fn default_entry() -> String {
    "index.mld".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    pub author: String,
    #[serde(rename = "type")]
    pub module_type: ModuleType,
    pub about: String,
    pub version: String,
    /// Must be `"CC0"` for registry publication (§6.4); the core does not
    /// enforce that here since publishing itself is out of scope — it only
    /// surfaces the value for the (out-of-scope) registry-PR collaborator.
    pub license: String,
    #[serde(default = "default_entry")]
    pub entry: String,
    /// Subset of `{js, node, py, sh}`.
    #[serde(default)]
    pub needs: BTreeSet<String>,
    #[serde(rename = "needs-js", default)]
    pub needs_js: Option<NeedsDetail>,
    #[serde(rename = "needs-node", default)]
    pub needs_node: Option<NeedsDetail>,
    #[serde(rename = "needs-py", default)]
    pub needs_py: Option<NeedsDetail>,
    #[serde(rename = "needs-sh", default)]
    pub needs_sh: Option<NeedsDetail>,
}

impl ModuleManifest {
    pub fn parse(raw: &str, path: &str) -> Result<Self, ManifestError> {
        serde_yaml::from_str(raw).map_err(|source| ManifestError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    /// Registry publication requires a `CC0` license (§6.4).
    pub fn is_registry_eligible(&self) -> bool {
        self.license.eq_ignore_ascii_case("cc0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
name: my-module
author: ada
type: library
about: Does a thing.
version: "1.0.0"
license: CC0
needs: [js, py]
"#;

    #[test]
    fn parses_required_and_defaulted_fields() {
        let manifest = ModuleManifest::parse(MANIFEST, "module.yml").unwrap();
        assert_eq!(manifest.name, "my-module");
        assert_eq!(manifest.module_type, ModuleType::Library);
        assert_eq!(manifest.entry, "index.mld");
        assert!(manifest.needs.contains("js"));
        assert!(manifest.needs.contains("py"));
        assert!(manifest.is_registry_eligible());
    }

    #[test]
    fn non_cc0_license_is_not_registry_eligible() {
        let raw = MANIFEST.replace("license: CC0", "license: MIT");
        let manifest = ModuleManifest::parse(&raw, "module.yml").unwrap();
        assert!(!manifest.is_registry_eligible());
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = ModuleManifest::parse("not: [valid", "module.yml").unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }
}
