//! `LoadContent` / `LoadContentArray` — the value returned by file/URL
//! loads (§3.1).

use crate::lazy::LazyField;
use crate::value::Value;
use indexmap::IndexMap;

/// Content returned by a file/URL load. Coerces to `content` when used as a
/// string.
#[derive(Debug, Clone)]
pub struct LoadContent {
    pub content: String,
    pub filename: Option<String>,
    pub relative: Option<String>,
    pub absolute: Option<String>,
    pub tokens: LazyField<u64>,
    pub tokest: Option<u64>,
    pub fm: LazyField<Value>,
    pub json: LazyField<Value>,
    pub url: Option<String>,
    pub domain: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub md: Option<String>,
    pub headers: Option<IndexMap<String, String>>,
    pub status: Option<u16>,
    pub content_type: Option<String>,
}

impl LoadContent {
    /// A minimal file-backed `LoadContent` with eager estimate (`tokest`)
    /// and lazy exact token count / frontmatter / JSON parse.
    pub fn from_file(content: String, filename: String, absolute: String) -> Self {
        let tokest = estimate_tokens(&content);
        let eager_content = content.clone();
        let tokens = LazyField::new("tokens", move || Ok(count_tokens(&eager_content)));
        let fm_content = content.clone();
        let fm = LazyField::new("fm", move || Ok(parse_frontmatter(&fm_content)));
        let json_content = content.clone();
        let json = LazyField::new("json", move || {
            serde_json::from_str::<serde_json::Value>(&json_content)
                .map(Value::from_json)
                .map_err(|e| e.to_string())
        });
        Self {
            content,
            filename: Some(filename),
            relative: None,
            absolute: Some(absolute),
            tokens,
            tokest: Some(tokest),
            fm,
            json,
            url: None,
            domain: None,
            title: None,
            description: None,
            html: None,
            text: None,
            md: None,
            headers: None,
            status: None,
            content_type: None,
        }
    }

    pub fn with_relative(mut self, relative: String) -> Self {
        self.relative = Some(relative);
        self
    }
}

/// Heuristic eager estimate: ~4 characters per token, matching the common
/// whitespace-and-punctuation-insensitive rule of thumb used for preview
/// display before the real tokenizer runs.
fn estimate_tokens(content: &str) -> u64 {
    (content.chars().count() as u64).div_ceil(4)
}

/// Exact whitespace-delimited token count, standing in for a real
/// tokenizer call (out of scope for this crate).
fn count_tokens(content: &str) -> u64 {
    content.split_whitespace().count() as u64
}

/// Parse a leading `---\n...\n---` YAML-ish frontmatter block into an
/// object `Value`. Returns `Value::null()` when no frontmatter is present.
fn parse_frontmatter(content: &str) -> Value {
    let Some(rest) = content.strip_prefix("---\n") else {
        return Value::null();
    };
    let Some(end) = rest.find("\n---") else {
        return Value::null();
    };
    let block = &rest[..end];
    let mut obj = IndexMap::new();
    for line in block.lines() {
        if let Some((key, val)) = line.split_once(':') {
            obj.insert(key.trim().to_string(), Value::string(val.trim().to_string()));
        }
    }
    Value::object(obj)
}

/// An array of [`LoadContent`] produced by a glob pattern, with the pattern
/// retained for diagnostics.
#[derive(Debug, Clone)]
pub struct LoadContentArray {
    pub items: Vec<LoadContent>,
    pub pattern: String,
}

impl LoadContentArray {
    pub fn new(pattern: impl Into<String>, items: Vec<LoadContent>) -> Self {
        Self {
            items,
            pattern: pattern.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_file_estimates_tokens_eagerly_and_counts_lazily() {
        let lc = LoadContent::from_file("hello world".into(), "f.txt".into(), "/f.txt".into());
        assert_eq!(lc.tokest, Some(3));
        assert_eq!(lc.tokens.force().unwrap(), 2);
    }

    #[test]
    fn frontmatter_parses_leading_block() {
        let lc = LoadContent::from_file(
            "---\ntitle: Hello\n---\nbody text".into(),
            "f.md".into(),
            "/f.md".into(),
        );
        let fm = lc.fm.force().unwrap();
        assert_eq!(
            fm.get_field("title"),
            Some(Value::string("Hello".to_string()))
        );
    }

    #[test]
    fn missing_frontmatter_is_null() {
        let lc = LoadContent::from_file("no frontmatter here".into(), "f.md".into(), "/f.md".into());
        assert!(lc.fm.force().unwrap().is_null());
    }
}
