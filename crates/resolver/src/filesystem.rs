//! Filesystem abstraction so the local/project resolvers are testable
//! without touching the real disk (§1 ambient stack: "fakes over real I/O").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;
    /// Expand a glob pattern into matching file paths, sorted for
    /// deterministic iteration order.
    fn glob(&self, pattern: &str) -> std::io::Result<Vec<PathBuf>>;
}

#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn glob(&self, pattern: &str) -> std::io::Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = glob::glob(pattern)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?
            .filter_map(Result::ok)
            .collect();
        paths.sort();
        Ok(paths)
    }
}

/// An in-memory filesystem for tests: maps path strings to content, and
/// resolves "globs" via a simple prefix/suffix wildcard match (enough for
/// the `*.md`-style patterns used in fixtures, not a full glob grammar).
#[derive(Debug, Default)]
pub struct FakeFileSystem {
    pub files: HashMap<String, String>,
}

impl FakeFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        self.files
            .get(&path.to_string_lossy().to_string())
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "not found"))
    }

    fn glob(&self, pattern: &str) -> std::io::Result<Vec<PathBuf>> {
        let mut matches: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|path| simple_glob_match(pattern, path))
            .map(PathBuf::from)
            .collect();
        matches.sort();
        Ok(matches)
    }
}

fn simple_glob_match(pattern: &str, candidate: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == candidate,
        Some((prefix, suffix)) => candidate.starts_with(prefix) && candidate.ends_with(suffix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_fs_reads_registered_file() {
        let fs = FakeFileSystem::new().with_file("/a.md", "hello");
        assert_eq!(fs.read_to_string(Path::new("/a.md")).unwrap(), "hello");
    }

    #[test]
    fn fake_fs_glob_matches_wildcard() {
        let fs = FakeFileSystem::new()
            .with_file("/dir/a.md", "a")
            .with_file("/dir/b.md", "b")
            .with_file("/dir/c.txt", "c");
        let matches = fs.glob("/dir/*.md").unwrap();
        assert_eq!(matches, vec![PathBuf::from("/dir/a.md"), PathBuf::from("/dir/b.md")]);
    }
}
