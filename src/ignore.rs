//! Source discovery filter

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        let defaults = [
            // vendored and generated trees
            "vendor/", "testdata/", "third_party/", "node_modules/", "target/",
            ".git/", ".cpg/", ".vscode/", ".idea/",
            // generated Go sources
            "*.pb.go", "*_gen.go", "zz_generated*.go",
        ];
        for pattern in defaults {
            builder.add_line(None, pattern).ok();
        }

        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("ignoring bad exclude pattern '{}': {}", pattern, e);
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched_path_or_any_parents(path, is_dir).is_ignore()
    }
}

/// Every non-ignored file under `root`, sorted
pub fn discover(root: &Path, extra_excludes: &[String]) -> Vec<PathBuf> {
    let filter = IgnoreFilter::new(root, extra_excludes);
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| !filter.is_ignored(path, false))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_skip_vendor_and_generated() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("vendor/lib")).unwrap();
        fs::create_dir_all(root.join("api")).unwrap();
        fs::write(root.join("vendor/lib/lib.go"), "package lib\n").unwrap();
        fs::write(root.join("api/api.pb.go"), "package api\n").unwrap();
        fs::write(root.join("api/api.go"), "package api\n").unwrap();

        let files = discover(root, &[]);
        assert_eq!(files, vec![root.join("api/api.go")]);
    }

    #[test]
    fn test_extra_excludes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("main.go"), "package main\n").unwrap();
        fs::write(root.join("main_test.go"), "package main\n").unwrap();

        let files = discover(root, &["*_test.go".to_string()]);
        assert_eq!(files, vec![root.join("main.go")]);
    }
}
