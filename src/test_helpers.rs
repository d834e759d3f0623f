//! Shared test utilities for the sitemake test suite.
//!
//! Builds small project trees in a temp directory and flattens output trees
//! into sorted, `/`-separated relative paths so assertions read like a
//! directory listing.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_tree(tmp.path(), &[
//!     ("intro.md", "# Intro"),
//!     ("guide/usage.rst", "Usage\n=====\n"),
//! ]);
//!
//! assert_eq!(list_files(tmp.path()), vec!["guide/usage.rst", "intro.md"]);
//! assert_eq!(list_dirs(tmp.path()), vec!["guide"]);
//! ```

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write each `(relative path, contents)` pair under `root`, creating
/// parent directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
    }
}

// =========================================================================
// Tree listings
// =========================================================================

/// Every regular file below `root`, relative and sorted.
pub fn list_files(root: &Path) -> Vec<String> {
    list(root, |ft| ft.is_file())
}

/// Every directory below `root` (excluding `root`), relative and sorted.
pub fn list_dirs(root: &Path) -> Vec<String> {
    list(root, |ft| ft.is_dir())
}

fn list(root: &Path, keep: impl Fn(&fs::FileType) -> bool) -> Vec<String> {
    let mut paths: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| keep(&e.file_type()))
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    paths.sort();
    paths
}
