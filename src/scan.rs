//! Source tree discovery.
//!
//! Stage 1 of the pipeline. Walks a project directory and records every
//! supported source file under the relative path of the directory that
//! directly contains it:
//!
//! ```text
//! notes/                      DirectoryMap
//! ├── intro.md           →    ""        => ["intro.md", "setup.py"]
//! ├── setup.py                "guide"   => ["usage.rst"]
//! ├── todo.txt                               (unsupported, ignored)
//! ├── .draft/                                (hidden, never entered)
//! │   └── secret.md
//! ├── assets/                                (no supported files, no key)
//! │   └── logo.png
//! └── guide/
//!     └── usage.rst
//! ```
//!
//! Symbolic links are never followed. Anything that is not a regular file
//! or a directory is skipped.

use crate::types::{DirectoryMap, SourceEntry, is_hidden};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub fn scan(root: &Path) -> Result<DirectoryMap, ScanError> {
    let metadata = match fs::metadata(root) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ScanError::NotFound(root.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut map = DirectoryMap::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !entry_is_hidden(e));

    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            debug!(path = %entry.path().display(), "skipping non-regular entry");
            continue;
        }
        let Some(source) = SourceEntry::from_path(entry.path()) else {
            debug!(path = %entry.path().display(), "skipping unsupported file");
            continue;
        };
        let rel_dir = relative_parent(root, &source.path);
        let name = entry.file_name().to_string_lossy().to_string();
        map.entry(rel_dir).or_default().push(name);
    }

    Ok(map)
}

/// Total number of files recorded in a directory map.
pub fn file_count(map: &DirectoryMap) -> usize {
    map.values().map(Vec::len).sum()
}

fn entry_is_hidden(entry: &DirEntry) -> bool {
    is_hidden(&entry.file_name().to_string_lossy())
}

/// Parent directory of `path` relative to `root`; the root maps to `""`.
fn relative_parent(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .ok()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
