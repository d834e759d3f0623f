//! Output tree removal.
//!
//! Every build starts from an empty output root. The eraser walks the old
//! tree depth-first, contents before their directory, removing files and
//! then the directories they leave empty. Symbolic links are unlinked, never
//! followed. Any other kind of entry (fifo, socket, device node) stops the
//! run: leaving it behind would mean stale output survives the rebuild.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum EraseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Output path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Cannot classify entry as file or directory: {0}")]
    UnexpectedEntry(PathBuf),
}

/// Remove `path` and everything below it. A missing path is a no-op.
pub fn erase(path: &Path) -> Result<(), EraseError> {
    if fs::symlink_metadata(path).is_err() {
        return Ok(());
    }
    erase_contents(path)?;
    fs::remove_dir(path)?;
    debug!(path = %path.display(), "removed output root");
    Ok(())
}

/// Remove everything below `path`, keeping `path` itself.
pub fn erase_contents(path: &Path) -> Result<(), EraseError> {
    let metadata = fs::symlink_metadata(path)?;
    if !metadata.is_dir() {
        return Err(EraseError::NotADirectory(path.to_path_buf()));
    }

    let walker = WalkDir::new(path)
        .follow_links(false)
        .contents_first(true)
        .min_depth(1);

    for entry in walker {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::remove_dir(entry.path())?;
        } else if file_type.is_file() || file_type.is_symlink() {
            fs::remove_file(entry.path())?;
        } else {
            return Err(EraseError::UnexpectedEntry(entry.path().to_path_buf()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{list_dirs, list_files, write_tree};
    use tempfile::TempDir;

    #[test]
    fn erase_removes_nested_tree_and_root() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        write_tree(
            &out,
            &[
                ("index.html", ""),
                ("a/b/c.html", ""),
                ("a/d.html", ""),
                (".hidden/x", ""),
            ],
        );

        erase(&out).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn erase_contents_keeps_root() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        write_tree(&out, &[("a/b/c.html", ""), ("style.css", "")]);
        fs::create_dir_all(out.join("empty/deeper")).unwrap();

        erase_contents(&out).unwrap();

        assert!(out.is_dir());
        assert!(list_files(&out).is_empty());
        assert!(list_dirs(&out).is_empty());
    }

    #[test]
    fn erase_missing_path_is_noop() {
        let tmp = TempDir::new().unwrap();
        erase(&tmp.path().join("never-built")).unwrap();
    }

    #[test]
    fn erase_file_path_is_error() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("out", "not a directory")]);

        let result = erase(&tmp.path().join("out"));
        assert!(matches!(result, Err(EraseError::NotADirectory(_))));
        assert!(tmp.path().join("out").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_unlinked_without_touching_target() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        write_tree(tmp.path(), &[("keep/precious.md", "keep me")]);
        fs::create_dir_all(&out).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("keep"), out.join("dir-link")).unwrap();
        std::os::unix::fs::symlink(
            tmp.path().join("keep/precious.md"),
            out.join("file-link.md"),
        )
        .unwrap();

        erase(&out).unwrap();

        assert!(!out.exists());
        assert_eq!(
            fs::read_to_string(tmp.path().join("keep/precious.md")).unwrap(),
            "keep me"
        );
    }

    #[cfg(unix)]
    #[test]
    fn fifo_aborts_erase() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let fifo = out.join("pipe");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());

        let result = erase(&out);
        assert!(matches!(result, Err(EraseError::UnexpectedEntry(p)) if p == fifo));
    }
}
