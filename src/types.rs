//! Shared types passed between pipeline stages.
//!
//! The scanner produces a [`DirectoryMap`], the layout stage turns it into
//! an [`ArtifactMap`], and the navigation indexer reduces that to a list of
//! [`NavigationEntry`] values.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Extension given to every generated page, whatever the source type.
pub const RENDERED_EXTENSION: &str = "html";

/// Names starting with this character are skipped at every depth.
pub const HIDDEN_MARKER: char = '.';

/// Directory path (relative to the project root, root = empty path) to the
/// supported file names it directly contains, sorted by name.
pub type DirectoryMap = BTreeMap<PathBuf, Vec<String>>;

/// Destination page path to the absolute source path it is rendered from.
pub type ArtifactMap = BTreeMap<PathBuf, PathBuf>;

/// The closed set of source document types.
///
/// Each variant owns exactly one extension; matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Python file whose docstring blocks carry reStructuredText prose.
    AnnotatedCode,
    ReStructuredText,
    Markdown,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::AnnotatedCode,
        SourceKind::ReStructuredText,
        SourceKind::Markdown,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::AnnotatedCode => "py",
            SourceKind::ReStructuredText => "rst",
            SourceKind::Markdown => "md",
        }
    }

    pub fn from_extension(ext: &str) -> Option<SourceKind> {
        Self::ALL
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }

    pub fn from_path(path: &Path) -> Option<SourceKind> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// A supported source file found during the scan.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// File stem, used as the destination page name.
    pub name: String,
    pub kind: SourceKind,
}

impl SourceEntry {
    /// Classify a path, returning `None` for unsupported extensions.
    pub fn from_path(path: &Path) -> Option<SourceEntry> {
        let kind = SourceKind::from_path(path)?;
        let name = path.file_stem()?.to_string_lossy().to_string();
        Some(SourceEntry {
            path: path.to_path_buf(),
            name,
            kind,
        })
    }

    /// Page file name: the stem with the rendered extension.
    pub fn page_name(&self) -> String {
        format!("{}.{}", self.name, RENDERED_EXTENSION)
    }
}

/// One source file paired with the page generated from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputArtifact {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl OutputArtifact {
    /// Mirror `entry` (which lives in `rel_dir` under the project root) into
    /// `output_root`.
    pub fn mirror(output_root: &Path, rel_dir: &Path, entry: &SourceEntry) -> OutputArtifact {
        OutputArtifact {
            source: entry.path.clone(),
            destination: output_root.join(rel_dir).join(entry.page_name()),
        }
    }
}

/// Root-relative, `/`-separated page path prefixed with the nav namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NavigationEntry(pub String);

impl NavigationEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NavigationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a file or directory name is hidden.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}
