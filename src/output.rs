//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! source/notes
//! ./
//!     intro.md
//!     setup.py
//! guide/
//!     usage.rst
//!
//! 3 files in 2 directories
//! ```
//!
//! ## Build
//!
//! ```text
//! Pages
//!     intro.md → intro.html
//!     guide/usage.rst → guide/usage.html
//!
//! Collisions
//!     x.html: kept x.rst, replaced x.md
//!
//! Failures
//!     bad.rst: line 2: title underline too short
//!
//! Navigation
//!     site/guide/usage.html
//!     site/intro.html
//!
//! Generated 2 pages in output/notes (1 failed)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::pipeline::SiteReport;
use crate::project::Project;
use crate::scan::file_count;
use crate::types::DirectoryMap;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Display `path` relative to `root` when it lives below it.
fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn count(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

// ============================================================================
// Check
// ============================================================================

pub fn format_scan_output(map: &DirectoryMap, project_root: &Path) -> Vec<String> {
    let mut lines = vec![project_root.display().to_string()];

    for (dir, files) in map {
        if dir.as_os_str().is_empty() {
            lines.push("./".to_string());
        } else {
            lines.push(format!("{}/", dir.display()));
        }
        for name in files {
            lines.push(format!("{}{}", indent(1), name));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{} in {}",
        count(file_count(map), "file", "files"),
        count(map.len(), "directory", "directories")
    ));
    lines
}

pub fn print_scan_output(map: &DirectoryMap, project_root: &Path) {
    for line in format_scan_output(map, project_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &SiteReport) -> Vec<String> {
    let out = &report.output_root;
    let project_root = &report.project_root;
    let mut lines = Vec::new();

    if !report.pages.is_empty() {
        lines.push("Pages".to_string());
        for page in &report.pages {
            lines.push(format!(
                "{}{} → {}",
                indent(1),
                relative(&page.source, project_root),
                relative(&page.destination, out)
            ));
        }
    }

    if !report.collisions.is_empty() {
        push_gap(&mut lines);
        lines.push("Collisions".to_string());
        for c in &report.collisions {
            lines.push(format!(
                "{}{}: kept {}, replaced {}",
                indent(1),
                relative(&c.destination, out),
                relative(&c.kept, project_root),
                relative(&c.replaced, project_root)
            ));
        }
    }

    if !report.failures.is_empty() {
        push_gap(&mut lines);
        lines.push("Failures".to_string());
        for f in &report.failures {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                relative(&f.source, project_root),
                f.message
            ));
        }
    }

    if !report.navigation.is_empty() {
        push_gap(&mut lines);
        lines.push("Navigation".to_string());
        for entry in &report.navigation {
            lines.push(format!("{}{}", indent(1), entry));
        }
    }

    push_gap(&mut lines);
    let mut summary = format!(
        "Generated {} in {}",
        count(report.pages.len(), "page", "pages"),
        out.display()
    );
    if !report.failures.is_empty() {
        summary.push_str(&format!(" ({} failed)", report.failures.len()));
    }
    lines.push(summary);
    lines
}

pub fn print_build_output(report: &SiteReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}

fn push_gap(lines: &mut Vec<String>) {
    if !lines.is_empty() {
        lines.push(String::new());
    }
}

// ============================================================================
// List
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

pub fn format_project_list(projects: &[Project]) -> Vec<String> {
    projects
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{} {}", format_index(i + 1), p.name))
        .collect()
}

pub fn print_project_list(projects: &[Project]) {
    for line in format_project_list(projects) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Collision;
    use crate::pipeline::{RenderFailure, Stage};
    use crate::types::{NavigationEntry, OutputArtifact};
    use std::path::PathBuf;

    fn report() -> SiteReport {
        SiteReport {
            project: "notes".into(),
            project_root: PathBuf::from("/src/notes"),
            output_root: PathBuf::from("/out/notes"),
            stage: Stage::Done,
            pages: vec![
                OutputArtifact {
                    source: PathBuf::from("/src/notes/guide/usage.rst"),
                    destination: PathBuf::from("/out/notes/guide/usage.html"),
                },
                OutputArtifact {
                    source: PathBuf::from("/src/notes/x.rst"),
                    destination: PathBuf::from("/out/notes/x.html"),
                },
            ],
            collisions: vec![Collision {
                destination: PathBuf::from("/out/notes/x.html"),
                kept: PathBuf::from("/src/notes/x.rst"),
                replaced: PathBuf::from("/src/notes/x.md"),
            }],
            failures: vec![],
            navigation: vec![
                NavigationEntry("site/guide/usage.html".into()),
                NavigationEntry("site/x.html".into()),
            ],
        }
    }

    #[test]
    fn scan_output_lists_directories_and_files() {
        let mut map = DirectoryMap::new();
        map.insert(PathBuf::new(), vec!["intro.md".into(), "setup.py".into()]);
        map.insert(PathBuf::from("guide"), vec!["usage.rst".into()]);

        let lines = format_scan_output(&map, Path::new("source/notes"));
        assert_eq!(
            lines,
            vec![
                "source/notes",
                "./",
                "    intro.md",
                "    setup.py",
                "guide/",
                "    usage.rst",
                "",
                "3 files in 2 directories",
            ]
        );
    }

    #[test]
    fn scan_output_singular_counts() {
        let mut map = DirectoryMap::new();
        map.insert(PathBuf::new(), vec!["a.md".into()]);
        let lines = format_scan_output(&map, Path::new("p"));
        assert_eq!(lines.last().unwrap(), "1 file in 1 directory");
    }

    #[test]
    fn build_output_sections() {
        let lines = format_build_output(&report());
        assert_eq!(
            lines,
            vec![
                "Pages",
                "    guide/usage.rst → guide/usage.html",
                "    x.rst → x.html",
                "",
                "Collisions",
                "    x.html: kept x.rst, replaced x.md",
                "",
                "Navigation",
                "    site/guide/usage.html",
                "    site/x.html",
                "",
                "Generated 2 pages in /out/notes",
            ]
        );
    }

    #[test]
    fn build_output_reports_failures() {
        let mut r = report();
        r.collisions.clear();
        r.failures.push(RenderFailure {
            source: PathBuf::from("/src/notes/bad.rst"),
            destination: PathBuf::from("/out/notes/bad.html"),
            message: "line 2: title underline too short".into(),
        });

        let lines = format_build_output(&r);
        assert!(lines.contains(&"Failures".to_string()));
        assert!(lines.contains(&"    bad.rst: line 2: title underline too short".to_string()));
        assert_eq!(lines.last().unwrap(), "Generated 2 pages in /out/notes (1 failed)");
    }

    #[test]
    fn build_output_empty_project() {
        let r = SiteReport {
            pages: vec![],
            collisions: vec![],
            navigation: vec![],
            ..report()
        };
        let lines = format_build_output(&r);
        assert_eq!(lines, vec!["Generated 0 pages in /out/notes"]);
    }

    #[test]
    fn project_list_is_numbered() {
        let projects = vec![
            Project {
                name: "alpha".into(),
                path: PathBuf::from("source/alpha"),
            },
            Project {
                name: "beta".into(),
                path: PathBuf::from("source/beta"),
            },
        ];
        assert_eq!(format_project_list(&projects), vec!["001 alpha", "002 beta"]);
    }
}
