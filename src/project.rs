//! Project discovery and selection.
//!
//! A project is a non-hidden sub-directory of the source root. The CLI picks
//! one either by name (`--project`) or by asking on the terminal.

use crate::types::is_hidden;
use serde::Serialize;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Source root not found: {0}")]
    SourceRootNotFound(PathBuf),
    #[error("No projects found in {0}")]
    NoProjects(PathBuf),
    #[error("Unknown project: {0}")]
    Unknown(String),
    #[error("No project selected")]
    NoSelection,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
}

/// Non-hidden sub-directories of `source_root`, sorted by name.
pub fn discover(source_root: &Path) -> Result<Vec<Project>, ProjectError> {
    if !source_root.is_dir() {
        return Err(ProjectError::SourceRootNotFound(source_root.to_path_buf()));
    }

    let mut projects = Vec::new();
    for entry in fs::read_dir(source_root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) || !entry.file_type()?.is_dir() {
            continue;
        }
        projects.push(Project {
            name,
            path: entry.path(),
        });
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));

    if projects.is_empty() {
        return Err(ProjectError::NoProjects(source_root.to_path_buf()));
    }
    Ok(projects)
}

pub fn find(candidates: &[Project], name: &str) -> Result<Project, ProjectError> {
    candidates
        .iter()
        .find(|p| p.name == name)
        .cloned()
        .ok_or_else(|| ProjectError::Unknown(name.to_string()))
}

/// Ask for a project on `output`, reading answers from `input`.
///
/// Accepts a 1-based menu number or a project name. Invalid answers are
/// reported and asked again; end of input is [`ProjectError::NoSelection`].
pub fn prompt<R: BufRead, W: Write>(
    candidates: &[Project],
    input: &mut R,
    output: &mut W,
) -> Result<Project, ProjectError> {
    if candidates.is_empty() {
        return Err(ProjectError::NoSelection);
    }

    writeln!(output, "Projects:")?;
    for (i, project) in candidates.iter().enumerate() {
        writeln!(output, "{:>3}. {}", i + 1, project.name)?;
    }

    let mut line = String::new();
    loop {
        write!(output, "Select a project [1-{}]: ", candidates.len())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Err(ProjectError::NoSelection);
        }
        let answer = line.trim();

        let chosen = match answer.parse::<usize>() {
            Ok(n) if (1..=candidates.len()).contains(&n) => Some(&candidates[n - 1]),
            _ => candidates.iter().find(|p| p.name == answer),
        };
        match chosen {
            Some(project) => return Ok(project.clone()),
            None => writeln!(output, "Invalid selection: {answer:?}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_tree;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn candidates() -> Vec<Project> {
        ["alpha", "beta"]
            .iter()
            .map(|n| Project {
                name: n.to_string(),
                path: PathBuf::from("source").join(n),
            })
            .collect()
    }

    fn run_prompt(answers: &str) -> (Result<Project, ProjectError>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = prompt(&candidates(), &mut input, &mut output);
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn discover_lists_visible_directories_sorted() {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("zeta/a.md", ""),
                ("alpha/b.md", ""),
                (".hidden/c.md", ""),
                ("loose.md", ""),
            ],
        );
        fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let names: Vec<String> = discover(tmp.path())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["alpha", "empty", "zeta"]);
    }

    #[test]
    fn discover_missing_root() {
        let tmp = TempDir::new().unwrap();
        let result = discover(&tmp.path().join("nope"));
        assert!(matches!(result, Err(ProjectError::SourceRootNotFound(_))));
    }

    #[test]
    fn discover_without_projects() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("only-a-file.md", "")]);
        let result = discover(tmp.path());
        assert!(matches!(result, Err(ProjectError::NoProjects(_))));
    }

    #[test]
    fn find_by_name() {
        assert_eq!(find(&candidates(), "beta").unwrap().name, "beta");
        assert!(matches!(
            find(&candidates(), "gamma"),
            Err(ProjectError::Unknown(n)) if n == "gamma"
        ));
    }

    #[test]
    fn prompt_accepts_number() {
        let (result, output) = run_prompt("2\n");
        assert_eq!(result.unwrap().name, "beta");
        assert!(output.contains("  1. alpha"));
        assert!(output.contains("  2. beta"));
    }

    #[test]
    fn prompt_accepts_name() {
        let (result, _) = run_prompt("alpha\n");
        assert_eq!(result.unwrap().name, "alpha");
    }

    #[test]
    fn prompt_reprompts_on_invalid_input() {
        let (result, output) = run_prompt("7\nnope\n1\n");
        assert_eq!(result.unwrap().name, "alpha");
        assert_eq!(output.matches("Invalid selection").count(), 2);
        assert_eq!(output.matches("Select a project").count(), 3);
    }

    #[test]
    fn prompt_end_of_input_is_no_selection() {
        let (result, _) = run_prompt("0\n");
        assert!(matches!(result, Err(ProjectError::NoSelection)));
    }
}
