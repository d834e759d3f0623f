//! Source document rendering.
//!
//! Each [`SourceKind`] turns its text into an HTML fragment, and the
//! [`Renderer`] wraps that fragment in the base template:
//!
//! | Kind | Fragment |
//! |------|----------|
//! | Markdown | pulldown-cmark, with tables, footnotes, strikethrough and task lists |
//! | reStructuredText | [`crate::rst`], body only (document title and docinfo dropped) |
//! | Annotated code | docstring prose as reST, code between docstrings as `code-block`s |
//!
//! Nothing is cached: every call reads the file again.

use crate::rst::{self, RstError};
use crate::template::BaseTemplate;
use crate::types::SourceKind;
use pulldown_cmark::{Options, Parser, html as md_html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Unsupported source type: {}", .0.display())]
    Unsupported(PathBuf),
    #[error("{}:{line}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl SourceKind {
    /// Convert document text to an HTML fragment.
    pub fn render(self, text: &str) -> Result<String, RstError> {
        match self {
            SourceKind::Markdown => Ok(markdown_to_html(text)),
            SourceKind::ReStructuredText => rst::render_body(text),
            SourceKind::AnnotatedCode => rst::render_body(&annotated_to_rst(text)?),
        }
    }
}

/// Wraps rendered documents in a base template.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    template: &'a BaseTemplate,
}

impl<'a> Renderer<'a> {
    pub fn new(template: &'a BaseTemplate) -> Self {
        Renderer { template }
    }

    /// Read `path`, render it according to its extension and return the
    /// complete page.
    pub fn render_file(&self, path: &Path) -> Result<String, RenderError> {
        let kind =
            SourceKind::from_path(path).ok_or_else(|| RenderError::Unsupported(path.into()))?;
        let text = fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.into(),
            source,
        })?;
        let fragment = kind.render(&text).map_err(|e| RenderError::Malformed {
            path: path.into(),
            line: e.line,
            message: e.message,
        })?;
        Ok(self.template.fill(&fragment))
    }

    /// Render `source` and write the page to `destination`.
    pub fn render_to(&self, source: &Path, destination: &Path) -> Result<(), RenderError> {
        let page = self.render_file(source)?;
        fs::write(destination, page).map_err(|source| RenderError::Io {
            path: destination.into(),
            source,
        })
    }
}

fn markdown_to_html(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

// ============================================================================
// Annotated code
// ============================================================================

const DOCSTRING_QUOTES: [&str; 2] = ["\"\"\"", "'''"];

/// Rewrite an annotated Python file as reStructuredText.
///
/// Docstrings that open at column zero are prose; everything else is code
/// and lands in `.. code-block:: python` directives between the prose
/// blocks. Indented docstrings (functions, classes) stay part of the code.
pub fn annotated_to_rst(text: &str) -> Result<String, RstError> {
    let mut out = String::new();
    let mut code: Vec<&str> = Vec::new();
    let mut open_string: Option<&'static str> = None;
    let mut lines = text.lines().enumerate();

    while let Some((idx, line)) = lines.next() {
        let quote = match open_string {
            None => DOCSTRING_QUOTES.into_iter().find(|q| line.starts_with(q)),
            Some(_) => None,
        };
        let Some(quote) = quote else {
            track_string(line, &mut open_string);
            code.push(line);
            continue;
        };

        flush_code(&mut out, &mut code);
        let rest = &line[quote.len()..];
        let mut prose = Vec::new();
        if let Some(end) = rest.find(quote) {
            prose.push(&rest[..end]);
        } else {
            prose.push(rest);
            let mut closed = false;
            for (_, l) in lines.by_ref() {
                if let Some(end) = l.find(quote) {
                    prose.push(&l[..end]);
                    closed = true;
                    break;
                }
                prose.push(l);
            }
            if !closed {
                return Err(RstError {
                    line: idx + 1,
                    message: "unterminated docstring".into(),
                });
            }
        }
        push_prose(&mut out, &prose);
    }
    flush_code(&mut out, &mut code);
    Ok(out)
}

/// Follow triple-quoted strings inside code so their lines are never
/// mistaken for docstring openers.
fn track_string(line: &str, open: &mut Option<&'static str>) {
    match *open {
        Some(q) => {
            if line.matches(q).count() % 2 == 1 {
                *open = None;
            }
        }
        None => {
            *open = DOCSTRING_QUOTES
                .into_iter()
                .find(|q| line.matches(q).count() % 2 == 1);
        }
    }
}

fn push_prose(out: &mut String, prose: &[&str]) {
    let Some((first, rest)) = prose.split_first() else {
        return;
    };
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut lines = vec![first.trim()];
    lines.extend(rest.iter().map(|l| strip_indent(l, indent).trim_end()));
    let start = lines.iter().position(|l| !l.is_empty());
    let end = lines.iter().rposition(|l| !l.is_empty());
    if let (Some(start), Some(end)) = (start, end) {
        out.push_str(&lines[start..=end].join("\n"));
        out.push_str("\n\n");
    }
}

/// Drop the first `width` whitespace characters of `line`.
fn strip_indent(line: &str, width: usize) -> &str {
    match line
        .char_indices()
        .take_while(|(_, c)| c.is_whitespace())
        .nth(width)
    {
        Some((at, _)) => &line[at..],
        None => line.trim_start(),
    }
}

fn flush_code(out: &mut String, code: &mut Vec<&str>) {
    let start = code.iter().position(|l| !l.trim().is_empty());
    let end = code.iter().rposition(|l| !l.trim().is_empty());
    if let (Some(start), Some(end)) = (start, end) {
        out.push_str(".. code-block:: python\n\n");
        for line in &code[start..=end] {
            if !line.trim().is_empty() {
                out.push_str("    ");
                out.push_str(line);
            }
            out.push('\n');
        }
        out.push('\n');
    }
    code.clear();
}
