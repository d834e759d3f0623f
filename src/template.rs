//! Page template and static assets.
//!
//! A template set is three files:
//!
//! - `base.html`: the page shell, with exactly one `{{ body_content }}`
//!   placeholder where the rendered document goes
//! - `style.css` and `script.js`: copied byte-for-byte into the output root
//!
//! When no template directory is configured, the built-in set is used. Its
//! shell is generated with maud; the CSS and JS are embedded at compile time.

use maud::{DOCTYPE, PreEscaped, html};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BASE_TEMPLATE_FILE: &str = "base.html";
pub const STYLE_FILE: &str = "style.css";
pub const SCRIPT_FILE: &str = "script.js";

/// Name of the single substitution point in the base template.
pub const BODY_PLACEHOLDER: &str = "body_content";

const CSS_STATIC: &str = include_str!("../static/style.css");
const JS_STATIC: &str = include_str!("../static/script.js");

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Cannot read template file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Template file {path} is not valid UTF-8: {source}")]
    NotUtf8 {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[error("Base template has no {{{{ body_content }}}} placeholder")]
    MissingPlaceholder,
    #[error("Base template has {0} {{{{ body_content }}}} placeholders, expected one")]
    DuplicatePlaceholder(usize),
}

/// A base page template split around its body placeholder.
#[derive(Debug, Clone)]
pub struct BaseTemplate {
    text: String,
    slot: Range<usize>,
}

impl BaseTemplate {
    pub fn parse(text: impl Into<String>) -> Result<BaseTemplate, TemplateError> {
        let text = text.into();
        let slots = find_placeholders(&text);
        match slots.len() {
            0 => Err(TemplateError::MissingPlaceholder),
            1 => {
                let slot = slots.into_iter().next().unwrap_or_default();
                Ok(BaseTemplate { text, slot })
            }
            n => Err(TemplateError::DuplicatePlaceholder(n)),
        }
    }

    /// Substitute `fragment` for the placeholder, producing a full page.
    pub fn fill(&self, fragment: &str) -> String {
        let mut page = String::with_capacity(self.text.len() + fragment.len());
        page.push_str(&self.text[..self.slot.start]);
        page.push_str(fragment);
        page.push_str(&self.text[self.slot.end..]);
        page
    }
}

/// Byte ranges of every `{{ body_content }}` (inner whitespace optional).
fn find_placeholders(text: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut offset = 0;
    while let Some(open) = text[offset..].find("{{") {
        let start = offset + open;
        let Some(close) = text[start + 2..].find("}}") else {
            break;
        };
        let end = start + 2 + close + 2;
        if text[start + 2..end - 2].trim() == BODY_PLACEHOLDER {
            found.push(start..end);
        }
        offset = end;
    }
    found
}

/// Everything the layout and render stages need from a template set.
#[derive(Debug, Clone)]
pub struct TemplateAssets {
    pub base: BaseTemplate,
    pub style: Vec<u8>,
    pub script: Vec<u8>,
}

impl TemplateAssets {
    pub fn builtin() -> TemplateAssets {
        let base = BaseTemplate::parse(builtin_base_document())
            .expect("built-in template has one placeholder");
        TemplateAssets {
            base,
            style: CSS_STATIC.as_bytes().to_vec(),
            script: JS_STATIC.as_bytes().to_vec(),
        }
    }

    /// Load `base.html`, `style.css` and `script.js` from `dir`.
    pub fn load(dir: &Path) -> Result<TemplateAssets, TemplateError> {
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read(&path).map_err(|source| TemplateError::Read { path, source })
        };
        let base_bytes = read(BASE_TEMPLATE_FILE)?;
        let base_text = String::from_utf8(base_bytes).map_err(|source| TemplateError::NotUtf8 {
            path: dir.join(BASE_TEMPLATE_FILE),
            source,
        })?;
        let base = BaseTemplate::parse(base_text)?;
        Ok(TemplateAssets {
            base,
            style: read(STYLE_FILE)?,
            script: read(SCRIPT_FILE)?,
        })
    }

    /// `dir` if given, otherwise the built-in set.
    pub fn resolve(dir: Option<&Path>) -> Result<TemplateAssets, TemplateError> {
        match dir {
            Some(d) => Self::load(d),
            None => Ok(Self::builtin()),
        }
    }

    /// The static files copied into the output root, by file name.
    pub fn static_files(&self) -> [(&'static str, &[u8]); 2] {
        [
            (STYLE_FILE, self.style.as_slice()),
            (SCRIPT_FILE, self.script.as_slice()),
        ]
    }
}

/// Assets are linked as `/style.css` and `/script.js`, so pages are styled
/// only when `<output_root>/<project>/` is served as the web root.
fn builtin_base_document() -> String {
    let slot = format!("{{{{ {} }}}}", BODY_PLACEHOLDER);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                link rel="stylesheet" href={ "/" (STYLE_FILE) };
                script src={ "/" (SCRIPT_FILE) } defer {}
            }
            body {
                main.content {
                    (PreEscaped(slot))
                }
            }
        }
    }
    .into_string()
}
