//! reStructuredText to HTML.
//!
//! Covers the part of the language that notes and literate code use:
//!
//! - section titles (underline, or overline + underline), with levels
//!   assigned in order of first appearance
//! - paragraphs, `::` literal blocks, block quotes, transitions
//! - bullet, enumerated, field and definition lists
//! - `code-block`/`code`/`sourcecode`, `image` and admonition directives;
//!   comments and hyperlink targets
//! - inline ``literal``, **strong**, *emphasis*, `interpreted`, `` `text
//!   <url>`_ `` references and standalone URLs
//!
//! Like docutils, a lone top-level title at the start of the document is
//! the document title, and a field list right after it is bibliographic
//! metadata. Both are kept out of [`Document::body`].

use std::collections::BTreeMap;
use std::fmt::Write as _;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {line}: {message}")]
pub struct RstError {
    pub line: usize,
    pub message: String,
}

fn malformed(line: usize, message: impl Into<String>) -> RstError {
    RstError {
        line,
        message: message.into(),
    }
}

/// A parsed and rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    /// Bibliographic fields (`:Author:`, `:Date:` ...) in source order.
    pub docinfo: Vec<(String, String)>,
    /// HTML for everything else.
    pub body: String,
}

pub fn render_body(text: &str) -> Result<String, RstError> {
    Ok(parse(text)?.body)
}

pub fn parse(text: &str) -> Result<Document, RstError> {
    let lines = split_lines(text);
    let mut targets = Targets::new();
    let mut blocks = BlockParser::new(&lines, 0, &mut targets).parse()?;

    let title = take_document_title(&mut blocks);
    let docinfo = match blocks.first() {
        Some(Block::Fields(_)) => match blocks.remove(0) {
            Block::Fields(fields) => fields.into_iter().map(|f| (f.name, f.body)).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let ctx = HtmlWriter {
        levels: section_styles(&blocks),
        targets: &targets,
    };
    let mut body = String::new();
    ctx.blocks(&blocks, &mut body)?;

    Ok(Document {
        title,
        docinfo,
        body,
    })
}

// ============================================================================
// Block structure
// ============================================================================

#[derive(Debug, Clone)]
struct Line {
    no: usize,
    text: String,
}

impl Line {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start().len()
    }
}

/// Title adornment: the punctuation character and whether it has an overline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Style {
    ch: char,
    overline: bool,
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    body: String,
    line: usize,
}

#[derive(Debug, Clone)]
enum Block {
    Section {
        style: Style,
        title: String,
        line: usize,
    },
    Paragraph {
        text: String,
        line: usize,
    },
    Literal {
        text: String,
        language: Option<String>,
    },
    Bullets(Vec<Vec<Block>>),
    Enumerated {
        start: u32,
        items: Vec<Vec<Block>>,
    },
    Fields(Vec<Field>),
    Definitions(Vec<(String, usize, Vec<Block>)>),
    Quote(Vec<Block>),
    Admonition {
        kind: String,
        body: Vec<Block>,
    },
    Image {
        uri: String,
        alt: Option<String>,
    },
    Transition,
}

/// Hyperlink targets (`.. _name: url`), keyed by lowercased name.
type Targets = BTreeMap<String, String>;

const ADORNMENT_CHARS: &str = "=-~^\"'`#*+_<>";

const ADMONITIONS: &[&str] = &[
    "attention",
    "caution",
    "danger",
    "error",
    "hint",
    "important",
    "note",
    "tip",
    "warning",
];

fn split_lines(text: &str) -> Vec<Line> {
    text.lines()
        .enumerate()
        .map(|(i, l)| Line {
            no: i + 1,
            text: l.replace('\t', "        ").trim_end().to_string(),
        })
        .collect()
}

/// The adornment character if the whole line is one repeated punctuation mark.
fn adornment(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let first = chars.next()?;
    if !ADORNMENT_CHARS.contains(first) || text.chars().count() < 2 {
        return None;
    }
    chars.all(|c| c == first).then_some(first)
}

fn bullet_item(text: &str, marker: char) -> Option<&str> {
    let rest = text.strip_prefix(marker)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

fn bullet_marker(text: &str) -> Option<char> {
    let first = text.chars().next()?;
    ("-*+".contains(first) && bullet_item(text, first).is_some()).then_some(first)
}

/// `(number, marker width)` for `3. item` or `#. item`.
fn enum_marker(text: &str) -> Option<(Option<u32>, usize)> {
    if text.starts_with("#. ") || text == "#." {
        return Some((None, 3));
    }
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &text[digits..];
    if rest == "." || rest.starts_with(". ") {
        Some((text[..digits].parse().ok(), digits + 2))
    } else {
        None
    }
}

/// `(name, body)` for `:name: body`.
fn field_marker(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(':')?;
    let mut search = 0;
    while let Some(pos) = rest[search..].find(':') {
        let end = search + pos;
        let after = &rest[end + 1..];
        if end > 0 && (after.is_empty() || after.starts_with(' ')) {
            let name = &rest[..end];
            if name.starts_with(' ') {
                return None;
            }
            return Some((name, after.trim()));
        }
        search = end + 1;
    }
    None
}

/// Deepest nesting of quotes, lists and directive bodies accepted.
const MAX_DEPTH: usize = 64;

struct BlockParser<'a> {
    lines: &'a [Line],
    pos: usize,
    /// 0 at the document level.
    depth: usize,
    targets: &'a mut Targets,
}

impl<'a> BlockParser<'a> {
    fn new(lines: &'a [Line], depth: usize, targets: &'a mut Targets) -> Self {
        BlockParser {
            lines,
            pos: 0,
            depth,
            targets,
        }
    }

    fn peek(&self) -> Option<&'a Line> {
        self.lines.get(self.pos)
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(Line::is_blank) {
            self.pos += 1;
        }
    }

    fn child(&mut self, lines: &[Line]) -> Result<Vec<Block>, RstError> {
        if self.depth >= MAX_DEPTH {
            let line = lines
                .first()
                .or_else(|| self.peek())
                .map_or(0, |l| l.no);
            return Err(malformed(
                line,
                format!("body elements nested more than {MAX_DEPTH} levels deep"),
            ));
        }
        BlockParser::new(lines, self.depth + 1, self.targets).parse()
    }

    /// Consume blank and indented lines, returning them dedented.
    fn take_indented(&mut self) -> Vec<Line> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|l| l.is_blank() || l.indent() > 0)
        {
            self.pos += 1;
        }
        dedent(&self.lines[start..self.pos])
    }

    fn parse(mut self) -> Result<Vec<Block>, RstError> {
        let mut blocks = Vec::new();
        let mut literal_next = false;

        loop {
            self.skip_blank();
            let Some(line) = self.peek() else { break };
            let expect_literal = std::mem::take(&mut literal_next);

            if line.indent() > 0 {
                let chunk = self.take_indented();
                if expect_literal {
                    blocks.push(Block::Literal {
                        text: join(&chunk),
                        language: None,
                    });
                } else {
                    blocks.push(Block::Quote(self.child(&chunk)?));
                }
                continue;
            }

            if line.text == ".." || line.text.starts_with(".. ") {
                if let Some(block) = self.explicit_markup()? {
                    blocks.push(block);
                }
                continue;
            }
            if let Some(block) = self.section_or_transition()? {
                blocks.push(block);
                continue;
            }
            if let Some(marker) = bullet_marker(&line.text) {
                blocks.push(self.bullet_list(marker)?);
                continue;
            }
            if enum_marker(&line.text).is_some() {
                blocks.push(self.enumerated_list()?);
                continue;
            }
            if field_marker(&line.text).is_some() {
                blocks.push(self.field_list());
                continue;
            }
            if self.at_definition() {
                blocks.push(self.definition_list()?);
                continue;
            }

            let (paragraph, literal) = self.paragraph();
            literal_next = literal;
            blocks.extend(paragraph);
        }

        Ok(blocks)
    }

    fn section_or_transition(&mut self) -> Result<Option<Block>, RstError> {
        let line = &self.lines[self.pos];
        let next = self.lines.get(self.pos + 1);

        if let Some(ch) = adornment(&line.text) {
            if let (Some(title), Some(under)) = (next, self.lines.get(self.pos + 2))
                && !title.is_blank()
                && adornment(&title.text).is_none()
                && adornment(&under.text) == Some(ch)
            {
                let title_text = title.text.trim();
                let width = title_text.chars().count();
                if line.text.chars().count() < width || under.text.chars().count() < width {
                    return Err(malformed(title.no, "title overline/underline too short"));
                }
                self.check_section_allowed(title.no)?;
                self.pos += 3;
                return Ok(Some(Block::Section {
                    style: Style { ch, overline: true },
                    title: title_text.to_string(),
                    line: title.no,
                }));
            }

            let prev_blank = self.pos == 0 || self.lines[self.pos - 1].is_blank();
            let next_blank = next.is_none_or(Line::is_blank);
            if prev_blank && next_blank && line.text.chars().count() >= 4 {
                self.pos += 1;
                return Ok(Some(Block::Transition));
            }
            return Ok(None);
        }

        let Some(under) = next else { return Ok(None) };
        let Some(ch) = adornment(&under.text) else {
            return Ok(None);
        };
        let width = line.text.chars().count();
        let under_width = under.text.chars().count();
        if under_width < width {
            if under_width >= 4 {
                return Err(malformed(under.no, "title underline too short"));
            }
            return Ok(None);
        }
        self.check_section_allowed(line.no)?;
        self.pos += 2;
        Ok(Some(Block::Section {
            style: Style { ch, overline: false },
            title: line.text.clone(),
            line: line.no,
        }))
    }

    fn check_section_allowed(&self, line: usize) -> Result<(), RstError> {
        if self.depth > 0 {
            return Err(malformed(line, "unexpected section title inside a body element"));
        }
        Ok(())
    }

    fn bullet_list(&mut self, marker: char) -> Result<Block, RstError> {
        let mut items = Vec::new();
        while let Some(line) = self.peek() {
            let Some(first) = bullet_item(&line.text, marker) else {
                break;
            };
            let mut item = vec![Line {
                no: line.no,
                text: first.to_string(),
            }];
            self.pos += 1;
            item.extend(self.take_indented());
            items.push(self.child(&item)?);
        }
        Ok(Block::Bullets(items))
    }

    fn enumerated_list(&mut self) -> Result<Block, RstError> {
        let mut items = Vec::new();
        let mut start = 1;
        while let Some(line) = self.peek() {
            let Some((number, width)) = enum_marker(&line.text) else {
                break;
            };
            if items.is_empty() {
                start = number.unwrap_or(1);
            }
            let mut item = vec![Line {
                no: line.no,
                text: line.text.get(width..).unwrap_or("").to_string(),
            }];
            self.pos += 1;
            item.extend(self.take_indented());
            items.push(self.child(&item)?);
        }
        Ok(Block::Enumerated { start, items })
    }

    fn field_list(&mut self) -> Block {
        let mut fields = Vec::new();
        while let Some(line) = self.peek() {
            let Some((name, body)) = field_marker(&line.text) else {
                break;
            };
            let (name, body, no) = (name.to_string(), body.to_string(), line.no);
            self.pos += 1;
            let rest = self.take_indented();
            let body = std::iter::once(body)
                .chain(rest.into_iter().map(|l| l.text))
                .filter(|s| !s.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            fields.push(Field {
                name,
                body,
                line: no,
            });
        }
        Block::Fields(fields)
    }

    /// A single line directly followed by an indented line.
    fn at_definition(&self) -> bool {
        self.lines
            .get(self.pos + 1)
            .is_some_and(|next| !next.is_blank() && next.indent() > 0)
    }

    fn definition_list(&mut self) -> Result<Block, RstError> {
        let mut items = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent() > 0 || !self.at_definition() {
                break;
            }
            let term = line.text.clone();
            self.pos += 1;
            let body = self.take_indented();
            items.push((term, line.no, self.child(&body)?));
        }
        Ok(Block::Definitions(items))
    }

    /// Returns the paragraph (if any text remains) and whether it announced
    /// a literal block with a trailing `::`.
    fn paragraph(&mut self) -> (Option<Block>, bool) {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|l| !l.is_blank() && l.indent() == 0)
        {
            self.pos += 1;
        }
        let no = self.lines[start].no;
        let text = join(&self.lines[start..self.pos]);

        let Some(stripped) = text.strip_suffix("::") else {
            return (Some(Block::Paragraph { text, line: no }), false);
        };
        if stripped.trim().is_empty() {
            return (None, true);
        }
        let text = if stripped.ends_with(char::is_whitespace) {
            stripped.trim_end().to_string()
        } else {
            format!("{stripped}:")
        };
        (Some(Block::Paragraph { text, line: no }), true)
    }

    /// Directives, comments and hyperlink targets.
    fn explicit_markup(&mut self) -> Result<Option<Block>, RstError> {
        let line = &self.lines[self.pos];
        let content = line.text.get(3..).unwrap_or("").trim();
        let no = line.no;
        self.pos += 1;

        if let Some(target) = content.strip_prefix('_') {
            let body = self.take_indented();
            if let Some((name, url)) = target.split_once(": ") {
                let url = std::iter::once(url.trim().to_string())
                    .chain(body.into_iter().map(|l| l.text.trim().to_string()))
                    .collect::<String>();
                let name = name.trim_matches('`').to_lowercase();
                self.targets.insert(name, url);
            }
            return Ok(None);
        }

        let Some((name, argument)) = content.split_once("::") else {
            // Comment: swallow it and its indented continuation.
            self.take_indented();
            return Ok(None);
        };
        let name = name.trim().to_lowercase();
        let argument = argument.trim().to_string();
        let chunk = self.take_indented();
        let (options, body) = split_options(chunk);

        let block = match name.as_str() {
            "code-block" | "code" | "sourcecode" => Block::Literal {
                text: join(&body),
                language: (!argument.is_empty()).then_some(argument),
            },
            "image" => Block::Image {
                uri: argument,
                alt: options.get("alt").cloned(),
            },
            kind if ADMONITIONS.contains(&kind) => {
                let mut lines = Vec::new();
                if !argument.is_empty() {
                    lines.push(Line {
                        no,
                        text: argument,
                    });
                    lines.push(Line {
                        no,
                        text: String::new(),
                    });
                }
                lines.extend(body);
                Block::Admonition {
                    kind: kind.to_string(),
                    body: self.child(&lines)?,
                }
            }
            other => {
                warn!(line = no, directive = other, "skipping unsupported directive");
                return Ok(None);
            }
        };
        Ok(Some(block))
    }
}

/// Split leading `:option: value` lines off a directive body.
fn split_options(lines: Vec<Line>) -> (BTreeMap<String, String>, Vec<Line>) {
    let mut options = BTreeMap::new();
    let mut rest = lines.into_iter().peekable();
    while let Some(line) = rest.peek() {
        let Some((name, value)) = field_marker(&line.text) else {
            break;
        };
        options.insert(name.to_lowercase(), value.to_string());
        rest.next();
    }
    let body: Vec<Line> = rest.skip_while(Line::is_blank).collect();
    (options, body)
}

/// Strip common indentation and trailing blank lines. Leading blank lines
/// are kept: inside a list item they separate the first paragraph from
/// what follows.
fn dedent(lines: &[Line]) -> Vec<Line> {
    let Some(last) = lines.iter().rposition(|l| !l.is_blank()) else {
        return Vec::new();
    };
    let lines = &lines[..=last];
    let width = lines
        .iter()
        .filter(|l| !l.is_blank())
        .map(Line::indent)
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| Line {
            no: l.no,
            text: l.text.get(width..).unwrap_or("").to_string(),
        })
        .collect()
}

fn join(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Remove the document title: a first section whose style is used nowhere else.
fn take_document_title(blocks: &mut Vec<Block>) -> Option<String> {
    let Some(Block::Section { style, .. }) = blocks.first() else {
        return None;
    };
    let style = *style;
    let uses = blocks
        .iter()
        .filter(|b| matches!(b, Block::Section { style: s, .. } if *s == style))
        .count();
    if uses != 1 {
        return None;
    }
    match blocks.remove(0) {
        Block::Section { title, .. } => Some(title),
        _ => None,
    }
}

/// Section styles in order of first appearance; index + 1 is the heading level.
fn section_styles(blocks: &[Block]) -> Vec<Style> {
    let mut styles = Vec::new();
    for block in blocks {
        if let Block::Section { style, .. } = block
            && !styles.contains(style)
        {
            styles.push(*style);
        }
    }
    styles
}

// ============================================================================
// HTML output
// ============================================================================

struct HtmlWriter<'a> {
    levels: Vec<Style>,
    targets: &'a Targets,
}

impl HtmlWriter<'_> {
    fn blocks(&self, blocks: &[Block], out: &mut String) -> Result<(), RstError> {
        for block in blocks {
            self.block(block, out)?;
        }
        Ok(())
    }

    fn block(&self, block: &Block, out: &mut String) -> Result<(), RstError> {
        match block {
            Block::Section { style, title, line } => {
                let level = self
                    .levels
                    .iter()
                    .position(|s| s == style)
                    .map_or(1, |i| (i + 1).min(6));
                let _ = writeln!(
                    out,
                    "<h{level}>{}</h{level}>",
                    self.inline(title, *line)?
                );
            }
            Block::Paragraph { text, line } => {
                let _ = writeln!(out, "<p>{}</p>", self.inline(text, *line)?);
            }
            Block::Literal { text, language } => match language {
                Some(lang) => {
                    let _ = writeln!(
                        out,
                        "<pre class=\"code {}\"><code>{}</code></pre>",
                        escape_html(lang),
                        escape_html(text)
                    );
                }
                None => {
                    let _ = writeln!(out, "<pre class=\"literal-block\">{}</pre>", escape_html(text));
                }
            },
            Block::Bullets(items) => {
                out.push_str("<ul>\n");
                self.list_items(items, out)?;
                out.push_str("</ul>\n");
            }
            Block::Enumerated { start, items } => {
                if *start == 1 {
                    out.push_str("<ol>\n");
                } else {
                    let _ = writeln!(out, "<ol start=\"{start}\">");
                }
                self.list_items(items, out)?;
                out.push_str("</ol>\n");
            }
            Block::Fields(fields) => {
                out.push_str("<dl class=\"field-list\">\n");
                for field in fields {
                    let _ = writeln!(
                        out,
                        "<dt>{}</dt>\n<dd>{}</dd>",
                        escape_html(&field.name),
                        self.inline(&field.body, field.line)?
                    );
                }
                out.push_str("</dl>\n");
            }
            Block::Definitions(items) => {
                out.push_str("<dl>\n");
                for (term, line, body) in items {
                    let _ = writeln!(out, "<dt>{}</dt>", self.inline(term, *line)?);
                    out.push_str("<dd>\n");
                    self.blocks(body, out)?;
                    out.push_str("</dd>\n");
                }
                out.push_str("</dl>\n");
            }
            Block::Quote(body) => {
                out.push_str("<blockquote>\n");
                self.blocks(body, out)?;
                out.push_str("</blockquote>\n");
            }
            Block::Admonition { kind, body } => {
                let mut label = kind.clone();
                if let Some(first) = label.get_mut(..1) {
                    first.make_ascii_uppercase();
                }
                let _ = writeln!(
                    out,
                    "<div class=\"admonition {kind}\">\n<p class=\"admonition-title\">{label}</p>"
                );
                self.blocks(body, out)?;
                out.push_str("</div>\n");
            }
            Block::Image { uri, alt } => {
                let alt = alt.as_deref().unwrap_or(uri);
                let _ = writeln!(
                    out,
                    "<img src=\"{}\" alt=\"{}\" />",
                    escape_html(uri),
                    escape_html(alt)
                );
            }
            Block::Transition => out.push_str("<hr />\n"),
        }
        Ok(())
    }

    /// Single-paragraph items render compactly, without a `<p>` wrapper.
    fn list_items(&self, items: &[Vec<Block>], out: &mut String) -> Result<(), RstError> {
        for item in items {
            match item.as_slice() {
                [Block::Paragraph { text, line }] => {
                    let _ = writeln!(out, "<li>{}</li>", self.inline(text, *line)?);
                }
                blocks => {
                    out.push_str("<li>\n");
                    self.blocks(blocks, out)?;
                    out.push_str("</li>\n");
                }
            }
        }
        Ok(())
    }

    fn inline(&self, text: &str, line: usize) -> Result<String, RstError> {
        render_inline(text, self.targets, line)
    }
}

// ============================================================================
// Inline markup
// ============================================================================

const OPEN_PRECEDERS: &str = "'\"([{<-/:";
const CLOSE_FOLLOWERS: &str = "'\")]}>-/:.,;!?\\_";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        _ => out.push(c),
    }
}

fn starts_with_at(chars: &[char], at: usize, pattern: &str) -> bool {
    let mut i = at;
    for p in pattern.chars() {
        if chars.get(i) != Some(&p) {
            return false;
        }
        i += 1;
    }
    true
}

/// Inline start-strings must follow whitespace or opening punctuation and
/// be followed by non-whitespace.
fn can_open(chars: &[char], at: usize, width: usize) -> bool {
    let before_ok = at == 0 || {
        let prev = chars[at - 1];
        prev.is_whitespace() || OPEN_PRECEDERS.contains(prev)
    };
    let after_ok = chars.get(at + width).is_some_and(|c| !c.is_whitespace());
    before_ok && after_ok
}

/// Index of the matching end-string, searching from `from`.
fn find_close(chars: &[char], from: usize, delim: &str) -> Option<usize> {
    let width = delim.chars().count();
    let mut j = from + 1;
    while j < chars.len() {
        if starts_with_at(chars, j, delim)
            && !chars[j - 1].is_whitespace()
            && chars
                .get(j + width)
                .is_none_or(|c| c.is_whitespace() || CLOSE_FOLLOWERS.contains(*c))
            && !(width == 1 && chars.get(j + 1) == Some(&delim_char(delim)))
        {
            return Some(j);
        }
        j += 1;
    }
    None
}

fn delim_char(delim: &str) -> char {
    delim.chars().next().unwrap_or_default()
}

fn slug(text: &str) -> String {
    let mut slug = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn render_inline(text: &str, targets: &Targets, line: usize) -> Result<String, RstError> {
    let chars: Vec<char> = text.chars().collect();
    let collect = |from: usize, to: usize| chars[from..to].iter().collect::<String>();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            push_escaped(&mut out, chars[i + 1]);
            i += 2;
            continue;
        }

        if starts_with_at(&chars, i, "``") && can_open(&chars, i, 2) {
            let end = find_close(&chars, i + 2, "``").ok_or_else(|| {
                malformed(line, "inline literal start-string without end-string")
            })?;
            let _ = write!(out, "<code>{}</code>", escape_html(&collect(i + 2, end)));
            i = end + 2;
            continue;
        }

        if starts_with_at(&chars, i, "**") && can_open(&chars, i, 2) {
            let end = find_close(&chars, i + 2, "**").ok_or_else(|| {
                malformed(line, "inline strong start-string without end-string")
            })?;
            let _ = write!(out, "<strong>{}</strong>", escape_html(&collect(i + 2, end)));
            i = end + 2;
            continue;
        }

        if c == '*' && can_open(&chars, i, 1) {
            let end = find_close(&chars, i + 1, "*").ok_or_else(|| {
                malformed(line, "inline emphasis start-string without end-string")
            })?;
            let _ = write!(out, "<em>{}</em>", escape_html(&collect(i + 1, end)));
            i = end + 1;
            continue;
        }

        if c == '`' && can_open(&chars, i, 1) {
            let end = find_close(&chars, i + 1, "`").ok_or_else(|| {
                malformed(
                    line,
                    "inline interpreted text or phrase reference start-string without end-string",
                )
            })?;
            let inner = collect(i + 1, end);
            i = end + 1;
            if starts_with_at(&chars, i, "__") {
                i += 2;
                out.push_str(&reference(&inner, targets));
            } else if starts_with_at(&chars, i, "_") {
                i += 1;
                out.push_str(&reference(&inner, targets));
            } else {
                let _ = write!(out, "<cite>{}</cite>", escape_html(&inner));
            }
            continue;
        }

        let at_word_start = i == 0 || chars[i - 1].is_whitespace() || chars[i - 1] == '(';
        if at_word_start
            && (starts_with_at(&chars, i, "http://") || starts_with_at(&chars, i, "https://"))
        {
            let mut end = i;
            while end < chars.len() && !chars[end].is_whitespace() && chars[end] != '<' {
                end += 1;
            }
            while end > i && ".,;:!?)'\"".contains(chars[end - 1]) {
                end -= 1;
            }
            let url = escape_html(&collect(i, end));
            let _ = write!(out, "<a href=\"{url}\">{url}</a>");
            i = end;
            continue;
        }

        push_escaped(&mut out, c);
        i += 1;
    }

    Ok(out)
}

/// `text <url>` embeds its target; `name` looks up a `.. _name:` target.
fn reference(inner: &str, targets: &Targets) -> String {
    if let Some(open) = inner.rfind(" <")
        && inner.ends_with('>')
    {
        let label = inner[..open].trim();
        let url = &inner[open + 2..inner.len() - 1];
        return format!(
            "<a href=\"{}\">{}</a>",
            escape_html(url),
            escape_html(label)
        );
    }
    let href = targets
        .get(&inner.to_lowercase())
        .cloned()
        .unwrap_or_else(|| format!("#{}", slug(inner)));
    format!("<a href=\"{}\">{}</a>", escape_html(&href), escape_html(inner))
}
