//! # sitemake
//!
//! A static site generator for notes. Point it at a project directory of
//! Markdown, reStructuredText and annotated Python files and it mirrors the
//! tree into HTML pages wrapped in one base template, plus a flat
//! navigation index.
//!
//! # Architecture: Linear Pipeline
//!
//! Every build runs the same stages, in order, with no caching between
//! runs:
//!
//! ```text
//! 1. Scan     source/<project>/  →  DirectoryMap    (what exists)
//! 2. Erase    output/<project>/  →  (gone)          (no stale pages)
//! 3. Layout   DirectoryMap       →  ArtifactMap     (directories, assets, empty pages)
//! 4. Render   ArtifactMap        →  filled pages    (one file at a time)
//! 5. Index    ArtifactMap        →  navigation      (namespaced page paths)
//! ```
//!
//! Deleting and rebuilding the whole output tree is what keeps it an exact
//! mirror of the source: a renamed or removed note never leaves an orphan
//! page behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks a project, skipping hidden entries, and groups supported files by directory |
//! | [`erase`] | Stage 2: depth-first removal of the previous output tree |
//! | [`layout`] | Stage 3: mirrors directories, copies assets, maps pages to sources, handles collisions |
//! | [`render`] | Stage 4: per-kind conversion to HTML and template substitution |
//! | [`nav`] | Stage 5: namespaced navigation entries |
//! | [`pipeline`] | Runs the stages and reports what happened |
//! | [`rst`] | reStructuredText parser and HTML writer |
//! | [`template`] | Base template placeholder handling and built-in assets |
//! | [`config`] | `sitemake.toml` loading, validation and layering |
//! | [`project`] | Project discovery and interactive selection |
//! | [`types`] | Types shared between stages (`SourceKind`, `DirectoryMap`, `ArtifactMap`) |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Closed Set of Source Kinds
//!
//! Supported file types are the [`types::SourceKind`] enum and dispatch is a
//! `match`. Adding a kind means adding a variant, and the compiler points at
//! every place that has to learn about it.
//!
//! ## Collisions Are Visible
//!
//! `notes.md` and `notes.rst` in the same directory both want `notes.html`.
//! The later one in name order wins, and the build reports it (or fails,
//! with `on_collision = "fail"`). Silently dropping a document is never an
//! option.
//!
//! ## One Bad Page Does Not Sink the Site
//!
//! A page that fails to render is logged, left empty and listed in the
//! report; the rest of the site is still written and the CLI exits
//! non-zero. `render_errors = "abort"` restores stop-at-first-error.

pub mod config;
pub mod erase;
pub mod layout;
pub mod nav;
pub mod output;
pub mod pipeline;
pub mod project;
pub mod render;
pub mod rst;
pub mod scan;
pub mod template;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
