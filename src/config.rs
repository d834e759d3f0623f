//! Site configuration module.
//!
//! Handles loading, validating, and layering `sitemake.toml`. Values are
//! resolved in three layers, each overriding the one before:
//!
//! ```text
//! stock defaults  →  sitemake.toml  →  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_root = "source"     # Directory holding one sub-directory per project
//! output_root = "output"     # Sites are written to <output_root>/<project>/
//! # template_dir = "theme"   # base.html + style.css + script.js (built-in if unset)
//! nav_namespace = "site"     # Label prefixed to every navigation entry
//! on_collision = "warn"      # "warn" or "fail" when two sources map to one page
//! render_errors = "continue" # "continue" or "abort" on the first bad page
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "sitemake.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// What to do when two sources in one directory share a stem (`x.md`, `x.rst`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep the later file in name order and log a warning.
    #[default]
    Warn,
    /// Abort the build before rendering.
    Fail,
}

/// What to do when a single page fails to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderErrorPolicy {
    /// Record the failure, leave the page empty and keep going.
    #[default]
    Continue,
    /// Stop the build at the first failure.
    Abort,
}

/// Site configuration loaded from `sitemake.toml`.
///
/// All fields have defaults; a config file need only name the values it
/// changes. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    /// Directory with `base.html`, `style.css` and `script.js`.
    pub template_dir: Option<PathBuf>,
    pub nav_namespace: String,
    pub on_collision: CollisionPolicy,
    pub render_errors: RenderErrorPolicy,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("source"),
            output_root: PathBuf::from("output"),
            template_dir: None,
            nav_namespace: "site".to_string(),
            on_collision: CollisionPolicy::default(),
            render_errors: RenderErrorPolicy::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "source_root must not be empty".into(),
            ));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output_root must not be empty".into(),
            ));
        }
        if self.nav_namespace.is_empty() {
            return Err(ConfigError::Validation(
                "nav_namespace must not be empty".into(),
            ));
        }
        if self.nav_namespace.contains('/') {
            return Err(ConfigError::Validation(
                "nav_namespace must not contain '/'".into(),
            ));
        }
        Ok(())
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// The base layer that file and command-line values are merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the config file at `path` (defaults if absent) with `overrides`
/// applied on top.
pub fn load_config(
    path: &Path,
    overrides: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let mut base = stock_defaults_value();
    if let Some(file) = load_raw_config(path)? {
        base = merge_toml(base, file);
    }
    resolve_config(base, overrides)
}

/// Path values given on the command line, as an overlay table.
///
/// Returns `None` when no flag was given.
pub fn path_overrides(
    source_root: Option<&Path>,
    output_root: Option<&Path>,
    template_dir: Option<&Path>,
) -> Option<toml::Value> {
    let mut table = toml::map::Map::new();
    for (key, value) in [
        ("source_root", source_root),
        ("output_root", output_root),
        ("template_dir", template_dir),
    ] {
        if let Some(path) = value {
            table.insert(
                key.to_string(),
                toml::Value::String(path.to_string_lossy().into_owned()),
            );
        }
    }
    (!table.is_empty()).then_some(toml::Value::Table(table))
}

/// Returns a fully-commented stock `sitemake.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitemake configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--source, --output, --template-dir) override the
# values in this file. Unknown keys will cause an error.

# Directory holding the projects. Each non-hidden sub-directory is one
# project; its .md, .rst and .py files become pages.
source_root = "source"

# Generated sites go to <output_root>/<project name>/. The project's output
# directory is deleted and rebuilt on every run.
output_root = "output"

# Directory containing base.html, style.css and script.js. base.html must
# contain exactly one {{ body_content }} placeholder. When unset, the
# built-in template is used. The built-in base.html links /style.css and
# /script.js from the site root, so serve <output_root>/<project name>/ as
# the web root (pages opened via file:// or served from a parent directory
# come out unstyled). A custom base.html may use relative links instead.
# template_dir = "theme"

# Label prefixed to every entry of the navigation index.
nav_namespace = "site"

# Two sources in one directory with the same name but different extensions
# (notes.md and notes.rst) map to the same page.
#   "warn" - keep the later file in name order and log a warning
#   "fail" - stop the build before any page is rendered
on_collision = "warn"

# A page that fails to render:
#   "continue" - leave that page empty, finish the build, exit non-zero
#   "abort"    - stop the build immediately
render_errors = "continue"
"##
}
