//! Build orchestration.
//!
//! One run takes a project through a fixed sequence of stages:
//!
//! ```text
//! Idle → Scanned → Cleaned → Built → Rendered → Indexed → Done
//!        scan      erase     layout  render     nav
//! ```
//!
//! There are no retries and no rollback. A fatal error leaves the output
//! tree as the failing stage left it; [`PipelineError::stage`] says how far
//! the run got. Render failures are isolated per page unless the config
//! asks for [`RenderErrorPolicy::Abort`].

use crate::config::{RenderErrorPolicy, SiteConfig};
use crate::erase::{self, EraseError};
use crate::layout::{self, Collision, LayoutError};
use crate::nav;
use crate::project::Project;
use crate::render::{RenderError, Renderer};
use crate::scan::{self, ScanError};
use crate::template::{TemplateAssets, TemplateError};
use crate::types::{NavigationEntry, OutputArtifact};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Idle,
    Scanned,
    Cleaned,
    Built,
    Rendered,
    Indexed,
    Done,
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error(
        "Output root {} overlaps project root {}",
        .output.display(), .project.display()
    )]
    OverlappingRoots { project: PathBuf, output: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Erase error: {0}")]
    Erase(#[from] EraseError),
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// The last stage completed before the error.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Template(_)
            | PipelineError::OverlappingRoots { .. }
            | PipelineError::Io(_)
            | PipelineError::Scan(_) => Stage::Idle,
            PipelineError::Erase(_) => Stage::Scanned,
            PipelineError::Layout(_) => Stage::Cleaned,
            PipelineError::Render(_) => Stage::Built,
        }
    }
}

/// A page whose placeholder was left empty.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub message: String,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub project: String,
    /// Absolute; page sources are recorded below it.
    pub project_root: PathBuf,
    pub output_root: PathBuf,
    pub stage: Stage,
    pub pages: Vec<OutputArtifact>,
    pub collisions: Vec<Collision>,
    pub failures: Vec<RenderFailure>,
    pub navigation: Vec<NavigationEntry>,
}

pub struct Pipeline<'a> {
    config: &'a SiteConfig,
    project: &'a Project,
    assets: TemplateAssets,
}

impl<'a> Pipeline<'a> {
    /// Resolve the template set up front so a bad template fails before
    /// anything is touched.
    pub fn new(config: &'a SiteConfig, project: &'a Project) -> Result<Self, PipelineError> {
        let assets = TemplateAssets::resolve(config.template_dir.as_deref())?;
        Ok(Self::with_assets(config, project, assets))
    }

    pub fn with_assets(
        config: &'a SiteConfig,
        project: &'a Project,
        assets: TemplateAssets,
    ) -> Self {
        Pipeline {
            config,
            project,
            assets,
        }
    }

    /// `<output_root>/<project name>`.
    pub fn output_root(&self) -> PathBuf {
        self.config.output_root.join(&self.project.name)
    }

    pub fn run(&self) -> Result<SiteReport, PipelineError> {
        let output_root = self.output_root();
        check_roots(&self.project.path, &output_root)?;
        let project_root = std::path::absolute(&self.project.path)?;

        let map = scan::scan(&self.project.path)?;
        info!(
            stage = "scanned",
            project = %self.project.name,
            directories = map.len(),
            files = scan::file_count(&map)
        );

        erase::erase(&output_root)?;
        info!(stage = "cleaned", output = %output_root.display());

        let tree = layout::build(
            &output_root,
            &self.project.path,
            &map,
            &self.assets,
            self.config.on_collision,
        )?;
        info!(stage = "built", pages = tree.artifacts.len());

        let renderer = Renderer::new(&self.assets.base);
        let mut pages = Vec::with_capacity(tree.artifacts.len());
        let mut failures = Vec::new();
        for (destination, source) in &tree.artifacts {
            match renderer.render_to(source, destination) {
                Ok(()) => {
                    info!(page = %destination.display(), "rendered");
                    pages.push(OutputArtifact {
                        source: source.clone(),
                        destination: destination.clone(),
                    });
                }
                Err(e) if self.config.render_errors == RenderErrorPolicy::Continue => {
                    error!(source = %source.display(), "{e}");
                    failures.push(RenderFailure {
                        source: source.clone(),
                        destination: destination.clone(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!(stage = "rendered", pages = pages.len(), failures = failures.len());

        let navigation = nav::index(&output_root, &tree.artifacts, &self.config.nav_namespace);
        info!(stage = "indexed", entries = navigation.len());

        Ok(SiteReport {
            project: self.project.name.clone(),
            project_root,
            output_root,
            stage: Stage::Done,
            pages,
            collisions: tree.collisions,
            failures,
            navigation,
        })
    }
}

/// Reject an output root equal to, inside, or containing the project root.
fn check_roots(project: &Path, output: &Path) -> Result<(), PipelineError> {
    let project_real = resolve(project)?;
    let output_real = resolve(output)?;
    if output_real.starts_with(&project_real) || project_real.starts_with(&output_real) {
        return Err(PipelineError::OverlappingRoots {
            project: project_real,
            output: output_real,
        });
    }
    Ok(())
}

/// Absolute path with symlinks and `..` resolved, for paths that may not
/// exist yet: the existing prefix is canonicalized and the missing tail is
/// normalized lexically.
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    let mut missing = 0usize;
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
                missing = missing.saturating_sub(1);
            }
            Component::Normal(name) => {
                resolved.push(name);
                if missing > 0 {
                    missing += 1;
                    continue;
                }
                match resolved.canonicalize() {
                    Ok(real) => resolved = real,
                    Err(e) if e.kind() == ErrorKind::NotFound => missing = 1,
                    Err(e) => return Err(e),
                }
            }
            root => resolved.push(root),
        }
    }
    Ok(resolved)
}
