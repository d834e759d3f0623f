//! Output tree construction.
//!
//! Mirrors the scanned directory map into the output root before any page
//! is rendered:
//!
//! 1. create the output root
//! 2. copy the template's `style.css` and `script.js` into it, unmodified
//! 3. create every mirrored directory (parents included)
//! 4. create an empty placeholder for every page and record where its
//!    content comes from
//!
//! Two sources in the same directory that differ only by extension map to
//! the same page. What happens then is decided by [`CollisionPolicy`].

use crate::config::CollisionPolicy;
use crate::template::TemplateAssets;
use crate::types::{ArtifactMap, DirectoryMap, OutputArtifact, SourceEntry};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(
        "{} would be generated from both {} and {}",
        .destination.display(), .first.display(), .second.display()
    )]
    Collision {
        destination: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
}

fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> LayoutError + '_ {
    move |source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A destination claimed by more than one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collision {
    pub destination: PathBuf,
    /// Source the page is rendered from.
    pub kept: PathBuf,
    /// Source that lost the destination.
    pub replaced: PathBuf,
}

/// Result of laying out the output tree.
#[derive(Debug, Default)]
pub struct BuiltTree {
    pub artifacts: ArtifactMap,
    pub collisions: Vec<Collision>,
}

pub fn build(
    output_root: &Path,
    project_root: &Path,
    map: &DirectoryMap,
    assets: &TemplateAssets,
    policy: CollisionPolicy,
) -> Result<BuiltTree, LayoutError> {
    fs::create_dir_all(output_root).map_err(io_at(output_root))?;

    for (name, bytes) in assets.static_files() {
        let path = output_root.join(name);
        fs::write(&path, bytes).map_err(io_at(&path))?;
    }

    let project_root = std::path::absolute(project_root).map_err(io_at(project_root))?;
    let mut tree = BuiltTree::default();

    for (rel_dir, files) in map {
        let out_dir = output_root.join(rel_dir);
        fs::create_dir_all(&out_dir).map_err(io_at(&out_dir))?;

        for name in files {
            let Some(entry) = SourceEntry::from_path(&project_root.join(rel_dir).join(name))
            else {
                debug!(file = %name, "skipping unsupported file");
                continue;
            };
            let OutputArtifact {
                source,
                destination,
            } = OutputArtifact::mirror(output_root, rel_dir, &entry);

            if let Some(previous) = tree.artifacts.get(&destination) {
                match policy {
                    CollisionPolicy::Fail => {
                        return Err(LayoutError::Collision {
                            destination,
                            first: previous.clone(),
                            second: source,
                        });
                    }
                    CollisionPolicy::Warn => {
                        warn!(
                            destination = %destination.display(),
                            kept = %source.display(),
                            replaced = %previous.display(),
                            "two sources map to the same page"
                        );
                        tree.collisions.push(Collision {
                            destination: destination.clone(),
                            kept: source.clone(),
                            replaced: previous.clone(),
                        });
                    }
                }
            }

            fs::File::create(&destination).map_err(io_at(&destination))?;
            tree.artifacts.insert(destination, source);
        }
    }

    Ok(tree)
}
