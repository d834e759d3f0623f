//! Navigation index.
//!
//! Turns the artifact map into namespaced, root-relative page paths such as
//! `site/guide/usage.html`. Pure path arithmetic: nothing is read or written.

use crate::types::{ArtifactMap, NavigationEntry};
use std::path::{Component, Path};
use tracing::warn;

/// Namespace used when the config does not name one.
pub const DEFAULT_NAMESPACE: &str = "site";

/// One entry per destination, in destination order.
///
/// Destinations outside `output_root` are skipped with a warning.
pub fn index(output_root: &Path, artifacts: &ArtifactMap, namespace: &str) -> Vec<NavigationEntry> {
    artifacts
        .keys()
        .filter_map(|destination| match destination.strip_prefix(output_root) {
            Ok(rel) => Some(entry(namespace, rel)),
            Err(_) => {
                warn!(
                    destination = %destination.display(),
                    root = %output_root.display(),
                    "page outside output root left out of navigation"
                );
                None
            }
        })
        .collect()
}

fn entry(namespace: &str, rel: &Path) -> NavigationEntry {
    let mut parts = vec![namespace.to_string()];
    for component in rel.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_string_lossy().into_owned());
        }
    }
    NavigationEntry(parts.join("/"))
}
