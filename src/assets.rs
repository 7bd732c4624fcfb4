//! Offline checks of a site's image files.
//!
//! The lightbox treats a missing or undecodable image as a runtime failure
//! and shows a placeholder. These checks find the same problems ahead of
//! time: every source the catalog references is decoded in parallel with
//! rayon, and the image directory is walked for files nothing references.

use crate::platform::{Dimensions, LoadFailure};
use crate::sim::Resolver;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff"];

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to walk image directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Decode outcome for one referenced source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCheck {
    pub src: String,
    pub result: Result<Dimensions, LoadFailure>,
}

impl ImageCheck {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Decode every source under `root`, in parallel. Output keeps input order.
pub fn verify_images(root: &Path, sources: &[&str]) -> Vec<ImageCheck> {
    let resolver = Resolver::Filesystem {
        root: root.to_path_buf(),
    };
    sources
        .par_iter()
        .map(|src| ImageCheck {
            src: src.to_string(),
            result: resolver.resolve(src).into_result(),
        })
        .collect()
}

/// Image files under `root` that no source points at, relative to `root`.
pub fn unreferenced_files(root: &Path, sources: &[&str]) -> Result<Vec<PathBuf>, AssetError> {
    let referenced: HashSet<String> = sources.iter().map(|s| normalize(s)).collect();
    let mut orphans = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        let key = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !referenced.contains(&key) {
            orphans.push(rel.to_path_buf());
        }
    }
    Ok(orphans)
}

fn normalize(src: &str) -> String {
    src.trim_start_matches("./").trim_start_matches('/').to_string()
}

fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}
