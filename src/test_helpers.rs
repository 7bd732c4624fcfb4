//! Shared test utilities.
//!
//! Fixture builders for projects and catalogs, a small on-disk site for the
//! filesystem-backed checks, and extractors over the simulator's op log.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let cat = catalog(vec![project("p1", &["x.jpg", "y.jpg"], Some("y.jpg"))]);
//! let tmp = setup_site();
//! let p = find_project(&cat, "p1");
//! assert_eq!(p.ordered_images()[0], "y.jpg");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::sim::RecordedOp;
use crate::types::{Project, ProjectAudit, ProjectCatalog, ProjectType};

// =========================================================================
// Fixture setup
// =========================================================================

/// A project whose display name is its id.
pub fn project(id: &str, images: &[&str], hero: Option<&str>) -> Project {
    Project {
        id: id.to_string(),
        name: id.to_string(),
        project_type: ProjectType::NewConstruction,
        images: images.iter().map(|s| s.to_string()).collect(),
        hero_image: hero.map(str::to_string),
    }
}

/// Catalog from projects. Panics on duplicate ids.
pub fn catalog(projects: Vec<Project>) -> ProjectCatalog {
    ProjectCatalog::from_projects(projects).unwrap()
}

/// Write a solid `width`×`height` PNG, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::from_pixel(width, height, image::Rgb([120, 120, 120]))
        .save(path)
        .unwrap();
}

/// A small site in a temp directory:
///
/// ```text
/// projects.json      riverside (3 images, hero second), loft (1 image)
/// img/riverside/01.png .. 03.png
/// img/loft/01.png
/// img/unused.png
/// ```
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (name, w, h) in [
        ("img/riverside/01.png", 16, 9),
        ("img/riverside/02.png", 9, 16),
        ("img/riverside/03.png", 8, 8),
        ("img/loft/01.png", 4, 3),
        ("img/unused.png", 2, 2),
    ] {
        write_png(&tmp.path().join(name), w, h);
    }
    let json = r#"{
  "riverside": {
    "name": "Riverside House",
    "type": "new-construction",
    "images": ["/img/riverside/01.png", "/img/riverside/02.png", "/img/riverside/03.png"],
    "heroImage": "/img/riverside/02.png"
  },
  "loft": {
    "name": "Warehouse Loft",
    "type": "adaptive-reuse",
    "images": ["/img/loft/01.png"]
  }
}"#;
    std::fs::write(tmp.path().join("projects.json"), json).unwrap();
    tmp
}

// =========================================================================
// Lookups (panic with a clear message on miss)
// =========================================================================

/// Find a project by id. Panics if not found.
pub fn find_project<'a>(catalog: &'a ProjectCatalog, id: &str) -> &'a Project {
    catalog.get(id).unwrap_or_else(|| {
        let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        panic!("project '{id}' not found. Available: {ids:?}")
    })
}

/// Find an audit entry by project id. Panics if not found.
pub fn find_audit<'a>(audits: &'a [ProjectAudit], id: &str) -> &'a ProjectAudit {
    audits.iter().find(|a| a.id == id).unwrap_or_else(|| {
        let ids: Vec<&str> = audits.iter().map(|a| a.id.as_str()).collect();
        panic!("audit for '{id}' not found. Available: {ids:?}")
    })
}

// =========================================================================
// Op log extractors
// =========================================================================

/// Sources of every probe started, in order.
pub fn probed_sources(ops: &[RecordedOp]) -> Vec<&str> {
    ops.iter()
        .filter_map(|op| match op {
            RecordedOp::BeginProbe { src, .. } => Some(src.as_str()),
            _ => None,
        })
        .collect()
}

/// Every main image assignment, in order.
pub fn main_images(ops: &[RecordedOp]) -> Vec<&str> {
    ops.iter()
        .filter_map(|op| match op {
            RecordedOp::SetMainImage { src, .. } => Some(src.as_str()),
            _ => None,
        })
        .collect()
}
