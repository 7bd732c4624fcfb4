//! Project data shared by the gallery, the CLI, and the page glue.
//!
//! Projects arrive from the page as a JSON feed, either keyed by id or as a
//! plain list. The gallery treats them as read-only: opening a project works on
//! a reordered clone of its image list (see [`Project::ordered_images`]).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Project at position {0} has no id")]
    MissingId(usize),
    #[error("Duplicate project id: {0}")]
    DuplicateId(String),
}

/// Portfolio category of a project.
///
/// Known categories get a display label; anything else is carried through
/// verbatim so the page can still show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectType {
    NewConstruction,
    RenovationAddition,
    Other(String),
}

impl ProjectType {
    /// The feed value (`"new-construction"`, ...).
    pub fn as_str(&self) -> &str {
        match self {
            ProjectType::NewConstruction => "new-construction",
            ProjectType::RenovationAddition => "renovation-addition",
            ProjectType::Other(raw) => raw,
        }
    }

    /// Human label for the modal header.
    pub fn label(&self) -> &str {
        match self {
            ProjectType::NewConstruction => "New Construction",
            ProjectType::RenovationAddition => "Renovation / Addition",
            ProjectType::Other(raw) => raw,
        }
    }
}

impl Default for ProjectType {
    fn default() -> Self {
        ProjectType::Other(String::new())
    }
}

impl From<String> for ProjectType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "new-construction" => ProjectType::NewConstruction,
            "renovation-addition" => ProjectType::RenovationAddition,
            _ => ProjectType::Other(raw),
        }
    }
}

impl From<ProjectType> for String {
    fn from(ty: ProjectType) -> Self {
        ty.as_str().to_string()
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A portfolio entry with its photo set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier, matched against the activation attribute on the page.
    #[serde(default)]
    pub id: String,
    /// Display name shown in the modal header.
    pub name: String,
    #[serde(rename = "type", default)]
    pub project_type: ProjectType,
    /// Ordered image sources. May be empty or contain duplicates.
    #[serde(default)]
    pub images: Vec<String>,
    /// Image promoted to the front of the gallery when the project opens.
    #[serde(default, alias = "heroImage", skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
}

impl Project {
    /// Image list in gallery order: the hero image first, everything else in
    /// its original relative order.
    ///
    /// Only the first positional match of the hero is moved; later duplicates
    /// stay where they are. A hero that is missing from `images` leaves the
    /// list untouched.
    pub fn ordered_images(&self) -> Vec<String> {
        let mut ordered = self.images.clone();
        if let Some(hero) = &self.hero_image
            && let Some(pos) = ordered.iter().position(|src| src == hero)
        {
            let hero = ordered.remove(pos);
            ordered.insert(0, hero);
        }
        ordered
    }

    /// Where the hero image stands relative to the image list.
    pub fn hero_status(&self) -> HeroStatus {
        match &self.hero_image {
            None => HeroStatus::None,
            Some(hero) => match self.images.iter().position(|src| src == hero) {
                Some(0) => HeroStatus::AlreadyFirst,
                Some(_) => HeroStatus::Promoted,
                None => HeroStatus::NotInImages,
            },
        }
    }
}

/// Hero image placement, as reported by [`ProjectCatalog::audit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroStatus {
    None,
    AlreadyFirst,
    Promoted,
    NotInImages,
}

/// Per-project findings from [`ProjectCatalog::audit`].
#[derive(Debug, Clone)]
pub struct ProjectAudit {
    pub id: String,
    pub name: String,
    pub type_label: String,
    pub image_count: usize,
    /// Sources listed more than once, in first-seen order.
    pub duplicates: Vec<String>,
    pub hero: HeroStatus,
}

/// Wire shape of the project feed: keyed by id, or a plain list.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogRepr {
    Keyed(BTreeMap<String, Project>),
    Listed(Vec<Project>),
}

/// All projects known to the page, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "CatalogRepr")]
pub struct ProjectCatalog {
    projects: BTreeMap<String, Project>,
}

impl TryFrom<CatalogRepr> for ProjectCatalog {
    type Error = CatalogError;

    fn try_from(repr: CatalogRepr) -> Result<Self, Self::Error> {
        match repr {
            // The key is the id pages activate; an inner `id` never overrides it.
            CatalogRepr::Keyed(map) => Self::from_projects(map.into_iter().map(
                |(key, mut project)| {
                    project.id = key;
                    project
                },
            )),
            CatalogRepr::Listed(list) => {
                if let Some(pos) = list.iter().position(|p| p.id.is_empty()) {
                    return Err(CatalogError::MissingId(pos));
                }
                Self::from_projects(list)
            }
        }
    }
}

impl ProjectCatalog {
    /// Build a catalog, rejecting duplicate ids.
    pub fn from_projects(
        projects: impl IntoIterator<Item = Project>,
    ) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for project in projects {
            if map.contains_key(&project.id) {
                return Err(CatalogError::DuplicateId(project.id));
            }
            map.insert(project.id.clone(), project);
        }
        Ok(Self { projects: map })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a project feed from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Projects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Every distinct image source referenced by any project.
    pub fn all_sources(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.iter()
            .flat_map(|p| p.images.iter().chain(p.hero_image.iter()))
            .filter(|src| seen.insert(src.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn audit(&self) -> Vec<ProjectAudit> {
        self.iter()
            .map(|project| {
                let mut seen = HashSet::new();
                let mut duplicates: Vec<String> = Vec::new();
                for src in &project.images {
                    if !seen.insert(src.as_str()) && !duplicates.contains(src) {
                        duplicates.push(src.clone());
                    }
                }
                ProjectAudit {
                    id: project.id.clone(),
                    name: project.name.clone(),
                    type_label: project.project_type.label().to_string(),
                    image_count: project.images.len(),
                    duplicates,
                    hero: project.hero_status(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{find_project, project};

    #[test]
    fn hero_moves_to_front() {
        let p = project("p1", &["x.jpg", "y.jpg", "z.jpg"], Some("y.jpg"));
        assert_eq!(p.ordered_images(), vec!["y.jpg", "x.jpg", "z.jpg"]);
    }

    #[test]
    fn hero_keeps_relative_order_of_the_rest() {
        let p = project("p1", &["a", "b", "c", "d", "e"], Some("d"));
        assert_eq!(p.ordered_images(), vec!["d", "a", "b", "c", "e"]);
    }

    #[test]
    fn hero_only_first_duplicate_is_moved() {
        let p = project("p1", &["a", "h", "b", "h", "c"], Some("h"));
        assert_eq!(p.ordered_images(), vec!["h", "a", "b", "h", "c"]);
    }

    #[test]
    fn hero_not_in_images_leaves_list_unchanged() {
        let p = project("p1", &["a", "b"], Some("zzz.jpg"));
        assert_eq!(p.ordered_images(), vec!["a", "b"]);
    }

    #[test]
    fn no_hero_leaves_list_unchanged() {
        let p = project("p1", &["a", "b", "c"], None);
        assert_eq!(p.ordered_images(), vec!["a", "b", "c"]);
    }

    #[test]
    fn hero_already_first() {
        let p = project("p1", &["a", "b"], Some("a"));
        assert_eq!(p.ordered_images(), vec!["a", "b"]);
        assert_eq!(p.hero_status(), HeroStatus::AlreadyFirst);
    }

    #[test]
    fn ordered_images_does_not_mutate_project() {
        let p = project("p1", &["a", "b"], Some("b"));
        let _ = p.ordered_images();
        assert_eq!(p.images, vec!["a", "b"]);
    }

    #[test]
    fn project_type_known_values() {
        assert_eq!(
            ProjectType::from("new-construction".to_string()),
            ProjectType::NewConstruction
        );
        assert_eq!(ProjectType::RenovationAddition.label(), "Renovation / Addition");
    }

    #[test]
    fn project_type_unknown_passes_through() {
        let ty = ProjectType::from("adaptive-reuse".to_string());
        assert_eq!(ty, ProjectType::Other("adaptive-reuse".to_string()));
        assert_eq!(ty.label(), "adaptive-reuse");
        assert_eq!(String::from(ty), "adaptive-reuse");
    }

    #[test]
    fn parse_keyed_feed() {
        let json = r#"{
            "lakehouse": {
                "name": "Lake House",
                "type": "new-construction",
                "images": ["a.jpg", "b.jpg"],
                "heroImage": "b.jpg"
            }
        }"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        let p = catalog.get("lakehouse").unwrap();
        assert_eq!(p.id, "lakehouse");
        assert_eq!(p.project_type, ProjectType::NewConstruction);
        assert_eq!(p.hero_image.as_deref(), Some("b.jpg"));
    }

    #[test]
    fn parse_listed_feed() {
        let json = r#"[
            {"id": "p1", "name": "One", "type": "renovation-addition", "images": ["x.jpg"]},
            {"id": "p2", "name": "Two", "type": "barn", "images": []}
        ]"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get("p2").unwrap().project_type,
            ProjectType::Other("barn".to_string())
        );
    }

    #[test]
    fn keyed_feed_is_indexed_by_map_key() {
        let json = r#"{
            "riverside": {"id": "river-house", "name": "Riverside", "images": ["r.jpg"]}
        }"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        assert_eq!(find_project(&catalog, "riverside").id, "riverside");
        assert!(catalog.get("river-house").is_none());
    }

    #[test]
    fn keyed_feed_with_shared_inner_id_keeps_both() {
        let json = r#"{
            "north": {"id": "x", "name": "North", "images": ["n.jpg"]},
            "south": {"id": "x", "name": "South", "images": ["s.jpg"]}
        }"#;
        let catalog = ProjectCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(find_project(&catalog, "north").name, "North");
        assert_eq!(find_project(&catalog, "south").images, vec!["s.jpg"]);
    }

    #[test]
    fn listed_feed_without_id_is_error() {
        let json = r#"[{"name": "Nameless", "images": []}]"#;
        assert!(ProjectCatalog::from_json_str(json).is_err());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let result = ProjectCatalog::from_projects(vec![
            project("p1", &["a"], None),
            project("p1", &["b"], None),
        ]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "p1"));
    }

    #[test]
    fn load_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("projects.json");
        fs::write(&path, r#"{"p1": {"name": "One", "images": ["a.jpg"]}}"#).unwrap();
        let catalog = ProjectCatalog::load(&path).unwrap();
        assert_eq!(catalog.get("p1").unwrap().images, vec!["a.jpg"]);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = ProjectCatalog::load(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(CatalogError::Io(_))));
    }

    #[test]
    fn audit_reports_duplicates_and_hero() {
        let catalog = ProjectCatalog::from_projects(vec![
            project("p1", &["a", "b", "a", "a"], Some("b")),
            project("p2", &["c"], Some("missing")),
        ])
        .unwrap();
        let audit = catalog.audit();
        assert_eq!(audit[0].duplicates, vec!["a"]);
        assert_eq!(audit[0].hero, HeroStatus::Promoted);
        assert_eq!(audit[1].hero, HeroStatus::NotInImages);
        assert_eq!(audit[1].image_count, 1);
    }

    #[test]
    fn all_sources_deduplicates_across_projects() {
        let catalog = ProjectCatalog::from_projects(vec![
            project("p1", &["a", "b"], None),
            project("p2", &["b", "c"], Some("a")),
        ])
        .unwrap();
        assert_eq!(catalog.all_sources(), vec!["a", "b", "c"]);
    }
}
