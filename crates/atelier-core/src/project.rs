//! Project descriptors and file records.
//!
//! [`Project`] is what lives in `project.json` and in the registry.
//! [`FileRecord`] is produced by the classifier on every listing and is
//! never stored.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File name of the per-project metadata sidecar.
pub const SIDECAR_FILE: &str = "project.json";

/// A named, disk-backed workspace.
///
/// Field order here is the field order on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Unique identifier, also the directory name.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Set once at creation (or adoption).
    pub created_at: DateTime<Utc>,
    /// Bumped on every metadata rewrite.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Build a fresh descriptor with both timestamps set to `now`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Descriptor for a directory found on disk without usable metadata.
    pub fn adopted(id: impl Into<String>, modified: DateTime<Utc>) -> Self {
        let id = id.into();
        Self::new(
            id.clone(),
            format!("Project {id}"),
            "Auto-discovered project",
            modified,
        )
    }
}

/// Body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProject {
    /// Display name; must not be blank.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
}

impl NewProject {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Kind of a file-tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    Pdf,
    Txt,
    Csv,
    File,
}

impl FileKind {
    /// Classify a regular file by extension. Case-sensitive.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("pdf") => Self::Pdf,
            Some("txt") => Self::Txt,
            Some("csv") => Self::Csv,
            _ => Self::File,
        }
    }

    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
            Self::Csv => "csv",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One entry of a project's file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Base name.
    pub name: String,
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    /// Folder or file kind.
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Owning project.
    pub project_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_project_serializes_camel_case() {
        let project = Project::new("20240309143000", "Survey", "site plans", fixed_time());
        let json = serde_json::to_value(&project).unwrap();

        assert_eq!(json["id"], "20240309143000");
        assert_eq!(json["createdAt"], "2024-03-09T14:30:00Z");
        assert_eq!(json["updatedAt"], "2024-03-09T14:30:00Z");
        assert_eq!(json.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_project_ignores_unknown_fields() {
        let json = r#"{
            "id": "p1",
            "name": "One",
            "description": "",
            "createdAt": "2024-03-09T14:30:00Z",
            "updatedAt": "2024-03-09T14:30:00Z",
            "owner": "someone"
        }"#;
        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id, "p1");
        assert_eq!(project.created_at, fixed_time());
    }

    #[test]
    fn test_adopted_project() {
        let project = Project::adopted("legacy", fixed_time());
        assert_eq!(project.name, "Project legacy");
        assert_eq!(project.description, "Auto-discovered project");
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn test_new_project_description_defaults() {
        let req: NewProject = serde_json::from_str(r#"{"name": "Only name"}"#).unwrap();
        assert_eq!(req.name, "Only name");
        assert!(req.description.is_empty());
    }

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(FileKind::from_path(Path::new("a.pdf")), FileKind::Pdf);
        assert_eq!(FileKind::from_path(Path::new("dir/b.txt")), FileKind::Txt);
        assert_eq!(FileKind::from_path(Path::new("c.csv")), FileKind::Csv);
        assert_eq!(FileKind::from_path(Path::new("d.unknownext")), FileKind::File);
        assert_eq!(FileKind::from_path(Path::new("noext")), FileKind::File);
    }

    #[test]
    fn test_file_kind_is_case_sensitive() {
        assert_eq!(FileKind::from_path(Path::new("REPORT.PDF")), FileKind::File);
        assert_eq!(FileKind::from_path(Path::new("notes.Txt")), FileKind::File);
    }

    #[test]
    fn test_file_record_wire_format() {
        let record = FileRecord {
            name: "b.pdf".into(),
            path: "docs/b.pdf".into(),
            kind: FileKind::Pdf,
            project_id: "p1".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "pdf");
        assert_eq!(json["projectId"], "p1");
        assert_eq!(FileKind::Folder.to_string(), "folder");
    }
}
