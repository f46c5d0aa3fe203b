use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown instead of a folder path when a document's parent can't be resolved.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// File metadata as handed back by the Drive adapter.
///
/// Only the fields the core asks for are populated; everything else is left at
/// its default so the same type covers folders and documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
    pub modified_time: Option<DateTime<Utc>>,
    pub web_view_link: Option<String>,
}

/// A folder snapshot. Drive allows several parents but in practice there is
/// at most one, and only the first is ever followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRecord {
    pub id: String,
    pub name: String,
    pub parents: Vec<String>,
}

impl FolderRecord {
    #[cfg(test)]
    pub fn new(id: impl Into<String>, name: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
        }
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

impl From<DriveFile> for FolderRecord {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            parents: file.parents,
        }
    }
}

/// A document returned by search, annotated with the path of its folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    pub modified_time: Option<DateTime<Utc>>,
    pub web_view_link: Option<String>,
    pub parents: Vec<String>,
    /// Either a `" > "`-joined path or [`UNKNOWN_LOCATION`].
    pub folder_name: String,
}

impl DocumentRecord {
    /// Wraps a Drive file; the folder path is filled in later by the search service.
    pub fn unannotated(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            modified_time: file.modified_time,
            web_view_link: file.web_view_link,
            parents: file.parents,
            folder_name: UNKNOWN_LOCATION.to_string(),
        }
    }

    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Per-client numbers from the accounts sheet. Cells are untyped text, so
/// everything stays a string and missing cells are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetrics {
    pub lead: String,
    pub tickets: String,
    pub completed: String,
    pub percent: String,
}

/// A folder offered to the user, labelled with a human-readable path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderChoice {
    pub id: String,
    pub path: String,
}

/// One exact, case-sensitive find/replace applied to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReplacement {
    pub placeholder: String,
    pub value: String,
}

impl TextReplacement {
    pub fn new(placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            value: value.into(),
        }
    }
}
