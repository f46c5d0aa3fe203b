// In-memory WorkspaceClient for unit tests.
//
// Files live in a DashMap keyed by id. Every remote operation bumps a counter
// so tests can assert on how often the "API" was hit, and individual
// operations can be told to fail.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};

use super::drive_query::{FileKind, FileQuery};
use super::workspace_client::{WorkspaceClient, WorkspaceError};
use super::workspace_models::{DriveFile, TextReplacement};

struct FakeFile {
    kind: FileKind,
    file: DriveFile,
    text: String,
}

#[derive(Default)]
pub struct FakeWorkspace {
    files: DashMap<String, FakeFile>,
    sheets: DashMap<(String, String), Vec<Vec<String>>>,
    failing_gets: DashSet<String>,
    fail_copy: AtomicBool,
    fail_replace: AtomicBool,
    next_id: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub copy_calls: AtomicUsize,
    pub replace_calls: AtomicUsize,
    pub queries: DashMap<usize, FileQuery>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn folder(self, id: &str, name: &str, parent: Option<&str>) -> Self {
        self.files.insert(
            id.to_string(),
            FakeFile {
                kind: FileKind::Folder,
                file: DriveFile {
                    id: id.to_string(),
                    name: name.to_string(),
                    parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
                    ..Default::default()
                },
                text: String::new(),
            },
        );
        self
    }

    /// Adds a document. `modified` is an RFC 3339 timestamp.
    pub fn document(
        self,
        id: &str,
        name: &str,
        parent: Option<&str>,
        modified: &str,
        text: &str,
    ) -> Self {
        self.files.insert(
            id.to_string(),
            FakeFile {
                kind: FileKind::Document,
                file: DriveFile {
                    id: id.to_string(),
                    name: name.to_string(),
                    parents: parent.map(|p| vec![p.to_string()]).unwrap_or_default(),
                    modified_time: Some(timestamp(modified)),
                    web_view_link: Some(format!("https://docs.google.com/document/d/{}/edit", id)),
                },
                text: text.to_string(),
            },
        );
        self
    }

    pub fn sheet(self, spreadsheet_id: &str, range: &str, rows: Vec<Vec<&str>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(str::to_string).collect())
            .collect();
        self.sheets
            .insert((spreadsheet_id.to_string(), range.to_string()), rows);
        self
    }

    pub fn failing_get(self, id: &str) -> Self {
        self.failing_gets.insert(id.to_string());
        self
    }

    pub fn failing_copy(self) -> Self {
        self.fail_copy.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_replace(self) -> Self {
        self.fail_replace.store(true, Ordering::SeqCst);
        self
    }

    /// Adds a folder after construction, e.g. to simulate the hierarchy changing.
    pub fn add_folder(&self, id: &str, name: &str, parent: &str) {
        self.files.insert(
            id.to_string(),
            FakeFile {
                kind: FileKind::Folder,
                file: DriveFile {
                    id: id.to_string(),
                    name: name.to_string(),
                    parents: vec![parent.to_string()],
                    ..Default::default()
                },
                text: String::new(),
            },
        );
    }

    pub fn file(&self, id: &str) -> Option<DriveFile> {
        self.files.get(id).map(|f| f.file.clone())
    }

    pub fn text_of(&self, id: &str) -> Option<String> {
        self.files.get(id).map(|f| f.text.clone())
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub fn timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .expect("test timestamps are RFC 3339")
        .with_timezone(&Utc)
}

fn api_error(status: u16, message: &str) -> WorkspaceError {
    WorkspaceError::Api {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl WorkspaceClient for FakeWorkspace {
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveFile>, WorkspaceError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.insert(call, query.clone());

        let needle = query.full_text.as_ref().map(|t| t.to_lowercase());
        let mut matches: Vec<DriveFile> = self
            .files
            .iter()
            .filter(|entry| entry.kind == query.kind)
            .filter(|entry| {
                query.parents.is_empty()
                    || entry.file.parents.iter().any(|p| query.parents.contains(p))
            })
            .filter(|entry| match &needle {
                None => true,
                Some(needle) => {
                    entry.file.name.to_lowercase().contains(needle)
                        || entry.text.to_lowercase().contains(needle)
                }
            })
            .map(|entry| entry.file.clone())
            .collect();

        if query.is_newest_first() {
            matches.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
        } else {
            matches.sort_by(|a, b| a.id.cmp(&b.id));
        }
        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn get_file(&self, file_id: &str) -> Result<DriveFile, WorkspaceError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_gets.contains(file_id) {
            return Err(api_error(500, "backend error"));
        }
        self.file(file_id)
            .map(|f| DriveFile {
                modified_time: None,
                web_view_link: None,
                ..f
            })
            .ok_or_else(|| api_error(404, "File not found"))
    }

    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<DriveFile, WorkspaceError> {
        self.copy_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(api_error(403, "The user does not have sufficient permissions"));
        }

        let (kind, text) = {
            let source = self
                .files
                .get(file_id)
                .ok_or_else(|| api_error(404, "File not found"))?;
            (source.kind, source.text.clone())
        };

        let id = format!("copy-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let file = DriveFile {
            id: id.clone(),
            name: name.to_string(),
            parents: vec![parent_id.to_string()],
            modified_time: Some(Utc::now()),
            web_view_link: Some(format!("https://docs.google.com/document/d/{}/edit", id)),
        };
        self.files.insert(
            id,
            FakeFile {
                kind,
                file: file.clone(),
                text,
            },
        );
        Ok(file)
    }

    async fn replace_all_text(
        &self,
        document_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<Vec<u32>, WorkspaceError> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(api_error(500, "Internal error encountered."));
        }

        let mut entry = self
            .files
            .get_mut(document_id)
            .ok_or_else(|| api_error(404, "Requested entity was not found."))?;

        let mut counts = Vec::with_capacity(replacements.len());
        for replacement in replacements {
            let occurrences = entry.text.matches(replacement.placeholder.as_str()).count();
            entry.text = entry
                .text
                .replace(replacement.placeholder.as_str(), &replacement.value);
            counts.push(occurrences as u32);
        }
        Ok(counts)
    }

    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError> {
        self.sheets
            .get(&(spreadsheet_id.to_string(), range.to_string()))
            .map(|rows| rows.clone())
            .ok_or_else(|| api_error(400, "Unable to parse range"))
    }
}
