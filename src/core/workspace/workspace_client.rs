use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::drive_query::FileQuery;
use super::workspace_models::{DriveFile, TextReplacement};

/// Anything that can go wrong talking to Google.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Google authentication failed: {0}")]
    Auth(String),
    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Request to Google failed: {0}")]
    Transport(String),
    #[error("Unexpected response from Google: {0}")]
    Decode(String),
}

/// The remote operations the core depends on.
///
/// Implemented over HTTP by `infra::google::GoogleWorkspaceClient` and by an
/// in-memory fake in tests.
#[async_trait]
pub trait WorkspaceClient: Send + Sync {
    /// Lists files matching `query`, following pagination up to `query.limit`.
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveFile>, WorkspaceError>;

    /// Fetches `id`, `name` and `parents` for a single file.
    async fn get_file(&self, file_id: &str) -> Result<DriveFile, WorkspaceError>;

    /// Copies a file into `parent_id` under a new name.
    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<DriveFile, WorkspaceError>;

    /// Applies exact-match replacements in order. Returns how many occurrences
    /// each replacement changed, in the same order.
    async fn replace_all_text(
        &self,
        document_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<Vec<u32>, WorkspaceError>;

    /// Reads the cell values of an A1 range. Rows may be ragged.
    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError>;
}

// Lets several services share one client behind an Arc.
#[async_trait]
impl<T: WorkspaceClient + ?Sized> WorkspaceClient for Arc<T> {
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveFile>, WorkspaceError> {
        (**self).list_files(query).await
    }

    async fn get_file(&self, file_id: &str) -> Result<DriveFile, WorkspaceError> {
        (**self).get_file(file_id).await
    }

    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<DriveFile, WorkspaceError> {
        (**self).copy_file(file_id, name, parent_id).await
    }

    async fn replace_all_text(
        &self,
        document_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<Vec<u32>, WorkspaceError> {
        (**self).replace_all_text(document_id, replacements).await
    }

    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError> {
        (**self).read_range(spreadsheet_id, range).await
    }
}
