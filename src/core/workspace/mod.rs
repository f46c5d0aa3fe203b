// Workspace port: everything the core knows about Google Drive, Docs and Sheets.
//
// The services in `folders`, `search`, `clients` and `briefs` only ever see the
// `WorkspaceClient` trait and the plain models below. The HTTP adapter lives in
// `infra::google`.

pub mod drive_query;
pub mod workspace_client;
pub mod workspace_config;
pub mod workspace_models;

#[cfg(test)]
pub mod fake_workspace;

pub use drive_query::FileQuery;
pub use workspace_client::{WorkspaceClient, WorkspaceError};
pub use workspace_config::{ConfigError, WorkspaceConfig};
pub use workspace_models::{
    ClientMetrics, DocumentRecord, DriveFile, FolderChoice, FolderRecord, TextReplacement,
    UNKNOWN_LOCATION,
};
