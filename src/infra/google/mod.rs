// =============================================================================
// GOOGLE WORKSPACE MODULE
// =============================================================================
//
// HTTP adapter for the core `WorkspaceClient` port.
//
// - `service_account.rs` turns a service-account key into bearer tokens.
// - `workspace_client.rs` calls Drive v3, Docs v1 and Sheets v4 with them.
//
// **Setup:**
// 1. Create a service account in Google Cloud Console and download a JSON key.
// 2. Enable the Drive, Docs and Sheets APIs for the project.
// 3. Share the briefs folder tree, the templates and the accounts spreadsheet
//    with the service account email (Editor on the folders so it can copy).
// 4. Point `GOOGLE_SERVICE_ACCOUNT_KEY` at the key file, or put the JSON itself
//    in `GOOGLE_SERVICE_ACCOUNT_JSON`.

pub mod service_account;
pub mod workspace_client;

pub use workspace_client::GoogleWorkspaceClient;
