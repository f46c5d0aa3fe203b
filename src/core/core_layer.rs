// The core module contains all business logic.
// Nothing in here knows about Discord or HTTP; Google is reached only through
// the `workspace::WorkspaceClient` port.

#[path = "workspace/mod.rs"]
pub mod workspace;

#[path = "folders/mod.rs"]
pub mod folders;

#[path = "search/mod.rs"]
pub mod search;

#[path = "clients/mod.rs"]
pub mod clients;

#[path = "briefs/mod.rs"]
pub mod briefs;
