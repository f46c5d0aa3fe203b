// Discord layer - the `/briefs` commands and the embeds they reply with.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "briefs/formatter.rs"]
pub mod formatter;

// Re-export command types for convenience
pub use commands::briefs::{Context, Data, Error};
