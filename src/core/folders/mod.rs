pub mod folder_index;
pub mod folder_service;
pub mod subtree;

pub use folder_index::{FolderIndex, PathStyle};
pub use folder_service::{match_choice, resolve_choice, FolderService};
pub use subtree::SubtreeEnumerator;
