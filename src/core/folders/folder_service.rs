use std::sync::Arc;

use super::folder_index::FolderIndex;
use crate::core::workspace::{FileQuery, FolderChoice, WorkspaceClient, WorkspaceError};

/// Page size used for the short list of folders directly under the root.
const SCOPE_PAGE_SIZE: u32 = 100;

/// Lists the folders users pick from: where a brief can be created, and which
/// part of the briefs tree a search can be limited to.
pub struct FolderService<C: WorkspaceClient> {
    client: Arc<C>,
    root_folder_id: String,
}

impl<C: WorkspaceClient> FolderService<C> {
    pub fn new(client: Arc<C>, root_folder_id: impl Into<String>) -> Self {
        Self {
            client,
            root_folder_id: root_folder_id.into(),
        }
    }

    /// Every "Technical SEO" folder, labelled with its path and sorted by it.
    pub async fn destination_folders(&self) -> Result<Vec<FolderChoice>, WorkspaceError> {
        let index = FolderIndex::build(self.client.as_ref()).await?;
        let choices = index.destination_choices();
        tracing::debug!(
            indexed = index.len(),
            destinations = choices.len(),
            "Listed destination folders"
        );
        Ok(choices)
    }

    /// The folders directly under the briefs root, sorted by name.
    pub async fn scope_folders(&self) -> Result<Vec<FolderChoice>, WorkspaceError> {
        let query = FileQuery::folders()
            .in_parents([self.root_folder_id.as_str()])
            .page_size(SCOPE_PAGE_SIZE)
            .limit(SCOPE_PAGE_SIZE as usize);
        let mut choices: Vec<FolderChoice> = self
            .client
            .list_files(&query)
            .await?
            .into_iter()
            .map(|folder| FolderChoice {
                id: folder.id,
                path: folder.name,
            })
            .collect();

        choices.sort_by_cached_key(|choice| choice.path.to_lowercase());
        Ok(choices)
    }
}

/// The offered folder whose label (case-insensitive) or id is `input`.
pub fn match_choice<'a>(choices: &'a [FolderChoice], input: &str) -> Option<&'a FolderChoice> {
    let input = input.trim();
    choices
        .iter()
        .find(|choice| choice.path.trim().eq_ignore_ascii_case(input) || choice.id == input)
}

/// Maps what a user typed (a label offered by autocomplete, or a raw id) to
/// a folder id. Anything that matches no choice is taken as an id.
pub fn resolve_choice(choices: &[FolderChoice], input: &str) -> String {
    match_choice(choices, input)
        .map(|choice| choice.id.clone())
        .unwrap_or_else(|| input.trim().to_string())
}
