use std::collections::{HashMap, HashSet};

use crate::core::workspace::{
    FileQuery, FolderChoice, FolderRecord, WorkspaceClient, WorkspaceError,
};

pub const PATH_SEPARATOR: &str = " > ";

/// Ancestors with this name (any case) are left out of destination paths.
const SKIPPED_ANCESTOR: &str = "seo";

/// Destination folders are the ones with exactly this name, trimmed, any case.
const DESTINATION_FOLDER: &str = "technical seo";

/// How ancestor names are rendered into a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStyle {
    /// Omit ancestors named "seo" but keep walking past them. Used for the
    /// destination folder listing.
    SkipSeo,
    /// Every ancestor is shown. Used when annotating search results.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Root-to-leaf folder names.
    pub segments: Vec<String>,
    /// Set when the parent chain looped back on itself and the walk was cut short.
    pub truncated_by_cycle: bool,
}

impl ResolvedPath {
    pub fn display(&self) -> String {
        self.segments.join(PATH_SEPARATOR)
    }
}

/// Folder id -> folder snapshot, built fresh for each request.
#[derive(Debug, Default, Clone)]
pub struct FolderIndex {
    folders: HashMap<String, FolderRecord>,
}

impl FolderIndex {
    pub fn from_records(records: impl IntoIterator<Item = FolderRecord>) -> Self {
        Self {
            folders: records
                .into_iter()
                .map(|folder| (folder.id.clone(), folder))
                .collect(),
        }
    }

    /// Fetches every non-trashed folder visible to the service account.
    pub async fn build<C: WorkspaceClient + ?Sized>(client: &C) -> Result<Self, WorkspaceError> {
        let folders = client.list_files(&FileQuery::folders()).await?;
        tracing::debug!(folders = folders.len(), "Built folder index");
        Ok(Self::from_records(folders.into_iter().map(FolderRecord::from)))
    }

    pub fn get(&self, id: &str) -> Option<&FolderRecord> {
        self.folders.get(id)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Builds the display path of `folder` by following first parents through
    /// the index. The folder's own name is always kept. The walk ends at a
    /// parent missing from the index, at a folder without parents, or at the
    /// first id seen twice.
    pub fn resolve_path(&self, folder: &FolderRecord, style: PathStyle) -> ResolvedPath {
        let mut segments = vec![folder.name.clone()];
        let mut visited: HashSet<&str> = HashSet::from([folder.id.as_str()]);
        let mut truncated_by_cycle = false;
        let mut current = folder;

        while let Some(parent_id) = current.first_parent() {
            if !visited.insert(parent_id) {
                truncated_by_cycle = true;
                break;
            }
            let Some(parent) = self.folders.get(parent_id) else {
                break;
            };
            let skipped =
                style == PathStyle::SkipSeo && parent.name.to_lowercase() == SKIPPED_ANCESTOR;
            if !skipped {
                segments.push(parent.name.clone());
            }
            current = parent;
        }

        if truncated_by_cycle {
            tracing::warn!(folder_id = %folder.id, "Folder parent chain contains a cycle");
        }

        segments.reverse();
        ResolvedPath {
            segments,
            truncated_by_cycle,
        }
    }

    /// Same as [`resolve_path`](Self::resolve_path) but starting from an id.
    /// Returns `None` when the id isn't in the index.
    pub fn resolve_path_from(&self, folder_id: &str, style: PathStyle) -> Option<ResolvedPath> {
        self.folders
            .get(folder_id)
            .map(|folder| self.resolve_path(folder, style))
    }

    /// All "Technical SEO" folders, labelled with their trimmed path and
    /// sorted case-insensitively by it.
    pub fn destination_choices(&self) -> Vec<FolderChoice> {
        let mut choices: Vec<FolderChoice> = self
            .folders
            .values()
            .filter(|folder| folder.name.trim().to_lowercase() == DESTINATION_FOLDER)
            .map(|folder| FolderChoice {
                id: folder.id.clone(),
                path: self.resolve_path(folder, PathStyle::SkipSeo).display(),
            })
            .collect();

        choices.sort_by_cached_key(|choice| (choice.path.to_lowercase(), choice.id.clone()));
        choices
    }
}
