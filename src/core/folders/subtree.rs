// Subtree enumeration with a process-wide memo.
//
// Almost every search starts from the same root, and walking the hierarchy
// costs one Drive call per folder, so finished walks are cached by root id.
// The cache is a DashMap so concurrent commands can share it without a
// global lock. Entries can expire (TTL), the table is bounded, and the
// `/briefs refresh` command clears it when the hierarchy changes.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::core::workspace::{FileQuery, WorkspaceClient, WorkspaceError};

/// A folder id together with every id below it.
pub type FolderIds = Arc<BTreeSet<String>>;

struct CachedSubtree {
    ids: FolderIds,
    fetched_at: Instant,
}

pub struct SubtreeEnumerator<C: WorkspaceClient> {
    client: Arc<C>,
    cache: DashMap<String, CachedSubtree>,
    ttl: Option<Duration>,
    max_entries: usize,
}

impl<C: WorkspaceClient> SubtreeEnumerator<C> {
    pub fn new(client: Arc<C>, ttl: Option<Duration>, max_entries: usize) -> Self {
        Self {
            client,
            cache: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Returns `root_id` and all of its descendant folder ids.
    ///
    /// Served from the cache when possible; otherwise the hierarchy is walked
    /// breadth-first with one child listing per folder.
    pub async fn all_descendant_ids(&self, root_id: &str) -> Result<FolderIds, WorkspaceError> {
        if let Some(ids) = self.cached(root_id) {
            tracing::debug!(root_id, folders = ids.len(), "Subtree cache hit");
            return Ok(ids);
        }

        let ids = Arc::new(self.walk(root_id).await?);
        tracing::info!(root_id, folders = ids.len(), "Enumerated folder subtree");
        self.remember(root_id, Arc::clone(&ids));
        Ok(ids)
    }

    /// Drops the cached subtree for one root. Returns whether anything was cached.
    pub fn invalidate(&self, root_id: &str) -> bool {
        self.cache.remove(root_id).is_some()
    }

    /// Drops every cached subtree and returns how many there were.
    pub fn clear(&self) -> usize {
        let count = self.cache.len();
        self.cache.clear();
        count
    }

    pub fn cached_roots(&self) -> usize {
        self.cache.len()
    }

    async fn walk(&self, root_id: &str) -> Result<BTreeSet<String>, WorkspaceError> {
        let mut ids = BTreeSet::from([root_id.to_string()]);
        let mut pending = vec![root_id.to_string()];

        while let Some(folder_id) = pending.pop() {
            let children = self
                .client
                .list_files(&FileQuery::folders().in_parents([folder_id.as_str()]))
                .await?;

            for child in children {
                // A folder we've already seen means the graph loops; don't walk it again.
                if ids.insert(child.id.clone()) {
                    pending.push(child.id);
                } else {
                    tracing::warn!(folder_id = %child.id, "Folder reached twice while enumerating subtree");
                }
            }
        }

        Ok(ids)
    }

    fn cached(&self, root_id: &str) -> Option<FolderIds> {
        {
            let entry = self.cache.get(root_id)?;
            if !self.is_expired(&entry) {
                return Some(Arc::clone(&entry.ids));
            }
        }

        self.cache.remove(root_id);
        tracing::debug!(root_id, "Subtree cache entry expired");
        None
    }

    fn is_expired(&self, entry: &CachedSubtree) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.fetched_at.elapsed() >= ttl)
    }

    fn remember(&self, root_id: &str, ids: FolderIds) {
        if !self.cache.contains_key(root_id) && self.cache.len() >= self.max_entries {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|entry| entry.value().fetched_at)
                .map(|entry| entry.key().clone());
            if let Some(oldest) = oldest {
                self.cache.remove(&oldest);
            }
        }

        self.cache.insert(
            root_id.to_string(),
            CachedSubtree {
                ids,
                fetched_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::fake_workspace::FakeWorkspace;

    fn hierarchy() -> Arc<FakeWorkspace> {
        Arc::new(
            FakeWorkspace::new()
                .folder("root", "Developer Briefs", None)
                .folder("a", "Acme", Some("root"))
                .folder("a1", "2024", Some("a"))
                .folder("a2", "2025", Some("a"))
                .folder("b", "Beta", Some("root"))
                .folder("elsewhere", "Elsewhere", None),
        )
    }

    fn ids(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_collects_whole_subtree_including_root() {
        let workspace = hierarchy();
        let subtrees = SubtreeEnumerator::new(Arc::clone(&workspace), None, 8);

        let found = subtrees.all_descendant_ids("root").await.unwrap();
        assert_eq!(*found, ids(&["root", "a", "a1", "a2", "b"]));

        // One listing per folder in the subtree.
        assert_eq!(FakeWorkspace::count(&workspace.list_calls), 5);
    }

    #[tokio::test]
    async fn test_leaf_root_contains_only_itself() {
        let subtrees = SubtreeEnumerator::new(hierarchy(), None, 8);
        let found = subtrees.all_descendant_ids("b").await.unwrap();
        assert_eq!(*found, ids(&["b"]));
    }

    #[tokio::test]
    async fn test_second_call_is_memoized() {
        let workspace = hierarchy();
        let subtrees = SubtreeEnumerator::new(Arc::clone(&workspace), None, 8);

        let first = subtrees.all_descendant_ids("a").await.unwrap();
        let calls = FakeWorkspace::count(&workspace.list_calls);
        let second = subtrees.all_descendant_ids("a").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(FakeWorkspace::count(&workspace.list_calls), calls);
        assert_eq!(subtrees.cached_roots(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_picks_up_new_folders() {
        let workspace = hierarchy();
        let subtrees = SubtreeEnumerator::new(Arc::clone(&workspace), None, 8);

        subtrees.all_descendant_ids("b").await.unwrap();
        workspace.add_folder("b1", "New client work", "b");

        // Still the cached answer until someone invalidates it.
        assert_eq!(*subtrees.all_descendant_ids("b").await.unwrap(), ids(&["b"]));

        assert!(subtrees.invalidate("b"));
        assert_eq!(
            *subtrees.all_descendant_ids("b").await.unwrap(),
            ids(&["b", "b1"])
        );
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let workspace = hierarchy();
        let subtrees = SubtreeEnumerator::new(Arc::clone(&workspace), Some(Duration::ZERO), 8);

        subtrees.all_descendant_ids("b").await.unwrap();
        subtrees.all_descendant_ids("b").await.unwrap();

        assert_eq!(FakeWorkspace::count(&workspace.list_calls), 2);
    }

    #[tokio::test]
    async fn test_cache_is_bounded() {
        let subtrees = SubtreeEnumerator::new(hierarchy(), None, 2);

        subtrees.all_descendant_ids("a").await.unwrap();
        subtrees.all_descendant_ids("b").await.unwrap();
        subtrees.all_descendant_ids("a1").await.unwrap();

        assert_eq!(subtrees.cached_roots(), 2);
        assert_eq!(subtrees.clear(), 2);
        assert_eq!(subtrees.cached_roots(), 0);
    }

    #[tokio::test]
    async fn test_cyclic_hierarchy_terminates() {
        let workspace = Arc::new(
            FakeWorkspace::new()
                .folder("x", "X", Some("y"))
                .folder("y", "Y", Some("x")),
        );
        let subtrees = SubtreeEnumerator::new(workspace, None, 8);

        let found = subtrees.all_descendant_ids("x").await.unwrap();
        assert_eq!(*found, ids(&["x", "y"]));
    }
}
