use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::core::folders::{FolderIndex, PathStyle, SubtreeEnumerator};
use crate::core::workspace::{
    DocumentRecord, FileQuery, FolderRecord, WorkspaceClient, WorkspaceError, UNKNOWN_LOCATION,
};

/// Something that went wrong without failing the search as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchDiagnostic {
    /// Metadata for a folder in the searched subtree couldn't be fetched, so
    /// documents under it may show a partial path or "Unknown Location".
    FolderUnavailable { folder_id: String, reason: String },
    /// A document's folder chain looped and its path was cut short.
    PathCycle { folder_id: String },
}

#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Newest first.
    pub documents: Vec<DocumentRecord>,
    pub diagnostics: Vec<SearchDiagnostic>,
    /// Size of the folder subtree the search covered.
    pub folders_searched: usize,
}

/// Full-text document search over the briefs folder tree.
pub struct SearchService<C: WorkspaceClient> {
    client: Arc<C>,
    subtrees: Arc<SubtreeEnumerator<C>>,
    root_folder_id: String,
    result_limit: usize,
    parent_batch_size: usize,
}

impl<C: WorkspaceClient> SearchService<C> {
    pub fn new(
        client: Arc<C>,
        subtrees: Arc<SubtreeEnumerator<C>>,
        root_folder_id: impl Into<String>,
        result_limit: usize,
        parent_batch_size: usize,
    ) -> Self {
        Self {
            client,
            subtrees,
            root_folder_id: root_folder_id.into(),
            result_limit: result_limit.max(1),
            parent_batch_size: parent_batch_size.max(1),
        }
    }

    /// Finds documents under `scope_folder_id` (or the briefs root), optionally
    /// containing `keyword`, newest first, each annotated with its folder path.
    ///
    /// Remote query failures are returned as errors. Folder metadata lookups
    /// used for annotation are best-effort and reported as diagnostics.
    pub async fn search_documents(
        &self,
        keyword: Option<&str>,
        scope_folder_id: Option<&str>,
    ) -> Result<SearchOutcome, WorkspaceError> {
        let root = scope_folder_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(self.root_folder_id.as_str());
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());

        let folder_ids = self.subtrees.all_descendant_ids(root).await?;
        let candidates: Vec<&str> = folder_ids.iter().map(String::as_str).collect();

        let mut documents = self.find_documents(&candidates, keyword).await?;
        sort_newest_first(&mut documents);
        documents.truncate(self.result_limit);

        let mut diagnostics = Vec::new();
        if !documents.is_empty() {
            let folders = self.fetch_folders(&candidates, &mut diagnostics).await;
            diagnostics.extend(annotate_paths(&mut documents, &folders));
        }

        tracing::info!(
            root,
            keyword = keyword.unwrap_or(""),
            folders = candidates.len(),
            results = documents.len(),
            diagnostics = diagnostics.len(),
            "Document search finished"
        );

        Ok(SearchOutcome {
            documents,
            diagnostics,
            folders_searched: candidates.len(),
        })
    }

    /// Queries documents whose parent is any candidate folder. Large candidate
    /// sets are split into batches so each `q` stays a sane length; results
    /// are merged and de-duplicated.
    async fn find_documents(
        &self,
        candidates: &[&str],
        keyword: Option<&str>,
    ) -> Result<Vec<DocumentRecord>, WorkspaceError> {
        let mut seen = HashSet::new();
        let mut documents = Vec::new();

        for batch in candidates.chunks(self.parent_batch_size) {
            let mut query = FileQuery::documents()
                .in_parents(batch.iter().copied())
                .newest_first()
                .limit(self.result_limit);
            if let Some(keyword) = keyword {
                query = query.containing_text(keyword);
            }

            for file in self.client.list_files(&query).await? {
                if seen.insert(file.id.clone()) {
                    documents.push(DocumentRecord::unannotated(file));
                }
            }
        }

        Ok(documents)
    }

    async fn fetch_folders(
        &self,
        folder_ids: &[&str],
        diagnostics: &mut Vec<SearchDiagnostic>,
    ) -> FolderIndex {
        let mut folders = Vec::with_capacity(folder_ids.len());

        for folder_id in folder_ids {
            match self.client.get_file(folder_id).await {
                Ok(file) => folders.push(FolderRecord::from(file)),
                Err(e) => {
                    tracing::warn!(folder_id, error = %e, "Skipping folder metadata");
                    diagnostics.push(SearchDiagnostic::FolderUnavailable {
                        folder_id: folder_id.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        FolderIndex::from_records(folders)
    }
}

/// Most recently modified first; documents without a timestamp go last and
/// ties are broken by name so the order is stable across batches.
pub fn sort_newest_first(documents: &mut [DocumentRecord]) {
    documents.sort_by(|a, b| match b.modified_time.cmp(&a.modified_time) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
}

/// Fills in `folder_name` for each document from the fetched folder metadata.
/// All ancestors are shown (no "seo" skipping here).
pub fn annotate_paths(
    documents: &mut [DocumentRecord],
    folders: &FolderIndex,
) -> Vec<SearchDiagnostic> {
    let mut diagnostics = Vec::new();
    let mut reported_cycles = HashSet::new();

    for document in documents.iter_mut() {
        let resolved = document
            .first_parent()
            .and_then(|parent_id| folders.resolve_path_from(parent_id, PathStyle::Full));

        document.folder_name = match resolved {
            Some(path) => {
                if path.truncated_by_cycle {
                    if let Some(parent_id) = document.first_parent() {
                        if reported_cycles.insert(parent_id.to_string()) {
                            diagnostics.push(SearchDiagnostic::PathCycle {
                                folder_id: parent_id.to_string(),
                            });
                        }
                    }
                }
                path.display()
            }
            None => UNKNOWN_LOCATION.to_string(),
        };

        if document.folder_name.is_empty() {
            document.folder_name = UNKNOWN_LOCATION.to_string();
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::workspace::fake_workspace::{timestamp, FakeWorkspace};
    use crate::core::workspace::DriveFile;

    fn workspace() -> FakeWorkspace {
        FakeWorkspace::new()
            .folder("clients", "Clients", None)
            .folder("root", "Developer Briefs", Some("clients"))
            .folder("acme", "Acme", Some("root"))
            .folder("acme-seo", "SEO", Some("acme"))
            .folder("beta", "Beta", Some("root"))
            .folder("other", "Other Team", None)
            .document(
                "a",
                "Fix robots.txt",
                Some("acme-seo"),
                "2024-01-01T09:00:00Z",
                "Broken link audit for Acme",
            )
            .document(
                "b",
                "Broken link sweep",
                Some("beta"),
                "2024-03-01T09:00:00Z",
                "Sweep every page",
            )
            .document(
                "c",
                "Homepage speed",
                Some("root"),
                "2024-02-01T09:00:00Z",
                "Core web vitals",
            )
            .document(
                "x",
                "Broken link elsewhere",
                Some("other"),
                "2024-04-01T09:00:00Z",
                "Not a brief",
            )
    }

    fn service(
        workspace: Arc<FakeWorkspace>,
        limit: usize,
        batch: usize,
    ) -> SearchService<FakeWorkspace> {
        let subtrees = Arc::new(SubtreeEnumerator::new(Arc::clone(&workspace), None, 8));
        SearchService::new(workspace, subtrees, "root", limit, batch)
    }

    fn names(outcome: &SearchOutcome) -> Vec<&str> {
        outcome.documents.iter().map(|d| d.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_view_all_is_newest_first() {
        let search = service(Arc::new(workspace()), 100, 40);
        let outcome = search.search_documents(None, None).await.unwrap();

        assert_eq!(
            names(&outcome),
            vec!["Broken link sweep", "Homepage speed", "Fix robots.txt"]
        );
        assert_eq!(outcome.folders_searched, 4);
        assert!(outcome.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_matches_full_text() {
        let search = service(Arc::new(workspace()), 100, 40);
        let outcome = search
            .search_documents(Some("broken link"), None)
            .await
            .unwrap();

        // B (March) before A (January); the match outside the briefs tree is excluded.
        assert_eq!(names(&outcome), vec!["Broken link sweep", "Fix robots.txt"]);
    }

    #[tokio::test]
    async fn test_blank_keyword_lists_everything() {
        let search = service(Arc::new(workspace()), 100, 40);
        let outcome = search.search_documents(Some("  "), None).await.unwrap();
        assert_eq!(outcome.documents.len(), 3);
    }

    #[tokio::test]
    async fn test_scope_limits_to_subtree() {
        let search = service(Arc::new(workspace()), 100, 40);
        let outcome = search.search_documents(None, Some("acme")).await.unwrap();

        assert_eq!(names(&outcome), vec!["Fix robots.txt"]);
        assert_eq!(outcome.folders_searched, 2);
    }

    #[tokio::test]
    async fn test_paths_show_every_ancestor_inside_the_tree() {
        let search = service(Arc::new(workspace()), 100, 40);
        let outcome = search.search_documents(None, None).await.unwrap();

        let paths: Vec<&str> = outcome
            .documents
            .iter()
            .map(|d| d.folder_name.as_str())
            .collect();
        // "Clients" sits above the searched root so it isn't fetched; "SEO" isn't skipped.
        assert_eq!(
            paths,
            vec![
                "Developer Briefs > Beta",
                "Developer Briefs",
                "Developer Briefs > Acme > SEO",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_folder_fetch_degrades_to_diagnostic() {
        let search = service(Arc::new(workspace().failing_get("beta")), 100, 40);
        let outcome = search.search_documents(None, None).await.unwrap();

        let sweep = &outcome.documents[0];
        assert_eq!(sweep.name, "Broken link sweep");
        assert_eq!(sweep.folder_name, UNKNOWN_LOCATION);
        assert_eq!(
            outcome.diagnostics,
            vec![SearchDiagnostic::FolderUnavailable {
                folder_id: "beta".to_string(),
                reason: "Google API error (500): backend error".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_batches_are_merged_and_resorted() {
        let workspace = Arc::new(workspace());
        let search = service(Arc::clone(&workspace), 100, 1);
        let outcome = search.search_documents(None, None).await.unwrap();

        assert_eq!(
            names(&outcome),
            vec!["Broken link sweep", "Homepage speed", "Fix robots.txt"]
        );
        let document_queries = workspace
            .queries
            .iter()
            .filter(|q| q.value().kind == crate::core::workspace::drive_query::FileKind::Document)
            .count();
        assert_eq!(document_queries, 4);
    }

    #[tokio::test]
    async fn test_result_limit() {
        let search = service(Arc::new(workspace()), 2, 40);
        let outcome = search.search_documents(None, None).await.unwrap();
        assert_eq!(names(&outcome), vec!["Broken link sweep", "Homepage speed"]);
    }

    #[tokio::test]
    async fn test_repeated_searches_reuse_subtree() {
        let workspace = Arc::new(workspace());
        let search = service(Arc::clone(&workspace), 100, 40);

        search.search_documents(Some("speed"), None).await.unwrap();
        let folder_listings = FakeWorkspace::count(&workspace.list_calls) - 1;
        search.search_documents(Some("sweep"), None).await.unwrap();

        // Only the document query runs again.
        assert_eq!(
            FakeWorkspace::count(&workspace.list_calls),
            folder_listings + 2
        );
    }

    #[tokio::test]
    async fn test_no_matches_skips_folder_lookups() {
        let workspace = Arc::new(workspace());
        let search = service(Arc::clone(&workspace), 100, 40);
        let outcome = search
            .search_documents(Some("nothing matches this"), None)
            .await
            .unwrap();

        assert!(outcome.documents.is_empty());
        assert_eq!(FakeWorkspace::count(&workspace.get_calls), 0);
    }

    #[test]
    fn test_document_without_parent_is_unknown_location() {
        let mut documents = vec![DocumentRecord::unannotated(DriveFile {
            id: "d".to_string(),
            name: "Loose".to_string(),
            ..Default::default()
        })];
        let diagnostics = annotate_paths(&mut documents, &FolderIndex::default());

        assert_eq!(documents[0].folder_name, UNKNOWN_LOCATION);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cycle_is_reported_once() {
        let folders = FolderIndex::from_records([
            FolderRecord::new("p", "P", Some("q")),
            FolderRecord::new("q", "Q", Some("p")),
        ]);
        let doc = |id: &str| {
            DocumentRecord::unannotated(DriveFile {
                id: id.to_string(),
                name: id.to_string(),
                parents: vec!["p".to_string()],
                ..Default::default()
            })
        };
        let mut documents = vec![doc("one"), doc("two")];

        let diagnostics = annotate_paths(&mut documents, &folders);

        assert_eq!(documents[0].folder_name, "Q > P");
        assert_eq!(
            diagnostics,
            vec![SearchDiagnostic::PathCycle {
                folder_id: "p".to_string()
            }]
        );
    }

    #[test]
    fn test_sort_puts_undated_last() {
        let doc = |name: &str, modified: Option<&str>| {
            DocumentRecord::unannotated(DriveFile {
                id: name.to_string(),
                name: name.to_string(),
                modified_time: modified.map(timestamp),
                ..Default::default()
            })
        };
        let mut documents = vec![
            doc("undated", None),
            doc("A", Some("2024-01-01T00:00:00Z")),
            doc("B", Some("2024-03-01T00:00:00Z")),
        ];

        sort_newest_first(&mut documents);

        let order: Vec<&str> = documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "undated"]);
    }
}
