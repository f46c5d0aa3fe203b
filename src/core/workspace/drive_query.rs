// Typed Drive file queries.
//
// Services describe what they want with `FileQuery`; the adapter renders it to
// Drive's `q` syntax via `to_drive_q`. Keeping the rendering here means the
// quoting rules are tested without any HTTP in the loop.

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
pub const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";

/// Largest page Drive accepts for `files.list`.
pub const MAX_PAGE_SIZE: u32 = 1000;

const NEWEST_FIRST: &str = "modifiedTime desc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Folder,
    Document,
}

impl FileKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Folder => FOLDER_MIME_TYPE,
            FileKind::Document => DOCUMENT_MIME_TYPE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub kind: FileKind,
    /// Matches files whose parent is any of these ids. Empty means "anywhere".
    pub parents: Vec<String>,
    pub full_text: Option<String>,
    pub order_by: Option<&'static str>,
    pub page_size: u32,
    /// Stop paging once this many files have been collected.
    pub limit: Option<usize>,
}

impl FileQuery {
    pub fn folders() -> Self {
        Self::of_kind(FileKind::Folder)
    }

    pub fn documents() -> Self {
        Self::of_kind(FileKind::Document)
    }

    fn of_kind(kind: FileKind) -> Self {
        Self {
            kind,
            parents: Vec::new(),
            full_text: None,
            order_by: None,
            page_size: MAX_PAGE_SIZE,
            limit: None,
        }
    }

    pub fn in_parents<I, S>(mut self, parent_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents.extend(parent_ids.into_iter().map(Into::into));
        self
    }

    /// Adds a full-text condition. Blank keywords are ignored.
    pub fn containing_text(mut self, keyword: &str) -> Self {
        let keyword = keyword.trim();
        if !keyword.is_empty() {
            self.full_text = Some(keyword.to_string());
        }
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.order_by = Some(NEWEST_FIRST);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_newest_first(&self) -> bool {
        self.order_by == Some(NEWEST_FIRST)
    }

    /// Renders the `q` parameter for `files.list`.
    pub fn to_drive_q(&self) -> String {
        let mut q = format!("mimeType='{}' and trashed = false", self.kind.mime_type());

        if !self.parents.is_empty() {
            let parents = self
                .parents
                .iter()
                .map(|id| format!("'{}' in parents", escape_literal(id)))
                .collect::<Vec<_>>()
                .join(" or ");
            q.push_str(&format!(" and ({})", parents));
        }

        if let Some(text) = &self.full_text {
            q.push_str(&format!(" and fullText contains '{}'", escape_literal(text)));
        }

        q
    }
}

/// Escapes a value for use inside a single-quoted Drive query literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_folders_query() {
        assert_eq!(
            FileQuery::folders().to_drive_q(),
            "mimeType='application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn test_document_query_with_parents_and_keyword() {
        let query = FileQuery::documents()
            .in_parents(["a", "b"])
            .containing_text("broken link")
            .newest_first();

        assert_eq!(
            query.to_drive_q(),
            "mimeType='application/vnd.google-apps.document' and trashed = false \
             and ('a' in parents or 'b' in parents) and fullText contains 'broken link'"
        );
        assert!(query.is_newest_first());
    }

    #[test]
    fn test_blank_keyword_is_ignored() {
        let query = FileQuery::documents().containing_text("   ");
        assert_eq!(query.full_text, None);
        assert!(!query.to_drive_q().contains("fullText"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        let query = FileQuery::documents().containing_text("client's \\ page");
        assert!(query
            .to_drive_q()
            .ends_with("fullText contains 'client\\'s \\\\ page'"));
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(FileQuery::folders().page_size(5000).page_size, MAX_PAGE_SIZE);
        assert_eq!(FileQuery::folders().page_size(0).page_size, 1);
    }
}
