// Brief generation: copy a template doc, rename it, fill in the placeholders.
//
// There is no rollback. If the copy succeeds but the substitutions fail, the
// copy is left in Drive and its id is carried in `BriefError::Substitution`
// so whoever called us can point a human at it.

use std::sync::Arc;

use thiserror::Error;

use crate::core::workspace::{TextReplacement, WorkspaceClient, WorkspaceError};

pub const CLIENT_NAME_PLACEHOLDER: &str = "<<Client Name>>";
pub const REF_NO_PLACEHOLDER: &str = "<<Ref No>>";
pub const ISSUE_CATEGORY_PLACEHOLDER: &str = "<<Issue Category>>";
pub const ISSUE_NAME_PLACEHOLDER: &str = "<<Issue Name>>";
pub const PRIORITY_PLACEHOLDER: &str = "<<Priority>>";

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("Missing {0}")]
    MissingField(&'static str),
    #[error("Could not copy the template: {0}")]
    Copy(#[source] WorkspaceError),
    #[error("Created {document_id} but filling in the placeholders failed: {source}")]
    Substitution {
        document_id: String,
        #[source]
        source: WorkspaceError,
    },
}

impl BriefError {
    /// The id of a copy left behind by a failed substitution, if any.
    pub fn orphaned_document(&self) -> Option<&str> {
        match self {
            BriefError::Substitution { document_id, .. } => Some(document_id),
            _ => None,
        }
    }
}

/// Everything needed to create one brief.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BriefRequest {
    pub template_id: String,
    pub target_folder_id: String,
    pub client_name: String,
    pub ref_no: String,
    pub issue_category: String,
    pub issue_name: String,
    pub priority: String,
}

impl BriefRequest {
    /// `"<ref no> // <issue name>"`.
    pub fn title(&self) -> String {
        format!("{} // {}", self.ref_no, self.issue_name)
    }

    /// The placeholder substitutions, in the order they're applied.
    pub fn replacements(&self) -> Vec<TextReplacement> {
        vec![
            TextReplacement::new(CLIENT_NAME_PLACEHOLDER, &self.client_name),
            TextReplacement::new(REF_NO_PLACEHOLDER, &self.ref_no),
            TextReplacement::new(ISSUE_CATEGORY_PLACEHOLDER, &self.issue_category),
            TextReplacement::new(ISSUE_NAME_PLACEHOLDER, &self.issue_name),
            TextReplacement::new(PRIORITY_PLACEHOLDER, &self.priority),
        ]
    }

    fn validate(&self) -> Result<(), BriefError> {
        if self.template_id.trim().is_empty() {
            return Err(BriefError::MissingField("template document"));
        }
        if self.target_folder_id.trim().is_empty() {
            return Err(BriefError::MissingField("target folder"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BriefOutcome {
    pub document_id: String,
    pub title: String,
    pub link: String,
    /// (placeholder, occurrences replaced), in application order.
    pub occurrences: Vec<(String, u32)>,
}

impl BriefOutcome {
    /// Placeholders that were not found anywhere in the template.
    pub fn unused_placeholders(&self) -> Vec<&str> {
        self.occurrences
            .iter()
            .filter(|(_, count)| *count == 0)
            .map(|(placeholder, _)| placeholder.as_str())
            .collect()
    }
}

/// The edit link for a Google Doc.
pub fn document_link(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

/// Accepts either a bare document id or a Google Docs URL.
pub fn extract_document_id(url_or_id: &str) -> Option<String> {
    let url_or_id = url_or_id.trim();
    if url_or_id.contains("docs.google.com") {
        let start = url_or_id.find("/document/d/")?;
        let after_d = &url_or_id[start + "/document/d/".len()..];
        let end = after_d.find(['/', '?', '#']).unwrap_or(after_d.len());
        let id = &after_d[..end];
        (!id.is_empty()).then(|| id.to_string())
    } else if !url_or_id.is_empty() && !url_or_id.contains('/') && !url_or_id.contains(' ') {
        Some(url_or_id.to_string())
    } else {
        None
    }
}

pub struct BriefService<C: WorkspaceClient> {
    client: Arc<C>,
}

impl<C: WorkspaceClient> BriefService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Copies the template into the target folder and fills in the placeholders.
    pub async fn create_brief(&self, request: &BriefRequest) -> Result<BriefOutcome, BriefError> {
        request.validate()?;
        let title = request.title();

        let copy = self
            .client
            .copy_file(
                request.template_id.trim(),
                &title,
                request.target_folder_id.trim(),
            )
            .await
            .map_err(BriefError::Copy)?;

        tracing::info!(
            document_id = %copy.id,
            template_id = %request.template_id,
            folder_id = %request.target_folder_id,
            title = %title,
            "Copied brief template"
        );

        let replacements = request.replacements();
        let counts = match self
            .client
            .replace_all_text(&copy.id, &replacements)
            .await
        {
            Ok(counts) => counts,
            Err(source) => {
                tracing::error!(
                    document_id = %copy.id,
                    error = %source,
                    "Placeholder substitution failed; the copy was left in place"
                );
                return Err(BriefError::Substitution {
                    document_id: copy.id,
                    source,
                });
            }
        };

        let occurrences: Vec<(String, u32)> = replacements
            .into_iter()
            .zip(counts.into_iter().chain(std::iter::repeat(0)))
            .map(|(replacement, count)| (replacement.placeholder, count))
            .collect();

        Ok(BriefOutcome {
            link: document_link(&copy.id),
            document_id: copy.id,
            title,
            occurrences,
        })
    }
}
