use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::service_account::ServiceAccountAuth;
use crate::core::workspace::{DriveFile, FileQuery, TextReplacement, WorkspaceClient, WorkspaceError};

const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const DOCS_DOCUMENTS_URL: &str = "https://docs.googleapis.com/v1/documents";
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, parents, modifiedTime, webViewLink)";
const FILE_FIELDS: &str = "id, name, parents";

/// Talks to Drive v3, Docs v1 and Sheets v4 with a service account token.
pub struct GoogleWorkspaceClient {
    client: Client,
    auth: Arc<ServiceAccountAuth>,
}

impl GoogleWorkspaceClient {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    pub async fn from_env() -> Result<Self, WorkspaceError> {
        let auth = ServiceAccountAuth::from_env().await?;
        Ok(Self::new(Arc::new(auth)))
    }

    /// The service account every request is made as.
    pub fn service_account(&self) -> &str {
        self.auth.client_email()
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<Response, WorkspaceError> {
        let token = self.auth.get_access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| WorkspaceError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, WorkspaceError> {
        response
            .json()
            .await
            .map_err(|e| WorkspaceError::Decode(e.to_string()))
    }

    fn parse_datetime(value: Option<String>) -> Option<DateTime<Utc>> {
        value
            .as_deref()
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn map_file(api: ApiFile) -> DriveFile {
        DriveFile {
            id: api.id,
            name: api.name.unwrap_or_default(),
            parents: api.parents.unwrap_or_default(),
            modified_time: Self::parse_datetime(api.modified_time),
            web_view_link: api.web_view_link,
        }
    }
}

#[async_trait]
impl WorkspaceClient for GoogleWorkspaceClient {
    async fn list_files(&self, query: &FileQuery) -> Result<Vec<DriveFile>, WorkspaceError> {
        let q = query.to_drive_q();
        let page_size = query.page_size.to_string();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params: Vec<(&str, &str)> = vec![
                ("q", q.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", page_size.as_str()),
            ];
            if let Some(order_by) = query.order_by {
                params.push(("orderBy", order_by));
            }
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let response = self
                .authorized(self.client.get(DRIVE_FILES_URL).query(&params))
                .await?;
            let page: ApiFileList = Self::decode(response).await?;
            pages += 1;

            page_token = absorb_page(&mut files, page, query.limit);
            if page_token.is_none() {
                break;
            }
        }

        tracing::debug!(
            kind = ?query.kind,
            parents = query.parents.len(),
            pages,
            files = files.len(),
            "Listed Drive files"
        );
        Ok(files)
    }

    async fn get_file(&self, file_id: &str) -> Result<DriveFile, WorkspaceError> {
        let url = format!("{}/{}", DRIVE_FILES_URL, file_id);
        let response = self
            .authorized(self.client.get(&url).query(&[("fields", FILE_FIELDS)]))
            .await?;
        let file: ApiFile = Self::decode(response).await?;
        Ok(Self::map_file(file))
    }

    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<DriveFile, WorkspaceError> {
        let url = format!("{}/{}/copy", DRIVE_FILES_URL, file_id);
        let body = CopyRequest {
            name,
            parents: vec![parent_id],
        };
        let response = self
            .authorized(
                self.client
                    .post(&url)
                    .query(&[("fields", FILE_FIELDS)])
                    .json(&body),
            )
            .await?;
        let file: ApiFile = Self::decode(response).await?;
        Ok(Self::map_file(file))
    }

    async fn replace_all_text(
        &self,
        document_id: &str,
        replacements: &[TextReplacement],
    ) -> Result<Vec<u32>, WorkspaceError> {
        if replacements.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/{}:batchUpdate", DOCS_DOCUMENTS_URL, document_id);
        let body = batch_update_body(replacements);
        let response = self
            .authorized(self.client.post(&url).json(&body))
            .await?;
        let update: BatchUpdateResponse = Self::decode(response).await?;
        Ok(occurrence_counts(update, replacements.len()))
    }

    async fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<String>>, WorkspaceError> {
        let url = values_url(spreadsheet_id, range)?;
        let response = self.authorized(self.client.get(url)).await?;
        let values: ValueRange = Self::decode(response).await?;
        Ok(values
            .values
            .into_iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }
}

/// Adds one listing page to `files` and returns the token for the next page.
/// `None` means stop: the last page was reached or `limit` files are in hand.
fn absorb_page(files: &mut Vec<DriveFile>, page: ApiFileList, limit: Option<usize>) -> Option<String> {
    files.extend(page.files.into_iter().map(GoogleWorkspaceClient::map_file));

    if let Some(limit) = limit {
        if files.len() >= limit {
            files.truncate(limit);
            return None;
        }
    }

    page.next_page_token.filter(|token| !token.is_empty())
}

/// Builds `/spreadsheets/{id}/values/{range}` with the range percent-encoded.
fn values_url(spreadsheet_id: &str, range: &str) -> Result<Url, WorkspaceError> {
    let mut url = Url::parse(SHEETS_BASE_URL).map_err(|e| WorkspaceError::Transport(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| WorkspaceError::Transport("Sheets base URL cannot take a path".to_string()))?
        .pop_if_empty()
        .extend(["spreadsheets", spreadsheet_id, "values", range]);
    Ok(url)
}

fn batch_update_body(replacements: &[TextReplacement]) -> Value {
    let requests: Vec<Value> = replacements
        .iter()
        .map(|r| {
            serde_json::json!({
                "replaceAllText": {
                    "containsText": { "text": r.placeholder, "matchCase": true },
                    "replaceText": r.value,
                }
            })
        })
        .collect();
    serde_json::json!({ "requests": requests })
}

/// One count per request. Docs omits `occurrencesChanged` when nothing matched.
fn occurrence_counts(update: BatchUpdateResponse, expected: usize) -> Vec<u32> {
    let mut counts: Vec<u32> = update
        .replies
        .into_iter()
        .map(|reply| {
            reply
                .replace_all_text
                .and_then(|r| r.occurrences_changed)
                .unwrap_or(0)
        })
        .collect();
    counts.resize(expected, 0);
    counts
}

fn cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pulls the message out of Google's `{"error": {"code", "message"}}` envelope,
/// falling back to the raw body.
fn api_error(status: u16, body: &str) -> WorkspaceError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        });
    WorkspaceError::Api { status, message }
}

#[derive(Debug, Serialize)]
struct CopyRequest<'a> {
    name: &'a str,
    parents: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    id: String,
    name: Option<String>,
    parents: Option<Vec<String>>,
    modified_time: Option<String>,
    web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchUpdateReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateReply {
    replace_all_text: Option<ReplaceAllTextReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAllTextReply {
    occurrences_changed: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}
