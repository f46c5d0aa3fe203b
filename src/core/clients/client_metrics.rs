use std::collections::BTreeMap;
use std::sync::Arc;

use crate::core::workspace::{ClientMetrics, WorkspaceClient, WorkspaceError};

// Column positions in the accounts sheet (A = 0).
const NAME_COLUMN: usize = 0;
const LEAD_COLUMN: usize = 1;
const TICKETS_COLUMN: usize = 15;
const COMPLETED_COLUMN: usize = 16;
const PERCENT_COLUMN: usize = 17;

/// Turns raw sheet rows into client name -> metrics.
///
/// Rows whose first cell is blank are dropped, and so are rows with fewer
/// than two cells (section labels). Names are trimmed; when a name appears
/// twice the later row wins. Missing metric cells yield empty strings.
pub fn parse_client_rows(rows: &[Vec<String>]) -> BTreeMap<String, ClientMetrics> {
    let mut clients = BTreeMap::new();
    for row in rows {
        if row.len() < 2 {
            continue;
        }
        let name = row
            .get(NAME_COLUMN)
            .map(|n| n.trim())
            .unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        clients.insert(
            name.to_string(),
            ClientMetrics {
                lead: cell(row, LEAD_COLUMN),
                tickets: cell(row, TICKETS_COLUMN),
                completed: cell(row, COMPLETED_COLUMN),
                percent: cell(row, PERCENT_COLUMN),
            },
        );
    }
    clients
}

fn cell(row: &[String], index: usize) -> String {
    row.get(index).cloned().unwrap_or_default()
}

/// Reads client metrics from the accounts spreadsheet.
pub struct ClientMetricsService<C: WorkspaceClient> {
    client: Arc<C>,
    spreadsheet_id: String,
    range: String,
}

impl<C: WorkspaceClient> ClientMetricsService<C> {
    pub fn new(client: Arc<C>, spreadsheet_id: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
        }
    }

    /// All clients, keyed (and therefore sorted) by name.
    pub async fn read_client_metrics(
        &self,
    ) -> Result<BTreeMap<String, ClientMetrics>, WorkspaceError> {
        let rows = self
            .client
            .read_range(&self.spreadsheet_id, &self.range)
            .await?;
        let clients = parse_client_rows(&rows);
        tracing::debug!(rows = rows.len(), clients = clients.len(), "Read client metrics");
        Ok(clients)
    }

    /// Looks up one client. An exact name wins; otherwise names are compared
    /// case-insensitively.
    pub async fn client(
        &self,
        name: &str,
    ) -> Result<Option<(String, ClientMetrics)>, WorkspaceError> {
        let name = name.trim();
        let mut clients = self.read_client_metrics().await?;

        if let Some(metrics) = clients.remove(name) {
            return Ok(Some((name.to_string(), metrics)));
        }
        Ok(clients
            .into_iter()
            .find(|(candidate, _)| candidate.to_lowercase() == name.to_lowercase()))
    }
}
