use super::super::domain::{EmptyResultState, Notice, ResolvedClient};
use serde::Serialize;

/// One line of the client table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRowView {
    pub row: usize,
    pub name: String,
    pub address: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&ResolvedClient> for ClientRowView {
    fn from(client: &ResolvedClient) -> Self {
        Self {
            row: client.row,
            name: client.name.clone(),
            address: client.address.clone().unwrap_or_default(),
            region: client.region.clone().unwrap_or_default(),
            latitude: client.coordinate.latitude,
            longitude: client.coordinate.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    AwaitingSelection,
    Empty,
    Ready,
}

/// JSON-friendly summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ClientTableView {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyResultState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub selected_regions: Vec<String>,
    pub available_regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<Notice>,
    pub rows: Vec<ClientRowView>,
}
