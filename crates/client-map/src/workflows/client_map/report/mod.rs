mod document;
mod page;
pub mod views;

use super::domain::ResolvedClient;

pub use document::{embedded_markers, render_map_document, MapDocument};
pub use page::{render_page, PageState};
pub use views::{ClientRowView, ClientTableView, RunStatus};

pub const EXPORT_FILE_NAME: &str = "client_map.html";

/// Downloadable copy of the rendered map.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: &'static str,
    pub mime: mime::Mime,
    pub body: String,
}

impl ExportArtifact {
    pub fn from_document(document: &MapDocument) -> Self {
        Self {
            file_name: EXPORT_FILE_NAME,
            mime: mime::TEXT_HTML_UTF_8,
            body: document.as_str().to_string(),
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name)
    }
}

pub fn table_rows(clients: &[ResolvedClient]) -> Vec<ClientRowView> {
    clients.iter().map(ClientRowView::from).collect()
}
