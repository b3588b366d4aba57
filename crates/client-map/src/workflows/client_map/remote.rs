use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Failure to obtain or decode one of the remote data sources. Fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum DataFetchError {
    #[error("could not reach {url}: {message}")]
    Unreachable { url: String, message: String },
    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid client CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("client CSV is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("invalid boundary GeoJSON: {0}")]
    GeoJson(String),
}

/// Gateway for fetching a remote document as text.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, DataFetchError>;
}

#[async_trait]
impl<T> RemoteSource for Arc<T>
where
    T: RemoteSource + ?Sized,
{
    async fn fetch_text(&self, url: &str) -> Result<String, DataFetchError> {
        (**self).fetch_text(url).await
    }
}

/// `RemoteSource` backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpRemoteSource {
    client: reqwest::Client,
}

impl HttpRemoteSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_text(&self, url: &str) -> Result<String, DataFetchError> {
        let unreachable = |err: reqwest::Error| DataFetchError::Unreachable {
            url: url.to_string(),
            message: err.to_string(),
        };

        debug!(%url, "fetching remote document");
        let response = self.client.get(url).send().await.map_err(unreachable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(unreachable)
    }
}
