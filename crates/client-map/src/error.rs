use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::client_map::{DataFetchError, EmptyResultState, AWAITING_SELECTION_MESSAGE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Why a request asked for a map that the current selection does not produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapUnavailable {
    AwaitingSelection,
    Empty(EmptyResultState),
}

impl MapUnavailable {
    pub fn message(&self) -> &'static str {
        match self {
            MapUnavailable::AwaitingSelection => AWAITING_SELECTION_MESSAGE,
            MapUnavailable::Empty(state) => state.message(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    DataFetch(DataFetchError),
    NoMap(MapUnavailable),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::DataFetch(err) => write!(f, "data fetch error: {}", err),
            AppError::NoMap(reason) => write!(f, "no map to export: {}", reason.message()),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::DataFetch(err) => Some(err),
            AppError::NoMap(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::DataFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::NoMap(_) => StatusCode::CONFLICT,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DataFetchError> for AppError {
    fn from(value: DataFetchError) -> Self {
        Self::DataFetch(value)
    }
}

impl From<MapUnavailable> for AppError {
    fn from(value: MapUnavailable) -> Self {
        Self::NoMap(value)
    }
}
