use crate::workflows::client_map::{
    ApiKey, EmptySelectionPolicy, GeocodeFailurePolicy, MapSettings, PipelineSettings,
};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_BOUNDARIES_URL: &str =
    "https://france-geojson.gregoiredavid.fr/repo/departements.geojson";
pub const DEFAULT_OPENCAGE_ENDPOINT: &str = "https://api.opencagedata.com/geocode/v1/json";

const MAX_ZOOM: u8 = 19;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub sources: SourceConfig,
    pub geocoder: GeocoderConfig,
    pub display: DisplayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let clients_url = required("CLIENT_MAP_SOURCE_URL")?;
        let boundaries_url = env::var("CLIENT_MAP_BOUNDARIES_URL")
            .unwrap_or_else(|_| DEFAULT_BOUNDARIES_URL.to_string());

        let api_key = ApiKey::new(required("OPENCAGE_API_KEY")?);
        let endpoint = env::var("OPENCAGE_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_OPENCAGE_ENDPOINT.to_string());

        let empty_selection = match env::var("CLIENT_MAP_EMPTY_SELECTION") {
            Ok(raw) => EmptySelectionPolicy::parse(&raw).ok_or(ConfigError::InvalidSetting {
                name: "CLIENT_MAP_EMPTY_SELECTION",
                value: raw,
            })?,
            Err(_) => EmptySelectionPolicy::default(),
        };
        let geocode_failures = match env::var("CLIENT_MAP_GEOCODE_FAILURES") {
            Ok(raw) => GeocodeFailurePolicy::parse(&raw).ok_or(ConfigError::InvalidSetting {
                name: "CLIENT_MAP_GEOCODE_FAILURES",
                value: raw,
            })?,
            Err(_) => GeocodeFailurePolicy::default(),
        };

        let zoom = match env::var("CLIENT_MAP_ZOOM") {
            Ok(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|zoom| *zoom <= MAX_ZOOM)
                .ok_or(ConfigError::InvalidZoom)?,
            Err(_) => MapSettings::default().zoom,
        };
        let title = env::var("CLIENT_MAP_TITLE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| MapSettings::default().title);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            sources: SourceConfig {
                clients_url,
                boundaries_url,
            },
            geocoder: GeocoderConfig { endpoint, api_key },
            display: DisplayConfig {
                empty_selection,
                geocode_failures,
                zoom,
                title,
            },
        })
    }

    /// Settings handed to the map pipeline for every run.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            clients_url: self.sources.clients_url.clone(),
            boundaries_url: self.sources.boundaries_url.clone(),
            empty_selection: self.display.empty_selection,
            geocode_failures: self.display.geocode_failures,
            map: MapSettings {
                zoom: self.display.zoom,
                title: self.display.title.clone(),
                ..MapSettings::default()
            },
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Remote locations of the client list and the region boundaries.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub clients_url: String,
    pub boundaries_url: String,
}

/// Geocoding provider endpoint and credentials.
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub api_key: ApiKey,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub empty_selection: EmptySelectionPolicy,
    pub geocode_failures: GeocodeFailurePolicy,
    pub zoom: u8,
    pub title: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingVar(&'static str),
    InvalidSetting { name: &'static str, value: String },
    InvalidZoom,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingVar(name) => write!(f, "{name} must be set"),
            ConfigError::InvalidSetting { name, value } => {
                write!(f, "{name} has unsupported value '{value}'")
            }
            ConfigError::InvalidZoom => {
                write!(f, "CLIENT_MAP_ZOOM must be an integer between 0 and {MAX_ZOOM}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingVar(_)
            | ConfigError::InvalidSetting { .. }
            | ConfigError::InvalidZoom => None,
        }
    }
}
