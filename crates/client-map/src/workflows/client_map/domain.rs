use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }
}

/// One row of the client list. `row` is the zero-based position in the source data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRecord {
    pub row: usize,
    pub name: String,
    pub address: Option<String>,
    pub region: Option<String>,
    pub coordinate: Option<Coordinate>,
}

impl ClientRecord {
    pub fn has_address(&self) -> bool {
        self.address
            .as_deref()
            .is_some_and(|address| !address.trim().is_empty())
    }
}

/// A client whose coordinate is known, ready to be placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedClient {
    pub row: usize,
    pub name: String,
    /// Absent when the source row carried coordinates but no address.
    pub address: Option<String>,
    pub region: Option<String>,
    pub coordinate: Coordinate,
}

/// Region labels chosen by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSelection {
    regions: BTreeSet<String>,
}

impl RegionSelection {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let regions = labels
            .into_iter()
            .map(|label| label.as_ref().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();
        Self { regions }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn contains(&self, region: &str) -> bool {
        self.regions.contains(region)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }
}

/// What an empty region selection means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySelectionPolicy {
    /// Show nothing until at least one region is chosen.
    #[default]
    RequireSelection,
    /// Show every record when no region is chosen.
    ShowAll,
}

impl EmptySelectionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "require" | "require_selection" => Some(Self::RequireSelection),
            "all" | "show_all" => Some(Self::ShowAll),
            _ => None,
        }
    }
}

/// Whether per-address geocoding failures are reported to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeFailurePolicy {
    #[default]
    Silent,
    Notify,
}

impl GeocodeFailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "silent" => Some(Self::Silent),
            "notify" => Some(Self::Notify),
            _ => None,
        }
    }
}

/// Terminal "nothing to show" states of a run. These are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultState {
    NoMatchingRecords,
    NoGeocodedRecords,
}

impl EmptyResultState {
    pub const fn message(self) -> &'static str {
        match self {
            Self::NoMatchingRecords => "No clients match the selected regions.",
            Self::NoGeocodedRecords => "No client address could be located on the map.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Non-fatal message shown next to the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }
}

/// Geocoding provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
