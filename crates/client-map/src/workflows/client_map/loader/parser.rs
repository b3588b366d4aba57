use super::super::domain::{ClientRecord, Coordinate};
use super::super::remote::DataFetchError;
use serde::{Deserialize, Deserializer};
use std::io::Read;

pub const NAME_COLUMN: &str = "Name";
pub const ADDRESS_COLUMN: &str = "Address";
pub const REGION_COLUMN: &str = "AdministrativeArea2";

const REQUIRED_COLUMNS: [&str; 3] = [NAME_COLUMN, ADDRESS_COLUMN, REGION_COLUMN];

pub(crate) fn parse_clients<R: Read>(reader: R) -> Result<Vec<ClientRecord>, DataFetchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header == column) {
            return Err(DataFetchError::MissingColumn(column));
        }
    }

    let mut records = Vec::new();
    for (row, result) in csv_reader.deserialize::<ClientRow>().enumerate() {
        let client = result?;
        let coordinate = match (client.lat, client.lng) {
            (Some(latitude), Some(longitude)) => Coordinate::new(latitude, longitude),
            _ => None,
        };

        records.push(ClientRecord {
            row,
            name: client.name,
            address: client.address,
            region: client.region,
            coordinate,
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct ClientRow {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Address", default, deserialize_with = "empty_string_as_none")]
    address: Option<String>,
    #[serde(
        rename = "AdministrativeArea2",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    region: Option<String>,
    #[serde(default, deserialize_with = "lenient_float")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_float")]
    lng: Option<f64>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

// Unparseable coordinates fall back to geocoding instead of failing the load.
fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = empty_string_as_none(deserializer)?;
    Ok(opt.and_then(|value| value.trim().parse::<f64>().ok()))
}
