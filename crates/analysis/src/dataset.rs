use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDateTime};
use normalizer::timefmt::{parse_duration, parse_timestamp};
use normalizer::IssueState;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::errors::{AnalysisError, Result};

/// A harvested support request plus the externally assigned region label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisRecord {
    pub state: IssueState,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub closed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration: Option<Duration>,
    /// Harvest-time day count. Never modified by the analysis.
    #[serde(default, alias = "duration_D", deserialize_with = "lenient_days")]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub pred: Option<String>,
    /// Waiting time as of the analysis date; see [`crate::wait`].
    #[serde(skip)]
    pub wait_days: Option<i64>,
}

const GROUP_COLUMNS: &[&str] = &[
    "pred",
    "state",
    "location",
    "user_id",
    "real_name",
    "first_name",
    "last_name",
];
const VALUE_COLUMNS: &[&str] = &["duration_days", "wait_days"];

impl AnalysisRecord {
    /// Categorical value of `column`; `None` for a null or blank cell.
    pub fn group_key(&self, column: &str) -> Result<Option<&str>> {
        let value = match column {
            "pred" => self.pred.as_deref(),
            "state" => Some(self.state.as_str()),
            "location" => self.location.as_deref(),
            "user_id" => self.user_id.as_deref(),
            "real_name" => self.real_name.as_deref(),
            "first_name" => self.first_name.as_deref(),
            "last_name" => self.last_name.as_deref(),
            other => return Err(AnalysisError::UnknownColumn(other.to_string())),
        };
        Ok(value.filter(|v| !v.trim().is_empty()))
    }

    pub fn numeric(&self, column: &str) -> Result<Option<f64>> {
        let value = match column {
            "duration_days" => self.duration_days,
            "wait_days" => self.wait_days,
            other => return Err(AnalysisError::UnknownColumn(other.to_string())),
        };
        Ok(value.map(|v| v as f64))
    }
}

pub fn load_records_from_path(
    path: impl AsRef<Path>,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<AnalysisRecord>> {
    let file = std::fs::File::open(path)?;
    load_records(file, group_column, value_column)
}

/// Reads analysis records from CSV. The columns the requested analysis needs
/// are checked against the header before any row is read.
pub fn load_records<R: Read>(
    reader: R,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<AnalysisRecord>> {
    if !GROUP_COLUMNS.contains(&group_column) {
        return Err(AnalysisError::UnknownColumn(group_column.to_string()));
    }
    if !VALUE_COLUMNS.contains(&value_column) {
        return Err(AnalysisError::UnknownColumn(value_column.to_string()));
    }

    let mut csv = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv.headers()?.clone();
    let has = |name: &str| headers.iter().any(|h| h.trim() == name);
    for required in ["state", "created_at", group_column] {
        if !has(required) {
            return Err(AnalysisError::MissingColumn(required.to_string()));
        }
    }
    if !has("duration_days") && !has("duration_D") {
        return Err(AnalysisError::MissingColumn("duration_days".to_string()));
    }

    let records = csv
        .deserialize::<AnalysisRecord>()
        .collect::<Result<Vec<_>, csv::Error>>()?;
    info!(rows = records.len(), "loaded analysis records");
    Ok(records)
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<NaiveDateTime>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn lenient_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Duration>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_duration))
}

/// Accepts integer and float renderings (`12`, `12.0`); empty or `NaN` is null.
fn lenient_days<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<i64>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(str::trim)
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|days| days.is_finite())
        .map(|days| days.floor() as i64))
}
