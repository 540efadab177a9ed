//! Client-facing record types produced by the normalization pipeline.
//!
//! Scope: types only, no API client or pipeline code.
//!
//! Notes
//! - Upstream enforces no schema, so almost every field is optional; a serialized
//!   record keeps identity and status keys present (value or explicit null).
//! - The comprehensive-only sub-records are omitted from serialization entirely
//!   when the requested shape did not populate them.
//! - Capture timestamps use `chrono` (`DateTime<Utc>`, RFC 3339 on the wire).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Maps a present-but-null field to `Some(None)` so it survives a round trip;
/// a missing field stays `None` via `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Operating mode computed from running equipment and setpoints.
///
/// The upstream document never supplies an explicit mode, so this is always
/// inferred and never absent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredMode {
    Heat,
    Cool,
    Auto,
}

impl InferredMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InferredMode::Heat => "heat",
            InferredMode::Cool => "cool",
            InferredMode::Auto => "auto",
        }
    }
}

impl fmt::Display for InferredMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output shape selector. Shapes share one normalization pass; comprehensive
/// additionally populates the nested sub-records and derived metrics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verbosity {
    Minimal,
    Essential,
    Comprehensive,
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Minimal => "minimal",
            Verbosity::Essential => "essential",
            Verbosity::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Verbosity::Minimal),
            "essential" => Ok(Verbosity::Essential),
            "comprehensive" => Ok(Verbosity::Comprehensive),
            other => Err(format!(
                "unknown verbosity {:?}; expected minimal, essential or comprehensive",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationInfo {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PropertyInfo {
    pub age: Option<i64>,
    pub stories: Option<i64>,
    pub square_feet: Option<i64>,
    pub structure_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeatherInfo {
    pub condition: Option<String>,
    pub temperature: Option<f64>,
    pub temperature_low: Option<f64>,
    pub temperature_high: Option<f64>,
    pub dew_point: Option<f64>,
    pub humidity_relative: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_bearing: Option<f64>,
    pub barometric_pressure: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProgramInfo {
    pub current_climate_ref: Option<String>,
    pub climates: Vec<String>,
}

/// Subset of the climate entry matched by the program's active climate ref.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClimateDetails {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub r#type: Option<String>,
    pub heat_temp: Option<f64>,
    pub cool_temp: Option<f64>,
    pub is_occupied: Option<bool>,
    pub is_optimized: Option<bool>,
    pub sensors: Vec<Value>,
}

/// Human-readable per-side equipment description, e.g. `"2-stage heat_pump"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemSummary {
    pub cooling_system: String,
    pub heating_system: String,
    pub auxiliary_heat: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EfficiencyMetrics {
    pub total_cool_runtime_minutes: f64,
    pub total_heat_runtime_minutes: f64,
    pub total_aux_heat_runtime_minutes: f64,
    pub cool_degree_days: Option<f64>,
    pub heat_degree_days: Option<f64>,
    /// Undefined (null) unless the matching degree-day total is strictly positive.
    pub cool_runtime_per_degree_day: Option<f64>,
    pub heat_runtime_per_degree_day: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterInfo {
    pub last_changed: Option<String>,
    pub life: Option<f64>,
    pub life_units: Option<String>,
    pub runtime: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlertInfo {
    pub code: Option<Value>,
    pub text: Option<String>,
    pub severity: Option<String>,
    pub dismissed: Option<bool>,
}

/// Upstream sync bookkeeping carried through for the comprehensive shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SyncStatus {
    pub time_zone: Option<String>,
    pub first_connected: Option<String>,
    pub sync_begin: Option<String>,
    pub sync_end: Option<String>,
    pub data_begin: Option<String>,
    pub data_end: Option<String>,
}

/// One normalized thermostat record: a value produced once from one raw device
/// snapshot plus an injected capture time, immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    // identity
    pub id: String,
    pub thermostat_id: Option<i64>,
    pub ecobee_thermostat_id: Option<i64>,
    pub name: String,
    pub identifier: Option<String>,
    // current status
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub setpoint_heat: Option<f64>,
    pub setpoint_cool: Option<f64>,
    pub running_equipment: Vec<String>,
    pub equipment_state: String,
    pub inferred_mode: InferredMode,
    // comprehensive-only sub-records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<ProgramInfo>,
    // double Option: outer = shape requested it, inner = device has an active climate
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_climate: Option<Option<ClimateDetails>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_summary: Option<SystemSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<EfficiencyMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<BTreeMap<String, FilterInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<AlertInfo>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_alert_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncStatus>,
    // metadata
    pub captured_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inferred_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&InferredMode::Heat).unwrap(), "\"heat\"");
        assert_eq!(serde_json::to_string(&InferredMode::Cool).unwrap(), "\"cool\"");
        assert_eq!(serde_json::to_string(&InferredMode::Auto).unwrap(), "\"auto\"");
    }

    #[test]
    fn verbosity_parses_case_insensitively() {
        assert_eq!("minimal".parse::<Verbosity>().unwrap(), Verbosity::Minimal);
        assert_eq!("Essential".parse::<Verbosity>().unwrap(), Verbosity::Essential);
        assert_eq!(" COMPREHENSIVE ".parse::<Verbosity>().unwrap(), Verbosity::Comprehensive);
        assert!("full".parse::<Verbosity>().is_err());
    }

    #[test]
    fn climate_field_distinguishes_missing_from_null() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "double_option")]
            current_climate: Option<Option<ClimateDetails>>,
        }

        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.current_climate, None);

        let null: Probe = serde_json::from_str(r#"{"current_climate": null}"#).unwrap();
        assert_eq!(null.current_climate, Some(None));
    }
}
