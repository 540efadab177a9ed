//! Record assembly: one pass over the raw document's device mapping.
//!
//! The pipeline is a pure, single-pass transform with no retry or
//! partial-completion state; the capture timestamp is injected by the caller.

use crate::models::beestat::{
    AlertInfo, FilterInfo, LocationInfo, NormalizedRecord, ProgramInfo, PropertyInfo, SyncStatus, Verbosity,
    WeatherInfo,
};
use crate::normalize::{fields, metrics, mode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

/// Fallback display name when a device carries neither `name` nor `identifier`.
const UNKNOWN_NAME: &str = "Unknown";

/// Case-insensitive substring filter over device display names.
///
/// An empty filter matches every device.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    terms: Vec<String>,
}

impl NameFilter {
    pub fn new<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        NameFilter { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let name = name.to_lowercase();
        self.terms.iter().any(|term| name.contains(term))
    }
}

/// Malformed top-level document; missing or null optional device fields are
/// never an error and resolve to absent instead.
#[derive(Debug, PartialEq, Eq)]
pub enum NormalizeError {
    /// The document has no top-level `data` key.
    MissingData,
    /// `data` is present but not an object mapping.
    DataNotObject,
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MissingData => write!(f, "invalid input: document has no `data` mapping"),
            NormalizeError::DataNotObject => write!(f, "invalid input: `data` is not an object"),
        }
    }
}

impl Error for NormalizeError {}

/// Normalizes one raw document into client-facing records.
///
/// Devices are visited in the mapping's iteration order; a record is produced
/// for each device whose resolved display name matches the filter. An empty
/// result is not an error; the caller decides whether that is terminal.
pub fn normalize_document(
    document: &Value,
    filter: &NameFilter,
    verbosity: Verbosity,
    captured_at: DateTime<Utc>,
) -> Result<Vec<NormalizedRecord>, NormalizeError> {
    let data = document.get("data").ok_or(NormalizeError::MissingData)?;
    let devices = data.as_object().ok_or(NormalizeError::DataNotObject)?;

    let mut records = Vec::new();
    for (id, device) in devices {
        let name =
            fields::resolve_string(device, &["name", "identifier"]).unwrap_or_else(|| UNKNOWN_NAME.to_string());
        if !filter.matches(&name) {
            continue;
        }
        records.push(assemble_record(id, device, name, verbosity, captured_at));
    }
    Ok(records)
}

fn assemble_record(
    id: &str,
    device: &Value,
    name: String,
    verbosity: Verbosity,
    captured_at: DateTime<Utc>,
) -> NormalizedRecord {
    let running_equipment = fields::resolve_string_array(device, &["running_equipment"]).unwrap_or_default();
    let setpoint_heat = fields::resolve_f64(device, &["setpoint_heat"]);
    let setpoint_cool = fields::resolve_f64(device, &["setpoint_cool"]);

    let mut record = NormalizedRecord {
        id: id.to_string(),
        thermostat_id: fields::resolve_i64(device, &["thermostat_id"]),
        ecobee_thermostat_id: fields::resolve_i64(device, &["ecobee_thermostat_id"]),
        name,
        identifier: fields::resolve_string(device, &["identifier"]),
        temperature: fields::resolve_f64(device, &["actual_temperature", "indoor_temperature", "temperature"]),
        humidity: fields::resolve_f64(device, &["humidity"]),
        setpoint_heat,
        setpoint_cool,
        equipment_state: metrics::equipment_state(&running_equipment),
        inferred_mode: mode::infer_mode(&running_equipment, setpoint_heat, setpoint_cool),
        running_equipment,
        location: None,
        property: None,
        weather: None,
        program: None,
        current_climate: None,
        system_summary: None,
        efficiency: None,
        filters: None,
        alerts: None,
        active_alert_count: None,
        sync: None,
        captured_at,
    };

    if verbosity == Verbosity::Comprehensive {
        record.location = Some(LocationInfo {
            latitude: fields::resolve_f64(device, &["profile.address.latitude"]),
            longitude: fields::resolve_f64(device, &["profile.address.longitude"]),
        });
        record.property = Some(PropertyInfo {
            age: fields::resolve_i64(device, &["property.age"]),
            stories: fields::resolve_i64(device, &["property.stories"]),
            square_feet: fields::resolve_i64(device, &["property.square_feet"]),
            structure_type: fields::resolve_string(device, &["property.structure_type"]),
        });
        record.weather = Some(WeatherInfo {
            condition: fields::resolve_string(device, &["weather.condition"]),
            temperature: fields::resolve_f64(device, &["weather.temperature"]),
            temperature_low: fields::resolve_f64(device, &["weather.temperature_low"]),
            temperature_high: fields::resolve_f64(device, &["weather.temperature_high"]),
            dew_point: fields::resolve_f64(device, &["weather.dew_point"]),
            humidity_relative: fields::resolve_f64(device, &["weather.humidity_relative"]),
            wind_speed: fields::resolve_f64(device, &["weather.wind_speed"]),
            wind_bearing: fields::resolve_f64(device, &["weather.wind_bearing"]),
            barometric_pressure: fields::resolve_f64(device, &["weather.barometric_pressure"]),
        });
        record.program = Some(ProgramInfo {
            current_climate_ref: fields::resolve_string(device, &["program.currentClimateRef"]),
            climates: climate_names(device),
        });
        record.current_climate = Some(metrics::current_climate_details(device));
        record.system_summary = Some(metrics::system_summary(device));
        record.efficiency = Some(metrics::efficiency_metrics(device));
        record.filters = Some(collect_filters(device));
        record.alerts = Some(collect_alerts(device));
        record.active_alert_count = Some(metrics::active_alert_count(device));
        record.sync = Some(SyncStatus {
            time_zone: fields::resolve_string(device, &["time_zone"]),
            first_connected: fields::resolve_string(device, &["first_connected"]),
            sync_begin: fields::resolve_string(device, &["sync_begin"]),
            sync_end: fields::resolve_string(device, &["sync_end"]),
            data_begin: fields::resolve_string(device, &["data_begin"]),
            data_end: fields::resolve_string(device, &["data_end"]),
        });
    }

    record
}

fn climate_names(device: &Value) -> Vec<String> {
    fields::lookup(device, "program.climates")
        .and_then(Value::as_array)
        .map(|climates| {
            climates
                .iter()
                .filter_map(|c| c.get("name").and_then(Value::as_str).map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn collect_filters(device: &Value) -> BTreeMap<String, FilterInfo> {
    let Some(filters) = fields::lookup(device, "filters").and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    filters
        .iter()
        .map(|(filter_type, info)| {
            (
                filter_type.clone(),
                FilterInfo {
                    last_changed: fields::resolve_string(info, &["last_changed"]),
                    life: fields::resolve_f64(info, &["life"]),
                    life_units: fields::resolve_string(info, &["life_units"]),
                    runtime: fields::resolve_f64(info, &["runtime"]),
                },
            )
        })
        .collect()
}

fn collect_alerts(device: &Value) -> Vec<AlertInfo> {
    let Some(alerts) = fields::lookup(device, "alerts").and_then(Value::as_array) else {
        return Vec::new();
    };
    alerts
        .iter()
        .map(|alert| AlertInfo {
            code: alert.get("code").filter(|v| !v.is_null()).cloned(),
            text: fields::resolve_string(alert, &["text"]),
            severity: fields::resolve_string(alert, &["severity"]),
            dismissed: fields::resolve_bool(alert, &["dismissed"]),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::beestat::InferredMode;
    use chrono::TimeZone;

    fn load_fixture() -> Value {
        let json = std::fs::read_to_string("tests/data/thermostats.json").expect("fixture present");
        serde_json::from_str(&json).expect("parse thermostat document")
    }

    fn capture_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 15, 30, 0).unwrap()
    }

    #[test]
    fn empty_filter_matches_every_device() {
        let doc = load_fixture();
        let records =
            normalize_document(&doc, &NameFilter::default(), Verbosity::Essential, capture_time()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn filter_matches_case_insensitive_substrings() {
        let doc = load_fixture();
        let filter = NameFilter::new(vec!["downstairs".to_string()]);
        let records = normalize_document(&doc, &filter, Verbosity::Essential, capture_time()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Downstairs Hallway");
    }

    #[test]
    fn unmatched_devices_are_excluded_not_errors() {
        let doc = load_fixture();
        let filter = NameFilter::new(vec!["Downstairs".to_string(), "Attic".to_string()]);
        let records = normalize_document(&doc, &filter, Verbosity::Essential, capture_time()).unwrap();
        assert!(records.iter().all(|r| r.name != "Garage"));

        let nothing = NameFilter::new(vec!["Basement".to_string()]);
        let records = normalize_document(&doc, &nothing, Verbosity::Essential, capture_time()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn blank_filter_terms_are_ignored() {
        let filter = NameFilter::new(vec!["  ".to_string(), String::new()]);
        assert!(filter.is_empty());
        assert!(filter.matches("Garage"));
    }

    #[test]
    fn missing_data_key_is_invalid_input() {
        let doc = serde_json::json!({ "success": true });
        let err = normalize_document(&doc, &NameFilter::default(), Verbosity::Minimal, capture_time())
            .unwrap_err();
        assert_eq!(err, NormalizeError::MissingData);
    }

    #[test]
    fn non_object_data_is_invalid_input() {
        let doc = serde_json::json!({ "data": [1, 2, 3] });
        let err = normalize_document(&doc, &NameFilter::default(), Verbosity::Minimal, capture_time())
            .unwrap_err();
        assert_eq!(err, NormalizeError::DataNotObject);
    }

    #[test]
    fn core_fields_come_from_fallback_chains() {
        let doc = load_fixture();
        let filter = NameFilter::new(vec!["Garage".to_string()]);
        let records = normalize_document(&doc, &filter, Verbosity::Essential, capture_time()).unwrap();
        let garage = &records[0];

        // `temperature` is null upstream; the chain resolves actual_temperature
        assert_eq!(garage.temperature, Some(77.2));
        assert_eq!(garage.setpoint_heat, Some(55.0));
        assert_eq!(garage.setpoint_cool, None);
        assert_eq!(garage.inferred_mode, InferredMode::Heat);
        assert_eq!(garage.equipment_state, "idle");
        assert!(garage.running_equipment.is_empty());
        assert_eq!(garage.captured_at, capture_time());
    }

    #[test]
    fn essential_shape_omits_comprehensive_sections() {
        let doc = load_fixture();
        let filter = NameFilter::new(vec!["Downstairs".to_string()]);
        let records = normalize_document(&doc, &filter, Verbosity::Essential, capture_time()).unwrap();
        let record = &records[0];

        assert!(record.location.is_none());
        assert!(record.efficiency.is_none());
        assert!(record.active_alert_count.is_none());

        let json = serde_json::to_value(record).unwrap();
        assert!(json.get("location").is_none());
        assert!(json.get("efficiency").is_none());
        // status keys stay present even when null
        assert!(json.get("humidity").is_some());
    }

    #[test]
    fn comprehensive_shape_populates_all_sections() {
        let doc = load_fixture();
        let filter = NameFilter::new(vec!["Downstairs".to_string()]);
        let records = normalize_document(&doc, &filter, Verbosity::Comprehensive, capture_time()).unwrap();
        let record = &records[0];

        let location = record.location.as_ref().expect("location populated");
        assert_eq!(location.latitude, Some(35.28));

        let climate = record
            .current_climate
            .as_ref()
            .expect("section populated")
            .as_ref()
            .expect("active climate matched");
        assert_eq!(climate.name.as_deref(), Some("Comfort"));

        let summary = record.system_summary.as_ref().expect("summary populated");
        assert_eq!(summary.cooling_system, "2-stage heat_pump");

        let efficiency = record.efficiency.as_ref().expect("efficiency populated");
        assert_eq!(efficiency.total_cool_runtime_minutes, 1500.0);

        assert_eq!(record.active_alert_count, Some(1));
        let filters = record.filters.as_ref().expect("filters populated");
        assert!(filters.contains_key("furnace"));
        assert_eq!(
            record.sync.as_ref().and_then(|s| s.sync_end.as_deref()),
            Some("2026-08-06 14:58:01")
        );
    }

    #[test]
    fn device_without_active_climate_yields_explicit_none() {
        let doc = load_fixture();
        let filter = NameFilter::new(vec!["Garage".to_string()]);
        let records = normalize_document(&doc, &filter, Verbosity::Comprehensive, capture_time()).unwrap();
        let record = &records[0];

        assert_eq!(record.current_climate, Some(None));
        let json = serde_json::to_value(record).unwrap();
        assert!(json.get("current_climate").expect("key present").is_null());
    }

    #[test]
    fn records_round_trip_through_json() {
        let doc = load_fixture();
        for verbosity in [Verbosity::Minimal, Verbosity::Essential, Verbosity::Comprehensive] {
            let records =
                normalize_document(&doc, &NameFilter::default(), verbosity, capture_time()).unwrap();
            let json = serde_json::to_string(&records).unwrap();
            let back: Vec<NormalizedRecord> = serde_json::from_str(&json).unwrap();
            assert_eq!(back, records);
        }
    }

    #[test]
    fn name_falls_back_to_identifier_then_unknown() {
        let doc = serde_json::json!({
            "data": {
                "1": { "identifier": "411900000000" },
                "2": { "temperature": 70.0 }
            }
        });
        let records =
            normalize_document(&doc, &NameFilter::default(), Verbosity::Minimal, capture_time()).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"411900000000"));
        assert!(names.contains(&UNKNOWN_NAME));
    }
}
