//! Derived metrics computed from nested sub-objects of a raw device.
//!
//! Each sub-object (program, system_type, profile, alerts) is independently
//! optional; every derivation substitutes a defined default instead of failing.

use crate::models::beestat::{ClimateDetails, EfficiencyMetrics, SystemSummary};
use crate::normalize::fields;
use serde_json::Value;

/// Sentinel used when no equipment is running.
pub const IDLE_STATE: &str = "idle";

/// Joins running equipment names with `", "`, or `"idle"` for an empty list.
pub fn equipment_state(running_equipment: &[String]) -> String {
    if running_equipment.is_empty() {
        IDLE_STATE.to_string()
    } else {
        running_equipment.join(", ")
    }
}

/// Counts alert entries whose `dismissed` flag is false or absent.
pub fn active_alert_count(device: &Value) -> usize {
    fields::lookup(device, "alerts")
        .and_then(Value::as_array)
        .map(|alerts| {
            alerts
                .iter()
                .filter(|alert| !alert.get("dismissed").and_then(Value::as_bool).unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}

/// Looks up the program's active climate reference in the climate list.
///
/// Returns `None` when no reference is set or no climate matches; absence is
/// expected for devices without an active program and is not an error.
pub fn current_climate_details(device: &Value) -> Option<ClimateDetails> {
    let current_ref = fields::resolve_str(device, &["program.currentClimateRef"])?;
    let climates = fields::lookup(device, "program.climates")?.as_array()?;
    let climate = climates
        .iter()
        .find(|c| c.get("climateRef").and_then(Value::as_str) == Some(current_ref))?;

    Some(ClimateDetails {
        name: fields::resolve_string(climate, &["name"]),
        r#type: fields::resolve_string(climate, &["type"]),
        heat_temp: fields::resolve_f64(climate, &["heatTemp"]),
        cool_temp: fields::resolve_f64(climate, &["coolTemp"]),
        is_occupied: fields::resolve_bool(climate, &["isOccupied"]),
        is_optimized: fields::resolve_bool(climate, &["isOptimized"]),
        sensors: fields::lookup(climate, "sensors")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

/// Builds the per-side equipment description from the detected system type.
pub fn system_summary(device: &Value) -> SystemSummary {
    SystemSummary {
        cooling_system: side_summary(device, "cool"),
        heating_system: side_summary(device, "heat"),
        auxiliary_heat: fields::resolve_string(device, &["system_type.detected.auxiliary_heat.equipment"])
            .unwrap_or_else(|| "none".to_string()),
    }
}

fn side_summary(device: &Value, side: &str) -> String {
    let stages = fields::lookup(device, &format!("system_type.detected.{}.stages", side))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let equipment = fields::lookup(device, &format!("system_type.detected.{}.equipment", side))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    format!("{}-stage {}", stages, equipment)
}

/// Sums the paired runtime fields and computes runtime-per-degree-day ratios.
///
/// A missing runtime addend counts as zero. A ratio is defined only when the
/// matching degree-day total is present and strictly positive; otherwise it is
/// explicitly undefined, never a division fault.
pub fn efficiency_metrics(device: &Value) -> EfficiencyMetrics {
    let total_cool = paired_runtime(device, "cool_1", "cool_2");
    let total_heat = paired_runtime(device, "heat_1", "heat_2");
    let total_aux = paired_runtime(device, "auxiliary_heat_1", "auxiliary_heat_2");

    let cool_degree_days = fields::resolve_f64(device, &["profile.degree_days.cool"]);
    let heat_degree_days = fields::resolve_f64(device, &["profile.degree_days.heat"]);

    EfficiencyMetrics {
        total_cool_runtime_minutes: total_cool,
        total_heat_runtime_minutes: total_heat,
        total_aux_heat_runtime_minutes: total_aux,
        cool_degree_days,
        heat_degree_days,
        cool_runtime_per_degree_day: runtime_per_degree_day(total_cool, cool_degree_days),
        heat_runtime_per_degree_day: runtime_per_degree_day(total_heat, heat_degree_days),
    }
}

fn paired_runtime(device: &Value, first: &str, second: &str) -> f64 {
    stage_runtime(device, first) + stage_runtime(device, second)
}

fn stage_runtime(device: &Value, stage: &str) -> f64 {
    fields::lookup(device, &format!("profile.runtime.{}", stage))
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
}

fn runtime_per_degree_day(total_runtime: f64, degree_days: Option<f64>) -> Option<f64> {
    match degree_days {
        Some(dd) if dd > 0.0 => Some(round2(total_runtime / dd)),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
