use crate::models::beestat::{NormalizedRecord, Verbosity};
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

/// Renders the human-readable report for the requested shape.
pub fn render(records: &[NormalizedRecord], verbosity: Verbosity) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let title = match verbosity {
        Verbosity::Minimal => "BEESTAT THERMOSTAT DATA",
        Verbosity::Essential => "BEESTAT ESSENTIAL DATA",
        Verbosity::Comprehensive => "BEESTAT COMPREHENSIVE DATA",
    };
    let stamp = records
        .first()
        .map(|r| r.captured_at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{} - {}", title, stamp);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out);

    for record in records {
        match verbosity {
            Verbosity::Minimal => render_minimal(&mut out, record),
            Verbosity::Essential => render_essential(&mut out, record),
            Verbosity::Comprehensive => render_comprehensive(&mut out, record),
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", rule);
    out
}

fn render_minimal(out: &mut String, record: &NormalizedRecord) {
    let _ = writeln!(out, "Thermostat: {}", record.name);
    let _ = writeln!(out, "  ID: {}", record.id);
    let _ = writeln!(out, "  Current Temperature: {}°F", opt(&record.temperature));
    let _ = writeln!(out, "  HVAC Mode: {}", record.inferred_mode);
    let _ = writeln!(out, "  HVAC State: {}", record.equipment_state);
}

fn render_essential(out: &mut String, record: &NormalizedRecord) {
    let _ = writeln!(out, "{} (ID: {})", record.name, opt(&record.thermostat_id));
    let _ = writeln!(out, "  1. Current Temperature:  {}°F", opt(&record.temperature));
    let _ = writeln!(out, "  2. HVAC Mode:            {}", record.inferred_mode.as_str().to_uppercase());
    let _ = writeln!(out, "  3. Running Equipment:    {}", record.equipment_state);
    let _ = writeln!(out, "  4. Current Humidity:     {}%", opt(&record.humidity));
    let _ = writeln!(out, "  5. Temperature Setpoints:");
    let _ = writeln!(out, "     Heat: {}°F", opt(&record.setpoint_heat));
    let _ = writeln!(out, "     Cool: {}°F", opt(&record.setpoint_cool));
}

fn render_comprehensive(out: &mut String, record: &NormalizedRecord) {
    let _ = writeln!(out, "### {} ###", record.name);
    let _ = writeln!(out);

    let _ = writeln!(out, "CURRENT STATUS");
    let _ = writeln!(out, "  Temperature:       {}°F", opt(&record.temperature));
    let _ = writeln!(out, "  Humidity:          {}%", opt(&record.humidity));
    let _ = writeln!(out, "  Heat Setpoint:     {}°F", opt(&record.setpoint_heat));
    let _ = writeln!(out, "  Cool Setpoint:     {}°F", opt(&record.setpoint_cool));
    let _ = writeln!(out, "  HVAC Mode:         {}", record.inferred_mode);
    let _ = writeln!(out, "  HVAC State:        {}", record.equipment_state);

    if let Some(Some(climate)) = &record.current_climate {
        let _ = writeln!(out);
        let _ = writeln!(out, "CURRENT CLIMATE: {}", climate.name.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  Occupied:          {}", opt(&climate.is_occupied));
        let _ = writeln!(out, "  Heat Setting:      {}°F", opt(&climate.heat_temp));
        let _ = writeln!(out, "  Cool Setting:      {}°F", opt(&climate.cool_temp));
        let _ = writeln!(out, "  Active Sensors:    {} sensor(s)", climate.sensors.len());
    }

    if let Some(weather) = &record.weather {
        let _ = writeln!(out);
        let _ = writeln!(out, "WEATHER");
        let _ = writeln!(out, "  Condition:         {}", weather.condition.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "  Outdoor Temp:      {}°F (Low: {}°F, High: {}°F)",
            opt(&weather.temperature),
            opt(&weather.temperature_low),
            opt(&weather.temperature_high)
        );
        let _ = writeln!(out, "  Humidity:          {}%", opt(&weather.humidity_relative));
        let _ = writeln!(
            out,
            "  Wind:              {} mph @ {}°",
            opt(&weather.wind_speed),
            opt(&weather.wind_bearing)
        );
        let _ = writeln!(out, "  Pressure:          {} mb", opt(&weather.barometric_pressure));
    }

    if let Some(property) = &record.property {
        let _ = writeln!(out);
        let _ = writeln!(out, "PROPERTY");
        let _ = writeln!(out, "  Type:              {}", property.structure_type.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "  Size:              {} sq ft, {} stories",
            opt(&property.square_feet),
            opt(&property.stories)
        );
        let _ = writeln!(out, "  Age:               {} years", opt(&property.age));
    }

    if let Some(system) = &record.system_summary {
        let _ = writeln!(out);
        let _ = writeln!(out, "HVAC SYSTEM");
        let _ = writeln!(out, "  Cooling:           {}", system.cooling_system);
        let _ = writeln!(out, "  Heating:           {}", system.heating_system);
        let _ = writeln!(out, "  Auxiliary Heat:    {}", system.auxiliary_heat);
    }

    if let Some(eff) = &record.efficiency {
        let _ = writeln!(out);
        let _ = writeln!(out, "EFFICIENCY METRICS");
        let _ = writeln!(
            out,
            "  Cool Runtime:      {} minutes ({} degree days)",
            eff.total_cool_runtime_minutes,
            opt(&eff.cool_degree_days)
        );
        let _ = writeln!(
            out,
            "  Heat Runtime:      {} minutes ({} degree days)",
            eff.total_heat_runtime_minutes,
            opt(&eff.heat_degree_days)
        );
        if eff.total_aux_heat_runtime_minutes > 0.0 {
            let _ = writeln!(out, "  Aux Heat Runtime:  {} minutes", eff.total_aux_heat_runtime_minutes);
        }
        if let Some(cool) = eff.cool_runtime_per_degree_day {
            let _ = writeln!(out, "  Cool Efficiency:   {} min/degree-day", cool);
        }
        if let Some(heat) = eff.heat_runtime_per_degree_day {
            let _ = writeln!(out, "  Heat Efficiency:   {} min/degree-day", heat);
        }
    }

    if let Some(filters) = &record.filters {
        if !filters.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "MAINTENANCE");
            for (filter_type, info) in filters {
                let _ = writeln!(out, "  {} filter:", filter_type);
                let _ = writeln!(out, "    Last Changed:    {}", info.last_changed.as_deref().unwrap_or("-"));
                let _ = writeln!(
                    out,
                    "    Life:            {} {}",
                    opt(&info.life),
                    info.life_units.as_deref().unwrap_or("-")
                );
                let _ = writeln!(out, "    Runtime:         {} seconds", opt(&info.runtime));
            }
        }
    }

    if let (Some(alerts), Some(count)) = (&record.alerts, record.active_alert_count) {
        if count > 0 {
            let _ = writeln!(out);
            let _ = writeln!(out, "ACTIVE ALERTS ({})", count);
            for alert in alerts {
                if alert.dismissed.unwrap_or(false) {
                    continue;
                }
                let code = alert.code.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
                let _ = writeln!(out, "  [{}] {}", code, alert.text.as_deref().unwrap_or(""));
            }
        }
    }

    if let Some(sync) = &record.sync {
        let _ = writeln!(out);
        let _ = writeln!(out, "SYSTEM INFO");
        let _ = writeln!(out, "  Beestat ID:        {}", opt(&record.thermostat_id));
        let _ = writeln!(out, "  Ecobee ID:         {}", opt(&record.ecobee_thermostat_id));
        let _ = writeln!(out, "  Time Zone:         {}", sync.time_zone.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  Last Sync:         {}", sync.sync_end.as_deref().unwrap_or("-"));
        let _ = writeln!(
            out,
            "  Data Range:        {} to {}",
            sync.data_begin.as_deref().unwrap_or("-"),
            sync.data_end.as_deref().unwrap_or("-")
        );
    }
}

fn opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::beestat::InferredMode;
    use chrono::TimeZone;

    fn record() -> NormalizedRecord {
        NormalizedRecord {
            id: "12345".to_string(),
            thermostat_id: Some(12345),
            ecobee_thermostat_id: Some(318822),
            name: "Downstairs Hallway".to_string(),
            identifier: Some("411912345678".to_string()),
            temperature: Some(71.4),
            humidity: None,
            setpoint_heat: Some(68.0),
            setpoint_cool: Some(74.0),
            running_equipment: vec!["compCool1".to_string()],
            equipment_state: "compCool1".to_string(),
            inferred_mode: InferredMode::Cool,
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
            captured_at: chrono::Utc.with_ymd_and_hms(2026, 8, 6, 15, 30, 0).unwrap(),
        }
    }

    #[test]
    fn essential_report_lists_the_five_key_fields() {
        let report = render(&[record()], Verbosity::Essential);
        assert!(report.contains("BEESTAT ESSENTIAL DATA - 2026-08-06 15:30:00"));
        assert!(report.contains("1. Current Temperature:  71.4°F"));
        assert!(report.contains("2. HVAC Mode:            COOL"));
        assert!(report.contains("3. Running Equipment:    compCool1"));
        // absent humidity renders as a placeholder, not a panic
        assert!(report.contains("4. Current Humidity:     -%"));
    }

    #[test]
    fn minimal_report_is_one_block_per_device() {
        let report = render(&[record()], Verbosity::Minimal);
        assert!(report.contains("Thermostat: Downstairs Hallway"));
        assert!(report.contains("HVAC State:        compCool1") || report.contains("HVAC State: compCool1"));
        assert!(!report.contains("WEATHER"));
    }

    #[test]
    fn comprehensive_report_skips_unpopulated_sections() {
        // sections are None, so only the status block renders
        let report = render(&[record()], Verbosity::Comprehensive);
        assert!(report.contains("CURRENT STATUS"));
        assert!(!report.contains("EFFICIENCY METRICS"));
        assert!(!report.contains("ACTIVE ALERTS"));
    }
}
