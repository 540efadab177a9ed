//! Optional-field lookup over raw device JSON.
//!
//! The upstream document enforces no schema: fields may be absent, null, or of
//! an unexpected type. Lookups traverse dotted paths (`profile.address.latitude`)
//! and short-circuit to absent on any missing or null node; the typed accessors
//! additionally treat a type mismatch as absent rather than an error.

use serde_json::Value;

/// Resolves a dotted path against a raw device object. A missing intermediate
/// node, a non-object intermediate, or a null leaf all yield `None`.
pub fn lookup<'a>(device: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = device;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() { None } else { Some(current) }
}

/// Returns the value of the first candidate path that is present and non-null.
pub fn resolve<'a>(device: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|path| lookup(device, path))
}

pub fn resolve_f64(device: &Value, candidates: &[&str]) -> Option<f64> {
    resolve(device, candidates)?.as_f64()
}

pub fn resolve_i64(device: &Value, candidates: &[&str]) -> Option<i64> {
    resolve(device, candidates)?.as_i64()
}

pub fn resolve_bool(device: &Value, candidates: &[&str]) -> Option<bool> {
    resolve(device, candidates)?.as_bool()
}

pub fn resolve_str<'a>(device: &'a Value, candidates: &[&str]) -> Option<&'a str> {
    resolve(device, candidates)?.as_str()
}

pub fn resolve_string(device: &Value, candidates: &[&str]) -> Option<String> {
    resolve_str(device, candidates).map(str::to_string)
}

/// Resolves an array field, keeping only its string elements.
pub fn resolve_string_array(device: &Value, candidates: &[&str]) -> Option<Vec<String>> {
    let items = resolve(device, candidates)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn device() -> Value {
        json!({
            "temperature": 71.5,
            "actual_temperature": null,
            "humidity": 42,
            "name": "Downstairs Hallway",
            "running_equipment": ["fan", "compCool1", 7],
            "profile": {
                "address": { "latitude": 47.61, "longitude": -122.33 }
            }
        })
    }

    #[test]
    fn traverses_nested_paths() {
        let d = device();
        assert_eq!(lookup(&d, "profile.address.latitude").and_then(Value::as_f64), Some(47.61));
    }

    #[test]
    fn missing_intermediate_is_absent_not_error() {
        let d = device();
        assert!(lookup(&d, "weather.condition").is_none());
        assert!(lookup(&d, "profile.runtime.cool_1").is_none());
        // scalar intermediate node
        assert!(lookup(&d, "temperature.celsius").is_none());
    }

    #[test]
    fn null_counts_as_absent() {
        let d = device();
        assert!(lookup(&d, "actual_temperature").is_none());
    }

    #[test]
    fn fallback_chain_takes_first_present_candidate() {
        let d = device();
        // actual_temperature is null, so the chain falls through to temperature
        assert_eq!(
            resolve_f64(&d, &["actual_temperature", "indoor_temperature", "temperature"]),
            Some(71.5)
        );
    }

    #[test]
    fn typed_accessors_tolerate_unexpected_types() {
        let d = device();
        assert_eq!(resolve_str(&d, &["temperature"]), None);
        assert_eq!(resolve_f64(&d, &["name"]), None);
        assert_eq!(resolve_f64(&d, &["humidity"]), Some(42.0));
    }

    #[test]
    fn string_array_drops_non_string_elements() {
        let d = device();
        assert_eq!(
            resolve_string_array(&d, &["running_equipment"]),
            Some(vec!["fan".to_string(), "compCool1".to_string()])
        );
        assert_eq!(resolve_string_array(&d, &["name"]), None);
    }
}
