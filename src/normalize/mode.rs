//! Operating-mode inference.
//!
//! The upstream document never carries an explicit operating mode; it is
//! inferred from the running equipment names and the setpoint pair.

use crate::models::beestat::InferredMode;

const COOLING_TOKENS: &[&str] = &["cool", "compcool"];
const HEATING_TOKENS: &[&str] = &["heat", "compheat", "auxheat"];

/// Infers the operating mode. Priority order, first match wins:
/// 1. any running equipment name contains a cooling token -> cool
/// 2. any running equipment name contains a heating token -> heat
/// 3. both setpoints present -> auto (equality does not disambiguate)
/// 4. only the heat setpoint -> heat
/// 5. only the cool setpoint -> cool
/// 6. neither -> auto
///
/// Pure function: same inputs always yield the same output.
pub fn infer_mode(
    running_equipment: &[String],
    setpoint_heat: Option<f64>,
    setpoint_cool: Option<f64>,
) -> InferredMode {
    if any_contains(running_equipment, COOLING_TOKENS) {
        return InferredMode::Cool;
    }
    if any_contains(running_equipment, HEATING_TOKENS) {
        return InferredMode::Heat;
    }

    match (setpoint_heat, setpoint_cool) {
        (Some(_), Some(_)) => InferredMode::Auto,
        (Some(_), None) => InferredMode::Heat,
        (None, Some(_)) => InferredMode::Cool,
        (None, None) => InferredMode::Auto,
    }
}

fn any_contains(names: &[String], tokens: &[&str]) -> bool {
    names.iter().any(|name| {
        let lower = name.to_lowercase();
        tokens.iter().any(|token| lower.contains(token))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equipment(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cooling_wins_over_heating_across_the_whole_list() {
        // heating name appears first; cooling still takes priority
        let running = equipment(&["auxHeat1", "compCool1"]);
        assert_eq!(infer_mode(&running, Some(68.0), Some(74.0)), InferredMode::Cool);
    }

    #[test]
    fn equipment_matching_is_case_insensitive() {
        assert_eq!(infer_mode(&equipment(&["CompCool1"]), None, None), InferredMode::Cool);
        assert_eq!(infer_mode(&equipment(&["AUXHEAT2"]), None, None), InferredMode::Heat);
    }

    #[test]
    fn non_hvac_equipment_falls_through_to_setpoints() {
        let running = equipment(&["fan", "humidifier"]);
        assert_eq!(infer_mode(&running, Some(70.0), None), InferredMode::Heat);
    }

    #[test]
    fn equal_setpoints_do_not_force_a_single_mode() {
        assert_eq!(infer_mode(&[], Some(68.0), Some(68.0)), InferredMode::Auto);
    }

    #[test]
    fn both_setpoints_present_is_auto() {
        assert_eq!(infer_mode(&[], Some(68.0), Some(74.0)), InferredMode::Auto);
    }

    #[test]
    fn single_setpoint_selects_its_side() {
        assert_eq!(infer_mode(&[], Some(70.0), None), InferredMode::Heat);
        assert_eq!(infer_mode(&[], None, Some(75.0)), InferredMode::Cool);
    }

    #[test]
    fn no_signal_defaults_to_auto() {
        assert_eq!(infer_mode(&[], None, None), InferredMode::Auto);
    }
}
