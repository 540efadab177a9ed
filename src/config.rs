//! Minimal runtime configuration helpers.
//! Everything comes from the environment (optionally seeded from a `.env` file).

use crate::models::beestat::Verbosity;
use std::path::PathBuf;
use std::time::Duration;
use std::{fs, path::Path};

pub const DEFAULT_BASE_URL: &str = "https://api.beestat.io/";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// beestat API key obtained from the account page.
    pub api_key: String,
    pub base_url: String,
    /// Name-filter substrings; empty means no filtering.
    pub filter_terms: Vec<String>,
    pub verbosity: Verbosity,
    /// Directory where timestamped snapshot files are written.
    pub output_dir: PathBuf,
    pub save_snapshots: bool,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Prefer env var; fallback to api_key.txt in working directory
        let api_key = match std::env::var("BEESTAT_API_KEY") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                let path = Path::new("api_key.txt");
                match fs::read_to_string(path) {
                    Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
                    _ => {
                        return Err(
                            "Missing API key: set BEESTAT_API_KEY or provide api_key.txt in working directory"
                                .to_string(),
                        );
                    }
                }
            }
        };

        let base_url = std::env::var("BEESTAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let filter_terms = std::env::var("TARGET_THERMOSTATS")
            .map(|s| parse_filter_terms(&s))
            .unwrap_or_default();

        let verbosity = match std::env::var("VERBOSITY") {
            Ok(s) if !s.trim().is_empty() => s.parse::<Verbosity>().map_err(|e| format!("VERBOSITY: {}", e))?,
            _ => Verbosity::Essential,
        };

        let output_dir = std::env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let save_snapshots = std::env::var("SAVE_SNAPSHOTS")
            .ok()
            .map(|s| matches!(s.as_str(), "1" | "true" | "TRUE"))
            .unwrap_or(true);

        let timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Ok(Config {
            api_key,
            base_url,
            filter_terms,
            verbosity,
            output_dir,
            save_snapshots,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Splits a comma-separated filter list, dropping blank entries.
pub fn parse_filter_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_terms_split_on_commas_and_trim() {
        assert_eq!(
            parse_filter_terms("Downstairs, 809 Sailors Cove"),
            vec!["Downstairs".to_string(), "809 Sailors Cove".to_string()]
        );
    }

    #[test]
    fn blank_filter_entries_are_dropped() {
        assert!(parse_filter_terms("").is_empty());
        assert!(parse_filter_terms(" , ,").is_empty());
        assert_eq!(parse_filter_terms(",Garage,"), vec!["Garage".to_string()]);
    }
}
