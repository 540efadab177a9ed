pub mod models {
    pub mod beestat;
}

pub mod client;
pub mod config;
pub mod normalize {
    pub mod assemble;
    pub mod fields;
    pub mod metrics;
    pub mod mode;
}
pub mod services {
    pub mod report;
    pub mod snapshot;
}

use crate::client::BeestatClient;
use crate::config::Config;
use crate::models::beestat::Verbosity;
use crate::normalize::assemble::{self, NameFilter};
use crate::services::{report, snapshot};
use chrono::Utc;
use log::{error, info};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
}

#[derive(Debug, Default)]
struct CliOptions {
    verbosity: Option<Verbosity>,
    filter_terms: Option<Vec<String>>,
    no_save: bool,
}

fn run(cli: &CliOptions) -> Result<(), String> {
    // 1) Load config; CLI flags override the environment
    let mut cfg = Config::from_env()?;
    if let Some(verbosity) = cli.verbosity {
        cfg.verbosity = verbosity;
    }
    if let Some(terms) = cli.filter_terms.as_ref() {
        cfg.filter_terms = terms.clone();
    }
    if cli.no_save {
        cfg.save_snapshots = false;
    }
    info!(
        "Config loaded (base_url={}, verbosity={}, filter={}, save_snapshots={}, timeout={}s)",
        cfg.base_url,
        cfg.verbosity,
        if cfg.filter_terms.is_empty() {
            "-".to_string()
        } else {
            cfg.filter_terms.join(",")
        },
        cfg.save_snapshots,
        cfg.http_timeout.as_secs()
    );

    // 2) Init beestat client
    let client = BeestatClient::new(&cfg.base_url, &cfg.api_key, cfg.http_timeout);

    // 3) Fetch the telemetry document
    let document = client
        .read_thermostats()
        .map_err(|e| format!("thermostat read failed: {}", e))?;
    let device_count = document.get("data").and_then(Value::as_object).map_or(0, |m| m.len());
    info!("Fetched telemetry for {} thermostat(s)", device_count);

    // 4) Normalize
    let captured_at = Utc::now();
    let filter = NameFilter::new(cfg.filter_terms.clone());
    let records = assemble::normalize_document(&document, &filter, cfg.verbosity, captured_at)
        .map_err(|e| format!("normalization failed: {}", e))?;
    if records.is_empty() {
        return Err("no thermostats matched the configured filter".to_string());
    }
    info!("Normalized {} record(s)", records.len());

    // 5) Report
    print!("{}", report::render(&records, cfg.verbosity));

    // 6) Persist snapshot files
    if cfg.save_snapshots {
        let saved = snapshot::save(&cfg.output_dir, &document, &records, captured_at)?;
        info!("Raw snapshot saved to {}", saved.raw.display());
        info!("Normalized snapshot saved to {}", saved.normalized.display());
    }

    info!("Processed {} thermostat(s)", records.len());
    Ok(())
}

fn configure_from_cli() -> Result<(CliOptions, Option<LoadedEnvFile>), String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--env-file") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let value = args
                    .next()
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?;
                env_file = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--env-file=") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let path_str = &s["--env-file=".len()..];
                if path_str.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                env_file = Some(PathBuf::from(path_str));
            }
            Some("--verbosity") => {
                let value = args
                    .next()
                    .ok_or_else(|| "`--verbosity` requires a value".to_string())?;
                let value = value
                    .to_str()
                    .ok_or_else(|| "`--verbosity` value contains invalid UTF-8".to_string())?;
                options.verbosity = Some(value.parse::<Verbosity>()?);
            }
            Some(s) if s.starts_with("--verbosity=") => {
                let value = &s["--verbosity=".len()..];
                options.verbosity = Some(value.parse::<Verbosity>()?);
            }
            Some("--filter") => {
                let value = args.next().ok_or_else(|| "`--filter` requires a value".to_string())?;
                let value = value
                    .to_str()
                    .ok_or_else(|| "`--filter` value contains invalid UTF-8".to_string())?;
                options.filter_terms = Some(config::parse_filter_terms(value));
            }
            Some(s) if s.starts_with("--filter=") => {
                let value = &s["--filter=".len()..];
                options.filter_terms = Some(config::parse_filter_terms(value));
            }
            Some("--no-save") => {
                options.no_save = true;
            }
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    let loaded = if let Some(path) = env_file {
        if !path.is_file() {
            return Err(format!("env file not found: {}", path.display()));
        }
        load_env_file(&path)?;
        Some(LoadedEnvFile { path, explicit: true })
    } else {
        let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
        let default_path = cwd.join(".env");
        if default_path.is_file() {
            load_env_file(&default_path)?;
            Some(LoadedEnvFile {
                path: default_path,
                explicit: false,
            })
        } else {
            None
        }
    };

    Ok((options, loaded))
}

fn load_env_file(path: &Path) -> Result<(), String> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open(path).map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("failed to read {} at line {}: {}", path.display(), index + 1, e))?;
        match parse_env_assignment(&line) {
            Ok(Some((key, value))) => {
                // Preserve any value that was already supplied via the process environment.
                if std::env::var_os(&key).is_none() {
                    // Updating process-level environment variables is unsafe on some targets.
                    unsafe {
                        std::env::set_var(key, value);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                return Err(format!("{}:{}: {}", path.display(), index + 1, e));
            }
        }
    }

    Ok(())
}

fn parse_env_assignment(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let without_export = trimmed
        .strip_prefix("export ")
        .map(|s| s.trim_start())
        .unwrap_or(trimmed);

    let mut parts = without_export.splitn(2, '=');
    let key = parts
        .next()
        .map(str::trim)
        .ok_or_else(|| "missing environment variable name".to_string())?;
    let value_part = parts.next().ok_or_else(|| "missing '=' in assignment".to_string())?;

    if key.is_empty() {
        return Err("environment variable name cannot be empty".to_string());
    }
    if key.chars().any(|c| c.is_whitespace()) {
        return Err(format!("environment variable name contains whitespace: {}", key));
    }

    let value = parse_env_value(value_part)?;
    Ok(Some((key.to_string(), value)))
}

fn parse_env_value(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }

    if let Some(rest) = trimmed.strip_prefix('"') {
        parse_double_quoted(rest)
    } else if let Some(rest) = trimmed.strip_prefix('\'') {
        parse_single_quoted(rest)
    } else {
        let value = trimmed.splitn(2, '#').next().unwrap_or_default().trim_end();
        Ok(value.to_string())
    }
}

fn parse_double_quoted(input: &str) -> Result<String, String> {
    let mut result = String::new();
    let mut chars = input.chars();
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if escape {
            let value = match ch {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                '\\' => '\\',
                '"' => '"',
                other => other,
            };
            result.push(value);
            escape = false;
            continue;
        }

        match ch {
            '\\' => escape = true,
            '"' => {
                let remainder = chars.as_str().trim();
                if remainder.is_empty() || remainder.starts_with('#') {
                    return Ok(result);
                } else {
                    return Err("unexpected characters after closing double quote".to_string());
                }
            }
            other => result.push(other),
        }
    }

    if escape {
        Err("unterminated escape sequence in double-quoted value".to_string())
    } else {
        Err("unterminated double-quoted value".to_string())
    }
}

fn parse_single_quoted(input: &str) -> Result<String, String> {
    let mut result = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch == '\'' {
            let remainder = chars.as_str().trim();
            if remainder.is_empty() || remainder.starts_with('#') {
                return Ok(result);
            } else {
                return Err("unexpected characters after closing single quote".to_string());
            }
        } else {
            result.push(ch);
        }
    }

    Err("unterminated single-quoted value".to_string())
}

fn main() {
    let (cli, loaded_env) = match configure_from_cli() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "beestat-snapshot {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(&cli) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
