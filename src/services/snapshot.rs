use crate::models::beestat::NormalizedRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SavedSnapshot {
    pub raw: PathBuf,
    pub normalized: PathBuf,
}

/// Writes the raw document and the normalized records to timestamped JSON
/// files under `output_dir`, returning the written paths.
pub fn save(
    output_dir: &Path,
    document: &Value,
    records: &[NormalizedRecord],
    captured_at: DateTime<Utc>,
) -> Result<SavedSnapshot, String> {
    fs::create_dir_all(output_dir).map_err(|e| format!("create {} failed: {}", output_dir.display(), e))?;

    let stamp = captured_at.format("%Y%m%d_%H%M%S");
    let raw = output_dir.join(format!("beestat_raw_{}.json", stamp));
    write_json(&raw, document)?;

    let normalized = output_dir.join(format!("beestat_normalized_{}.json", stamp));
    write_json(&normalized, &records)?;

    Ok(SavedSnapshot { raw, normalized })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("create {} failed: {}", path.display(), e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .map_err(|e| format!("write {} failed: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn writes_timestamped_raw_and_normalized_files() {
        let dir = std::env::temp_dir().join(format!("beestat-snapshot-test-{}", std::process::id()));
        let captured_at = Utc.with_ymd_and_hms(2026, 8, 6, 15, 30, 0).unwrap();
        let document = serde_json::json!({ "success": true, "data": {} });

        let saved = save(&dir, &document, &[], captured_at).expect("snapshot saved");
        assert!(saved.raw.ends_with("beestat_raw_20260806_153000.json"));
        assert!(saved.normalized.ends_with("beestat_normalized_20260806_153000.json"));

        let raw_back: Value =
            serde_json::from_str(&fs::read_to_string(&saved.raw).unwrap()).expect("raw file parses");
        assert_eq!(raw_back, document);
        let normalized_back: Vec<NormalizedRecord> =
            serde_json::from_str(&fs::read_to_string(&saved.normalized).unwrap()).expect("records parse");
        assert!(normalized_back.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
