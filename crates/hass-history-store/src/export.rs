// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of hass-history.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::info;

use crate::errors::StoreResult;
use crate::store::HistoryStore;

/// File name for an export of `entity_id` taken at `now`.
///
/// Path-like characters in the entity id are replaced so the name stays a single
/// path component; the second-resolution timestamp keeps successive exports apart.
#[must_use]
pub fn default_export_filename(entity_id: &str, now: DateTime<Local>) -> String {
    let safe_entity_name = entity_id.replace(['.', '/'], "_");
    format!(
        "home_assistant_{}_{}.csv",
        safe_entity_name,
        now.format("%Y%m%d_%H%M%S")
    )
}

impl HistoryStore {
    /// Write the full history of `entity_id` to a CSV file and return the path used.
    ///
    /// Without `filename`, a name is generated in the current directory. An entity
    /// with no samples still produces a file, left empty without a header.
    pub fn export_csv(&self, entity_id: &str, filename: Option<&Path>) -> StoreResult<PathBuf> {
        self.export_csv_in(Path::new(""), entity_id, filename)
    }

    /// Like [`HistoryStore::export_csv`], placing generated file names in `directory`.
    /// An explicit `filename` is used as given.
    pub fn export_csv_in(
        &self,
        directory: &Path,
        entity_id: &str,
        filename: Option<&Path>,
    ) -> StoreResult<PathBuf> {
        let path = filename.map_or_else(
            || directory.join(default_export_filename(entity_id, Local::now())),
            Path::to_path_buf,
        );

        let samples = self.history(entity_id, None)?;

        let file = File::create(&path)?;
        let mut writer = csv::Writer::from_writer(file);
        for sample in &samples {
            writer.serialize(sample)?;
        }
        writer.flush()?;

        info!(
            "💾 Exported {} samples of {} to {}",
            samples.len(),
            entity_id,
            path.display()
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HistoryState, StateSample};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, HistoryStore) {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::open(dir.path().join("history.db")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_default_filename() {
        let now = Local.with_ymd_and_hms(2025, 10, 2, 8, 5, 9).unwrap();
        assert_eq!(
            default_export_filename("sensor.meter_voltage_r", now),
            "home_assistant_sensor_meter_voltage_r_20251002_080509.csv"
        );
        assert_eq!(
            default_export_filename("a/b.c", now),
            "home_assistant_a_b_c_20251002_080509.csv"
        );
    }

    #[test]
    fn test_export_empty_entity_creates_empty_file() {
        let (dir, store) = temp_store();
        let target = dir.path().join("empty.csv");

        let path = store.export_csv("sensor.none", Some(&target)).unwrap();

        assert_eq!(path, target);
        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_export_header_uses_column_names() {
        let (dir, store) = temp_store();
        store
            .insert(&[HistoryState::new("sensor.a", "5", "t1", "t1")])
            .unwrap();

        let path = store
            .export_csv("sensor.a", Some(&dir.path().join("a.csv")))
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();

        assert_eq!(
            content.lines().next().unwrap(),
            "id,entity_id,state,last_changed,last_updated,timestamp,created_at"
        );
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_export_round_trip() {
        let (dir, store) = temp_store();
        let input = vec![
            HistoryState::new("sensor.a", "230.1", "2025-10-02T10:00:00", "2025-10-02T10:00:00"),
            HistoryState::new("sensor.a", "unavailable", "2025-10-02T11:00:00", "2025-10-02T11:00:00"),
            HistoryState::new("sensor.a", "with, comma", "2025-10-02T11:00:00", "2025-10-02T12:00:00"),
            HistoryState::new("sensor.b", "1", "2025-10-02T10:00:00", "2025-10-02T10:00:00"),
        ];
        store.insert(&input).unwrap();

        let path = store
            .export_csv("sensor.a", Some(&dir.path().join("a.csv")))
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let reloaded: Vec<StateSample> = reader.deserialize::<StateSample>().map(Result::unwrap).collect();

        assert_eq!(reloaded, store.history("sensor.a", None).unwrap());
        let mut states: Vec<_> = reloaded.iter().map(|s| s.state.as_str()).collect();
        states.sort_unstable();
        assert_eq!(states, vec!["230.1", "unavailable", "with, comma"]);
    }

    #[test]
    fn test_export_in_directory_generates_name() {
        let (dir, store) = temp_store();
        store
            .insert(&[HistoryState::new("sensor.a", "5", "t1", "t1")])
            .unwrap();

        let path = store.export_csv_in(dir.path(), "sensor.a", None).unwrap();

        assert_eq!(path.parent().unwrap(), dir.path());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("home_assistant_sensor_a_"));
        assert!(name.ends_with(".csv"));
        assert!(path.exists());
    }
}
