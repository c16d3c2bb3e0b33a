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

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One element of the Home Assistant history response.
///
/// Every field defaults to an empty string when it is missing or `null`, so a loosely
/// shaped element still produces a row keyed on whatever identity it carries. Non-string
/// scalars are kept in their JSON text form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub entity_id: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub state: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub last_changed: String,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub last_updated: String,
}

impl HistoryState {
    pub fn new(
        entity_id: impl Into<String>,
        state: impl Into<String>,
        last_changed: impl Into<String>,
        last_updated: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            last_changed: last_changed.into(),
            last_updated: last_updated.into(),
        }
    }
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// A stored row of `entity_history`.
///
/// Field names match the column names, which is also the CSV export header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSample {
    pub id: i64,
    pub entity_id: String,
    pub state: String,
    pub last_changed: String,
    pub last_updated: String,
    /// Copy of `last_updated`, kept for databases and exports written by earlier versions
    pub timestamp: String,
    /// Local wall-clock time of insertion
    #[serde(rename = "created_at")]
    pub recorded_at: String,
}

/// Aggregate view over the whole store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_records: u64,
    pub unique_entities: u64,
    /// Smallest `last_updated`, `None` when the store is empty
    pub earliest_record: Option<String>,
    /// Largest `last_updated`, `None` when the store is empty
    pub latest_record: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_state_ignores_extra_fields() {
        let state: HistoryState = serde_json::from_value(json!({
            "entity_id": "sensor.ac_active_power",
            "state": "1234",
            "attributes": {"unit_of_measurement": "W"},
            "last_changed": "2025-10-02T10:00:00+00:00",
            "last_updated": "2025-10-02T10:00:05+00:00",
            "context": {"id": "abc"}
        }))
        .unwrap();

        assert_eq!(state.entity_id, "sensor.ac_active_power");
        assert_eq!(state.state, "1234");
        assert_eq!(state.last_updated, "2025-10-02T10:00:05+00:00");
    }

    #[test]
    fn test_history_state_missing_and_null_fields_default_to_empty() {
        let state: HistoryState = serde_json::from_value(json!({
            "entity_id": "sensor.meter_voltage_r",
            "state": null
        }))
        .unwrap();

        assert_eq!(state.entity_id, "sensor.meter_voltage_r");
        assert_eq!(state.state, "");
        assert_eq!(state.last_changed, "");
        assert_eq!(state.last_updated, "");
    }

    #[test]
    fn test_history_state_keeps_numeric_state_as_text() {
        let state: HistoryState =
            serde_json::from_value(json!({"entity_id": "sensor.x", "state": 42.5})).unwrap();
        assert_eq!(state.state, "42.5");
    }
}
