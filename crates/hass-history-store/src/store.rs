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

use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::{Connection, Row, params};
use tracing::{debug, info};

use crate::errors::StoreResult;
use crate::types::{HistoryState, StateSample, StoreStats};

/// Database file used when no path is configured
pub const DEFAULT_DB_PATH: &str = "home_assistant_history.db";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS entity_history (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id     TEXT NOT NULL,
        state         TEXT,
        last_changed  TEXT,
        last_updated  TEXT,
        timestamp     TEXT,
        created_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        UNIQUE(entity_id, last_updated) ON CONFLICT IGNORE
    );

    CREATE INDEX IF NOT EXISTS idx_entity_id_timestamp
        ON entity_history(entity_id, last_updated);";

const SAMPLE_COLUMNS: &str =
    "id, entity_id, state, last_changed, last_updated, timestamp, created_at";

/// SQLite-backed store of entity state samples.
///
/// Holds only the database path; every operation opens its own connection and
/// releases it before returning, on error paths included.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    db_path: PathBuf,
}

impl HistoryStore {
    /// Open (creating if needed) the database at `db_path` and ensure the schema exists
    pub fn open<P: AsRef<Path>>(db_path: P) -> StoreResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        store.initialize()?;
        info!("📦 History store ready at {}", store.db_path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connect(&self) -> StoreResult<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Create the history table and its lookup index if they do not exist yet.
    /// Safe to call on every startup.
    pub fn initialize(&self) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert samples, silently skipping any whose `(entity_id, last_updated)` pair is
    /// already stored. Returns the number of rows actually added.
    pub fn insert(&self, samples: &[HistoryState]) -> StoreResult<usize> {
        let mut conn = self.connect()?;
        let recorded_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO entity_history
                    (entity_id, state, last_changed, last_updated, timestamp, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
            )?;
            for sample in samples {
                inserted += stmt.execute(params![
                    sample.entity_id,
                    sample.state,
                    sample.last_changed,
                    sample.last_updated,
                    recorded_at,
                ])?;
            }
        }
        tx.commit()?;

        debug!(
            "Inserted {}/{} samples ({} duplicates skipped)",
            inserted,
            samples.len(),
            samples.len() - inserted
        );
        Ok(inserted)
    }

    /// Samples for one entity, newest `last_updated` first, at most `limit` of them
    pub fn history(
        &self,
        entity_id: &str,
        limit: Option<NonZeroUsize>,
    ) -> StoreResult<Vec<StateSample>> {
        let conn = self.connect()?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = limit.map_or(-1, |n| i64::try_from(n.get()).unwrap_or(i64::MAX));

        let mut stmt = conn.prepare(&format!(
            "SELECT {SAMPLE_COLUMNS} FROM entity_history
             WHERE entity_id = ?1
             ORDER BY last_updated DESC, id DESC
             LIMIT ?2"
        ))?;

        let samples = stmt
            .query_map(params![entity_id, limit], sample_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(samples)
    }

    /// Number of stored samples for one entity
    pub fn count_for(&self, entity_id: &str) -> StoreResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM entity_history WHERE entity_id = ?1",
            params![entity_id],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Distinct entity ids present in the store
    pub fn known_entities(&self) -> StoreResult<BTreeSet<String>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT entity_id FROM entity_history ORDER BY entity_id")?;

        let entities = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(entities)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        let conn = self.connect()?;
        let stats = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT entity_id), MIN(last_updated), MAX(last_updated)
             FROM entity_history",
            [],
            |row| {
                Ok(StoreStats {
                    total_records: u64::try_from(row.get::<_, i64>(0)?).unwrap_or_default(),
                    unique_entities: u64::try_from(row.get::<_, i64>(1)?).unwrap_or_default(),
                    earliest_record: row.get(2)?,
                    latest_record: row.get(3)?,
                })
            },
        )?;

        Ok(stats)
    }
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<StateSample> {
    Ok(StateSample {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        state: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        last_changed: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        last_updated: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        timestamp: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        recorded_at: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}
