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

use hass_history_store::{HistoryState, HistoryStore};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::errors::{HaError, HaResult};

const HISTORY_PATH: &str = "/api/history/period";

/// Result of a fetch that reached the server and was understood
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response carried history; `inserted` counts only rows new to the store
    Stored { groups: usize, inserted: usize },
    /// The server answered with an empty (or `null`) history
    NoData,
}

/// Per-entity results of [`HistoryClient::sync_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    pub inserted: usize,
}

/// Blocking Home Assistant history client feeding a [`HistoryStore`]
#[derive(Debug)]
pub struct HistoryClient {
    config: ClientConfig,
    client: Client,
    store: HistoryStore,
}

impl HistoryClient {
    pub fn new(config: ClientConfig, store: HistoryStore) -> HaResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| HaError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            store,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Fetch the default history window of `entity_id` and store it.
    ///
    /// Never fails: HTTP errors, empty results and any fault while requesting,
    /// parsing or inserting are logged and reported as `false`.
    pub fn fetch_and_store(&self, entity_id: &str) -> bool {
        self.sync_entity(entity_id).is_some()
    }

    /// Fetch and store every entity in order. A failing entity does not stop the rest.
    pub fn sync_all<S: AsRef<str>>(&self, entity_ids: &[S]) -> SyncReport {
        let mut report = SyncReport::default();
        for entity_id in entity_ids {
            let entity_id = entity_id.as_ref();
            match self.sync_entity(entity_id) {
                Some(inserted) => {
                    report.inserted += inserted;
                    report.succeeded.push(entity_id.to_owned());
                }
                None => report.failed.push(entity_id.to_owned()),
            }
        }

        info!(
            "✅ [HA SYNC] {}/{} entities synced, {} new records",
            report.succeeded.len(),
            entity_ids.len(),
            report.inserted
        );
        report
    }

    fn sync_entity(&self, entity_id: &str) -> Option<usize> {
        match self.try_fetch_and_store(entity_id) {
            Ok(FetchOutcome::Stored { groups, inserted }) => {
                info!("✅ [HA HISTORY] Data stored for entity: {}", entity_id);
                info!("   Total new records inserted: {} ({} groups)", inserted, groups);
                Some(inserted)
            }
            Ok(FetchOutcome::NoData) => {
                warn!("⚠️ [HA HISTORY] No data found for entity: {}", entity_id);
                None
            }
            Err(HaError::ApiError { status, message }) => {
                error!(
                    "❌ [HA HISTORY] Error fetching data for {}: HTTP {}",
                    entity_id, status
                );
                error!("   Response: {}", message);
                None
            }
            Err(e) => {
                error!("❌ [HA HISTORY] Error processing entity {}: {}", entity_id, e);
                None
            }
        }
    }

    /// Fallible core of [`HistoryClient::fetch_and_store`]
    pub fn try_fetch_and_store(&self, entity_id: &str) -> HaResult<FetchOutcome> {
        let Some(history) = self.fetch_history(entity_id)? else {
            return Ok(FetchOutcome::NoData);
        };

        let mut inserted = 0;
        for group in &history {
            inserted += self.store.insert(group)?;
        }

        Ok(FetchOutcome::Stored {
            groups: history.len(),
            inserted,
        })
    }

    /// Request the history of `entity_id` without storing it.
    ///
    /// The server groups samples per matched entity, hence the nested lists.
    /// Returns `None` when the body is `null` or an empty list.
    pub fn fetch_history(&self, entity_id: &str) -> HaResult<Option<Vec<Vec<HistoryState>>>> {
        let url = format!("{}{}", self.config.base_url, HISTORY_PATH);
        info!("📊 [HA HISTORY] Fetching data for entity: {}", entity_id);
        debug!("   URL: {}?filter_entity_id={}", url, entity_id);

        let response = self
            .client
            .get(&url)
            .query(&[("filter_entity_id", entity_id)])
            .bearer_auth(&self.config.token)
            .header(CONTENT_TYPE, "application/json")
            .send()?;

        let status = response.status();
        if !self.config.is_accepted(status) {
            return Err(HaError::ApiError {
                status: status.as_u16(),
                message: response.text().unwrap_or_default(),
            });
        }

        let body = response.text()?;
        let history: Option<Vec<Vec<HistoryState>>> = serde_json::from_str(&body)?;

        match history {
            Some(groups) if !groups.is_empty() => {
                debug!(
                    "   Received {} groups, {} samples",
                    groups.len(),
                    groups.iter().map(Vec::len).sum::<usize>()
                );
                Ok(Some(groups))
            }
            _ => Ok(None),
        }
    }
}
