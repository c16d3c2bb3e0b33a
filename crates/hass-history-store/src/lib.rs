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

//! Local SQLite store for Home Assistant entity history.
//!
//! Samples are deduplicated on `(entity_id, last_updated)`; a repeated pair is ignored
//! without error and never overwrites the stored row.

pub mod errors;
pub mod export;
pub mod store;
pub mod types;

pub use errors::{StoreError, StoreResult};
pub use store::{DEFAULT_DB_PATH, HistoryStore};
pub use types::{HistoryState, StateSample, StoreStats};
