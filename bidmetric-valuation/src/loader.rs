//! Reference data loading.
//!
//! Reads locality profiles and price history from a data directory:
//!
//! - `localities.json`: array of [`LocalityProfile`]
//! - `historical_prices.json`: array of [`HistoricalRecord`]
//!
//! A missing profile file falls back to the built-in MMR table and a missing
//! history file to an empty series. Unreadable files are I/O errors and
//! malformed files make the reference data unavailable.

use std::path::Path;

use bidmetric_common::{Error, Result};
use serde::de::DeserializeOwned;

use crate::locality::{LocalityProfile, LocalityProfileStore};
use crate::snapshot::ReferenceSnapshot;
use crate::types::HistoricalRecord;

pub const LOCALITIES_FILE: &str = "localities.json";
pub const HISTORY_FILE: &str = "historical_prices.json";

/// Load a snapshot with the given version from `data_dir`.
pub fn load_snapshot(data_dir: &Path, version: u64) -> Result<ReferenceSnapshot> {
    let context = || format!("Failed to load reference data from {}", data_dir.display());
    let profiles = load_profiles(data_dir).map_err(|e| e.context(context()))?;
    let history = load_history(data_dir).map_err(|e| e.context(context()))?;

    tracing::info!(
        data_dir = %data_dir.display(),
        version,
        localities = profiles.len(),
        observations = history.len(),
        "Loaded reference data"
    );

    Ok(ReferenceSnapshot::new(version, profiles, history))
}

/// Load locality profiles, or the built-in table when the file is absent.
pub fn load_profiles(data_dir: &Path) -> Result<LocalityProfileStore> {
    match read_json::<Vec<LocalityProfile>>(&data_dir.join(LOCALITIES_FILE))? {
        Some(profiles) => Ok(LocalityProfileStore::new(profiles)),
        None => {
            tracing::debug!(
                data_dir = %data_dir.display(),
                "No locality file, using built-in profiles"
            );
            Ok(LocalityProfileStore::mmr_default())
        }
    }
}

/// Load price history, or an empty series when the file is absent.
pub fn load_history(data_dir: &Path) -> Result<Vec<HistoricalRecord>> {
    let history = read_json::<Vec<HistoricalRecord>>(&data_dir.join(HISTORY_FILE))?;
    if history.is_none() {
        tracing::debug!(data_dir = %data_dir.display(), "No price history file");
    }
    Ok(history.unwrap_or_default())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::from(e).context(format!("Failed to read {}", path.display())))?;
    let value = serde_json::from_str(&content).map_err(|e| {
        Error::DataUnavailable(format!("{} is not valid reference data: {e}", path.display()))
    })?;

    Ok(Some(value))
}
