//! Persisted export preferences.
//!
//! Quality, orientation, and page size survive across sessions as a small
//! JSON document in the [`KvStore`]. Missing or malformed data silently
//! falls back to the built-in defaults (high / portrait / a4) with a
//! warning log — a corrupt preferences file must never block an export.

use crate::config::{ExportSettings, Orientation, PageSize, Quality};
use crate::storage::KvStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Store key for the persisted settings document.
pub const SETTINGS_KEY: &str = "pdf_settings";

/// Wire shape of the persisted document.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSettings {
    quality: Quality,
    orientation: Orientation,
    page_size: PageSize,
    timestamp: DateTime<Utc>,
}

/// Loads and saves export defaults through an injected [`KvStore`].
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KvStore>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Load the persisted defaults, falling back to built-ins on any problem.
    pub fn load_defaults(&self) -> ExportSettings {
        let Some(raw) = self.store.get(SETTINGS_KEY) else {
            debug!("No persisted settings, using defaults");
            return ExportSettings::default();
        };
        match serde_json::from_str::<PersistedSettings>(&raw) {
            Ok(p) => ExportSettings {
                quality: p.quality,
                orientation: p.orientation,
                page_size: p.page_size,
                ..ExportSettings::default()
            },
            Err(e) => {
                warn!("Ignoring malformed persisted settings: {}", e);
                ExportSettings::default()
            }
        }
    }

    /// Persist the given settings (best-effort).
    pub fn save(&self, settings: &ExportSettings) {
        let doc = PersistedSettings {
            quality: settings.quality,
            orientation: settings.orientation,
            page_size: settings.page_size,
            timestamp: Utc::now(),
        };
        match serde_json::to_string(&doc) {
            Ok(json) => self.store.put(SETTINGS_KEY, json),
            Err(e) => warn!("Failed to serialise settings: {}", e),
        }
    }
}
