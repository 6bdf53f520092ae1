//! Named settings behind an injected store.
//!
//! The host decides where presets live; the core only needs a
//! [`PresetStore`]. [`MemoryPresetStore`] covers tests and session-local use.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::settings::CurveSettings;

/// Error types for preset lookup and storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    /// No preset with this name.
    #[error("Preset not found: {0}")]
    NotFound(String),

    /// Presets need a non-blank name.
    #[error("Preset name is empty")]
    EmptyName,
}

/// A named set of curve settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePreset {
    pub name: String,
    #[serde(default)]
    pub settings: CurveSettings,
}

impl CurvePreset {
    pub fn new(name: impl Into<String>, settings: CurveSettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }
}

/// Key-value storage for presets, keyed by name.
pub trait PresetStore {
    fn get(&self, name: &str) -> Option<CurvePreset>;

    /// Store a preset under its (trimmed) name, returning any preset it
    /// replaced.
    fn put(&mut self, preset: CurvePreset) -> Result<Option<CurvePreset>, PresetError>;

    fn remove(&mut self, name: &str) -> Option<CurvePreset>;

    /// All preset names, sorted.
    fn names(&self) -> Vec<String>;
}

/// In-memory [`PresetStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryPresetStore {
    presets: BTreeMap<String, CurvePreset>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl PresetStore for MemoryPresetStore {
    fn get(&self, name: &str) -> Option<CurvePreset> {
        self.presets.get(name.trim()).cloned()
    }

    fn put(&mut self, mut preset: CurvePreset) -> Result<Option<CurvePreset>, PresetError> {
        let name = preset.name.trim().to_string();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        debug!(name = %name, "Storing curve preset");
        preset.name = name.clone();
        Ok(self.presets.insert(name, preset))
    }

    fn remove(&mut self, name: &str) -> Option<CurvePreset> {
        self.presets.remove(name.trim())
    }

    fn names(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }
}
