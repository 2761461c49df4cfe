//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the annotation engine.
///
/// Every field has a default, so a partial JSON document (or `{}`) deserializes cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Queries shorter than this (in characters) produce no search hits.
    pub min_query_chars: usize,
    /// Vertical distance between a region's top edge and the floating action anchor.
    pub anchor_offset: f64,
    /// Skip (and report as stale) highlights whose snapshot text no longer matches the full
    /// text at their offsets.
    pub verify_snapshots: bool,
    /// Element tag used for highlight wrappers.
    pub highlight_tag: String,
    /// Element tag used for search hit wrappers.
    pub search_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_query_chars: 2,
            anchor_offset: 8.0,
            verify_snapshots: true,
            highlight_tag: "mark".to_string(),
            search_tag: "mark".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
