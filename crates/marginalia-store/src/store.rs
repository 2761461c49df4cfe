//! Per-document highlight persistence.
//!
//! Highlights are stored as one JSON array per document under `key_prefix + document_id`.
//! Loading never fails: a missing, unreadable or non-array payload reads as "no highlights" and
//! is logged, and a single element that does not parse is dropped without losing the rest. Saving reports errors so the host can show a transient notice; the session's
//! in-memory list stays the source of truth either way.

use crate::error::StoreError;
use crate::kv::KeyValueStore;
use marginalia_core::{Highlight, ReaderChangeType, ReaderSession, SurfaceTree};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prepended to the document id to form the storage key.
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "marginalia:highlights:".to_string(),
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn json_array(json: &str) -> Result<Vec<serde_json::Value>, StoreError> {
    match serde_json::from_str(json)? {
        serde_json::Value::Array(items) => Ok(items),
        _ => Err(StoreError::NotAnArray),
    }
}

/// Parse a JSON array of highlights, rejecting anything else as a whole.
pub fn parse_highlights(json: &str) -> Result<Vec<Highlight>, StoreError> {
    json_array(json)?
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|err| StoreError::Malformed {
                index,
                message: err.to_string(),
            })
        })
        .collect()
}

/// Parse a JSON array of highlights, dropping elements that do not parse.
///
/// Only a payload that is not JSON or not an array is an error. Each dropped element is logged.
pub fn parse_highlights_lenient(json: &str) -> Result<Vec<Highlight>, StoreError> {
    let items = json_array(json)?;
    let mut highlights = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(highlight) => highlights.push(highlight),
            Err(err) => tracing::warn!(index, %err, "skipping malformed highlight"),
        }
    }
    Ok(highlights)
}

/// Load/save highlight lists through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct AnnotationStore<K: KeyValueStore> {
    backend: K,
    config: StoreConfig,
}

impl<K: KeyValueStore> AnnotationStore<K> {
    /// Store with default settings.
    pub fn new(backend: K) -> Self {
        Self::with_config(backend, StoreConfig::default())
    }

    /// Store with explicit settings.
    pub fn with_config(backend: K, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// Storage key for a document.
    pub fn key_for(&self, document_id: &str) -> String {
        format!("{}{}", self.config.key_prefix, document_id)
    }

    /// Highlights saved for `document_id`.
    ///
    /// Empty when the payload is missing, unreadable or not an array; elements that fail to
    /// parse are skipped.
    pub fn load(&self, document_id: &str) -> Vec<Highlight> {
        let key = self.key_for(document_id);
        let raw = match self.backend.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(%key, %err, "failed to read highlights");
                return Vec::new();
            }
        };
        match parse_highlights_lenient(&raw) {
            Ok(highlights) => highlights,
            Err(err) => {
                tracing::warn!(%key, %err, "ignoring malformed highlight payload");
                Vec::new()
            }
        }
    }

    /// Persist the whole list for `document_id`.
    pub fn save(&mut self, document_id: &str, highlights: &[Highlight]) -> Result<(), StoreError> {
        let key = self.key_for(document_id);
        let json = serde_json::to_string(highlights)?;
        if let Err(err) = self.backend.set(&key, &json) {
            tracing::warn!(%key, %err, "failed to save highlights");
            return Err(err);
        }
        tracing::debug!(%key, count = highlights.len(), "highlights saved");
        Ok(())
    }

    /// Delete the saved list for `document_id`.
    pub fn forget(&mut self, document_id: &str) -> Result<(), StoreError> {
        let key = self.key_for(document_id);
        self.backend.remove(&key)
    }

    /// The underlying backend.
    pub fn backend(&self) -> &K {
        &self.backend
    }
}

/// Save the session's highlights to `store` on every highlight change.
///
/// Save failures go to `on_error` (for a transient notice); they never affect the session.
pub fn attach_autosave<T, K, F>(
    session: &mut ReaderSession<T>,
    store: Arc<Mutex<AnnotationStore<K>>>,
    document_id: impl Into<String>,
    mut on_error: F,
) where
    T: SurfaceTree,
    K: KeyValueStore + Send + 'static,
    F: FnMut(StoreError) + Send + 'static,
{
    let document_id = document_id.into();
    session.subscribe(move |change| {
        if change.change_type != ReaderChangeType::HighlightsChanged {
            return;
        }
        let Some(highlights) = change.highlights.as_ref() else {
            return;
        };
        let result = match store.lock() {
            Ok(mut store) => store.save(&document_id, highlights),
            Err(_) => Err(StoreError::Io(std::io::Error::other("annotation store lock poisoned"))),
        };
        if let Err(err) = result {
            on_error(err);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use marginalia_core::HighlightColor;

    #[test]
    fn test_parse_rejects_non_arrays_and_bad_items() {
        assert!(matches!(parse_highlights(r#"{"not":"an array"}"#), Err(StoreError::NotAnArray)));
        assert!(matches!(parse_highlights("nope"), Err(StoreError::Json(_))));
        assert!(matches!(
            parse_highlights(r#"[{"id":"a","start":0,"end":1,"color":"gold","text":"x"},{"id":3}]"#),
            Err(StoreError::Malformed { index: 1, .. })
        ));
        assert_eq!(parse_highlights("[]").unwrap(), Vec::<Highlight>::new());
    }

    #[test]
    fn test_load_missing_and_malformed_is_empty() {
        let mut backend = MemoryStore::new();
        backend.set("marginalia:highlights:bad", "{broken").unwrap();
        let store = AnnotationStore::new(backend);
        assert!(store.load("missing").is_empty());
        assert!(store.load("bad").is_empty());
    }

    #[test]
    fn test_load_skips_only_the_bad_element() {
        let raw = r#"[
            {"id":"a","start":0,"end":3,"color":"gold","text":"The"},
            {"id":"b","start":4,"end":9,"color":"mint","text":"quick"},
            {"id":"c","start":10,"end":15,"color":"teal","text":"brown"}
        ]"#;
        let mut backend = MemoryStore::new();
        backend.set("marginalia:highlights:doc", raw).unwrap();
        let store = AnnotationStore::new(backend);

        let ids: Vec<String> = store.load("doc").into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert!(parse_highlights(raw).is_err());
        assert!(matches!(parse_highlights_lenient(r#"{"a":1}"#), Err(StoreError::NotAnArray)));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = AnnotationStore::with_config(
            MemoryStore::new(),
            StoreConfig {
                key_prefix: "hl/".to_string(),
            },
        );
        let list = vec![Highlight::new("a", 0, 3, HighlightColor::Violet, "The")];
        store.save("doc", &list).unwrap();
        assert!(store.backend().get("hl/doc").unwrap().is_some());
        assert_eq!(store.load("doc"), list);

        store.forget("doc").unwrap();
        assert!(store.load("doc").is_empty());
    }

    #[test]
    fn test_config_defaults() {
        assert_eq!(StoreConfig::from_json("{}").unwrap(), StoreConfig::default());
        assert_eq!(StoreConfig::default().key_prefix, "marginalia:highlights:");
    }
}
