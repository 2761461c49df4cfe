//! Highlight records and list operations.

use crate::offsets::OffsetRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Palette of highlight colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    /// Default yellow.
    #[default]
    Gold,
    /// Green.
    Mint,
    /// Pink.
    Rose,
    /// Purple.
    Violet,
}

impl HighlightColor {
    /// Every color, in palette order.
    pub const ALL: [HighlightColor; 4] = [Self::Gold, Self::Mint, Self::Rose, Self::Violet];

    /// The serialized name of the color.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Mint => "mint",
            Self::Rose => "rose",
            Self::Violet => "violet",
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown color name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown highlight color: {0}")]
pub struct UnknownColor(pub String);

impl FromStr for HighlightColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownColor(s.to_string()))
    }
}

/// A persisted highlight.
///
/// `start`/`end` are character offsets into the full text; `text` is the snapshot of the
/// highlighted content at creation time. Unknown JSON fields survive a load/save round trip
/// through `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Unique identifier.
    pub id: String,
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Display color.
    pub color: HighlightColor,
    /// Snapshot of the highlighted text.
    pub text: String,
    /// Free-form note attached to the highlight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Fields this version does not know about.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Highlight {
    /// Create a highlight with no note and no extra fields.
    pub fn new(
        id: impl Into<String>,
        start: usize,
        end: usize,
        color: HighlightColor,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            color,
            text: text.into(),
            note: None,
            extra: serde_json::Map::new(),
        }
    }

    /// The offset range covered by this highlight.
    pub fn range(&self) -> OffsetRange {
        OffsetRange::new(self.start, self.end)
    }
}

/// Generate a fresh highlight id.
pub fn new_highlight_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Insert `record`, replacing any existing record with the same id.
///
/// The record is appended; replaced records lose their position.
pub fn upsert(list: &mut Vec<Highlight>, record: Highlight) {
    list.retain(|h| h.id != record.id);
    list.push(record);
}

/// Remove the record with `id`, returning it.
pub fn remove(list: &mut Vec<Highlight>, id: &str) -> Option<Highlight> {
    let pos = list.iter().position(|h| h.id == id)?;
    Some(list.remove(pos))
}

/// Records sorted by start offset (stable for equal starts).
pub fn sorted_by_start(list: &[Highlight]) -> Vec<&Highlight> {
    let mut sorted: Vec<&Highlight> = list.iter().collect();
    sorted.sort_by_key(|h| (h.start, h.end));
    sorted
}

/// The first record whose range contains `range` entirely.
pub fn containing(list: &[Highlight], range: OffsetRange) -> Option<&Highlight> {
    list.iter().find(|h| h.range().contains_range(range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_color_round_trip() {
        for color in HighlightColor::ALL {
            assert_eq!(color.as_str().parse::<HighlightColor>(), Ok(color));
        }
        assert!("teal".parse::<HighlightColor>().is_err());
        assert_eq!(serde_json::to_string(&HighlightColor::Rose).unwrap(), "\"rose\"");
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut list = Vec::new();
        upsert(&mut list, Highlight::new("a", 0, 3, HighlightColor::Gold, "The"));
        upsert(&mut list, Highlight::new("b", 4, 9, HighlightColor::Mint, "quick"));
        upsert(&mut list, Highlight::new("a", 0, 3, HighlightColor::Violet, "The"));

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "b");
        assert_eq!(list[1].color, HighlightColor::Violet);

        assert_eq!(remove(&mut list, "b").map(|h| h.start), Some(4));
        assert!(remove(&mut list, "b").is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_containing_and_sorting() {
        let list = vec![
            Highlight::new("late", 10, 15, HighlightColor::Gold, "brown"),
            Highlight::new("early", 0, 9, HighlightColor::Gold, "The quick"),
        ];
        assert_eq!(containing(&list, OffsetRange::new(4, 9)).map(|h| h.id.as_str()), Some("early"));
        assert!(containing(&list, OffsetRange::new(8, 11)).is_none());

        let sorted: Vec<&str> = sorted_by_start(&list).iter().map(|h| h.id.as_str()).collect();
        assert_eq!(sorted, vec!["early", "late"]);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let json = r#"{"id":"x","start":1,"end":2,"color":"gold","text":"h","createdAt":42}"#;
        let h: Highlight = serde_json::from_str(json).unwrap();
        assert_eq!(h.extra.get("createdAt"), Some(&serde_json::json!(42)));
        assert!(h.note.is_none());
        let back = serde_json::to_value(&h).unwrap();
        assert_eq!(back["createdAt"], 42);
        assert!(back.get("note").is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_highlight_id(), new_highlight_id());
    }
}
