//! JSON export/import of highlight lists via the clipboard.

use crate::error::StoreError;
use crate::store::parse_highlights;
use marginalia_core::Highlight;

/// A text clipboard.
pub trait Clipboard {
    /// Current clipboard text.
    fn read_text(&mut self) -> Result<String, StoreError>;

    /// Replace the clipboard text.
    fn write_text(&mut self, text: &str) -> Result<(), StoreError>;
}

/// Process-local clipboard, for tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
}

impl MemoryClipboard {
    /// Empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clipboard pre-filled with `text`.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            contents: Some(text.into()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, StoreError> {
        self.contents
            .clone()
            .ok_or_else(|| StoreError::Clipboard("clipboard is empty".to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<(), StoreError> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// The operating system clipboard.
#[cfg(feature = "system-clipboard")]
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

#[cfg(feature = "system-clipboard")]
impl SystemClipboard {
    /// Connect to the system clipboard.
    pub fn new() -> Result<Self, StoreError> {
        let inner = arboard::Clipboard::new().map_err(|e| StoreError::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Result<String, StoreError> {
        self.inner
            .get_text()
            .map_err(|e| StoreError::Clipboard(e.to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<(), StoreError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| StoreError::Clipboard(e.to_string()))
    }
}

/// Serialize the whole list as pretty-printed JSON.
pub fn export_json(highlights: &[Highlight]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(highlights)?)
}

/// Parse an exported list. Anything but an array of highlights is rejected.
pub fn import_json(json: &str) -> Result<Vec<Highlight>, StoreError> {
    parse_highlights(json)
}

/// Replace `highlights` with the list in `json`, or leave it untouched and return the error.
pub fn import_into(json: &str, highlights: &mut Vec<Highlight>) -> Result<usize, StoreError> {
    match import_json(json) {
        Ok(imported) => {
            *highlights = imported;
            Ok(highlights.len())
        }
        Err(err) => {
            tracing::warn!(%err, "rejected highlight import");
            Err(err)
        }
    }
}

/// Write the list to the clipboard.
pub fn export_to_clipboard(
    clipboard: &mut dyn Clipboard,
    highlights: &[Highlight],
) -> Result<(), StoreError> {
    let json = export_json(highlights)?;
    clipboard.write_text(&json)
}

/// Read a list from the clipboard.
pub fn import_from_clipboard(clipboard: &mut dyn Clipboard) -> Result<Vec<Highlight>, StoreError> {
    let text = clipboard.read_text()?;
    import_json(&text).inspect_err(|err| tracing::warn!(%err, "rejected clipboard import"))
}
