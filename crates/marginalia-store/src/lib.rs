#![warn(missing_docs)]
//! Persistence and clipboard integration for `marginalia-core`.
//!
//! - [`kv`] - key-value backends ([`MemoryStore`], [`FileStore`])
//! - [`store`] - per-document load/save and autosave wiring
//! - [`clipboard`] - JSON export/import through a [`Clipboard`]
//!
//! ```rust
//! use marginalia_core::{EngineConfig, ReaderSession, Surface};
//! use marginalia_store::{AnnotationStore, MemoryStore, attach_autosave};
//! use std::sync::{Arc, Mutex};
//!
//! let store = Arc::new(Mutex::new(AnnotationStore::new(MemoryStore::new())));
//! let saved = store.lock().unwrap().load("chapter-1");
//!
//! let surface = Surface::from_paragraphs(&["Call me Ishmael."]);
//! let mut session = ReaderSession::new(surface, EngineConfig::default()).with_highlights(saved);
//! attach_autosave(&mut session, store.clone(), "chapter-1", |err| eprintln!("{err}"));
//! ```

pub mod clipboard;
mod error;
pub mod kv;
pub mod store;

#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{
    Clipboard, MemoryClipboard, export_json, export_to_clipboard, import_from_clipboard,
    import_into, import_json,
};
pub use error::StoreError;
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use store::{
    AnnotationStore, StoreConfig, attach_autosave, parse_highlights, parse_highlights_lenient,
};
