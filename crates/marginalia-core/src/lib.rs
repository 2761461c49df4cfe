#![warn(missing_docs)]
//! Marginalia Core - Headless Text Annotation Engine
//!
//! # Overview
//!
//! `marginalia-core` turns a user's selection over rendered prose into stable character offsets,
//! persists nothing itself, and draws highlights and search hits back onto the rendered tree as
//! wrapper elements. It does not parse markup or lay out pages: the host hands it an already
//! built text tree (anything implementing [`SurfaceTree`]) and, optionally, region geometry.
//!
//! # Core Features
//!
//! - **Canonical Offsets**: highlights are `[start, end)` character ranges over the flattened
//!   text, stable across re-renders of the same content
//! - **Selection Mapping**: live selection ↔ offsets, with whitespace trimming
//! - **Boundary Adjustment**: grow/shrink by word, expand to sentence or paragraph
//! - **Idempotent Overlays**: highlight and search-hit layers re-derived after every change,
//!   without nesting or fragmenting text
//! - **In-Page Search**: literal, case-insensitive by default, with wraparound navigation
//! - **State Tracking**: version numbers and change notifications via [`ReaderSession`]
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ReaderSession (state + notifications)      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Overlay Renderer (plan / patch)            │  ← Visual markers
//! ├──────────────────────┬──────────────────────┤
//! │  Boundary Adjuster   │  Search Engine       │  ← Pure text algorithms
//! ├──────────────────────┴──────────────────────┤
//! │  Offset Mapper                              │  ← Selection ↔ offsets
//! ├─────────────────────────────────────────────┤
//! │  Text Indexer (TextIndex)                   │  ← Full text + node table
//! ├─────────────────────────────────────────────┤
//! │  SurfaceTree (arena Surface)                │  ← Rendered tree
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use marginalia_core::{EngineConfig, Highlight, HighlightColor, ReaderSession, Surface};
//!
//! let surface = Surface::from_paragraphs(&["The quick brown fox.", "It jumps."]);
//! let saved = vec![Highlight::new("h1", 4, 9, HighlightColor::Mint, "quick")];
//! let session = ReaderSession::new(surface, EngineConfig::default()).with_highlights(saved);
//!
//! assert_eq!(session.full_text(), "The quick brown fox.\n\nIt jumps.");
//! assert!(session.surface().to_markup().contains("data-highlight=\"h1\""));
//! ```
//!
//! # Module Description
//!
//! - [`surface`] - Rendered tree trait and arena implementation
//! - [`index`] - Full text and node-to-offset table
//! - [`offsets`] - Selection capture, region materialization, normalization
//! - [`boundary`] - Word / sentence / paragraph adjustments
//! - [`overlay`] - Highlight and search-hit overlay layers
//! - [`search`] - Query compilation, hits and navigation
//! - [`highlight`] - Highlight records and list operations
//! - [`session`] - State management and change notifications
//! - [`config`] - Engine configuration

pub mod boundary;
pub mod config;
pub mod highlight;
pub mod index;
pub mod offsets;
pub mod overlay;
pub mod search;
pub mod session;
pub mod surface;
mod text;

pub use boundary::{AdjustOutcome, Adjustment};
pub use config::EngineConfig;
pub use highlight::{Highlight, HighlightColor, UnknownColor};
pub use index::{TextIndex, TextSpan, full_text};
pub use offsets::{
    LiveSelection, OffsetError, OffsetRange, Point, Rect, Region, RegionGeometry, SurfacePoint,
    normalize_offsets,
};
pub use overlay::{OverlayPlan, OverlayReport, OverlaySpan};
pub use search::{Direction, SearchHit, SearchOptions, SearchState};
pub use session::{
    DismissReason, ReaderChange, ReaderChangeCallback, ReaderChangeType, ReaderSession,
    SelectionProposal, SessionError,
};
pub use surface::{Marker, NodeId, OverlayKind, Surface, SurfaceTree};
