//! Reader session: state manager for one open document.
//!
//! # Overview
//!
//! [`ReaderSession`] owns the rendered surface, the highlight list, the current selection
//! proposal and the search state. Every mutation goes through it, so it can keep the overlays
//! in sync and notify subscribers:
//!
//! 1. The host reports a selection ([`capture_selection`](ReaderSession::capture_selection)),
//!    optionally adjusts it, then commits it with a color.
//! 2. The session updates the highlight list and re-runs the overlay renderer.
//! 3. The version number is incremented and every subscribed callback receives a
//!    [`ReaderChange`].
//!
//! # Example
//!
//! ```rust
//! use marginalia_core::{
//!     EngineConfig, HighlightColor, LiveSelection, ReaderChangeType, ReaderSession, Surface,
//!     SurfacePoint, SurfaceTree,
//! };
//!
//! let surface = Surface::from_paragraphs(&["The quick brown fox."]);
//! let text_node = surface.children(surface.children(surface.root())[0])[0];
//! let mut session = ReaderSession::new(surface, EngineConfig::default());
//!
//! session.subscribe(|change| {
//!     if change.change_type == ReaderChangeType::HighlightsChanged {
//!         println!("now {} highlights", change.highlights.as_ref().map_or(0, |h| h.len()));
//!     }
//! });
//!
//! let selection = LiveSelection::new(
//!     SurfacePoint::new(text_node, 4),
//!     SurfacePoint::new(text_node, 9),
//! );
//! session.capture_selection(&selection, None).unwrap();
//! let id = session.commit_proposal(HighlightColor::Gold).unwrap();
//! assert_eq!(session.highlight(&id).unwrap().text, "quick");
//! ```

use crate::boundary::{self, AdjustOutcome, Adjustment};
use crate::config::EngineConfig;
use crate::highlight::{self, Highlight, HighlightColor};
use crate::index::TextIndex;
use crate::offsets::{
    LiveSelection, OffsetError, OffsetRange, Point, Region, RegionGeometry, capture_offsets,
    materialize_region, normalize_offsets, range_position,
};
use crate::overlay::{OverlayReport, render_highlights, render_search_hits};
use crate::search::{SearchHit, SearchOptions, SearchState};
use crate::surface::{Surface, SurfaceTree};
use std::sync::Arc;
use thiserror::Error;

/// The user's in-progress selection and any pending highlight action.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionProposal {
    /// Selected text.
    pub text: String,
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Id of the highlight the selection lies within, for "edit existing".
    pub highlight_id: Option<String>,
    /// Color of that highlight.
    pub color: Option<HighlightColor>,
    /// Where to anchor the action menu, when geometry was available.
    pub position: Option<Point>,
}

impl SelectionProposal {
    /// The proposed range.
    pub fn range(&self) -> OffsetRange {
        OffsetRange::new(self.start, self.end)
    }
}

/// Why an open proposal was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// The surface scrolled.
    Scroll,
    /// The user clicked outside the proposal UI.
    ClickOutside,
    /// The host dismissed it programmatically.
    Explicit,
}

/// Session change type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderChangeType {
    /// Highlight list replaced or edited
    HighlightsChanged,
    /// Selection proposal created, moved or dropped
    ProposalChanged,
    /// Search query, hits or active hit changed
    SearchChanged,
    /// A new surface was supplied
    SurfaceReplaced,
}

/// Session change record
#[derive(Debug, Clone)]
pub struct ReaderChange {
    /// Change type
    pub change_type: ReaderChangeType,
    /// Old version number
    pub old_version: u64,
    /// New version number
    pub new_version: u64,
    /// Snapshot of the highlight list (highlight changes only)
    pub highlights: Option<Arc<Vec<Highlight>>>,
}

/// Session change callback function type
pub type ReaderChangeCallback = Box<dyn FnMut(&ReaderChange) + Send>;

/// Errors returned by session operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no selection proposal is open")]
    /// The operation needs an open proposal.
    NoProposal,
    #[error("the open proposal is not attached to a highlight")]
    /// The operation needs a proposal pre-filled from an existing highlight.
    NotAHighlight,
    #[error("unknown highlight: {0}")]
    /// No highlight with this id.
    UnknownHighlight(String),
    #[error("offsets cannot be located on the current surface")]
    /// The offsets do not resolve against the surface.
    Unlocatable,
    #[error("selection is empty after trimming whitespace")]
    /// The normalized selection has no content.
    EmptySelection,
    #[error(transparent)]
    /// Capturing offsets from the live selection failed.
    Offset(#[from] OffsetError),
}

/// State manager for one open document.
pub struct ReaderSession<T: SurfaceTree = Surface> {
    surface: T,
    index: TextIndex,
    highlights: Vec<Highlight>,
    proposal: Option<SelectionProposal>,
    search: SearchState,
    config: EngineConfig,
    version: u64,
    callbacks: Vec<ReaderChangeCallback>,
    highlight_report: OverlayReport,
    search_report: OverlayReport,
}

impl<T: SurfaceTree> ReaderSession<T> {
    /// Create a session over `surface` with no highlights.
    pub fn new(surface: T, config: EngineConfig) -> Self {
        let index = TextIndex::build(&surface);
        Self {
            surface,
            index,
            highlights: Vec::new(),
            proposal: None,
            search: SearchState::new(),
            config,
            version: 0,
            callbacks: Vec::new(),
            highlight_report: OverlayReport::default(),
            search_report: OverlayReport::default(),
        }
    }

    /// Seed the highlight list (e.g. from storage) and render it. Does not notify.
    pub fn with_highlights(mut self, highlights: Vec<Highlight>) -> Self {
        self.highlights = highlights;
        self.rerender_highlights();
        self
    }

    /// The surface, including overlay markers.
    pub fn surface(&self) -> &T {
        &self.surface
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The full text of the current surface.
    pub fn full_text(&self) -> &str {
        self.index.text()
    }

    /// Swap in a re-rendered surface.
    ///
    /// Offsets stay valid across re-renders of the same text; the open proposal does not (its
    /// region belonged to the old tree) and is dropped. Both overlay layers are re-applied and
    /// the search is re-run over the new text.
    pub fn replace_surface(&mut self, surface: T) {
        self.surface = surface;
        self.proposal = None;
        self.index = TextIndex::build(&self.surface);
        self.search.recompute(self.index.text(), self.config.min_query_chars);
        self.rerender_highlights();
        self.rerender_search();
        self.notify(ReaderChangeType::SurfaceReplaced);
    }

    // ----- Selection -----

    /// Turn a live selection into a proposal.
    ///
    /// Whitespace at either end is trimmed. A selection that trims to nothing drops any open
    /// proposal and returns [`SessionError::EmptySelection`].
    pub fn capture_selection(
        &mut self,
        selection: &LiveSelection,
        geometry: Option<&dyn RegionGeometry>,
    ) -> Result<&SelectionProposal, SessionError> {
        let raw = capture_offsets(&self.surface, &self.index, selection)?;
        self.propose(raw.start, raw.end, geometry)
    }

    /// Propose the word under `offset` (tap / double-click).
    pub fn select_word_at(
        &mut self,
        offset: usize,
        geometry: Option<&dyn RegionGeometry>,
    ) -> Result<&SelectionProposal, SessionError> {
        let word = boundary::word_at(self.index.text(), offset).ok_or(SessionError::Unlocatable)?;
        self.propose(word.start, word.end, geometry)
    }

    /// Apply a boundary adjustment to the open proposal.
    ///
    /// [`AdjustOutcome::Unchanged`] means no further movement in that direction; the proposal
    /// is left as it was and no event fires.
    pub fn adjust_proposal(
        &mut self,
        adjustment: Adjustment,
        geometry: Option<&dyn RegionGeometry>,
    ) -> Result<AdjustOutcome, SessionError> {
        let current = self.proposal.as_ref().ok_or(SessionError::NoProposal)?;
        let range = current.range();
        let target = (current.highlight_id.clone(), current.color);
        let outcome = boundary::adjust(self.index.text(), range.start, range.end, adjustment);
        if let AdjustOutcome::Changed(range) = outcome {
            self.propose(range.start, range.end, geometry)?;
            // An edit of an existing highlight stays an edit of that highlight.
            if let (Some(id), Some(proposal)) = (target.0, self.proposal.as_mut()) {
                proposal.highlight_id = Some(id);
                proposal.color = target.1;
            }
        } else {
            tracing::debug!(?adjustment, "boundary adjustment made no progress");
        }
        Ok(outcome)
    }

    /// The open proposal.
    pub fn proposal(&self) -> Option<&SelectionProposal> {
        self.proposal.as_ref()
    }

    /// Region covering the open proposal on the current surface, for re-selecting it.
    pub fn proposal_region(&self) -> Option<Region> {
        let proposal = self.proposal.as_ref()?;
        materialize_region(&self.index, proposal.start, proposal.end)
    }

    /// Drop the open proposal. Returns `false` if none was open.
    pub fn dismiss_proposal(&mut self, reason: DismissReason) -> bool {
        if self.proposal.take().is_none() {
            return false;
        }
        tracing::debug!(?reason, "selection proposal dismissed");
        self.notify(ReaderChangeType::ProposalChanged);
        true
    }

    fn propose(
        &mut self,
        start: usize,
        end: usize,
        geometry: Option<&dyn RegionGeometry>,
    ) -> Result<&SelectionProposal, SessionError> {
        let range = normalize_offsets(self.index.text(), start, end);
        if range.is_empty() {
            if self.proposal.take().is_some() {
                self.notify(ReaderChangeType::ProposalChanged);
            }
            return Err(SessionError::EmptySelection);
        }

        let existing = highlight::containing(&self.highlights, range);
        let position = geometry.and_then(|geometry| {
            let region = materialize_region(&self.index, range.start, range.end)?;
            range_position(geometry, &region, &self.config)
        });

        self.proposal = Some(SelectionProposal {
            text: self.index.slice(range.start, range.end).to_string(),
            start: range.start,
            end: range.end,
            highlight_id: existing.map(|h| h.id.clone()),
            color: existing.map(|h| h.color),
            position,
        });
        self.notify(ReaderChangeType::ProposalChanged);
        self.proposal.as_ref().ok_or(SessionError::NoProposal)
    }

    // ----- Highlights -----

    /// Commit the open proposal with `color`, returning the highlight id.
    ///
    /// A proposal that came from an existing highlight recolors/moves that highlight, keeping its
    /// note and unknown fields.
    pub fn commit_proposal(&mut self, color: HighlightColor) -> Result<String, SessionError> {
        let proposal = self.proposal.take().ok_or(SessionError::NoProposal)?;
        let id = proposal
            .highlight_id
            .clone()
            .unwrap_or_else(highlight::new_highlight_id);

        let mut record = Highlight::new(id.clone(), proposal.start, proposal.end, color, proposal.text);
        if let Some(previous) = self.highlights.iter().find(|h| h.id == id) {
            record.note = previous.note.clone();
            record.extra = previous.extra.clone();
        }
        highlight::upsert(&mut self.highlights, record);
        tracing::debug!(%id, %color, "highlight committed");

        self.notify(ReaderChangeType::ProposalChanged);
        self.highlights_changed();
        Ok(id)
    }

    /// Remove the highlight the open proposal points at, closing the proposal.
    pub fn remove_proposed_highlight(&mut self) -> Result<Highlight, SessionError> {
        let id = self
            .proposal
            .as_ref()
            .ok_or(SessionError::NoProposal)?
            .highlight_id
            .clone()
            .ok_or(SessionError::NotAHighlight)?;
        let removed = self.remove_highlight(&id)?;
        self.proposal = None;
        self.notify(ReaderChangeType::ProposalChanged);
        Ok(removed)
    }

    /// Remove a highlight by id.
    pub fn remove_highlight(&mut self, id: &str) -> Result<Highlight, SessionError> {
        let removed = highlight::remove(&mut self.highlights, id)
            .ok_or_else(|| SessionError::UnknownHighlight(id.to_string()))?;
        tracing::debug!(%id, "highlight removed");
        self.highlights_changed();
        Ok(removed)
    }

    /// Set or clear the note on a highlight. Blank notes are stored as no note.
    pub fn set_note(&mut self, id: &str, note: Option<String>) -> Result<(), SessionError> {
        let record = self
            .highlights
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| SessionError::UnknownHighlight(id.to_string()))?;
        record.note = note.filter(|n| !n.trim().is_empty());
        self.highlights_changed();
        Ok(())
    }

    /// Remove every highlight.
    pub fn clear_highlights(&mut self) {
        if self.highlights.is_empty() {
            return;
        }
        self.highlights.clear();
        self.highlights_changed();
    }

    /// Replace the whole list (import, reload from storage).
    pub fn replace_highlights(&mut self, highlights: Vec<Highlight>) {
        self.highlights = highlights;
        self.highlights_changed();
    }

    /// All highlights, unordered.
    pub fn highlights(&self) -> &[Highlight] {
        &self.highlights
    }

    /// Highlight by id.
    pub fn highlight(&self, id: &str) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    /// First highlight covering `offset`.
    pub fn highlight_at(&self, offset: usize) -> Option<&Highlight> {
        highlight::sorted_by_start(&self.highlights)
            .into_iter()
            .find(|h| h.start <= offset && offset < h.end)
    }

    fn highlights_changed(&mut self) {
        self.rerender_highlights();
        self.notify(ReaderChangeType::HighlightsChanged);
    }

    // ----- Search -----

    /// Run a new query (or re-run with new options) and render its hits.
    pub fn set_search(&mut self, query: &str, options: SearchOptions) -> &[SearchHit] {
        self.search.set_query(query, options);
        self.search.recompute(self.index.text(), self.config.min_query_chars);
        self.rerender_search();
        self.notify(ReaderChangeType::SearchChanged);
        self.search.hits()
    }

    /// Move to the next hit, wrapping to the first.
    pub fn next_hit(&mut self) -> Option<SearchHit> {
        let hit = self.search.next_hit();
        self.search_moved();
        hit
    }

    /// Move to the previous hit, wrapping to the last.
    pub fn prev_hit(&mut self) -> Option<SearchHit> {
        let hit = self.search.prev_hit();
        self.search_moved();
        hit
    }

    fn search_moved(&mut self) {
        if self.search.hits().is_empty() {
            return;
        }
        self.rerender_search();
        self.notify(ReaderChangeType::SearchChanged);
    }

    /// Drop the query and remove hit overlays.
    pub fn clear_search(&mut self) {
        self.search.clear();
        self.rerender_search();
        self.notify(ReaderChangeType::SearchChanged);
    }

    /// Current search state.
    pub fn search(&self) -> &SearchState {
        &self.search
    }

    // ----- Overlays -----

    fn refresh_index(&mut self) {
        if !self.index.is_current(&self.surface) {
            self.index = TextIndex::build(&self.surface);
        }
    }

    fn rerender_highlights(&mut self) {
        self.highlight_report = render_highlights(&mut self.surface, &self.highlights, &self.config);
        self.refresh_index();
    }

    fn rerender_search(&mut self) {
        self.search_report = render_search_hits(
            &mut self.surface,
            self.search.hits(),
            self.search.current(),
            &self.config,
        );
        self.refresh_index();
    }

    /// Report of the most recent highlight overlay pass.
    pub fn last_highlight_report(&self) -> &OverlayReport {
        &self.highlight_report
    }

    /// Report of the most recent search overlay pass.
    pub fn last_search_report(&self) -> &OverlayReport {
        &self.search_report
    }

    // ----- Notifications -----

    /// Subscribe to session change notifications
    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&ReaderChange) + Send + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Get current version number
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Check if state has changed since a version
    pub fn has_changed_since(&self, version: u64) -> bool {
        self.version > version
    }

    fn notify(&mut self, change_type: ReaderChangeType) {
        let old_version = self.version;
        self.version += 1;
        let highlights = (change_type == ReaderChangeType::HighlightsChanged)
            .then(|| Arc::new(self.highlights.clone()));
        let change = ReaderChange {
            change_type,
            old_version,
            new_version: self.version,
            highlights,
        };
        for callback in &mut self.callbacks {
            callback(&change);
        }
    }
}
