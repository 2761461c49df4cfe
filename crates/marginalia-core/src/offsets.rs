//! Offset mapper: live selections, canonical offsets and materialized regions.
//!
//! A live selection is expressed in surface coordinates (node + local offset). It is converted
//! into a canonical half-open character range over the full text, which is what gets persisted.
//! The inverse direction materializes a [`Region`] on the current surface from a canonical range.

use crate::config::EngineConfig;
use crate::index::TextIndex;
use crate::surface::{NodeId, SurfaceTree};
use thiserror::Error;

/// A half-open canonical character range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OffsetRange {
    /// Inclusive start offset.
    pub start: usize,
    /// Exclusive end offset.
    pub end: usize,
}

impl OffsetRange {
    /// Create a new range.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if `other` lies entirely within this range.
    pub fn contains_range(&self, other: OffsetRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A position on the surface.
///
/// For text nodes `offset` is a character offset into the node's text. For elements it is a
/// child index (the point sits before that child; `children.len()` means after the last one).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfacePoint {
    /// Node holding the point.
    pub node: NodeId,
    /// Local offset (characters for text nodes, child index for elements).
    pub offset: usize,
}

impl SurfacePoint {
    /// Create a new point.
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A live selection as reported by the host (anchor = where it started, focus = where it ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveSelection {
    /// Where the selection started.
    pub anchor: SurfacePoint,
    /// Where the selection currently ends.
    pub focus: SurfacePoint,
}

impl LiveSelection {
    /// Create a selection from anchor to focus.
    pub fn new(anchor: SurfacePoint, focus: SurfacePoint) -> Self {
        Self { anchor, focus }
    }

    /// Returns `true` if anchor and focus coincide.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// A concrete span over the surface's text nodes.
///
/// Both endpoints sit inside text nodes. A region is only meaningful for the surface revision
/// it was materialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Start point (inside the text node containing the start offset).
    pub start: SurfacePoint,
    /// End point (inside the text node containing the end offset).
    pub end: SurfacePoint,
}

impl Region {
    /// View the region as a forward live selection.
    pub fn as_selection(&self) -> LiveSelection {
        LiveSelection::new(self.start, self.end)
    }
}

/// Errors produced while capturing offsets from a live selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    /// Anchor and focus resolve to the same canonical offset.
    #[error("selection is empty")]
    EmptySelection,
    /// A selection endpoint is not part of the surface.
    #[error("selection endpoint {0:?} lies outside the surface")]
    OutsideSurface(SurfacePoint),
}

/// Canonical offset of a surface point.
pub fn point_offset<T: SurfaceTree + ?Sized>(
    tree: &T,
    index: &TextIndex,
    point: SurfacePoint,
) -> Result<usize, OffsetError> {
    if !tree.contains(point.node) {
        return Err(OffsetError::OutsideSurface(point));
    }

    if tree.text(point.node).is_some() {
        let span = index
            .span_of(point.node)
            .ok_or(OffsetError::OutsideSurface(point))?;
        if point.offset > span.len() {
            return Err(OffsetError::OutsideSurface(point));
        }
        return Ok(span.start + point.offset);
    }

    if point.offset > tree.children(point.node).len() {
        return Err(OffsetError::OutsideSurface(point));
    }
    let mut acc = 0usize;
    element_point_offset(tree, tree.root(), point, &mut acc)
        .ok_or(OffsetError::OutsideSurface(point))
}

fn element_point_offset<T: SurfaceTree + ?Sized>(
    tree: &T,
    node: NodeId,
    target: SurfacePoint,
    acc: &mut usize,
) -> Option<usize> {
    if let Some(text) = tree.text(node) {
        *acc += text.chars().count();
        return None;
    }

    let children = tree.children(node);
    if node == target.node {
        for (idx, child) in children.iter().enumerate() {
            if idx == target.offset {
                return Some(*acc);
            }
            subtree_len(tree, *child, acc);
        }
        return Some(*acc);
    }

    for child in children {
        if let Some(found) = element_point_offset(tree, *child, target, acc) {
            return Some(found);
        }
    }
    None
}

fn subtree_len<T: SurfaceTree + ?Sized>(tree: &T, node: NodeId, acc: &mut usize) {
    if let Some(text) = tree.text(node) {
        *acc += text.chars().count();
        return;
    }
    for child in tree.children(node) {
        subtree_len(tree, *child, acc);
    }
}

/// Convert a live selection into a canonical range.
///
/// The start is the length of the text preceding the selection's first endpoint; the end adds
/// the length of the selected text. Backward selections (focus before anchor) are ordered.
pub fn capture_offsets<T: SurfaceTree + ?Sized>(
    tree: &T,
    index: &TextIndex,
    selection: &LiveSelection,
) -> Result<OffsetRange, OffsetError> {
    if selection.is_collapsed() {
        return Err(OffsetError::EmptySelection);
    }
    let anchor = point_offset(tree, index, selection.anchor)?;
    let focus = point_offset(tree, index, selection.focus)?;
    let (start, end) = if anchor <= focus {
        (anchor, focus)
    } else {
        (focus, anchor)
    };
    if start == end {
        return Err(OffsetError::EmptySelection);
    }
    let len = index.char_count();
    Ok(OffsetRange::new(start.min(len), end.min(len)))
}

/// Materialize a region over the current surface from canonical offsets.
///
/// Returns `None` when `start >= end`, when the surface has no text, or when either offset
/// cannot be located. A miss is recoverable: the caller keeps whatever selection it had.
pub fn materialize_region(index: &TextIndex, start: usize, end: usize) -> Option<Region> {
    if start >= end || index.spans().is_empty() {
        return None;
    }
    let (start_node, start_local) = index.locate(start)?;
    let (end_node, end_local) = index.locate_end(end)?;
    Some(Region {
        start: SurfacePoint::new(start_node, start_local),
        end: SurfacePoint::new(end_node, end_local),
    })
}

/// Trim whitespace from both ends of `[start, end)`.
///
/// Offsets are clamped into the text first. The result always satisfies `start <= end`; an
/// all-whitespace span collapses to `start == end`, which callers treat as "discard".
pub fn normalize_offsets(full_text: &str, start: usize, end: usize) -> OffsetRange {
    let chars: Vec<char> = full_text.chars().collect();
    normalize_chars(&chars, start, end)
}

pub(crate) fn normalize_chars(chars: &[char], start: usize, end: usize) -> OffsetRange {
    let mut end = end.min(chars.len());
    let mut start = start.min(end);
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    OffsetRange::new(start, end)
}

/// A point in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// An axis-aligned rectangle in host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Zero width or zero height (e.g. a range that only covers a line break).
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Geometry of materialized regions, provided by the layout collaborator.
pub trait RegionGeometry {
    /// Bounding box of the whole region.
    fn bounding_rect(&self, region: &Region) -> Option<Rect>;

    /// Per-line boxes of the region, in reading order.
    fn client_rects(&self, region: &Region) -> Vec<Rect>;
}

/// Anchor point for a floating action menu: top-center of the region, raised by
/// `config.anchor_offset`.
///
/// A degenerate bounding box falls back to the first usable client rect.
pub fn range_position(
    geometry: &dyn RegionGeometry,
    region: &Region,
    config: &EngineConfig,
) -> Option<Point> {
    let rect = geometry
        .bounding_rect(region)
        .filter(|r| !r.is_degenerate())
        .or_else(|| {
            geometry
                .client_rects(region)
                .into_iter()
                .find(|r| !r.is_degenerate())
        })?;
    Some(Point {
        x: rect.x + rect.width / 2.0,
        y: rect.y - config.anchor_offset,
    })
}
