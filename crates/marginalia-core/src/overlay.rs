//! Overlay renderer: wraps highlight and search-hit ranges in marker elements.
//!
//! Each overlay kind is its own layer. A pass computes the desired set of spans for the layer
//! (an [`OverlayPlan`]), compares it with what the surface currently shows, and only when they
//! differ does it unwrap every marker of that kind and wrap the planned spans again. Markers of
//! the other kind are never touched.
//!
//! A span that crosses inline elements or block boundaries is wrapped as several segments, one
//! per intersecting text node. Offsets that cannot be located skip that single item; the pass
//! carries on with the rest and lists the item in the [`OverlayReport`].

use crate::config::EngineConfig;
use crate::highlight::{Highlight, sorted_by_start};
use crate::index::{TextIndex, TextSpan};
use crate::search::SearchHit;
use crate::surface::{Marker, NodeId, OverlayKind, SurfaceTree};
use std::collections::{BTreeMap, BTreeSet};

/// A planned overlay: wrap `[start, end)` with `marker`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySpan {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
    /// Marker to attach to every wrapper of this span.
    pub marker: Marker,
}

/// Desired state of one overlay layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayPlan {
    /// Layer this plan belongs to.
    pub kind: OverlayKind,
    /// Spans to render, in start order.
    pub spans: Vec<OverlaySpan>,
    /// Items left out because their offsets fall outside the text.
    pub skipped: Vec<String>,
    /// Highlights left out because their snapshot no longer matches the text.
    pub stale: Vec<String>,
}

impl OverlayPlan {
    /// Plan the highlight layer.
    ///
    /// With `verify_snapshots`, a highlight whose stored text differs from the full text at its
    /// offsets is reported as stale instead of being drawn over the wrong words.
    pub fn for_highlights(highlights: &[Highlight], index: &TextIndex, verify_snapshots: bool) -> Self {
        let mut plan = Self::empty(OverlayKind::Highlight);
        for highlight in sorted_by_start(highlights) {
            if highlight.start >= highlight.end || highlight.end > index.char_count() {
                plan.skipped.push(highlight.id.clone());
                continue;
            }
            if verify_snapshots && index.slice(highlight.start, highlight.end) != highlight.text {
                plan.stale.push(highlight.id.clone());
                continue;
            }
            plan.spans.push(OverlaySpan {
                start: highlight.start,
                end: highlight.end,
                marker: Marker::highlight(highlight.id.clone(), highlight.color),
            });
        }
        plan
    }

    /// Plan the search-hit layer; the hit at `current` is marked active.
    pub fn for_search(hits: &[SearchHit], current: Option<usize>, index: &TextIndex) -> Self {
        let mut plan = Self::empty(OverlayKind::SearchHit);
        for (idx, hit) in hits.iter().enumerate() {
            let marker = Marker::search_hit(idx, current == Some(idx));
            if hit.is_empty() || hit.end > index.char_count() {
                plan.skipped.push(marker.label());
                continue;
            }
            plan.spans.push(OverlaySpan {
                start: hit.start,
                end: hit.end,
                marker,
            });
        }
        plan
    }

    /// A plan that removes every marker of `kind`.
    pub fn empty(kind: OverlayKind) -> Self {
        Self {
            kind,
            spans: Vec::new(),
            skipped: Vec::new(),
            stale: Vec::new(),
        }
    }
}

/// Outcome of one overlay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayReport {
    /// Layer the pass ran on.
    pub kind: Option<OverlayKind>,
    /// Marker elements removed.
    pub unwrapped: usize,
    /// Marker elements created.
    pub wrapped_segments: usize,
    /// Items that could not be located.
    pub skipped: Vec<String>,
    /// Highlights whose snapshot text no longer matches.
    pub stale: Vec<String>,
    /// `true` when the surface already showed the plan and nothing was mutated.
    pub unchanged: bool,
}

fn marker_elements<T: SurfaceTree + ?Sized>(tree: &T, kind: OverlayKind) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        if tree.marker(node).is_some_and(|m| m.kind == kind) {
            out.push(node);
        }
        stack.extend(tree.children(node).iter().rev().copied());
    }
    out
}

fn text_extent<T: SurfaceTree + ?Sized>(tree: &T, index: &TextIndex, node: NodeId) -> Option<(usize, usize)> {
    let mut first: Option<usize> = None;
    let mut last: Option<usize> = None;
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if tree.text(current).is_some() {
            if let Some(span) = index.span_of(current).filter(|s| !s.is_empty()) {
                first.get_or_insert(span.start);
                last = Some(span.end);
            }
            continue;
        }
        stack.extend(tree.children(current).iter().rev().copied());
    }
    Some((first?, last?))
}

/// The spans a layer currently shows, reconstructed from its marker elements.
///
/// Adjacent wrappers carrying the same marker are merged back into one span, so a highlight
/// rendered as several segments reads as the single span it was planned from. Wrappers with no
/// text report as `[0, 0)`.
pub fn current_overlays<T: SurfaceTree + ?Sized>(
    tree: &T,
    index: &TextIndex,
    kind: OverlayKind,
) -> Vec<OverlaySpan> {
    let mut by_label: BTreeMap<String, Vec<OverlaySpan>> = BTreeMap::new();
    for wrapper in marker_elements(tree, kind) {
        let Some(marker) = tree.marker(wrapper) else {
            continue;
        };
        let (start, end) = text_extent(tree, index, wrapper).unwrap_or((0, 0));
        by_label.entry(marker.label()).or_default().push(OverlaySpan {
            start,
            end,
            marker: marker.clone(),
        });
    }

    let mut spans = Vec::new();
    for (_, mut segments) in by_label {
        segments.sort_by_key(|s| (s.start, s.end));
        let mut merged: Vec<OverlaySpan> = Vec::with_capacity(segments.len());
        for segment in segments {
            match merged.last_mut() {
                Some(prev)
                    if prev.marker == segment.marker
                        && prev.end == segment.start
                        && segment.start < segment.end =>
                {
                    prev.end = segment.end;
                }
                _ => merged.push(segment),
            }
        }
        spans.extend(merged);
    }
    sort_spans(&mut spans);
    spans
}

fn sort_spans(spans: &mut [OverlaySpan]) {
    spans.sort_by(|a, b| {
        (a.start, a.end, a.marker.label()).cmp(&(b.start, b.end, b.marker.label()))
    });
}

/// Remove every marker of `kind`, splicing children back in place and merging the text
/// fragments left behind. Returns the number of wrappers removed.
pub fn unwrap_overlays<T: SurfaceTree + ?Sized>(tree: &mut T, kind: OverlayKind) -> usize {
    let wrappers = marker_elements(tree, kind);
    let mut parents = BTreeSet::new();
    let mut removed = 0usize;
    for wrapper in wrappers {
        let parent = tree.parent(wrapper);
        if tree.unwrap(wrapper) {
            removed += 1;
            parents.extend(parent);
        }
    }
    for parent in parents {
        tree.merge_text_children(parent);
    }
    removed
}

/// Split text nodes so that every offset in `cuts` falls on a node boundary.
///
/// `cuts` must be sorted. Returns the resulting non-empty text pieces in reading order. Text
/// content is unchanged, so the pieces stay valid while wrappers are added around them.
fn split_at_boundaries<T: SurfaceTree + ?Sized>(
    tree: &mut T,
    index: &TextIndex,
    cuts: &[usize],
) -> Vec<TextSpan> {
    let mut pieces = Vec::with_capacity(index.spans().len() + cuts.len());
    for span in index.spans().iter().filter(|s| !s.is_empty()) {
        let first = cuts.partition_point(|c| *c <= span.start);
        let last = cuts.partition_point(|c| *c < span.end);
        let inner = &cuts[first..last];

        // Split from the right so each split only moves the tail of the node.
        let mut tail_pieces = Vec::with_capacity(inner.len());
        let mut end = span.end;
        for &cut in inner.iter().rev() {
            if let Some(tail) = tree.split_text(span.node, cut - span.start) {
                tail_pieces.push(TextSpan {
                    node: tail,
                    start: cut,
                    end,
                });
                end = cut;
            }
        }
        pieces.push(TextSpan {
            node: span.node,
            start: span.start,
            end,
        });
        pieces.extend(tail_pieces.into_iter().rev());
    }
    pieces
}

fn wrap_pieces<T: SurfaceTree + ?Sized>(
    tree: &mut T,
    pieces: &[TextSpan],
    span: &OverlaySpan,
    tag: &str,
) -> usize {
    let first = pieces.partition_point(|p| p.end <= span.start);
    let mut wrapped = 0usize;
    for piece in pieces[first..].iter().take_while(|p| p.start < span.end) {
        if tree.wrap(piece.node, tag, span.marker.clone()).is_some() {
            wrapped += 1;
        }
    }
    wrapped
}

/// Wrap `[start, end)` in `marker` elements, one per intersecting text node.
///
/// `index` must be current for `tree`. Returns the number of wrappers created; `0` means the
/// range could not be located.
pub fn wrap_span<T: SurfaceTree + ?Sized>(
    tree: &mut T,
    index: &TextIndex,
    start: usize,
    end: usize,
    marker: &Marker,
    tag: &str,
) -> usize {
    if start >= end {
        return 0;
    }
    let pieces = split_at_boundaries(tree, index, &[start, end]);
    let span = OverlaySpan {
        start,
        end,
        marker: marker.clone(),
    };
    wrap_pieces(tree, &pieces, &span, tag)
}

/// Bring the surface in line with `plan`.
///
/// One pass splits text nodes at every span boundary, then each span wraps the pieces it
/// covers. The cost is linear in the text plus the number of planned spans.
pub fn apply_plan<T: SurfaceTree + ?Sized>(tree: &mut T, plan: &OverlayPlan, tag: &str) -> OverlayReport {
    let mut report = OverlayReport {
        kind: Some(plan.kind),
        skipped: plan.skipped.clone(),
        stale: plan.stale.clone(),
        ..Default::default()
    };

    let mut desired = plan.spans.clone();
    sort_spans(&mut desired);
    let index = TextIndex::build(tree);
    if current_overlays(tree, &index, plan.kind) == desired {
        report.unchanged = true;
        tracing::debug!(kind = ?plan.kind, spans = desired.len(), "overlay layer already up to date");
        return report;
    }

    report.unwrapped = unwrap_overlays(tree, plan.kind);
    let index = TextIndex::build(tree);
    let mut cuts: Vec<usize> = plan
        .spans
        .iter()
        .filter(|s| s.start < s.end)
        .flat_map(|s| [s.start, s.end])
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    let pieces = split_at_boundaries(tree, &index, &cuts);

    for span in &plan.spans {
        let wrapped = wrap_pieces(tree, &pieces, span, tag);
        if wrapped == 0 {
            report.skipped.push(span.marker.label());
        }
        report.wrapped_segments += wrapped;
    }

    tracing::debug!(
        kind = ?plan.kind,
        unwrapped = report.unwrapped,
        wrapped = report.wrapped_segments,
        skipped = report.skipped.len(),
        stale = report.stale.len(),
        "overlay pass"
    );
    report
}

/// Render the highlight layer for `highlights`.
pub fn render_highlights<T: SurfaceTree + ?Sized>(
    tree: &mut T,
    highlights: &[Highlight],
    config: &EngineConfig,
) -> OverlayReport {
    let index = TextIndex::build(tree);
    let plan = OverlayPlan::for_highlights(highlights, &index, config.verify_snapshots);
    apply_plan(tree, &plan, &config.highlight_tag)
}

/// Render the search-hit layer, marking `current` as the active hit.
pub fn render_search_hits<T: SurfaceTree + ?Sized>(
    tree: &mut T,
    hits: &[SearchHit],
    current: Option<usize>,
    config: &EngineConfig,
) -> OverlayReport {
    let index = TextIndex::build(tree);
    let plan = OverlayPlan::for_search(hits, current, &index);
    apply_plan(tree, &plan, &config.search_tag)
}
