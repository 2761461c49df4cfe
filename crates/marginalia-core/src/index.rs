//! Text indexer: the flattened character stream of a surface.
//!
//! The "full text" is the concatenation of every text node's content in document order
//! (depth-first, pre-order, descending into inline formatting and overlay wrappers). Canonical
//! offsets are character positions in that string.
//!
//! [`TextIndex`] memoizes the full text together with the position of each text node. It is
//! tied to the surface revision it was built from; callers rebuild it only when
//! [`TextIndex::is_current`] reports a structural change.

use crate::surface::{NodeId, SurfaceTree};
use crate::text::CharIndex;
use std::collections::HashMap;

/// Position of one text node in the canonical stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    /// The text node.
    pub node: NodeId,
    /// Canonical offset of the node's first character.
    pub start: usize,
    /// Canonical offset one past the node's last character.
    pub end: usize,
}

impl TextSpan {
    /// Length of the node's text in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` for empty text nodes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Text nodes of `tree` in reading order.
pub fn text_nodes_in_order<T: SurfaceTree + ?Sized>(tree: &T) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        if tree.text(node).is_some() {
            out.push(node);
            continue;
        }
        stack.extend(tree.children(node).iter().rev().copied());
    }
    out
}

/// The flattened character stream of `tree`.
pub fn full_text<T: SurfaceTree + ?Sized>(tree: &T) -> String {
    text_nodes_in_order(tree)
        .into_iter()
        .filter_map(|node| tree.text(node))
        .collect()
}

/// Memoized full text plus a node-to-offset table.
#[derive(Debug, Clone)]
pub struct TextIndex {
    text: String,
    chars: CharIndex,
    spans: Vec<TextSpan>,
    by_node: HashMap<NodeId, usize>,
    revision: u64,
}

impl TextIndex {
    /// Index the current state of `tree`.
    pub fn build<T: SurfaceTree + ?Sized>(tree: &T) -> Self {
        let nodes = text_nodes_in_order(tree);
        let mut text = String::new();
        let mut spans = Vec::with_capacity(nodes.len());
        let mut by_node = HashMap::with_capacity(nodes.len());
        let mut offset = 0usize;

        for node in nodes {
            let content = tree.text(node).unwrap_or_default();
            let len = content.chars().count();
            text.push_str(content);
            by_node.insert(node, spans.len());
            spans.push(TextSpan {
                node,
                start: offset,
                end: offset + len,
            });
            offset += len;
        }

        let chars = CharIndex::new(&text);
        Self {
            text,
            chars,
            spans,
            by_node,
            revision: tree.revision(),
        }
    }

    /// Returns `true` if `tree` has not changed structurally since this index was built.
    pub fn is_current<T: SurfaceTree + ?Sized>(&self, tree: &T) -> bool {
        self.revision == tree.revision()
    }

    /// The full text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the full text in characters.
    pub fn char_count(&self) -> usize {
        self.chars.char_count()
    }

    /// All text node spans in reading order.
    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    /// Span of a given text node.
    pub fn span_of(&self, node: NodeId) -> Option<&TextSpan> {
        self.by_node.get(&node).and_then(|idx| self.spans.get(*idx))
    }

    /// Canonical offset of a text node's first character.
    pub fn node_start(&self, node: NodeId) -> Option<usize> {
        self.span_of(node).map(|s| s.start)
    }

    /// The text node (and local offset) whose `[start, end)` contains `offset`.
    ///
    /// Offsets on a node boundary resolve to the following node. Empty text nodes never match.
    pub fn locate(&self, offset: usize) -> Option<(NodeId, usize)> {
        let idx = self.spans.partition_point(|s| s.end <= offset);
        self.spans[idx..]
            .iter()
            .find(|s| !s.is_empty())
            .filter(|s| s.start <= offset && offset < s.end)
            .map(|s| (s.node, offset - s.start))
    }

    /// The text node (and local offset) whose `(start, end]` contains `offset`.
    ///
    /// This is the lookup used for the exclusive end of a range: an offset on a node boundary
    /// resolves to the end of the preceding node.
    pub fn locate_end(&self, offset: usize) -> Option<(NodeId, usize)> {
        let idx = self.spans.partition_point(|s| s.end < offset);
        self.spans[idx..]
            .iter()
            .find(|s| !s.is_empty())
            .filter(|s| s.start < offset && offset <= s.end)
            .map(|s| (s.node, offset - s.start))
    }

    /// Substring of the full text for the character range `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let start_byte = self.chars.char_to_byte(start);
        let end_byte = self.chars.char_to_byte(end.max(start));
        &self.text[start_byte..end_byte]
    }

    /// Text node spans intersecting `[start, end)`.
    pub fn spans_intersecting(&self, start: usize, end: usize) -> impl Iterator<Item = &TextSpan> {
        let first = self.spans.partition_point(|s| s.end <= start);
        self.spans[first..]
            .iter()
            .take_while(move |s| s.start < end)
            .filter(move |s| !s.is_empty() && s.end > start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    fn formatted() -> Surface {
        let mut surface = Surface::new();
        let root = surface.root();
        let p = surface.append_element(root, "p");
        surface.append_text(p, "The ");
        let b = surface.append_element(p, "b");
        let i = surface.append_element(b, "i");
        surface.append_text(i, "quick");
        surface.append_text(b, "");
        surface.append_text(p, " brown fox.");
        surface
    }

    #[test]
    fn test_full_text_descends_inline_elements() {
        let surface = formatted();
        assert_eq!(full_text(&surface), "The quick brown fox.");
        assert_eq!(full_text(&surface), full_text(&surface));
        assert_eq!(text_nodes_in_order(&surface).len(), 4);
    }

    #[test]
    fn test_index_spans_and_locate() {
        let surface = formatted();
        let index = TextIndex::build(&surface);
        assert_eq!(index.char_count(), 20);
        let spans = index.spans();
        assert_eq!((spans[0].start, spans[0].end), (0, 4));
        assert_eq!((spans[1].start, spans[1].end), (4, 9));
        assert!(spans[2].is_empty());
        assert_eq!(index.node_start(spans[3].node), Some(9));

        // Boundary offsets: start lookups go forward, end lookups go backward.
        assert_eq!(index.locate(4), Some((spans[1].node, 0)));
        assert_eq!(index.locate_end(4), Some((spans[0].node, 4)));
        assert_eq!(index.locate(9), Some((spans[3].node, 0)));
        assert_eq!(index.locate_end(20), Some((spans[3].node, 11)));
        assert_eq!(index.locate(20), None);
        assert_eq!(index.locate_end(0), None);
    }

    #[test]
    fn test_index_tracks_revision() {
        let mut surface = formatted();
        let index = TextIndex::build(&surface);
        assert!(index.is_current(&surface));
        let root = surface.root();
        surface.append_text(root, "!");
        assert!(!index.is_current(&surface));
    }

    #[test]
    fn test_spans_intersecting() {
        let surface = formatted();
        let index = TextIndex::build(&surface);
        let hits: Vec<(usize, usize)> = index
            .spans_intersecting(2, 10)
            .map(|s| (s.start, s.end))
            .collect();
        assert_eq!(hits, vec![(0, 4), (4, 9), (9, 20)]);
        assert_eq!(index.spans_intersecting(4, 9).count(), 1);
    }

    #[test]
    fn test_slice_uses_character_offsets() {
        let surface = Surface::from_paragraphs(&["héllo 👋", "wörld"]);
        let index = TextIndex::build(&surface);
        assert_eq!(index.char_count(), 14);
        assert_eq!(index.slice(1, 4), "éll");
        assert_eq!(index.slice(6, 7), "👋");
        assert_eq!(index.slice(9, 99), "wörld");
        assert_eq!(index.slice(5, 2), "");
    }
}
