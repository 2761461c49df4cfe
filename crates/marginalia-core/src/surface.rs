//! Rendered text surface.
//!
//! The surface is the tree of visual elements that holds the document's text. It is built by the
//! content renderer (outside this crate) and handed to the engine, which reads it and, for
//! overlays only, mutates it locally by wrapping and unwrapping text nodes.
//!
//! Algorithms in this crate are written against the [`SurfaceTree`] trait, so hosts with their
//! own tree representation can plug it in. [`Surface`] is the arena-backed implementation used
//! by default (and by the test-suite).

use crate::highlight::HighlightColor;
use std::fmt::Write as _;

/// Identifier of a node inside a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Which overlay system a marker belongs to.
///
/// The two kinds are rendered and removed independently and never interfere with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OverlayKind {
    /// Persisted, colored highlights.
    Highlight,
    /// In-page search hits.
    SearchHit,
}

/// Data attached to an overlay wrapper element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Overlay system this marker belongs to.
    pub kind: OverlayKind,
    /// Highlight id (highlight markers only).
    pub highlight_id: Option<String>,
    /// Highlight color (highlight markers only).
    pub color: Option<HighlightColor>,
    /// Index of the hit in the hit list (search markers only).
    pub hit_index: Option<usize>,
    /// Whether this is the currently focused search hit.
    pub active: bool,
}

impl Marker {
    /// Marker for a persisted highlight.
    pub fn highlight(id: impl Into<String>, color: HighlightColor) -> Self {
        Self {
            kind: OverlayKind::Highlight,
            highlight_id: Some(id.into()),
            color: Some(color),
            hit_index: None,
            active: false,
        }
    }

    /// Marker for a search hit.
    pub fn search_hit(hit_index: usize, active: bool) -> Self {
        Self {
            kind: OverlayKind::SearchHit,
            highlight_id: None,
            color: None,
            hit_index: Some(hit_index),
            active,
        }
    }

    /// Short human-readable label (used in logs and overlay reports).
    pub fn label(&self) -> String {
        match self.kind {
            OverlayKind::Highlight => self.highlight_id.clone().unwrap_or_default(),
            OverlayKind::SearchHit => format!("hit#{}", self.hit_index.unwrap_or_default()),
        }
    }
}

/// Read/mutate access to a rendered text tree.
///
/// Text nodes are leaves carrying literal text; every other node is an element. Local offsets
/// inside text nodes are character offsets.
pub trait SurfaceTree {
    /// The root node.
    fn root(&self) -> NodeId;

    /// Structural revision. Must change whenever nodes are added, removed, split or merged.
    fn revision(&self) -> u64;

    /// Children of `node` in document order (empty for text nodes and unknown ids).
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Parent of `node`, if attached.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Text content of a text node, `None` for elements.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Overlay marker carried by an element, if any.
    fn marker(&self, node: NodeId) -> Option<&Marker>;

    /// Whether `node` is currently attached to the tree.
    fn contains(&self, node: NodeId) -> bool;

    /// Split a text node at local character offset `at`.
    ///
    /// The original node keeps `[0, at)`; a new sibling placed right after it receives the
    /// remainder and is returned. Returns `None` when no split is needed (`at == 0` or
    /// `at >= len`) or the node is not an attached text node.
    fn split_text(&mut self, node: NodeId, at: usize) -> Option<NodeId>;

    /// Wrap an attached node in a new marker element, in place. Returns the wrapper.
    fn wrap(&mut self, node: NodeId, tag: &str, marker: Marker) -> Option<NodeId>;

    /// Replace an attached element by its children, preserving sibling order.
    fn unwrap(&mut self, wrapper: NodeId) -> bool;

    /// Merge adjacent text children of `parent` and drop empty ones.
    fn merge_text_children(&mut self, parent: NodeId);
}

#[derive(Debug, Clone)]
enum NodeData {
    Element { tag: String, marker: Option<Marker> },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// Arena-backed [`SurfaceTree`].
///
/// Detached nodes stay in the arena (ids are never reused), which keeps ids held by stale
/// regions harmless: they simply fail [`SurfaceTree::contains`].
#[derive(Debug, Clone)]
pub struct Surface {
    nodes: Vec<Node>,
    root: NodeId,
    revision: u64,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    /// Create a surface with an empty `body` root element.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                data: NodeData::Element {
                    tag: "body".to_string(),
                    marker: None,
                },
                parent: None,
                children: Vec::new(),
                attached: true,
            }],
            root: NodeId(0),
            revision: 0,
        }
    }

    /// Build a surface of `<p>` blocks separated by blank-line text nodes.
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let mut surface = Self::new();
        let root = surface.root;
        for (idx, paragraph) in paragraphs.iter().enumerate() {
            if idx > 0 {
                surface.append_text(root, "\n\n");
            }
            let p = surface.append_element(root, "p");
            surface.append_text(p, paragraph.as_ref());
        }
        surface
    }

    /// Append a new element under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an element of this surface.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.append(
            parent,
            NodeData::Element {
                tag: tag.to_string(),
                marker: None,
            },
        )
    }

    /// Append a new text node under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an element of this surface.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.append(parent, NodeData::Text(text.to_string()))
    }

    fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        assert!(
            matches!(
                self.node(parent).map(|n| &n.data),
                Some(NodeData::Element { .. })
            ),
            "parent {parent:?} is not an element of this surface"
        );
        let id = self.push(data, Some(parent));
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        self.revision += 1;
        id
    }

    fn push(&mut self, data: NodeData, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            attached: true,
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn index_in_parent(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.node(node)?.parent?;
        let idx = self.node(parent)?.children.iter().position(|c| *c == node)?;
        Some((parent, idx))
    }

    /// Tag name of an element node.
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    /// Number of attached nodes, root included.
    pub fn attached_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.attached).count()
    }

    /// Serialize the attached tree as markup.
    ///
    /// Markers are rendered as `data-*` attributes; text is written verbatim. Intended for
    /// debugging and assertions, not for feeding a browser.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(self.root, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { tag, marker } => {
                out.push('<');
                out.push_str(tag);
                if let Some(marker) = marker {
                    match marker.kind {
                        OverlayKind::Highlight => {
                            let _ = write!(
                                out,
                                " data-highlight=\"{}\" data-color=\"{}\"",
                                marker.highlight_id.as_deref().unwrap_or_default(),
                                marker.color.map(|c| c.as_str()).unwrap_or_default()
                            );
                        }
                        OverlayKind::SearchHit => {
                            let _ = write!(
                                out,
                                " data-hit=\"{}\"",
                                marker.hit_index.unwrap_or_default()
                            );
                            if marker.active {
                                out.push_str(" data-active");
                            }
                        }
                    }
                }
                out.push('>');
                for child in &node.children {
                    self.write_markup(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

impl SurfaceTree for Surface {
    fn root(&self) -> NodeId {
        self.root
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.node(node)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element { .. } => None,
        }
    }

    fn marker(&self, node: NodeId) -> Option<&Marker> {
        match &self.node(node)?.data {
            NodeData::Element { marker, .. } => marker.as_ref(),
            NodeData::Text(_) => None,
        }
    }

    fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.attached)
    }

    fn split_text(&mut self, node: NodeId, at: usize) -> Option<NodeId> {
        if !self.contains(node) {
            return None;
        }
        let (parent, idx) = self.index_in_parent(node)?;
        let tail = {
            let NodeData::Text(text) = &mut self.node_mut(node)?.data else {
                return None;
            };
            let len = text.chars().count();
            if at == 0 || at >= len {
                return None;
            }
            let byte = text.char_indices().nth(at).map(|(b, _)| b)?;
            text.split_off(byte)
        };

        let new_id = self.push(NodeData::Text(tail), Some(parent));
        if let Some(p) = self.node_mut(parent) {
            p.children.insert(idx + 1, new_id);
        }
        self.revision += 1;
        Some(new_id)
    }

    fn wrap(&mut self, node: NodeId, tag: &str, marker: Marker) -> Option<NodeId> {
        if !self.contains(node) {
            return None;
        }
        let (parent, idx) = self.index_in_parent(node)?;
        let wrapper = self.push(
            NodeData::Element {
                tag: tag.to_string(),
                marker: Some(marker),
            },
            Some(parent),
        );
        self.node_mut(wrapper)?.children.push(node);
        self.node_mut(node)?.parent = Some(wrapper);
        self.node_mut(parent)?.children[idx] = wrapper;
        self.revision += 1;
        Some(wrapper)
    }

    fn unwrap(&mut self, wrapper: NodeId) -> bool {
        if !self.contains(wrapper) || self.text(wrapper).is_some() {
            return false;
        }
        let Some((parent, idx)) = self.index_in_parent(wrapper) else {
            return false;
        };

        let children = match self.node_mut(wrapper) {
            Some(w) => {
                w.attached = false;
                w.parent = None;
                std::mem::take(&mut w.children)
            }
            None => return false,
        };
        for child in &children {
            if let Some(c) = self.node_mut(*child) {
                c.parent = Some(parent);
            }
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.splice(idx..=idx, children);
        }
        self.revision += 1;
        true
    }

    fn merge_text_children(&mut self, parent: NodeId) {
        if !self.contains(parent) {
            return;
        }
        let children = self.children(parent).to_vec();
        let mut kept: Vec<NodeId> = Vec::with_capacity(children.len());
        let mut changed = false;

        for child in children {
            let Some(text) = self.text(child).map(str::to_string) else {
                kept.push(child);
                continue;
            };

            let previous_text = kept.last().copied().filter(|prev| self.text(*prev).is_some());
            if text.is_empty() || previous_text.is_some() {
                if let (Some(prev), false) = (previous_text, text.is_empty())
                    && let Some(Node {
                        data: NodeData::Text(prev_text),
                        ..
                    }) = self.node_mut(prev)
                {
                    prev_text.push_str(&text);
                }
                if let Some(c) = self.node_mut(child) {
                    c.attached = false;
                    c.parent = None;
                }
                changed = true;
                continue;
            }
            kept.push(child);
        }

        if changed {
            if let Some(p) = self.node_mut(parent) {
                p.children = kept;
            }
            self.revision += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Surface, NodeId, NodeId, NodeId) {
        let mut surface = Surface::new();
        let root = surface.root();
        let p = surface.append_element(root, "p");
        let a = surface.append_text(p, "Hello ");
        let em = surface.append_element(p, "em");
        let b = surface.append_text(em, "wide");
        surface.append_text(p, " world");
        (surface, p, a, b)
    }

    #[test]
    fn test_markup_roundtrip_shape() {
        let (surface, ..) = sample();
        assert_eq!(
            surface.to_markup(),
            "<body><p>Hello <em>wide</em> world</p></body>"
        );
    }

    #[test]
    fn test_split_text_inserts_sibling() {
        let (mut surface, p, a, _) = sample();
        let revision = surface.revision();
        let tail = surface.split_text(a, 2).unwrap();

        assert_eq!(surface.text(a), Some("He"));
        assert_eq!(surface.text(tail), Some("llo "));
        assert_eq!(surface.children(p)[1], tail);
        assert!(surface.revision() > revision);

        // Boundaries do not split.
        assert_eq!(surface.split_text(a, 0), None);
        assert_eq!(surface.split_text(a, 2), None);
    }

    #[test]
    fn test_split_text_multibyte() {
        let mut surface = Surface::new();
        let root = surface.root();
        let t = surface.append_text(root, "a👋b");
        let tail = surface.split_text(t, 2).unwrap();
        assert_eq!(surface.text(t), Some("a👋"));
        assert_eq!(surface.text(tail), Some("b"));
    }

    #[test]
    fn test_wrap_and_unwrap_preserve_order() {
        let (mut surface, p, _, b) = sample();
        let wrapper = surface
            .wrap(b, "mark", Marker::highlight("h1", HighlightColor::Gold))
            .unwrap();
        assert_eq!(
            surface.to_markup(),
            "<body><p>Hello <em><mark data-highlight=\"h1\" data-color=\"gold\">wide</mark></em> world</p></body>"
        );
        assert_eq!(surface.parent(b), Some(wrapper));

        assert!(surface.unwrap(wrapper));
        assert!(!surface.contains(wrapper));
        assert_eq!(
            surface.to_markup(),
            "<body><p>Hello <em>wide</em> world</p></body>"
        );
        assert_eq!(surface.children(p).len(), 3);
        assert!(!surface.unwrap(wrapper));
    }

    #[test]
    fn test_merge_text_children() {
        let mut surface = Surface::new();
        let root = surface.root();
        let a = surface.append_text(root, "ab");
        let b = surface.append_text(root, "");
        let c = surface.append_text(root, "cd");
        let em = surface.append_element(root, "em");
        surface.append_text(em, "x");
        let d = surface.append_text(root, "ef");

        surface.merge_text_children(root);
        assert_eq!(surface.text(a), Some("abcd"));
        assert!(!surface.contains(b));
        assert!(!surface.contains(c));
        assert!(surface.contains(d));
        assert_eq!(surface.children(root), &[a, em, d]);
    }
}
