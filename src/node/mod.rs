//! Retained tree of styled boxes.
//!
//! Nodes live in an arena owned by [`NodeTree`] and are addressed by
//! [`NodeId`]. A parent owns its ordered child list; `parent` is a plain id
//! used for upward traversal. Every mutation that can change a node's size or
//! appearance marks it dirty, and the next layout pass re-resolves only what
//! is dirty (see [`layout`]).

pub mod layout;
pub mod measure;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::style::{ComputedStyle, NodeState, Style, Styleable, Stylesheet};
use crate::{Error, Result};

pub use layout::{Bounds, LayoutStats, Rect};
pub use measure::{FixedAdvance, TextMeasure};

/// Identifier of a node within its [`NodeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A styled box.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    /// Selector id (`#name`), independent of the arena id.
    pub(crate) name: Option<String>,
    pub(crate) classes: BTreeSet<String>,
    pub(crate) inline: Style,
    pub(crate) text: Option<String>,
    pub(crate) visible: bool,
    pub(crate) state: NodeState,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,

    // Layout cache, owned by the layout passes.
    pub(crate) computed: ComputedStyle,
    pub(crate) measured: (f32, f32),
    pub(crate) bounds: Bounds,
    pub(crate) slot: Option<Rect>,
    pub(crate) available: Option<(f32, f32)>,
    /// Style and measurement are stale.
    pub(crate) dirty: bool,
    /// This node or a descendant needs to be arranged again.
    pub(crate) needs_arrange: bool,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            classes: BTreeSet::new(),
            inline: Style::default(),
            text: None,
            visible: true,
            state: NodeState::default(),
            parent: None,
            children: Vec::new(),
            computed: ComputedStyle::default(),
            measured: (0.0, 0.0),
            bounds: Bounds::default(),
            slot: None,
            available: None,
            dirty: true,
            needs_arrange: true,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    pub fn inline(&self) -> &Style {
        &self.inline
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_disabled(&self) -> bool {
        self.state.disabled
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Style resolved during the last layout pass.
    pub fn computed_style(&self) -> &ComputedStyle {
        &self.computed
    }

    /// Bounds from the last layout pass, without recomputing.
    pub fn cached_bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl Styleable for Node {
    fn style_id(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    fn inline_style(&self) -> &Style {
        &self.inline
    }

    fn state(&self) -> NodeState {
        self.state
    }
}

/// Arena of nodes sharing one stylesheet, UI scale and text measurer.
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
    pub(crate) stylesheet: Stylesheet,
    pub(crate) scale: f32,
    pub(crate) measure: Box<dyn TextMeasure>,
    pub(crate) last_pass: LayoutStats,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("nodes", &self.nodes.len())
            .field("rules", &self.stylesheet.len())
            .field("scale", &self.scale)
            .finish()
    }
}

impl NodeTree {
    pub fn new() -> Self {
        Self::with_measure(Box::new(FixedAdvance::default()))
    }

    pub fn with_measure(measure: Box<dyn TextMeasure>) -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
            stylesheet: Stylesheet::new(),
            scale: 1.0,
            measure,
            last_pass: LayoutStats::default(),
        }
    }

    /// Create a detached node. It becomes a root until appended somewhere.
    pub fn create_node(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id));
        id
    }

    /// Create a node with a selector id and inline style, appended to `parent`.
    pub fn create_child(
        &mut self,
        parent: NodeId,
        name: Option<&str>,
        style: Style,
    ) -> Result<NodeId> {
        self.node(parent)?;
        let id = self.create_node();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = name.map(str::to_string);
            node.inline = style;
        }
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id.0))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id.0))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Topmost ancestor of `id` (itself when detached).
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// `id` and all of its descendants in pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Depth below the root, for indentation.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Find a node by selector id anywhere in the subtree of `root`.
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.nodes.get(id).and_then(|n| n.name.as_deref()) == Some(name))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.parent(c);
        }
        false
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.node(parent)?.children.len();
        self.insert_child(parent, index, child)
    }

    /// Insert `child` at `index` (clamped) in `parent`'s child list.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::InvalidHierarchy {
                parent: parent.0,
                child: child.0,
            });
        }

        self.detach(child);
        let node = self.node_mut(parent)?;
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
            node.slot = None;
        }
        self.mark_dirty(child);
        Ok(())
    }

    /// Unlink a node from its parent, keeping it alive as a root.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
            node.slot = None;
        }
        self.mark_dirty(parent);
    }

    /// Remove a node and its whole subtree. Returns how many nodes were freed.
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        self.node(id)?;
        self.detach(id);
        let doomed = self.descendants(id);
        for d in &doomed {
            self.nodes.remove(d);
        }
        tracing::trace!("removed node {} ({} nodes)", id, doomed.len());
        Ok(doomed.len())
    }

    /// Mark a node dirty and propagate up to the ancestors whose size depends
    /// on it. The walk stops marking at the first ancestor with a fixed width
    /// and height; that ancestor and everything above only get re-arranged.
    pub fn mark_dirty(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        node.dirty = true;
        node.needs_arrange = true;

        let mut size_changes = true;
        let mut current = node.parent;
        while let Some(pid) = current {
            let Some(parent) = self.nodes.get_mut(&pid) else {
                break;
            };
            parent.needs_arrange = true;
            if size_changes {
                let size = parent.computed.size;
                if !parent.dirty && size.width > 0.0 && size.height > 0.0 {
                    size_changes = false;
                } else {
                    parent.dirty = true;
                }
            }
            current = parent.parent;
        }
    }

    fn mark_all_dirty(&mut self) {
        for node in self.nodes.values_mut() {
            node.dirty = true;
            node.needs_arrange = true;
        }
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.dirty)
    }

    /// Mutate a node and mark it dirty if the closure reports a change.
    fn update(&mut self, id: NodeId, f: impl FnOnce(&mut Node) -> bool) -> Result<()> {
        if f(self.node_mut(id)?) {
            self.mark_dirty(id);
        }
        Ok(())
    }

    pub fn set_name(&mut self, id: NodeId, name: Option<&str>) -> Result<()> {
        self.update(id, |n| {
            let changed = n.name.as_deref() != name;
            n.name = name.map(str::to_string);
            changed
        })
    }

    /// Replace the node's inline style.
    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<()> {
        self.update(id, |n| {
            let changed = n.inline != style;
            n.inline = style;
            changed
        })
    }

    /// Merge properties onto the node's inline style.
    pub fn merge_style(&mut self, id: NodeId, style: &Style) -> Result<()> {
        self.update(id, |n| {
            let before = n.inline.clone();
            n.inline.merge(style);
            n.inline != before
        })
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.update(id, |n| n.classes.insert(class.to_string()))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        self.update(id, |n| n.classes.remove(class))
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes.get(&id).is_some_and(|n| n.classes.contains(class))
    }

    /// Set the displayed text. Unchanged text does not dirty the node.
    pub fn set_text(&mut self, id: NodeId, text: Option<&str>) -> Result<()> {
        self.update(id, |n| {
            if n.text.as_deref() == text {
                return false;
            }
            n.text = text.map(str::to_string);
            true
        })
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.update(id, |n| std::mem::replace(&mut n.visible, visible) != visible)
    }

    pub fn set_hovered(&mut self, id: NodeId, hovered: bool) -> Result<()> {
        self.update(id, |n| std::mem::replace(&mut n.state.hovered, hovered) != hovered)
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<()> {
        self.update(id, |n| std::mem::replace(&mut n.state.active, active) != active)
    }

    pub fn set_disabled(&mut self, id: NodeId, disabled: bool) -> Result<()> {
        self.update(id, |n| {
            std::mem::replace(&mut n.state.disabled, disabled) != disabled
        })
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Replace the stylesheet. Every node is re-resolved on the next pass.
    pub fn set_stylesheet(&mut self, stylesheet: Stylesheet) {
        self.stylesheet = stylesheet;
        self.mark_all_dirty();
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the UI scale factor. Non-positive or non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if !scale.is_finite() || scale <= 0.0 {
            tracing::warn!("ignoring invalid ui scale {}", scale);
            return;
        }
        if scale != self.scale {
            self.scale = scale;
            self.mark_all_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_chain() -> (NodeTree, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let mid = tree.create_child(root, Some("mid"), Style::new()).unwrap();
        let leaf = tree.create_child(mid, None, Style::new()).unwrap();
        (tree, root, mid, leaf)
    }

    #[test]
    fn cycles_are_rejected() {
        let (mut tree, root, _, leaf) = tree_with_chain();
        assert!(matches!(
            tree.append_child(leaf, root),
            Err(Error::InvalidHierarchy { .. })
        ));
        assert!(tree.append_child(leaf, leaf).is_err());
    }

    #[test]
    fn reparenting_detaches() {
        let (mut tree, root, mid, leaf) = tree_with_chain();
        tree.append_child(root, leaf).unwrap();
        assert!(tree.children(mid).is_empty());
        assert_eq!(tree.children(root), [mid, leaf]);
        assert_eq!(tree.parent(leaf), Some(root));
    }

    #[test]
    fn remove_drops_subtree() {
        let (mut tree, root, mid, leaf) = tree_with_chain();
        assert_eq!(tree.remove(mid).unwrap(), 2);
        assert!(!tree.contains(leaf));
        assert!(tree.children(root).is_empty());
        assert!(matches!(tree.remove(mid), Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn descendants_are_pre_order() {
        let (mut tree, root, mid, leaf) = tree_with_chain();
        let other = tree.create_child(root, None, Style::new()).unwrap();
        assert_eq!(tree.descendants(root), vec![root, mid, leaf, other]);
        assert_eq!(tree.depth(leaf), 2);
        assert_eq!(tree.find_by_name(root, "mid"), Some(mid));
        assert_eq!(tree.root_of(leaf), root);
    }

    #[test]
    fn unchanged_text_keeps_node_clean() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        tree.set_text(root, Some("hi")).unwrap();
        tree.compute_layout(root, 100.0, 100.0).unwrap();
        assert!(!tree.is_dirty(root));

        tree.set_text(root, Some("hi")).unwrap();
        assert!(!tree.is_dirty(root));
        tree.set_text(root, Some("ho")).unwrap();
        assert!(tree.is_dirty(root));
    }

    #[test]
    fn invalid_scale_is_ignored() {
        let mut tree = NodeTree::new();
        tree.set_scale(0.0);
        tree.set_scale(f32::NAN);
        assert_eq!(tree.scale(), 1.0);
        tree.set_scale(2.0);
        assert_eq!(tree.scale(), 2.0);
    }
}
