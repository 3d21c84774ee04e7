//! Measure and arrange passes over a [`NodeTree`].
//!
//! Layout runs in two passes. `measure` walks dirty nodes bottom-up,
//! re-resolving their style and computing the border-box size they want:
//! a fixed size when the style gives one, otherwise the extent of their
//! visible children (or their text) plus padding. `arrange` then walks
//! top-down handing each child a slot along the parent's flow axis and
//! placing it inside that slot with its anchor. A subtree whose node is
//! clean and whose slot did not move is skipped.

use super::{NodeId, NodeTree};
use crate::style::{ComputedStyle, EdgeSize, Flow};
use crate::Result;

const EPSILON: f32 = 1e-3;

/// Axis-aligned rectangle in screen coordinates (y grows downward).
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside this rect.
    pub fn covers(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| Rect::new(x, y, right - x, bottom - y))
    }

    /// Shrink by `edges`, never below zero size.
    pub fn inset(&self, edges: &EdgeSize) -> Rect {
        Rect::new(
            self.x + edges.left,
            self.y + edges.top,
            (self.width - edges.horizontal()).max(0.0),
            (self.height - edges.vertical()).max(0.0),
        )
    }

    /// Grow by `edges`.
    pub fn outset(&self, edges: &EdgeSize) -> Rect {
        Rect::new(
            self.x - edges.left,
            self.y - edges.top,
            self.width + edges.horizontal(),
            self.height + edges.vertical(),
        )
    }
}

/// Computed boxes of a node.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Border box plus margin.
    pub margin: Rect,
    /// Border box: where background and border are drawn.
    pub padding: Rect,
    /// Border box minus padding: where children and text go.
    pub content: Rect,
    /// The node wanted more room than its slot had and was clamped.
    pub clipped: bool,
}

impl Bounds {
    fn collapsed(x: f32, y: f32) -> Self {
        let rect = Rect::new(x, y, 0.0, 0.0);
        Self {
            margin: rect,
            padding: rect,
            content: rect,
            clipped: false,
        }
    }
}

/// Work done by the most recent layout pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LayoutStats {
    /// Nodes whose style was re-resolved and size re-measured.
    pub measured: usize,
    /// Nodes that were (re)positioned.
    pub arranged: usize,
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

impl NodeTree {
    /// Lay out the tree under `root` inside an area of `width` x `height`.
    ///
    /// The root is positioned by its anchor on both axes. Only dirty
    /// subtrees, and subtrees whose slot moved, are recomputed.
    pub fn compute_layout(&mut self, root: NodeId, width: f32, height: f32) -> Result<Bounds> {
        let (width, height) = (sanitize(width), sanitize(height));
        let node = self.node_mut(root)?;
        if node.available != Some((width, height)) {
            node.available = Some((width, height));
            node.needs_arrange = true;
        }

        let mut stats = LayoutStats::default();
        self.measure_node(root, &mut stats);
        self.arrange_node(root, Rect::new(0.0, 0.0, width, height), &mut stats);
        self.last_pass = stats;
        tracing::trace!(
            "layout root={} {}x{} measured={} arranged={}",
            root,
            width,
            height,
            stats.measured,
            stats.arranged
        );
        Ok(self.node(root)?.bounds)
    }

    /// Current bounds of a node, recomputing its tree first if anything in
    /// it changed. Uses the size last passed to [`compute_layout`] for the
    /// root, or the root's own desired size if it was never laid out.
    ///
    /// A clean tree costs one walk up to the root and no layout work.
    ///
    /// Hidden subtrees keep a collapsed box at their position in the flow.
    ///
    /// [`compute_layout`]: NodeTree::compute_layout
    pub fn bounds(&mut self, id: NodeId) -> Result<Bounds> {
        self.node(id)?;
        let root = self.root_of(id);
        let root_node = self.node(root)?;
        let available = root_node.available;
        if available.is_some() && !root_node.dirty && !root_node.needs_arrange {
            return Ok(self.node(id)?.bounds);
        }

        let (width, height) = match available {
            Some(size) => size,
            None => {
                let mut stats = LayoutStats::default();
                let (w, h) = self.measure_node(root, &mut stats);
                let margin = self.margin_of(root);
                (w + margin.horizontal(), h + margin.vertical())
            }
        };
        self.compute_layout(root, width, height)?;
        Ok(self.node(id)?.bounds)
    }

    /// Work done by the most recent [`compute_layout`](NodeTree::compute_layout).
    pub fn last_pass(&self) -> LayoutStats {
        self.last_pass
    }

    fn margin_of(&self, id: NodeId) -> EdgeSize {
        self.nodes
            .get(&id)
            .map(|n| n.computed.margin.scaled(self.scale))
            .unwrap_or(EdgeSize::ZERO)
    }

    /// Desired border-box size of a node, re-measured only when dirty.
    fn measure_node(&mut self, id: NodeId, stats: &mut LayoutStats) -> (f32, f32) {
        let Some(node) = self.nodes.get(&id) else {
            return (0.0, 0.0);
        };
        if !node.dirty {
            return node.measured;
        }

        let computed = ComputedStyle::from_style(&self.stylesheet.resolve(node));
        let text = node.text.clone();
        let children = node.children.clone();
        let scale = self.scale;
        let horizontal = computed.flow == Flow::Horizontal;

        let mut main = 0.0f32;
        let mut cross = 0.0f32;
        let mut count = 0usize;
        for child in children {
            if !self.nodes.get(&child).is_some_and(|c| c.visible) {
                continue;
            }
            let (w, h) = self.measure_node(child, stats);
            let margin = self.margin_of(child);
            let (w, h) = (w + margin.horizontal(), h + margin.vertical());
            let (m, c) = if horizontal { (w, h) } else { (h, w) };
            main += m;
            cross = cross.max(c);
            count += 1;
        }
        if count > 1 {
            main += computed.gap * scale * (count - 1) as f32;
        }

        let (mut content_w, mut content_h) = if horizontal {
            (main, cross)
        } else {
            (cross, main)
        };
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            let (tw, th) = self
                .measure
                .measure(&text, computed.font, computed.font_size * scale);
            content_w = content_w.max(tw);
            content_h = content_h.max(th);
        }

        let padding = computed.padding.scaled(scale);
        let width = if computed.size.width > 0.0 {
            computed.size.width * scale
        } else {
            content_w + padding.horizontal()
        };
        let height = if computed.size.height > 0.0 {
            computed.size.height * scale
        } else {
            content_h + padding.vertical()
        };

        if let Some(node) = self.nodes.get_mut(&id) {
            node.computed = computed;
            node.measured = (width, height);
            node.dirty = false;
            node.needs_arrange = true;
        }
        stats.measured += 1;
        (width, height)
    }

    /// Place a node inside `slot` and arrange its children.
    fn arrange_node(&mut self, id: NodeId, slot: Rect, stats: &mut LayoutStats) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.dirty && !node.needs_arrange && node.slot == Some(slot) {
            return;
        }
        if node.dirty {
            // Reached below an ancestor whose fixed size stopped propagation.
            self.measure_node(id, stats);
        }
        let Some(node) = self.nodes.get(&id) else {
            return;
        };

        let scale = self.scale;
        let (want_w, want_h) = node.measured;
        let anchor = node.computed.anchor;
        let flow = node.computed.flow;
        let gap = node.computed.gap * scale;
        let margin = node.computed.margin.scaled(scale);
        let padding = node.computed.padding.scaled(scale);
        let children = node.children.clone();

        let room_w = (slot.width - margin.horizontal()).max(0.0);
        let room_h = (slot.height - margin.vertical()).max(0.0);
        let width = want_w.min(room_w);
        let height = want_h.min(room_h);
        let clipped = want_w > room_w + EPSILON || want_h > room_h + EPSILON;

        let x = slot.x + margin.left + (room_w - width) * anchor.horizontal().factor();
        let y = slot.y + margin.top + (room_h - height) * anchor.vertical().factor();
        let border_box = Rect::new(x, y, width, height);
        let content = border_box.inset(&padding);
        let bounds = Bounds {
            margin: border_box.outset(&margin),
            padding: border_box,
            content,
            clipped,
        };

        let horizontal = flow == Flow::Horizontal;
        let end = if horizontal {
            content.right()
        } else {
            content.bottom()
        };
        let mut cursor = if horizontal { content.x } else { content.y };
        let mut first = true;
        for child in children {
            let Some(c) = self.nodes.get(&child) else {
                continue;
            };
            let at = cursor.min(end);
            if !c.visible {
                if let Some(c) = self.nodes.get_mut(&child) {
                    c.bounds = if horizontal {
                        Bounds::collapsed(at, content.y)
                    } else {
                        Bounds::collapsed(content.x, at)
                    };
                    c.slot = None;
                }
                continue;
            }

            if !first {
                cursor += gap;
            }
            first = false;

            let (cw, ch) = self.measure_node(child, stats);
            let m = self.margin_of(child);
            let outer = if horizontal {
                cw + m.horizontal()
            } else {
                ch + m.vertical()
            };
            let at = cursor.min(end);
            let length = outer.min((end - cursor).max(0.0));
            let child_slot = if horizontal {
                Rect::new(at, content.y, length, content.height)
            } else {
                Rect::new(content.x, at, content.width, length)
            };
            self.arrange_node(child, child_slot, stats);
            cursor += length;
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            node.bounds = bounds;
            node.slot = Some(slot);
            node.needs_arrange = false;
        }
        stats.arranged += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Anchor, Style, Stylesheet};

    fn fixed(w: f32, h: f32) -> Style {
        Style::new().with_size(w, h)
    }

    fn column(tree: &mut NodeTree, heights: &[f32], gap: f32) -> (NodeId, Vec<NodeId>) {
        let root = tree.create_node();
        tree.set_style(root, Style::new().with_flow(Flow::Vertical).with_gap(gap))
            .unwrap();
        let children = heights
            .iter()
            .map(|h| tree.create_child(root, None, fixed(40.0, *h)).unwrap())
            .collect();
        (root, children)
    }

    #[test]
    fn vertical_flow_stacks_children() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0, 20.0, 30.0], 0.0);
        let bounds = tree.compute_layout(root, 500.0, 500.0).unwrap();
        assert_eq!(bounds.content.height, 60.0);
        assert_eq!(bounds.content.width, 40.0);

        let ys: Vec<f32> = children
            .iter()
            .map(|c| tree.get(*c).unwrap().cached_bounds().padding.y)
            .collect();
        assert_eq!(ys, vec![0.0, 10.0, 30.0]);
    }

    #[test]
    fn gap_padding_and_margin_add_up() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0, 10.0], 5.0);
        tree.merge_style(root, &Style::new().with_padding(EdgeSize::all(2.0)))
            .unwrap();
        tree.merge_style(children[1], &Style::new().with_margin(EdgeSize::xy(3.0, 0.0)))
            .unwrap();

        let bounds = tree.compute_layout(root, 500.0, 500.0).unwrap();
        // 2 + 10 + 5 + (3 + 10 + 3) + 2
        assert_eq!(bounds.padding.height, 35.0);
        let second = tree.bounds(children[1]).unwrap();
        assert_eq!(second.padding.y, 20.0);
        assert_eq!(second.margin.y, 17.0);
    }

    #[test]
    fn cross_axis_uses_child_anchor() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        tree.set_style(root, fixed(100.0, 50.0)).unwrap();
        let child = tree
            .create_child(
                root,
                None,
                fixed(10.0, 10.0).with_anchor(Anchor::BOTTOM | Anchor::RIGHT),
            )
            .unwrap();
        tree.compute_layout(root, 100.0, 50.0).unwrap();
        let b = tree.bounds(child).unwrap();
        // Horizontal flow: the anchor only moves the child vertically.
        assert_eq!((b.padding.x, b.padding.y), (0.0, 40.0));
    }

    #[test]
    fn root_uses_anchor_on_both_axes() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        tree.set_style(root, fixed(20.0, 10.0).with_anchor(Anchor::MIDDLE_CENTER))
            .unwrap();
        let b = tree.compute_layout(root, 100.0, 50.0).unwrap();
        assert_eq!((b.padding.x, b.padding.y), (40.0, 20.0));
    }

    #[test]
    fn shrink_to_text() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        tree.set_style(
            root,
            Style::new()
                .with_font(0, 10.0)
                .with_padding(EdgeSize::xy(1.0, 4.0)),
        )
        .unwrap();
        tree.set_text(root, Some("abcd")).unwrap();
        let b = tree.compute_layout(root, 500.0, 500.0).unwrap();
        assert_eq!((b.padding.width, b.padding.height), (28.0, 14.0));
        assert_eq!((b.content.width, b.content.height), (20.0, 12.0));
    }

    #[test]
    fn zero_available_space_gives_zero_bounds() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0], 0.0);
        let b = tree.compute_layout(root, 0.0, 0.0).unwrap();
        assert_eq!((b.padding.width, b.padding.height), (0.0, 0.0));
        assert!(b.clipped);
        let child = tree.bounds(children[0]).unwrap();
        assert_eq!(child.padding.height, 0.0);
        assert!(tree.contains(children[0]));
    }

    #[test]
    fn oversize_children_are_clamped_not_removed() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[30.0, 30.0], 0.0);
        tree.merge_style(root, &fixed(40.0, 45.0)).unwrap();
        tree.compute_layout(root, 500.0, 500.0).unwrap();

        let first = tree.bounds(children[0]).unwrap();
        let second = tree.bounds(children[1]).unwrap();
        assert!(!first.clipped);
        assert!(second.clipped);
        assert_eq!(second.padding.height, 15.0);
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn hidden_children_take_no_space() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0, 20.0, 30.0], 0.0);
        tree.set_visible(children[1], false).unwrap();
        let b = tree.compute_layout(root, 500.0, 500.0).unwrap();
        assert_eq!(b.content.height, 40.0);
        assert_eq!(tree.bounds(children[2]).unwrap().padding.y, 10.0);
    }

    #[test]
    fn scale_multiplies_lengths() {
        let mut tree = NodeTree::new();
        let (root, _) = column(&mut tree, &[10.0, 10.0], 5.0);
        tree.set_scale(2.0);
        let b = tree.compute_layout(root, 500.0, 500.0).unwrap();
        assert_eq!((b.padding.width, b.padding.height), (80.0, 50.0));
    }

    #[test]
    fn dirtiness_stops_at_fixed_size_ancestor() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let panel = tree.create_child(root, None, fixed(50.0, 50.0)).unwrap();
        let a = tree.create_child(panel, None, fixed(10.0, 10.0)).unwrap();
        let b = tree.create_child(panel, None, fixed(10.0, 10.0)).unwrap();
        tree.compute_layout(root, 200.0, 200.0).unwrap();

        tree.set_style(a, fixed(20.0, 10.0)).unwrap();
        assert!(tree.is_dirty(a));
        assert!(!tree.is_dirty(b));
        assert!(!tree.is_dirty(panel));
        assert!(!tree.is_dirty(root));

        tree.compute_layout(root, 200.0, 200.0).unwrap();
        assert_eq!(tree.last_pass().measured, 1);
        assert_eq!(tree.bounds(b).unwrap().padding.x, 20.0);
    }

    #[test]
    fn clean_tree_is_not_rewalked() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0, 10.0], 0.0);
        tree.compute_layout(root, 100.0, 100.0).unwrap();
        assert_eq!(tree.last_pass().measured, 3);

        tree.compute_layout(root, 100.0, 100.0).unwrap();
        assert_eq!(tree.last_pass(), LayoutStats::default());

        tree.set_text(children[1], Some("x")).unwrap();
        tree.compute_layout(root, 100.0, 100.0).unwrap();
        // The changed child and the shrink-to-content root.
        assert_eq!(tree.last_pass().measured, 2);
    }

    #[test]
    fn bounds_of_clean_tree_skips_layout() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0, 10.0], 0.0);
        tree.compute_layout(root, 100.0, 100.0).unwrap();
        assert_eq!(tree.last_pass().measured, 3);

        assert_eq!(tree.bounds(children[1]).unwrap().padding.y, 10.0);
        // No pass ran, so the stats of the first one are still there.
        assert_eq!(tree.last_pass().measured, 3);
    }

    #[test]
    fn bounds_recomputes_lazily() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0, 10.0], 0.0);
        tree.compute_layout(root, 100.0, 100.0).unwrap();

        tree.set_style(children[0], fixed(40.0, 25.0)).unwrap();
        assert_eq!(tree.bounds(children[1]).unwrap().padding.y, 25.0);
        assert!(!tree.is_dirty(root));
    }

    #[test]
    fn stylesheet_swap_restyles_everything() {
        let mut tree = NodeTree::new();
        let (root, children) = column(&mut tree, &[10.0], 0.0);
        tree.add_class(children[0], "wide").unwrap();
        tree.set_style(children[0], Style::new()).unwrap();
        tree.compute_layout(root, 100.0, 100.0).unwrap();
        assert_eq!(tree.bounds(children[0]).unwrap().padding.width, 0.0);

        let sheet = Stylesheet::from_rules([(".wide", fixed(60.0, 5.0))]).unwrap();
        tree.set_stylesheet(sheet);
        assert!(tree.is_dirty(root));
        assert_eq!(tree.bounds(children[0]).unwrap().padding.width, 60.0);
    }
}
