//! Immediate-mode draw list output and hit testing.
//!
//! The host owns the actual drawing surface. Each frame the tree is walked
//! in order and flattened into a [`DrawList`] of rectangles, borders, text
//! runs and clip pushes that the host replays on its own renderer.

use crate::node::{NodeId, NodeTree, Rect};
use crate::style::Color;

/// One primitive for the host renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Filled background.
    Rect {
        node: NodeId,
        rect: Rect,
        color: Color,
    },
    /// Outline drawn inside `rect`.
    Border {
        node: NodeId,
        rect: Rect,
        color: Color,
        width: f32,
    },
    /// Text laid out from the top-left of `rect`.
    Text {
        node: NodeId,
        rect: Rect,
        text: String,
        color: Color,
        font: u32,
        font_size: f32,
    },
    PushClip(Rect),
    PopClip,
}

/// Batched draw commands for one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Ids of nodes that produced at least one primitive, in draw order.
    pub fn drawn_nodes(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for command in &self.commands {
            let node = match command {
                DrawCommand::Rect { node, .. }
                | DrawCommand::Border { node, .. }
                | DrawCommand::Text { node, .. } => *node,
                _ => continue,
            };
            if out.last() != Some(&node) {
                out.push(node);
            }
        }
        out
    }
}

fn occluded(rect: &Rect, occluders: &[Rect]) -> bool {
    occluders.iter().any(|o| o.covers(rect))
}

/// Flatten the visible part of the tree under `root` using the bounds of the
/// last layout pass.
///
/// Hidden subtrees are skipped, as are subtrees whose box is entirely covered
/// by one of the `occluders` (native windows drawn above the UI).
pub fn draw_tree(tree: &NodeTree, root: NodeId, occluders: &[Rect]) -> DrawList {
    let mut list = DrawList::new();
    draw_node(tree, root, 1.0, occluders, &mut list);
    list
}

fn draw_node(tree: &NodeTree, id: NodeId, opacity: f32, occluders: &[Rect], list: &mut DrawList) {
    let Some(node) = tree.get(id) else {
        return;
    };
    if !node.is_visible() {
        return;
    }
    let bounds = node.cached_bounds();
    if occluded(&bounds.padding, occluders) {
        return;
    }

    let style = node.computed_style();
    let opacity = opacity * style.opacity;
    let fade = |c: Color| c.with_alpha(c.a * opacity);

    if bounds.clipped {
        list.push(DrawCommand::PushClip(bounds.padding));
    }

    let background = fade(style.background_color);
    if background.a > 0.0 && !bounds.padding.is_empty() {
        list.push(DrawCommand::Rect {
            node: id,
            rect: bounds.padding,
            color: background,
        });
    }

    let border = fade(style.border_color);
    if style.border_width > 0.0 && border.a > 0.0 {
        list.push(DrawCommand::Border {
            node: id,
            rect: bounds.padding,
            color: border,
            width: style.border_width * tree.scale(),
        });
    }

    if let Some(text) = node.text().filter(|t| !t.is_empty()) {
        let color = fade(style.color);
        if color.a > 0.0 {
            list.push(DrawCommand::Text {
                node: id,
                rect: bounds.content,
                text: text.to_string(),
                color,
                font: style.font,
                font_size: style.font_size * tree.scale(),
            });
        }
    }

    for child in node.children() {
        draw_node(tree, *child, opacity, occluders, list);
    }

    if bounds.clipped {
        list.push(DrawCommand::PopClip);
    }
}

/// Deepest visible node under `point`, or `None` when the point is outside
/// the tree or covered by an occluder. Later siblings win over earlier ones.
pub fn hit_test(
    tree: &NodeTree,
    root: NodeId,
    point: (f32, f32),
    occluders: &[Rect],
) -> Option<NodeId> {
    let (x, y) = point;
    if occluders.iter().any(|o| o.contains(x, y)) {
        return None;
    }
    hit_node(tree, root, x, y)
}

fn hit_node(tree: &NodeTree, id: NodeId, x: f32, y: f32) -> Option<NodeId> {
    let node = tree.get(id)?;
    if !node.is_visible() || !node.cached_bounds().padding.contains(x, y) {
        return None;
    }
    node.children()
        .iter()
        .rev()
        .find_map(|child| hit_node(tree, *child, x, y))
        .or(Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Flow, Style};

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    fn sample() -> (NodeTree, NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        tree.set_style(
            root,
            Style::new()
                .with_flow(Flow::Vertical)
                .with_background(Color::BLACK),
        )
        .unwrap();
        let a = tree
            .create_child(
                root,
                Some("a"),
                Style::new().with_size(50.0, 20.0).with_background(RED),
            )
            .unwrap();
        let b = tree
            .create_child(root, Some("b"), Style::new().with_size(50.0, 20.0))
            .unwrap();
        tree.set_text(b, Some("hi")).unwrap();
        tree.compute_layout(root, 200.0, 200.0).unwrap();
        (tree, root, a, b)
    }

    #[test]
    fn emits_in_tree_order() {
        let (tree, root, a, b) = sample();
        let list = draw_tree(&tree, root, &[]);
        assert_eq!(list.drawn_nodes(), vec![root, a, b]);
        assert!(matches!(
            &list.commands()[2],
            DrawCommand::Text { text, rect, .. } if text == "hi" && rect.y == 20.0
        ));
    }

    #[test]
    fn hidden_and_occluded_nodes_are_skipped() {
        let (mut tree, root, a, b) = sample();
        let window = Rect::new(0.0, 0.0, 60.0, 21.0);
        assert_eq!(draw_tree(&tree, root, &[window]).drawn_nodes(), vec![root, b]);

        tree.set_visible(b, false).unwrap();
        tree.compute_layout(root, 200.0, 200.0).unwrap();
        assert_eq!(draw_tree(&tree, root, &[]).drawn_nodes(), vec![root, a]);
    }

    #[test]
    fn clipped_nodes_push_a_clip() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        tree.set_text(root, Some("a long line of text")).unwrap();
        tree.compute_layout(root, 20.0, 100.0).unwrap();
        let list = draw_tree(&tree, root, &[]);
        assert!(matches!(list.commands().first(), Some(DrawCommand::PushClip(_))));
        assert_eq!(list.commands().last(), Some(&DrawCommand::PopClip));
    }

    #[test]
    fn opacity_multiplies_down_the_tree() {
        let (mut tree, root, a, _) = sample();
        tree.merge_style(root, &Style::new().with_opacity(0.5)).unwrap();
        tree.compute_layout(root, 200.0, 200.0).unwrap();
        let list = draw_tree(&tree, root, &[]);
        let alpha = list.commands().iter().find_map(|c| match c {
            DrawCommand::Rect { node, color, .. } if *node == a => Some(color.a),
            _ => None,
        });
        assert_eq!(alpha, Some(0.5));
    }

    #[test]
    fn hit_test_finds_deepest() {
        let (tree, root, a, b) = sample();
        assert_eq!(hit_test(&tree, root, (10.0, 5.0), &[]), Some(a));
        assert_eq!(hit_test(&tree, root, (10.0, 25.0), &[]), Some(b));
        assert_eq!(hit_test(&tree, root, (10.0, 45.0), &[]), None);
    }

    #[test]
    fn occluder_blocks_hits() {
        let (tree, root, _, _) = sample();
        let window = Rect::new(0.0, 0.0, 20.0, 20.0);
        assert_eq!(hit_test(&tree, root, (10.0, 5.0), &[window]), None);
    }
}
