//! Node tree dump and diagnostic utilities.

use std::fmt::Write as _;

use crate::node::{Node, NodeId, NodeTree};
use crate::placeholder::PlaceholderRegistry;

/// Options for [`format_tree`].
#[derive(Debug, Clone, Default)]
pub struct DumpOptions<'a> {
    /// Only print nodes whose display name contains this (case-insensitive).
    pub filter: Option<&'a str>,
    /// Skip hidden subtrees.
    pub visible_only: bool,
}

/// Dump the tree under `root` to stdout.
pub fn print_tree(tree: &NodeTree, root: NodeId, options: &DumpOptions<'_>) {
    print!("{}", format_tree(tree, root, options));
}

/// One line per node, indented by depth, with the bounds of the last layout
/// pass. Ancestors of a filtered node are still walked but not printed.
pub fn format_tree(tree: &NodeTree, root: NodeId, options: &DumpOptions<'_>) -> String {
    let mut out = String::new();
    let filter = options.filter.map(str::to_lowercase);
    write_node(tree, root, 0, filter.as_deref(), options.visible_only, &mut out);
    out
}

fn write_node(
    tree: &NodeTree,
    id: NodeId,
    depth: usize,
    filter: Option<&str>,
    visible_only: bool,
    out: &mut String,
) {
    let Some(node) = tree.get(id) else { return };
    if visible_only && !node.is_visible() {
        return;
    }

    let display_name = display_name(node);
    let matches_filter = filter
        .map(|f| display_name.to_lowercase().contains(f))
        .unwrap_or(true);
    if matches_filter {
        write_node_line(node, &display_name, depth, out);
    }

    for &child in node.children() {
        write_node(tree, child, depth + 1, filter, visible_only, out);
    }
}

/// `#name.class1.class2`, or the arena id for anonymous nodes.
fn display_name(node: &Node) -> String {
    let mut name = node
        .name()
        .map(|n| format!("#{}", n))
        .unwrap_or_default();
    for class in node.classes() {
        name.push('.');
        name.push_str(class);
    }
    if name.is_empty() {
        name = format!("node{}", node.id());
    }
    name
}

fn write_node_line(node: &Node, display_name: &str, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let rect = node.cached_bounds().padding;
    let mut flags = String::new();
    if !node.is_visible() {
        flags.push_str(" hidden");
    }
    if node.is_disabled() {
        flags.push_str(" disabled");
    }
    if node.cached_bounds().clipped {
        flags.push_str(" clipped");
    }
    if node.is_dirty() {
        flags.push_str(" dirty");
    }
    let text = node
        .text()
        .filter(|t| !t.is_empty())
        .map(|t| format!(" text={:?}", t))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{indent}{display_name} @{},{} ({}x{}){flags}{text}",
        rect.x as i32, rect.y as i32, rect.width as i32, rect.height as i32,
    );
}

/// `name = "value"  description` per placeholder, sorted by name.
pub fn format_placeholders(registry: &PlaceholderRegistry) -> String {
    let width = registry.all().map(|p| p.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for p in registry.all() {
        let _ = writeln!(
            out,
            "{:width$} = {:?}  {}",
            p.name,
            p.value,
            p.description,
            width = width
        );
    }
    out
}
