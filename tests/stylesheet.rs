use umbra_ui::node::NodeTree;
use umbra_ui::style::{Color, Style, Stylesheet};

const RED: Color = Color::rgb(1.0, 0.0, 0.0);
const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

fn color_of(tree: &mut NodeTree, id: umbra_ui::NodeId) -> Color {
    tree.bounds(id).unwrap();
    tree.get(id).unwrap().computed_style().color
}

#[test]
fn id_beats_class_and_inline_beats_both() {
    let mut sheet = Stylesheet::new();
    // Declared id-first to show order between layers does not matter.
    sheet.add_rule("#bar", Style::new().with_color(BLUE)).unwrap();
    sheet.add_rule(".foo", Style::new().with_color(RED)).unwrap();

    let mut tree = NodeTree::new();
    tree.set_stylesheet(sheet);
    let node = tree.create_node();
    tree.add_class(node, "foo").unwrap();
    assert_eq!(color_of(&mut tree, node), RED);

    tree.set_name(node, Some("bar")).unwrap();
    assert_eq!(color_of(&mut tree, node), BLUE);

    tree.merge_style(node, &Style::new().with_color(GREEN)).unwrap();
    assert_eq!(color_of(&mut tree, node), GREEN);
}

#[test]
fn pseudo_state_rules_apply_last() {
    let mut sheet = Stylesheet::new();
    sheet.add_rule(".button:hover", Style::new().with_color(RED)).unwrap();
    sheet.add_rule(".button:disabled", Style::new().with_color(BLUE)).unwrap();

    let mut tree = NodeTree::new();
    tree.set_stylesheet(sheet);
    let node = tree.create_node();
    tree.add_class(node, "button").unwrap();
    tree.set_style(node, Style::new().with_color(GREEN)).unwrap();
    assert_eq!(color_of(&mut tree, node), GREEN);

    tree.set_hovered(node, true).unwrap();
    assert_eq!(color_of(&mut tree, node), RED);

    tree.set_disabled(node, true).unwrap();
    assert_eq!(color_of(&mut tree, node), BLUE);
}

#[test]
fn malformed_selectors_are_rejected() {
    let mut sheet = Stylesheet::new();
    for selector in ["", "div", "#a#b", ".x:nope"] {
        assert!(sheet.add_rule(selector, Style::new()).is_err(), "{selector:?}");
    }
    assert!(sheet.is_empty());
}
