//! Ordered selector rules and layered style resolution.
//!
//! Layers, lowest precedence first:
//! 1. class / universal rules, in declaration order
//! 2. id rules, in declaration order
//! 3. the node's inline style
//! 4. pseudo-state rules matching the node's current state
//!
//! Every layer is merged property by property onto the one below it.

use super::selector::{NodeState, Selector, SelectorError};
use super::Style;

/// Something a stylesheet can be resolved against.
pub trait Styleable {
    fn style_id(&self) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
    fn inline_style(&self) -> &Style;
    fn state(&self) -> NodeState;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector: Selector,
    pub style: Style,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    rules: Vec<StyleRule>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(selector, style)` pairs in declaration order.
    pub fn from_rules<S: AsRef<str>>(
        rules: impl IntoIterator<Item = (S, Style)>,
    ) -> Result<Self, SelectorError> {
        let mut sheet = Self::new();
        for (selector, style) in rules {
            sheet.add_rule(selector.as_ref(), style)?;
        }
        Ok(sheet)
    }

    pub fn add_rule(&mut self, selector: &str, style: Style) -> Result<(), SelectorError> {
        let selector = Selector::parse(selector)?;
        self.rules.push(StyleRule { selector, style });
        Ok(())
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn resolve(&self, node: &impl Styleable) -> Style {
        let id = node.style_id();
        let state = node.state();
        let matching: Vec<&StyleRule> = self
            .rules
            .iter()
            .filter(|r| r.selector.matches(id, |c| node.has_class(c), state))
            .collect();

        let mut style = Style::default();
        let layer = |style: &mut Style, stateful: bool, with_id: bool| {
            for rule in &matching {
                if rule.selector.state().is_some() == stateful
                    && rule.selector.id().is_some() == with_id
                {
                    style.merge(&rule.style);
                }
            }
        };

        layer(&mut style, false, false);
        layer(&mut style, false, true);
        style.merge(node.inline_style());
        layer(&mut style, true, false);
        layer(&mut style, true, true);
        style
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Color;

    struct Target {
        id: Option<&'static str>,
        classes: Vec<&'static str>,
        inline: Style,
        state: NodeState,
    }

    impl Styleable for Target {
        fn style_id(&self) -> Option<&str> {
            self.id
        }

        fn has_class(&self, class: &str) -> bool {
            self.classes.iter().any(|c| *c == class)
        }

        fn inline_style(&self) -> &Style {
            &self.inline
        }

        fn state(&self) -> NodeState {
            self.state
        }
    }

    const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);

    fn target() -> Target {
        Target {
            id: Some("bar"),
            classes: vec!["foo"],
            inline: Style::default(),
            state: NodeState::default(),
        }
    }

    #[test]
    fn id_beats_class_regardless_of_order() {
        let sheet = Stylesheet::from_rules([
            ("#bar", Style::new().with_color(BLUE)),
            (".foo", Style::new().with_color(RED).with_gap(3.0)),
        ])
        .unwrap();
        let style = sheet.resolve(&target());
        assert_eq!(style.color, Some(BLUE));
        assert_eq!(style.gap, Some(3.0));
    }

    #[test]
    fn inline_beats_selectors() {
        let sheet = Stylesheet::from_rules([
            (".foo", Style::new().with_color(RED)),
            ("#bar", Style::new().with_color(BLUE)),
        ])
        .unwrap();
        let mut node = target();
        node.inline = Style::new().with_color(GREEN);
        assert_eq!(sheet.resolve(&node).color, Some(GREEN));
    }

    #[test]
    fn pseudo_state_beats_inline() {
        let sheet = Stylesheet::from_rules([(".foo:hover", Style::new().with_color(RED))]).unwrap();
        let mut node = target();
        node.inline = Style::new().with_color(GREEN).with_gap(1.0);
        assert_eq!(sheet.resolve(&node).color, Some(GREEN));

        node.state.hovered = true;
        let style = sheet.resolve(&node);
        assert_eq!(style.color, Some(RED));
        assert_eq!(style.gap, Some(1.0));
    }

    #[test]
    fn later_class_rules_win() {
        let sheet = Stylesheet::from_rules([
            (".foo", Style::new().with_color(RED)),
            ("*", Style::new().with_color(BLUE)),
        ])
        .unwrap();
        assert_eq!(sheet.resolve(&target()).color, Some(BLUE));
    }

    #[test]
    fn bad_selector_is_rejected() {
        let mut sheet = Stylesheet::new();
        assert!(sheet.add_rule("foo", Style::new()).is_err());
        assert!(sheet.is_empty());
    }
}
