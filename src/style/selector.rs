//! Selector parsing and matching.
//!
//! Supported forms: `#id`, `.class`, compound `#id.a.b`, `*`, each optionally
//! followed by one pseudo-state `:hover`, `:active` or `:disabled`.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unknown pseudo-state ':{0}'")]
    UnknownState(String),

    #[error("missing name after '{prefix}' at offset {offset} in '{selector}'")]
    MissingName {
        selector: String,
        prefix: char,
        offset: usize,
    },

    #[error("unexpected character '{ch}' at offset {offset} in '{selector}'")]
    UnexpectedChar {
        selector: String,
        ch: char,
        offset: usize,
    },

    #[error("more than one id in '{0}'")]
    DuplicateId(String),
}

/// Interaction state a rule can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoState {
    Hover,
    Active,
    Disabled,
}

impl PseudoState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hover" => Some(Self::Hover),
            "active" => Some(Self::Active),
            "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }
}

/// Current interaction state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeState {
    pub hovered: bool,
    pub active: bool,
    pub disabled: bool,
}

impl NodeState {
    pub fn has(&self, state: PseudoState) -> bool {
        match state {
            PseudoState::Hover => self.hovered,
            PseudoState::Active => self.active,
            PseudoState::Disabled => self.disabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    id: Option<String>,
    classes: Vec<String>,
    state: Option<PseudoState>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let selector = input.trim();
        if selector.is_empty() {
            return Err(SelectorError::Empty);
        }

        let (base, state) = match selector.split_once(':') {
            Some((base, state)) => {
                let parsed = PseudoState::parse(state)
                    .ok_or_else(|| SelectorError::UnknownState(state.to_string()))?;
                (base, Some(parsed))
            }
            None => (selector, None),
        };

        let mut id = None;
        let mut classes = Vec::new();
        if base == "*" {
            return Ok(Self { id, classes, state });
        }
        if base.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut chars = base.char_indices().peekable();
        while let Some((offset, c)) = chars.next() {
            if c != '#' && c != '.' {
                return Err(SelectorError::UnexpectedChar {
                    selector: selector.to_string(),
                    ch: c,
                    offset,
                });
            }
            let mut name = String::new();
            while let Some(&(_, n)) = chars.peek() {
                if !is_name_char(n) {
                    break;
                }
                name.push(n);
                chars.next();
            }
            if name.is_empty() {
                return Err(SelectorError::MissingName {
                    selector: selector.to_string(),
                    prefix: c,
                    offset,
                });
            }
            if c == '#' {
                if id.is_some() {
                    return Err(SelectorError::DuplicateId(selector.to_string()));
                }
                id = Some(name);
            } else if !classes.contains(&name) {
                classes.push(name);
            }
        }

        Ok(Self { id, classes, state })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn state(&self) -> Option<PseudoState> {
        self.state
    }

    /// Whether the selector applies to a node with the given id, class test
    /// and interaction state.
    pub fn matches(
        &self,
        id: Option<&str>,
        has_class: impl Fn(&str) -> bool,
        state: NodeState,
    ) -> bool {
        if let Some(want) = &self.id {
            if id != Some(want.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| has_class(c.as_str())) {
            return false;
        }
        self.state.is_none_or(|s| state.has(s))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id.is_none() && self.classes.is_empty() {
            f.write_str("*")?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        if let Some(state) = self.state {
            write!(f, ":{}", state.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has(classes: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |c: &str| classes.iter().any(|k| *k == c)
    }

    #[test]
    fn parse_forms() {
        let s = Selector::parse("#bar.foo.baz:hover").unwrap();
        assert_eq!(s.id(), Some("bar"));
        assert_eq!(s.classes(), ["foo".to_string(), "baz".to_string()]);
        assert_eq!(s.state(), Some(PseudoState::Hover));
        assert_eq!(s.to_string(), "#bar.foo.baz:hover");
        assert_eq!(Selector::parse("*").unwrap().to_string(), "*");
    }

    #[test]
    fn parse_errors() {
        assert_eq!(Selector::parse("  "), Err(SelectorError::Empty));
        assert_eq!(
            Selector::parse(".a:focus"),
            Err(SelectorError::UnknownState("focus".to_string()))
        );
        assert!(matches!(
            Selector::parse("div"),
            Err(SelectorError::UnexpectedChar { ch: 'd', offset: 0, .. })
        ));
        assert!(matches!(
            Selector::parse(".a."),
            Err(SelectorError::MissingName { prefix: '.', offset: 2, .. })
        ));
        assert!(matches!(
            Selector::parse("#a#b"),
            Err(SelectorError::DuplicateId(_))
        ));
        assert_eq!(Selector::parse(":hover"), Err(SelectorError::Empty));
    }

    #[test]
    fn compound_classes_need_all() {
        let s = Selector::parse(".a.b").unwrap();
        assert!(s.matches(None, has(&["a", "b", "c"]), NodeState::default()));
        assert!(!s.matches(None, has(&["a"]), NodeState::default()));
    }

    #[test]
    fn pseudo_state_must_be_active() {
        let s = Selector::parse(".btn:hover").unwrap();
        let hovered = NodeState {
            hovered: true,
            ..NodeState::default()
        };
        assert!(!s.matches(None, has(&["btn"]), NodeState::default()));
        assert!(s.matches(None, has(&["btn"]), hovered));
    }

    #[test]
    fn id_must_match() {
        let s = Selector::parse("#bar").unwrap();
        assert!(s.matches(Some("bar"), has(&[]), NodeState::default()));
        assert!(!s.matches(Some("baz"), has(&[]), NodeState::default()));
        assert!(!s.matches(None, has(&[]), NodeState::default()));
    }
}
