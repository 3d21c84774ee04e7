//! Registry of named, live-updating placeholder values.
//!
//! Providers register their placeholders once at startup and push new values
//! on their update tick; templates read the latest value by name.

pub mod builtin;
pub mod provider;

use std::collections::BTreeMap;

use crate::event::{Observers, SubscriptionId};
use crate::script::{EvalError, ValueSource};
use crate::{Error, Result};

pub use builtin::{SessionProvider, StaticProvider};
pub use provider::{PlaceholderProvider, PlaceholderSpec, ProviderTable, UpdateContext};

/// A named value, e.g. `player.level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub value: String,
    pub description: String,
}

/// Broadcast when a placeholder's value changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderChanged {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct PlaceholderRegistry {
    placeholders: BTreeMap<String, Placeholder>,
    observers: Observers<PlaceholderChanged>,
}

impl PlaceholderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, initial: &str, description: &str) -> Result<()> {
        if self.placeholders.contains_key(name) {
            return Err(Error::DuplicatePlaceholder(name.to_string()));
        }
        self.placeholders.insert(
            name.to_string(),
            Placeholder {
                name: name.to_string(),
                value: initial.to_string(),
                description: description.to_string(),
            },
        );
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<Placeholder> {
        self.placeholders.remove(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.placeholders.contains_key(name)
    }

    pub fn get(&self, name: &str) -> std::result::Result<&str, EvalError> {
        self.placeholders
            .get(name)
            .map(|p| p.value.as_str())
            .ok_or_else(|| EvalError::PlaceholderNotFound(name.to_string()))
    }

    /// All placeholders ordered by name.
    pub fn all(&self) -> impl Iterator<Item = &Placeholder> {
        self.placeholders.values()
    }

    pub fn len(&self) -> usize {
        self.placeholders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placeholders.is_empty()
    }

    /// Store a new value. Observers are notified only when the value changed;
    /// returns whether it did.
    pub fn set(&mut self, name: &str, value: &str) -> std::result::Result<bool, EvalError> {
        let placeholder = self
            .placeholders
            .get_mut(name)
            .ok_or_else(|| EvalError::PlaceholderNotFound(name.to_string()))?;
        if placeholder.value == value {
            return Ok(false);
        }
        placeholder.value = value.to_string();

        let event = PlaceholderChanged {
            name: name.to_string(),
            value: value.to_string(),
        };
        self.observers.notify(&event);
        Ok(true)
    }

    pub fn on_value_changed(
        &mut self,
        callback: impl FnMut(&PlaceholderChanged) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }
}

impl ValueSource for PlaceholderRegistry {
    fn value(&self, name: &str) -> Option<&str> {
        self.placeholders.get(name).map(|p| p.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn register_get_has() {
        let mut registry = PlaceholderRegistry::new();
        assert!(!registry.has("player.level"));
        assert_eq!(
            registry.get("player.level"),
            Err(EvalError::PlaceholderNotFound("player.level".to_string()))
        );

        registry.register("player.level", "1", "Player level").unwrap();
        assert!(registry.has("player.level"));
        assert_eq!(registry.get("player.level"), Ok("1"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = PlaceholderRegistry::new();
        registry.register("a", "", "").unwrap();
        assert!(matches!(
            registry.register("a", "x", ""),
            Err(Error::DuplicatePlaceholder(name)) if name == "a"
        ));
        assert_eq!(registry.get("a"), Ok(""));
    }

    #[test]
    fn set_broadcasts_only_changes() {
        let mut registry = PlaceholderRegistry::new();
        registry.register("hp", "10", "").unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = registry.on_value_changed(move |e| sink.borrow_mut().push(e.clone()));

        assert_eq!(registry.set("hp", "10"), Ok(false));
        assert_eq!(registry.set("hp", "9"), Ok(true));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(seen.borrow()[0].value, "9");

        assert!(registry.unsubscribe(id));
        registry.set("hp", "8").unwrap();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn all_is_sorted() {
        let mut registry = PlaceholderRegistry::new();
        registry.register("b", "2", "second").unwrap();
        registry.register("a", "1", "first").unwrap();
        let names: Vec<_> = registry.all().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
