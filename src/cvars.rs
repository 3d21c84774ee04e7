//! Config variable storage.
//!
//! Config variables are named string settings that widgets read. Defaults are
//! registered by widget config schemas, overrides come from the user's
//! settings or from runtime changes. Keys are case-insensitive.

use std::collections::{BTreeMap, HashMap};

/// Config variable storage with defaults and overrides.
#[derive(Debug, Clone, Default)]
pub struct ConfigVariables {
    /// Default values (lowercase key -> value)
    defaults: HashMap<String, String>,
    /// Runtime overrides (lowercase key -> value)
    overrides: HashMap<String, String>,
}

impl ConfigVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a variable (override takes precedence over default).
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = name.to_lowercase();
        self.overrides
            .get(&key)
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
    }

    /// Get the default value for a variable.
    pub fn get_default(&self, name: &str) -> Option<&str> {
        self.defaults.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Get a variable as a boolean ("1" or "true" = true, anything else = false).
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }

    /// Get a variable as a number, `None` if unset or not numeric.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name)?.trim().parse().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Set a variable. Returns true if its effective value changed.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let changed = self.get(name) != Some(value);
        self.overrides.insert(name.to_lowercase(), value.to_string());
        changed
    }

    /// Drop the override, falling back to the default.
    pub fn reset(&mut self, name: &str) -> bool {
        self.overrides.remove(&name.to_lowercase()).is_some()
    }

    /// Register a variable with a default value. An existing default wins.
    pub fn register(&mut self, name: &str, default: &str) {
        self.defaults
            .entry(name.to_lowercase())
            .or_insert_with(|| default.to_string());
    }

    /// Every known variable with its effective value, sorted by key.
    pub fn all(&self) -> BTreeMap<&str, &str> {
        let mut out: BTreeMap<&str, &str> = self
            .defaults
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        for (k, v) in &self.overrides {
            out.insert(k.as_str(), v.as_str());
        }
        out
    }

    /// Only the overridden variables, for persisting.
    pub fn overrides(&self) -> BTreeMap<String, String> {
        self.overrides
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
