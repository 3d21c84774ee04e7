//! Settings persistence.
//!
//! Stores the user's toolbar (widgets and their variables), stylesheet rules,
//! custom placeholders and display preferences as JSON at
//! `~/.local/share/umbra/config.json`. Loaded once on startup; a file that is
//! missing or unreadable yields the defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::style::{Style, Stylesheet};
use crate::Result;

/// Default config file path.
pub fn default_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("umbra")
        .join("config.json")
}

/// One configured widget instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Behavior kind, e.g. `label` or `progress`.
    pub kind: String,
    /// Unique instance id, also used as the widget root's selector id.
    pub id: String,
    /// Config variable values, keyed by the kind's schema names.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// One stylesheet rule as a property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRuleConfig {
    pub selector: String,
    #[serde(default)]
    pub style: BTreeMap<String, String>,
}

/// Persisted settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_scale")]
    pub ui_scale: f32,
    #[serde(default = "default_width")]
    pub viewport_width: f32,
    #[serde(default = "default_height")]
    pub viewport_height: f32,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
    /// Ordered rules; later rules win within the same layer.
    #[serde(default)]
    pub stylesheet: Vec<StyleRuleConfig>,
    /// Fixed user placeholders (name -> value).
    #[serde(default)]
    pub placeholders: BTreeMap<String, String>,
    /// Config variable overrides.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Path the settings were loaded from (not serialized).
    #[serde(skip)]
    path: PathBuf,
}

fn default_scale() -> f32 { 1.0 }
fn default_width() -> f32 { 1920.0 }
fn default_height() -> f32 { 1080.0 }
fn default_log_filter() -> String { "umbra_ui=info".into() }

impl Default for Settings {
    fn default() -> Self {
        Self {
            ui_scale: default_scale(),
            viewport_width: default_width(),
            viewport_height: default_height(),
            log_filter: default_log_filter(),
            widgets: Vec::new(),
            stylesheet: Vec::new(),
            placeholders: BTreeMap::new(),
            variables: BTreeMap::new(),
            path: default_path(),
        }
    }
}

impl Settings {
    /// Load from the default location, falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from(default_path())
    }

    /// Load from `path`, falling back to defaults on any error.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let mut settings = match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::debug!("no settings at {}: {}", path.display(), e);
                Self::default()
            }
        };
        settings.path = path.to_path_buf();
        settings
    }

    /// Path these settings were loaded from and will be saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist to the path the settings were loaded from.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// Persist to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Build a stylesheet from the configured rules. Rules with a malformed
    /// selector are skipped with a warning.
    pub fn build_stylesheet(&self) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        for rule in &self.stylesheet {
            let style = Style::from_properties(&rule.style);
            if let Err(e) = sheet.add_rule(&rule.selector, style) {
                tracing::warn!("skipping style rule '{}': {}", rule.selector, e);
            }
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"ui_scale": 2.0}"#).unwrap();
        assert_eq!(settings.ui_scale, 2.0);
        assert_eq!(settings.viewport_width, 1920.0);
        assert_eq!(settings.log_filter, "umbra_ui=info");
        assert!(settings.widgets.is_empty());
    }

    #[test]
    fn bad_rules_are_skipped() {
        let settings: Settings = serde_json::from_str(
            r##"{"stylesheet": [
                {"selector": "bad selector", "style": {"gap": "4"}},
                {"selector": ".toolbar", "style": {"gap": "4"}}
            ]}"##,
        )
        .unwrap();
        let sheet = settings.build_stylesheet();
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.rules()[0].style.gap, Some(4.0));
    }
}
