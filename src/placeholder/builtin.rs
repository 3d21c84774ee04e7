//! Built-in placeholder providers.

use std::collections::BTreeMap;

use super::provider::{PlaceholderProvider, PlaceholderSpec, UpdateContext};
use super::PlaceholderRegistry;

/// Session counters: `session.uptime` (whole seconds) and `session.ticks`.
#[derive(Debug, Default)]
pub struct SessionProvider;

impl PlaceholderProvider for SessionProvider {
    fn name(&self) -> &str {
        "session"
    }

    fn placeholders(&self) -> Vec<PlaceholderSpec> {
        vec![
            PlaceholderSpec::new("session.uptime", "Seconds since the session started")
                .with_initial("0"),
            PlaceholderSpec::new("session.ticks", "Number of update ticks").with_initial("0"),
        ]
    }

    fn update(&mut self, registry: &mut PlaceholderRegistry, ctx: &UpdateContext) {
        let _ = registry.set("session.uptime", &(ctx.total_ms / 1000).to_string());
        let _ = registry.set("session.ticks", &ctx.tick.to_string());
    }
}

/// Fixed user-defined values, e.g. from the settings file.
#[derive(Debug, Default)]
pub struct StaticProvider {
    values: BTreeMap<String, String>,
}

impl StaticProvider {
    pub fn new(values: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl PlaceholderProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn placeholders(&self) -> Vec<PlaceholderSpec> {
        self.values
            .iter()
            .map(|(name, value)| PlaceholderSpec::new(name, "User-defined value").with_initial(value))
            .collect()
    }

    fn update(&mut self, _registry: &mut PlaceholderRegistry, _ctx: &UpdateContext) {}
}
