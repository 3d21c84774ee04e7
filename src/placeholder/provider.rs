//! Placeholder providers and the table that drives their updates.
//!
//! Providers are registered explicitly at startup together with their update
//! interval; the table registers every declared placeholder and calls each
//! provider from the host tick once its interval has elapsed.

use super::PlaceholderRegistry;
use crate::Result;

/// A placeholder declared by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderSpec {
    pub name: String,
    pub description: String,
    pub initial: String,
}

impl PlaceholderSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            initial: String::new(),
        }
    }

    pub fn with_initial(mut self, initial: &str) -> Self {
        self.initial = initial.to_string();
        self
    }
}

/// Timing information handed to a provider update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateContext {
    /// Milliseconds since this provider was last updated.
    pub elapsed_ms: u64,
    /// Milliseconds since the table started ticking.
    pub total_ms: u64,
    /// Number of ticks so far, including the current one.
    pub tick: u64,
}

pub trait PlaceholderProvider {
    fn name(&self) -> &str;

    /// Placeholders this provider owns.
    fn placeholders(&self) -> Vec<PlaceholderSpec>;

    /// Push fresh values into the registry.
    fn update(&mut self, registry: &mut PlaceholderRegistry, ctx: &UpdateContext);
}

struct ProviderEntry {
    provider: Box<dyn PlaceholderProvider>,
    interval_ms: u64,
    elapsed_ms: u64,
    registered: Vec<String>,
}

#[derive(Default)]
pub struct ProviderTable {
    entries: Vec<ProviderEntry>,
    total_ms: u64,
    ticks: u64,
}

impl std::fmt::Debug for ProviderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.entries.iter().map(|e| e.provider.name()).collect();
        f.debug_struct("ProviderTable")
            .field("providers", &names)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider updated every `interval_ms` (0 = every tick).
    pub fn register(&mut self, provider: Box<dyn PlaceholderProvider>, interval_ms: u64) {
        self.entries.push(ProviderEntry {
            provider,
            interval_ms,
            elapsed_ms: 0,
            registered: Vec::new(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Register every placeholder declared by the providers.
    pub fn register_all(&mut self, registry: &mut PlaceholderRegistry) -> Result<()> {
        for entry in &mut self.entries {
            for spec in entry.provider.placeholders() {
                if entry.registered.contains(&spec.name) {
                    continue;
                }
                registry.register(&spec.name, &spec.initial, &spec.description)?;
                entry.registered.push(spec.name);
            }
            tracing::debug!(
                "provider {} registered {} placeholder(s)",
                entry.provider.name(),
                entry.registered.len()
            );
        }
        Ok(())
    }

    pub fn on_tick(&mut self, delta_ms: u64, registry: &mut PlaceholderRegistry) {
        self.ticks += 1;
        self.total_ms += delta_ms;

        for entry in &mut self.entries {
            entry.elapsed_ms += delta_ms;
            if entry.interval_ms > 0 && entry.elapsed_ms < entry.interval_ms {
                continue;
            }
            let ctx = UpdateContext {
                elapsed_ms: entry.elapsed_ms,
                total_ms: self.total_ms,
                tick: self.ticks,
            };
            tracing::trace!("updating provider {}", entry.provider.name());
            entry.provider.update(registry, &ctx);
            entry.elapsed_ms = 0;
        }
    }

    /// Unregister every placeholder registered through this table.
    pub fn shutdown(&mut self, registry: &mut PlaceholderRegistry) {
        for entry in &mut self.entries {
            for name in entry.registered.drain(..) {
                registry.unregister(&name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        updates: u32,
    }

    impl PlaceholderProvider for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn placeholders(&self) -> Vec<PlaceholderSpec> {
            vec![PlaceholderSpec::new("counter.value", "Update count").with_initial("0")]
        }

        fn update(&mut self, registry: &mut PlaceholderRegistry, _ctx: &UpdateContext) {
            self.updates += 1;
            let _ = registry.set("counter.value", &self.updates.to_string());
        }
    }

    #[test]
    fn interval_gates_updates() {
        let mut registry = PlaceholderRegistry::new();
        let mut table = ProviderTable::new();
        table.register(Box::new(Counter { updates: 0 }), 100);
        table.register_all(&mut registry).unwrap();
        assert_eq!(registry.get("counter.value"), Ok("0"));

        table.on_tick(40, &mut registry);
        table.on_tick(40, &mut registry);
        assert_eq!(registry.get("counter.value"), Ok("0"));
        table.on_tick(40, &mut registry);
        assert_eq!(registry.get("counter.value"), Ok("1"));
        table.on_tick(50, &mut registry);
        assert_eq!(registry.get("counter.value"), Ok("1"));
    }

    #[test]
    fn zero_interval_updates_every_tick() {
        let mut registry = PlaceholderRegistry::new();
        let mut table = ProviderTable::new();
        table.register(Box::new(Counter { updates: 0 }), 0);
        table.register_all(&mut registry).unwrap();
        table.on_tick(1, &mut registry);
        table.on_tick(1, &mut registry);
        assert_eq!(registry.get("counter.value"), Ok("2"));
    }

    #[test]
    fn shutdown_unregisters() {
        let mut registry = PlaceholderRegistry::new();
        let mut table = ProviderTable::new();
        table.register(Box::new(Counter { updates: 0 }), 0);
        table.register_all(&mut registry).unwrap();
        table.shutdown(&mut registry);
        assert!(!registry.has("counter.value"));
    }
}
