//! Shared test helpers.

use umbra_ui::placeholder::PlaceholderRegistry;
use umbra_ui::script::{Evaluator, FunctionRegistry, Template};

/// Registry preloaded with `(name, value)` pairs.
pub fn registry(values: &[(&str, &str)]) -> PlaceholderRegistry {
    let mut registry = PlaceholderRegistry::new();
    for (name, value) in values {
        registry
            .register(name, value, "test value")
            .expect("unique test placeholder");
    }
    registry
}

/// Compile and render a template with the built-in functions.
pub fn render(source: &str, registry: &PlaceholderRegistry) -> umbra_ui::Result<String> {
    let functions = FunctionRegistry::with_builtins();
    let template = Template::compile(source)?;
    template.render(&Evaluator::new(registry, &functions))
}
