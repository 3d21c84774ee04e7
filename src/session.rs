//! Session context: everything one toolbar needs, owned in one place.
//!
//! The host drives a [`Session`] through `on_tick` (placeholder providers,
//! then widgets), `on_draw` (layout, then draw list) and the mouse entry
//! points. Nothing in the session is global; two sessions never share state.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{Settings, WidgetConfig};
use crate::cvars::ConfigVariables;
use crate::event::SubscriptionId;
use crate::node::{NodeId, NodeTree, Rect, TextMeasure};
use crate::placeholder::{
    PlaceholderChanged, PlaceholderProvider, PlaceholderRegistry, ProviderTable, SessionProvider,
    StaticProvider,
};
use crate::render::{draw_tree, hit_test, DrawList};
use crate::script::{EvalError, Evaluator, FunctionRegistry, TemplateCache};
use crate::style::Stylesheet;
use crate::widget::{WidgetContext, WidgetFactory, WidgetManager};
use crate::Result;

const CVAR_PREFIX: &str = "cvar.";

/// Collects providers, functions, styles and widgets, then builds a
/// [`Session`] with everything registered.
pub struct SessionBuilder {
    providers: Vec<(Box<dyn PlaceholderProvider>, u64)>,
    functions: FunctionRegistry,
    stylesheet: Stylesheet,
    scale: f32,
    widgets: Vec<WidgetConfig>,
    kinds: Vec<(String, WidgetFactory)>,
    variables: BTreeMap<String, String>,
    measure: Option<Box<dyn TextMeasure>>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder {
    /// Builder with the built-in functions and the session counters.
    pub fn new() -> Self {
        Self {
            providers: vec![(Box::new(SessionProvider), 0)],
            functions: FunctionRegistry::with_builtins(),
            stylesheet: Stylesheet::new(),
            scale: 1.0,
            widgets: Vec::new(),
            kinds: Vec::new(),
            variables: BTreeMap::new(),
            measure: None,
        }
    }

    /// Builder preloaded from persisted settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builder = Self::new()
            .stylesheet(settings.build_stylesheet())
            .scale(settings.ui_scale);
        if !settings.placeholders.is_empty() {
            let values = settings
                .placeholders
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()));
            builder = builder.provider(Box::new(StaticProvider::new(values)), 0);
        }
        for widget in &settings.widgets {
            builder = builder.widget(widget.clone());
        }
        for (name, value) in &settings.variables {
            builder = builder.variable(name, value);
        }
        builder
    }

    /// Register a provider, updated every `interval_ms` (0 = every tick).
    pub fn provider(mut self, provider: Box<dyn PlaceholderProvider>, interval_ms: u64) -> Self {
        self.providers.push((provider, interval_ms));
        self
    }

    pub fn function<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<String, EvalError> + 'static,
    {
        self.functions.register(name, function);
        self
    }

    pub fn stylesheet(mut self, stylesheet: Stylesheet) -> Self {
        self.stylesheet = stylesheet;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn widget(mut self, config: WidgetConfig) -> Self {
        self.widgets.push(config);
        self
    }

    pub fn widget_kind(mut self, kind: &str, factory: WidgetFactory) -> Self {
        self.kinds.push((kind.to_string(), factory));
        self
    }

    /// Override a config variable.
    pub fn variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text_measure(mut self, measure: Box<dyn TextMeasure>) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Register every placeholder and widget. Widgets that fail to build are
    /// skipped with a warning; duplicate placeholder names are an error.
    pub fn build(self) -> Result<Session> {
        let mut tree = match self.measure {
            Some(measure) => NodeTree::with_measure(measure),
            None => NodeTree::new(),
        };
        tree.set_scale(self.scale);
        tree.set_stylesheet(self.stylesheet);

        let mut placeholders = PlaceholderRegistry::new();
        let mut providers = ProviderTable::new();
        for (provider, interval_ms) in self.providers {
            providers.register(provider, interval_ms);
        }
        providers.register_all(&mut placeholders)?;

        let mut variables = ConfigVariables::new();
        let mut widgets = WidgetManager::new();
        for (kind, factory) in self.kinds {
            widgets.register_kind(&kind, factory);
        }
        widgets.ensure_root(&mut tree)?;
        widgets.add_all(&mut tree, &mut variables, &self.widgets);
        for (name, value) in &self.variables {
            variables.set(name, value);
        }

        let mirrored: Vec<(String, String)> = variables
            .all()
            .into_iter()
            .map(|(k, v)| (format!("{}{}", CVAR_PREFIX, k), v.to_string()))
            .collect();
        for (name, value) in &mirrored {
            placeholders.register(name, value, "Config variable")?;
        }

        tracing::info!(
            "session started: {} widget(s), {} placeholder(s)",
            widgets.len(),
            placeholders.len()
        );
        Ok(Session {
            tree,
            placeholders,
            providers,
            functions: self.functions,
            templates: TemplateCache::new(),
            variables,
            widgets,
            occluders: Vec::new(),
            hovered: BTreeSet::new(),
            pressed: None,
        })
    }
}

/// A running toolbar.
pub struct Session {
    tree: NodeTree,
    placeholders: PlaceholderRegistry,
    providers: ProviderTable,
    functions: FunctionRegistry,
    templates: TemplateCache,
    variables: ConfigVariables,
    widgets: WidgetManager,
    occluders: Vec<Rect>,
    /// Hovered node and its ancestors.
    hovered: BTreeSet<NodeId>,
    pressed: Option<NodeId>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tree", &self.tree)
            .field("placeholders", &self.placeholders.len())
            .field("providers", &self.providers)
            .field("widgets", &self.widgets.len())
            .finish()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Host update tick: refresh providers, then widgets.
    pub fn on_tick(&mut self, delta_ms: u64) {
        self.providers.on_tick(delta_ms, &mut self.placeholders);
        let mut ctx = WidgetContext {
            tree: &mut self.tree,
            placeholders: &self.placeholders,
            functions: &self.functions,
            templates: &mut self.templates,
            variables: &self.variables,
        };
        self.widgets.on_tick(&mut ctx);
        tracing::trace!("tick {}ms", delta_ms);
    }

    /// Host render frame: lay out the toolbar in `width` x `height` and
    /// return what to draw.
    pub fn on_draw(&mut self, width: f32, height: f32) -> DrawList {
        let Some(root) = self.widgets.root() else {
            return DrawList::new();
        };
        if let Err(e) = self.tree.compute_layout(root, width, height) {
            tracing::warn!("layout failed: {}", e);
            return DrawList::new();
        }
        draw_tree(&self.tree, root, &self.occluders)
    }

    /// Native windows drawn above the toolbar. Covered nodes are neither
    /// drawn nor hit.
    pub fn set_occluders(&mut self, occluders: Vec<Rect>) {
        self.occluders = occluders;
    }

    pub fn occluders(&self) -> &[Rect] {
        &self.occluders
    }

    fn hit(&self, x: f32, y: f32) -> Option<NodeId> {
        let root = self.widgets.root()?;
        hit_test(&self.tree, root, (x, y), &self.occluders)
    }

    fn is_disabled(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if self.tree.get(c).is_some_and(|n| n.is_disabled()) {
                return true;
            }
            current = self.tree.parent(c);
        }
        false
    }

    /// Move the pointer. The hit node and its ancestors become `:hover`.
    /// Returns the node under the pointer.
    pub fn on_mouse_move(&mut self, x: f32, y: f32) -> Option<NodeId> {
        let hit = self.hit(x, y);
        let mut chain = BTreeSet::new();
        let mut current = hit;
        while let Some(id) = current {
            chain.insert(id);
            current = self.tree.parent(id);
        }
        for id in self.hovered.difference(&chain) {
            let _ = self.tree.set_hovered(*id, false);
        }
        for id in chain.difference(&self.hovered) {
            let _ = self.tree.set_hovered(*id, true);
        }
        self.hovered = chain;
        hit
    }

    /// Press on a node, making it `:active`. Disabled nodes ignore presses.
    pub fn on_mouse_down(&mut self, x: f32, y: f32) -> Option<NodeId> {
        let hit = self.hit(x, y).filter(|id| !self.is_disabled(*id))?;
        let _ = self.tree.set_active(hit, true);
        self.pressed = Some(hit);
        Some(hit)
    }

    /// Release the pointer. Returns the clicked node when the release lands
    /// on the node that was pressed.
    pub fn on_mouse_up(&mut self, x: f32, y: f32) -> Option<NodeId> {
        let pressed = self.pressed.take()?;
        let _ = self.tree.set_active(pressed, false);
        (self.hit(x, y) == Some(pressed)).then_some(pressed)
    }

    /// Evaluate a template against the current placeholder values.
    pub fn render_template(&mut self, source: &str) -> Result<String> {
        let template = self.templates.get_or_compile(source);
        let evaluator = Evaluator::new(&self.placeholders, &self.functions);
        template.render(&evaluator)
    }

    /// Change a config variable and its `cvar.<name>` placeholder.
    /// Returns true if the value changed.
    pub fn set_config_variable(&mut self, name: &str, value: &str) -> Result<bool> {
        let changed = self.variables.set(name, value);
        let key = format!("{}{}", CVAR_PREFIX, name.to_lowercase());
        if self.placeholders.has(&key) {
            self.placeholders.set(&key, value)?;
        } else {
            self.placeholders.register(&key, value, "Config variable")?;
        }
        Ok(changed)
    }

    pub fn config_variables(&self) -> &ConfigVariables {
        &self.variables
    }

    pub fn on_placeholder_changed(
        &mut self,
        callback: impl FnMut(&PlaceholderChanged) + 'static,
    ) -> SubscriptionId {
        self.placeholders.on_value_changed(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.placeholders.unsubscribe(id)
    }

    pub fn placeholders(&self) -> &PlaceholderRegistry {
        &self.placeholders
    }

    pub fn placeholders_mut(&mut self) -> &mut PlaceholderRegistry {
        &mut self.placeholders
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }

    pub fn widgets(&self) -> &WidgetManager {
        &self.widgets
    }

    /// Add a widget at runtime.
    pub fn add_widget(&mut self, config: &WidgetConfig) -> Result<NodeId> {
        let root = self
            .widgets
            .add(&mut self.tree, &mut self.variables, config)?
            .root();
        Ok(root)
    }

    pub fn remove_widget(&mut self, id: &str) -> Result<()> {
        self.widgets.remove(&mut self.tree, id)
    }

    pub fn toolbar_root(&self) -> Option<NodeId> {
        self.widgets.root()
    }

    pub fn set_stylesheet(&mut self, stylesheet: Stylesheet) {
        self.tree.set_stylesheet(stylesheet);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.tree.set_scale(scale);
    }

    /// Unregister every placeholder and tear down the widget nodes.
    pub fn shutdown(&mut self) {
        self.providers.shutdown(&mut self.placeholders);
        let cvars: Vec<String> = self
            .placeholders
            .all()
            .filter(|p| p.name.starts_with(CVAR_PREFIX))
            .map(|p| p.name.clone())
            .collect();
        for name in cvars {
            self.placeholders.unregister(&name);
        }
        self.widgets.clear(&mut self.tree);
        self.hovered.clear();
        self.pressed = None;
        tracing::info!("session shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(id: &str, template: &str) -> WidgetConfig {
        WidgetConfig {
            kind: "label".to_string(),
            id: id.to_string(),
            variables: [("label".to_string(), template.to_string())].into(),
        }
    }

    #[test]
    fn tick_renders_labels() {
        let mut session = Session::builder()
            .widget(label("ticks", "tick [session.ticks]"))
            .build()
            .unwrap();
        session.on_tick(16);
        session.on_tick(16);

        let label = session.widgets().get("ticks").unwrap().parts().label.unwrap();
        assert_eq!(session.tree().get(label).unwrap().text(), Some("tick 2"));
    }

    #[test]
    fn config_variables_are_mirrored() {
        let mut session = Session::builder()
            .widget(label("clock", "[cvar.clock.label]"))
            .build()
            .unwrap();
        assert_eq!(
            session.placeholders().get("cvar.clock.label").unwrap(),
            "[cvar.clock.label]"
        );

        assert!(session.set_config_variable("Clock.Icon", "*").unwrap());
        assert_eq!(session.placeholders().get("cvar.clock.icon").unwrap(), "*");
        assert!(session.set_config_variable("theme", "dark").unwrap());
        assert_eq!(session.render_template("[cvar.theme]").unwrap(), "dark");
    }

    #[test]
    fn pointer_hover_and_click() {
        use crate::style::{Color, Style};

        let red = Color::rgb(1.0, 0.0, 0.0);
        let mut sheet = Stylesheet::new();
        sheet.add_rule("#a", Style::new().with_size(20.0, 10.0)).unwrap();
        sheet
            .add_rule("#a:hover", Style::new().with_background(red))
            .unwrap();
        let mut session = Session::builder()
            .stylesheet(sheet)
            .widget(label("a", ""))
            .build()
            .unwrap();
        let widget = session.widgets().get("a").unwrap().root();
        session.on_draw(100.0, 100.0);

        assert_eq!(session.on_mouse_move(5.0, 5.0), Some(widget));
        session.on_draw(100.0, 100.0);
        let style = session.tree().get(widget).unwrap().computed_style();
        assert_eq!(style.background_color, red);

        assert_eq!(session.on_mouse_move(50.0, 50.0), None);
        session.on_draw(100.0, 100.0);
        let style = session.tree().get(widget).unwrap().computed_style();
        assert_eq!(style.background_color, Color::TRANSPARENT);

        assert_eq!(session.on_mouse_down(5.0, 5.0), Some(widget));
        assert_eq!(session.on_mouse_up(6.0, 6.0), Some(widget));
        session.on_mouse_down(5.0, 5.0);
        assert_eq!(session.on_mouse_up(60.0, 6.0), None);

        session.set_occluders(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(session.on_mouse_move(5.0, 5.0), None);
    }

    #[test]
    fn shutdown_clears_everything() {
        let mut session = Session::builder()
            .widget(label("a", "x"))
            .build()
            .unwrap();
        session.shutdown();
        assert!(session.placeholders().is_empty());
        assert!(session.tree().is_empty());
        assert!(session.on_draw(100.0, 100.0).is_empty());
    }
}
