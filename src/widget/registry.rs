//! Widget kinds and the toolbar that holds widget instances.

use std::collections::BTreeMap;

use super::{LabelWidget, ProgressWidget, Widget, WidgetBehavior, WidgetContext};
use crate::config::WidgetConfig;
use crate::cvars::ConfigVariables;
use crate::node::{NodeId, NodeTree};
use crate::style::{Flow, Style};
use crate::{Error, Result};

/// Creates a fresh behavior for a widget kind.
pub type WidgetFactory = Box<dyn Fn() -> Box<dyn WidgetBehavior>>;

/// Toolbar of widgets, in display order.
pub struct WidgetManager {
    /// Factories by lowercase kind name.
    kinds: BTreeMap<String, WidgetFactory>,
    widgets: Vec<Widget>,
    root: Option<NodeId>,
}

impl Default for WidgetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WidgetManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetManager")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .field("widgets", &self.widgets)
            .field("root", &self.root)
            .finish()
    }
}

impl WidgetManager {
    /// Manager with the built-in `label` and `progress` kinds.
    pub fn new() -> Self {
        let mut manager = Self {
            kinds: BTreeMap::new(),
            widgets: Vec::new(),
            root: None,
        };
        manager.register_kind("label", Box::new(|| Box::new(LabelWidget) as Box<dyn WidgetBehavior>));
        manager.register_kind(
            "progress",
            Box::new(|| Box::new(ProgressWidget) as Box<dyn WidgetBehavior>),
        );
        manager
    }

    /// Register (or replace) a widget kind.
    pub fn register_kind(&mut self, kind: &str, factory: WidgetFactory) {
        self.kinds.insert(kind.to_lowercase(), factory);
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Toolbar root node, created on first use.
    pub fn ensure_root(&mut self, tree: &mut NodeTree) -> Result<NodeId> {
        if let Some(root) = self.root.filter(|r| tree.contains(*r)) {
            return Ok(root);
        }
        let root = tree.create_node();
        tree.set_name(root, Some("toolbar"))?;
        tree.add_class(root, "toolbar")?;
        tree.set_style(root, Style::new().with_flow(Flow::Horizontal))?;
        self.root = Some(root);
        Ok(root)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Create a widget from its config and append it to the toolbar.
    ///
    /// The kind's schema defaults are registered as `<id>.<name>` config
    /// variables and the config's own values are applied as overrides.
    pub fn add(
        &mut self,
        tree: &mut NodeTree,
        variables: &mut ConfigVariables,
        config: &WidgetConfig,
    ) -> Result<&Widget> {
        if self.get(&config.id).is_some() {
            return Err(Error::DuplicateWidget(config.id.clone()));
        }
        let root = self.ensure_root(tree)?;
        self.add_under(tree, variables, config, root)
    }

    /// Variables are only touched once the widget's nodes exist.
    fn add_under(
        &mut self,
        tree: &mut NodeTree,
        variables: &mut ConfigVariables,
        config: &WidgetConfig,
        parent: NodeId,
    ) -> Result<&Widget> {
        let factory = self
            .kinds
            .get(&config.kind.to_lowercase())
            .ok_or_else(|| Error::UnknownWidgetKind(config.kind.clone()))?;
        let behavior = factory();
        let schema = behavior.config_schema();
        let widget = Widget::build(tree, parent, &config.id, behavior)?;

        for spec in schema {
            variables.register(&format!("{}.{}", config.id, spec.name), &spec.default);
        }
        for (name, value) in &config.variables {
            variables.set(&format!("{}.{}", config.id, name), value);
        }

        tracing::debug!("added {} widget '{}'", widget.kind(), widget.id());
        self.widgets.push(widget);
        Ok(&self.widgets[self.widgets.len() - 1])
    }

    /// Add every configured widget. A widget that fails to build is logged
    /// and skipped; the rest of the toolbar is still created.
    pub fn add_all<'c>(
        &mut self,
        tree: &mut NodeTree,
        variables: &mut ConfigVariables,
        configs: impl IntoIterator<Item = &'c WidgetConfig>,
    ) -> usize {
        let mut added = 0;
        for config in configs {
            match self.add(tree, variables, config) {
                Ok(_) => added += 1,
                Err(e) => tracing::warn!("skipping widget '{}': {}", config.id, e),
            }
        }
        added
    }

    /// Remove a widget and its nodes.
    pub fn remove(&mut self, tree: &mut NodeTree, id: &str) -> Result<()> {
        let index = self
            .widgets
            .iter()
            .position(|w| w.id() == id)
            .ok_or_else(|| Error::UnknownWidget(id.to_string()))?;
        let widget = self.widgets.remove(index);
        tree.remove(widget.root())?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Widget> {
        self.widgets.iter()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Tick every widget. Failures are logged per widget.
    pub fn on_tick(&mut self, ctx: &mut WidgetContext<'_>) {
        for widget in &mut self.widgets {
            if let Err(e) = widget.on_tick(ctx) {
                tracing::warn!("widget '{}' update failed: {}", widget.id(), e);
            }
        }
    }

    /// Remove every widget and the toolbar root.
    pub fn clear(&mut self, tree: &mut NodeTree) {
        self.widgets.clear();
        if let Some(root) = self.root.take() {
            let _ = tree.remove(root);
        }
    }
}
