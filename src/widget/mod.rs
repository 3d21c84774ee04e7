//! Toolbar widgets.
//!
//! A [`Widget`] is a plain struct: a capability set deciding which node parts
//! it owns (icon, text, progress bar) plus a boxed [`WidgetBehavior`] for the
//! few things that differ per kind. Widgets are created from a
//! [`WidgetConfig`](crate::config::WidgetConfig) by the [`WidgetManager`].

mod builtin;
mod registry;

pub use builtin::{LabelWidget, ProgressWidget};
pub use registry::{WidgetFactory, WidgetManager};

use std::fmt;

use bitflags::bitflags;

use crate::cvars::ConfigVariables;
use crate::node::{NodeId, NodeTree};
use crate::placeholder::PlaceholderRegistry;
use crate::script::{Evaluator, FunctionRegistry, TemplateCache};
use crate::style::{Flow, Style};
use crate::Result;

bitflags! {
    /// Which parts a widget is built from.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const NONE = 0;
        const ICON = 1;
        const TEXT = 1 << 1;
        const PROGRESS_BAR = 1 << 2;
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Capabilities::NONE
    }
}

impl Capabilities {
    pub fn names(self) -> Vec<&'static str> {
        [
            (Self::ICON, "icon"),
            (Self::TEXT, "text"),
            (Self::PROGRESS_BAR, "progress-bar"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect()
    }
}

/// One entry of a widget kind's config schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    pub description: String,
    pub default: String,
}

impl VariableSpec {
    pub fn new(name: &str, description: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            default: default.to_string(),
        }
    }
}

/// Node ids of a widget's parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetParts {
    pub id: String,
    pub root: NodeId,
    pub icon: Option<NodeId>,
    pub label: Option<NodeId>,
    pub bar: Option<NodeId>,
    pub fill: Option<NodeId>,
}

impl WidgetParts {
    /// Config variable key of one of this widget's variables.
    pub fn variable_key(&self, name: &str) -> String {
        format!("{}.{}", self.id, name)
    }
}

/// Everything a behavior can touch during a tick.
pub struct WidgetContext<'a> {
    pub tree: &'a mut NodeTree,
    pub placeholders: &'a PlaceholderRegistry,
    pub functions: &'a FunctionRegistry,
    pub templates: &'a mut TemplateCache,
    pub variables: &'a ConfigVariables,
}

impl WidgetContext<'_> {
    /// Value of one of the widget's variables, or its registered default.
    pub fn variable(&self, parts: &WidgetParts, name: &str) -> String {
        self.variables
            .get(&parts.variable_key(name))
            .unwrap_or_default()
            .to_string()
    }

    /// Render a template against the current placeholder values. Broken
    /// templates show their source, failed lookups render empty.
    pub fn render(&mut self, source: &str) -> String {
        let template = self.templates.get_or_compile(source);
        let evaluator = Evaluator::new(self.placeholders, self.functions);
        template.render_or_fallback(&evaluator, "")
    }
}

/// Per-kind behavior of a widget.
pub trait WidgetBehavior {
    /// Kind name used in settings, e.g. `label`.
    fn kind(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Variables this kind reads, with their defaults.
    fn config_schema(&self) -> Vec<VariableSpec>;

    /// Refresh the widget's nodes from its variables and placeholders.
    fn on_tick(&mut self, parts: &WidgetParts, ctx: &mut WidgetContext<'_>) -> Result<()>;
}

/// A widget instance in the toolbar.
pub struct Widget {
    parts: WidgetParts,
    capabilities: Capabilities,
    behavior: Box<dyn WidgetBehavior>,
}

impl fmt::Debug for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.parts.id)
            .field("kind", &self.behavior.kind())
            .field("capabilities", &self.capabilities.names())
            .field("root", &self.parts.root)
            .finish()
    }
}

impl Widget {
    /// Build the widget's nodes under `parent`.
    ///
    /// The root node gets the widget id as selector id and the classes
    /// `widget` and the kind name; parts get `icon`, `label`, `bar` and
    /// `fill`.
    pub fn build(
        tree: &mut NodeTree,
        parent: NodeId,
        id: &str,
        behavior: Box<dyn WidgetBehavior>,
    ) -> Result<Self> {
        let capabilities = behavior.capabilities();
        let root = tree.create_child(parent, Some(id), Style::new().with_flow(Flow::Horizontal))?;
        tree.add_class(root, "widget")?;
        tree.add_class(root, behavior.kind())?;

        let mut part = |class: &str, parent: NodeId| -> Result<NodeId> {
            let node = tree.create_child(parent, None, Style::new())?;
            tree.add_class(node, class)?;
            Ok(node)
        };
        let icon = if capabilities.contains(Capabilities::ICON) {
            Some(part("icon", root)?)
        } else {
            None
        };
        let label = if capabilities.contains(Capabilities::TEXT) {
            Some(part("label", root)?)
        } else {
            None
        };
        let (bar, fill) = if capabilities.contains(Capabilities::PROGRESS_BAR) {
            let bar = part("bar", root)?;
            (Some(bar), Some(part("fill", bar)?))
        } else {
            (None, None)
        };

        Ok(Self {
            parts: WidgetParts {
                id: id.to_string(),
                root,
                icon,
                label,
                bar,
                fill,
            },
            capabilities,
            behavior,
        })
    }

    pub fn id(&self) -> &str {
        &self.parts.id
    }

    pub fn kind(&self) -> &str {
        self.behavior.kind()
    }

    pub fn root(&self) -> NodeId {
        self.parts.root
    }

    pub fn parts(&self) -> &WidgetParts {
        &self.parts
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn config_schema(&self) -> Vec<VariableSpec> {
        self.behavior.config_schema()
    }

    pub fn on_tick(&mut self, ctx: &mut WidgetContext<'_>) -> Result<()> {
        self.behavior.on_tick(&self.parts, ctx)
    }
}
