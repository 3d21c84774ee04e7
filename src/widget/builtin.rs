//! Built-in widget behaviors.

use super::{Capabilities, VariableSpec, WidgetBehavior, WidgetContext, WidgetParts};
use crate::style::Style;
use crate::Result;

/// Render the `label` template into the label part, hiding it when empty.
fn update_label(parts: &WidgetParts, ctx: &mut WidgetContext<'_>) -> Result<()> {
    let Some(label) = parts.label else {
        return Ok(());
    };
    let source = ctx.variable(parts, "label");
    let text = ctx.render(&source);
    ctx.tree.set_visible(label, !text.is_empty())?;
    ctx.tree.set_text(label, Some(&text))
}

fn length_variable(parts: &WidgetParts, ctx: &WidgetContext<'_>, name: &str, default: f32) -> f32 {
    let raw = ctx.variable(parts, name);
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            tracing::warn!("widget {}: invalid {} '{}', using {}", parts.id, name, raw, default);
            default
        }
    }
}

/// Text widget: an optional icon glyph followed by a rendered template.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabelWidget;

impl WidgetBehavior for LabelWidget {
    fn kind(&self) -> &str {
        "label"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ICON | Capabilities::TEXT
    }

    fn config_schema(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::new("label", "Template shown as the widget text", ""),
            VariableSpec::new("icon", "Glyph shown before the text", ""),
        ]
    }

    fn on_tick(&mut self, parts: &WidgetParts, ctx: &mut WidgetContext<'_>) -> Result<()> {
        if let Some(icon) = parts.icon {
            let glyph = ctx.variable(parts, "icon");
            ctx.tree.set_visible(icon, !glyph.is_empty())?;
            ctx.tree.set_text(icon, Some(&glyph))?;
        }
        update_label(parts, ctx)
    }
}

/// Progress bar widget. The `value` template must render to a number in
/// `0..=1`; anything else is clamped, and non-numbers show an empty bar.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProgressWidget;

impl WidgetBehavior for ProgressWidget {
    fn kind(&self) -> &str {
        "progress"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::TEXT | Capabilities::PROGRESS_BAR
    }

    fn config_schema(&self) -> Vec<VariableSpec> {
        vec![
            VariableSpec::new("value", "Template producing the fill fraction", "0"),
            VariableSpec::new("label", "Template shown next to the bar", ""),
            VariableSpec::new("width", "Bar width in pixels", "100"),
            VariableSpec::new("height", "Bar height in pixels", "6"),
        ]
    }

    fn on_tick(&mut self, parts: &WidgetParts, ctx: &mut WidgetContext<'_>) -> Result<()> {
        let source = ctx.variable(parts, "value");
        let rendered = ctx.render(&source);
        let fraction = match rendered.trim().parse::<f32>() {
            Ok(v) if v.is_finite() => v.clamp(0.0, 1.0),
            _ => {
                tracing::debug!("widget {}: progress '{}' is not a number", parts.id, rendered);
                0.0
            }
        };
        let width = length_variable(parts, ctx, "width", 100.0);
        let height = length_variable(parts, ctx, "height", 6.0);

        if let Some(bar) = parts.bar {
            ctx.tree
                .merge_style(bar, &Style::new().with_size(width, height))?;
        }
        if let Some(fill) = parts.fill {
            ctx.tree
                .merge_style(fill, &Style::new().with_size(width * fraction, height))?;
        }
        update_label(parts, ctx)
    }
}
