//! Style properties, selectors and stylesheets.
//!
//! A [`Style`] is a sparse set of properties: every field may be unset, and
//! merging one style onto another only overwrites the fields it sets.
//! [`ComputedStyle`] fills the gaps with defaults for the layout pass.

mod anchor;
pub mod selector;
pub mod stylesheet;

pub use anchor::{Anchor, HAlign, VAlign};
pub use selector::{NodeState, PseudoState, Selector, SelectorError};
pub use stylesheet::{StyleRule, Styleable, Stylesheet};

/// RGBA color value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic color name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let Some(hex) = s.strip_prefix('#') else {
            return Self::named(s);
        };
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize, len: usize| -> Option<f32> {
            let v = u8::from_str_radix(&hex[i..i + len], 16).ok()?;
            let v = if len == 1 { v * 17 } else { v };
            Some(f32::from(v) / 255.0)
        };
        match hex.len() {
            3 => Some(Self::rgb(channel(0, 1)?, channel(1, 1)?, channel(2, 1)?)),
            6 => Some(Self::rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
            8 => Some(Self::new(
                channel(0, 2)?,
                channel(2, 2)?,
                channel(4, 2)?,
                channel(6, 2)?,
            )),
            _ => None,
        }
    }

    fn named(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            "transparent" => Some(Self::TRANSPARENT),
            "red" => Some(Self::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Self::rgb(0.0, 1.0, 0.0)),
            "blue" => Some(Self::rgb(0.0, 0.0, 1.0)),
            "yellow" => Some(Self::rgb(1.0, 1.0, 0.0)),
            "gray" | "grey" => Some(Self::rgb(0.5, 0.5, 0.5)),
            _ => None,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Requested box size; zero on an axis means "fit content".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Per-edge lengths used for padding and margin.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeSize {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl EdgeSize {
    pub const ZERO: Self = Self::all(0.0);

    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn all(v: f32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Vertical and horizontal shorthand.
    pub const fn xy(vertical: f32, horizontal: f32) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    pub fn scaled(&self, scale: f32) -> Self {
        Self::new(
            self.top * scale,
            self.right * scale,
            self.bottom * scale,
            self.left * scale,
        )
    }

    fn is_valid(&self) -> bool {
        [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// CSS-like shorthand: one, two or four space separated numbers.
    pub fn parse(s: &str) -> Option<Self> {
        let values: Vec<f32> = s
            .split_whitespace()
            .map(|v| v.trim_end_matches("px").parse().ok())
            .collect::<Option<_>>()?;
        match values.as_slice() {
            [a] => Some(Self::all(*a)),
            [v, h] => Some(Self::xy(*v, *h)),
            [t, r, b, l] => Some(Self::new(*t, *r, *b, *l)),
            _ => None,
        }
    }
}

/// Primary axis along which children are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Horizontal,
    Vertical,
}

impl Flow {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" | "row" => Some(Self::Horizontal),
            "vertical" | "column" => Some(Self::Vertical),
            _ => None,
        }
    }
}

/// Sparse style: `None` means "not set by this layer".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub flow: Option<Flow>,
    pub anchor: Option<Anchor>,
    pub size: Option<Size>,
    pub padding: Option<EdgeSize>,
    pub margin: Option<EdgeSize>,
    pub gap: Option<f32>,
    pub color: Option<Color>,
    pub background_color: Option<Color>,
    pub border_color: Option<Color>,
    pub border_width: Option<f32>,
    pub font: Option<u32>,
    pub font_size: Option<f32>,
    pub opacity: Option<f32>,
}

macro_rules! merge_fields {
    ($dst:ident, $src:ident, $($field:ident),* $(,)?) => {
        $(
            if $src.$field.is_some() {
                $dst.$field = $src.$field;
            }
        )*
    };
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the properties `other` sets, keep the rest.
    pub fn merge(&mut self, other: &Style) {
        merge_fields!(
            self,
            other,
            flow,
            anchor,
            size,
            padding,
            margin,
            gap,
            color,
            background_color,
            border_color,
            border_width,
            font,
            font_size,
            opacity,
        );
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Build a style from `(name, value)` string pairs. Unknown names and
    /// invalid values are logged and skipped.
    pub fn from_properties<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut style = Self::new();
        for (name, value) in properties {
            style.set_property(name.as_ref(), value.as_ref());
        }
        style
    }

    /// Set one property from its textual form. Returns false (and leaves the
    /// property unset) when the name or value is not understood.
    pub fn set_property(&mut self, name: &str, value: &str) -> bool {
        let key = name.trim().to_ascii_lowercase().replace('_', "-");
        let ok = match key.as_str() {
            "flow" => Flow::parse(value).map(|v| self.flow = Some(v)).is_some(),
            "anchor" => Anchor::parse(value).map(|v| self.anchor = Some(v)).is_some(),
            "size" => parse_size(value).map(|v| self.size = Some(v)).is_some(),
            "padding" => EdgeSize::parse(value)
                .filter(EdgeSize::is_valid)
                .map(|v| self.padding = Some(v))
                .is_some(),
            "margin" => EdgeSize::parse(value)
                .filter(EdgeSize::is_valid)
                .map(|v| self.margin = Some(v))
                .is_some(),
            "gap" => parse_length(value).map(|v| self.gap = Some(v)).is_some(),
            "color" => Color::parse(value).map(|v| self.color = Some(v)).is_some(),
            "background-color" => Color::parse(value)
                .map(|v| self.background_color = Some(v))
                .is_some(),
            "border-color" => Color::parse(value)
                .map(|v| self.border_color = Some(v))
                .is_some(),
            "border-width" => parse_length(value)
                .map(|v| self.border_width = Some(v))
                .is_some(),
            "font" => value.trim().parse().ok().map(|v| self.font = Some(v)).is_some(),
            "font-size" => parse_length(value)
                .filter(|v| *v > 0.0)
                .map(|v| self.font_size = Some(v))
                .is_some(),
            "opacity" => value
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|v| (0.0..=1.0).contains(v))
                .map(|v| self.opacity = Some(v))
                .is_some(),
            _ => {
                tracing::warn!("unknown style property '{}'", name);
                return false;
            }
        };
        if !ok {
            tracing::warn!("invalid value '{}' for style property '{}'", value, name);
        }
        ok
    }

    pub fn with_flow(mut self, flow: Flow) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Some(Size::new(width, height));
        self
    }

    pub fn with_padding(mut self, padding: EdgeSize) -> Self {
        self.padding = Some(padding);
        self
    }

    pub fn with_margin(mut self, margin: EdgeSize) -> Self {
        self.margin = Some(margin);
        self
    }

    pub fn with_gap(mut self, gap: f32) -> Self {
        self.gap = Some(gap);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn with_border(mut self, color: Color, width: f32) -> Self {
        self.border_color = Some(color);
        self.border_width = Some(width);
        self
    }

    pub fn with_font(mut self, font: u32, size: f32) -> Self {
        self.font = Some(font);
        self.font_size = Some(size);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }
}

fn parse_length(value: &str) -> Option<f32> {
    value
        .trim()
        .trim_end_matches("px")
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_size(value: &str) -> Option<Size> {
    let mut parts = value.split_whitespace();
    let width = parse_length(parts.next()?)?;
    let height = match parts.next() {
        Some(h) => parse_length(h)?,
        None => width,
    };
    parts.next().is_none().then_some(Size::new(width, height))
}

/// Fully resolved style with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    pub flow: Flow,
    pub anchor: Anchor,
    pub size: Size,
    pub padding: EdgeSize,
    pub margin: EdgeSize,
    pub gap: f32,
    pub color: Color,
    pub background_color: Color,
    pub border_color: Color,
    pub border_width: f32,
    pub font: u32,
    pub font_size: f32,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            flow: Flow::Horizontal,
            anchor: Anchor::TOP_LEFT,
            size: Size::ZERO,
            padding: EdgeSize::ZERO,
            margin: EdgeSize::ZERO,
            gap: 0.0,
            color: Color::WHITE,
            background_color: Color::TRANSPARENT,
            border_color: Color::TRANSPARENT,
            border_width: 0.0,
            font: 0,
            font_size: 12.0,
            opacity: 1.0,
        }
    }
}

impl ComputedStyle {
    /// Fill unset properties with defaults. Values that cannot be laid out
    /// (negative or non-finite lengths) fall back to the default as well.
    pub fn from_style(style: &Style) -> Self {
        let d = Self::default();
        let length = |name: &str, v: Option<f32>, default: f32| match v {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            Some(v) => {
                tracing::warn!("invalid {} {}, using {}", name, v, default);
                default
            }
            None => default,
        };
        let edges = |name: &str, v: Option<EdgeSize>| match v {
            Some(e) if e.is_valid() => e,
            Some(e) => {
                tracing::warn!("invalid {} {:?}, using zero", name, e);
                EdgeSize::ZERO
            }
            None => EdgeSize::ZERO,
        };
        let size = style.size.unwrap_or(d.size);

        Self {
            flow: style.flow.unwrap_or(d.flow),
            anchor: style.anchor.unwrap_or(d.anchor),
            size: Size::new(
                length("width", Some(size.width), 0.0),
                length("height", Some(size.height), 0.0),
            ),
            padding: edges("padding", style.padding),
            margin: edges("margin", style.margin),
            gap: length("gap", style.gap, d.gap),
            color: style.color.unwrap_or(d.color),
            background_color: style.background_color.unwrap_or(d.background_color),
            border_color: style.border_color.unwrap_or(d.border_color),
            border_width: length("border width", style.border_width, d.border_width),
            font: style.font.unwrap_or(d.font),
            font_size: match style.font_size {
                Some(v) if v.is_finite() && v > 0.0 => v,
                Some(v) => {
                    tracing::warn!("invalid font size {}, using {}", v, d.font_size);
                    d.font_size
                }
                None => d.font_size,
            },
            opacity: style.opacity.map(|o| o.clamp(0.0, 1.0)).unwrap_or(d.opacity),
        }
    }
}
