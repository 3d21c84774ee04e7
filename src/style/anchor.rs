//! Anchor flags for aligning a node inside its slot.

use bitflags::bitflags;

/// Horizontal alignment component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical alignment component of an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl HAlign {
    /// Fraction of the free space placed before the box.
    pub fn factor(self) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

impl VAlign {
    pub fn factor(self) -> f32 {
        match self {
            Self::Top => 0.0,
            Self::Middle => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

bitflags! {
    /// Composable anchor flags, e.g. `Anchor::TOP | Anchor::RIGHT`.
    ///
    /// `MIDDLE` is the vertical center and `CENTER` the horizontal one. A
    /// missing component defaults to top / left.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Anchor: u8 {
        const NONE = 0;
        const TOP = 1;
        const MIDDLE = 1 << 1;
        const BOTTOM = 1 << 2;
        const LEFT = 1 << 3;
        const CENTER = 1 << 4;
        const RIGHT = 1 << 5;

        const TOP_LEFT = Self::TOP.bits() | Self::LEFT.bits();
        const TOP_CENTER = Self::TOP.bits() | Self::CENTER.bits();
        const TOP_RIGHT = Self::TOP.bits() | Self::RIGHT.bits();
        const MIDDLE_LEFT = Self::MIDDLE.bits() | Self::LEFT.bits();
        const MIDDLE_CENTER = Self::MIDDLE.bits() | Self::CENTER.bits();
        const MIDDLE_RIGHT = Self::MIDDLE.bits() | Self::RIGHT.bits();
        const BOTTOM_LEFT = Self::BOTTOM.bits() | Self::LEFT.bits();
        const BOTTOM_CENTER = Self::BOTTOM.bits() | Self::CENTER.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::NONE
    }
}

impl Anchor {
    pub fn horizontal(self) -> HAlign {
        if self.contains(Self::CENTER) {
            HAlign::Center
        } else if self.contains(Self::RIGHT) {
            HAlign::Right
        } else {
            HAlign::Left
        }
    }

    pub fn vertical(self) -> VAlign {
        if self.contains(Self::MIDDLE) {
            VAlign::Middle
        } else if self.contains(Self::BOTTOM) {
            VAlign::Bottom
        } else {
            VAlign::Top
        }
    }

    /// Parse names like `TopLeft`, `top-right`, `middle|center` or `bottom`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut anchor = Self::NONE;
        let lower = s.to_ascii_lowercase();
        let mut any = false;
        for part in lower.split(['|', ' ', '-', '_', ',']).filter(|p| !p.is_empty()) {
            anchor |= Self::parse_word(part)?;
            any = true;
        }
        any.then_some(anchor)
    }

    fn parse_word(word: &str) -> Option<Self> {
        if let Some(single) = Self::single(word) {
            return Some(single);
        }
        // Compound spellings such as "topleft" or "middlecenter".
        for prefix in ["top", "middle", "bottom"] {
            if let Some(rest) = word.strip_prefix(prefix) {
                return Some(Self::single(prefix)? | Self::single(rest)?);
            }
        }
        None
    }

    fn single(word: &str) -> Option<Self> {
        match word {
            "top" => Some(Self::TOP),
            "middle" => Some(Self::MIDDLE),
            "bottom" => Some(Self::BOTTOM),
            "left" => Some(Self::LEFT),
            "center" => Some(Self::CENTER),
            "right" => Some(Self::RIGHT),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match (self.vertical(), self.horizontal()) {
            (VAlign::Top, HAlign::Left) => "TopLeft",
            (VAlign::Top, HAlign::Center) => "TopCenter",
            (VAlign::Top, HAlign::Right) => "TopRight",
            (VAlign::Middle, HAlign::Left) => "MiddleLeft",
            (VAlign::Middle, HAlign::Center) => "MiddleCenter",
            (VAlign::Middle, HAlign::Right) => "MiddleRight",
            (VAlign::Bottom, HAlign::Left) => "BottomLeft",
            (VAlign::Bottom, HAlign::Center) => "BottomCenter",
            (VAlign::Bottom, HAlign::Right) => "BottomRight",
        }
    }
}
