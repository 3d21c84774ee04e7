//! Text measurement used for intrinsic sizing of text nodes.

/// Measures the box a string occupies when drawn with a font.
///
/// The host supplies a real implementation backed by its font atlas; layout
/// only needs it to be deterministic.
pub trait TextMeasure {
    /// Returns `(width, height)` for `text` at `font_size` pixels.
    fn measure(&self, text: &str, font: u32, font_size: f32) -> (f32, f32);
}

/// Monospace approximation: every char advances by a fixed fraction of the
/// font size and every line is a fixed multiple of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self {
            advance: 0.5,
            line_height: 1.2,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str, _font: u32, font_size: f32) -> (f32, f32) {
        if text.is_empty() {
            return (0.0, 0.0);
        }
        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        (
            widest as f32 * font_size * self.advance,
            lines as f32 * font_size * self.line_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_text() {
        let m = FixedAdvance::default();
        assert_eq!(m.measure("abcd\nab", 0, 10.0), (20.0, 24.0));
        assert_eq!(m.measure("", 0, 10.0), (0.0, 0.0));
    }
}
