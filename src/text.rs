use crate::font::FontRegistry;
use crate::theme::Theme;
use crate::types::{Color, Pt};
use std::sync::Arc;

// Per-character advance (as a fraction of the font size) used when no font
// file is registered for the requested face.
const FALLBACK_ADVANCE_REGULAR: (i32, i32) = (1, 2);
const FALLBACK_ADVANCE_BOLD: (i32, i32) = (11, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: Pt,
    pub face: FontFace,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font_size: Pt, face: FontFace, color: Color) -> Self {
        Self {
            font_size,
            face,
            color,
        }
    }

    pub fn with_face(mut self, face: FontFace) -> Self {
        self.face = face;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, font_size: Pt) -> Self {
        self.font_size = font_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub line_height: Pt,
    pub height: Pt,
}

impl TextLayout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Greedy word-wrapping text measurer. Holds no mutable state of its own, so
/// identical inputs always produce identical layouts.
#[derive(Clone)]
pub struct TextMeasurer {
    registry: Option<Arc<FontRegistry>>,
    theme: Arc<Theme>,
}

impl TextMeasurer {
    pub fn new(theme: Arc<Theme>, registry: Option<Arc<FontRegistry>>) -> Self {
        Self { registry, theme }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn font_name(&self, face: FontFace) -> &str {
        match face {
            FontFace::Regular => &self.theme.fonts.regular,
            FontFace::Bold => &self.theme.fonts.bold,
            FontFace::Italic => &self.theme.fonts.italic,
        }
    }

    pub fn line_height(&self, style: &TextStyle) -> Pt {
        style.font_size * self.theme.line_height_ratio
    }

    pub fn text_width(&self, text: &str, style: &TextStyle) -> Pt {
        if text.is_empty() {
            return Pt::ZERO;
        }
        let name = self.font_name(style.face);
        if let Some(width) = self
            .registry
            .as_deref()
            .and_then(|registry| registry.measure_text_width(name, style.font_size, text))
        {
            return width;
        }
        let (num, denom) = match style.face {
            FontFace::Bold => FALLBACK_ADVANCE_BOLD,
            FontFace::Regular | FontFace::Italic => FALLBACK_ADVANCE_REGULAR,
        };
        let char_width = style.font_size.mul_ratio(num, denom).max(Pt::from_f32(1.0));
        char_width * (text.chars().count() as i32)
    }

    /// Wraps `text` into lines no wider than `max_width`.
    ///
    /// Words are appended to the current line while it fits; a word wider than
    /// `max_width` gets a line of its own and is never broken. Explicit `\n`
    /// starts a new line group, and blank groups inside the text are kept as
    /// empty lines. Blank text yields no lines and zero height.
    pub fn measure(&self, text: &str, style: &TextStyle, max_width: Pt) -> TextLayout {
        let line_height = self.line_height(style);
        if text.trim().is_empty() {
            return TextLayout {
                lines: Vec::new(),
                line_height,
                height: Pt::ZERO,
            };
        }

        let max_width = max_width.max(Pt::from_f32(1.0));
        let space_width = self.text_width(" ", style);
        let mut lines = Vec::new();
        for segment in text.trim().split('\n') {
            if segment.trim().is_empty() {
                lines.push(String::new());
                continue;
            }
            let mut current = String::new();
            let mut current_width = Pt::ZERO;
            for word in segment.split_whitespace() {
                let word_width = self.text_width(word, style);
                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_width;
                    continue;
                }
                let next_width = current_width + space_width + word_width;
                if next_width <= max_width {
                    current.push(' ');
                    current.push_str(word);
                    current_width = next_width;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_width;
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }

        let height = line_height * (lines.len() as i32);
        TextLayout {
            lines,
            line_height,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurer() -> TextMeasurer {
        TextMeasurer::new(Arc::new(Theme::default()), None)
    }

    fn body() -> TextStyle {
        TextStyle::new(Pt::from_i32(10), FontFace::Regular, Color::BLACK)
    }

    #[test]
    fn empty_text_has_no_lines() {
        let layout = measurer().measure("", &body(), Pt::from_i32(100));
        assert!(layout.is_empty());
        assert_eq!(layout.height, Pt::ZERO);
        let layout = measurer().measure("  \n \t", &body(), Pt::from_i32(100));
        assert_eq!(layout.line_count(), 0);
    }

    #[test]
    fn wraps_greedily_at_width() {
        // Fallback advance: 5pt per char at 10pt, space included.
        let layout = measurer().measure("aaaa bbbb cccc", &body(), Pt::from_i32(50));
        assert_eq!(layout.lines, vec!["aaaa bbbb", "cccc"]);
        assert_eq!(layout.line_height, Pt::from_i32(14));
        assert_eq!(layout.height, Pt::from_i32(28));
    }

    #[test]
    fn overlong_word_sits_alone_unbroken() {
        let layout = measurer().measure("a supercalifragilistic b", &body(), Pt::from_i32(30));
        assert_eq!(layout.lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn newline_starts_new_group_and_keeps_blank_lines() {
        let layout = measurer().measure("one\n\ntwo", &body(), Pt::from_i32(200));
        assert_eq!(layout.lines, vec!["one", "", "two"]);
    }

    #[test]
    fn measurement_is_deterministic() {
        let m = measurer();
        let text = "Deterministic layout means the measure pass and the place pass agree on every line break.";
        let first = m.measure(text, &body(), Pt::from_i32(120));
        for _ in 0..5 {
            assert_eq!(m.measure(text, &body(), Pt::from_i32(120)), first);
        }
    }

    #[test]
    fn bold_fallback_is_wider() {
        let m = measurer();
        let regular = m.text_width("Market", &body());
        let bold = m.text_width("Market", &body().with_face(FontFace::Bold));
        assert!(bold > regular);
    }

    #[test]
    fn registered_font_changes_where_lines_wrap() {
        let mut registry = FontRegistry::new();
        registry
            .register_file(
                std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fonts/DejaVuSerif.ttf"),
            )
            .expect("register font");
        let mut theme = Theme::default();
        theme.fonts.regular = "DejaVu Serif".to_string();
        let serif = TextMeasurer::new(Arc::new(theme), Some(Arc::new(registry)));
        let text = vec!["ill"; 24].join(" ");

        // "ill" is 9.6pt and a space 3.18pt at 10pt, so eight words fit in 100pt.
        let layout = serif.measure(&text, &body(), Pt::from_i32(100));
        assert_eq!(layout.line_count(), 3);
        assert_eq!(layout.lines[0].split_whitespace().count(), 8);
        for line in &layout.lines {
            assert!(serif.text_width(line, &body()) <= Pt::from_i32(100));
        }

        let fallback = measurer().measure(&text, &body(), Pt::from_i32(100));
        assert_eq!(fallback.line_count(), 5);
        assert_eq!(layout.height, Pt::from_i32(14) * 3);
    }
}
