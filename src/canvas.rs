use crate::types::{Color, Pt, Size};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// One absolute-positioned draw instruction. Coordinates use a top-left origin;
/// `DrawString::y` is the top of the line box the text sits in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Command {
    // Non-rendered metadata (block bounds, section markers). Sinks ignore it.
    Meta {
        key: String,
        value: String,
    },
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    FillRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    StrokeRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    Line {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
    },
    FillCircle {
        cx: Pt,
        cy: Pt,
        radius: Pt,
    },
}

impl Command {
    pub fn translated(&self, dx: Pt, dy: Pt) -> Command {
        match self {
            Command::DrawString { x, y, text } => Command::DrawString {
                x: *x + dx,
                y: *y + dy,
                text: text.clone(),
            },
            Command::FillRect {
                x,
                y,
                width,
                height,
            } => Command::FillRect {
                x: *x + dx,
                y: *y + dy,
                width: *width,
                height: *height,
            },
            Command::StrokeRect {
                x,
                y,
                width,
                height,
            } => Command::StrokeRect {
                x: *x + dx,
                y: *y + dy,
                width: *width,
                height: *height,
            },
            Command::Line { x1, y1, x2, y2 } => Command::Line {
                x1: *x1 + dx,
                y1: *y1 + dy,
                x2: *x2 + dx,
                y2: *y2 + dy,
            },
            Command::FillCircle { cx, cy, radius } => Command::FillCircle {
                cx: *cx + dx,
                cy: *cy + dy,
                radius: *radius,
            },
            other => other.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            Command::DrawString { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Hex SHA-256 over the canonical JSON form of every draw instruction.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match serde_json::to_vec(self) {
            Ok(bytes) => hasher.update(&bytes),
            Err(_) => hasher.update(format!("{:?}", self.pages).as_bytes()),
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

/// Relative draw list recorded while a block measures itself. Unlike [`Canvas`]
/// it keeps every state change, because the state it will be replayed into is
/// unknown at record time.
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    commands: Vec<Command>,
}

impl Sketch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub(crate) fn into_commands(self) -> Vec<Command> {
        self.commands
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        self.commands.push(Command::SetLineWidth(width.max(Pt::ZERO)));
    }

    pub fn set_font(&mut self, name: &str, size: Pt) {
        self.commands.push(Command::SetFontName(name.to_string()));
        self.commands.push(Command::SetFontSize(size));
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn fill_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.commands.push(Command::FillRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn stroke_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.commands.push(Command::StrokeRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn line(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt) {
        self.commands.push(Command::Line { x1, y1, x2, y2 });
    }

    pub fn fill_circle(&mut self, cx: Pt, cy: Pt, radius: Pt) {
        self.commands.push(Command::FillCircle { cx, cy, radius });
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.commands.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Appends another sketch's commands shifted by `(dx, dy)`.
    pub fn append(&mut self, commands: &[Command], dx: Pt, dy: Pt) {
        self.commands
            .extend(commands.iter().map(|cmd| cmd.translated(dx, dy)));
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
            font_name: "Helvetica".to_string(),
        }
    }
}

/// Page-by-page command sink for one render pass. Redundant state changes are
/// dropped against the state of the current page.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::default(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.pages.len()
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn current_command_count(&self) -> usize {
        self.current.commands.len()
    }

    fn push(&mut self, command: Command) {
        match &command {
            Command::SetFillColor(color) => {
                if self.state.fill_color == *color {
                    return;
                }
                self.state.fill_color = *color;
            }
            Command::SetStrokeColor(color) => {
                if self.state.stroke_color == *color {
                    return;
                }
                self.state.stroke_color = *color;
            }
            Command::SetLineWidth(width) => {
                if self.state.line_width == *width {
                    return;
                }
                self.state.line_width = *width;
            }
            Command::SetFontName(name) => {
                if self.state.font_name == *name {
                    return;
                }
                self.state.font_name = name.clone();
            }
            Command::SetFontSize(size) => {
                if self.state.font_size == *size {
                    return;
                }
                self.state.font_size = *size;
            }
            _ => {}
        }
        self.current.commands.push(command);
    }

    /// Replays relative commands at an absolute offset on the current page.
    pub fn replay(&mut self, commands: &[Command], dx: Pt, dy: Pt) {
        for command in commands {
            self.push(command.translated(dx, dy));
        }
    }

    pub fn meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.push(Command::Meta {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::default();
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_translates_and_dedupes_state() {
        let mut sketch = Sketch::new();
        sketch.set_fill_color(Color::BLACK);
        sketch.fill_rect(Pt::ZERO, Pt::ZERO, Pt::from_i32(10), Pt::from_i32(5));
        sketch.set_fill_color(Color::WHITE);
        sketch.draw_string(Pt::from_i32(2), Pt::from_i32(1), "hi");

        let mut canvas = Canvas::new(Size::a4());
        canvas.replay(sketch.commands(), Pt::from_i32(100), Pt::from_i32(50));
        let doc = canvas.finish();
        let commands = &doc.pages[0].commands;
        // Black fill matches the fresh page state and is dropped.
        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0],
            Command::FillRect {
                x: Pt::from_i32(100),
                y: Pt::from_i32(50),
                width: Pt::from_i32(10),
                height: Pt::from_i32(5),
            }
        );
        assert!(matches!(
            &commands[2],
            Command::DrawString { x, y, text } if *x == Pt::from_i32(102) && *y == Pt::from_i32(51) && text == "hi"
        ));
    }

    #[test]
    fn show_page_resets_state() {
        let red = Color::rgb(1.0, 0.0, 0.0);
        let mut canvas = Canvas::new(Size::a4());
        canvas.replay(&[Command::SetFillColor(red)], Pt::ZERO, Pt::ZERO);
        canvas.show_page();
        canvas.replay(&[Command::SetFillColor(red)], Pt::ZERO, Pt::ZERO);
        let doc = canvas.finish();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages[1].commands, vec![Command::SetFillColor(red)]);
    }

    #[test]
    fn empty_canvas_still_yields_one_page() {
        let doc = Canvas::new(Size::letter()).finish();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages[0].commands.is_empty());
    }

    #[test]
    fn fingerprint_tracks_content() {
        let mut a = Canvas::new(Size::a4());
        a.meta("k", "v");
        let a = a.finish();
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut c = Canvas::new(Size::a4());
        c.meta("k", "w");
        assert_ne!(a.fingerprint(), c.finish().fingerprint());
    }
}
