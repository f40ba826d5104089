use crate::canvas::{Canvas, Command, Sketch};
use crate::text::{FontFace, TextLayout, TextMeasurer, TextStyle};
use crate::theme::{PanelKind, Theme};
use crate::types::{Color, Pt};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    List,
    Panel,
    TwoColumn,
    Divider,
    Card,
    Timeline,
    Title,
    Header,
    Stack,
    Spacer,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::Panel => "panel",
            BlockKind::TwoColumn => "two_column",
            BlockKind::Divider => "divider",
            BlockKind::Card => "card",
            BlockKind::Timeline => "timeline",
            BlockKind::Title => "title",
            BlockKind::Header => "header",
            BlockKind::Stack => "stack",
            BlockKind::Spacer => "spacer",
        }
    }
}

/// A block whose height is known and whose drawing is fixed relative to its
/// own top-left corner. Only [`Block::measure`] implementations in this module
/// can build one, so nothing can be placed without having been measured, and
/// placement draws exactly what measurement laid out.
#[derive(Debug, Clone)]
pub struct MeasuredBlock {
    kind: BlockKind,
    width: Pt,
    height: Pt,
    commands: Vec<Command>,
}

impl MeasuredBlock {
    fn new(kind: BlockKind, width: Pt, height: Pt, sketch: Sketch) -> Self {
        Self {
            kind,
            width,
            height: height.max(Pt::ZERO),
            commands: sketch.into_commands(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn width(&self) -> Pt {
        self.width
    }

    pub fn height(&self) -> Pt {
        self.height
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Emits the block's draw instructions with its top-left corner at `(x, y)`.
    pub fn place(self, canvas: &mut Canvas, x: Pt, y: Pt) {
        canvas.replay(&self.commands, x, y);
    }
}

/// A renderable unit of the report. `measure` lays the content out for the
/// given width without touching any page state.
pub trait Block: Send + Sync {
    fn kind(&self) -> BlockKind;
    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    Body,
    Strong,
    Emphasis,
    Muted,
    Small,
    Subheading,
    Heading,
    Title,
}

pub fn style_for(theme: &Theme, role: TextRole) -> TextStyle {
    let sizes = &theme.sizes;
    match role {
        TextRole::Body => TextStyle::new(sizes.body, FontFace::Regular, theme.text_color),
        TextRole::Strong => TextStyle::new(sizes.body, FontFace::Bold, theme.text_color),
        TextRole::Emphasis => TextStyle::new(sizes.body, FontFace::Italic, theme.text_color),
        TextRole::Muted => TextStyle::new(sizes.body, FontFace::Regular, theme.muted_color),
        TextRole::Small => TextStyle::new(sizes.small, FontFace::Regular, theme.muted_color),
        TextRole::Subheading => TextStyle::new(sizes.subheading, FontFace::Bold, theme.text_color),
        TextRole::Heading => TextStyle::new(sizes.heading, FontFace::Bold, theme.text_color),
        TextRole::Title => TextStyle::new(sizes.title, FontFace::Bold, theme.text_color),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

fn draw_lines(
    sketch: &mut Sketch,
    measurer: &TextMeasurer,
    layout: &TextLayout,
    style: &TextStyle,
    origin: (Pt, Pt),
    align: (TextAlign, Pt),
) {
    if layout.is_empty() {
        return;
    }
    let (x, y) = origin;
    let (align, box_width) = align;
    sketch.set_fill_color(style.color);
    sketch.set_font(measurer.font_name(style.face), style.font_size);
    let inset = (layout.line_height - style.font_size).half().max(Pt::ZERO);
    for (idx, line) in layout.lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let offset = match align {
            TextAlign::Left => Pt::ZERO,
            TextAlign::Center => {
                (box_width - measurer.text_width(line, style)).max(Pt::ZERO).half()
            }
        };
        sketch.draw_string(
            x + offset,
            y + layout.line_height * (idx as i32) + inset,
            line.clone(),
        );
    }
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    text: String,
    role: TextRole,
    color: Option<Color>,
    align: TextAlign,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            role: TextRole::Body,
            color: None,
            align: TextAlign::Left,
        }
    }

    pub fn with_role(mut self, role: TextRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }
}

impl Block for Paragraph {
    fn kind(&self) -> BlockKind {
        BlockKind::Paragraph
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let mut style = style_for(measurer.theme(), self.role);
        if let Some(color) = self.color {
            style = style.with_color(color);
        }
        let layout = measurer.measure(&self.text, &style, width);
        let mut sketch = Sketch::new();
        draw_lines(
            &mut sketch,
            measurer,
            &layout,
            &style,
            (Pt::ZERO, Pt::ZERO),
            (self.align, width),
        );
        MeasuredBlock::new(BlockKind::Paragraph, width, layout.height, sketch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    Bullet,
    Numbered,
}

/// Items with a leading marker on their first line and a hanging indent for
/// the lines that wrap.
#[derive(Debug, Clone)]
pub struct BulletList {
    items: Vec<String>,
    marker: ListMarker,
    role: TextRole,
    color: Option<Color>,
}

impl BulletList {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            marker: ListMarker::Bullet,
            role: TextRole::Body,
            color: None,
        }
    }

    pub fn numbered(mut self) -> Self {
        self.marker = ListMarker::Numbered;
        self
    }

    pub fn with_role(mut self, role: TextRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl Block for BulletList {
    fn kind(&self) -> BlockKind {
        BlockKind::List
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let mut style = style_for(theme, self.role);
        if let Some(color) = self.color {
            style = style.with_color(color);
        }
        let indent = match self.marker {
            ListMarker::Bullet => theme.bullet_indent,
            ListMarker::Numbered => theme.bullet_indent + style.font_size.half(),
        };
        let text_width = (width - indent).max(Pt::from_f32(1.0));

        let mut sketch = Sketch::new();
        let mut y = Pt::ZERO;
        let mut drawn = 0usize;
        for item in &self.items {
            let layout = measurer.measure(item, &style, text_width);
            if layout.is_empty() {
                continue;
            }
            if drawn > 0 {
                y += theme.item_gap;
            }
            drawn += 1;
            let marker = match self.marker {
                ListMarker::Bullet => "\u{2022}".to_string(),
                ListMarker::Numbered => format!("{drawn}."),
            };
            let marker_layout = TextLayout {
                lines: vec![marker],
                line_height: layout.line_height,
                height: layout.line_height,
            };
            draw_lines(
                &mut sketch,
                measurer,
                &marker_layout,
                &style,
                (Pt::ZERO, y),
                (TextAlign::Left, indent),
            );
            draw_lines(
                &mut sketch,
                measurer,
                &layout,
                &style,
                (indent, y),
                (TextAlign::Left, text_width),
            );
            y += layout.height;
        }
        MeasuredBlock::new(BlockKind::List, width, y, sketch)
    }
}

/// Filled, bordered container with an optional bold heading. Colors come from
/// the theme palette of `kind`.
pub struct Panel {
    kind: PanelKind,
    heading: Option<String>,
    body: Box<dyn Block>,
}

impl Panel {
    pub fn new(kind: PanelKind, body: Box<dyn Block>) -> Self {
        Self {
            kind,
            heading: None,
            body,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }
}

impl Block for Panel {
    fn kind(&self) -> BlockKind {
        BlockKind::Panel
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let palette = theme.palette(self.kind);
        let pad = theme.panel_padding;
        let inner_width = (width - pad * 2).max(Pt::from_f32(1.0));

        let heading_style = style_for(theme, TextRole::Subheading).with_color(palette.heading);
        let heading = self
            .heading
            .as_deref()
            .map(|text| measurer.measure(text, &heading_style, inner_width))
            .filter(|layout| !layout.is_empty());
        let body = self.body.measure(measurer, inner_width);

        let heading_height = heading.as_ref().map(|l| l.height).unwrap_or(Pt::ZERO);
        let heading_gap = if heading.is_some() && body.height().is_positive() {
            theme.item_gap
        } else {
            Pt::ZERO
        };
        let height = pad + heading_height + heading_gap + body.height() + pad;

        let mut sketch = Sketch::new();
        sketch.set_fill_color(palette.background);
        sketch.fill_rect(Pt::ZERO, Pt::ZERO, width, height);
        sketch.set_stroke_color(palette.border);
        sketch.set_line_width(theme.border_width);
        sketch.stroke_rect(Pt::ZERO, Pt::ZERO, width, height);
        if let Some(layout) = &heading {
            draw_lines(
                &mut sketch,
                measurer,
                layout,
                &heading_style,
                (pad, pad),
                (TextAlign::Left, inner_width),
            );
        }
        sketch.append(body.commands(), pad, pad + heading_height + heading_gap);
        MeasuredBlock::new(BlockKind::Panel, width, height, sketch)
    }
}

/// Side-by-side halves separated by the theme gutter. The block is as tall as
/// the taller side; the shorter side's trailing space stays blank.
pub struct TwoColumn {
    left: Box<dyn Block>,
    right: Box<dyn Block>,
}

impl TwoColumn {
    pub fn new(left: Box<dyn Block>, right: Box<dyn Block>) -> Self {
        Self { left, right }
    }
}

impl Block for TwoColumn {
    fn kind(&self) -> BlockKind {
        BlockKind::TwoColumn
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let gutter = measurer.theme().column_gutter;
        let column_width = (width - gutter).half().max(Pt::from_f32(1.0));
        let left = self.left.measure(measurer, column_width);
        let right = self.right.measure(measurer, column_width);
        let height = left.height().max(right.height());

        let mut sketch = Sketch::new();
        sketch.append(left.commands(), Pt::ZERO, Pt::ZERO);
        sketch.append(right.commands(), column_width + gutter, Pt::ZERO);
        MeasuredBlock::new(BlockKind::TwoColumn, width, height, sketch)
    }
}

/// Vertical sequence of blocks with a fixed gap between non-empty children.
pub struct Stack {
    children: Vec<Box<dyn Block>>,
    gap: Option<Pt>,
}

impl Stack {
    pub fn new(children: Vec<Box<dyn Block>>) -> Self {
        Self {
            children,
            gap: None,
        }
    }

    pub fn with_gap(mut self, gap: Pt) -> Self {
        self.gap = Some(gap);
        self
    }
}

fn stack_children(
    sketch: &mut Sketch,
    measured: &[MeasuredBlock],
    x: Pt,
    top: Pt,
    gap: Pt,
) -> Pt {
    let mut y = top;
    let mut first = true;
    for child in measured.iter().filter(|m| m.height().is_positive()) {
        if !first {
            y += gap;
        }
        first = false;
        sketch.append(child.commands(), x, y);
        y += child.height();
    }
    y - top
}

impl Block for Stack {
    fn kind(&self) -> BlockKind {
        BlockKind::Stack
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let gap = self.gap.unwrap_or(measurer.theme().block_gap);
        let measured: Vec<MeasuredBlock> = self
            .children
            .iter()
            .map(|child| child.measure(measurer, width))
            .collect();
        let mut sketch = Sketch::new();
        let height = stack_children(&mut sketch, &measured, Pt::ZERO, Pt::ZERO, gap);
        MeasuredBlock::new(BlockKind::Stack, width, height, sketch)
    }
}

/// Bordered record (competitor, risk, idea) with a title line, an optional tag
/// chip and a body of sub-blocks. Every sub-block is measured before the
/// border is drawn, since the border needs the full height.
pub struct Card {
    kind: PanelKind,
    title: String,
    tag: Option<String>,
    body: Vec<Box<dyn Block>>,
}

impl Card {
    pub fn new(kind: PanelKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            tag: None,
            body: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn push(mut self, block: Box<dyn Block>) -> Self {
        self.body.push(block);
        self
    }

    pub fn push_opt(self, block: Option<Box<dyn Block>>) -> Self {
        match block {
            Some(block) => self.push(block),
            None => self,
        }
    }
}

const CARD_ACCENT_WIDTH: i32 = 3;

impl Block for Card {
    fn kind(&self) -> BlockKind {
        BlockKind::Card
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let palette = theme.palette(self.kind);
        let pad = theme.panel_padding;
        let accent = Pt::from_i32(CARD_ACCENT_WIDTH);
        let inner_x = pad + accent;
        let inner_width = (width - inner_x - pad).max(Pt::from_f32(1.0));

        let title_style = style_for(theme, TextRole::Subheading);
        let title = measurer.measure(&self.title, &title_style, inner_width);

        let tag_style = style_for(theme, TextRole::Small).with_color(palette.heading);
        let tag = self
            .tag
            .as_deref()
            .map(|text| measurer.measure(text, &tag_style, inner_width))
            .filter(|layout| layout.line_count() == 1);
        let chip_pad = Pt::from_i32(4);

        // Measure phase: nothing below draws until every height is known.
        let body: Vec<MeasuredBlock> = self
            .body
            .iter()
            .map(|block| block.measure(measurer, inner_width))
            .collect();

        let mut cursor = pad + title.height;
        let chip = tag.map(|layout| {
            let chip_top = cursor + theme.item_gap;
            let chip_width = measurer.text_width(&layout.lines[0], &tag_style) + chip_pad * 2;
            cursor = chip_top + layout.height;
            (layout, chip_top, chip_width)
        });
        let body_top = if body.iter().any(|b| b.height().is_positive()) {
            cursor + theme.item_gap
        } else {
            cursor
        };

        let mut body_sketch = Sketch::new();
        let body_height = stack_children(&mut body_sketch, &body, inner_x, body_top, theme.item_gap);
        let height = body_top + body_height + pad;

        let mut sketch = Sketch::new();
        sketch.set_fill_color(Color::WHITE);
        sketch.fill_rect(Pt::ZERO, Pt::ZERO, width, height);
        sketch.set_fill_color(palette.border);
        sketch.fill_rect(Pt::ZERO, Pt::ZERO, accent, height);
        sketch.set_stroke_color(palette.border);
        sketch.set_line_width(theme.border_width);
        sketch.stroke_rect(Pt::ZERO, Pt::ZERO, width, height);
        draw_lines(
            &mut sketch,
            measurer,
            &title,
            &title_style,
            (inner_x, pad),
            (TextAlign::Left, inner_width),
        );
        if let Some((layout, chip_top, chip_width)) = &chip {
            sketch.set_fill_color(palette.background);
            sketch.fill_rect(inner_x, *chip_top, *chip_width, layout.height);
            draw_lines(
                &mut sketch,
                measurer,
                layout,
                &tag_style,
                (inner_x + chip_pad, *chip_top),
                (TextAlign::Left, *chip_width),
            );
        }
        sketch.append(body_sketch.commands(), Pt::ZERO, Pt::ZERO);
        MeasuredBlock::new(BlockKind::Card, width, height, sketch)
    }
}

#[derive(Debug, Clone)]
pub struct TimelineItem {
    pub title: Option<String>,
    pub text: String,
}

impl TimelineItem {
    pub fn new(title: Option<String>, text: impl Into<String>) -> Self {
        Self {
            title,
            text: text.into(),
        }
    }
}

/// Numbered markers joined by a vertical connecting line.
#[derive(Debug, Clone)]
pub struct Timeline {
    items: Vec<TimelineItem>,
}

impl Timeline {
    pub fn new(items: Vec<TimelineItem>) -> Self {
        Self { items }
    }
}

impl Block for Timeline {
    fn kind(&self) -> BlockKind {
        BlockKind::Timeline
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let radius = theme.marker_radius;
        let text_x = radius * 2 + theme.column_gutter.half();
        let text_width = (width - text_x).max(Pt::from_f32(1.0));
        let title_style = style_for(theme, TextRole::Strong);
        let body_style = style_for(theme, TextRole::Body);
        let number_style = style_for(theme, TextRole::Small)
            .with_face(FontFace::Bold)
            .with_color(theme.section_title.heading);

        let mut rows = Vec::with_capacity(self.items.len());
        let mut y = Pt::ZERO;
        for item in &self.items {
            let title = item
                .title
                .as_deref()
                .map(|t| measurer.measure(t, &title_style, text_width))
                .filter(|l| !l.is_empty());
            let body = measurer.measure(&item.text, &body_style, text_width);
            let text_height = title.as_ref().map(|l| l.height).unwrap_or(Pt::ZERO) + body.height;
            if !text_height.is_positive() {
                continue;
            }
            if !rows.is_empty() {
                y += theme.block_gap;
            }
            let row_height = text_height.max(radius * 2);
            rows.push((y, title, body));
            y += row_height;
        }
        let height = y;

        let mut sketch = Sketch::new();
        if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
            if rows.len() > 1 {
                sketch.set_stroke_color(theme.rule_color);
                sketch.set_line_width(theme.border_width * 2);
                sketch.line(radius, first.0 + radius, radius, last.0 + radius);
            }
        }
        for (idx, (top, title, body)) in rows.iter().enumerate() {
            sketch.set_fill_color(theme.section_title.background);
            sketch.fill_circle(radius, *top + radius, radius);
            let number = TextLayout {
                lines: vec![(idx + 1).to_string()],
                line_height: measurer.line_height(&number_style),
                height: measurer.line_height(&number_style),
            };
            draw_lines(
                &mut sketch,
                measurer,
                &number,
                &number_style,
                (Pt::ZERO, *top + radius - number.line_height.half()),
                (TextAlign::Center, radius * 2),
            );
            let mut text_y = *top;
            if let Some(title) = title {
                draw_lines(
                    &mut sketch,
                    measurer,
                    title,
                    &title_style,
                    (text_x, text_y),
                    (TextAlign::Left, text_width),
                );
                text_y += title.height;
            }
            draw_lines(
                &mut sketch,
                measurer,
                body,
                &body_style,
                (text_x, text_y),
                (TextAlign::Left, text_width),
            );
        }
        MeasuredBlock::new(BlockKind::Timeline, width, height, sketch)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Divider;

impl Block for Divider {
    fn kind(&self) -> BlockKind {
        BlockKind::Divider
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let height = theme.divider_height;
        let mut sketch = Sketch::new();
        sketch.set_stroke_color(theme.rule_color);
        sketch.set_line_width(theme.border_width);
        sketch.line(Pt::ZERO, height.half(), width, height.half());
        MeasuredBlock::new(BlockKind::Divider, width, height, sketch)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Spacer {
    height: Pt,
}

impl Spacer {
    pub fn new(height: Pt) -> Self {
        Self { height }
    }
}

impl Block for Spacer {
    fn kind(&self) -> BlockKind {
        BlockKind::Spacer
    }

    fn measure(&self, _measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        MeasuredBlock::new(BlockKind::Spacer, width, self.height, Sketch::new())
    }
}

/// Colored bar carrying a section title.
#[derive(Debug, Clone)]
pub struct SectionTitle {
    title: String,
}

impl SectionTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Block for SectionTitle {
    fn kind(&self) -> BlockKind {
        BlockKind::Title
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let palette = &theme.section_title;
        let pad_x = theme.panel_padding + Pt::from_i32(2);
        let pad_y = theme.panel_padding.mul_ratio(3, 4);
        let style = style_for(theme, TextRole::Heading).with_color(palette.heading);
        let layout = measurer.measure(&self.title, &style, (width - pad_x * 2).max(Pt::from_f32(1.0)));
        let height = pad_y * 2 + layout.height;

        let mut sketch = Sketch::new();
        sketch.meta("section", self.title.clone());
        sketch.set_fill_color(palette.background);
        sketch.fill_rect(Pt::ZERO, Pt::ZERO, width, height);
        draw_lines(
            &mut sketch,
            measurer,
            &layout,
            &style,
            (pad_x, pad_y),
            (TextAlign::Left, width),
        );
        MeasuredBlock::new(BlockKind::Title, width, height, sketch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitBand {
    Strong,
    Moderate,
    Weak,
}

impl FitBand {
    pub fn for_score(score: u8) -> Self {
        if score >= 75 {
            FitBand::Strong
        } else if score >= 50 {
            FitBand::Moderate
        } else {
            FitBand::Weak
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FitBand::Strong => "Strong fit",
            FitBand::Moderate => "Moderate fit",
            FitBand::Weak => "Needs work",
        }
    }

    pub fn panel_kind(self) -> PanelKind {
        match self {
            FitBand::Strong => PanelKind::Affirmative,
            FitBand::Moderate => PanelKind::Cautionary,
            FitBand::Weak => PanelKind::Risk,
        }
    }
}

const BADGE_DIAMETER: i32 = 64;

/// Report title followed by the fit-score badge and its explanation.
#[derive(Debug, Clone)]
pub struct ReportHeader {
    title: String,
    score: u8,
    explanation: Option<String>,
}

impl ReportHeader {
    pub fn new(title: impl Into<String>, score: u8, explanation: Option<String>) -> Self {
        Self {
            title: title.into(),
            score: score.min(100),
            explanation,
        }
    }
}

impl Block for ReportHeader {
    fn kind(&self) -> BlockKind {
        BlockKind::Header
    }

    fn measure(&self, measurer: &TextMeasurer, width: Pt) -> MeasuredBlock {
        let theme = measurer.theme();
        let band = FitBand::for_score(self.score);
        let band_color = theme.palette(band.panel_kind()).heading;
        let diameter = Pt::from_i32(BADGE_DIAMETER);
        let radius = diameter.half();

        let title_style = style_for(theme, TextRole::Title);
        let title = measurer.measure(&self.title, &title_style, width);
        let row_top = title.height + theme.block_gap;

        let text_x = diameter + theme.column_gutter;
        let text_width = (width - text_x).max(Pt::from_f32(1.0));
        let verdict_style = style_for(theme, TextRole::Heading).with_color(band_color);
        let verdict = measurer.measure(
            &format!("{} ({}/100)", band.label(), self.score),
            &verdict_style,
            text_width,
        );
        let explanation_style = style_for(theme, TextRole::Body);
        let explanation = measurer.measure(
            self.explanation.as_deref().unwrap_or_default(),
            &explanation_style,
            text_width,
        );
        let text_height = verdict.height
            + if explanation.is_empty() {
                Pt::ZERO
            } else {
                theme.item_gap + explanation.height
            };
        let height = row_top + text_height.max(diameter);

        let mut sketch = Sketch::new();
        draw_lines(
            &mut sketch,
            measurer,
            &title,
            &title_style,
            (Pt::ZERO, Pt::ZERO),
            (TextAlign::Left, width),
        );
        sketch.set_fill_color(band_color);
        sketch.fill_circle(radius, row_top + radius, radius);
        let score_style = style_for(theme, TextRole::Title).with_color(Color::WHITE);
        let score = TextLayout {
            lines: vec![self.score.to_string()],
            line_height: measurer.line_height(&score_style),
            height: measurer.line_height(&score_style),
        };
        draw_lines(
            &mut sketch,
            measurer,
            &score,
            &score_style,
            (Pt::ZERO, row_top + radius - score.line_height.half()),
            (TextAlign::Center, diameter),
        );
        draw_lines(
            &mut sketch,
            measurer,
            &verdict,
            &verdict_style,
            (text_x, row_top),
            (TextAlign::Left, text_width),
        );
        draw_lines(
            &mut sketch,
            measurer,
            &explanation,
            &explanation_style,
            (text_x, row_top + verdict.height + theme.item_gap),
            (TextAlign::Left, text_width),
        );
        MeasuredBlock::new(BlockKind::Header, width, height, sketch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;
    use std::sync::Arc;

    fn measurer() -> TextMeasurer {
        TextMeasurer::new(Arc::new(Theme::default()), None)
    }

    fn width() -> Pt {
        Pt::from_i32(400)
    }

    fn texts(block: &MeasuredBlock) -> Vec<String> {
        block
            .commands()
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn two_column_height_is_taller_side() {
        let block = TwoColumn::new(
            Box::new(Spacer::new(Pt::from_i32(40))),
            Box::new(Spacer::new(Pt::from_i32(25))),
        )
        .measure(&measurer(), width());
        assert_eq!(block.kind(), BlockKind::TwoColumn);
        assert_eq!(block.height(), Pt::from_i32(40));
    }

    #[test]
    fn two_column_places_right_side_after_gutter() {
        let m = measurer();
        let block = TwoColumn::new(
            Box::new(Paragraph::new("left")),
            Box::new(Paragraph::new("right")),
        )
        .measure(&m, width());
        let right_x = block
            .commands()
            .iter()
            .find_map(|cmd| match cmd {
                Command::DrawString { x, text, .. } if text == "right" => Some(*x),
                _ => None,
            })
            .expect("right column text");
        let column = (width() - m.theme().column_gutter).half();
        assert_eq!(right_x, column + m.theme().column_gutter);
    }

    #[test]
    fn panel_height_is_content_plus_padding() {
        let m = measurer();
        let theme = m.theme();
        let list = BulletList::new(vec!["Clear niche".into(), "Low infra cost".into()]);
        let inner = list.measure(&m, width() - theme.panel_padding * 2).height();
        let panel = Panel::new(PanelKind::Affirmative, Box::new(list)).measure(&m, width());
        assert_eq!(panel.height(), inner + theme.panel_padding * 2);
        assert!(panel.commands().contains(&Command::SetFillColor(
            theme.palette(PanelKind::Affirmative).background
        )));
    }

    #[test]
    fn list_skips_blank_items_and_spaces_the_rest() {
        let m = measurer();
        let theme = m.theme();
        let list = BulletList::new(vec!["one".into(), "   ".into(), "two".into()]).measure(&m, width());
        let line = m.line_height(&style_for(theme, TextRole::Body));
        assert_eq!(list.height(), line * 2 + theme.item_gap);
        assert_eq!(texts(&list), vec!["\u{2022}", "one", "\u{2022}", "two"]);
    }

    #[test]
    fn numbered_list_counts_only_drawn_items() {
        let m = measurer();
        let list = BulletList::new(vec!["a".into(), "".into(), "b".into()])
            .numbered()
            .measure(&m, width());
        assert_eq!(texts(&list), vec!["1.", "a", "2.", "b"]);
    }

    #[test]
    fn card_border_spans_all_measured_children() {
        let m = measurer();
        let card = Card::new(PanelKind::Neutral, "Acme")
            .with_tag(Some("Leader".into()))
            .push(Box::new(Paragraph::new("Does everything, slowly.")))
            .push(Box::new(TwoColumn::new(
                Box::new(BulletList::new(vec!["Brand".into()])),
                Box::new(BulletList::new(vec!["Price".into(), "Support".into()])),
            )))
            .measure(&m, width());
        let border = card
            .commands()
            .iter()
            .find_map(|cmd| match cmd {
                Command::StrokeRect { height, .. } => Some(*height),
                _ => None,
            })
            .expect("card border");
        assert_eq!(border, card.height());
        // Every child sits inside the border.
        for cmd in card.commands() {
            if let Command::DrawString { y, .. } = cmd {
                assert!(*y < card.height());
            }
        }
        assert!(texts(&card).contains(&"Leader".to_string()));
    }

    #[test]
    fn timeline_connects_first_and_last_marker() {
        let m = measurer();
        let timeline = Timeline::new(vec![
            TimelineItem::new(Some("Week 1".into()), "Ship the MVP"),
            TimelineItem::new(None, "Collect feedback"),
            TimelineItem::new(None, "   "),
        ])
        .measure(&m, width());
        let circles = timeline
            .commands()
            .iter()
            .filter(|cmd| matches!(cmd, Command::FillCircle { .. }))
            .count();
        assert_eq!(circles, 2);
        assert!(
            timeline
                .commands()
                .iter()
                .any(|cmd| matches!(cmd, Command::Line { .. }))
        );
        assert!(texts(&timeline).contains(&"2".to_string()));
    }

    #[test]
    fn placement_translates_measured_commands() {
        let m = measurer();
        let block = Divider.measure(&m, width());
        let height = block.height();
        let mut canvas = Canvas::new(Size::a4());
        block.place(&mut canvas, Pt::from_i32(36), Pt::from_i32(100));
        let doc = canvas.finish();
        let line = doc.pages[0]
            .commands
            .iter()
            .find_map(|cmd| match cmd {
                Command::Line { x1, y1, .. } => Some((*x1, *y1)),
                _ => None,
            })
            .expect("divider line");
        assert_eq!(line, (Pt::from_i32(36), Pt::from_i32(100) + height.half()));
    }

    #[test]
    fn header_band_follows_score() {
        assert_eq!(FitBand::for_score(72), FitBand::Moderate);
        assert_eq!(FitBand::for_score(75), FitBand::Strong);
        assert_eq!(FitBand::for_score(10), FitBand::Weak);
        let m = measurer();
        let header = ReportHeader::new("Evaluation", 72, Some("Solid niche.".into())).measure(&m, width());
        let all = texts(&header);
        assert!(all.contains(&"72".to_string()));
        assert!(all.iter().any(|t| t.starts_with("Moderate fit")));
        assert!(header.height() >= Pt::from_i32(BADGE_DIAMETER));
    }
}
