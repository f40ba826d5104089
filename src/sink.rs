use crate::canvas::{Command, Document, Page};
use crate::error::Result;
use crate::types::{Color, Pt};
use base64::Engine;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeMap;

/// Turns a laid-out [`Document`] into an output artifact.
pub trait ReportSink {
    type Output;

    fn write_document(&self, document: &Document) -> Result<Self::Output>;
}

/// Serializes the draw instructions as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSink {
    pub pretty: bool,
}

impl ReportSink for JsonSink {
    type Output = String;

    fn write_document(&self, document: &Document) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(document)?
        } else {
            serde_json::to_string(document)?
        };
        Ok(json)
    }
}

// Baseline offset below the top of the text box, as a fraction of font size.
const ASCENT_RATIO: (i32, i32) = (4, 5);
// Cubic Bezier control distance for a quarter circle.
const CIRCLE_KAPPA: f32 = 0.552_284_8;

const BASE14_FONTS: [&str; 12] = [
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
];

/// Writes PDF with the standard Type1 fonts. Fonts that are not one of them
/// are drawn with the Helvetica face closest to their name.
#[derive(Debug, Clone, Default)]
pub struct PdfSink {
    title: Option<String>,
}

impl PdfSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn to_data_uri(bytes: &[u8]) -> String {
        format!(
            "data:application/pdf;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }
}

impl ReportSink for PdfSink {
    type Output = Vec<u8>;

    fn write_document(&self, document: &Document) -> Result<Vec<u8>> {
        let mut doc = lopdf::Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let mut font_keys: BTreeMap<String, String> = BTreeMap::new();
        let mut font_resources = Dictionary::new();
        for name in used_font_names(document) {
            let key = format!("F{}", font_keys.len() + 1);
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => base14_name(&name),
                "Encoding" => "WinAnsiEncoding",
            });
            font_resources.set(key.clone(), font_id);
            font_keys.insert(name, key);
        }
        let resources_id = doc.add_object(dictionary! {
            "Font" => font_resources,
        });

        let page_height = document.page_size.height;
        let mut kids: Vec<Object> = Vec::with_capacity(document.pages.len());
        for page in &document.pages {
            let operations = page_operations(page, page_height, &font_keys);
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                document.page_size.width.to_f32().into(),
                page_height.to_f32().into(),
            ],
        };
        doc.set_object(pages_id, pages);

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal("pitchpress"),
        };
        if let Some(title) = &self.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn used_font_names(document: &Document) -> Vec<String> {
    let mut names = vec!["Helvetica".to_string()];
    for page in &document.pages {
        for command in &page.commands {
            if let Command::SetFontName(name) = command {
                names.push(name.clone());
            }
        }
    }
    names.sort();
    names.dedup();
    names
}

fn base14_name(name: &str) -> String {
    if BASE14_FONTS.contains(&name) {
        return name.to_string();
    }
    let lower = name.to_ascii_lowercase();
    let bold = lower.contains("bold");
    let slanted = lower.contains("italic") || lower.contains("oblique");
    match (bold, slanted) {
        (true, true) => "Helvetica-BoldOblique",
        (true, false) => "Helvetica-Bold",
        (false, true) => "Helvetica-Oblique",
        (false, false) => "Helvetica",
    }
    .to_string()
}

fn color_operands(color: Color) -> Vec<Object> {
    vec![color.r.into(), color.g.into(), color.b.into()]
}

fn rect_operands(x: Pt, y: Pt, width: Pt, height: Pt, page_height: Pt) -> Vec<Object> {
    vec![
        x.to_f32().into(),
        (page_height - y - height).to_f32().into(),
        width.to_f32().into(),
        height.to_f32().into(),
    ]
}

fn page_operations(page: &Page, page_height: Pt, font_keys: &BTreeMap<String, String>) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut font_name = "Helvetica".to_string();
    let mut font_size = Pt::from_i32(12);
    let flip = |y: Pt| (page_height - y).to_f32();

    for command in &page.commands {
        match command {
            Command::Meta { .. } => {}
            Command::SetFillColor(color) => ops.push(Operation::new("rg", color_operands(*color))),
            Command::SetStrokeColor(color) => {
                ops.push(Operation::new("RG", color_operands(*color)))
            }
            Command::SetLineWidth(width) => {
                ops.push(Operation::new("w", vec![width.to_f32().into()]))
            }
            Command::SetFontName(name) => font_name = name.clone(),
            Command::SetFontSize(size) => font_size = *size,
            Command::DrawString { x, y, text } => {
                let Some(key) = font_keys.get(&font_name) else {
                    continue;
                };
                let baseline = *y + font_size.mul_ratio(ASCENT_RATIO.0, ASCENT_RATIO.1);
                ops.push(Operation::new("BT", Vec::new()));
                ops.push(Operation::new(
                    "Tf",
                    vec![key.as_str().into(), font_size.to_f32().into()],
                ));
                ops.push(Operation::new(
                    "Td",
                    vec![x.to_f32().into(), flip(baseline).into()],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", Vec::new()));
            }
            Command::FillRect {
                x,
                y,
                width,
                height,
            } => {
                ops.push(Operation::new(
                    "re",
                    rect_operands(*x, *y, *width, *height, page_height),
                ));
                ops.push(Operation::new("f", Vec::new()));
            }
            Command::StrokeRect {
                x,
                y,
                width,
                height,
            } => {
                ops.push(Operation::new(
                    "re",
                    rect_operands(*x, *y, *width, *height, page_height),
                ));
                ops.push(Operation::new("S", Vec::new()));
            }
            Command::Line { x1, y1, x2, y2 } => {
                ops.push(Operation::new("m", vec![x1.to_f32().into(), flip(*y1).into()]));
                ops.push(Operation::new("l", vec![x2.to_f32().into(), flip(*y2).into()]));
                ops.push(Operation::new("S", Vec::new()));
            }
            Command::FillCircle { cx, cy, radius } => {
                circle_operations(&mut ops, cx.to_f32(), flip(*cy), radius.to_f32());
                ops.push(Operation::new("f", Vec::new()));
            }
        }
    }
    ops
}

fn circle_operations(ops: &mut Vec<Operation>, cx: f32, cy: f32, r: f32) {
    let k = r * CIRCLE_KAPPA;
    let curve = |x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32| {
        Operation::new(
            "c",
            vec![x1.into(), y1.into(), x2.into(), y2.into(), x3.into(), y3.into()],
        )
    };
    ops.push(Operation::new("m", vec![(cx + r).into(), cy.into()]));
    ops.push(curve(cx + r, cy + k, cx + k, cy + r, cx, cy + r));
    ops.push(curve(cx - k, cy + r, cx - r, cy + k, cx - r, cy));
    ops.push(curve(cx - r, cy - k, cx - k, cy - r, cx, cy - r));
    ops.push(curve(cx + k, cy - r, cx + r, cy - k, cx + r, cy));
}

/// Maps text onto WinAnsiEncoding bytes; characters outside it become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => ch as u8,
            '\u{20ac}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2122}' => 0x99,
            _ => b'?',
        })
        .collect()
}
