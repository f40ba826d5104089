//! Immutable styling configuration for a render pass.
//!
//! Every color, font and spacing value the layout engine uses comes from a
//! [`Theme`]. Partial JSON overrides the defaults field by field:
//!
//! ```json
//! { "fonts": { "regular": "Inter" }, "pageBreakBefore": ["riskAssessment"] }
//! ```

use crate::cursor::DEFAULT_MINIMUM_FIT;
use crate::error::Result;
use crate::section::SectionId;
use crate::types::{Color, Pt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelKind {
    Affirmative,
    Cautionary,
    Risk,
    Neutral,
    Info,
    Quote,
    Accent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelPalette {
    pub background: Color,
    pub border: Color,
    pub heading: Color,
}

impl PanelPalette {
    const fn new(background: Color, border: Color, heading: Color) -> Self {
        Self {
            background,
            border,
            heading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Palettes {
    pub affirmative: PanelPalette,
    pub cautionary: PanelPalette,
    pub risk: PanelPalette,
    pub neutral: PanelPalette,
    pub info: PanelPalette,
    pub quote: PanelPalette,
    pub accent: PanelPalette,
}

impl Default for Palettes {
    fn default() -> Self {
        Self {
            affirmative: PanelPalette::new(
                Color::rgb8(240, 253, 244),
                Color::rgb8(134, 239, 172),
                Color::rgb8(22, 101, 52),
            ),
            cautionary: PanelPalette::new(
                Color::rgb8(255, 251, 235),
                Color::rgb8(252, 211, 77),
                Color::rgb8(146, 64, 14),
            ),
            risk: PanelPalette::new(
                Color::rgb8(254, 242, 242),
                Color::rgb8(252, 165, 165),
                Color::rgb8(153, 27, 27),
            ),
            neutral: PanelPalette::new(
                Color::rgb8(249, 250, 251),
                Color::rgb8(209, 213, 219),
                Color::rgb8(55, 65, 81),
            ),
            info: PanelPalette::new(
                Color::rgb8(239, 246, 255),
                Color::rgb8(147, 197, 253),
                Color::rgb8(30, 64, 175),
            ),
            quote: PanelPalette::new(
                Color::rgb8(245, 243, 255),
                Color::rgb8(196, 181, 253),
                Color::rgb8(91, 33, 182),
            ),
            accent: PanelPalette::new(
                Color::rgb8(30, 41, 59),
                Color::rgb8(30, 41, 59),
                Color::WHITE,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontFamily {
    pub regular: String,
    pub bold: String,
    pub italic: String,
}

impl Default for FontFamily {
    fn default() -> Self {
        Self {
            regular: "Helvetica".to_string(),
            bold: "Helvetica-Bold".to_string(),
            italic: "Helvetica-Oblique".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FontSizes {
    pub title: Pt,
    pub heading: Pt,
    pub subheading: Pt,
    pub body: Pt,
    pub small: Pt,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: Pt::from_i32(22),
            heading: Pt::from_i32(14),
            subheading: Pt::from_i32(11),
            body: Pt::from_i32(10),
            small: Pt::from_i32(8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theme {
    pub fonts: FontFamily,
    pub sizes: FontSizes,
    /// Line height as a multiple of the font size.
    pub line_height_ratio: f32,
    pub text_color: Color,
    pub muted_color: Color,
    pub rule_color: Color,
    pub palettes: Palettes,
    /// Fill and text colors of section title bars.
    pub section_title: PanelPalette,
    pub panel_padding: Pt,
    pub border_width: Pt,
    pub block_gap: Pt,
    pub section_gap: Pt,
    pub item_gap: Pt,
    pub column_gutter: Pt,
    pub bullet_indent: Pt,
    pub divider_height: Pt,
    pub marker_radius: Pt,
    /// Room that must remain under a section title before it may be placed.
    pub minimum_fit: Pt,
    pub page_break_before: Vec<SectionId>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fonts: FontFamily::default(),
            sizes: FontSizes::default(),
            line_height_ratio: 1.4,
            text_color: Color::rgb8(31, 41, 55),
            muted_color: Color::rgb8(107, 114, 128),
            rule_color: Color::rgb8(209, 213, 219),
            palettes: Palettes::default(),
            section_title: PanelPalette::new(
                Color::rgb8(79, 70, 229),
                Color::rgb8(79, 70, 229),
                Color::WHITE,
            ),
            panel_padding: Pt::from_i32(8),
            border_width: Pt::from_f32(0.75),
            block_gap: Pt::from_i32(8),
            section_gap: Pt::from_i32(16),
            item_gap: Pt::from_i32(4),
            column_gutter: Pt::from_i32(14),
            bullet_indent: Pt::from_i32(12),
            divider_height: Pt::from_i32(12),
            marker_radius: Pt::from_i32(7),
            minimum_fit: DEFAULT_MINIMUM_FIT,
            page_break_before: Vec::new(),
        }
    }
}

impl Theme {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn palette(&self, kind: PanelKind) -> &PanelPalette {
        match kind {
            PanelKind::Affirmative => &self.palettes.affirmative,
            PanelKind::Cautionary => &self.palettes.cautionary,
            PanelKind::Risk => &self.palettes.risk,
            PanelKind::Neutral => &self.palettes.neutral,
            PanelKind::Info => &self.palettes.info,
            PanelKind::Quote => &self.palettes.quote,
            PanelKind::Accent => &self.palettes.accent,
        }
    }

    pub fn breaks_before(&self, section: SectionId) -> bool {
        self.page_break_before.contains(&section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let theme = Theme::from_json_str(
            r##"{
                "fonts": { "regular": "Inter" },
                "sizes": { "body": 11 },
                "palettes": { "risk": { "background": "#ffeeee", "border": "#ff0000", "heading": "#990000" } },
                "pageBreakBefore": ["riskAssessment", "businessPlan"]
            }"##,
        )
        .expect("theme json");
        let defaults = Theme::default();
        assert_eq!(theme.fonts.regular, "Inter");
        assert_eq!(theme.fonts.bold, defaults.fonts.bold);
        assert_eq!(theme.sizes.body, Pt::from_i32(11));
        assert_eq!(theme.sizes.heading, defaults.sizes.heading);
        assert_eq!(theme.palette(PanelKind::Risk).border.to_hex(), "#ff0000");
        assert_eq!(theme.palettes.affirmative, defaults.palettes.affirmative);
        assert!(theme.breaks_before(SectionId::RiskAssessment));
        assert!(!theme.breaks_before(SectionId::MarketFit));
    }

    #[test]
    fn palette_depends_only_on_kind() {
        let theme = Theme::default();
        assert_eq!(
            theme.palette(PanelKind::Affirmative),
            theme.palette(PanelKind::Affirmative)
        );
        assert_ne!(
            theme.palette(PanelKind::Affirmative),
            theme.palette(PanelKind::Cautionary)
        );
    }

    #[test]
    fn bad_color_is_a_json_error() {
        let err = Theme::from_json_str(r#"{ "textColor": "not-a-color" }"#)
            .expect_err("invalid color");
        assert!(err.to_string().contains("invalid color"));
    }
}
