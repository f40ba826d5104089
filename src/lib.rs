//! Paginated layout for project evaluation reports.
//!
//! A report is measured block by block and placed onto fixed-size pages without
//! ever splitting a block. The result is a [`Document`] of absolute draw
//! instructions that a [`ReportSink`] turns into PDF or JSON.
//!
//! ```no_run
//! use pitchpress::{EvaluationReport, ReportRenderer};
//!
//! let report = EvaluationReport::from_json_str(r#"{ "fitScore": 72 }"#)?;
//! let renderer = ReportRenderer::builder().margin_all(40.0).build()?;
//! let pdf = renderer.render_to_pdf(&report)?;
//! # Ok::<(), pitchpress::ReportError>(())
//! ```

mod assembler;
mod block;
mod canvas;
mod composer;
mod cursor;
mod debug;
mod error;
mod font;
mod metrics;
mod report;
mod section;
mod sink;
mod text;
mod theme;
mod types;

pub use assembler::{ATTRIBUTION_LINES, DEFAULT_REPORT_TITLE, assemble, build_section};
pub use block::{
    Block, BlockKind, BulletList, Card, Divider, FitBand, MeasuredBlock, Panel, Paragraph,
    ReportHeader, SectionTitle, Spacer, Stack, TextAlign, TextRole, Timeline, TimelineItem,
    TwoColumn, style_for,
};
pub use canvas::{Canvas, Command, Document, Page, Sketch};
pub use composer::{Composer, META_BLOCK_BOUNDS};
pub use cursor::{BreakReason, DEFAULT_MINIMUM_FIT, PageCursor, Reservation};
pub use error::{ReportError, Result};
pub use font::FontRegistry;
pub use metrics::{DocumentMetrics, PageMetrics};
pub use report::{
    AdjacentIdea, BootstrapStep, BootstrappingGuide, BusinessPlan, Channel, CompetitiveLandscape,
    Competitor, CustomerAcquisition, EvaluationReport, LaunchStrategy, MarketFit,
    RevenueGeneration, RevenueStream, Risk, TargetAudience,
};
pub use section::{Section, SectionId, render_section};
pub use sink::{JsonSink, PdfSink, ReportSink};
pub use text::{FontFace, TextLayout, TextMeasurer, TextStyle};
pub use theme::{FontFamily, FontSizes, PanelKind, PanelPalette, Palettes, Theme};
pub use types::{Color, Margins, Pt, Rect, Size};

use debug::DebugLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_FOOTER_TEMPLATE: &str = "Page {page} of {pages}";

/// Renders evaluation reports with one fixed page geometry and theme.
/// Immutable once built; every render is an independent pass.
pub struct ReportRenderer {
    page_size: Size,
    margins: Margins,
    theme: Arc<Theme>,
    font_registry: Option<Arc<FontRegistry>>,
    page_footer: Option<PageFooterSpec>,
    document_title: Option<String>,
    debug: Option<Arc<DebugLogger>>,
}

#[derive(Clone)]
pub struct ReportRendererBuilder {
    page_size: Size,
    margins: Margins,
    theme: Theme,
    font_dirs: Vec<PathBuf>,
    font_files: Vec<PathBuf>,
    page_footer: Option<PageFooterSpec>,
    document_title: Option<String>,
    debug_path: Option<PathBuf>,
}

/// Text stamped on every page once the page count is known. `{page}` and
/// `{pages}` are substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFooterSpec {
    pub template: String,
    pub font_size: Option<Pt>,
    pub color: Option<Color>,
    pub y_from_bottom: Option<Pt>,
}

impl Default for PageFooterSpec {
    fn default() -> Self {
        Self {
            template: DEFAULT_FOOTER_TEMPLATE.to_string(),
            font_size: None,
            color: None,
            y_from_bottom: None,
        }
    }
}

impl ReportRenderer {
    pub fn builder() -> ReportRendererBuilder {
        ReportRendererBuilder::new()
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    fn measurer(&self) -> TextMeasurer {
        TextMeasurer::new(self.theme.clone(), self.font_registry.clone())
    }

    pub fn render(&self, report: &EvaluationReport) -> Result<Document> {
        Ok(self.render_with_metrics(report)?.0)
    }

    pub fn render_with_metrics(&self, report: &EvaluationReport) -> Result<(Document, DocumentMetrics)> {
        let measurer = self.measurer();
        let mut composer = Composer::new(
            measurer.clone(),
            self.page_size,
            self.margins,
            self.debug.clone(),
        )?;
        assemble(&mut composer, report, self.document_title.as_deref());
        let (mut document, metrics) = composer.finish();
        if let Some(footer) = &self.page_footer {
            apply_page_footer(
                &mut document,
                footer,
                self.margins,
                self.document_title.as_deref(),
                &measurer,
            );
        }
        Ok((document, metrics))
    }

    pub fn render_to_pdf(&self, report: &EvaluationReport) -> Result<Vec<u8>> {
        let document = self.render(report)?;
        let sink = match &self.document_title {
            Some(title) => PdfSink::new().with_title(title.clone()),
            None => PdfSink::new().with_title(DEFAULT_REPORT_TITLE),
        };
        sink.write_document(&document)
    }

    pub fn render_to_json(&self, report: &EvaluationReport) -> Result<String> {
        JsonSink::default().write_document(&self.render(report)?)
    }

    pub fn render_to_file(&self, report: &EvaluationReport, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.render_to_pdf(report)?;
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }

    /// Renders independent reports in parallel. Results keep input order.
    pub fn render_many(&self, reports: &[EvaluationReport]) -> Vec<Result<Document>> {
        use rayon::prelude::*;

        let mut results: Vec<(usize, Result<Document>)> = reports
            .par_iter()
            .enumerate()
            .map(|(idx, report)| (idx, self.render(report)))
            .collect();
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, res)| res).collect()
    }
}

fn apply_page_footer(
    doc: &mut Document,
    spec: &PageFooterSpec,
    margins: Margins,
    title: Option<&str>,
    measurer: &TextMeasurer,
) {
    let total_pages = doc.pages.len();
    let theme = measurer.theme();
    let font_size = spec.font_size.unwrap_or(theme.sizes.small);
    let color = spec.color.unwrap_or(theme.muted_color);
    let y_from_bottom = spec
        .y_from_bottom
        .unwrap_or_else(|| (margins.bottom - font_size).half().max(Pt::ZERO));
    let style = TextStyle::new(font_size, FontFace::Regular, color);
    let font_name = measurer.font_name(FontFace::Regular).to_string();
    // Top-left origin; DrawString y is the top of the text box, kept inside the bottom margin.
    let content_bottom = doc.page_size.height - margins.bottom;
    let y = (doc.page_size.height - y_from_bottom - font_size).max(content_bottom);
    let right_edge = doc.page_size.width - margins.right;

    for (idx0, page) in doc.pages.iter_mut().enumerate() {
        let text = spec
            .template
            .replace("{page}", &(idx0 + 1).to_string())
            .replace("{pages}", &total_pages.to_string());
        let x = (right_edge - measurer.text_width(&text, &style)).max(Pt::ZERO);

        page.commands.push(Command::SetFillColor(color));
        page.commands.push(Command::SetFontName(font_name.clone()));
        page.commands.push(Command::SetFontSize(font_size));
        if let Some(title) = title {
            page.commands.push(Command::DrawString {
                x: margins.left,
                y,
                text: title.to_string(),
            });
        }
        page.commands.push(Command::DrawString { x, y, text });
    }
}

impl Default for ReportRendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportRendererBuilder {
    pub fn new() -> Self {
        Self {
            page_size: Size::a4(),
            margins: Margins::all(36.0),
            theme: Theme::default(),
            font_dirs: Vec::new(),
            font_files: Vec::new(),
            page_footer: Some(PageFooterSpec::default()),
            document_title: None,
            debug_path: None,
        }
    }

    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn margin_all(mut self, value: f32) -> Self {
        self.margins = Margins::all(value);
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn register_font_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_dirs.push(path.into());
        self
    }

    pub fn register_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    pub fn page_footer(mut self, enabled: bool) -> Self {
        self.page_footer = enabled.then(PageFooterSpec::default);
        self
    }

    pub fn page_footer_spec(mut self, spec: PageFooterSpec) -> Self {
        self.page_footer = Some(spec);
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.document_title = (!title.trim().is_empty()).then_some(title);
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<ReportRenderer> {
        let content = self.margins.content_rect(self.page_size);
        if !content.width.is_positive() || !content.height.is_positive() {
            return Err(ReportError::InvalidConfiguration(format!(
                "margins leave no content area on a {}x{}pt page",
                self.page_size.width.to_f32(),
                self.page_size.height.to_f32()
            )));
        }
        if let Some(footer) = &self.page_footer {
            let font_size = footer.font_size.unwrap_or(self.theme.sizes.small);
            if self.margins.bottom < font_size {
                return Err(ReportError::InvalidConfiguration(format!(
                    "bottom margin of {}pt cannot hold a {}pt page footer",
                    self.margins.bottom.to_f32(),
                    font_size.to_f32()
                )));
            }
        }
        if !self.theme.line_height_ratio.is_finite() || self.theme.line_height_ratio <= 0.0 {
            return Err(ReportError::InvalidConfiguration(
                "theme line_height_ratio must be > 0".to_string(),
            ));
        }
        let mut registry = FontRegistry::new();
        for dir in &self.font_dirs {
            registry.register_dir(dir)?;
        }
        for file in &self.font_files {
            registry.register_file(file)?;
        }
        let font_registry = (!registry.is_empty()).then(|| Arc::new(registry));
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        Ok(ReportRenderer {
            page_size: self.page_size,
            margins: self.margins,
            theme: Arc::new(self.theme),
            font_registry,
            page_footer: self.page_footer,
            document_title: self.document_title,
            debug,
        })
    }
}
