use crate::block::{Block, BlockKind, MeasuredBlock};
use crate::canvas::{Canvas, Document};
use crate::cursor::{BreakReason, PageCursor, Reservation};
use crate::debug::{DebugCounters, DebugLogger};
use crate::error::{ReportError, Result};
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::text::TextMeasurer;
use crate::theme::Theme;
use crate::types::{Margins, Pt, Size};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// Canvas meta key carrying `kind x y width height` (millipoints) for every
/// placed block.
pub const META_BLOCK_BOUNDS: &str = "block";

/// Per-pass layout state: the cursor deciding where blocks go, the canvas
/// receiving them, and the metrics and log entries describing the decisions.
pub struct Composer {
    measurer: TextMeasurer,
    canvas: Canvas,
    cursor: PageCursor,
    debug: Option<Arc<DebugLogger>>,
    counters: DebugCounters,
    metrics: DocumentMetrics,
    page_blocks: usize,
    started: Instant,
}

impl Composer {
    pub(crate) fn new(
        measurer: TextMeasurer,
        page_size: Size,
        margins: Margins,
        debug: Option<Arc<DebugLogger>>,
    ) -> Result<Self> {
        let content = margins.content_rect(page_size);
        if !content.width.is_positive() || !content.height.is_positive() {
            return Err(ReportError::InvalidConfiguration(format!(
                "content area must be positive, got {}x{}pt",
                content.width.to_f32(),
                content.height.to_f32()
            )));
        }
        Ok(Self {
            measurer,
            canvas: Canvas::new(page_size),
            cursor: PageCursor::new(content),
            debug,
            counters: DebugCounters::default(),
            metrics: DocumentMetrics::default(),
            page_blocks: 0,
            started: Instant::now(),
        })
    }

    pub fn measurer(&self) -> &TextMeasurer {
        &self.measurer
    }

    pub fn theme(&self) -> &Theme {
        self.measurer.theme()
    }

    pub fn content_width(&self) -> Pt {
        self.cursor.content_rect().width
    }

    pub fn content_height(&self) -> Pt {
        self.cursor.content_rect().height
    }

    pub fn page_index(&self) -> usize {
        self.cursor.page_index()
    }

    pub fn measure(&self, block: &dyn Block) -> MeasuredBlock {
        block.measure(&self.measurer, self.content_width())
    }

    pub fn place(&mut self, block: MeasuredBlock) -> Reservation {
        self.place_keep_with_next(block, Pt::ZERO)
    }

    /// Places `block` only if `minimum_fit` more points remain under it;
    /// otherwise moves it to the top of a new page first.
    pub fn place_keep_with_next(&mut self, block: MeasuredBlock, minimum_fit: Pt) -> Reservation {
        let reservation = self.cursor.reserve(block.height(), minimum_fit);
        if let Some(reason) = reservation.page_break {
            self.start_page(reason, Some(block.kind()));
        }
        self.commit(block, reservation)
    }

    /// Places `block` directly below whatever is already on the page, letting
    /// it run past the bottom instead of breaking.
    pub fn place_attached(&mut self, block: MeasuredBlock) -> Reservation {
        let reservation = self.cursor.reserve_attached(block.height());
        self.commit(block, reservation)
    }

    fn commit(&mut self, block: MeasuredBlock, reservation: Reservation) -> Reservation {
        let kind = block.kind();
        if reservation.overflows {
            if let Some(logger) = self.debug.as_deref() {
                logger.log_event(
                    "layout.oversized_block",
                    json!({
                        "page": reservation.page_index + 1,
                        "block": kind.as_str(),
                        "height": block.height(),
                        "content_height": self.content_height(),
                    }),
                );
            }
            self.counters.increment("layout.oversized_block", 1);
        }
        self.canvas.meta(
            META_BLOCK_BOUNDS,
            format!(
                "{} {} {} {} {}",
                kind.as_str(),
                reservation.x.to_milli_i64(),
                reservation.y.to_milli_i64(),
                block.width().to_milli_i64(),
                block.height().to_milli_i64()
            ),
        );
        block.place(&mut self.canvas, reservation.x, reservation.y);
        self.page_blocks += 1;
        reservation
    }

    pub fn gap(&mut self, gap: Pt) {
        self.cursor.skip(gap);
    }

    pub fn force_page_break(&mut self) -> bool {
        self.force_page_break_for(BreakReason::Forced)
    }

    /// Starts a new page unless the current one is empty, logging `reason`.
    pub fn force_page_break_for(&mut self, reason: BreakReason) -> bool {
        if !self.cursor.force_page_break() {
            return false;
        }
        self.start_page(reason, None);
        true
    }

    pub(crate) fn record_section(&mut self, title: &str, block_count: usize, rendered: bool) {
        if rendered {
            self.metrics.sections_rendered += 1;
        } else {
            self.metrics.sections_skipped += 1;
        }
        if let Some(logger) = self.debug.as_deref() {
            logger.log_event(
                "layout.section",
                json!({
                    "title": title,
                    "blocks": block_count,
                    "rendered": rendered,
                    "page": self.cursor.page_index() + 1,
                }),
            );
        }
    }

    fn start_page(&mut self, reason: BreakReason, kind: Option<BlockKind>) {
        let from_page = self.canvas.page_index() + 1;
        self.close_page();
        self.canvas.show_page();
        self.metrics.page_breaks += 1;
        if let Some(logger) = self.debug.as_deref() {
            logger.log_event(
                "layout.page_break",
                json!({
                    "from_page": from_page,
                    "to_page": from_page + 1,
                    "reason": reason.as_str(),
                    "block": kind.map(BlockKind::as_str),
                }),
            );
        }
        self.counters.increment("layout.page_break", 1);
        self.counters.increment(&format!("layout.page_break.{}", reason.as_str()), 1);
    }

    fn close_page(&mut self) {
        self.metrics.pages.push(PageMetrics {
            page_number: self.canvas.page_index() + 1,
            block_count: self.page_blocks,
            command_count: self.canvas.current_command_count(),
        });
        self.page_blocks = 0;
    }

    pub fn finish(mut self) -> (Document, DocumentMetrics) {
        // An empty trailing page is dropped by the canvas; keep metrics in step.
        if !self.canvas.is_current_empty() || self.canvas.page_index() == 0 {
            self.close_page();
        }
        let document = self.canvas.finish();
        self.metrics.total_render_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        if let Some(logger) = self.debug.as_deref() {
            self.counters.increment("layout.pages", document.page_count() as u64);
            logger.emit_summary("render", &self.counters);
            logger.flush();
        }
        (document, self.metrics)
    }
}
