use crate::types::{Pt, Rect};

/// Slack a section title needs below it when the first block of its section
/// cannot share the page with it.
pub const DEFAULT_MINIMUM_FIT: Pt = Pt::from_whole(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// The block did not fit in the remaining height.
    BlockOverflow,
    /// The block fit but the slack requested under it did not.
    KeepWithNext,
    /// The block is taller than a whole page.
    OversizedBlock,
    Forced,
}

impl BreakReason {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakReason::BlockOverflow => "block_overflow",
            BreakReason::KeepWithNext => "header_keep_with_next",
            BreakReason::OversizedBlock => "oversized_block",
            BreakReason::Forced => "forced",
        }
    }
}

/// Where a reserved block goes. `y` is absolute on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub page_index: usize,
    pub x: Pt,
    pub y: Pt,
    pub page_break: Option<BreakReason>,
    /// The block is taller than the content area and runs past its bottom.
    pub overflows: bool,
}

/// Vertical flow position over a sequence of identical content areas.
#[derive(Debug, Clone)]
pub struct PageCursor {
    content: Rect,
    page_index: usize,
    offset: Pt,
}

impl PageCursor {
    pub fn new(content: Rect) -> Self {
        Self {
            content,
            page_index: 0,
            offset: Pt::ZERO,
        }
    }

    pub fn content_rect(&self) -> Rect {
        self.content
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn offset(&self) -> Pt {
        self.offset
    }

    pub fn remaining_height(&self) -> Pt {
        (self.content.height - self.offset).max(Pt::ZERO)
    }

    pub fn is_page_empty(&self) -> bool {
        self.offset <= Pt::ZERO
    }

    pub fn fits(&self, height: Pt) -> bool {
        height <= self.remaining_height()
    }

    /// Claims `height` on the current page, or on a fresh one when
    /// `height + minimum_fit` exceeds what is left. An empty page always
    /// accepts the block, so oversized blocks overflow instead of looping.
    pub fn reserve(&mut self, height: Pt, minimum_fit: Pt) -> Reservation {
        let height = height.max(Pt::ZERO);
        let mut page_break = None;
        if !self.is_page_empty() && !self.fits(height + minimum_fit.max(Pt::ZERO)) {
            page_break = Some(if height > self.content.height {
                BreakReason::OversizedBlock
            } else if self.fits(height) {
                BreakReason::KeepWithNext
            } else {
                BreakReason::BlockOverflow
            });
            self.next_page();
        }
        let reservation = Reservation {
            page_index: self.page_index,
            x: self.content.x,
            y: self.content.y + self.offset,
            page_break,
            overflows: height > self.content.height,
        };
        self.offset += height;
        reservation
    }

    pub fn reserve_block(&mut self, height: Pt) -> Reservation {
        self.reserve(height, Pt::ZERO)
    }

    /// Claims `height` at the current offset without ever breaking. Used for a
    /// block that cannot fit on any page and must stay under its title.
    pub fn reserve_attached(&mut self, height: Pt) -> Reservation {
        let height = height.max(Pt::ZERO);
        let reservation = Reservation {
            page_index: self.page_index,
            x: self.content.x,
            y: self.content.y + self.offset,
            page_break: None,
            overflows: self.offset + height > self.content.height,
        };
        self.offset += height;
        reservation
    }

    /// Moves down by `gap`, never past the bottom and never at the top of a page.
    pub fn skip(&mut self, gap: Pt) {
        if self.is_page_empty() {
            return;
        }
        self.offset = (self.offset + gap.max(Pt::ZERO)).min(self.content.height.max(self.offset));
    }

    /// Starts a new page unless nothing has been placed on the current one.
    pub fn force_page_break(&mut self) -> bool {
        if self.is_page_empty() {
            return false;
        }
        self.next_page();
        true
    }

    fn next_page(&mut self) {
        self.page_index += 1;
        self.offset = Pt::ZERO;
    }
}
