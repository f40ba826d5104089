use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMetrics {
    pub page_number: usize,
    pub block_count: usize,
    pub command_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMetrics {
    pub pages: Vec<PageMetrics>,
    pub sections_rendered: usize,
    pub sections_skipped: usize,
    pub page_breaks: usize,
    pub total_render_ms: f64,
}

impl DocumentMetrics {
    pub fn total_blocks(&self) -> usize {
        self.pages.iter().map(|page| page.block_count).sum()
    }
}
