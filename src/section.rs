use crate::block::{Block, SectionTitle};
use crate::composer::Composer;
use crate::cursor::{BreakReason, DEFAULT_MINIMUM_FIT};
use serde::{Deserialize, Serialize};

/// The optional report sections, in the order they are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionId {
    MarketFit,
    ValueProposition,
    TargetAudience,
    CompetitiveLandscape,
    RiskAssessment,
    BusinessPlan,
    LaunchStrategy,
    CustomerAcquisition,
    RevenueGeneration,
    BootstrappingGuide,
    AdjacentIdeas,
}

impl SectionId {
    pub const ALL: [SectionId; 11] = [
        SectionId::MarketFit,
        SectionId::ValueProposition,
        SectionId::TargetAudience,
        SectionId::CompetitiveLandscape,
        SectionId::RiskAssessment,
        SectionId::BusinessPlan,
        SectionId::LaunchStrategy,
        SectionId::CustomerAcquisition,
        SectionId::RevenueGeneration,
        SectionId::BootstrappingGuide,
        SectionId::AdjacentIdeas,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SectionId::MarketFit => "Market Fit Analysis",
            SectionId::ValueProposition => "Value Proposition",
            SectionId::TargetAudience => "Target Audience",
            SectionId::CompetitiveLandscape => "Competitive Landscape",
            SectionId::RiskAssessment => "Risk Assessment",
            SectionId::BusinessPlan => "Business Plan",
            SectionId::LaunchStrategy => "Launch Strategy",
            SectionId::CustomerAcquisition => "Customer Acquisition",
            SectionId::RevenueGeneration => "Revenue Generation",
            SectionId::BootstrappingGuide => "Bootstrapping Guide",
            SectionId::AdjacentIdeas => "Adjacent Ideas",
        }
    }
}

pub struct Section {
    pub title: String,
    pub blocks: Vec<Box<dyn Block>>,
    pub force_new_page: bool,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            blocks: Vec::new(),
            force_new_page: false,
        }
    }

    pub fn push(&mut self, block: Box<dyn Block>) {
        self.blocks.push(block);
    }

    pub fn push_opt(&mut self, block: Option<Box<dyn Block>>) {
        if let Some(block) = block {
            self.blocks.push(block);
        }
    }

    pub fn with_force_new_page(mut self, force: bool) -> Self {
        self.force_new_page = force;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Lays out a titled section. Returns `false` and draws nothing when the
/// section has no blocks.
///
/// The title is never left alone at the bottom of a page: it is placed only if
/// the first block fits under it, or, when title and first block together are
/// taller than a page, if at least [`DEFAULT_MINIMUM_FIT`] remains. A first
/// block taller than a whole page starts a fresh page together with the title
/// and overflows below it.
pub fn render_section(composer: &mut Composer, section: &Section) -> bool {
    let Some(first_block) = section.blocks.first() else {
        composer.record_section(&section.title, 0, false);
        return false;
    };
    let (section_gap, block_gap) = {
        let theme = composer.theme();
        (theme.section_gap, theme.block_gap)
    };
    let title = composer.measure(&SectionTitle::new(section.title.clone()));
    let first = composer.measure(first_block.as_ref());
    let oversized_first = first.height() > composer.content_height();

    if oversized_first {
        composer.force_page_break_for(BreakReason::OversizedBlock);
    } else if section.force_new_page {
        composer.force_page_break();
    }
    composer.gap(section_gap);

    let together = title.height() + block_gap + first.height();
    let minimum_fit = if together <= composer.content_height() {
        block_gap + first.height()
    } else {
        composer.theme().minimum_fit.max(DEFAULT_MINIMUM_FIT)
    };
    composer.place_keep_with_next(title, minimum_fit);

    let mut measured = Vec::with_capacity(section.blocks.len());
    measured.push(first);
    for block in &section.blocks[1..] {
        measured.push(composer.measure(block.as_ref()));
    }
    let mut placed = 0usize;
    for (idx, block) in measured.into_iter().enumerate() {
        if !block.height().is_positive() {
            continue;
        }
        composer.gap(block_gap);
        if idx == 0 && oversized_first {
            composer.place_attached(block);
        } else {
            composer.place(block);
        }
        placed += 1;
    }
    composer.record_section(&section.title, placed, true);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Paragraph, Spacer};
    use crate::canvas::Document;
    use crate::text::TextMeasurer;
    use crate::theme::Theme;
    use crate::types::{Margins, Pt, Size};
    use std::sync::Arc;

    fn composer(height: f32) -> Composer {
        let measurer = TextMeasurer::new(Arc::new(Theme::default()), None);
        Composer::new(measurer, Size::new(300.0, height), Margins::all(20.0), None)
            .expect("composer")
    }

    fn page_of(document: &Document, needle: &str) -> Option<usize> {
        document
            .pages
            .iter()
            .position(|page| page.contains_text(needle))
    }

    #[test]
    fn empty_section_draws_nothing() {
        let mut composer = composer(400.0);
        assert!(!render_section(&mut composer, &Section::new("Launch Strategy")));
        let (document, metrics) = composer.finish();
        assert_eq!(document.page_count(), 1);
        assert!(!document.pages[0].contains_text("Launch Strategy"));
        assert_eq!(metrics.sections_skipped, 1);
        assert_eq!(metrics.sections_rendered, 0);
    }

    #[test]
    fn title_moves_with_its_first_block() {
        let mut composer = composer(400.0);
        let filler = composer.measure(&Spacer::new(Pt::from_i32(300)));
        composer.place(filler);

        let mut section = Section::new("Risk Assessment");
        section.push(Box::new(Spacer::new(Pt::from_i32(40))));
        section.push(Box::new(Paragraph::new("after")));
        assert!(render_section(&mut composer, &section));
        let (document, _) = composer.finish();
        assert_eq!(page_of(&document, "Risk Assessment"), Some(1));
        assert_eq!(page_of(&document, "after"), Some(1));
    }

    #[test]
    fn forced_section_starts_a_new_page() {
        let mut composer = composer(400.0);
        let filler = composer.measure(&Paragraph::new("intro"));
        composer.place(filler);

        let mut section = Section::new("Business Plan").with_force_new_page(true);
        section.push(Box::new(Paragraph::new("plan body")));
        render_section(&mut composer, &section);
        let (document, metrics) = composer.finish();
        assert_eq!(page_of(&document, "intro"), Some(0));
        assert_eq!(page_of(&document, "Business Plan"), Some(1));
        assert_eq!(metrics.page_breaks, 1);
    }

    #[test]
    fn oversized_first_block_starts_the_page_with_its_title() {
        let mut composer = composer(400.0);
        let filler = composer.measure(&Paragraph::new("intro"));
        composer.place(filler);

        let mut section = Section::new("Risk Assessment");
        section.push(Box::new(Spacer::new(Pt::from_i32(500))));
        section.push(Box::new(Paragraph::new("after")));
        assert!(render_section(&mut composer, &section));
        let (document, metrics) = composer.finish();
        assert_eq!(page_of(&document, "intro"), Some(0));
        assert_eq!(page_of(&document, "Risk Assessment"), Some(1));
        assert_eq!(page_of(&document, "after"), Some(2));
        assert_eq!(metrics.pages[0].block_count, 1);
        assert_eq!(metrics.pages[1].block_count, 2);
        assert_eq!(metrics.page_breaks, 2);
    }

    #[test]
    fn section_titles_follow_canonical_order() {
        assert_eq!(SectionId::ALL[0].title(), "Market Fit Analysis");
        assert_eq!(SectionId::ALL[10].title(), "Adjacent Ideas");
        let json = serde_json::to_string(&SectionId::RiskAssessment).expect("serialize");
        assert_eq!(json, "\"riskAssessment\"");
    }
}
