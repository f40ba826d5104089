use crate::block::{
    Block, BulletList, Card, Divider, Panel, Paragraph, ReportHeader, Stack, TextRole, Timeline,
    TimelineItem, TwoColumn,
};
use crate::composer::Composer;
use crate::report::{
    AdjacentIdea, BootstrappingGuide, BusinessPlan, Channel, CompetitiveLandscape, Competitor,
    CustomerAcquisition, EvaluationReport, LaunchStrategy, MarketFit, RevenueGeneration,
    RevenueStream, Risk, TargetAudience,
};
use crate::section::{Section, SectionId, render_section};
use crate::theme::{PanelKind, Theme};

pub const DEFAULT_REPORT_TITLE: &str = "Project Evaluation Report";

pub const ATTRIBUTION_LINES: [&str; 2] = [
    "This report was generated automatically from an AI-assisted evaluation of the project.",
    "Scores and recommendations are estimates; validate them with real users before acting on them.",
];

/// Lays a whole report out on `composer`: header, every present section in
/// canonical order, then the attribution block.
pub fn assemble(composer: &mut Composer, report: &EvaluationReport, title: Option<&str>) {
    let header = ReportHeader::new(
        title.unwrap_or(DEFAULT_REPORT_TITLE),
        report.display_score(),
        report.fit_explanation.clone(),
    );
    let header = composer.measure(&header);
    composer.place(header);

    for id in SectionId::ALL {
        let force_new_page = composer.theme().breaks_before(id);
        let section = build_section(id, report, composer.theme()).with_force_new_page(force_new_page);
        render_section(composer, &section);
    }

    let section_gap = composer.theme().section_gap;
    composer.gap(section_gap);
    let attribution = attribution_block(composer.theme());
    let attribution = composer.measure(&attribution);
    composer.place(attribution);
}

pub fn build_section(id: SectionId, report: &EvaluationReport, theme: &Theme) -> Section {
    let mut section = Section::new(id.title());
    match id {
        SectionId::MarketFit => {
            if let Some(market) = &report.market_fit {
                market_fit_blocks(&mut section, market);
            }
        }
        SectionId::ValueProposition => {
            section.push_opt(report.value_proposition.as_deref().map(|text| {
                boxed(Panel::new(
                    PanelKind::Quote,
                    boxed(Paragraph::new(format!("\u{201c}{text}\u{201d}")).with_role(TextRole::Emphasis)),
                ))
            }));
        }
        SectionId::TargetAudience => {
            if let Some(audience) = &report.target_audience {
                target_audience_blocks(&mut section, audience);
            }
        }
        SectionId::CompetitiveLandscape => {
            if let Some(landscape) = &report.competitive_landscape {
                competitive_landscape_blocks(&mut section, landscape, theme);
            }
        }
        SectionId::RiskAssessment => {
            for risk in &report.risk_assessment {
                section.push_opt(risk_card(risk));
            }
        }
        SectionId::BusinessPlan => {
            if let Some(plan) = &report.business_plan {
                business_plan_blocks(&mut section, plan, theme);
            }
        }
        SectionId::LaunchStrategy => {
            if let Some(launch) = &report.launch_strategy {
                launch_strategy_blocks(&mut section, launch);
            }
        }
        SectionId::CustomerAcquisition => {
            if let Some(acquisition) = &report.customer_acquisition {
                customer_acquisition_blocks(&mut section, acquisition);
            }
        }
        SectionId::RevenueGeneration => {
            if let Some(revenue) = &report.revenue_generation {
                revenue_generation_blocks(&mut section, revenue);
            }
        }
        SectionId::BootstrappingGuide => {
            if let Some(guide) = &report.bootstrapping_guide {
                bootstrapping_blocks(&mut section, guide, theme);
            }
        }
        SectionId::AdjacentIdeas => {
            for idea in &report.adjacent_ideas {
                section.push_opt(idea_card(idea));
            }
        }
    }
    section
}

fn boxed<B: Block + 'static>(block: B) -> Box<dyn Block> {
    Box::new(block)
}

fn text_panel(kind: PanelKind, heading: &str, text: Option<&str>) -> Option<Box<dyn Block>> {
    text.map(|text| boxed(Panel::new(kind, boxed(Paragraph::new(text))).with_heading(heading)))
}

fn list_panel(kind: PanelKind, heading: &str, items: &[String]) -> Option<Box<dyn Block>> {
    if items.is_empty() {
        return None;
    }
    Some(boxed(
        Panel::new(kind, boxed(BulletList::new(items.to_vec()))).with_heading(heading),
    ))
}

fn numbered_panel(kind: PanelKind, heading: &str, items: &[String]) -> Option<Box<dyn Block>> {
    if items.is_empty() {
        return None;
    }
    Some(boxed(
        Panel::new(kind, boxed(BulletList::new(items.to_vec()).numbered())).with_heading(heading),
    ))
}

/// Two blocks side by side when both are present, the survivor alone otherwise.
fn pair(left: Option<Box<dyn Block>>, right: Option<Box<dyn Block>>) -> Option<Box<dyn Block>> {
    match (left, right) {
        (Some(left), Some(right)) => Some(boxed(TwoColumn::new(left, right))),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

fn labeled_list(label: &str, items: &[String], theme: &Theme) -> Option<Box<dyn Block>> {
    if items.is_empty() {
        return None;
    }
    Some(boxed(
        Stack::new(vec![
            boxed(Paragraph::new(label).with_role(TextRole::Strong)),
            boxed(BulletList::new(items.to_vec())),
        ])
        .with_gap(theme.item_gap),
    ))
}

fn labeled_text(label: &str, text: Option<&str>) -> Option<Box<dyn Block>> {
    text.map(|text| boxed(Paragraph::new(format!("{label}: {text}")).with_role(TextRole::Muted)))
}

fn market_fit_blocks(section: &mut Section, market: &MarketFit) {
    section.push_opt(pair(
        list_panel(PanelKind::Affirmative, "Strengths", &market.strengths),
        list_panel(PanelKind::Cautionary, "Areas for Improvement", &market.weaknesses),
    ));
    section.push_opt(text_panel(
        PanelKind::Info,
        "Demand Potential",
        market.demand_potential.as_deref(),
    ));
}

fn target_audience_blocks(section: &mut Section, audience: &TargetAudience) {
    section.push_opt(pair(
        text_panel(PanelKind::Neutral, "Demographics", audience.demographics.as_deref()),
        text_panel(PanelKind::Neutral, "Psychographics", audience.psychographics.as_deref()),
    ));
    section.push_opt(list_panel(PanelKind::Risk, "Pain Points", &audience.pain_points));
}

fn competitive_landscape_blocks(section: &mut Section, landscape: &CompetitiveLandscape, theme: &Theme) {
    section.push_opt(text_panel(
        PanelKind::Info,
        "Market Positioning",
        landscape.market_positioning.as_deref(),
    ));
    section.push_opt(list_panel(
        PanelKind::Affirmative,
        "Competitive Advantages",
        &landscape.competitive_advantages,
    ));
    section.push_opt(text_panel(
        PanelKind::Quote,
        "Differentiation",
        landscape.differentiation.as_deref(),
    ));
    for competitor in &landscape.competitors {
        section.push_opt(competitor_card(competitor, theme));
    }
}

fn competitor_card(competitor: &Competitor, theme: &Theme) -> Option<Box<dyn Block>> {
    let body = pair(
        labeled_list("Strengths", &competitor.strengths, theme),
        labeled_list("Weaknesses", &competitor.weaknesses, theme),
    );
    if competitor.name.is_none()
        && competitor.differentiation.is_none()
        && competitor.pricing_strategy.is_none()
        && body.is_none()
    {
        return None;
    }
    let card = Card::new(
        PanelKind::Neutral,
        competitor.name.as_deref().unwrap_or("Competitor"),
    )
    .with_tag(competitor.market_position.clone())
    .push_opt(
        competitor
            .differentiation
            .as_deref()
            .map(|text| boxed(Paragraph::new(text))),
    )
    .push_opt(body)
    .push_opt(labeled_text("Pricing", competitor.pricing_strategy.as_deref()));
    Some(boxed(card))
}

fn risk_card(risk: &Risk) -> Option<Box<dyn Block>> {
    if risk.description.is_none() && risk.mitigation.is_none() {
        return None;
    }
    let card = Card::new(PanelKind::Risk, risk.kind.as_deref().unwrap_or("Risk"))
        .push_opt(risk.description.as_deref().map(|text| boxed(Paragraph::new(text))))
        .push_opt(text_panel(
            PanelKind::Affirmative,
            "Mitigation",
            risk.mitigation.as_deref(),
        ));
    Some(boxed(card))
}

fn business_plan_blocks(section: &mut Section, plan: &BusinessPlan, theme: &Theme) {
    section.push_opt(text_panel(PanelKind::Info, "Revenue Model", plan.revenue_model.as_deref()));
    section.push_opt(text_panel(PanelKind::Neutral, "Go-to-Market", plan.go_to_market.as_deref()));
    if !plan.milestones.is_empty() {
        let items = plan
            .milestones
            .iter()
            .map(|milestone| TimelineItem::new(None, milestone.clone()))
            .collect();
        section.push(boxed(
            Stack::new(vec![
                boxed(Paragraph::new("Milestones").with_role(TextRole::Subheading)),
                boxed(Timeline::new(items)),
            ])
            .with_gap(theme.item_gap),
        ));
    }
}

fn launch_strategy_blocks(section: &mut Section, launch: &LaunchStrategy) {
    section.push_opt(numbered_panel(PanelKind::Affirmative, "MVP Features", &launch.mvp_features));
    section.push_opt(text_panel(PanelKind::Info, "Timeline", launch.timeline.as_deref()));
    section.push_opt(pair(
        text_panel(PanelKind::Neutral, "Pricing Strategy", launch.pricing_strategy.as_deref()),
        text_panel(PanelKind::Neutral, "Early Adopters", launch.early_adopters.as_deref()),
    ));
}

fn channel_card(channel: &Channel) -> Option<Box<dyn Block>> {
    let name = channel.name.as_deref()?;
    let card = Card::new(PanelKind::Info, name)
        .with_tag(channel.estimated_cost.as_ref().map(|cost| format!("Est. cost: {cost}")))
        .push_opt(channel.description.as_deref().map(|text| boxed(Paragraph::new(text))));
    Some(boxed(card))
}

fn customer_acquisition_blocks(section: &mut Section, acquisition: &CustomerAcquisition) {
    for channel in &acquisition.channels {
        section.push_opt(channel_card(channel));
    }
    section.push_opt(text_panel(
        PanelKind::Affirmative,
        "Retention Strategy",
        acquisition.retention_strategy.as_deref(),
    ));
    section.push_opt(list_panel(
        PanelKind::Neutral,
        "Growth Tactics",
        &acquisition.growth_tactics,
    ));
}

fn stream_card(stream: &RevenueStream) -> Option<Box<dyn Block>> {
    let name = stream.name.as_deref()?;
    let card = Card::new(PanelKind::Affirmative, name)
        .with_tag(stream.potential.as_ref().map(|potential| format!("Potential: {potential}")))
        .push_opt(stream.description.as_deref().map(|text| boxed(Paragraph::new(text))));
    Some(boxed(card))
}

fn revenue_generation_blocks(section: &mut Section, revenue: &RevenueGeneration) {
    for stream in &revenue.streams {
        section.push_opt(stream_card(stream));
    }
    section.push_opt(text_panel(PanelKind::Info, "Pricing Model", revenue.pricing_model.as_deref()));
    section.push_opt(text_panel(PanelKind::Quote, "Projections", revenue.projections.as_deref()));
}

fn bootstrapping_blocks(section: &mut Section, guide: &BootstrappingGuide, theme: &Theme) {
    let steps: Vec<TimelineItem> = guide
        .steps
        .iter()
        .filter(|step| step.title.is_some() || step.description.is_some())
        .map(|step| {
            TimelineItem::new(step.title.clone(), step.description.clone().unwrap_or_default())
        })
        .collect();
    if !steps.is_empty() {
        section.push(boxed(
            Stack::new(vec![
                boxed(Paragraph::new("Step-by-Step Plan").with_role(TextRole::Subheading)),
                boxed(Timeline::new(steps)),
            ])
            .with_gap(theme.item_gap),
        ));
    }
    section.push_opt(list_panel(PanelKind::Neutral, "Low-Cost Tools", &guide.low_cost_tools));
    section.push_opt(text_panel(
        PanelKind::Affirmative,
        "Funding Options",
        guide.funding_options.as_deref(),
    ));
}

fn idea_card(idea: &AdjacentIdea) -> Option<Box<dyn Block>> {
    if idea.title.is_none() && idea.description.is_none() {
        return None;
    }
    let card = Card::new(PanelKind::Accent, idea.title.as_deref().unwrap_or("Idea"))
        .push_opt(idea.description.as_deref().map(|text| boxed(Paragraph::new(text))))
        .push_opt(labeled_text("Synergy", idea.synergy.as_deref()));
    Some(boxed(card))
}

fn attribution_block(theme: &Theme) -> Stack {
    let mut children: Vec<Box<dyn Block>> = vec![boxed(Divider)];
    children.extend(
        ATTRIBUTION_LINES
            .iter()
            .map(|line| boxed(Paragraph::new(*line).with_role(TextRole::Small))),
    );
    Stack::new(children).with_gap(theme.item_gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(value: serde_json::Value) -> EvaluationReport {
        EvaluationReport::from_json_value(value).expect("report")
    }

    #[test]
    fn absent_sections_build_empty() {
        let theme = Theme::default();
        let report = report(json!({ "fitScore": 50 }));
        for id in SectionId::ALL {
            assert!(build_section(id, &report, &theme).is_empty(), "{id:?}");
        }
    }

    #[test]
    fn market_fit_without_weaknesses_is_a_single_panel() {
        let theme = Theme::default();
        let report = report(json!({
            "marketFit": { "strengths": ["Clear niche", "Low infra cost"], "weaknesses": [] }
        }));
        let section = build_section(SectionId::MarketFit, &report, &theme);
        assert_eq!(section.blocks.len(), 1);
        assert_eq!(section.blocks[0].kind(), crate::block::BlockKind::Panel);
    }

    #[test]
    fn records_without_content_are_skipped() {
        let theme = Theme::default();
        let report = report(json!({
            "riskAssessment": [{ "type": "Legal" }, { "type": "Market", "description": "Crowded" }],
            "adjacentIdeas": [{ "synergy": "only synergy" }],
            "customerAcquisition": { "channels": [{ "description": "no name" }] }
        }));
        assert_eq!(build_section(SectionId::RiskAssessment, &report, &theme).blocks.len(), 1);
        assert!(build_section(SectionId::AdjacentIdeas, &report, &theme).is_empty());
        assert!(build_section(SectionId::CustomerAcquisition, &report, &theme).is_empty());
    }

    #[test]
    fn pair_collapses_to_the_present_side() {
        assert!(pair(None, None).is_none());
        let single = pair(Some(boxed(Divider)), None).expect("one side");
        assert_eq!(single.kind(), crate::block::BlockKind::Divider);
        let both = pair(Some(boxed(Divider)), Some(boxed(Divider))).expect("both");
        assert_eq!(both.kind(), crate::block::BlockKind::TwoColumn);
    }
}
