use pitchpress::{
    Block, Command, Document, EvaluationReport, META_BLOCK_BOUNDS, PageCursor, Pt, Rect,
    ReportError, ReportRenderer, SectionId, Size, Spacer, TextMeasurer, Theme, TwoColumn,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn renderer() -> ReportRenderer {
    ReportRenderer::builder()
        .page_size(Size::a4())
        .margin_all(36.0)
        .build()
        .expect("renderer")
}

fn report(value: Value) -> EvaluationReport {
    EvaluationReport::from_json_value(value).expect("report")
}

fn all_text(doc: &Document) -> Vec<(usize, String)> {
    doc.pages
        .iter()
        .enumerate()
        .flat_map(|(idx, page)| page.texts().map(move |text| (idx, text.to_string())))
        .collect()
}

fn contains(doc: &Document, needle: &str) -> bool {
    doc.pages.iter().any(|page| page.contains_text(needle))
}

fn full_report() -> EvaluationReport {
    let long = "Independent developers want a predictable way to validate a side project before \
                they spend months building it, and they are willing to pay for focused feedback.";
    report(json!({
        "fitScore": 72,
        "fitExplanation": long,
        "marketFit": {
            "strengths": ["Clear niche", "Low infra cost", long],
            "weaknesses": ["Crowded adjacent market", long],
            "demandPotential": long
        },
        "valueProposition": "Ship the right thing first.",
        "targetAudience": {
            "demographics": "Solo developers aged 20 to 40.",
            "psychographics": long,
            "painPoints": ["Unclear demand", "No marketing budget"]
        },
        "competitiveLandscape": {
            "marketPositioning": long,
            "competitiveAdvantages": ["AI-assisted", "Community reviews"],
            "differentiation": long,
            "competitors": [
                {
                    "name": "IdeaBoard",
                    "marketPosition": "Leader",
                    "differentiation": long,
                    "strengths": ["Brand", "Integrations"],
                    "weaknesses": ["Price"],
                    "pricingStrategy": "Per seat"
                },
                { "name": "LaunchLab", "differentiation": long }
            ]
        },
        "riskAssessment": [
            { "type": "Market", "description": long, "mitigation": long },
            { "type": "Technical", "description": long, "mitigation": long },
            { "type": "Financial", "description": long, "mitigation": long }
        ],
        "businessPlan": {
            "revenueModel": long,
            "goToMarket": long,
            "milestones": ["Private beta", "Public launch", "First 100 paying users", long]
        },
        "launchStrategy": {
            "mvpFeatures": ["Evaluation form", "Report export", "Sharing"],
            "timeline": "Six weeks.",
            "pricingStrategy": "Freemium",
            "earlyAdopters": long
        },
        "customerAcquisition": {
            "channels": [
                { "name": "Developer forums", "description": long, "estimatedCost": "$0" },
                { "name": "Newsletter sponsorships", "description": long }
            ],
            "retentionStrategy": long,
            "growthTactics": ["Referral credits", "Public report gallery"]
        },
        "revenueGeneration": {
            "streams": [{ "name": "Pro plan", "description": long, "potential": "High" }],
            "pricingModel": "Monthly subscription",
            "projections": long
        },
        "bootstrappingGuide": {
            "steps": [
                { "title": "Validate", "description": long },
                { "title": "Build", "description": long },
                { "description": "Launch quietly." }
            ],
            "lowCostTools": ["Static hosting", "SQLite"],
            "fundingOptions": long
        },
        "adjacentIdeas": [
            { "title": "Pitch deck reviews", "description": long, "synergy": "Same audience." }
        ]
    }))
}

#[test]
fn absent_section_leaves_no_header() {
    let doc = renderer()
        .render(&report(json!({
            "fitScore": 60,
            "marketFit": { "strengths": ["Clear niche"] }
        })))
        .expect("render");
    assert!(!contains(&doc, "Launch Strategy"));
    assert!(!contains(&doc, "Risk Assessment"));
    assert!(contains(&doc, "Market Fit Analysis"));
}

#[test]
fn market_fit_with_only_strengths() {
    let doc = renderer()
        .render(&report(json!({
            "fitScore": 72,
            "marketFit": { "strengths": ["Clear niche", "Low infra cost"], "weaknesses": [] }
        })))
        .expect("render");
    assert!(contains(&doc, "Market Fit Analysis"));
    assert!(contains(&doc, "Strengths"));
    assert!(contains(&doc, "Clear niche"));
    assert!(contains(&doc, "Low infra cost"));
    assert!(!contains(&doc, "Areas for Improvement"));
    assert!(contains(&doc, "72"));
}

#[test]
fn sections_appear_in_canonical_order() {
    let doc = renderer().render(&full_report()).expect("render");
    let text = all_text(&doc);
    let positions: Vec<usize> = SectionId::ALL
        .iter()
        .map(|id| {
            text.iter()
                .position(|(_, t)| t == id.title())
                .unwrap_or_else(|| panic!("missing section {}", id.title()))
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    let last_section = *positions.last().expect("sections");
    let attribution = text
        .iter()
        .position(|(_, t)| t.starts_with("This report was generated"))
        .expect("attribution");
    assert!(attribution > last_section);
}

#[test]
fn no_block_crosses_the_bottom_of_its_page() {
    let renderer = renderer();
    let doc = renderer.render(&full_report()).expect("render");
    assert!(doc.page_count() > 2);

    let content_height = (Size::a4().height - Pt::from_i32(72)).to_milli_i64();
    let content_bottom = (Size::a4().height - Pt::from_i32(36)).to_milli_i64();
    let mut blocks = 0;
    for page in &doc.pages {
        for command in &page.commands {
            let Command::Meta { key, value } = command else {
                continue;
            };
            if key != META_BLOCK_BOUNDS {
                continue;
            }
            let fields: Vec<&str> = value.split_whitespace().collect();
            assert_eq!(fields.len(), 5, "{value}");
            let y: i64 = fields[2].parse().expect("y");
            let height: i64 = fields[4].parse().expect("height");
            assert!(
                y + height <= content_bottom || height > content_height,
                "{value} crosses the page bottom"
            );
            blocks += 1;
        }
    }
    assert!(blocks > 20);
}

#[test]
fn rendering_is_idempotent() {
    let renderer = renderer();
    let report = full_report();
    let first = renderer.render(&report).expect("render");
    let second = renderer.render(&report).expect("render");
    assert_eq!(first, second);
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(
        renderer.render_to_json(&report).expect("json"),
        renderer.render_to_json(&report).expect("json")
    );
    assert_eq!(
        renderer.render_to_pdf(&report).expect("pdf"),
        renderer.render_to_pdf(&report).expect("pdf")
    );
}

#[test]
fn zero_content_area_fails_before_any_page() {
    let err = ReportRenderer::builder()
        .page_size(Size::new(300.0, 200.0))
        .margin_all(100.0)
        .build()
        .err()
        .expect("invalid geometry");
    assert!(matches!(err, ReportError::InvalidConfiguration(_)));
}

#[test]
fn two_column_advances_by_the_taller_side() {
    let measurer = TextMeasurer::new(Arc::new(Theme::default()), None);
    let block = TwoColumn::new(
        Box::new(Spacer::new(Pt::from_i32(40))),
        Box::new(Spacer::new(Pt::from_i32(25))),
    )
    .measure(&measurer, Pt::from_i32(400));
    assert_eq!(block.height(), Pt::from_i32(40));

    let mut cursor = PageCursor::new(Rect {
        x: Pt::ZERO,
        y: Pt::ZERO,
        width: Pt::from_i32(400),
        height: Pt::from_i32(250),
    });
    cursor.reserve_block(block.height());
    assert_eq!(cursor.offset(), Pt::from_i32(40));
}

#[test]
fn malformed_input_is_rendered_around() {
    let doc = renderer()
        .render(&report(json!({
            "fitScore": "not a number",
            "fitExplanation": 17,
            "riskAssessment": ["bad", { "type": "Legal", "description": "Licensing" }],
            "launchStrategy": null
        })))
        .expect("render");
    assert!(contains(&doc, "Risk Assessment"));
    assert!(contains(&doc, "Licensing"));
    assert!(!contains(&doc, "Launch Strategy"));
    assert!(contains(&doc, "Needs work"));
}

#[test]
fn render_to_file_writes_a_pdf() {
    let path = std::env::temp_dir().join(format!(
        "pitchpress_e2e_{}.pdf",
        std::process::id()
    ));
    let written = renderer()
        .render_to_file(&full_report(), &path)
        .expect("write pdf");
    let bytes = std::fs::read(&path).expect("read pdf");
    assert_eq!(bytes.len(), written);
    assert!(bytes.starts_with(b"%PDF"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn oversized_risk_card_keeps_its_section_title() {
    let renderer = ReportRenderer::builder()
        .page_footer(false)
        .build()
        .expect("renderer");
    let description = "word ".repeat(3000);
    let doc = renderer
        .render(&report(json!({
            "fitScore": 60,
            "riskAssessment": [{ "type": "Market", "description": description }]
        })))
        .expect("render");
    let page_of = |needle: &str| doc.pages.iter().position(|page| page.contains_text(needle));
    let title_page = page_of("Risk Assessment").expect("section title");
    assert_eq!(page_of("Market"), Some(title_page));
    assert_eq!(title_page, 1);
    assert!(page_of("Moderate fit").is_some_and(|page| page < title_page));
}
