//! Evaluation record consumed by the renderer.
//!
//! Input is parsed leniently: a field that is absent, `null`, of the wrong
//! type or whitespace-only reads as absent, and a list element that does not
//! parse is dropped while the rest of the list survives. Layout code never
//! sees an empty string.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationReport {
    #[serde(deserialize_with = "lenient_score")]
    pub fit_score: f64,
    #[serde(deserialize_with = "lenient_text")]
    pub fit_explanation: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub market_fit: Option<MarketFit>,
    #[serde(deserialize_with = "lenient_text")]
    pub value_proposition: Option<String>,
    #[serde(deserialize_with = "lenient_object")]
    pub target_audience: Option<TargetAudience>,
    #[serde(deserialize_with = "lenient_object")]
    pub competitive_landscape: Option<CompetitiveLandscape>,
    #[serde(deserialize_with = "lenient_records")]
    pub risk_assessment: Vec<Risk>,
    #[serde(deserialize_with = "lenient_object")]
    pub business_plan: Option<BusinessPlan>,
    #[serde(deserialize_with = "lenient_object")]
    pub launch_strategy: Option<LaunchStrategy>,
    #[serde(deserialize_with = "lenient_object")]
    pub customer_acquisition: Option<CustomerAcquisition>,
    #[serde(deserialize_with = "lenient_object")]
    pub revenue_generation: Option<RevenueGeneration>,
    #[serde(deserialize_with = "lenient_object")]
    pub bootstrapping_guide: Option<BootstrappingGuide>,
    #[serde(deserialize_with = "lenient_records")]
    pub adjacent_ideas: Vec<AdjacentIdea>,
}

impl EvaluationReport {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Fit score rounded and clamped to `0..=100`.
    pub fn display_score(&self) -> u8 {
        if !self.fit_score.is_finite() {
            return 0;
        }
        self.fit_score.round().clamp(0.0, 100.0) as u8
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketFit {
    #[serde(deserialize_with = "lenient_text_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub demand_potential: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(deserialize_with = "lenient_text")]
    pub demographics: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub psychographics: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub pain_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompetitiveLandscape {
    #[serde(deserialize_with = "lenient_text")]
    pub market_positioning: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub competitive_advantages: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub differentiation: Option<String>,
    #[serde(deserialize_with = "lenient_records")]
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Competitor {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub market_position: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub differentiation: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub pricing_strategy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Risk {
    #[serde(rename = "type", deserialize_with = "lenient_text")]
    pub kind: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub mitigation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusinessPlan {
    #[serde(deserialize_with = "lenient_text")]
    pub revenue_model: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub go_to_market: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaunchStrategy {
    #[serde(deserialize_with = "lenient_text_list")]
    pub mvp_features: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub timeline: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub pricing_strategy: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub early_adopters: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomerAcquisition {
    #[serde(deserialize_with = "lenient_records")]
    pub channels: Vec<Channel>,
    #[serde(deserialize_with = "lenient_text")]
    pub retention_strategy: Option<String>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub growth_tactics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Channel {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub estimated_cost: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevenueGeneration {
    #[serde(deserialize_with = "lenient_records")]
    pub streams: Vec<RevenueStream>,
    #[serde(deserialize_with = "lenient_text")]
    pub pricing_model: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub projections: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevenueStream {
    #[serde(deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub potential: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BootstrappingGuide {
    #[serde(deserialize_with = "lenient_records")]
    pub steps: Vec<BootstrapStep>,
    #[serde(deserialize_with = "lenient_text_list")]
    pub low_cost_tools: Vec<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub funding_options: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BootstrapStep {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdjacentIdea {
    #[serde(deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub synergy: Option<String>,
}

fn clean_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(clean_text(Value::deserialize(deserializer)?))
}

fn lenient_text_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(clean_text).collect(),
        _ => Vec::new(),
    })
}

fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn lenient_records<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score.filter(|s| s.is_finite()).unwrap_or(0.0))
}
