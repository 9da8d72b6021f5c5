//! Prompt catalog
//!
//! Pure string templating: each builder turns surveillance data into a
//! `PromptSpec`. Free-text plans share `PLAN_FORMAT`; structured prompts carry
//! their own response schema.

mod alerts;
mod structured;
mod surveillance;

pub use alerts::{
    biothreat_response_plan, escalation_action_plan, outbreak_response_plan,
    zoonotic_spillover_plan,
};
pub use structured::{simulation_scenario, threat_summaries};
pub use surveillance::{
    district_situation_report, environmental_hazard_plan, genomic_variant_analysis,
    one_health_briefing, readiness_gap_plan, wastewater_signal_analysis,
};

/// Role line prepended to every prompt
pub const ANALYST_ROLE: &str =
    "You are a senior public-health emergency analyst supporting a One Health biosurveillance operations center.";

/// Output contract for free-text action plans
pub const PLAN_FORMAT: &str = r#"Respond in Markdown with exactly these sections:
## Situation
## Immediate Actions (0-24h)
## Short-Term Actions (1-7 days)
## Coordination
## Communication
Use short bullet points. Name responsible agencies where it is standard practice.
Do not invent case counts or data that is not given above."#;

/// Join role, body and format into one prompt
pub(crate) fn compose(body: &str, format: &str) -> String {
    format!("{}\n\n{}\n\n{}", ANALYST_ROLE, body.trim(), format)
}

/// "unknown" for missing optional fields
pub(crate) fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("unknown")
}
