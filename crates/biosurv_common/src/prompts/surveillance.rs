//! Surveillance-stream analyses

use super::{compose, or_unknown, PLAN_FORMAT};
use crate::model_call::PromptSpec;
use crate::one_health::OneHealthIndex;
use crate::types::{
    DistrictData, EnvironmentalReading, GenomicVariant, ReadinessStatus, SentinelSignal,
};

const ANALYSIS_FORMAT: &str = r#"Respond in Markdown with these sections:
## Assessment
## Likely Drivers
## Recommended Actions
Keep it under 300 words. State uncertainty explicitly."#;

pub fn environmental_hazard_plan(reading: &EnvironmentalReading) -> PromptSpec {
    let body = format!(
        "ENVIRONMENTAL READING\nMetric: {}\nLocation: {}\nValue: {} {}\nThreshold: {} {}\nExceeds threshold: {}\n\nAssess the human-health risk of this reading and draft a response plan including exposure reduction, vulnerable-population advisories and follow-up sampling.",
        reading.metric,
        reading.location,
        reading.value,
        reading.unit,
        reading.threshold,
        reading.unit,
        if reading.exceeds_threshold() { "yes" } else { "no" },
    );
    PromptSpec::text("environmental_hazard_plan", compose(&body, PLAN_FORMAT))
}

pub fn genomic_variant_analysis(variant: &GenomicVariant) -> PromptSpec {
    let mutations = if variant.mutations.is_empty() {
        "none reported".to_string()
    } else {
        variant.mutations.join(", ")
    };
    let body = format!(
        "GENOMIC SURVEILLANCE\nPathogen: {}\nLineage: {}\nKey mutations: {}\nPrevalence in sequenced samples: {:.1}%\nFlagged as variant of concern: {}\n\nAnalyze the likely significance of this lineage for transmissibility, immune escape and diagnostics, and recommend sequencing and public-health follow-up.",
        variant.pathogen,
        variant.lineage,
        mutations,
        variant.prevalence * 100.0,
        if variant.variant_of_concern { "yes" } else { "no" },
    );
    PromptSpec::text("genomic_variant_analysis", compose(&body, ANALYSIS_FORMAT))
}

pub fn wastewater_signal_analysis(signal: &SentinelSignal) -> PromptSpec {
    let ratio = signal
        .anomaly_ratio()
        .map(|r| format!("{:.2}x baseline", r))
        .unwrap_or_else(|| "no baseline".to_string());
    let body = format!(
        "SENTINEL SIGNAL\nSite: {}\nStream: {:?}\nTarget: {}\nValue: {}\nBaseline: {}\nRelative level: {}\nFlagged anomalous: {}\nReported: {}\n\nInterpret this signal as an early-warning indicator for community transmission and recommend confirmatory steps.",
        signal.site,
        signal.kind,
        or_unknown(signal.pathogen.as_deref()),
        signal.value,
        signal.baseline,
        ratio,
        if signal.anomaly { "yes" } else { "no" },
        signal.reported_at.format("%Y-%m-%d"),
    );
    PromptSpec::text("wastewater_signal_analysis", compose(&body, ANALYSIS_FORMAT))
}

pub fn readiness_gap_plan(stock: &[ReadinessStatus]) -> PromptSpec {
    let mut body = String::from("RESPONSE READINESS\n");
    if stock.is_empty() {
        body.push_str("No readiness data reported.\n");
    }
    for item in stock {
        body.push_str(&format!(
            "- {} ({}): {} of {} required ({:.0}% coverage, status {:?})\n",
            item.resource,
            if item.region.is_empty() { "all regions" } else { item.region.as_str() },
            item.available,
            item.required,
            item.coverage() * 100.0,
            item.status,
        ));
    }
    body.push_str("\nPrioritize the shortfalls and draft a plan to close them: redistribution, procurement, mutual aid and surge staffing.");
    PromptSpec::text("readiness_gap_plan", compose(&body, PLAN_FORMAT))
}

pub fn district_situation_report(district: &DistrictData) -> PromptSpec {
    let mut body = format!(
        "DISTRICT: {}, {}\nPopulation: {}\nActive alerts: {}\n",
        district.name,
        district.state,
        district.population,
        district.alerts.len()
    );
    for alert in &district.alerts {
        body.push_str(&format!(
            "- [{}] {} ({})\n",
            alert.severity.as_str(),
            alert.title,
            alert.category.as_str()
        ));
    }
    let anomalies: Vec<&SentinelSignal> = district.signals.iter().filter(|s| s.anomaly).collect();
    body.push_str(&format!("Anomalous sentinel signals: {}\n", anomalies.len()));
    for s in anomalies {
        body.push_str(&format!("- {} {:?}: {} (baseline {})\n", s.site, s.kind, s.value, s.baseline));
    }
    if let Some(cap) = &district.hospital_capacity {
        body.push_str(&format!(
            "Hospital occupancy: {:.0}% ({} / {} beds), ICU {} / {}\n",
            cap.occupancy() * 100.0,
            cap.occupied_beds,
            cap.total_beds,
            cap.icu_occupied,
            cap.icu_beds
        ));
    }
    body.push_str("\nWrite a concise situation report for the district health officer.");
    PromptSpec::text("district_situation_report", compose(&body, ANALYSIS_FORMAT))
}

pub fn one_health_briefing(region: &str, index: &OneHealthIndex) -> PromptSpec {
    let body = format!(
        "ONE HEALTH INDEX for {}\nComposite score: {:.1} / 100 ({} risk)\nHuman health sub-score: {:.1}\nZoonotic sub-score: {:.1}\nEnvironmental sub-score: {:.1}\n\nBrief leadership on what drives the composite risk and which sector needs attention first.",
        region,
        index.score,
        index.band.as_str(),
        index.components.human,
        index.components.zoonotic,
        index.components.environmental,
    );
    PromptSpec::text("one_health_briefing", compose(&body, ANALYSIS_FORMAT))
}
