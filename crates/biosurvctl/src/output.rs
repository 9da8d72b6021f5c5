//! Terminal rendering

use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::fmt::Write;

use biosurv_common::config::ApiKeyStatus;
use biosurv_common::model_call::SimulationScenario;
use biosurv_common::poller::PollSnapshot;
use biosurv_common::types::{
    AlertSeverity, AllSurveillanceData, DetailedStateData, DistrictData, EscalatedAlert,
    EscalationStatus, NationalOverview, ReadinessLevel, ReadinessStatus,
};
use biosurv_common::{BiosurvConfig, OneHealthIndex, RiskBand};

pub fn severity_label(severity: AlertSeverity) -> String {
    let s = severity.as_str().to_uppercase();
    match severity {
        AlertSeverity::Critical => s.red().bold().to_string(),
        AlertSeverity::High => s.red().to_string(),
        AlertSeverity::Moderate => s.yellow().to_string(),
        AlertSeverity::Low => s.green().to_string(),
    }
}

fn band_label(band: RiskBand) -> String {
    let s = band.as_str().to_uppercase();
    match band {
        RiskBand::Critical => s.red().bold().to_string(),
        RiskBand::High => s.red().to_string(),
        RiskBand::Moderate => s.yellow().to_string(),
        RiskBand::Low => s.green().to_string(),
    }
}

pub fn render_escalation(e: &EscalatedAlert) -> String {
    let mut out = String::new();
    let status = match e.status {
        EscalationStatus::Escalated => "ESCALATED".red().bold().to_string(),
        EscalationStatus::Monitoring => "MONITORING".yellow().to_string(),
    };
    let _ = writeln!(out, "{} {} [{}]", status, e.alert.title.bold(), severity_label(e.alert.severity));
    let _ = writeln!(out, "  id:        {}", e.alert.id);
    let _ = writeln!(out, "  level:     {} (from {})", e.level, e.origin);
    let _ = writeln!(out, "  location:  {}", e.alert.location());
    let _ = writeln!(out, "  since:     {}", e.escalated_at.format("%Y-%m-%d %H:%M UTC"));
    if let Some(by) = &e.acknowledged_by {
        let _ = writeln!(out, "  ack by:    {}", by);
    }
    for note in &e.notes {
        let _ = writeln!(out, "  note:      {}", note);
    }
    out
}

pub fn render_snapshot(snapshot: &PollSnapshot) -> String {
    let mut out = match &snapshot.active {
        Some(e) => render_escalation(e),
        None => format!("{}\n", "No active escalation".green()),
    };
    if let Some(err) = &snapshot.last_error {
        let _ = writeln!(out, "{} {}", "last poll failed:".yellow(), err);
    }
    out
}

pub fn render_national(n: &NationalOverview) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} - {} active alerts", n.country.as_str().bold(), n.total_active_alerts);
    let mut states: Vec<_> = n.states.iter().collect();
    states.sort_by(|a, b| b.risk_score.total_cmp(&a.risk_score));
    for s in states {
        let _ = writeln!(out, "  {:<24} risk {:>5.1}  alerts {}", s.name, s.risk_score, s.active_alerts);
    }
    out
}

pub fn render_state(s: &DetailedStateData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({}) population {}", s.name.bold(), s.country.as_str(), s.population);
    if let Some(scores) = &s.scores {
        let _ = writeln!(
            out,
            "  human {:.1}  zoonotic {:.1}  environmental {:.1}",
            scores.human, scores.zoonotic, scores.environmental
        );
    }
    let _ = writeln!(out, "  Active alerts: {}", s.active_alerts.len());
    for a in &s.active_alerts {
        let _ = writeln!(out, "    [{}] {} - {}", severity_label(a.severity), a.title, a.location());
    }
    let _ = writeln!(out, "  Districts:");
    for d in &s.districts {
        let _ = writeln!(out, "    {:<24} risk {:>5.1}  alerts {}", d.name, d.risk_score, d.active_alerts);
    }
    out
}

pub fn render_district(d: &DistrictData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}, {} population {}", d.name.bold(), d.state, d.population);
    for a in &d.alerts {
        let _ = writeln!(out, "  [{}] {}", severity_label(a.severity), a.title);
    }
    for s in d.signals.iter().filter(|s| s.anomaly) {
        let _ = writeln!(out, "  {} {} {:?} {} (baseline {})", "anomaly".yellow(), s.site, s.kind, s.value, s.baseline);
    }
    if let Some(cap) = &d.hospital_capacity {
        let _ = writeln!(out, "  hospital occupancy {:.0}%", cap.occupancy() * 100.0);
    }
    out
}

pub fn render_surveillance(data: &AllSurveillanceData) -> String {
    let mut out = String::new();
    let anomalies = data.anomalous_signals().count();
    let _ = writeln!(out, "Sentinel signals: {} ({} anomalous)", data.signals.len(), anomalies);
    for s in data.anomalous_signals() {
        let ratio = s.anomaly_ratio().map(|r| format!("{:.1}x", r)).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "  {} {:?} {} {}", s.site, s.kind, s.pathogen.as_deref().unwrap_or("-"), ratio.yellow());
    }
    let _ = writeln!(out, "Genomic lineages: {}", data.genomic.len());
    for v in data.genomic.iter().filter(|v| v.variant_of_concern) {
        let _ = writeln!(out, "  {} {} {:.1}%", "VOC".red(), v.lineage, v.prevalence * 100.0);
    }
    let _ = writeln!(out, "Zoonotic events: {}", data.zoonotic.len());
    for z in &data.zoonotic {
        let _ = writeln!(out, "  {} {} in {} ({} animal cases)", z.pathogen, z.species, z.location, z.animal_cases);
    }
    let exceed: Vec<_> = data.environmental.iter().filter(|r| r.exceeds_threshold()).collect();
    let _ = writeln!(out, "Environmental readings over threshold: {}", exceed.len());
    for r in exceed {
        let _ = writeln!(out, "  {} {} {}{} (limit {})", r.location, r.metric, r.value, r.unit, r.threshold);
    }
    out
}

pub fn render_readiness(items: &[ReadinessStatus]) -> String {
    let mut out = String::new();
    for r in items {
        let status = match r.status {
            ReadinessLevel::Ready => "ready".green().to_string(),
            ReadinessLevel::Limited => "limited".yellow().to_string(),
            ReadinessLevel::Critical => "critical".red().to_string(),
        };
        let _ = writeln!(
            out,
            "{:<28} {:>6}/{:<6} {:>4.0}%  {}",
            r.resource,
            r.available,
            r.required,
            r.coverage() * 100.0,
            status
        );
    }
    out
}

pub fn render_index(index: &OneHealthIndex) -> String {
    format!(
        "One Health Index {:.1} [{}]\n  human {:.1}  zoonotic {:.1}  environmental {:.1}\n",
        index.score,
        band_label(index.band),
        index.components.human,
        index.components.zoonotic,
        index.components.environmental
    )
}

pub fn render_summaries(summaries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (threat, summary) in summaries {
        let _ = writeln!(out, "{}: {}", threat.bold(), summary);
    }
    out
}

pub fn render_scenario(s: &SimulationScenario) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n{}", s.title.bold(), s.summary);
    for p in &s.phases {
        let _ = writeln!(out, "  day {:>3}  {:<20} {}", p.day, p.name, p.description);
    }
    out
}

pub fn render_config(config: &BiosurvConfig, key: &ApiKeyStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "backend:   {}", config.backend.base_url);
    let _ = writeln!(out, "ai model:  {} via {}", config.ai.model, config.ai.endpoint);
    let _ = writeln!(
        out,
        "retry:     {} attempts, {}ms x{} + <{}ms jitter",
        config.retry.max_retries, config.retry.initial_delay_ms, config.retry.backoff_factor, config.retry.jitter_ms
    );
    let _ = writeln!(out, "polling:   every {}s", config.polling.effective_interval().as_secs());
    match key {
        ApiKeyStatus::Present { source } => {
            let _ = writeln!(out, "api key:   {} (from ${})", "present".green(), source);
        }
        ApiKeyStatus::Missing => {
            let _ = writeln!(
                out,
                "api key:   {} - export {} to enable AI plans",
                "missing".red(),
                config.ai.api_key_env
            );
        }
    }
    out
}

/// Single-line progress bar
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}] {:>5.1}%", "#".repeat(filled), "-".repeat(width - filled), percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(50.0, 10), "[#####-----]  50.0%");
        assert_eq!(progress_bar(150.0, 4), "[####] 150.0%");
    }

    #[test]
    fn test_config_mentions_missing_key() {
        let out = render_config(&BiosurvConfig::default(), &ApiKeyStatus::Missing);
        assert!(out.contains("GEMINI_API_KEY"));
        assert!(out.contains("every 8s"));
    }
}
