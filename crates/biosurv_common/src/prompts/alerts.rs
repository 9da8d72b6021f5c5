//! Alert-driven action plans

use super::{compose, or_unknown, PLAN_FORMAT};
use crate::model_call::PromptSpec;
use crate::types::{Alert, EscalatedAlert, Level, ZoonoticEvent};

fn alert_block(alert: &Alert) -> String {
    let cases = alert
        .cases
        .map(|c| c.to_string())
        .unwrap_or_else(|| "not reported".to_string());
    format!(
        "ALERT: {title}\nCategory: {category}\nSeverity: {severity}\nLocation: {location}\nPathogen: {pathogen}\nReported cases: {cases}\nDetected: {detected}\nSource: {source}\nDetails: {details}",
        title = alert.title,
        category = alert.category.as_str(),
        severity = alert.severity.as_str(),
        location = alert.location(),
        pathogen = or_unknown(alert.pathogen.as_deref()),
        cases = cases,
        detected = alert.detected_at.format("%Y-%m-%d %H:%M UTC"),
        source = or_unknown(alert.source.as_deref()),
        details = if alert.description.is_empty() {
            "none"
        } else {
            alert.description.as_str()
        },
    )
}

fn level_mandate(level: Level) -> &'static str {
    match level {
        Level::District => "You are advising the district health officer. Focus on local containment, field investigation and facility readiness.",
        Level::State => "You are advising the state surveillance unit. Focus on coordinating districts, laboratory surge capacity and state-level resources.",
        Level::National => "You are advising the national emergency operations center. Focus on cross-state coordination, national stockpiles, international reporting obligations and public messaging.",
    }
}

pub fn escalation_action_plan(escalated: &EscalatedAlert) -> PromptSpec {
    let mut body = format!(
        "{}\n\nThis alert was escalated from {} level to {} level (status: {:?}).\n{}",
        alert_block(&escalated.alert),
        escalated.origin,
        escalated.level,
        escalated.status,
        level_mandate(escalated.level),
    );
    if !escalated.notes.is_empty() {
        body.push_str("\n\nField notes:\n");
        for note in &escalated.notes {
            body.push_str(&format!("- {}\n", note));
        }
    }
    body.push_str("\nWrite the response plan for the receiving level.");
    PromptSpec::text("escalation_action_plan", compose(&body, PLAN_FORMAT))
}

pub fn outbreak_response_plan(alert: &Alert) -> PromptSpec {
    let body = format!(
        "{}\n\nDraft an outbreak response plan covering case finding, contact tracing, laboratory confirmation, infection prevention and control, and risk communication.",
        alert_block(alert)
    );
    PromptSpec::text("outbreak_response_plan", compose(&body, PLAN_FORMAT))
}

pub fn biothreat_response_plan(alert: &Alert) -> PromptSpec {
    let body = format!(
        "{}\n\nTreat this as a potential deliberate or high-consequence biological event. Cover threat assessment, sample chain of custody, responder protection, medical countermeasures and law-enforcement liaison.",
        alert_block(alert)
    );
    PromptSpec::text("biothreat_response_plan", compose(&body, PLAN_FORMAT))
}

pub fn zoonotic_spillover_plan(event: &ZoonoticEvent) -> PromptSpec {
    let body = format!(
        "ZOONOTIC EVENT\nSpecies: {}\nPathogen: {}\nLocation: {}\nAnimal cases: {}\nHuman exposures: {}\n\nDraft a joint animal-health and human-health plan to prevent spillover: culling or movement controls, exposed-person monitoring, PPE for handlers, and surveillance of nearby farms and wildlife.",
        event.species, event.pathogen, event.location, event.animal_cases, event.human_exposures
    );
    PromptSpec::text("zoonotic_spillover_plan", compose(&body, PLAN_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertCategory, AlertSeverity, Country, EscalationStatus};
    use chrono::TimeZone;

    fn alert() -> Alert {
        Alert {
            id: "a1".to_string(),
            title: "Cholera cluster".to_string(),
            description: String::new(),
            severity: AlertSeverity::High,
            category: AlertCategory::HumanHealth,
            country: Country::India,
            state: Some("Bihar".to_string()),
            district: Some("Patna".to_string()),
            pathogen: Some("Vibrio cholerae".to_string()),
            cases: Some(42),
            source: None,
            detected_at: chrono::Utc.with_ymd_and_hms(2026, 7, 1, 6, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_alert_block_fields() {
        let block = alert_block(&alert());
        assert!(block.contains("Cholera cluster"));
        assert!(block.contains("Patna, Bihar, India"));
        assert!(block.contains("Reported cases: 42"));
        assert!(block.contains("Source: unknown"));
        assert!(block.contains("Details: none"));
    }

    #[test]
    fn test_escalation_prompt_targets_receiving_level() {
        let escalated = EscalatedAlert {
            alert: alert(),
            level: Level::National,
            origin: Level::State,
            status: EscalationStatus::Escalated,
            escalated_at: chrono::Utc::now(),
            acknowledged_by: None,
            notes: vec!["Two deaths reported".to_string()],
        };
        let spec = escalation_action_plan(&escalated);
        assert_eq!(spec.name, "escalation_action_plan");
        assert!(spec.schema.is_none());
        assert!(spec.prompt.contains("from state level to national level"));
        assert!(spec.prompt.contains("national emergency operations center"));
        assert!(spec.prompt.contains("- Two deaths reported"));
        assert!(spec.prompt.contains("## Immediate Actions"));
    }
}
