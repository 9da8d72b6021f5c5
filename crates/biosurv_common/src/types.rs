//! Surveillance data-transfer types
//!
//! Shapes returned by the backend and fed into prompts. Everything here is a
//! snapshot of the last successful fetch; the backend owns the real state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    #[default]
    Us,
    India,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Us => "United States",
            Country::India => "India",
        }
    }
}

/// Administrative level an alert is owned at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    District,
    State,
    National,
}

impl Level {
    /// Next level up, if any
    pub fn next(&self) -> Option<Level> {
        match self {
            Level::District => Some(Level::State),
            Level::State => Some(Level::National),
            Level::National => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::District => "district",
            Level::State => "state",
            Level::National => "national",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "district" => Some(Level::District),
            "state" => Some(Level::State),
            "national" => Some(Level::National),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    #[default]
    Moderate,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Moderate => "moderate",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AlertCategory {
    #[default]
    HumanHealth,
    Zoonotic,
    Environmental,
    Genomic,
    Biothreat,
    Wastewater,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::HumanHealth => "human health",
            AlertCategory::Zoonotic => "zoonotic",
            AlertCategory::Environmental => "environmental",
            AlertCategory::Genomic => "genomic",
            AlertCategory::Biothreat => "biothreat",
            AlertCategory::Wastewater => "wastewater",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Generated when a locally written alert file omits it
    #[serde(default = "new_alert_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: AlertSeverity,
    #[serde(default)]
    pub category: AlertCategory,
    #[serde(default)]
    pub country: Country,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub pathogen: Option<String>,
    #[serde(default)]
    pub cases: Option<u32>,
    #[serde(default)]
    pub source: Option<String>,
    pub detected_at: DateTime<Utc>,
}

fn new_alert_id() -> String {
    format!("local-{}", uuid::Uuid::new_v4())
}

impl Alert {
    /// "District, State, Country" from whatever is known
    pub fn location(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(d) = &self.district {
            parts.push(d);
        }
        if let Some(s) = &self.state {
            parts.push(s);
        }
        parts.push(self.country.as_str());
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationStatus {
    Escalated,
    Monitoring,
}

/// An alert raised above the level it was detected at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalatedAlert {
    pub alert: Alert,
    pub level: Level,
    pub origin: Level,
    pub status: EscalationStatus,
    pub escalated_at: DateTime<Utc>,
    #[serde(default)]
    pub acknowledged_by: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Wastewater,
    Lab,
    Sensor,
    Clinical,
    Animal,
}

/// One reading from a sentinel site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentinelSignal {
    pub id: String,
    pub site: String,
    pub kind: SignalKind,
    #[serde(default)]
    pub pathogen: Option<String>,
    pub value: f64,
    pub baseline: f64,
    #[serde(default)]
    pub anomaly: bool,
    pub reported_at: DateTime<Utc>,
}

impl SentinelSignal {
    /// value / baseline, or None when there is no usable baseline
    pub fn anomaly_ratio(&self) -> Option<f64> {
        if self.baseline > 0.0 {
            Some(self.value / self.baseline)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenomicVariant {
    pub lineage: String,
    pub pathogen: String,
    #[serde(default)]
    pub mutations: Vec<String>,
    /// Share of sequenced samples, 0-1
    pub prevalence: f64,
    #[serde(default)]
    pub variant_of_concern: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoonoticEvent {
    pub species: String,
    pub pathogen: String,
    pub location: String,
    pub animal_cases: u32,
    #[serde(default)]
    pub human_exposures: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalReading {
    pub metric: String,
    pub location: String,
    pub value: f64,
    pub threshold: f64,
    #[serde(default)]
    pub unit: String,
}

impl EnvironmentalReading {
    pub fn exceeds_threshold(&self) -> bool {
        self.value > self.threshold
    }
}

/// Human, zoonotic and environmental sub-scores (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OneHealthScores {
    pub human: f64,
    pub zoonotic: f64,
    pub environmental: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AllSurveillanceData {
    #[serde(default)]
    pub signals: Vec<SentinelSignal>,
    #[serde(default)]
    pub genomic: Vec<GenomicVariant>,
    #[serde(default)]
    pub zoonotic: Vec<ZoonoticEvent>,
    #[serde(default)]
    pub environmental: Vec<EnvironmentalReading>,
}

impl AllSurveillanceData {
    pub fn anomalous_signals(&self) -> impl Iterator<Item = &SentinelSignal> {
        self.signals.iter().filter(|s| s.anomaly)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalCapacity {
    pub total_beds: u32,
    pub occupied_beds: u32,
    #[serde(default)]
    pub icu_beds: u32,
    #[serde(default)]
    pub icu_occupied: u32,
}

impl HospitalCapacity {
    pub fn occupancy(&self) -> f64 {
        if self.total_beds == 0 {
            0.0
        } else {
            self.occupied_beds as f64 / self.total_beds as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictData {
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub signals: Vec<SentinelSignal>,
    #[serde(default)]
    pub hospital_capacity: Option<HospitalCapacity>,
    #[serde(default)]
    pub scores: Option<OneHealthScores>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummary {
    pub name: String,
    #[serde(default)]
    pub active_alerts: u32,
    #[serde(default)]
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStateData {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub country: Country,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub scores: Option<OneHealthScores>,
    #[serde(default)]
    pub districts: Vec<DistrictSummary>,
    #[serde(default)]
    pub active_alerts: Vec<Alert>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub active_alerts: u32,
    #[serde(default)]
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalOverview {
    #[serde(default)]
    pub country: Country,
    #[serde(default)]
    pub states: Vec<StateSummary>,
    #[serde(default)]
    pub total_active_alerts: u32,
    #[serde(default)]
    pub scores: Option<OneHealthScores>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessLevel {
    Ready,
    Limited,
    Critical,
}

/// Stock of one response resource (test kits, beds, staff, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessStatus {
    pub resource: String,
    #[serde(default)]
    pub region: String,
    pub available: u32,
    pub required: u32,
    pub status: ReadinessLevel,
}

impl ReadinessStatus {
    /// available / required, 1.0 when nothing is required
    pub fn coverage(&self) -> f64 {
        if self.required == 0 {
            1.0
        } else {
            self.available as f64 / self.required as f64
        }
    }

    pub fn shortfall(&self) -> u32 {
        self.required.saturating_sub(self.available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert_eq!(Level::District.next(), Some(Level::State));
        assert_eq!(Level::State.next(), Some(Level::National));
        assert_eq!(Level::National.next(), None);
        assert!(Level::District < Level::National);
        assert_eq!(Level::parse(" State "), Some(Level::State));
    }

    #[test]
    fn test_alert_wire_format() {
        let alert: Alert = serde_json::from_str(
            r#"{
                "id": "a-17",
                "title": "H5N1 in poultry",
                "severity": "critical",
                "category": "zoonotic",
                "country": "INDIA",
                "state": "Kerala",
                "district": "Alappuzha",
                "detectedAt": "2026-03-02T08:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.category, AlertCategory::Zoonotic);
        assert_eq!(alert.location(), "Alappuzha, Kerala, India");
        assert!(alert.description.is_empty());
    }

    #[test]
    fn test_alert_without_id_gets_one() {
        let alert: Alert =
            serde_json::from_str(r#"{"title": "Cholera", "detectedAt": "2026-03-02T08:00:00Z"}"#)
                .unwrap();
        assert!(alert.id.starts_with("local-"));
    }

    #[test]
    fn test_readiness_coverage() {
        let r = ReadinessStatus {
            resource: "PCR kits".to_string(),
            region: "Texas".to_string(),
            available: 300,
            required: 1200,
            status: ReadinessLevel::Critical,
        };
        assert_eq!(r.coverage(), 0.25);
        assert_eq!(r.shortfall(), 900);
    }

    #[test]
    fn test_signal_ratio_without_baseline() {
        let s = SentinelSignal {
            id: "s1".to_string(),
            site: "Plant 4".to_string(),
            kind: SignalKind::Wastewater,
            pathogen: None,
            value: 12.0,
            baseline: 0.0,
            anomaly: true,
            reported_at: Utc::now(),
        };
        assert_eq!(s.anomaly_ratio(), None);
    }
}
