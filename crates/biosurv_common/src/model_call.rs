//! Model-call combinator
//!
//! Every AI feature has the same shape: build a prompt (optionally with a
//! response schema), call the provider through the retrier, parse the reply.
//! `call_model` is that shape; the feature methods on `ActionPlanner` only
//! pick a prompt builder and a parser.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::ai_client::{GenerationRequest, GenerativeClient};
use crate::one_health::OneHealthIndex;
use crate::prompts;
use crate::provider_error::ProviderError;
use crate::retry::Retrier;
use crate::types::{
    Alert, DistrictData, EnvironmentalReading, EscalatedAlert, GenomicVariant, ReadinessStatus,
    SentinelSignal, ZoonoticEvent,
};

/// Expected form of the model's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    Text,
    JsonObject,
    /// JSON object mapping a key (e.g. threat name) to a string
    KeyedStrings,
}

/// A prompt ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub name: &'static str,
    pub prompt: String,
    pub schema: Option<Value>,
    pub shape: ResponseShape,
}

impl PromptSpec {
    pub fn text(name: &'static str, prompt: String) -> Self {
        Self {
            name,
            prompt,
            schema: None,
            shape: ResponseShape::Text,
        }
    }

    pub fn structured(name: &'static str, prompt: String, schema: Value, shape: ResponseShape) -> Self {
        Self {
            name,
            prompt,
            schema: Some(schema),
            shape,
        }
    }

    pub fn request(&self, model: &str) -> GenerationRequest {
        let request = GenerationRequest::text(model, self.prompt.clone());
        match &self.schema {
            Some(schema) => request.with_schema(schema.clone()),
            None => request,
        }
    }
}

// ============================================================================
// Parsers
// ============================================================================

pub fn parse_text(raw: &str) -> Result<String, ProviderError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ProviderError::malformed("Model returned empty text"));
    }
    Ok(text.to_string())
}

/// Body of the first fenced block (```json ... ```), or the input trimmed
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ProviderError> {
    let candidate = strip_code_fence(raw);

    let value: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(first) => {
            let braces = candidate
                .find('{')
                .zip(candidate.rfind('}'))
                .filter(|(s, e)| s < e)
                .map(|(s, e)| &candidate[s..=e]);
            match braces.and_then(|b| serde_json::from_str(b).ok()) {
                Some(v) => v,
                None => {
                    return Err(ProviderError::malformed(format!(
                        "Model output is not valid JSON: {}",
                        first
                    )))
                }
            }
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ProviderError::malformed(format!(
            "Expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ProviderError> {
    let map = parse_json_object(raw)?;
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ProviderError::malformed(format!("Model JSON has the wrong shape: {}", e)))
}

/// Object of strings; scalars are stringified, nested values are rejected
pub fn parse_keyed_strings(raw: &str) -> Result<BTreeMap<String, String>, ProviderError> {
    parse_json_object(raw)?
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            Value::Number(n) => Ok((key, n.to_string())),
            Value::Bool(b) => Ok((key, b.to_string())),
            Value::Null => Ok((key, String::new())),
            other => Err(ProviderError::malformed(format!(
                "Value for '{}' is a {}, expected a string",
                key,
                json_type_name(&other)
            ))),
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Combinator
// ============================================================================

/// Send `spec` through `retrier` and parse the reply
pub async fn call_model<C, T, P>(
    client: &C,
    retrier: &Retrier,
    model: &str,
    spec: &PromptSpec,
    parse: P,
) -> Result<T, ProviderError>
where
    C: GenerativeClient + ?Sized,
    P: FnOnce(&str) -> Result<T, ProviderError>,
{
    let request = spec.request(model);
    let response = retrier.run(|| client.generate(&request)).await?;
    let parsed = parse(&response.text)?;
    info!("AI call '{}' completed ({} chars)", spec.name, response.text.len());
    Ok(parsed)
}

/// Convert a failed call into the message an operator sees
pub fn user_facing<T>(feature: &str, result: Result<T, ProviderError>) -> Result<T, String> {
    result.map_err(|e| {
        error!("AI call '{}' failed ({}): {}", feature, e.kind.as_str(), e);
        e.user_message().to_string()
    })
}

// ============================================================================
// Action planner
// ============================================================================

/// Scripted outbreak scenario for the simulation view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationScenario {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub phases: Vec<SimulationPhase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationPhase {
    pub name: String,
    pub day: u32,
    pub description: String,
    #[serde(default)]
    pub projected_cases: u32,
}

/// All AI features, sharing one injected client and retry policy
#[derive(Clone)]
pub struct ActionPlanner {
    client: Arc<dyn GenerativeClient>,
    retrier: Retrier,
    model: String,
}

impl ActionPlanner {
    pub fn new(client: Arc<dyn GenerativeClient>, retrier: Retrier, model: impl Into<String>) -> Self {
        Self {
            client,
            retrier,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn text(&self, spec: PromptSpec) -> Result<String, ProviderError> {
        call_model(self.client.as_ref(), &self.retrier, &self.model, &spec, parse_text).await
    }

    pub async fn escalation_action_plan(&self, alert: &EscalatedAlert) -> Result<String, ProviderError> {
        self.text(prompts::escalation_action_plan(alert)).await
    }

    pub async fn outbreak_response_plan(&self, alert: &Alert) -> Result<String, ProviderError> {
        self.text(prompts::outbreak_response_plan(alert)).await
    }

    pub async fn biothreat_response_plan(&self, alert: &Alert) -> Result<String, ProviderError> {
        self.text(prompts::biothreat_response_plan(alert)).await
    }

    pub async fn zoonotic_spillover_plan(&self, event: &ZoonoticEvent) -> Result<String, ProviderError> {
        self.text(prompts::zoonotic_spillover_plan(event)).await
    }

    pub async fn environmental_hazard_plan(
        &self,
        reading: &EnvironmentalReading,
    ) -> Result<String, ProviderError> {
        self.text(prompts::environmental_hazard_plan(reading)).await
    }

    pub async fn genomic_variant_analysis(
        &self,
        variant: &GenomicVariant,
    ) -> Result<String, ProviderError> {
        self.text(prompts::genomic_variant_analysis(variant)).await
    }

    pub async fn wastewater_signal_analysis(
        &self,
        signal: &SentinelSignal,
    ) -> Result<String, ProviderError> {
        self.text(prompts::wastewater_signal_analysis(signal)).await
    }

    pub async fn readiness_gap_plan(&self, stock: &[ReadinessStatus]) -> Result<String, ProviderError> {
        self.text(prompts::readiness_gap_plan(stock)).await
    }

    pub async fn district_situation_report(
        &self,
        district: &DistrictData,
    ) -> Result<String, ProviderError> {
        self.text(prompts::district_situation_report(district)).await
    }

    pub async fn one_health_briefing(
        &self,
        region: &str,
        index: &OneHealthIndex,
    ) -> Result<String, ProviderError> {
        self.text(prompts::one_health_briefing(region, index)).await
    }

    /// One short summary per alert title
    pub async fn threat_summaries(
        &self,
        alerts: &[Alert],
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        if alerts.is_empty() {
            return Ok(BTreeMap::new());
        }
        let spec = prompts::threat_summaries(alerts);
        call_model(self.client.as_ref(), &self.retrier, &self.model, &spec, parse_keyed_strings).await
    }

    pub async fn simulation_scenario(
        &self,
        pathogen: &str,
        region: &str,
    ) -> Result<SimulationScenario, ProviderError> {
        let spec = prompts::simulation_scenario(pathogen, region);
        call_model(
            self.client.as_ref(),
            &self.retrier,
            &self.model,
            &spec,
            parse_json::<SimulationScenario>,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_json_object_with_prose() {
        let map = parse_json_object("Here you go: {\"risk\": \"high\"} hope it helps").unwrap();
        assert_eq!(map["risk"], "high");
    }

    #[test]
    fn test_parse_json_object_rejects_array() {
        let err = parse_json_object("[1, 2]").unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_parse_keyed_strings() {
        let map = parse_keyed_strings(
            "```json\n{\"Dengue\": \"Rising in Kerala\", \"Mpox\": 3}\n```",
        )
        .unwrap();
        assert_eq!(map["Dengue"], "Rising in Kerala");
        assert_eq!(map["Mpox"], "3");

        assert!(parse_keyed_strings("{\"x\": {\"nested\": true}}").is_err());
    }

    #[test]
    fn test_parse_text_empty() {
        assert!(parse_text("   \n").is_err());
        assert_eq!(parse_text("  plan \n").unwrap(), "plan");
    }

    #[test]
    fn test_parse_json_typed() {
        let scenario: SimulationScenario = parse_json(
            r#"{"title": "T", "summary": "S", "phases": [{"name": "Detection", "day": 1, "description": "d"}]}"#,
        )
        .unwrap();
        assert_eq!(scenario.phases.len(), 1);
        assert_eq!(scenario.phases[0].projected_cases, 0);
    }

    #[test]
    fn test_user_facing_messages() {
        let busy: Result<(), _> = Err(ProviderError::from_message("429 Too Many Requests"));
        assert_eq!(
            user_facing("plan", busy).unwrap_err(),
            crate::provider_error::MSG_HIGH_TRAFFIC
        );

        let broken: Result<(), _> = Err(ProviderError::malformed("bad"));
        assert_eq!(
            user_facing("plan", broken).unwrap_err(),
            crate::provider_error::MSG_UNAVAILABLE
        );
    }
}
