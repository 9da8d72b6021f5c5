//! Schema-constrained prompts

use serde_json::{json, Value};

use super::compose;
use crate::model_call::{PromptSpec, ResponseShape};
use crate::types::Alert;

/// Object schema whose properties are all strings
fn keyed_string_schema(keys: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = keys
        .iter()
        .map(|k| (k.to_string(), json!({ "type": "STRING" })))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": keys,
    })
}

/// One-sentence summary per alert, keyed by alert title
pub fn threat_summaries(alerts: &[Alert]) -> PromptSpec {
    let mut titles: Vec<&str> = alerts.iter().map(|a| a.title.as_str()).collect();
    titles.sort_unstable();
    titles.dedup();

    let mut body = String::from("Summarize each threat below in one sentence for a dashboard tile.\n\n");
    for alert in alerts {
        body.push_str(&format!(
            "- {}: {} severity {} in {}. {}\n",
            alert.title,
            alert.severity.as_str(),
            alert.category.as_str(),
            alert.location(),
            alert.description
        ));
    }

    let format = "Return a JSON object whose keys are exactly the threat names above and whose values are the one-sentence summaries.";
    PromptSpec::structured(
        "threat_summaries",
        compose(&body, format),
        keyed_string_schema(&titles),
        ResponseShape::KeyedStrings,
    )
}

pub fn simulation_scenario(pathogen: &str, region: &str) -> PromptSpec {
    let body = format!(
        "Design a tabletop outbreak simulation for {} in {}. Give a title, a two-sentence summary and four to six phases from first detection to recovery. Each phase has a name, the day it starts, a description of what responders observe, and projected cumulative cases.",
        pathogen, region
    );
    let schema = json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "summary": { "type": "STRING" },
            "phases": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "day": { "type": "INTEGER" },
                        "description": { "type": "STRING" },
                        "projectedCases": { "type": "INTEGER" }
                    },
                    "required": ["name", "day", "description"]
                }
            }
        },
        "required": ["title", "summary", "phases"]
    });
    PromptSpec::structured(
        "simulation_scenario",
        compose(&body, "Return JSON only."),
        schema,
        ResponseShape::JsonObject,
    )
}
