//! Generative-AI client abstraction
//!
//! `GenerativeClient` is the one seam to the provider. The composition root
//! builds a `GeminiClient` once and hands it to whoever needs it; tests use
//! `FakeGenerativeClient` with scripted responses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use tracing::debug;

use crate::config::AiConfig;
use crate::provider_error::{ProviderError, ProviderErrorKind};

/// A single generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    /// When set, the provider is asked for JSON matching this schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerationRequest {
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub text: String,
}

#[async_trait]
pub trait GenerativeClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, ProviderError>;
}

// ============================================================================
// Gemini (REST)
// ============================================================================

/// Client for the `generateContent` REST endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig, api_key: String) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                ProviderError::with_kind(
                    ProviderErrorKind::Unknown,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build from config, reading the key from the environment
    pub fn from_config(config: &AiConfig) -> Result<Self, ProviderError> {
        let key = config.api_key().ok_or_else(|| {
            ProviderError::with_kind(
                ProviderErrorKind::InvalidRequest,
                format!("No API key: set {} in the environment", config.api_key_env),
            )
        })?;
        Self::new(config, key)
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }
}

/// Request body for `generateContent`
pub fn build_request_body(request: &GenerationRequest) -> Value {
    let mut body = serde_json::json!({
        "contents": [
            { "role": "user", "parts": [ { "text": request.prompt } ] }
        ],
    });

    if let Some(schema) = &request.response_schema {
        body["generationConfig"] = serde_json::json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
    }

    body
}

/// Concatenate `candidates[0].content.parts[*].text`
pub fn extract_text(response: &Value) -> Result<String, ProviderError> {
    let parts = response
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| ProviderError::malformed("Response has no candidates"))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(ProviderError::malformed("Response text is empty"));
    }
    Ok(text)
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        debug!(
            "generateContent model={} prompt_chars={} structured={}",
            request.model,
            request.prompt.len(),
            request.response_schema.is_some()
        );

        let response = self
            .http
            .post(self.url(&request.model))
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&build_request_body(request))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::from_http(status.as_u16(), &body));
        }

        let json: Value = serde_json::from_str(&body)
            .map_err(|e| ProviderError::malformed(format!("Invalid provider JSON: {}", e)))?;

        Ok(GenerationResponse {
            text: extract_text(&json)?,
        })
    }
}

// ============================================================================
// Fake (testing)
// ============================================================================

/// Scripted client. Responses are consumed in order; the last one repeats.
pub struct FakeGenerativeClient {
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerativeClient {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always_text(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn always_error(error: ProviderError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerativeClient for FakeGenerativeClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ProviderError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let next = {
            let mut responses = self
                .responses
                .lock()
                .map_err(|_| ProviderError::malformed("fake client poisoned"))?;
            match responses.len() {
                0 => Err(ProviderError::malformed("no scripted response")),
                1 => responses[0].clone(),
                _ => responses.remove(0),
            }
        };

        next.map(|text| GenerationResponse { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_plain() {
        let body = build_request_body(&GenerationRequest::text("m", "hello"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_body_schema() {
        let schema = serde_json::json!({"type": "OBJECT"});
        let body = build_request_body(&GenerationRequest::text("m", "p").with_schema(schema));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "Step 1. "}, {"text": "Isolate."}]}}]
        });
        assert_eq!(extract_text(&response).unwrap(), "Step 1. Isolate.");
    }

    #[test]
    fn test_extract_text_missing() {
        let err = extract_text(&serde_json::json!({"candidates": []})).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_fake_client_sequence() {
        let fake = FakeGenerativeClient::new(vec![
            Err(ProviderError::from_message("503")),
            Ok("plan".to_string()),
        ]);
        let req = GenerationRequest::text("m", "p");

        assert!(fake.generate(&req).await.is_err());
        assert_eq!(fake.generate(&req).await.unwrap().text, "plan");
        assert_eq!(fake.generate(&req).await.unwrap().text, "plan");
        assert_eq!(fake.call_count(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let config = AiConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 5,
            ..AiConfig::default()
        };
        let client = GeminiClient::new(&config, "SECRET-KEY-123".to_string()).unwrap();

        let err = client
            .generate(&GenerationRequest::text("m", "p"))
            .await
            .unwrap_err();
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!err.raw_message.contains("SECRET-KEY-123"));
        assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
    }
}
