//! Provider Errors
//!
//! Typed failures from the generative-AI provider. The provider reports
//! failures as free text, sometimes with a JSON envelope embedded in the
//! message (`{"error":{"code":503,"status":"UNAVAILABLE"}}`). `classify`
//! reduces that text to a closed set of kinds once, at the boundary, so the
//! retry loop and the callers only ever match on `ProviderErrorKind`.
//!
//! The embedded-envelope rule is a compatibility shim for one provider's
//! error formatting and is not relied on by anything beyond classification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::retry::Retryable;

/// Shown when the provider keeps rate-limiting after all retries
pub const MSG_HIGH_TRAFFIC: &str =
    "The AI service is experiencing high traffic right now. Please try again in a moment.";

/// Shown for every other provider failure
pub const MSG_UNAVAILABLE: &str =
    "The AI service is currently unavailable. Please try again later.";

/// Closed set of provider failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// 429 / RESOURCE_EXHAUSTED / "rate limit"
    RateLimited,
    /// 500 / 503
    ServerError,
    /// 400 / INVALID_ARGUMENT
    InvalidRequest,
    /// The provider answered but the payload could not be parsed
    MalformedResponse,
    Unknown,
}

impl ProviderErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderErrorKind::RateLimited | ProviderErrorKind::ServerError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::ServerError => "server_error",
            ProviderErrorKind::InvalidRequest => "invalid_request",
            ProviderErrorKind::MalformedResponse => "malformed_response",
            ProviderErrorKind::Unknown => "unknown",
        }
    }
}

/// A provider failure: its kind plus the untouched provider message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{raw_message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub raw_message: String,
    /// HTTP status when the failure came from a response
    pub status: Option<u16>,
}

impl ProviderError {
    /// Classify a free-text provider message
    pub fn from_message(message: impl Into<String>) -> Self {
        let raw_message = message.into();
        Self {
            kind: classify(&raw_message),
            raw_message,
            status: None,
        }
    }

    /// Build from a non-success HTTP response. The body is embedded verbatim
    /// so the envelope stays visible to `classify` and to callers.
    pub fn from_http(status: u16, body: &str) -> Self {
        let body = body.trim();
        let raw_message = if body.is_empty() {
            format!("Request failed with HTTP {}", status)
        } else {
            format!("Request failed: {}", body)
        };

        let kind = match kind_from_code(i64::from(status)) {
            Some(kind) if kind.is_retryable() => kind,
            from_status => {
                let from_text = classify(&raw_message);
                if from_text.is_retryable() {
                    from_text
                } else {
                    from_status.unwrap_or(from_text)
                }
            }
        };

        Self {
            kind,
            raw_message,
            status: Some(status),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::MalformedResponse,
            raw_message: detail.into(),
            status: None,
        }
    }

    pub fn with_kind(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            raw_message: message.into(),
            status: None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ProviderErrorKind::RateLimited
    }

    /// Message suitable for an end user
    pub fn user_message(&self) -> &'static str {
        if self.is_rate_limited() {
            MSG_HIGH_TRAFFIC
        } else {
            MSG_UNAVAILABLE
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        // The URL may carry credentials; never let it reach the message
        let mut err = ProviderError::from_message(format!("Request failed: {}", e.without_url()));
        err.status = status;
        err
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Reduce a provider message to a kind.
///
/// Retryable when any substring rule or the embedded-envelope rule says so.
/// Otherwise an envelope carrying 400 / INVALID_ARGUMENT yields
/// `InvalidRequest`, and everything else is `Unknown`.
pub fn classify(message: &str) -> ProviderErrorKind {
    let from_envelope = classify_envelope(message);
    if let Some(kind) = from_envelope {
        if kind.is_retryable() {
            return kind;
        }
    }

    if let Some(kind) = classify_text(message) {
        return kind;
    }

    from_envelope.unwrap_or(ProviderErrorKind::Unknown)
}

fn classify_text(message: &str) -> Option<ProviderErrorKind> {
    let lower = message.to_lowercase();
    if message.contains("429") || lower.contains("rate limit") || lower.contains("resource_exhausted")
    {
        return Some(ProviderErrorKind::RateLimited);
    }
    if message.contains("500") || message.contains("503") {
        return Some(ProviderErrorKind::ServerError);
    }
    None
}

/// Look for `{...}` in the message and read `error.code` / `error.status`
fn classify_envelope(message: &str) -> Option<ProviderErrorKind> {
    let start = message.find('{')?;
    let end = message.rfind('}')?;
    if end <= start {
        return None;
    }

    let envelope: Value = serde_json::from_str(&message[start..=end]).ok()?;
    let error = envelope.get("error")?;

    let status = error.get("status").and_then(|s| s.as_str());
    if status == Some("RESOURCE_EXHAUSTED") {
        return Some(ProviderErrorKind::RateLimited);
    }

    let from_code = error.get("code").and_then(|c| c.as_i64()).and_then(kind_from_code);
    if from_code.is_some() {
        return from_code;
    }

    match status {
        Some("INVALID_ARGUMENT") => Some(ProviderErrorKind::InvalidRequest),
        _ => None,
    }
}

fn kind_from_code(code: i64) -> Option<ProviderErrorKind> {
    match code {
        429 => Some(ProviderErrorKind::RateLimited),
        500 | 503 => Some(ProviderErrorKind::ServerError),
        400 => Some(ProviderErrorKind::InvalidRequest),
        _ => None,
    }
}
