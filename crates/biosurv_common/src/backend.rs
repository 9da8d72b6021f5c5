//! Surveillance backend client
//!
//! Read/write access to the REST backend. Every call is a single attempt:
//! dashboard fetch failures are reported, not retried.
//!
//! Endpoints used:
//! - GET    /api/escalation/active
//! - POST   /api/escalation/escalate
//! - PUT    /api/escalation/acknowledge/:id
//! - DELETE /api/escalation/resolve/:id
//! - GET    /api/national/:country
//! - GET    /api/states/:state
//! - GET    /api/states/:state/districts/:district
//! - GET    /api/surveillance/all
//! - GET    /api/readiness/status

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::BackendConfig;
use crate::types::{
    AllSurveillanceData, Country, DetailedStateData, DistrictData, EscalatedAlert,
    NationalOverview, ReadinessStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid backend URL: {0}")]
    Url(String),

    #[error("Backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    #[error("Backend response for {path} could not be decoded: {detail}")]
    Decode { path: String, detail: String },
}

/// Where the poller gets the active escalation from
#[async_trait]
pub trait EscalationSource: Send + Sync {
    async fn active_escalation(&self) -> Result<Option<EscalatedAlert>, BackendError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AcknowledgeBody<'a> {
    acknowledged_by: &'a str,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.base_url).map_err(|e| BackendError::Url(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Url(format!("{} cannot be a base URL", config.base_url)));
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, base })
    }

    /// Base URL plus percent-encoded path segments
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, BackendError> {
        let url = self.endpoint(segments);
        debug!("GET {}", url);
        let response = self.http.get(url.clone()).send().await?;
        decode(url.path(), response).await
    }

    pub async fn escalate(&self, escalated: &EscalatedAlert) -> Result<EscalatedAlert, BackendError> {
        let url = self.endpoint(&["api", "escalation", "escalate"]);
        debug!("POST {}", url);
        let response = self.http.post(url.clone()).json(escalated).send().await?;
        decode(url.path(), response).await
    }

    pub async fn acknowledge(&self, id: &str, by: &str) -> Result<EscalatedAlert, BackendError> {
        let url = self.endpoint(&["api", "escalation", "acknowledge", id]);
        debug!("PUT {}", url);
        let response = self
            .http
            .put(url.clone())
            .json(&AcknowledgeBody { acknowledged_by: by })
            .send()
            .await?;
        decode(url.path(), response).await
    }

    pub async fn resolve(&self, id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["api", "escalation", "resolve", id]);
        debug!("DELETE {}", url);
        let response = self.http.delete(url.clone()).send().await?;
        check_status(url.path(), response.status())
    }

    pub async fn national_overview(&self, country: Country) -> Result<NationalOverview, BackendError> {
        let code = match country {
            Country::Us => "US",
            Country::India => "IN",
        };
        self.get_json(&["api", "national", code]).await
    }

    pub async fn state_detail(&self, state: &str) -> Result<DetailedStateData, BackendError> {
        self.get_json(&["api", "states", state]).await
    }

    pub async fn district(&self, state: &str, district: &str) -> Result<DistrictData, BackendError> {
        self.get_json(&["api", "states", state, "districts", district]).await
    }

    pub async fn surveillance_all(&self) -> Result<AllSurveillanceData, BackendError> {
        self.get_json(&["api", "surveillance", "all"]).await
    }

    pub async fn readiness(&self) -> Result<Vec<ReadinessStatus>, BackendError> {
        self.get_json(&["api", "readiness", "status"]).await
    }
}

#[async_trait]
impl EscalationSource for BackendClient {
    /// 204, 404 and a `null` body all mean "nothing active"
    async fn active_escalation(&self) -> Result<Option<EscalatedAlert>, BackendError> {
        let url = self.endpoint(&["api", "escalation", "active"]);
        let response = self.http.get(url.clone()).send().await?;
        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(None),
            _ => decode(url.path(), response).await,
        }
    }
}

fn check_status(path: &str, status: StatusCode) -> Result<(), BackendError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(BackendError::Status {
            status: status.as_u16(),
            path: path.to_string(),
        })
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, BackendError> {
    check_status(path, response.status())?;
    let body = response.text().await?;
    parse_body(path, &body)
}

/// Decode a response body; split out so it can be tested without a server
pub fn parse_body<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode {
        path: path.to_string(),
        detail: e.to_string(),
    })
}
