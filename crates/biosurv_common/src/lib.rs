//! Biosurveillance Common - orchestration layer for the biosurveillance dashboard
//!
//! Backend access, escalation workflow, polling, One Health scoring and the
//! AI action-plan pipeline (prompt -> retrying provider call -> parsed reply).
//! Storage, scoring legitimacy and the model itself live in external services.

pub mod ai_client;
pub mod backend;
pub mod config;
pub mod escalation;
pub mod logging;
pub mod markdown;
pub mod model_call;
pub mod one_health;
pub mod poller;
pub mod progress;
pub mod prompts;
pub mod provider_error;
pub mod retry;
pub mod types;

pub use ai_client::{GeminiClient, GenerationRequest, GenerationResponse, GenerativeClient};
pub use backend::{BackendClient, BackendError, EscalationSource};
pub use config::{ApiKeyStatus, BiosurvConfig, ConfigError};
pub use escalation::{EscalationAction, EscalationBoard, EscalationError, Transition};
pub use model_call::{call_model, user_facing, ActionPlanner, PromptSpec, ResponseShape};
pub use one_health::{OneHealthIndex, OneHealthWeights, RiskBand};
pub use poller::{EscalationPoller, PollSnapshot};
pub use progress::{Clock, SimulationProgress};
pub use provider_error::{ProviderError, ProviderErrorKind};
pub use retry::{Retrier, RetryPolicy, Retryable};
pub use types::*;
