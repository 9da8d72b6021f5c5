//! Exit codes for biosurvctl

use biosurv_common::{BackendError, ConfigError, ProviderError};

pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the surveillance backend is unreachable or misbehaving
pub const EXIT_BACKEND_UNAVAILABLE: i32 = 70;

/// Exit code when the AI provider is still rate-limiting after retries
pub const EXIT_AI_BUSY: i32 = 75;

/// Exit code for configuration problems
pub const EXIT_CONFIG: i32 = 78;

/// Pick an exit code by looking through the error chain
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(p) = cause.downcast_ref::<ProviderError>() {
            return if p.is_rate_limited() {
                EXIT_AI_BUSY
            } else {
                EXIT_GENERAL_ERROR
            };
        }
        if cause.downcast_ref::<BackendError>().is_some() {
            return EXIT_BACKEND_UNAVAILABLE;
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return EXIT_CONFIG;
        }
    }
    EXIT_GENERAL_ERROR
}
