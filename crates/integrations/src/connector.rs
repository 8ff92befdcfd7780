//! Image-generation connector: the provider seam and its error taxonomy.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One generation request: always a single square image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
    pub n: u32,
}

/// Base64-encoded image payload returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub b64_json: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Retryable; `retry_after` is the provider's suggested wait, if any.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Non-retryable rejection of the request itself.
    #[error("bad request: {message}")]
    BadRequest {
        code: Option<String>,
        message: String,
    },

    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// External image-generation service.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ProviderError>;
}

/// Why a request was rejected, as far as the pipeline cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    BillingCapReached,
    ModelUnavailable,
    Other,
}

impl RejectionReason {
    /// Short text used in placeholder captions.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BillingCapReached => "billing cap reached",
            Self::ModelUnavailable => "model unavailable",
            Self::Other => "error",
        }
    }
}

/// Translate a provider rejection into a [`RejectionReason`].
///
/// The structured error code is authoritative. Substring matching on the
/// message only applies when the provider sent no recognised code, for
/// providers that report these conditions in free text.
pub fn classify_rejection(code: Option<&str>, message: &str) -> RejectionReason {
    match code {
        Some("billing_hard_limit_reached") => return RejectionReason::BillingCapReached,
        Some("model_not_found") => return RejectionReason::ModelUnavailable,
        _ => {}
    }

    let message = message.to_lowercase();
    if message.contains("billing_hard_limit_reached") || message.contains("billing hard limit") {
        RejectionReason::BillingCapReached
    } else if message.contains("model_not_found") || message.contains("does not exist") {
        RejectionReason::ModelUnavailable
    } else {
        RejectionReason::Other
    }
}
