//! OpenAI-compatible `images/generations` provider.

use std::time::Duration;

use async_trait::async_trait;
use campaign_core::config::ProviderConfig;
use campaign_core::{CampaignError, CampaignResult};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::connector::{GeneratedImage, ImageProvider, ImageRequest, ProviderError};

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: String,
}

pub struct OpenAiImageProvider {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    project_id: Option<String>,
}

impl OpenAiImageProvider {
    /// Build a provider from explicit credentials. An empty API key is a
    /// configuration error.
    pub fn new(config: &ProviderConfig) -> CampaignResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(CampaignError::Config(
                "Missing API key for the image-generation provider".to_string(),
            ));
        }

        let endpoint = Url::parse(&format!(
            "{}/images/generations",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| CampaignError::Config(format!("invalid provider base_url: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| CampaignError::Config(format!("HTTP client: {e}")))?;

        let project_id = config
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        info!(endpoint = %endpoint, project = ?project_id, "Image provider configured");

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            project_id,
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request);
        if let Some(project) = &self.project_id {
            builder = builder.header("OpenAI-Project", project);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let status = response.status();
        debug!(status = status.as_u16(), model = %request.model, "Provider responded");

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let (code, message) = parse_error_body(&body);
            return Err(if status == StatusCode::BAD_REQUEST {
                ProviderError::BadRequest { code, message }
            } else {
                ProviderError::UnexpectedStatus {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let parsed: ImagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .map(|b64_json| GeneratedImage { b64_json })
            .ok_or_else(|| ProviderError::MalformedResponse("response carried no image".to_string()))
    }
}

/// Longest `Retry-After` hint honoured; larger values are capped.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// `Retry-After` in (possibly fractional) seconds, capped at
/// [`MAX_RETRY_AFTER`].
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: f64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    if secs.is_nan() || secs < 0.0 {
        return None;
    }
    let wait = Duration::try_from_secs_f64(secs).unwrap_or(MAX_RETRY_AFTER);
    Some(wait.min(MAX_RETRY_AFTER))
}

/// `{"error": {"code", "message"}}`, or the raw body when it is not JSON.
fn parse_error_body(body: &str) -> (Option<String>, String) {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (None, body.to_string()),
    }
}
