//! Generation client: turns a product into a source image on disk, waiting
//! out rate limits and substituting a placeholder when the provider refuses.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use campaign_core::config::GenerationConfig;
use campaign_core::slug::generated_file_name;
use campaign_dco::placeholder::write_placeholder;
use campaign_dco::Typeface;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::connector::{classify_rejection, ImageProvider, ImageRequest, ProviderError};

/// Prompt sent to the provider for one product.
pub fn build_prompt(product: &str, region: &str, audience: &str) -> String {
    let mut prompt = format!(
        "Professional marketing image of {product}. Clean studio lighting, modern commercial look."
    );
    if !region.is_empty() {
        prompt.push_str(&format!(" Target market: {region}."));
    }
    if !audience.is_empty() {
        prompt.push_str(&format!(" Target audience: {audience}."));
    }
    prompt
}

/// Exponential backoff used when the provider gives no `Retry-After` hint.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial, max }
    }

    /// Wait for this attempt, preferring the provider's hint. The internal
    /// delay doubles on every call, hint or not, up to `max`.
    pub fn wait(&mut self, hint: Option<Duration>) -> Duration {
        let wait = hint.unwrap_or(self.next);
        self.next = (self.next * 2).min(self.max);
        wait
    }
}

/// Where one generation run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    Attempting { attempt: u32 },
    Backoff { attempt: u32, wait: Duration },
    Succeeded { attempt: u32 },
    PlaceholderFallback { reason: String },
}

/// How the returned source image came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetOrigin {
    /// The destination already existed; nothing was requested.
    Existing,
    Generated { attempts: u32 },
    Placeholder { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationOutcome {
    pub path: PathBuf,
    pub origin: AssetOrigin,
}

impl GenerationOutcome {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.origin, AssetOrigin::Placeholder { .. })
    }
}

/// Drives an [`ImageProvider`] for one pipeline run. Calls are strictly
/// sequential and every success is followed by the throttle pause.
pub struct GenerationClient {
    provider: Arc<dyn ImageProvider>,
    config: GenerationConfig,
    typeface: Typeface,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn ImageProvider>, config: GenerationConfig, typeface: Typeface) -> Self {
        Self {
            provider,
            config,
            typeface,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Produce `output_dir/<slug>.png` for `product`. Never fails: provider
    /// refusals and unexpected errors yield a placeholder at the same path.
    pub async fn generate(
        &self,
        product: &str,
        output_dir: &Path,
        region: &str,
        audience: &str,
    ) -> GenerationOutcome {
        let dest = output_dir.join(generated_file_name(product));
        if dest.is_file() {
            debug!(product, path = %dest.display(), "Generated asset already present");
            return GenerationOutcome {
                path: dest,
                origin: AssetOrigin::Existing,
            };
        }

        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            error!(dir = %output_dir.display(), error = %e, "Cannot create generated dir");
        }

        let request = ImageRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(product, region, audience),
            size: self.config.size_param(),
            n: 1,
        };

        let started = Instant::now();
        let budget = self.config.retry_budget();
        let mut backoff = Backoff::new(self.config.initial_backoff(), self.config.max_backoff());
        let mut state = GenerationState::Attempting { attempt: 1 };

        loop {
            state = match state {
                GenerationState::Attempting { attempt } => {
                    metrics::counter!("creative.generation.requests").increment(1);
                    info!(product, attempt, provider = self.provider.name(), "Requesting image");

                    match self.provider.generate(&request).await {
                        Ok(image) => match persist(&image.b64_json, &dest).await {
                            Ok(()) => GenerationState::Succeeded { attempt },
                            Err(e) => {
                                warn!(product, error = %e, "Could not store generated image");
                                placeholder_state(product, "error")
                            }
                        },
                        Err(ProviderError::RateLimited { retry_after }) => {
                            metrics::counter!("creative.generation.rate_limited").increment(1);
                            let wait = backoff.wait(retry_after);
                            match budget {
                                Some(limit) if started.elapsed() + wait > limit => {
                                    warn!(product, ?limit, "Rate-limit budget exhausted");
                                    placeholder_state(product, "rate limit budget exhausted")
                                }
                                _ => GenerationState::Backoff { attempt, wait },
                            }
                        }
                        Err(ProviderError::BadRequest { code, message }) => {
                            let reason = classify_rejection(code.as_deref(), &message);
                            warn!(product, ?reason, %message, "Provider rejected request");
                            placeholder_state(product, reason.label())
                        }
                        Err(e) => {
                            warn!(product, error = %e, "Generation failed");
                            placeholder_state(product, "error")
                        }
                    }
                }
                GenerationState::Backoff { attempt, wait } => {
                    info!(product, attempt, wait_ms = wait.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    GenerationState::Attempting { attempt: attempt + 1 }
                }
                GenerationState::Succeeded { attempt } => {
                    info!(product, attempt, path = %dest.display(), "Image generated");
                    tokio::time::sleep(self.config.throttle()).await;
                    return GenerationOutcome {
                        path: dest,
                        origin: AssetOrigin::Generated { attempts: attempt },
                    };
                }
                GenerationState::PlaceholderFallback { reason } => {
                    metrics::counter!("creative.generation.placeholders").increment(1);
                    if let Err(e) = write_placeholder(
                        &dest,
                        self.config.image_size,
                        &reason,
                        self.config.placeholder_reason_limit,
                        &self.typeface,
                    ) {
                        error!(product, error = %e, "Could not write placeholder");
                    }
                    return GenerationOutcome {
                        path: dest,
                        origin: AssetOrigin::Placeholder { reason },
                    };
                }
            };
        }
    }
}

fn placeholder_state(product: &str, label: &str) -> GenerationState {
    GenerationState::PlaceholderFallback {
        reason: format!("{product} ({label})"),
    }
}

async fn persist(b64: &str, dest: &Path) -> Result<(), String> {
    let bytes = STANDARD
        .decode(b64.trim())
        .map_err(|e| format!("invalid base64 payload: {e}"))?;
    if bytes.is_empty() {
        return Err("empty image payload".to_string());
    }
    tokio::fs::write(dest, bytes)
        .await
        .map_err(|e| format!("{}: {e}", dest.display()))
}
