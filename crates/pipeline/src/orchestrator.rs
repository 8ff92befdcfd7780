//! Pipeline orchestrator: brief → missing assets → generation → renditions →
//! run summary. Every step is awaited in order; one product at a time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use campaign_core::slug::generated_file_name;
use campaign_core::types::{ProductFailure, ProductRenditions};
use campaign_core::{load_brief, AppConfig, CampaignBrief, CampaignError, CampaignResult, RunResult};
use campaign_dco::{AssetResolver, ImageTransformer};
use campaign_integrations::{GenerationClient, ImageProvider, OpenAiImageProvider};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct PipelineOrchestrator {
    resolver: AssetResolver,
    generator: GenerationClient,
    transformer: Arc<ImageTransformer>,
    output_dir: PathBuf,
}

impl PipelineOrchestrator {
    /// Build against an explicit provider.
    pub fn new(config: &AppConfig, provider: Arc<dyn ImageProvider>) -> Self {
        let transformer = Arc::new(ImageTransformer::new(&config.creative));
        let generator = GenerationClient::new(
            provider,
            config.generation.clone(),
            transformer.typeface().clone(),
        );
        Self::with_parts(
            AssetResolver::new(&config.paths.assets_dir),
            generator,
            transformer,
            config.paths.output_dir.clone(),
        )
    }

    /// Build with the OpenAI-compatible provider. Missing credentials are a
    /// configuration error.
    pub fn from_config(config: &AppConfig) -> CampaignResult<Self> {
        let provider = OpenAiImageProvider::new(&config.provider)?;
        Ok(Self::new(config, Arc::new(provider)))
    }

    pub fn with_parts(
        resolver: AssetResolver,
        generator: GenerationClient,
        transformer: Arc<ImageTransformer>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            resolver,
            generator,
            transformer,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Load a brief file and run it.
    pub async fn run(&self, brief_path: &Path) -> CampaignResult<RunResult> {
        let brief = load_brief(brief_path)?;
        self.run_brief(&brief).await
    }

    /// Run an already validated brief. Past validation nothing here fails:
    /// generation degrades to placeholders and per-product transform errors
    /// are recorded in the summary.
    pub async fn run_brief(&self, brief: &CampaignBrief) -> CampaignResult<RunResult> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let products = brief.products();
        metrics::counter!("creative.runs.started").increment(1);
        info!(%run_id, products = products.len(), "Pipeline run started");

        let missing = self.resolver.missing(products);
        info!(%run_id, missing = ?missing, "Asset check complete");

        let mut generated_count = 0;
        let mut placeholder_count = 0;
        for product in &missing {
            let outcome = self
                .generator
                .generate(
                    product,
                    self.resolver.generated_dir(),
                    brief.region(),
                    brief.audience(),
                )
                .await;
            generated_count += 1;
            if outcome.is_placeholder() {
                placeholder_count += 1;
            }
        }

        let mut renditions = Vec::new();
        let mut failures = Vec::new();
        for product in products {
            let source = self.resolver.find(product).unwrap_or_else(|| {
                self.resolver
                    .generated_dir()
                    .join(generated_file_name(product))
            });
            if !source.is_file() {
                warn!(%run_id, product = %product, path = %source.display(), "No source image, skipping");
                failures.push(ProductFailure {
                    product: product.clone(),
                    reason: format!("no source image at {}", source.display()),
                });
                continue;
            }

            match self.render(&source, brief.message(), product).await {
                Ok(files) => renditions.push(ProductRenditions {
                    product: product.clone(),
                    source,
                    files,
                }),
                Err(e) => {
                    error!(%run_id, product = %product, error = %e, "Rendering failed");
                    metrics::counter!("creative.products.failed").increment(1);
                    failures.push(ProductFailure {
                        product: product.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let processed_count = renditions.len();
        let total_assets = renditions.iter().map(|r| r.files.len()).sum();
        info!(
            %run_id,
            generated = generated_count,
            placeholders = placeholder_count,
            processed = processed_count,
            total_assets,
            failed = failures.len(),
            "Pipeline run complete"
        );

        Ok(RunResult {
            run_id,
            success: true,
            products: products.to_vec(),
            generated_count,
            placeholder_count,
            processed_count,
            total_assets,
            output_dir: self.output_dir.clone(),
            renditions,
            failures,
            started_at,
            completed_at: Utc::now(),
        })
    }

    /// Rendering is CPU-bound, so it runs on the blocking pool.
    async fn render(&self, source: &Path, message: &str, product: &str) -> CampaignResult<Vec<PathBuf>> {
        let transformer = Arc::clone(&self.transformer);
        let source = source.to_path_buf();
        let message = message.to_string();
        let output_dir = self.output_dir.clone();
        let product = product.to_string();

        tokio::task::spawn_blocking(move || {
            transformer.process_product(&source, &message, &output_dir, &product)
        })
        .await
        .map_err(|e| CampaignError::Internal(anyhow::anyhow!("render task failed: {e}")))?
    }
}
