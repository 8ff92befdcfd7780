//! End-to-end runs of the orchestrator against a scripted in-process provider.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use campaign_core::{AppConfig, CampaignBrief, CampaignError};
use campaign_integrations::{GeneratedImage, ImageProvider, ImageRequest, ProviderError};
use campaign_pipeline::PipelineOrchestrator;

struct ScriptedProvider {
    script: Mutex<VecDeque<Result<GeneratedImage, ProviderError>>>,
    requests: Mutex<Vec<ImageRequest>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<GeneratedImage, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }
}

#[async_trait]
impl ImageProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("script exhausted".to_string())))
    }
}

fn png_b64(w: u32, h: u32) -> String {
    let img = image::RgbImage::from_fn(w, h, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
    STANDARD.encode(bytes.into_inner())
}

fn ok_image() -> Result<GeneratedImage, ProviderError> {
    Ok(GeneratedImage {
        b64_json: png_b64(96, 96),
    })
}

fn config_for(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.assets_dir = root.join("assets");
    config.paths.output_dir = root.join("outputs");
    config.generation.image_size = 96;
    std::fs::create_dir_all(&config.paths.assets_dir).unwrap();
    config
}

fn red_mug_brief() -> CampaignBrief {
    CampaignBrief::new(vec!["Red Mug".to_string()], "50% Off", "EU", "Students").unwrap()
}

fn assert_three_renditions(dir: &Path) {
    for (name, w, h) in [
        ("square_1080x1080.png", 1080, 1080),
        ("story_1080x1920.png", 1080, 1920),
        ("landscape_1920x1080.png", 1920, 1080),
    ] {
        let img = image::open(dir.join(name)).unwrap();
        assert_eq!((img.width(), img.height()), (w, h), "{name}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_missing_asset_is_generated_and_rendered() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    let provider = ScriptedProvider::new(vec![ok_image()]);
    let orchestrator = PipelineOrchestrator::new(&config, provider.clone());

    let result = orchestrator.run_brief(&red_mug_brief()).await.unwrap();

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    for needle in ["Red Mug", "EU", "Students"] {
        assert!(prompts[0].contains(needle), "prompt lacks {needle}");
    }

    assert!(result.success);
    assert_eq!(result.products, ["Red Mug"]);
    assert_eq!(result.generated_count, 1);
    assert_eq!(result.placeholder_count, 0);
    assert_eq!(result.processed_count, 1);
    assert_eq!(result.total_assets, 3);
    assert!(result.failures.is_empty());
    assert_eq!(result.output_dir, config.paths.output_dir);
    assert_eq!(
        result.renditions[0].source,
        config.paths.assets_dir.join("generated").join("red-mug.png")
    );

    assert_three_renditions(&config.paths.output_dir.join("Red Mug"));
}

#[tokio::test(start_paused = true)]
async fn test_existing_asset_skips_generation() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    image::RgbImage::new(200, 100)
        .save(config.paths.assets_dir.join("Red Mug.jpg"))
        .unwrap();
    let provider = ScriptedProvider::new(vec![]);
    let orchestrator = PipelineOrchestrator::new(&config, provider.clone());

    let result = orchestrator.run_brief(&red_mug_brief()).await.unwrap();

    assert!(provider.prompts().is_empty());
    assert_eq!(result.generated_count, 0);
    assert_eq!(result.processed_count, 1);
    assert_eq!(result.renditions[0].source, config.paths.assets_dir.join("Red Mug.jpg"));
    assert_three_renditions(&config.paths.output_dir.join("Red Mug"));
}

#[tokio::test(start_paused = true)]
async fn test_billing_cap_still_produces_renditions() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    let provider = ScriptedProvider::new(vec![Err(ProviderError::BadRequest {
        code: Some("billing_hard_limit_reached".to_string()),
        message: "Billing hard limit has been reached".to_string(),
    })]);
    let orchestrator = PipelineOrchestrator::new(&config, provider.clone());

    let result = orchestrator.run_brief(&red_mug_brief()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.generated_count, 1);
    assert_eq!(result.placeholder_count, 1);
    assert_eq!(result.total_assets, 3);

    let placeholder = image::open(config.paths.assets_dir.join("generated").join("red-mug.png")).unwrap();
    assert!(!placeholder.color().has_alpha());
    let rgb = placeholder.to_rgb8();
    assert!(rgb.pixels().any(|p| *p != image::Rgb([240, 240, 240])));

    assert_three_renditions(&config.paths.output_dir.join("Red Mug"));
}

#[tokio::test(start_paused = true)]
async fn test_unicode_names_do_not_conflate_with_ascii_slug() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    image::RgbImage::new(64, 64)
        .save(config.paths.assets_dir.join("cafe-mug.png"))
        .unwrap();
    let provider = ScriptedProvider::new(vec![ok_image()]);
    let orchestrator = PipelineOrchestrator::new(&config, provider.clone());

    let brief = CampaignBrief::new(
        vec!["Café Mug".to_string(), "cafe-mug".to_string()],
        "New in",
        "",
        "",
    )
    .unwrap();
    let result = orchestrator.run_brief(&brief).await.unwrap();

    assert_eq!(provider.prompts().len(), 1);
    assert!(provider.prompts()[0].contains("Café Mug"));
    assert_eq!(result.generated_count, 1);
    assert_eq!(result.processed_count, 2);
    assert_eq!(
        result.renditions[0].source,
        config.paths.assets_dir.join("generated").join("café-mug.png")
    );
    assert_eq!(result.renditions[1].source, config.paths.assets_dir.join("cafe-mug.png"));
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_asset_is_recorded_and_run_continues() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    std::fs::write(config.paths.assets_dir.join("broken.png"), b"not a png").unwrap();
    image::RgbImage::new(64, 64)
        .save(config.paths.assets_dir.join("good.png"))
        .unwrap();
    let orchestrator = PipelineOrchestrator::new(&config, ScriptedProvider::new(vec![]));

    let brief = CampaignBrief::new(vec!["broken".to_string(), "good".to_string()], "Sale", "", "").unwrap();
    let result = orchestrator.run_brief(&brief).await.unwrap();

    assert!(result.success);
    assert_eq!(result.processed_count, 1);
    assert_eq!(result.total_assets, 3);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].product, "broken");
    assert_eq!(result.renditions[0].product, "good");
}

#[tokio::test(start_paused = true)]
async fn test_second_run_reuses_generated_source() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    let provider = ScriptedProvider::new(vec![ok_image(), ok_image()]);
    let orchestrator = PipelineOrchestrator::new(&config, provider.clone());

    orchestrator.run_brief(&red_mug_brief()).await.unwrap();
    let second = orchestrator.run_brief(&red_mug_brief()).await.unwrap();

    assert_eq!(provider.prompts().len(), 1);
    assert_eq!(second.generated_count, 0);
    assert_eq!(second.processed_count, 1);
}

#[tokio::test]
async fn test_run_loads_brief_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    let orchestrator = PipelineOrchestrator::new(&config, ScriptedProvider::new(vec![]));

    let err = orchestrator.run(&tmp.path().join("absent.json")).await.unwrap_err();
    assert!(matches!(err, CampaignError::BriefNotFound(_)));

    let empty = tmp.path().join("empty.json");
    std::fs::write(&empty, r#"{"products": [], "message": "Hi"}"#).unwrap();
    let err = orchestrator.run(&empty).await.unwrap_err();
    assert!(matches!(err, CampaignError::Validation(_)));

    let txt = tmp.path().join("brief.txt");
    std::fs::write(&txt, "products: [a]").unwrap();
    let err = orchestrator.run(&txt).await.unwrap_err();
    assert!(matches!(err, CampaignError::UnsupportedFormat(_)));

    image::RgbImage::new(32, 32)
        .save(config.paths.assets_dir.join("tote.png"))
        .unwrap();
    let yaml = tmp.path().join("brief.yaml");
    std::fs::write(&yaml, "products:\n  - tote\nmessage: Carry more\n").unwrap();
    let result = orchestrator.run(&yaml).await.unwrap();
    assert_eq!(result.processed_count, 1);
    assert_eq!(result.total_assets, 3);
}

#[tokio::test(start_paused = true)]
async fn test_symbol_only_products_are_generated_separately() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());
    let provider = ScriptedProvider::new(vec![ok_image(), ok_image()]);
    let orchestrator = PipelineOrchestrator::new(&config, provider.clone());

    let brief = CampaignBrief::new(vec!["!!!".to_string(), "???".to_string()], "Mystery box", "", "").unwrap();
    let result = orchestrator.run_brief(&brief).await.unwrap();

    assert_eq!(provider.prompts().len(), 2);
    assert_eq!(result.generated_count, 2);
    assert_eq!(result.processed_count, 2);
    assert_ne!(result.renditions[0].source, result.renditions[1].source);
}
