use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named output aspect ratio with its exact pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenditionSpec {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

impl RenditionSpec {
    /// `<name>_<w>x<h>.png`
    pub fn file_name(&self) -> String {
        format!("{}_{}x{}.png", self.name, self.width, self.height)
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// The fixed, ordered set of renditions produced for every product.
pub const RENDITIONS: [RenditionSpec; 3] = [
    RenditionSpec {
        name: "square",
        width: 1080,
        height: 1080,
    },
    RenditionSpec {
        name: "story",
        width: 1080,
        height: 1920,
    },
    RenditionSpec {
        name: "landscape",
        width: 1920,
        height: 1080,
    },
];

/// Files written for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRenditions {
    pub product: String,
    pub source: PathBuf,
    pub files: Vec<PathBuf>,
}

/// A product whose renditions could not be produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFailure {
    pub product: String,
    pub reason: String,
}

/// Summary returned once per pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub success: bool,
    pub products: Vec<String>,
    pub generated_count: usize,
    pub placeholder_count: usize,
    pub processed_count: usize,
    pub total_assets: usize,
    pub output_dir: PathBuf,
    pub renditions: Vec<ProductRenditions>,
    pub failures: Vec<ProductFailure>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
