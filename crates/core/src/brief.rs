//! Campaign brief model and loading from JSON/YAML files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CampaignError, CampaignResult};

/// Unvalidated brief as it appears on disk or on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BriefInput {
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub audience: String,
}

/// A validated campaign brief. Read-only once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignBrief {
    products: Vec<String>,
    message: String,
    region: String,
    audience: String,
}

impl CampaignBrief {
    pub fn new(
        products: Vec<String>,
        message: impl Into<String>,
        region: impl Into<String>,
        audience: impl Into<String>,
    ) -> CampaignResult<Self> {
        let products: Vec<String> = products.into_iter().map(|p| p.trim().to_string()).collect();
        let message = message.into();

        if products.is_empty() {
            return Err(CampaignError::Validation(
                "Brief must contain at least 1 product.".to_string(),
            ));
        }
        if products.iter().any(|p| p.is_empty()) {
            return Err(CampaignError::Validation(
                "Product names must not be empty.".to_string(),
            ));
        }
        if message.is_empty() {
            return Err(CampaignError::Validation(
                "Brief must include a campaign message.".to_string(),
            ));
        }

        Ok(Self {
            products,
            message,
            region: region.into(),
            audience: audience.into(),
        })
    }

    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }
}

impl TryFrom<BriefInput> for CampaignBrief {
    type Error = CampaignError;

    fn try_from(input: BriefInput) -> CampaignResult<Self> {
        Self::new(input.products, input.message, input.region, input.audience)
    }
}

/// Load and validate a brief from a `.json`, `.yaml` or `.yml` file.
pub fn load_brief(path: &Path) -> CampaignResult<CampaignBrief> {
    if !path.exists() {
        return Err(CampaignError::BriefNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let raw = std::fs::read_to_string(path)?;
    let input: BriefInput = match ext {
        "json" => serde_json::from_str(&raw)?,
        "yaml" | "yml" => serde_yaml::from_str(&raw)?,
        other => return Err(CampaignError::UnsupportedFormat(format!(".{other}"))),
    };

    debug!(path = %path.display(), products = input.products.len(), "Loaded brief");
    CampaignBrief::try_from(input)
}
