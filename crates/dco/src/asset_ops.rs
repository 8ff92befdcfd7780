//! Asset lookup: maps product names onto existing source images under the
//! asset root and its `generated` sub-root.
//!
//! Lookups are recomputed from the file system every time; nothing is cached
//! between calls.

use std::path::{Path, PathBuf};

use campaign_core::slug::slugify;
use tracing::debug;

/// Extensions probed for every name candidate, in order.
pub const ASSET_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Name of the sub-root holding generated and placeholder images.
pub const GENERATED_DIR: &str = "generated";

/// Resolves product names to source images on disk.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    assets_dir: PathBuf,
    generated_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        let assets_dir = assets_dir.into();
        let generated_dir = assets_dir.join(GENERATED_DIR);
        Self {
            assets_dir,
            generated_dir,
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn generated_dir(&self) -> &Path {
        &self.generated_dir
    }

    /// Find the first existing image for `product`.
    ///
    /// Search order is root, then name candidate, then extension. The raw
    /// product name is always tried before its slug within a root, so an
    /// exact file name wins over another product that merely slugs the same.
    pub fn find(&self, product: &str) -> Option<PathBuf> {
        let slug = slugify(product);
        let mut names = vec![product];
        if !slug.is_empty() && slug != product {
            names.push(slug.as_str());
        }

        for root in [&self.assets_dir, &self.generated_dir] {
            for name in &names {
                for ext in ASSET_EXTENSIONS {
                    let candidate = root.join(format!("{name}.{ext}"));
                    if candidate.is_file() {
                        debug!(product, path = %candidate.display(), "Resolved asset");
                        return Some(candidate);
                    }
                }
            }
        }

        None
    }

    /// Products without any existing asset, in input order.
    pub fn missing<S: AsRef<str>>(&self, products: &[S]) -> Vec<String> {
        products
            .iter()
            .map(AsRef::as_ref)
            .filter(|p| self.find(p).is_none())
            .map(str::to_string)
            .collect()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────
