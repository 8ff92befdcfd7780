//! Renditions: center-crop a source image to each target aspect ratio,
//! resize with Lanczos3, caption it and write it to the output tree.

use std::path::{Path, PathBuf};

use campaign_core::config::CreativeConfig;
use campaign_core::slug::generated_file_name;
use campaign_core::{CampaignError, CampaignResult, RenditionSpec, RENDITIONS};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use tracing::{debug, info};

use crate::overlay::{overlay_caption, CaptionStyle};
use crate::typography::Typeface;

/// Region of the source kept by a center crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Largest centered region of a `src_w`x`src_h` image with the target's
/// aspect ratio. Wider sources lose columns on both sides, taller (or equal)
/// sources lose rows top and bottom.
pub fn center_crop_region(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> CropRegion {
    let target_ratio = f64::from(target_w) / f64::from(target_h);
    let ratio = f64::from(src_w) / f64::from(src_h);

    if ratio > target_ratio {
        let width = ((f64::from(src_h) * target_ratio).round() as u32).clamp(1, src_w);
        CropRegion {
            x: (src_w - width) / 2,
            y: 0,
            width,
            height: src_h,
        }
    } else {
        let height = ((f64::from(src_w) / target_ratio).round() as u32).clamp(1, src_h);
        CropRegion {
            x: 0,
            y: (src_h - height) / 2,
            width: src_w,
            height,
        }
    }
}

/// Crop `source` to the target ratio and resize to exactly `width`x`height`.
pub fn crop_and_resize(source: &RgbImage, width: u32, height: u32) -> RgbImage {
    let region = center_crop_region(source.width(), source.height(), width, height);
    let cropped =
        imageops::crop_imm(source, region.x, region.y, region.width, region.height).to_image();
    imageops::resize(&cropped, width, height, FilterType::Lanczos3)
}

/// Directory name for a product under the output root. Path separators are
/// replaced so a product can never write outside its own directory.
pub fn product_dir_name(product: &str) -> String {
    let name: String = product
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => generated_file_name(product).trim_end_matches(".png").to_string(),
        _ => name,
    }
}

/// Turns one source image into the fixed set of captioned renditions.
#[derive(Debug)]
pub struct ImageTransformer {
    typeface: Typeface,
    style: CaptionStyle,
}

impl ImageTransformer {
    pub fn new(config: &CreativeConfig) -> Self {
        Self {
            typeface: Typeface::load(config.font_path.as_deref()),
            style: CaptionStyle::from(config),
        }
    }

    pub fn with_typeface(typeface: Typeface, style: CaptionStyle) -> Self {
        Self { typeface, style }
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    /// Center-crop and resize to one rendition.
    pub fn render(&self, source: &RgbImage, spec: &RenditionSpec) -> RgbImage {
        crop_and_resize(source, spec.width, spec.height)
    }

    /// Caption a rendition.
    pub fn overlay(&self, mut image: RgbImage, text: &str) -> RgbImage {
        overlay_caption(&mut image, text, &self.typeface, &self.style);
        image
    }

    /// Write every rendition of `source` to
    /// `output_root/<product>/<ratio>_<w>x<h>.png` and return the paths.
    pub fn process_product(
        &self,
        source: &Path,
        message: &str,
        output_root: &Path,
        product: &str,
    ) -> CampaignResult<Vec<PathBuf>> {
        let image = load_rgb(source)?;
        let product_dir = output_root.join(product_dir_name(product));
        std::fs::create_dir_all(&product_dir)?;

        let mut written = Vec::with_capacity(RENDITIONS.len());
        for spec in &RENDITIONS {
            let rendition = self.overlay(self.render(&image, spec), message);
            let out = product_dir.join(spec.file_name());
            rendition
                .save_with_format(&out, ImageFormat::Png)
                .map_err(|e| CampaignError::Image(format!("{}: {e}", out.display())))?;
            debug!(product, ratio = spec.name, path = %out.display(), "Wrote rendition");
            written.push(out);
        }

        metrics::counter!("creative.renditions.written").increment(written.len() as u64);
        info!(product, count = written.len(), "Renditions complete");
        Ok(written)
    }
}

fn load_rgb(path: &Path) -> CampaignResult<RgbImage> {
    let image = image::open(path)
        .map_err(|e| CampaignError::Image(format!("{}: {e}", path.display())))?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(CampaignError::Image(format!(
            "{}: empty image",
            path.display()
        )));
    }
    Ok(image)
}
