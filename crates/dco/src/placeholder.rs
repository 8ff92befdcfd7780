//! Stand-in source images written when generation is unavailable.

use std::path::{Path, PathBuf};

use campaign_core::{CampaignError, CampaignResult};
use image::{ImageFormat, Rgb, RgbImage};
use tracing::warn;

use crate::typography::Typeface;

const BACKGROUND: Rgb<u8> = Rgb([240, 240, 240]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

const MARGIN: u32 = 40;
const LABEL_TOP: u32 = 40;
const REASON_TOP: u32 = 100;
pub const PLACEHOLDER_LABEL: &str = "Placeholder";

/// Flat opaque square with a "Placeholder" label and the failure reason,
/// truncated to `reason_limit` characters and wrapped to the image width.
pub fn render_placeholder(
    size: u32,
    reason: &str,
    reason_limit: usize,
    typeface: &Typeface,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, BACKGROUND);
    let label_px = (size as f32 * 0.04).max(8.0);
    let reason_px = (size as f32 * 0.025).max(8.0);

    typeface.draw(
        &mut img,
        i64::from(MARGIN),
        i64::from(LABEL_TOP),
        label_px,
        INK,
        PLACEHOLDER_LABEL,
    );

    let reason: String = reason.chars().take(reason_limit).collect();
    let max_width = size.saturating_sub(MARGIN * 2);
    let line_height = (typeface.measure("Ag", reason_px).height as f32 * 1.4).ceil() as i64;
    let mut y = i64::from(REASON_TOP);
    for line in wrap_words(&reason, max_width, |s| typeface.measure(s, reason_px).width) {
        typeface.draw(&mut img, i64::from(MARGIN), y, reason_px, INK, &line);
        y += line_height.max(1);
    }

    img
}

/// Render and persist a placeholder PNG at `path`, creating parent dirs.
pub fn write_placeholder(
    path: &Path,
    size: u32,
    reason: &str,
    reason_limit: usize,
    typeface: &Typeface,
) -> CampaignResult<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    render_placeholder(size, reason, reason_limit, typeface)
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| CampaignError::Image(format!("{}: {e}", path.display())))?;

    warn!(path = %path.display(), reason, "Wrote placeholder image");
    metrics::counter!("creative.placeholders.written").increment(1);
    Ok(path.to_path_buf())
}

/// Greedy word wrap. A single word wider than `max_width` gets its own line.
fn wrap_words(text: &str, max_width: u32, width_of: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if current.is_empty() || width_of(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
