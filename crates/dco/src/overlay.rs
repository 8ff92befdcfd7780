//! Caption overlay: a single centered line of white text on a translucent
//! dark box anchored near the bottom edge.

use campaign_core::config::CreativeConfig;
use image::{Rgb, RgbImage};

use crate::typography::{put_blended, TextExtent, Typeface};

const CAPTION_BOX: Rgb<u8> = Rgb([0, 0, 0]);
const CAPTION_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Caption proportions relative to the image width.
#[derive(Debug, Clone, Copy)]
pub struct CaptionStyle {
    pub font_scale: f32,
    pub padding_scale: f32,
    pub box_alpha: u8,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_scale: 0.05,
            padding_scale: 0.05,
            box_alpha: 180,
        }
    }
}

impl From<&CreativeConfig> for CaptionStyle {
    fn from(config: &CreativeConfig) -> Self {
        Self {
            font_scale: config.font_scale,
            padding_scale: config.padding_scale,
            box_alpha: config.overlay_alpha,
        }
    }
}

/// Axis-aligned box in image coordinates, half-open on the max side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

/// Where the caption's box and text go on an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionLayout {
    pub text_x: i64,
    pub text_y: i64,
    pub backing: PixelBox,
}

/// Center the text horizontally; its top sits at `h - th - 2 * padding`.
/// The backing box extends `padding` around the text and is clamped to the
/// image.
pub fn caption_layout(width: u32, height: u32, text: TextExtent, padding: u32) -> CaptionLayout {
    let (w, h) = (i64::from(width), i64::from(height));
    let (tw, th, pad) = (
        i64::from(text.width),
        i64::from(text.height),
        i64::from(padding),
    );

    let text_x = (w - tw) / 2;
    let text_y = h - th - pad * 2;

    let clamp_x = |v: i64| v.clamp(0, w) as u32;
    let clamp_y = |v: i64| v.clamp(0, h) as u32;

    CaptionLayout {
        text_x,
        text_y,
        backing: PixelBox {
            x0: clamp_x(text_x - pad),
            y0: clamp_y(text_y - pad),
            x1: clamp_x(text_x + tw + pad),
            y1: clamp_y(text_y + th + pad),
        },
    }
}

/// Draw the caption onto `img` in place and return the layout used.
pub fn overlay_caption(
    img: &mut RgbImage,
    text: &str,
    typeface: &Typeface,
    style: &CaptionStyle,
) -> CaptionLayout {
    let width = img.width();
    let px = (width as f32 * style.font_scale).max(1.0);
    let padding = (width as f32 * style.padding_scale) as u32;

    let extent = typeface.measure(text, px);
    let layout = caption_layout(width, img.height(), extent, padding);

    let alpha = f32::from(style.box_alpha) / 255.0;
    let b = layout.backing;
    for y in b.y0..b.y1 {
        for x in b.x0..b.x1 {
            put_blended(img, i64::from(x), i64::from(y), CAPTION_BOX, alpha);
        }
    }

    typeface.draw(img, layout.text_x, layout.text_y, px, CAPTION_TEXT, text);
    layout
}
