//! Caption typefaces: a TrueType face when one can be found, otherwise the
//! built-in 8x8 bitmap face. Loading never fails.

use std::path::{Path, PathBuf};

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};
use rusttype::{point, Font, PositionedGlyph, Rect, Scale};
use tracing::{debug, warn};

/// Bold sans-serif faces probed when no face is configured.
const SYSTEM_FACES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

const BITMAP_CELL: u32 = 8;

/// Pixel size of rendered text's ink box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextExtent {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone)]
pub enum Typeface {
    Outline { font: Font<'static>, source: PathBuf },
    Bitmap,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline { source, .. } => f.debug_tuple("Outline").field(source).finish(),
            Self::Bitmap => f.write_str("Bitmap"),
        }
    }
}

impl Typeface {
    /// Load `preferred` if given and readable, else the first system face
    /// found, else the bitmap face.
    pub fn load(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(SYSTEM_FACES.iter().map(PathBuf::from));

        for path in candidates {
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            match Font::try_from_vec(bytes) {
                Some(font) => {
                    debug!(path = %path.display(), "Loaded caption typeface");
                    return Self::Outline { font, source: path };
                }
                None => warn!(path = %path.display(), "Unparseable font file, skipping"),
            }
        }

        warn!("No TrueType face available, captions use the bitmap face");
        Self::Bitmap
    }

    pub fn is_outline(&self) -> bool {
        matches!(self, Self::Outline { .. })
    }

    /// Ink box of `text` rendered at `px` pixels.
    pub fn measure(&self, text: &str, px: f32) -> TextExtent {
        match self {
            Self::Outline { font, .. } => {
                let (_, ink) = layout_outline(font, text, px);
                ink.map_or(TextExtent { width: 0, height: 0 }, |r| TextExtent {
                    width: (r.max.x - r.min.x).max(0) as u32,
                    height: (r.max.y - r.min.y).max(0) as u32,
                })
            }
            Self::Bitmap => {
                let cell = bitmap_cell(px);
                TextExtent {
                    width: text.chars().count() as u32 * cell,
                    height: if text.is_empty() { 0 } else { cell },
                }
            }
        }
    }

    /// Draw `text` so that its ink box's top-left corner lands on `(x, y)`.
    /// Pixels outside the image are clipped.
    pub fn draw(&self, img: &mut RgbImage, x: i64, y: i64, px: f32, color: Rgb<u8>, text: &str) {
        match self {
            Self::Outline { font, .. } => {
                let (glyphs, ink) = layout_outline(font, text, px);
                let Some(ink) = ink else {
                    return;
                };
                for glyph in &glyphs {
                    let Some(bb) = glyph.pixel_bounding_box() else {
                        continue;
                    };
                    let ox = x + i64::from(bb.min.x - ink.min.x);
                    let oy = y + i64::from(bb.min.y - ink.min.y);
                    glyph.draw(|gx, gy, coverage| {
                        put_blended(img, ox + i64::from(gx), oy + i64::from(gy), color, coverage);
                    });
                }
            }
            Self::Bitmap => {
                let cell = bitmap_cell(px);
                let dot = i64::from(cell / BITMAP_CELL);
                for (i, ch) in text.chars().enumerate() {
                    let rows = bitmap_glyph(ch);
                    let gx0 = x + i as i64 * i64::from(cell);
                    for (row, bits) in rows.iter().enumerate() {
                        for col in 0..BITMAP_CELL {
                            if bits & (1 << col) == 0 {
                                continue;
                            }
                            let bx = gx0 + i64::from(col) * dot;
                            let by = y + row as i64 * dot;
                            for dy in 0..dot {
                                for dx in 0..dot {
                                    put_blended(img, bx + dx, by + dy, color, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn layout_outline(
    font: &Font<'static>,
    text: &str,
    px: f32,
) -> (Vec<PositionedGlyph<'static>>, Option<Rect<i32>>) {
    let scale = Scale::uniform(px.max(1.0));
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, v_metrics.ascent)).collect();

    let ink = glyphs
        .iter()
        .filter_map(PositionedGlyph::pixel_bounding_box)
        .reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        });

    (glyphs, ink)
}

/// Bitmap glyphs are scaled by whole multiples of 8 px.
fn bitmap_cell(px: f32) -> u32 {
    let factor = (px / BITMAP_CELL as f32).round().max(1.0) as u32;
    factor * BITMAP_CELL
}

fn bitmap_glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Alpha-blend `color` onto one pixel, ignoring coordinates outside the image.
pub(crate) fn put_blended(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= i64::from(img.width()) || y >= i64::from(img.height()) {
        return;
    }
    if alpha <= 0.0 {
        return;
    }
    let a = alpha.min(1.0);
    let inv = 1.0 - a;
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        dst.0[c] = (color.0[c] as f32 * a + dst.0[c] as f32 * inv).round() as u8;
    }
}
