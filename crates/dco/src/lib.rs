//! Creative production: resolves product source images, renders captioned
//! aspect-ratio renditions, and draws placeholder artwork.

#![warn(clippy::unwrap_used)]

pub mod asset_ops;
pub mod overlay;
pub mod placeholder;
pub mod renditions;
pub mod typography;

pub use asset_ops::AssetResolver;
pub use overlay::{CaptionLayout, CaptionStyle};
pub use placeholder::{render_placeholder, write_placeholder};
pub use renditions::{center_crop_region, CropRegion, ImageTransformer};
pub use typography::Typeface;
