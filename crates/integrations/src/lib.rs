//! Image-generation integration: the provider seam, an OpenAI-compatible
//! HTTP provider and the retrying client the pipeline drives.

#![warn(clippy::unwrap_used)]

pub mod connector;
pub mod generation;
pub mod openai;

pub use connector::{
    classify_rejection, GeneratedImage, ImageProvider, ImageRequest, ProviderError,
    RejectionReason,
};
pub use generation::{build_prompt, AssetOrigin, GenerationClient, GenerationOutcome};
pub use openai::OpenAiImageProvider;
