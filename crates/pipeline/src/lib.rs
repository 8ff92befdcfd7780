//! Creative automation pipeline: turns a campaign brief into captioned
//! renditions per product, generating missing source images on the way.

#![warn(clippy::unwrap_used)]

pub mod orchestrator;

pub use orchestrator::PipelineOrchestrator;
