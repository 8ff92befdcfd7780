#![warn(clippy::unwrap_used)]

pub mod brief;
pub mod config;
pub mod error;
pub mod slug;
pub mod types;

pub use brief::{load_brief, BriefInput, CampaignBrief};
pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use types::{RenditionSpec, RunResult, RENDITIONS};
