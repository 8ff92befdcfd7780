//! HTTP surface for the creative pipeline: submit a brief, get the run
//! summary back.

#![warn(clippy::unwrap_used)]

pub mod rest;
pub mod server;

pub use server::ApiServer;
