//! Core library for the `http-bomber` CLI.
//!
//! Generates sustained HTTP load against one or more targets, records
//! per-request telemetry, and pipes the results through post-processing
//! modules (geolocation enrichment, bulk export to a search engine or file).
pub mod args;
pub mod config;
pub mod error;
pub mod http;
pub mod logger;
pub mod modules;
pub mod orchestrator;
pub mod results;

mod entry;

#[cfg(test)]
mod test_support;

pub use entry::{run, run_bomber};
