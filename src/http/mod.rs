//! Target request execution: client setup, single-request telemetry, and the per-target loop.
mod client;
mod executor;
mod runner;
mod settings;
mod tls;


pub use client::{build_header_map, build_service_client, build_target_client};
pub use executor::execute_request;
pub use runner::{RunnerState, TestRunner};
pub use settings::Settings;
