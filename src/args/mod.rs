//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::BomberArgs;
pub use types::NetworkStack;

pub(crate) use defaults::{
    DEFAULT_BULK_INDEX, DEFAULT_BULK_URL, DEFAULT_EXPORT_FILE_PATH,
    DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_PROVIDER_URL, DEFAULT_USER_AGENT,
};
pub(crate) use parsers::{parse_duration_value, parse_header};
