//! Configuration loading, application onto CLI arguments, and validation.
mod apply;
mod loader;
mod run;
pub mod types;


pub use apply::apply_config;
pub use loader::load_config;
pub use run::RunConfig;

#[cfg(test)]
pub(crate) use loader::load_config_file;
