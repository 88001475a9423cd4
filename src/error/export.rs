use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to open export file '{path}': {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write export file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize result: {source}")]
    SerializeResult {
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to format bulk payload: {source}")]
    FormatPayload {
        #[source]
        source: std::fmt::Error,
    },
    #[error(
        "Module '{module}' hit {failures} consecutive failures. Check network settings and endpoint URLs."
    )]
    TooManyFailures { module: &'static str, failures: u32 },
}
