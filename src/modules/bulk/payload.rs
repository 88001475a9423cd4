use std::fmt::Write as _;

use serde_json::{Map, Value, json};

use crate::error::{AppError, AppResult, ExportError};
use crate::results::ResultSet;

/// Renders `results` as newline-delimited bulk pairs for `index`.
///
/// Each result contributes an action line followed by its document line, so a
/// set of `n` results always produces `2n` lines.
///
/// # Errors
///
/// Returns an error when a result cannot be serialized.
pub fn format_bulk_payload(index: &str, results: &ResultSet) -> AppResult<String> {
    let action = serde_json::to_string(&json!({ "index": { "_index": index } }))
        .map_err(|err| AppError::export(ExportError::SerializeResult { source: err }))?;

    let mut payload = String::new();
    for result in results {
        let document = serde_json::to_string(result)
            .map_err(|err| AppError::export(ExportError::SerializeResult { source: err }))?;
        writeln!(payload, "{}", action)
            .and_then(|()| writeln!(payload, "{}", document))
            .map_err(|err| AppError::export(ExportError::FormatPayload { source: err }))?;
    }
    Ok(payload)
}

/// Mapping document placing every module fragment under `modules`.
#[must_use]
pub fn mapping_document(field_mappings: &Map<String, Value>) -> Value {
    json!({
        "properties": {
            "modules": {
                "properties": Value::Object(field_mappings.clone())
            }
        }
    })
}
