//! Bulk exporter: ships each result set to a search engine and/or a local file.
mod payload;


use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::args::{DEFAULT_BULK_INDEX, DEFAULT_BULK_URL, DEFAULT_EXPORT_FILE_PATH};
use crate::error::{AppError, AppResult, ExportError};
use crate::http::build_service_client;
use crate::results::ResultSet;

use super::{FailurePolicy, FailureTracker, Module, ModuleContext};

pub use payload::{format_bulk_payload, mapping_document};

const MODULE_NAME: &str = "elasticsearch";
const NDJSON: &str = "application/x-ndjson";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkConfig {
    /// Search engine base URL, without a trailing path.
    pub url: String,
    pub index: String,
    /// Post payloads to the bulk endpoint.
    pub export: bool,
    /// Append payloads to a local file.
    pub export_to_file: bool,
    pub file_path: PathBuf,
    pub timeout: Duration,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_BULK_URL.to_owned(),
            index: DEFAULT_BULK_INDEX.to_owned(),
            export: false,
            export_to_file: false,
            file_path: PathBuf::from(DEFAULT_EXPORT_FILE_PATH),
            timeout: Duration::from_secs(5),
        }
    }
}

impl BulkConfig {
    fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

pub struct BulkExporter {
    config: BulkConfig,
    client: Client,
    tracker: FailureTracker,
    context: ModuleContext,
}

impl BulkExporter {
    /// # Errors
    ///
    /// Returns an error when the pooled HTTP client cannot be built.
    pub fn new(config: BulkConfig, policy: FailurePolicy) -> AppResult<Self> {
        let client = build_service_client(config.timeout)?;
        Ok(Self {
            config,
            client,
            tracker: FailureTracker::new(MODULE_NAME, policy),
            context: ModuleContext::default(),
        })
    }

    /// Creates the index and applies the merged field mappings.
    ///
    /// Every failure is logged and otherwise ignored.
    pub async fn bootstrap_index(&self) {
        let index_url = format!("{}/{}", self.config.base_url(), self.config.index);
        match self.client.put(&index_url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Created index {}", self.config.index);
            }
            Ok(response) => {
                warn!(
                    "Index creation for {} returned {}",
                    self.config.index,
                    response.status()
                );
            }
            Err(err) => {
                error!("Failed to create index {}: {}", self.config.index, err);
            }
        }

        let mapping = mapping_document(&self.context.field_mappings);
        let mapping_url = format!("{}/_mapping", index_url);
        match self.client.put(&mapping_url).json(&mapping).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Applied field mappings to {}", self.config.index);
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("Mapping update for {} returned {}", self.config.index, status);
                debug!("Mapping response body: {}", body);
            }
            Err(err) => {
                error!(
                    "Failed to apply mappings to {}: {}",
                    self.config.index, err
                );
            }
        }
    }

    /// Posts one payload to the bulk endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error once the consecutive failure threshold is exceeded.
    pub async fn post_bulk(&self, payload: String) -> AppResult<()> {
        let endpoint = format!("{}/_bulk?pretty", self.config.base_url());
        match self
            .client
            .post(&endpoint)
            .header(CONTENT_TYPE, NDJSON)
            .body(payload)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    self.tracker.record_success();
                    debug!("Bulk request accepted with {}", status);
                } else {
                    let body = response.text().await.unwrap_or_default();
                    warn!("Bulk request to {} returned {}", endpoint, status);
                    debug!("Bulk response body: {}", body);
                }
                Ok(())
            }
            Err(err) => {
                error!("Bulk request to {} failed: {}", endpoint, err);
                self.tracker.record_failure().await
            }
        }
    }
}

#[async_trait]
impl Module for BulkExporter {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn init(&mut self, context: ModuleContext) {
        self.context = context;
    }

    async fn prepare(&self) {
        if !self.config.export || self.context.field_mappings.is_empty() {
            return;
        }
        self.bootstrap_index().await;
    }

    async fn run(&self, results: ResultSet) -> AppResult<ResultSet> {
        if results.is_empty() {
            debug!("Nothing to export for {}", results.url());
            return Ok(results);
        }

        let payload = format_bulk_payload(&self.config.index, &results)?;
        if self.context.debug {
            debug!("Bulk payload for {}:\n{}", results.url(), payload);
        }

        if self.config.export {
            self.post_bulk(payload.clone()).await?;
        }
        if self.config.export_to_file {
            let path = write_payload_file(&self.config.file_path, &payload).await?;
            info!("Exported {} results to {}", results.len(), path.display());
        }
        Ok(results)
    }
}

/// Appends `payload` to `{base}-{random}` and returns the file used.
///
/// # Errors
///
/// Returns an error when the file cannot be opened or written.
pub async fn write_payload_file(base: &Path, payload: &str) -> AppResult<PathBuf> {
    let path = suffixed_path(base, rand::random::<u64>());
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(|err| {
            AppError::export(ExportError::OpenFile {
                path: path.clone(),
                source: err,
            })
        })?;
    let written = match file.write_all(payload.as_bytes()).await {
        Ok(()) => file.flush().await,
        Err(err) => Err(err),
    };
    written.map_err(|err| {
        AppError::export(ExportError::WriteFile {
            path: path.clone(),
            source: err,
        })
    })?;
    Ok(path)
}

fn suffixed_path(base: &Path, suffix: u64) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!("-{}", suffix));
    PathBuf::from(name)
}
