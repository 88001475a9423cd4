//! Geolocation enrichment backed by the ipstack lookup API.
mod types;


use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::args::DEFAULT_PROVIDER_URL;
use crate::error::AppResult;
use crate::http::build_service_client;
use crate::results::ResultSet;

use super::{FailurePolicy, FailureTracker, Module, ModuleContext};

pub use types::{Connection, Currency, IpstackResponse, Language, Location, Security, TimeZone};

const MODULE_NAME: &str = "ipstack";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoSettings {
    pub api_key: String,
    pub enabled: bool,
    pub timeout: Duration,
    /// Provider base URL; lookups go to `{base_url}/{ip}`.
    pub base_url: String,
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            enabled: false,
            timeout: Duration::from_secs(5),
            base_url: DEFAULT_PROVIDER_URL.to_owned(),
        }
    }
}

/// Attaches provider geolocation to every result, one lookup per unique IP.
pub struct GeoEnricher {
    settings: GeoSettings,
    client: Client,
    tracker: FailureTracker,
    context: ModuleContext,
}

impl GeoEnricher {
    /// # Errors
    ///
    /// Returns an error when the lookup client cannot be built.
    pub fn new(settings: GeoSettings, policy: FailurePolicy) -> AppResult<Self> {
        let client = build_service_client(settings.timeout)?;
        Ok(Self {
            settings,
            client,
            tracker: FailureTracker::new(MODULE_NAME, policy),
            context: ModuleContext::default(),
        })
    }

    /// Fetches the enrichment payload for `ip`. `None` means the lookup failed.
    pub async fn lookup(&self, ip: &str) -> Option<Value> {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), ip);
        let response = match self
            .client
            .get(&url)
            .query(&[("access_key", self.settings.api_key.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("Geolocation lookup for {} failed: {}", ip, err);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Geolocation lookup for {} returned {}", ip, status);
            return None;
        }

        let document: Value = match response.json().await {
            Ok(document) => document,
            Err(err) => {
                warn!("Geolocation response for {} was not JSON: {}", ip, err);
                return None;
            }
        };
        if document.get("success") == Some(&Value::Bool(false)) {
            let reason = document.get("error").cloned().unwrap_or_default();
            warn!("Geolocation provider rejected lookup for {}: {}", ip, reason);
            return None;
        }

        let mut parsed: IpstackResponse = match serde_json::from_value(document) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("Unexpected geolocation document for {}: {}", ip, err);
                return None;
            }
        };
        parsed.fill_latitude_longitude();
        match serde_json::to_value(&parsed) {
            Ok(payload) => Some(payload),
            Err(err) => {
                warn!("Failed to encode geolocation for {}: {}", ip, err);
                None
            }
        }
    }
}

#[async_trait]
impl Module for GeoEnricher {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    fn field_mappings(&self) -> Option<Value> {
        Some(json!({
            "properties": {
                "latitude_longitude": { "type": "geo_point" }
            }
        }))
    }

    fn init(&mut self, context: ModuleContext) {
        self.context = context;
    }

    async fn run(&self, mut results: ResultSet) -> AppResult<ResultSet> {
        if !self.settings.enabled {
            return Ok(results);
        }

        // Failed lookups are cached too.
        let mut cache: HashMap<String, Option<Value>> = HashMap::new();
        for result in results.iter_mut() {
            if result.destination_ip.is_empty() {
                continue;
            }
            let payload = if let Some(cached) = cache.get(&result.destination_ip) {
                cached.clone()
            } else {
                let fetched = self.lookup(&result.destination_ip).await;
                if fetched.is_some() {
                    self.tracker.record_success();
                } else {
                    self.tracker.record_failure().await?;
                }
                cache.insert(result.destination_ip.clone(), fetched.clone());
                fetched
            };
            if let Some(payload) = payload {
                result.enrich(MODULE_NAME, payload);
            }
        }

        if self.context.debug {
            debug!(
                "Resolved {} unique addresses for {}",
                cache.len(),
                results.url()
            );
        }
        Ok(results)
    }
}
