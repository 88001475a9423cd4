//! Per-request telemetry records and the per-target collections they live in.
use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Serialize, Serializer};

/// Header names mapped to every value sent or received for that name.
pub type HeaderLists = BTreeMap<String, Vec<String>>;

/// One completed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestResult {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub req_headers: HeaderLists,
    pub resp_headers: HeaderLists,
    pub destination_ip: String,
    pub destination_port: u16,
    pub resp_status_code: u16,
    pub req_start_time: DateTime<Utc>,
    pub req_end_time: DateTime<Utc>,
    #[serde(serialize_with = "serialize_nanos")]
    pub req_round_trip: Duration,
    /// Enrichment payloads keyed by module name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, serde_json::Value>,
}

impl RequestResult {
    /// Stores `payload` under `module`, replacing an earlier payload from the same module.
    pub fn enrich(&mut self, module: &str, payload: serde_json::Value) {
        self.modules.insert(module.to_owned(), payload);
    }

    #[must_use]
    pub fn enrichment(&self, module: &str) -> Option<&serde_json::Value> {
        self.modules.get(module)
    }

    #[must_use]
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.resp_status_code)
    }
}

/// Ordered results for one target, in request completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    target: usize,
    url: String,
    results: Vec<RequestResult>,
}

impl ResultSet {
    #[must_use]
    pub const fn new(target: usize, url: String) -> Self {
        Self {
            target,
            url,
            results: Vec::new(),
        }
    }

    /// Index of the target in the run configuration.
    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn push(&mut self, result: RequestResult) {
        self.results.push(result);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RequestResult> {
        self.results.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RequestResult> {
        self.results.iter_mut()
    }

    #[must_use]
    pub fn results(&self) -> &[RequestResult] {
        &self.results
    }

    #[must_use]
    pub fn summary(&self) -> ResultSetSummary {
        let mut non_success: usize = 0;
        let mut total_round_trip = Duration::ZERO;
        for result in &self.results {
            if !result.is_success_status() {
                non_success = non_success.saturating_add(1);
            }
            total_round_trip = total_round_trip.saturating_add(result.req_round_trip);
        }
        let count = u32::try_from(self.results.len()).unwrap_or(u32::MAX);
        let mean_round_trip = total_round_trip.checked_div(count).unwrap_or_default();
        ResultSetSummary {
            results: self.results.len(),
            non_success,
            mean_round_trip,
        }
    }
}

impl<'set> IntoIterator for &'set ResultSet {
    type Item = &'set RequestResult;
    type IntoIter = std::slice::Iter<'set, RequestResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSetSummary {
    pub results: usize,
    pub non_success: usize,
    pub mean_round_trip: Duration,
}

pub(crate) fn header_lists(headers: &HeaderMap) -> HeaderLists {
    let mut lists = HeaderLists::new();
    for (name, value) in headers {
        lists
            .entry(name.as_str().to_owned())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    lists
}

fn serialize_nanos<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
}
