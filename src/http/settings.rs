use std::time::Duration;

use crate::args::NetworkStack;

/// Configuration for one target. Immutable once its runner starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    /// Request headers; a name may appear more than once.
    pub headers: Vec<(String, String)>,
    pub duration: Duration,
    pub timeout: Duration,
    pub interval: Duration,
    pub network: NetworkStack,
    pub skip_tls_verify: bool,
    pub follow_redirects: bool,
    pub http2: bool,
}

impl Settings {
    /// Settings for `url` with the tool's defaults.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            duration: Duration::from_secs(10),
            timeout: Duration::from_secs(5),
            interval: Duration::from_millis(100),
            network: NetworkStack::default(),
            skip_tls_verify: false,
            follow_redirects: true,
            http2: false,
        }
    }

    /// Upper bound on the number of requests a run can issue.
    #[must_use]
    pub fn max_requests(&self) -> u128 {
        self.duration
            .as_nanos()
            .checked_div(self.interval.as_nanos())
            .unwrap_or(0)
    }
}
