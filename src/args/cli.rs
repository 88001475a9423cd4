use clap::Parser;
use std::time::Duration;

use super::defaults::{
    DEFAULT_BULK_INDEX, DEFAULT_BULK_URL, DEFAULT_EXPORT_FILE_PATH,
    DEFAULT_MAX_CONSECUTIVE_FAILURES, DEFAULT_PROVIDER_URL,
};
use super::parsers::{parse_duration_arg, parse_header};
use super::types::NetworkStack;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Sustained HTTP load generator with per-request telemetry, geolocation enrichment, and bulk export."
)]
pub struct BomberArgs {
    /// Target URL (repeatable, or comma separated for several targets)
    #[arg(long = "url", short = 'u', value_delimiter = ',')]
    pub urls: Vec<String>,

    /// HTTP headers in 'Key: Value' format (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Test duration per target (supports ms/s/m/h, bare numbers are seconds)
    #[arg(long, short = 'd', default_value = "10s", value_parser = parse_duration_arg)]
    pub duration: Duration,

    /// Per-request timeout
    #[arg(long, default_value = "5s", value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Pause after each request
    #[arg(long, short = 'i', default_value = "100ms", value_parser = parse_duration_arg)]
    pub interval: Duration,

    /// Network stack used to reach targets
    #[arg(long = "network", short = 'n', default_value = "tcp4", ignore_case = true)]
    pub network: NetworkStack,

    /// Skip TLS certificate verification
    #[arg(long = "skip-tls-verify")]
    pub skip_tls_verify: bool,

    /// Treat redirect responses as terminal instead of following them
    #[arg(long = "no-follow-redirects")]
    pub no_follow_redirects: bool,

    /// Negotiate HTTP/2 when the target offers it
    #[arg(long = "http2")]
    pub http2: bool,

    /// Verbose per-request logging
    #[arg(long)]
    pub debug: bool,

    /// Path to a TOML or JSON config file
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    /// Post results to the bulk endpoint
    #[arg(long = "export")]
    pub export: bool,

    /// Append bulk payloads to a local file
    #[arg(long = "export-file")]
    pub export_to_file: bool,

    /// Base path for exported files; a random suffix is appended per target
    #[arg(long = "export-file-path", default_value = DEFAULT_EXPORT_FILE_PATH)]
    pub export_file_path: String,

    /// Search engine base URL
    #[arg(long = "el-url", default_value = DEFAULT_BULK_URL)]
    pub bulk_url: String,

    /// Search engine index name
    #[arg(long = "el-index", default_value = DEFAULT_BULK_INDEX)]
    pub bulk_index: String,

    /// Timeout for bulk and index bootstrap requests
    #[arg(long = "el-timeout", default_value = "5s", value_parser = parse_duration_arg)]
    pub bulk_timeout: Duration,

    /// Enrich results with ipstack geolocation data
    #[arg(long = "ipstack")]
    pub ipstack: bool,

    /// ipstack API access key
    #[arg(long = "ipstack-key", env = "IPSTACK_API_KEY", hide_env_values = true)]
    pub ipstack_key: Option<String>,

    /// Timeout for geolocation lookups
    #[arg(long = "ipstack-timeout", default_value = "5s", value_parser = parse_duration_arg)]
    pub ipstack_timeout: Duration,

    /// Geolocation provider base URL
    #[arg(long = "ipstack-url", default_value = DEFAULT_PROVIDER_URL)]
    pub ipstack_url: String,

    /// Abort once this many export/lookup calls fail in a row
    #[arg(long = "max-consecutive-failures", default_value_t = DEFAULT_MAX_CONSECUTIVE_FAILURES)]
    pub max_consecutive_failures: u32,

    /// Pause after a failed export/lookup call
    #[arg(long = "failure-backoff", default_value = "1s", value_parser = parse_duration_arg)]
    pub failure_backoff: Duration,
}
