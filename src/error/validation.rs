use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid header format: '{value}'. Expected 'Key: Value'")]
    InvalidHeaderFormat { value: String },
    #[error("Header name must not be empty: '{value}'")]
    HeaderNameEmpty { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
    #[error("Missing URL (set --url or provide in config).")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme '{scheme}' in '{url}'. Use http or https.")]
    UnsupportedScheme { url: String, scheme: String },
    #[error("Invalid bulk endpoint '{url}': {source}")]
    InvalidBulkEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Bulk index name must not be empty.")]
    IndexNameEmpty,
    #[error("Export file path must not be empty when file export is enabled.")]
    ExportFilePathEmpty,
    #[error("Geolocation lookup requires an API key (--ipstack-key or IPSTACK_API_KEY).")]
    MissingApiKey,
    #[error("Invalid geolocation provider URL '{url}': {source}")]
    InvalidProviderUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
