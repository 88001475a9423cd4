pub(crate) const DEFAULT_USER_AGENT: &str = concat!("http-bomber/", env!("CARGO_PKG_VERSION"));

pub(crate) const DEFAULT_BULK_URL: &str = "http://localhost:9200";
pub(crate) const DEFAULT_BULK_INDEX: &str = "http-bomber";
pub(crate) const DEFAULT_EXPORT_FILE_PATH: &str = "./http-bomber-results";
pub(crate) const DEFAULT_PROVIDER_URL: &str = "http://api.ipstack.com";
pub(crate) const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;
