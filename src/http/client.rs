use std::time::Duration;

use reqwest::{
    Client,
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect,
};
use tracing::error;

use crate::error::{AppError, AppResult, HttpError};

use super::settings::Settings;
use super::tls::apply_tls_settings;

/// Dial timeout for new target connections.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Idle connections kept per host.
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Builds the per-target HTTP client.
///
/// # Errors
///
/// Returns an error when the client cannot be constructed.
pub fn build_target_client(settings: &Settings) -> AppResult<Client> {
    let mut builder = Client::builder()
        .timeout(settings.timeout)
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .local_address(settings.network.local_address());

    builder = if settings.follow_redirects {
        builder.redirect(redirect::Policy::default())
    } else {
        builder.redirect(redirect::Policy::none())
    };

    builder = apply_tls_settings(builder, settings);

    builder.build().map_err(|err| {
        error!("Failed to build HTTP client for {}: {}", settings.url, err);
        AppError::http(HttpError::BuildClientFailed { source: err })
    })
}

/// Builds a pooled client for sink and lookup calls.
///
/// # Errors
///
/// Returns an error when the client cannot be constructed.
pub fn build_service_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .build()
        .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))
}

/// Converts configured header pairs into a multi-valued header map.
///
/// # Errors
///
/// Returns an error when a name or value is not a valid HTTP header.
pub fn build_header_map(headers: &[(String, String)]) -> AppResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderName {
                name: key.clone(),
                source: err,
            })
        })?;
        let val = HeaderValue::from_str(value).map_err(|err| {
            AppError::http(HttpError::InvalidHeaderValue {
                name: key.clone(),
                source: err,
            })
        })?;
        map.append(name, val);
    }
    Ok(map)
}
