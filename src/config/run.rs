use std::path::PathBuf;

use url::Url;

use crate::args::{BomberArgs, DEFAULT_USER_AGENT};
use crate::error::{AppError, AppResult, ValidationError};
use crate::http::{Settings, build_header_map};
use crate::modules::FailurePolicy;
use crate::modules::bulk::BulkConfig;
use crate::modules::geo::GeoSettings;

/// Validated inputs for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub targets: Vec<Settings>,
    /// Present when network or file export is enabled.
    pub bulk: Option<BulkConfig>,
    /// Present when geolocation enrichment is enabled.
    pub geo: Option<GeoSettings>,
    pub policy: FailurePolicy,
    pub debug: bool,
}

impl RunConfig {
    /// Validates `args` and expands them into per-target settings and module configs.
    ///
    /// # Errors
    ///
    /// Returns an error when a URL, header, or module option is invalid.
    pub fn from_args(args: &BomberArgs) -> AppResult<Self> {
        let urls: Vec<&str> = args
            .urls
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .collect();
        if urls.is_empty() {
            return Err(AppError::validation(ValidationError::MissingUrl));
        }

        let headers = with_default_user_agent(&args.headers);
        build_header_map(&headers)?;

        let mut targets = Vec::with_capacity(urls.len());
        for url in urls {
            validate_target_url(url)?;
            targets.push(Settings {
                url: url.to_owned(),
                headers: headers.clone(),
                duration: args.duration,
                timeout: args.timeout,
                interval: args.interval,
                network: args.network,
                skip_tls_verify: args.skip_tls_verify,
                follow_redirects: !args.no_follow_redirects,
                http2: args.http2,
            });
        }

        Ok(Self {
            targets,
            bulk: bulk_config(args)?,
            geo: geo_settings(args)?,
            policy: FailurePolicy {
                max_consecutive_failures: args.max_consecutive_failures,
                backoff: args.failure_backoff,
            },
            debug: args.debug,
        })
    }
}

fn with_default_user_agent(headers: &[(String, String)]) -> Vec<(String, String)> {
    let mut headers = headers.to_vec();
    if !headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
    {
        headers.push(("User-Agent".to_owned(), DEFAULT_USER_AGENT.to_owned()));
    }
    headers
}

fn validate_target_url(url: &str) -> AppResult<()> {
    let parsed = Url::parse(url).map_err(|err| {
        AppError::validation(ValidationError::InvalidUrl {
            url: url.to_owned(),
            source: err,
        })
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::validation(ValidationError::UnsupportedScheme {
            url: url.to_owned(),
            scheme: scheme.to_owned(),
        })),
    }
}

fn bulk_config(args: &BomberArgs) -> AppResult<Option<BulkConfig>> {
    if !args.export && !args.export_to_file {
        return Ok(None);
    }
    let index = args.bulk_index.trim();
    if index.is_empty() {
        return Err(AppError::validation(ValidationError::IndexNameEmpty));
    }
    if args.export {
        Url::parse(&args.bulk_url).map_err(|err| {
            AppError::validation(ValidationError::InvalidBulkEndpoint {
                url: args.bulk_url.clone(),
                source: err,
            })
        })?;
    }
    if args.export_to_file && args.export_file_path.trim().is_empty() {
        return Err(AppError::validation(ValidationError::ExportFilePathEmpty));
    }
    Ok(Some(BulkConfig {
        url: args.bulk_url.trim_end_matches('/').to_owned(),
        index: index.to_owned(),
        export: args.export,
        export_to_file: args.export_to_file,
        file_path: PathBuf::from(args.export_file_path.trim()),
        timeout: args.bulk_timeout,
    }))
}

fn geo_settings(args: &BomberArgs) -> AppResult<Option<GeoSettings>> {
    if !args.ipstack {
        return Ok(None);
    }
    let api_key = args
        .ipstack_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| AppError::validation(ValidationError::MissingApiKey))?;
    Url::parse(&args.ipstack_url).map_err(|err| {
        AppError::validation(ValidationError::InvalidProviderUrl {
            url: args.ipstack_url.clone(),
            source: err,
        })
    })?;
    Ok(Some(GeoSettings {
        api_key: api_key.to_owned(),
        enabled: true,
        timeout: args.ipstack_timeout,
        base_url: args.ipstack_url.trim_end_matches('/').to_owned(),
    }))
}
