use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BomberArgs, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::{ConfigFile, ExportConfig, FailureConfig, IpstackConfig};

/// Applies configuration values to every option the user did not set explicitly.
///
/// # Errors
///
/// Returns an error when a config value cannot be parsed.
pub fn apply_config(
    args: &mut BomberArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if !is_explicit(matches, "urls")
        && let Some(urls) = config.urls.clone()
    {
        args.urls = urls;
    }

    if !is_explicit(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header)
                    .map_err(|err| AppError::config(ConfigError::InvalidHeader { source: err }))?,
            );
        }
        args.headers = parsed;
    }

    if !is_explicit(matches, "duration")
        && let Some(duration) = config.duration.as_ref()
    {
        args.duration = duration.to_duration("duration")?;
    }

    if !is_explicit(matches, "timeout")
        && let Some(timeout) = config.timeout.as_ref()
    {
        args.timeout = timeout.to_duration("timeout")?;
    }

    if !is_explicit(matches, "interval")
        && let Some(interval) = config.interval.as_ref()
    {
        args.interval = interval.to_duration("interval")?;
    }

    if !is_explicit(matches, "network")
        && let Some(network) = config.network
    {
        args.network = network;
    }

    if !is_explicit(matches, "skip_tls_verify")
        && let Some(value) = config.skip_tls_verify
    {
        args.skip_tls_verify = value;
    }

    if !is_explicit(matches, "no_follow_redirects")
        && let Some(follow) = config.follow_redirects
    {
        args.no_follow_redirects = !follow;
    }

    if !is_explicit(matches, "http2")
        && let Some(value) = config.http2
    {
        args.http2 = value;
    }

    if !is_explicit(matches, "debug")
        && let Some(value) = config.debug
    {
        args.debug = value;
    }

    if let Some(export) = config.export.as_ref() {
        apply_export_config(args, matches, export)?;
    }
    if let Some(ipstack) = config.ipstack.as_ref() {
        apply_ipstack_config(args, matches, ipstack)?;
    }
    if let Some(failures) = config.failures.as_ref() {
        apply_failure_config(args, matches, failures)?;
    }

    Ok(())
}

fn apply_export_config(
    args: &mut BomberArgs,
    matches: &ArgMatches,
    export: &ExportConfig,
) -> AppResult<()> {
    if !is_explicit(matches, "export")
        && let Some(value) = export.enabled
    {
        args.export = value;
    }

    if !is_explicit(matches, "export_to_file")
        && let Some(value) = export.to_file
    {
        args.export_to_file = value;
    }

    if !is_explicit(matches, "export_file_path")
        && let Some(path) = export.file_path.clone()
    {
        args.export_file_path = path;
    }

    if !is_explicit(matches, "bulk_url")
        && let Some(url) = export.url.clone()
    {
        args.bulk_url = url;
    }

    if !is_explicit(matches, "bulk_index")
        && let Some(index) = export.index.clone()
    {
        args.bulk_index = index;
    }

    if !is_explicit(matches, "bulk_timeout")
        && let Some(timeout) = export.timeout.as_ref()
    {
        args.bulk_timeout = timeout.to_duration("export.timeout")?;
    }

    Ok(())
}

fn apply_ipstack_config(
    args: &mut BomberArgs,
    matches: &ArgMatches,
    ipstack: &IpstackConfig,
) -> AppResult<()> {
    if !is_explicit(matches, "ipstack")
        && let Some(value) = ipstack.enabled
    {
        args.ipstack = value;
    }

    if !is_explicit(matches, "ipstack_key")
        && let Some(key) = ipstack.api_key.clone()
    {
        args.ipstack_key = Some(key);
    }

    if !is_explicit(matches, "ipstack_timeout")
        && let Some(timeout) = ipstack.timeout.as_ref()
    {
        args.ipstack_timeout = timeout.to_duration("ipstack.timeout")?;
    }

    if !is_explicit(matches, "ipstack_url")
        && let Some(url) = ipstack.url.clone()
    {
        args.ipstack_url = url;
    }

    Ok(())
}

fn apply_failure_config(
    args: &mut BomberArgs,
    matches: &ArgMatches,
    failures: &FailureConfig,
) -> AppResult<()> {
    if !is_explicit(matches, "max_consecutive_failures")
        && let Some(value) = failures.max_consecutive
    {
        args.max_consecutive_failures = value;
    }

    if !is_explicit(matches, "failure_backoff")
        && let Some(backoff) = failures.backoff.as_ref()
    {
        args.failure_backoff = backoff.to_duration("failures.backoff")?;
    }

    Ok(())
}

/// Set on the command line or through its environment variable.
fn is_explicit(matches: &ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}
