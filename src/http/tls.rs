use reqwest::ClientBuilder;

use super::settings::Settings;

/// Applies certificate verification and protocol negotiation toggles.
pub(super) fn apply_tls_settings(mut builder: ClientBuilder, settings: &Settings) -> ClientBuilder {
    if settings.skip_tls_verify {
        builder = builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);
    }

    // ALPN offers h2 and http/1.1 only with the opt-in; plain http stays on HTTP/1.1.
    if !settings.http2 {
        builder = builder.http1_only();
    }

    builder
}
