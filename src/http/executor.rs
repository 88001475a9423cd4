use std::net::SocketAddr;

use chrono::{TimeDelta, Utc};
use futures_util::StreamExt;
use reqwest::{Client, header::HeaderMap};
use tokio::time::Instant;
use tracing::debug;

use crate::results::{RequestResult, header_lists};

/// Issues one GET against `url` and records its telemetry.
///
/// Returns `None` when the request could not be built or did not complete
/// (connect, transport, or body read failure). A completed request with an
/// error status is still a result.
pub async fn execute_request(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
) -> Option<RequestResult> {
    let request = match client.get(url).headers(headers.clone()).build() {
        Ok(request) => request,
        Err(err) => {
            debug!("Failed to form request: {}", err);
            return None;
        }
    };
    let req_headers = header_lists(request.headers());

    let req_start_time = Utc::now();
    let started = Instant::now();
    let response = match client.execute(request).await {
        Ok(response) => response,
        Err(err) => {
            debug!("Failed request: {}", err);
            return None;
        }
    };

    // Captured as soon as the transport connection is known.
    let remote_addr = response.remote_addr();
    let status = response.status().as_u16();
    let resp_headers = header_lists(response.headers());

    if let Err(err) = drain_response_body(response).await {
        debug!("Failed to read response body: {}", err);
        return None;
    }

    let req_round_trip = started.elapsed();
    let req_end_time = TimeDelta::from_std(req_round_trip)
        .ok()
        .and_then(|delta| req_start_time.checked_add_signed(delta))
        .unwrap_or(req_start_time);
    let (destination_ip, destination_port) = split_remote_addr(remote_addr);

    debug!("{} {} {:?}", url, status, req_round_trip);

    Some(RequestResult {
        timestamp: req_end_time,
        url: url.to_owned(),
        req_headers,
        resp_headers,
        destination_ip,
        destination_port,
        resp_status_code: status,
        req_start_time,
        req_end_time,
        req_round_trip,
        modules: Default::default(),
    })
}

pub(super) fn split_remote_addr(addr: Option<SocketAddr>) -> (String, u16) {
    addr.map_or_else(
        || (String::new(), 0),
        |addr| (addr.ip().to_string(), addr.port()),
    )
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
