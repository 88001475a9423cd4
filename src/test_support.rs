use std::collections::BTreeMap;
use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::results::RequestResult;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// A result as the executor would record it, with a 12ms round trip.
pub(crate) fn sample_result(ip: &str, status: u16) -> RequestResult {
    let start = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default();
    let end = start
        .checked_add_signed(TimeDelta::milliseconds(12))
        .unwrap_or(start);
    RequestResult {
        timestamp: end,
        url: "http://target.test/".to_owned(),
        req_headers: BTreeMap::from([(
            "user-agent".to_owned(),
            vec!["http-bomber/test".to_owned()],
        )]),
        resp_headers: BTreeMap::new(),
        destination_ip: ip.to_owned(),
        destination_port: 80,
        resp_status_code: status,
        req_start_time: start,
        req_end_time: end,
        req_round_trip: Duration::from_millis(12),
        modules: BTreeMap::new(),
    }
}

/// URL of a local port with nothing listening on it.
pub(crate) fn refused_url() -> Result<String, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind probe listener failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("probe addr failed: {}", err))?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

/// Listens on a local port, reads the first TLS record a client sends, then hangs up.
///
/// Returns an `https://` URL for the port and a handle yielding the raw ClientHello record.
pub(crate) fn capture_client_hello()
-> Result<(String, thread::JoinHandle<Result<Vec<u8>, String>>), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind tls listener failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("tls listener addr failed: {}", err))?;
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener
            .accept()
            .map_err(|err| format!("accept failed: {}", err))?;
        stream
            .set_read_timeout(Some(IO_TIMEOUT))
            .map_err(|err| format!("set_read_timeout failed: {}", err))?;
        let mut header = [0_u8; 5];
        stream
            .read_exact(&mut header)
            .map_err(|err| format!("read record header failed: {}", err))?;
        let [_, _, _, high, low] = header;
        let length = usize::from(u16::from_be_bytes([high, low]));
        let mut record = header.to_vec();
        record.resize(header.len().saturating_add(length), 0);
        let payload = record.get_mut(header.len()..).ok_or("bad record length")?;
        stream
            .read_exact(payload)
            .map_err(|err| format!("read record body failed: {}", err))?;
        drop(stream.shutdown(Shutdown::Both));
        Ok(record)
    });
    Ok((format!("https://{}", addr), handle))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    /// Lowercased names.
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    /// Extra headers written after `Content-Type`.
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl MockResponse {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub(crate) fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain",
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub(crate) fn json(body: &serde_json::Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            headers: Vec::new(),
            body: body.to_string(),
        }
    }
}

type Responder = dyn Fn(&RecordedRequest) -> MockResponse + Send + Sync;

/// Threaded HTTP/1.1 mock that records every request and closes each connection.
pub(crate) struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl MockServer {
    pub(crate) fn start<F>(respond: F) -> Result<Self, String>
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self::spawn(None, Arc::new(respond))
    }

    /// Accepts `max_connections` connections, then stops listening so later dials are refused.
    pub(crate) fn start_limited<F>(max_connections: usize, respond: F) -> Result<Self, String>
    where
        F: Fn(&RecordedRequest) -> MockResponse + Send + Sync + 'static,
    {
        Self::spawn(Some(max_connections), Arc::new(respond))
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn spawn(max_connections: Option<usize>, respond: Arc<Responder>) -> Result<Self, String> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind test server failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("server addr failed: {}", err))?;
        listener
            .set_nonblocking(true)
            .map_err(|err| format!("set_nonblocking failed: {}", err))?;

        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel();
        let recorded = Arc::clone(&requests);

        let handle = thread::spawn(move || {
            let mut accepted: usize = 0;
            let mut workers = Vec::new();
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                if max_connections.is_some_and(|max| accepted >= max) {
                    break;
                }
                match listener.accept() {
                    Ok((stream, _)) => {
                        accepted = accepted.saturating_add(1);
                        let respond = Arc::clone(&respond);
                        let recorded = Arc::clone(&recorded);
                        workers.push(thread::spawn(move || {
                            handle_client(stream, respond.as_ref(), &recorded);
                        }));
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
            drop(listener);
            for worker in workers {
                drop(worker.join());
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            requests,
            shutdown: shutdown_tx,
            thread: Some(handle),
        })
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

fn handle_client(
    mut stream: TcpStream,
    respond: &Responder,
    recorded: &Mutex<Vec<RecordedRequest>>,
) {
    if stream.set_nonblocking(false).is_err() || stream.set_read_timeout(Some(IO_TIMEOUT)).is_err()
    {
        return;
    }
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let response = respond(&request);
    if let Ok(mut requests) = recorded.lock() {
        requests.push(request);
    }
    let mut head = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: {}\r\n",
        response.status, response.content_type
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        response.body.len()
    ));
    if stream.write_all(head.as_bytes()).is_err()
        || stream.write_all(response.body.as_bytes()).is_err()
        || stream.flush().is_err()
    {
        return;
    }
    drop(stream.shutdown(Shutdown::Both));
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 4096];
    let header_end = loop {
        if let Some(position) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            break position;
        }
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            return None;
        }
        buffer.extend_from_slice(chunk.get(..read)?);
    };

    let head = String::from_utf8_lossy(buffer.get(..header_end)?).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_owned()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(key, _)| key == "content-length")
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buffer
        .get(header_end.saturating_add(4)..)
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    while body.len() < content_length {
        let read = stream.read(&mut chunk).ok()?;
        if read == 0 {
            break;
        }
        body.extend_from_slice(chunk.get(..read)?);
    }

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
