//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use api_proxy::config::ProxyConfig;
use api_proxy::http::HttpServer;
use api_proxy::lifecycle::Shutdown;
use api_proxy::routing::RouteTable;

pub const CLIENT_ID: &str = "test-client-id";
pub const V5_ACCEPT: &str = "application/vnd.twitchtv.v5+json";

/// A request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, q)| q)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_user_lookup(&self) -> bool {
        self.path() == "/kraken/users" && self.query().is_some_and(|q| q.starts_with("login="))
    }
}

/// Handle to a running mock upstream.
#[derive(Clone, Default)]
pub struct MockUpstream {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn lookups(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.is_user_lookup()).collect()
    }

    pub fn forwarded(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| !r.is_user_lookup()).collect()
    }
}

/// Start a programmable mock upstream that records every request.
pub async fn start_programmable_upstream<F>(addr: SocketAddr, f: F) -> MockUpstream
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let upstream = MockUpstream::default();
    let f = Arc::new(f);

    let recorder = upstream.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    let recorder = recorder.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(socket).await else {
                            return;
                        };
                        let (request, mut socket) = request;
                        let (status, body) = f(&request);
                        recorder.requests.lock().unwrap().push(request);

                        let status = StatusCode::from_u16(status).unwrap();
                        let response = format!(
                            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status.as_u16(),
                            status.canonical_reason().unwrap_or("Unknown"),
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    upstream
}

async fn read_request(socket: TcpStream) -> Option<(RecordedRequest, TcpStream)> {
    let mut reader = BufReader::new(socket);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await.ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await.ok()?;

    let request = RecordedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    Some((request, reader.into_inner()))
}

/// A v5 upstream that knows `users` and answers every other request with `{"ok":true}`.
pub async fn start_kraken_upstream(addr: SocketAddr, users: &'static [(&'static str, u64)]) -> MockUpstream {
    start_programmable_upstream(addr, move |request| {
        if !request.is_user_lookup() {
            return (200, r#"{"ok":true}"#.to_string());
        }
        let login = request.query().and_then(|q| q.strip_prefix("login=")).unwrap_or_default();
        match users.iter().find(|(name, _)| *name == login) {
            Some((name, id)) => (
                200,
                format!(r#"{{"_total":1,"users":[{{"_id":"{}","name":"{}"}}]}}"#, id, name),
            ),
            None => (200, r#"{"_total":0,"users":[]}"#.to_string()),
        }
    })
    .await
}

pub const TEST_ROUTES: &str = "\
# test routes
GET /kraken/channels/:channel/follows
GET /kraken/users/:user
PUT /kraken/users/:user/follows/channels/:target
GET /kraken/teams/!team
";

/// Proxy configuration pointing at a local upstream.
pub fn proxy_config(proxy_addr: SocketAddr, upstream_addr: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = proxy_addr.to_string();
    config.upstream.base_url = format!("http://{}", upstream_addr);
    config.upstream.client_id = CLIENT_ID.to_string();
    config
}

/// Start the proxy with [`TEST_ROUTES`]. The listener is bound before this returns.
pub async fn start_proxy(config: ProxyConfig) -> Shutdown {
    let server = HttpServer::new(&config, RouteTable::parse(TEST_ROUTES)).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
