//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use baas_sdk::config::{AuthCredential, SdkConfig};
use baas_sdk::net::StaticResolver;

/// Hostname the SDK is configured with; the static resolver maps it to loopback.
pub const GATEWAY_HOST: &str = "gateway.test";

/// One request as the gateway saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    /// Lowercased header names.
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl RecordedRequest {
    /// Path without the leading slash, i.e. the RPC verb.
    pub fn verb(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

type Handler = dyn Fn(&RecordedRequest) -> (u16, String) + Send + Sync;

/// Programmable HTTP gateway on a loopback port.
pub struct MockGateway {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockGateway {
    /// Start a gateway answering every request with `handler`.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let handler = handler.clone();
                        let recorded = recorded.clone();
                        tokio::spawn(async move {
                            serve(socket, handler, recorded).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, requests }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose path is `/verb`.
    pub fn requests_for(&self, verb: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.verb() == verb).collect()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.requests_for(verb).len()
    }
}

async fn serve(mut socket: TcpStream, handler: Arc<Handler>, recorded: Arc<Mutex<Vec<RecordedRequest>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let target = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => body.extend_from_slice(&chunk[..n]),
        }
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.clone(), None),
    };
    let request = RecordedRequest {
        path,
        query,
        headers,
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    recorded.lock().unwrap().push(request.clone());

    let (status, reply) = handler(&request);
    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reply.len(),
        reply
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Successful JSON-RPC reply.
pub fn rpc_ok(result: Value) -> (u16, String) {
    (200, json!({ "id": 1, "jsonrpc": "2.0", "result": result }).to_string())
}

/// JSON-RPC reply carrying an application error.
pub fn rpc_err(code: i64, message: &str) -> (u16, String) {
    (
        200,
        json!({ "id": 1, "jsonrpc": "2.0", "result": null, "error": { "code": code, "message": message } }).to_string(),
    )
}

/// `getBaasSdkConf` reply.
pub fn chain_conf(chain_id: u64) -> (u16, String) {
    (200, json!({ "code": 0, "msg": "", "data": { "chainid": chain_id } }).to_string())
}

/// Resolver pinning [`GATEWAY_HOST`] to loopback.
pub fn loopback_resolver() -> Arc<StaticResolver> {
    Arc::new(StaticResolver::new(vec![IpAddr::V4(Ipv4Addr::LOCALHOST)]))
}

pub fn credential() -> AuthCredential {
    AuthCredential::new("1", "sdk-test", "secret-test")
}

/// Config pointing at `gateway` over plain HTTP, with a complete credential.
pub fn sdk_config(gateway: &MockGateway) -> SdkConfig {
    let mut config = SdkConfig::default();
    config.gateway.host = GATEWAY_HOST.to_string();
    config.gateway.protocol = "http".to_string();
    config.gateway.port = Some(gateway.port());
    config.gateway.connect_timeout_secs = 2;
    config.gateway.response_timeout_secs = 5;
    config.auth = credential();
    config
}
