//! Transport behavior against a live loopback gateway: retries, endpoint
//! addressing and request authentication.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use baas_sdk::config::{AuthCredential, GatewayConfig};
use baas_sdk::error::TransportError;
use baas_sdk::net::EndpointCache;
use baas_sdk::rpc::{RpcCall, RpcTransport};

use common::{loopback_resolver, rpc_err, rpc_ok, MockGateway, GATEWAY_HOST};

fn gateway_config(port: u16, retry: u32) -> GatewayConfig {
    GatewayConfig {
        host: GATEWAY_HOST.to_string(),
        protocol: "http".to_string(),
        port: Some(port),
        retry,
        connect_timeout_secs: 2,
        response_timeout_secs: 5,
        ..GatewayConfig::default()
    }
}

async fn transport(gateway: &MockGateway, retry: u32, credential: AuthCredential) -> RpcTransport {
    transport_for(gateway_config(gateway.port(), retry), credential).await
}

async fn transport_for(config: GatewayConfig, credential: AuthCredential) -> RpcTransport {
    let endpoint = Arc::new(EndpointCache::new(
        GATEWAY_HOST,
        Duration::from_secs(60),
        Duration::from_millis(0),
        loopback_resolver(),
    ));
    endpoint.refresh().await;
    RpcTransport::new(&config, credential, endpoint).unwrap()
}

fn balance_call() -> RpcCall {
    RpcCall::new(
        "tcapi_getBalance",
        vec!["0x00000000000000000000000000000000000000aa".into(), "latest".into()],
    )
}

#[tokio::test]
async fn test_recovers_after_one_failure() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let gateway = MockGateway::start(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            (503, "unavailable".to_string())
        } else {
            rpc_ok(json!("0x10"))
        }
    })
    .await;

    let transport = transport(&gateway, 2, common::credential()).await;
    let response = transport.call(&balance_call()).await.unwrap();

    assert_eq!(response.result, json!("0x10"));
    assert_eq!(gateway.count("getBalance"), 2);
}

#[tokio::test]
async fn test_gives_up_after_attempt_budget() {
    let gateway = MockGateway::start(|_| (500, "boom".to_string())).await;

    let transport = transport(&gateway, 2, common::credential()).await;
    let err = transport.call(&balance_call()).await.unwrap_err();

    assert!(matches!(err, TransportError::Status { status: 500, .. }), "got {:?}", err);
    assert_eq!(gateway.count("getBalance"), 2);
}

#[tokio::test]
async fn test_attempt_budget_follows_config() {
    let gateway = MockGateway::start(|_| (502, String::new())).await;

    let transport = transport(&gateway, 3, common::credential()).await;
    assert!(transport.call(&balance_call()).await.is_err());
    assert_eq!(gateway.count("getBalance"), 3);
}

#[tokio::test]
async fn test_empty_body_is_retried() {
    let gateway = MockGateway::start(|_| (200, String::new())).await;

    let transport = transport(&gateway, 2, common::credential()).await;
    let err = transport.call(&balance_call()).await.unwrap_err();

    assert!(matches!(err, TransportError::EmptyBody { .. }), "got {:?}", err);
    assert_eq!(gateway.count("getBalance"), 2);
}

#[tokio::test]
async fn test_application_error_is_not_retried() {
    let gateway = MockGateway::start(|_| rpc_err(-32000, "insufficient funds")).await;

    let transport = transport(&gateway, 3, common::credential()).await;
    let response = transport.call(&balance_call()).await.unwrap();

    let err = response.error().unwrap();
    assert_eq!(err.code, -32000);
    assert_eq!(err.message, "insufficient funds");
    assert_eq!(gateway.count("getBalance"), 1);
}

#[tokio::test]
async fn test_malformed_reply_is_not_retried() {
    let gateway = MockGateway::start(|_| (200, "{not json".to_string())).await;

    let transport = transport(&gateway, 3, common::credential()).await;
    let err = transport.call(&balance_call()).await.unwrap_err();

    assert!(matches!(err, TransportError::Decode(_)), "got {:?}", err);
    assert_eq!(gateway.count("getBalance"), 1);
}

#[tokio::test]
async fn test_request_addressing() {
    let gateway = MockGateway::start(|_| rpc_ok(json!(null))).await;

    let transport = transport(&gateway, 2, common::credential()).await;
    let from = "0x00000000000000000000000000000000000000aa";
    transport.call(&balance_call().with_from(from)).await.unwrap();

    let request = &gateway.requests()[0];
    assert_eq!(request.path, "/getBalance");
    assert_eq!(request.header("host"), Some(GATEWAY_HOST));
    assert_eq!(request.query.as_deref(), Some(format!("from={}", from).as_str()));
    assert_eq!(request.body["method"], "tcapi_getBalance");
    assert_eq!(request.body["jsonrpc"], "2.0");
    assert_eq!(request.body["params"], json!([from, "latest"]));
}

#[tokio::test]
async fn test_retries_resend_identical_payload() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let gateway = MockGateway::start(move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            (503, String::new())
        } else {
            rpc_ok(json!("0x0"))
        }
    })
    .await;

    let transport = transport(&gateway, 2, common::credential()).await;
    transport.call(&balance_call()).await.unwrap();

    let requests = gateway.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
}

#[tokio::test]
async fn test_auth_token_attached_with_complete_credential() {
    let gateway = MockGateway::start(|_| rpc_ok(json!("0x0"))).await;

    let transport = transport(&gateway, 2, common::credential()).await;
    transport.call(&balance_call()).await.unwrap();

    let auth = &gateway.requests()[0].body["auth"];
    assert_eq!(auth["chainid"], "1");
    assert_eq!(auth["sdkid"], "sdk-test");
    assert_eq!(auth["rand"].as_str().unwrap().len(), 16);
    let sign = auth["sign"].as_str().unwrap();
    assert_eq!(sign.len(), 32);
    assert!(sign.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(!gateway.requests()[0].body.to_string().contains("secret-test"));
}

#[tokio::test]
async fn test_no_auth_token_without_credential() {
    let gateway = MockGateway::start(|_| rpc_ok(json!("0x0"))).await;

    let partial = AuthCredential::new("1", "sdk-test", "");
    let transport = transport(&gateway, 2, partial).await;
    transport.call(&balance_call()).await.unwrap();

    assert!(gateway.requests()[0].body.get("auth").is_none());
}

#[tokio::test]
async fn test_dials_cached_address() {
    let gateway = MockGateway::start(|_| rpc_ok(json!("0x0"))).await;

    let transport = transport(&gateway, 2, common::credential()).await;
    let url = transport.url_for("getBalance", None).unwrap();

    assert_eq!(url.host_str(), Some("127.0.0.1"));
    assert_eq!(url.port(), Some(gateway.port()));
}

#[tokio::test]
async fn test_response_deadline_covers_body() {
    // Headers arrive at once; the promised body never does.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let _ = stream.read(&mut buf).await;
        let head = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 64\r\n\r\n{";
        stream.write_all(head.as_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(stream);
    });

    let config = GatewayConfig {
        response_timeout_secs: 1,
        ..gateway_config(port, 1)
    };
    let transport = transport_for(config, common::credential()).await;

    let started = Instant::now();
    let err = transport.call(&balance_call()).await.unwrap_err();

    match err {
        TransportError::Http { source, .. } => assert!(source.is_timeout(), "got {:?}", source),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

