//! HTTP transport for gateway calls.
//!
//! # Responsibilities
//! - Build the JSON-RPC envelope and attach the auth token
//! - POST to the cached gateway address with the logical `Host` header
//! - Retry transport failures across endpoint refreshes
//!
//! # Invariants
//! - The payload is built and signed once; retries re-send the same bytes
//! - Application errors (`error.code != 0`) are returned on the first attempt
//! - Malformed JSON is a protocol error and is not retried

use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderValue, CONTENT_TYPE, HOST};
use serde_json::Value;
use url::Url;

use crate::config::{AuthCredential, GatewayConfig};
use crate::error::TransportError;
use crate::net::EndpointCache;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::rpc::auth::AuthSigner;
use crate::rpc::types::{RpcRequest, RpcResponse};

/// One logical gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcCall {
    /// Namespaced method, e.g. `tcapi_getBalance`.
    pub method: String,
    pub params: Value,
    /// Strings the auth signature covers. Usually the same as `params`.
    pub auth_params: Vec<String>,
    pub extension: Option<Value>,
    /// Routing hint sent as the `from` query parameter.
    pub from: Option<String>,
}

impl RpcCall {
    /// Call whose params are a list of strings, signed over those same strings.
    pub fn new(method: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            method: method.into(),
            params: Value::from(params.clone()),
            auth_params: params,
            extension: None,
            from: None,
        }
    }

    /// Call sending structured `params` but signed over `auth_params`.
    pub fn structured(method: impl Into<String>, params: Value, auth_params: Vec<String>) -> Self {
        Self {
            method: method.into(),
            params,
            auth_params,
            extension: None,
            from: None,
        }
    }

    pub fn with_extension(mut self, extension: Value) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// HTTP path segment: the method name after the namespace.
    pub fn verb(&self) -> &str {
        match self.method.split_once('_') {
            Some((_, verb)) => verb,
            None => &self.method,
        }
    }
}

/// Authenticated, retrying JSON-RPC client for the gateway.
pub struct RpcTransport {
    http: reqwest::Client,
    protocol: String,
    port: Option<u16>,
    signer: AuthSigner,
    endpoint: Arc<EndpointCache>,
    policy: RetryPolicy,
}

impl RpcTransport {
    pub fn new(
        config: &GatewayConfig,
        credential: AuthCredential,
        endpoint: Arc<EndpointCache>,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(config.connect_timeout())
            .timeout(config.response_timeout())
            .pool_idle_timeout(config.idle_timeout())
            .pool_max_idle_per_host(config.max_idle_connections)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(TransportError::Client)?;

        let signer = AuthSigner::new(credential);
        if !signer.is_enabled() {
            tracing::warn!(host = %endpoint.hostname(), "No gateway credential, calls are sent unsigned");
        }

        Ok(Self {
            http,
            protocol: config.protocol.clone(),
            port: config.port,
            signer,
            endpoint,
            policy: RetryPolicy::from_config(config),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn endpoint(&self) -> &Arc<EndpointCache> {
        &self.endpoint
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// URL for `verb` at the currently cached address.
    pub fn url_for(&self, verb: &str, from: Option<&str>) -> Result<Url, TransportError> {
        let host = self.endpoint.get_address();
        let raw = match self.port {
            Some(port) => format!("{}://{}:{}/{}", self.protocol, host, port, verb),
            None => format!("{}://{}/{}", self.protocol, host, verb),
        };
        let mut url = Url::parse(&raw).map_err(|e| TransportError::Url {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if let Some(from) = from.filter(|from| !from.is_empty()) {
            url.query_pairs_mut().append_pair("from", from);
        }
        Ok(url)
    }

    /// Send `call` and decode the JSON-RPC reply.
    ///
    /// An application error in the reply is not an `Err` here; inspect
    /// [`RpcResponse::error`].
    pub async fn call(&self, call: &RpcCall) -> Result<RpcResponse, TransportError> {
        let body = self.call_raw(call).await?;
        let response: RpcResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(method = %call.method, error = %e, "Malformed gateway reply");
            metrics::record_rpc_request(&call.method, "decode_error");
            TransportError::Decode(e)
        })?;

        match response.error() {
            Some(err) => {
                tracing::warn!(method = %call.method, code = err.code, message = %err.message, "Gateway returned error");
                metrics::record_rpc_request(&call.method, "rpc_error");
            }
            None => metrics::record_rpc_request(&call.method, "ok"),
        }
        Ok(response)
    }

    /// Send `call` and return the raw reply body.
    pub async fn call_raw(&self, call: &RpcCall) -> Result<Vec<u8>, TransportError> {
        let mut request = RpcRequest::new(call.method.clone(), call.params.clone());
        request.auth = self.signer.sign(&call.auth_params);
        request.extension = call.extension.clone();
        let body = serde_json::to_vec(&request).map_err(TransportError::Encode)?;

        let started = Instant::now();
        let verb = call.verb();
        let from = call.from.as_deref();
        let payload = body.as_slice();
        let endpoint = &self.endpoint;
        let method = call.method.as_str();

        let result = self
            .policy
            .run(
                |attempt| {
                    tracing::debug!(method, attempt, "Posting rpc call");
                    self.post_once(verb, from, payload)
                },
                |attempt, err: &TransportError| {
                    tracing::warn!(method, attempt, error = %err, "Rpc transport failure, refreshing endpoint");
                    metrics::record_rpc_retry(method);
                    async move {
                        endpoint.force_refresh().await;
                    }
                },
            )
            .await;

        match &result {
            Ok(reply) => tracing::debug!(
                method,
                bytes = reply.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Rpc call completed"
            ),
            Err(e) => {
                tracing::error!(method, error = %e, "Rpc call failed");
                metrics::record_rpc_request(method, "transport_error");
            }
        }
        result
    }

    async fn post_once(&self, verb: &str, from: Option<&str>, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let url = self.url_for(verb, from)?;
        let url_text = url.to_string();
        let host = HeaderValue::from_str(self.endpoint.hostname()).map_err(|e| TransportError::Url {
            url: url_text.clone(),
            reason: e.to_string(),
        })?;

        let response = self
            .http
            .post(url)
            .header(HOST, host)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|source| TransportError::Http { url: url_text.clone(), source })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| TransportError::Http { url: url_text.clone(), source })?;

        if status != reqwest::StatusCode::OK {
            return Err(TransportError::Status { url: url_text, status: status.as_u16() });
        }
        if bytes.is_empty() {
            return Err(TransportError::EmptyBody { url: url_text });
        }
        Ok(bytes.to_vec())
    }
}

impl std::fmt::Debug for RpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransport")
            .field("protocol", &self.protocol)
            .field("port", &self.port)
            .field("endpoint", &self.endpoint)
            .field("policy", &self.policy)
            .finish()
    }
}
