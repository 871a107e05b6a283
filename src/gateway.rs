//! HTTP request gateway.
//!
//! Accepts concurrent POST requests, extracts the outgoing text, hands it
//! to the bridge runtime, and renders the outcome as a plain-text response.

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::bridge::BridgeHandle;
use crate::error::Result;

/// Default bound on how long a request waits for its BLE write.
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP front end feeding the bridge runtime.
///
/// Requests are handled independently; the only ordering between two racing
/// writes is whichever reaches the bridge's job channel first.
pub struct Gateway {
    /// Handle into the bridge runtime.
    bridge: BridgeHandle,
    /// Per-request bound on the bridge reply.
    reply_timeout: Duration,
}

impl Gateway {
    /// Create a gateway with the default reply timeout.
    pub fn new(bridge: BridgeHandle) -> Self {
        Self {
            bridge,
            reply_timeout: REPLY_TIMEOUT,
        }
    }

    /// Override the per-request reply timeout.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Serve connections from `listener` indefinitely.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!("Listening on http://{}", addr);
        }

        let gateway = Arc::new(self);

        loop {
            let (stream, _addr) = match listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            let gateway = gateway.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let builder =
                    hyper_util::server::conn::auto::Builder::new(TokioExecutor::new());

                let service = hyper::service::service_fn(move |req| {
                    let gateway = gateway.clone();
                    async move { gateway.handle(req).await }
                });

                if let Err(e) = builder.serve_connection(io, service).await {
                    debug!("Connection error: {:?}", e);
                }
            });
        }
    }

    /// Handle one request end to end.
    async fn handle(
        self: Arc<Self>,
        req: Request<Incoming>,
    ) -> std::result::Result<Response<Full<Bytes>>, hyper::Error> {
        if req.method() != Method::POST {
            return Ok(plain_response(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
            ));
        }

        let raw = req.into_body().collect().await?.to_bytes();
        let text = extract_text(&raw);

        if text.is_empty() {
            return Ok(plain_response(StatusCode::BAD_REQUEST, "Missing text"));
        }

        debug!("Submitting {} bytes to the bridge", text.len());

        // The submit blocks its thread for up to the reply timeout, so it
        // runs on the blocking pool rather than pinning a runtime worker.
        let bridge = self.bridge.clone();
        let timeout = self.reply_timeout;
        let outcome = tokio::task::spawn_blocking(move || bridge.submit(text, timeout)).await;

        let response = match outcome {
            Ok(Ok(())) => plain_response(StatusCode::OK, "OK"),
            Ok(Err(e)) => {
                plain_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("ERR: {e}"))
            }
            Err(e) => plain_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("ERR: {e}")),
        };

        Ok(response)
    }
}

/// Pull the outgoing text from a request body.
///
/// A body that parses as a JSON object contributes its `text` string field;
/// anything else is decoded as UTF-8 with lossy replacement. An empty body
/// yields empty text.
fn extract_text(raw: &[u8]) -> String {
    if raw.is_empty() {
        return String::new();
    }

    match serde_json::from_slice::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(fields)) => fields
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        _ => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Plain-text response with explicit content type and length.
fn plain_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::copy_from_slice(body.as_bytes())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(
        hyper::header::CONTENT_LENGTH,
        hyper::header::HeaderValue::from(body.len()),
    );
    response
}
