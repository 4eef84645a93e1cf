//! One-shot HTTP request plumbing shared by the adapters.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use tracing::debug;

use switchyard_platform::PlatformError;

/// Strip the scheme and any trailing slash from a control-plane
/// endpoint, leaving the `host:port` authority.
pub(crate) fn authority_of(endpoint: &str) -> String {
    let trimmed = endpoint.strip_prefix("http://").unwrap_or(endpoint);
    trimmed.trim_end_matches('/').to_string()
}

/// Send one request and collect the response.
///
/// Opens a fresh connection per call. Connect, handshake, send, and
/// body-collection failures — and the overall timeout — all map to
/// `Transient`, since a later attempt against a recovered control
/// plane may succeed.
pub(crate) async fn request(
    authority: &str,
    method: Method,
    path_and_query: &str,
    body: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<(StatusCode, Bytes), PlatformError> {
    let uri = format!("http://{authority}{path_and_query}");

    let attempt = tokio::time::timeout(timeout, async {
        let stream = tokio::net::TcpStream::connect(authority)
            .await
            .map_err(|e| PlatformError::Transient(format!("connect {authority}: {e}")))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| PlatformError::Transient(format!("handshake {authority}: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(&uri)
            .header("host", authority)
            .header("user-agent", "switchyard/0.1");
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| PlatformError::Fatal(format!("build request {uri}: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| PlatformError::Transient(format!("send {uri}: {e}")))?;

        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| PlatformError::Transient(format!("read body {uri}: {e}")))?
            .to_bytes();

        debug!(%uri, status = %status, "control plane responded");
        Ok((status, bytes))
    })
    .await;

    match attempt {
        Ok(result) => result,
        Err(_) => Err(PlatformError::Transient(format!("timed out: {uri}"))),
    }
}

/// Map a non-success control-plane status to a platform error.
pub(crate) fn status_error(status: StatusCode, body: &Bytes, what: &str) -> PlatformError {
    let detail = String::from_utf8_lossy(body);
    let detail = detail.trim();
    match status {
        StatusCode::NOT_FOUND => PlatformError::NotFound(what.to_string()),
        StatusCode::CONFLICT => PlatformError::Conflict(format!("{what}: {detail}")),
        s if s.is_server_error() => {
            PlatformError::Transient(format!("{what}: {s} {detail}"))
        }
        s => PlatformError::Fatal(format!("{what}: {s} {detail}")),
    }
}
