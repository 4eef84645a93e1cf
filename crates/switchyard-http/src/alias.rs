//! Alias store adapter.

use std::collections::HashMap;
use std::time::Duration;

use http::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use switchyard_core::Version;
use switchyard_platform::{AliasStore, PlatformError, PlatformResult};

use crate::client::{authority_of, request, status_error};

/// Wire shape of an alias document.
#[derive(Debug, Serialize, Deserialize)]
struct AliasDoc {
    version: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    weights: HashMap<String, f64>,
}

/// [`AliasStore`] over the control-plane API, scoped to one service.
#[derive(Debug, Clone)]
pub struct HttpAliasStore {
    authority: String,
    service_id: String,
    timeout: Duration,
}

impl HttpAliasStore {
    pub fn new(endpoint: &str, service_id: &str) -> Self {
        Self {
            authority: authority_of(endpoint),
            service_id: service_id.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn alias_path(&self, alias: &str) -> String {
        format!("/services/{}/aliases/{alias}", self.service_id)
    }

    async fn put_routing(&self, alias: &str, doc: &AliasDoc) -> PlatformResult<()> {
        let body = serde_json::to_vec(doc)
            .map_err(|e| PlatformError::Fatal(format!("encode alias {alias}: {e}")))?;
        let (status, bytes) = request(
            &self.authority,
            Method::PUT,
            &self.alias_path(alias),
            Some(body),
            self.timeout,
        )
        .await?;

        if status.is_success() {
            debug!(
                service = %self.service_id,
                alias,
                version = %doc.version,
                secondaries = doc.weights.len(),
                "alias routing replaced"
            );
            Ok(())
        } else {
            Err(status_error(status, &bytes, &format!("alias {alias}")))
        }
    }
}

impl AliasStore for HttpAliasStore {
    async fn get_version(&self, alias: &str) -> PlatformResult<Version> {
        let (status, bytes) = request(
            &self.authority,
            Method::GET,
            &self.alias_path(alias),
            None,
            self.timeout,
        )
        .await?;

        if !status.is_success() {
            return Err(status_error(status, &bytes, &format!("alias {alias}")));
        }

        let doc: AliasDoc = serde_json::from_slice(&bytes)
            .map_err(|e| PlatformError::Fatal(format!("malformed alias {alias}: {e}")))?;
        Ok(doc.version)
    }

    async fn set_weighted(
        &self,
        alias: &str,
        primary: &Version,
        secondary: &HashMap<Version, f64>,
    ) -> PlatformResult<()> {
        self.put_routing(
            alias,
            &AliasDoc {
                version: primary.clone(),
                weights: secondary.clone(),
            },
        )
        .await
    }

    async fn set_single(&self, alias: &str, version: &Version) -> PlatformResult<()> {
        self.put_routing(
            alias,
            &AliasDoc {
                version: version.clone(),
                weights: HashMap::new(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::service::service_fn;

    /// Serve one request with a canned response on an ephemeral port.
    async fn one_shot_server(
        status: u16,
        body: &'static str,
    ) -> std::net::SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let io = hyper_util::rt::TokioIo::new(stream);
            let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| async move {
                // Drain the request body before answering.
                let _ = req.into_body().collect().await;
                Ok::<_, std::convert::Infallible>(
                    hyper::Response::builder()
                        .status(status)
                        .body(http_body_util::Full::new(bytes::Bytes::from_static(
                            body.as_bytes(),
                        )))
                        .unwrap(),
                )
            });
            let _ = hyper::server::conn::http1::Builder::new()
                .serve_connection(io, service)
                .await;
        });
        addr
    }

    #[tokio::test]
    async fn get_version_parses_alias_doc() {
        let addr = one_shot_server(200, r#"{"version":"v41"}"#).await;
        let store = HttpAliasStore::new(&format!("http://{addr}"), "checkout-api");
        assert_eq!(store.get_version("baseline").await.unwrap(), "v41");
    }

    #[tokio::test]
    async fn get_version_maps_404_to_not_found() {
        let addr = one_shot_server(404, "no such alias").await;
        let store = HttpAliasStore::new(&format!("http://{addr}"), "checkout-api");
        assert!(matches!(
            store.get_version("baseline").await,
            Err(PlatformError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn set_weighted_maps_409_to_conflict() {
        let addr = one_shot_server(409, "revision moved").await;
        let store = HttpAliasStore::new(&format!("http://{addr}"), "checkout-api");
        let mut weights = HashMap::new();
        weights.insert("v42".to_string(), 0.1);
        let result = store
            .set_weighted("live", &"v41".to_string(), &weights)
            .await;
        assert!(matches!(result, Err(PlatformError::Conflict(_))));
    }

    #[tokio::test]
    async fn set_single_maps_5xx_to_transient() {
        let addr = one_shot_server(503, "maintenance").await;
        let store = HttpAliasStore::new(&format!("http://{addr}"), "checkout-api");
        let result = store.set_single("live", &"v41".to_string()).await;
        assert!(matches!(result, Err(PlatformError::Transient(_))));
    }

    #[test]
    fn alias_doc_omits_empty_weights() {
        let doc = AliasDoc {
            version: "v41".to_string(),
            weights: HashMap::new(),
        };
        assert_eq!(serde_json::to_string(&doc).unwrap(), r#"{"version":"v41"}"#);
    }
}
