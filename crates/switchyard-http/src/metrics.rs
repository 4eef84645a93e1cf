//! Metrics provider adapter.

use std::time::Duration;

use http::{Method, StatusCode};
use serde::Deserialize;
use tracing::debug;

use switchyard_core::{epoch_secs, HealthSample, Version};
use switchyard_platform::{MetricsProvider, PlatformError, PlatformResult};

use crate::client::{authority_of, request};

/// Wire shape of an error-count document.
#[derive(Debug, Deserialize)]
struct ErrorsDoc {
    error_count: u64,
    #[serde(default)]
    window_start: u64,
    #[serde(default)]
    window_end: u64,
}

/// [`MetricsProvider`] over the control-plane API, scoped to one
/// service.
#[derive(Debug, Clone)]
pub struct HttpMetricsProvider {
    authority: String,
    service_id: String,
    timeout: Duration,
}

impl HttpMetricsProvider {
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
}

impl MetricsProvider for HttpMetricsProvider {
    async fn error_count(
        &self,
        version: &Version,
        window_seconds: u64,
    ) -> PlatformResult<HealthSample> {
        let path = format!(
            "/services/{}/versions/{version}/errors?window={window_seconds}",
            self.service_id
        );
        let (status, bytes) =
            request(&self.authority, Method::GET, &path, None, self.timeout).await?;

        // No recorded data for this version is a clean zero, not an
        // error condition.
        if status == StatusCode::NOT_FOUND {
            let now = epoch_secs();
            debug!(
                service = %self.service_id,
                %version,
                "no metric data recorded, treating as zero errors"
            );
            return Ok(HealthSample {
                version: version.clone(),
                window_start: now.saturating_sub(window_seconds),
                window_end: now,
                error_count: 0,
            });
        }

        if !status.is_success() {
            return Err(PlatformError::Transient(format!(
                "metrics query for {version}: {status}"
            )));
        }

        let doc: ErrorsDoc = serde_json::from_slice(&bytes).map_err(|e| {
            PlatformError::Transient(format!("malformed metrics for {version}: {e}"))
        })?;

        let now = epoch_secs();
        Ok(HealthSample {
            version: version.clone(),
            window_start: if doc.window_start > 0 {
                doc.window_start
            } else {
                now.saturating_sub(window_seconds)
            },
            window_end: if doc.window_end > 0 { doc.window_end } else { now },
            error_count: doc.error_count,
        })
    }
}
