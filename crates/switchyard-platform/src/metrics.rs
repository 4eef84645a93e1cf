//! Metrics provider interface.

use switchyard_core::{HealthSample, Version};

use crate::error::PlatformResult;

/// Read-only error-count queries against the observability system.
pub trait MetricsProvider {
    /// How many failures `version` produced over the most recent
    /// `window_seconds`.
    ///
    /// Implementations must report a missing or absent metric as a
    /// sample with `error_count = 0`: a version that has recorded no
    /// errors is healthy, not unknown. Query failures surface as
    /// `PlatformError::Transient`.
    fn error_count(
        &self,
        version: &Version,
        window_seconds: u64,
    ) -> impl std::future::Future<Output = PlatformResult<HealthSample>> + Send;
}
