//! Switchyard HTTP adapters.
//!
//! Implements the platform collaborator traits against a JSON
//! control-plane API:
//!
//! - `GET  /services/{svc}/aliases/{alias}` — resolve an alias
//! - `PUT  /services/{svc}/aliases/{alias}` — replace alias routing
//! - `GET  /services/{svc}/versions/{v}/errors?window={secs}` — error
//!   counts over a trailing window
//!
//! Each request opens its own connection (TCP connect + http1
//! handshake) under a timeout; connection-level failures and 5xx
//! responses map to `PlatformError::Transient` so callers' retry
//! policies apply.
//!
//! # Components
//!
//! - **`client`** — One-shot JSON request helper and status mapping
//! - **`alias`** — `HttpAliasStore`
//! - **`metrics`** — `HttpMetricsProvider`

pub mod alias;
mod client;
pub mod metrics;

pub use alias::HttpAliasStore;
pub use metrics::HttpMetricsProvider;
