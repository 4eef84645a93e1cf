//! Alias store interface.
//!
//! An alias is a named pointer to an immutable version, optionally
//! carrying weighted routing toward secondary versions. The live alias
//! is the only externally shared mutable state the orchestrator
//! touches, and every write is a full replace — never a partial patch
//! — so manual operator intervention and orchestrator writes cannot
//! interleave into a half-applied routing config.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use switchyard_core::Version;

use crate::error::PlatformResult;

/// Routing state of a single alias: a primary version plus weighted
/// secondary versions.
///
/// Invariant: secondary weights each lie in `[0, 1)` and sum to less
/// than 1; the primary implicitly receives the remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTarget {
    pub version: Version,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub weights: HashMap<Version, f64>,
}

impl AliasTarget {
    /// A single-version target with no weighted routing.
    pub fn single(version: &str) -> Self {
        Self {
            version: version.to_string(),
            weights: HashMap::new(),
        }
    }

    /// The traffic fraction currently routed to `version`.
    pub fn share_of(&self, version: &str) -> f64 {
        if let Some(weight) = self.weights.get(version) {
            *weight
        } else if self.version == version {
            1.0 - self.weights.values().sum::<f64>()
        } else {
            0.0
        }
    }
}

/// Named version pointers on the routing platform.
///
/// Writes are externally visible immediately, but reads after writes
/// may lag on an eventually consistent platform — callers thread
/// versions through their own records instead of re-reading.
pub trait AliasStore {
    /// Resolve an alias to its primary version.
    fn get_version(
        &self,
        alias: &str,
    ) -> impl std::future::Future<Output = PlatformResult<Version>> + Send;

    /// Atomically replace an alias's routing with a primary version
    /// plus weighted secondaries.
    fn set_weighted(
        &self,
        alias: &str,
        primary: &Version,
        secondary: &HashMap<Version, f64>,
    ) -> impl std::future::Future<Output = PlatformResult<()>> + Send;

    /// Point an alias at a single version, clearing any weighted
    /// routing. Equivalent to `set_weighted` with no secondaries.
    fn set_single(
        &self,
        alias: &str,
        version: &Version,
    ) -> impl std::future::Future<Output = PlatformResult<()>> + Send;
}
