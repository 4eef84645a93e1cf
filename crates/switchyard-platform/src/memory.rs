//! In-memory alias store.
//!
//! Backs local runs and tests. Enforces the weighted-routing invariant
//! (secondary weights each in `[0, 1)`, summing to under 1) and
//! supports injecting failures ahead of write operations so callers
//! can exercise their retry and rollback paths.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use switchyard_core::Version;

use crate::alias::{AliasStore, AliasTarget};
use crate::error::{PlatformError, PlatformResult};

#[derive(Debug, Default)]
struct Inner {
    aliases: HashMap<String, AliasTarget>,
    /// Errors returned by upcoming write operations, in order.
    write_failures: VecDeque<PlatformError>,
    /// Errors keyed by write-attempt ordinal (1-based).
    scheduled_failures: HashMap<u64, PlatformError>,
    attempts: u64,
    writes: u64,
}

/// Thread-safe in-memory implementation of [`AliasStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAliasStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryAliasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an alias, builder style.
    pub fn with_alias(self, alias: &str, version: &str) -> Self {
        self.inner
            .lock()
            .expect("alias store lock poisoned")
            .aliases
            .insert(alias.to_string(), AliasTarget::single(version));
        self
    }

    /// Queue an error for the next write operation. Multiple queued
    /// errors are consumed one per write, in order.
    pub fn fail_next_write(&self, err: PlatformError) {
        self.inner
            .lock()
            .expect("alias store lock poisoned")
            .write_failures
            .push_back(err);
    }

    /// Queue an error for the `n`th write attempt (1-based), counting
    /// every attempt whether or not it succeeds. Lets a test place a
    /// failure at an exact point in a longer write sequence.
    pub fn fail_nth_write(&self, n: u64, err: PlatformError) {
        self.inner
            .lock()
            .expect("alias store lock poisoned")
            .scheduled_failures
            .insert(n, err);
    }

    /// Current routing state of an alias, if it exists.
    pub fn target(&self, alias: &str) -> Option<AliasTarget> {
        self.inner
            .lock()
            .expect("alias store lock poisoned")
            .aliases
            .get(alias)
            .cloned()
    }

    /// Number of write operations accepted so far.
    pub fn write_count(&self) -> u64 {
        self.inner.lock().expect("alias store lock poisoned").writes
    }

    fn write(&self, alias: &str, target: AliasTarget) -> PlatformResult<()> {
        let mut inner = self.inner.lock().expect("alias store lock poisoned");
        inner.attempts += 1;
        let attempt = inner.attempts;
        if let Some(err) = inner.scheduled_failures.remove(&attempt) {
            return Err(err);
        }
        if let Some(err) = inner.write_failures.pop_front() {
            return Err(err);
        }

        let total: f64 = target.weights.values().sum();
        if total >= 1.0 || target.weights.values().any(|w| *w < 0.0 || *w >= 1.0) {
            return Err(PlatformError::Fatal(format!(
                "invalid routing weights for alias {alias}: sum {total}"
            )));
        }

        inner.aliases.insert(alias.to_string(), target);
        inner.writes += 1;
        Ok(())
    }
}

impl AliasStore for MemoryAliasStore {
    async fn get_version(&self, alias: &str) -> PlatformResult<Version> {
        self.inner
            .lock()
            .expect("alias store lock poisoned")
            .aliases
            .get(alias)
            .map(|t| t.version.clone())
            .ok_or_else(|| PlatformError::NotFound(alias.to_string()))
    }

    async fn set_weighted(
        &self,
        alias: &str,
        primary: &Version,
        secondary: &HashMap<Version, f64>,
    ) -> PlatformResult<()> {
        self.write(
            alias,
            AliasTarget {
                version: primary.clone(),
                weights: secondary.clone(),
            },
        )
    }

    async fn set_single(&self, alias: &str, version: &Version) -> PlatformResult<()> {
        self.write(alias, AliasTarget::single(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_version_resolves_primary() {
        let store = MemoryAliasStore::new().with_alias("baseline", "v41");
        assert_eq!(store.get_version("baseline").await.unwrap(), "v41");
    }

    #[tokio::test]
    async fn missing_alias_is_not_found() {
        let store = MemoryAliasStore::new();
        assert!(matches!(
            store.get_version("live").await,
            Err(PlatformError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn set_weighted_replaces_routing() {
        let store = MemoryAliasStore::new().with_alias("live", "v41");
        let mut weights = HashMap::new();
        weights.insert("v42".to_string(), 0.25);
        store
            .set_weighted("live", &"v41".to_string(), &weights)
            .await
            .unwrap();

        let target = store.target("live").unwrap();
        assert_eq!(target.version, "v41");
        assert_eq!(target.share_of("v42"), 0.25);
    }

    #[tokio::test]
    async fn set_single_clears_weights() {
        let store = MemoryAliasStore::new();
        let mut weights = HashMap::new();
        weights.insert("v42".to_string(), 0.5);
        store
            .set_weighted("live", &"v41".to_string(), &weights)
            .await
            .unwrap();

        store.set_single("live", &"v41".to_string()).await.unwrap();
        let target = store.target("live").unwrap();
        assert!(target.weights.is_empty());
        assert_eq!(target.share_of("v41"), 1.0);
    }

    #[tokio::test]
    async fn rejects_weights_summing_to_one_or_more() {
        let store = MemoryAliasStore::new();
        let mut weights = HashMap::new();
        weights.insert("v42".to_string(), 1.0);
        let result = store.set_weighted("live", &"v41".to_string(), &weights).await;
        assert!(matches!(result, Err(PlatformError::Fatal(_))));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let store = MemoryAliasStore::new();
        store.fail_next_write(PlatformError::Transient("blip".into()));
        store.fail_next_write(PlatformError::Conflict("moved".into()));

        let v = "v42".to_string();
        assert!(matches!(
            store.set_single("live", &v).await,
            Err(PlatformError::Transient(_))
        ));
        assert!(matches!(
            store.set_single("live", &v).await,
            Err(PlatformError::Conflict(_))
        ));
        store.set_single("live", &v).await.unwrap();
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn scheduled_failure_hits_exact_attempt() {
        let store = MemoryAliasStore::new();
        store.fail_nth_write(2, PlatformError::Transient("blip".into()));

        let v = "v42".to_string();
        store.set_single("live", &v).await.unwrap();
        assert!(matches!(
            store.set_single("live", &v).await,
            Err(PlatformError::Transient(_))
        ));
        store.set_single("live", &v).await.unwrap();
        assert_eq!(store.write_count(), 2);
    }
}
