//! Retry decorator for document backends
//!
//! Transient backend failures (network hiccups, timeouts) are retried here,
//! at the adapter layer — the store core never retries. Every operation the
//! trait exposes is an idempotent upsert/delete/read, so re-issuing a failed
//! call converges to the same end state.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use crate::document::Document;
use crate::error::{BackendError, BackendResult};
use crate::DocumentBackend;

/// Attempt-count and inter-attempt delay for [`Retrying`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the initial failed attempt
    pub max_retries: u32,
    /// Delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 10,
            delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// A backend decorator retrying failed operations per a [`RetryPolicy`]
#[derive(Debug, Clone)]
pub struct Retrying<B> {
    inner: B,
    policy: RetryPolicy,
}

impl<B> Retrying<B> {
    /// Wrap a backend with the given policy
    pub fn new(inner: B, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped backend
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Sleep before the next attempt, or give up with `err` once the
    /// attempt budget is spent. Returns the incremented attempt count.
    async fn backoff(&self, attempt: u32, op: &str, err: BackendError) -> BackendResult<u32> {
        if attempt >= self.policy.max_retries {
            return Err(err);
        }
        debug!(op, attempt = attempt + 1, %err, "retrying backend operation");
        sleep(self.policy.delay).await;
        Ok(attempt + 1)
    }
}

#[async_trait]
impl<B: DocumentBackend> DocumentBackend for Retrying<B> {
    async fn get(&self, table: &str, key: &str) -> BackendResult<Option<Document>> {
        let mut attempt = 0;
        loop {
            match self.inner.get(table, key).await {
                Ok(found) => return Ok(found),
                Err(err) => attempt = self.backoff(attempt, "get", err).await?,
            }
        }
    }

    async fn put(&self, table: &str, document: Document, merge: bool) -> BackendResult<()> {
        let mut attempt = 0;
        loop {
            match self.inner.put(table, document.clone(), merge).await {
                Ok(()) => return Ok(()),
                Err(err) => attempt = self.backoff(attempt, "put", err).await?,
            }
        }
    }

    async fn delete(&self, table: &str, key: &str) -> BackendResult<()> {
        let mut attempt = 0;
        loop {
            match self.inner.delete(table, key).await {
                Ok(()) => return Ok(()),
                Err(err) => attempt = self.backoff(attempt, "delete", err).await?,
            }
        }
    }

    async fn delete_where_session(
        &self,
        table: &str,
        session: &str,
        exclude_key: Option<&str>,
    ) -> BackendResult<()> {
        let mut attempt = 0;
        loop {
            match self
                .inner
                .delete_where_session(table, session, exclude_key)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) => {
                    attempt = self
                        .backoff(attempt, "delete_where_session", err)
                        .await?
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use crate::memory::MemoryBackend;
    use serde_json::json;

    /// A backend that fails its first `failures` calls, then delegates
    #[derive(Clone)]
    struct Flaky {
        inner: MemoryBackend,
        failures: Arc<AtomicU32>,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryBackend::new(),
                failures: Arc::new(AtomicU32::new(failures)),
            }
        }

        fn trip(&self) -> BackendResult<()> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| {
                remaining.checked_sub(1)
            }).is_ok()
            {
                return Err(BackendError::Unavailable("induced failure".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentBackend for Flaky {
        async fn get(&self, table: &str, key: &str) -> BackendResult<Option<Document>> {
            self.trip()?;
            self.inner.get(table, key).await
        }

        async fn put(&self, table: &str, document: Document, merge: bool) -> BackendResult<()> {
            self.trip()?;
            self.inner.put(table, document, merge).await
        }

        async fn delete(&self, table: &str, key: &str) -> BackendResult<()> {
            self.trip()?;
            self.inner.delete(table, key).await
        }

        async fn delete_where_session(
            &self,
            table: &str,
            session: &str,
            exclude_key: Option<&str>,
        ) -> BackendResult<()> {
            self.trip()?;
            self.inner
                .delete_where_session(table, session, exclude_key)
                .await
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let backend = Retrying::new(Flaky::new(2), fast_policy(5));
        backend
            .put("auth", Document::new("k", json!(1), "s"), true)
            .await
            .unwrap();
        assert!(backend.get("auth", "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_gives_up_when_budget_spent() {
        let backend = Retrying::new(Flaky::new(10), fast_policy(2));
        let result = backend.get("auth", "k").await;
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_zero_retries_fails_immediately() {
        let flaky = Flaky::new(1);
        let calls = flaky.failures.clone();
        let backend = Retrying::new(flaky, RetryPolicy::none());
        assert!(backend.get("auth", "k").await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_default_policy_matches_config_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 10);
        assert_eq!(policy.delay, Duration::from_millis(200));
    }
}
