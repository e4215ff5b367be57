//! Process-wide access-token cache with a single-flight discipline.
//!
//! Connectors hitting OAuth-style APIs share one cache instance injected at
//! construction time. The mutex is held across the fetch, so concurrent
//! callers with the same credential key await the one in-flight fetch
//! instead of issuing redundant token requests.

use crate::error::ConnectorError;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::debug;

/// An access token and its optional expiry timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    /// `None` means the token never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }
}

/// Keyed token store. Populated on first need, refreshed on expiry, no
/// explicit teardown.
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: Mutex<HashMap<String, AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token for `key`, fetching a fresh one when absent
    /// or expired. The cache lock is held for the duration of `fetch`.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> Result<AccessToken, ConnectorError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken, ConnectorError>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(token) = entries.get(key) {
            if !token.is_expired_at(Utc::now()) {
                return Ok(token.clone());
            }
            debug!(key, "cached access token expired, refreshing");
        }
        let token = fetch().await?;
        entries.insert(key.to_string(), token.clone());
        Ok(token)
    }

    /// Drop the cached token for `key`, forcing the next caller to fetch.
    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fetcher(
        fetches: &AtomicU32,
        expires_at: Option<DateTime<Utc>>,
    ) -> impl FnOnce() -> std::future::Ready<Result<AccessToken, ConnectorError>> + '_ {
        move || {
            let n = fetches.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(Ok(AccessToken::new(format!("token-{}", n), expires_at)))
        }
    }

    #[tokio::test]
    async fn test_fetches_once_while_valid() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);
        let later = Some(Utc::now() + Duration::hours(1));

        let first = cache.get_or_fetch("wootric", fetcher(&fetches, later)).await.unwrap();
        let second = cache.get_or_fetch("wootric", fetcher(&fetches, later)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_with_one_key_share_one_fetch() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);
        let slow_fetch = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok(AccessToken::new("shared", None))
        };

        let (first, second) = tokio::join!(
            cache.get_or_fetch("api", slow_fetch),
            cache.get_or_fetch("api", slow_fetch),
        );
        assert_eq!(first.unwrap().token, "shared");
        assert_eq!(second.unwrap().token, "shared");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);
        let past = Some(Utc::now() - Duration::minutes(5));

        let first = cache.get_or_fetch("api", fetcher(&fetches, past)).await.unwrap();
        let second = cache.get_or_fetch("api", fetcher(&fetches, None)).await.unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);

        let a = cache.get_or_fetch("a", fetcher(&fetches, None)).await.unwrap();
        let b = cache.get_or_fetch("b", fetcher(&fetches, None)).await.unwrap();
        assert_ne!(a.token, b.token);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_a_fetch() {
        let cache = TokenCache::new();
        let fetches = AtomicU32::new(0);

        cache.get_or_fetch("k", fetcher(&fetches, None)).await.unwrap();
        cache.invalidate("k").await;
        cache.get_or_fetch("k", fetcher(&fetches, None)).await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_expiry_check() {
        let now = Utc::now();
        assert!(!AccessToken::new("t", None).is_expired_at(now));
        assert!(!AccessToken::new("t", Some(now + Duration::seconds(1))).is_expired_at(now));
        assert!(AccessToken::new("t", Some(now)).is_expired_at(now));
    }
}
