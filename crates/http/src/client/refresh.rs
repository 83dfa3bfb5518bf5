//! Single-flight access token renewal
//!
//! When several requests fail with 401 at the same time, only the first one
//! starts a refresh. Every later caller joins the pending refresh and sees
//! the same outcome. The coordinator goes back to idle once the refresh
//! settles, whether it succeeded or not, so a later expiry can start a new
//! one.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::ClientError;
use super::token_store::TokenStore;
use crate::types::{RefreshRequest, RefreshResponse};

/// Path of the token refresh endpoint
pub const REFRESH_PATH: &str = "/api/auth/refresh/";

/// Tokens issued by a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshedTokens {
    pub access: String,
    /// Present only when the backend rotates refresh tokens
    pub refresh: Option<String>,
}

/// Exchanges a refresh token for a new access token
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, ClientError>;
}

/// Refresher that calls the backend's refresh endpoint directly, without the
/// bearer header and without going through the retrying client.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    client: reqwest::Client,
    url: String,
    timeout: Option<Duration>,
}

impl HttpTokenRefresher {
    /// `timeout` bounds the refresh call only; `None` inherits the transport default
    pub fn new(client: reqwest::Client, base_url: &str, timeout: Option<Duration>) -> Self {
        Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
            timeout,
        }
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, ClientError> {
        let mut request = self.client.post(&self.url).json(&RefreshRequest {
            refresh: refresh_token.to_string(),
        });
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let body: RefreshResponse = response.json().await?;
        let access = body
            .access
            .filter(|token| !token.is_empty())
            .ok_or(ClientError::MissingTokens("access"))?;

        Ok(RefreshedTokens {
            access,
            refresh: body.refresh.filter(|token| !token.is_empty()),
        })
    }
}

/// Outcome shared by every caller of one refresh
pub type RefreshOutcome = Result<String, Arc<ClientError>>;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

enum RefreshState {
    Idle,
    Refreshing(PendingRefresh),
}

/// Owns the `Idle -> Refreshing -> Idle` state machine
pub struct RefreshCoordinator {
    tokens: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    state: Arc<Mutex<RefreshState>>,
}

impl RefreshCoordinator {
    pub fn new(tokens: Arc<dyn TokenStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        Self {
            tokens,
            refresher,
            state: Arc::new(Mutex::new(RefreshState::Idle)),
        }
    }

    /// Whether a refresh is currently outstanding
    pub fn is_refreshing(&self) -> bool {
        matches!(*lock(&self.state), RefreshState::Refreshing(_))
    }

    /// Obtain a fresh access token, joining the in-flight refresh if there is one.
    ///
    /// On success the new token has already been persisted. On failure both
    /// stored tokens have already been cleared. If every waiter is dropped
    /// mid-refresh, the pending future stays parked in the state until the
    /// next caller joins and drives it to completion.
    pub async fn refresh(&self) -> RefreshOutcome {
        let pending = {
            let mut state = lock(&self.state);
            match &*state {
                RefreshState::Refreshing(pending) => {
                    debug!("Joining in-flight token refresh");
                    pending.clone()
                }
                RefreshState::Idle => {
                    let pending = self.start();
                    *state = RefreshState::Refreshing(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn start(&self) -> PendingRefresh {
        let tokens = Arc::clone(&self.tokens);
        let refresher = Arc::clone(&self.refresher);
        let state = Arc::clone(&self.state);

        async move {
            let outcome = renew(tokens.as_ref(), refresher.as_ref()).await;
            *lock(&state) = RefreshState::Idle;
            outcome
        }
        .boxed()
        .shared()
    }
}

async fn renew(tokens: &dyn TokenStore, refresher: &dyn TokenRefresher) -> RefreshOutcome {
    debug!("Refreshing access token");

    let result = match tokens.refresh() {
        Some(refresh_token) => refresher.refresh(&refresh_token).await,
        None => Err(ClientError::NoRefreshToken),
    };

    match result {
        Ok(fresh) => {
            tokens.set_access(&fresh.access);
            if let Some(rotated) = &fresh.refresh {
                tokens.set_refresh(rotated);
            }
            debug!(rotated = fresh.refresh.is_some(), "Access token refreshed");
            Ok(fresh.access)
        }
        Err(err) => {
            warn!(error = %err, "Token refresh failed, clearing session");
            tokens.clear();
            Err(Arc::new(err))
        }
    }
}

fn lock(state: &Mutex<RefreshState>) -> MutexGuard<'_, RefreshState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::token_store::MemoryTokenStore;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeRefresher {
        calls: AtomicUsize,
        delay: Duration,
        result: Result<RefreshedTokens, u16>,
    }

    impl FakeRefresher {
        fn issuing(access: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(20),
                result: Ok(RefreshedTokens {
                    access: access.to_string(),
                    refresh: None,
                }),
            })
        }

        fn failing(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay: Duration::from_millis(20),
                result: Err(status),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenRefresher for FakeRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedTokens, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.result.clone().map_err(|status| ClientError::ServerError {
                status,
                message: "refresh rejected".into(),
            })
        }
    }

    fn coordinator(
        store: Arc<MemoryTokenStore>,
        refresher: Arc<FakeRefresher>,
    ) -> RefreshCoordinator {
        RefreshCoordinator::new(store, refresher)
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let store = Arc::new(MemoryTokenStore::with_tokens("a1", "r1"));
        let refresher = FakeRefresher::issuing("a2");
        let coordinator = coordinator(store.clone(), refresher.clone());

        let outcomes = join_all((0..5).map(|_| coordinator.refresh())).await;

        assert_eq!(refresher.calls(), 1);
        for outcome in outcomes {
            assert_eq!(outcome.unwrap(), "a2");
        }
        assert_eq!(store.access().as_deref(), Some("a2"));
        assert_eq!(store.refresh().as_deref(), Some("r1"));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn later_expiry_starts_a_new_refresh() {
        let store = Arc::new(MemoryTokenStore::with_tokens("a1", "r1"));
        let refresher = FakeRefresher::issuing("a2");
        let coordinator = coordinator(store, refresher.clone());

        coordinator.refresh().await.unwrap();
        coordinator.refresh().await.unwrap();

        assert_eq!(refresher.calls(), 2);
    }

    #[tokio::test]
    async fn failure_clears_tokens_for_every_waiter() {
        let store = Arc::new(MemoryTokenStore::with_tokens("a1", "r1"));
        let refresher = FakeRefresher::failing(400);
        let coordinator = coordinator(store.clone(), refresher.clone());

        let outcomes = join_all((0..3).map(|_| coordinator.refresh())).await;

        assert_eq!(refresher.calls(), 1);
        assert!(outcomes.iter().all(Result::is_err));
        assert_eq!(store.access(), None);
        assert_eq!(store.refresh(), None);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_calling_backend() {
        let store = Arc::new(MemoryTokenStore::new());
        store.set_access("orphan");
        let refresher = FakeRefresher::issuing("a2");
        let coordinator = coordinator(store.clone(), refresher.clone());

        let err = coordinator.refresh().await.unwrap_err();

        assert!(matches!(*err, ClientError::NoRefreshToken));
        assert_eq!(refresher.calls(), 0);
        assert_eq!(store.access(), None);
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_persisted() {
        let store = Arc::new(MemoryTokenStore::with_tokens("a1", "r1"));
        let refresher = Arc::new(FakeRefresher {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            result: Ok(RefreshedTokens {
                access: "a2".into(),
                refresh: Some("r2".into()),
            }),
        });
        let coordinator = coordinator(store.clone(), refresher);

        coordinator.refresh().await.unwrap();

        assert_eq!(store.refresh().as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn abandoned_refresh_is_resumed_by_next_caller() {
        let store = Arc::new(MemoryTokenStore::with_tokens("a1", "r1"));
        let refresher = Arc::new(FakeRefresher {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(200),
            result: Ok(RefreshedTokens {
                access: "a2".into(),
                refresh: None,
            }),
        });
        let coordinator = coordinator(store.clone(), refresher.clone());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), coordinator.refresh()).await;
        assert!(abandoned.is_err());
        assert!(coordinator.is_refreshing());

        assert_eq!(coordinator.refresh().await.unwrap(), "a2");
        assert_eq!(refresher.calls(), 1);
        assert_eq!(store.access().as_deref(), Some("a2"));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_tasks_share_one_refresh() {
        let store = Arc::new(MemoryTokenStore::with_tokens("a1", "r1"));
        let refresher = Arc::new(FakeRefresher {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(200),
            result: Ok(RefreshedTokens {
                access: "a2".into(),
                refresh: None,
            }),
        });
        let coordinator = Arc::new(coordinator(store, refresher.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.refresh().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "a2");
        }
        assert_eq!(refresher.calls(), 1);
    }
}
