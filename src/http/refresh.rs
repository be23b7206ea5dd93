//! Session refresh: the refresh-token exchange and the single-flight
//! coordination around it
//!
//! Requests that hit a 401 call [`RefreshCoordinator::claim`]. The first
//! one becomes the leader and runs the exchange; everyone arriving while
//! it is in flight gets a oneshot receiver and waits. When the leader
//! settles, every waiter receives the same outcome in enqueue order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::error::RefreshError;
use super::AuthenticatedClient;
use crate::security::SecretToken;

/// Path of the refresh endpoint, relative to the API origin
pub const REFRESH_PATH: &str = "/api/refresh";

pub(crate) type RefreshOutcome = Result<(), RefreshError>;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    refresh_token: String,
}

/// Shared refresh state
///
/// `waiters` is only non-empty while `is_refreshing` is set.
#[derive(Default)]
struct RefreshState {
    is_refreshing: bool,
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
}

/// What a request that saw a 401 should do next
pub(crate) enum Turn<'a> {
    /// Run the refresh and settle the guard with its outcome
    Lead(LeaderGuard<'a>),
    /// Another request is refreshing; wait for its outcome
    Wait(oneshot::Receiver<RefreshOutcome>),
}

/// Owns the refresh flag and the queue of waiting requests
///
/// The lock is only held for flag/queue updates, never across an await.
#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        // Never left half-updated, poisoning is harmless
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Becomes the leader if no refresh is running, otherwise queues up
    pub(crate) fn claim(&self) -> Turn<'_> {
        let mut state = self.lock();
        if state.is_refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            tracing::debug!("Refresh in flight, queued request ({} waiting)", state.waiters.len());
            Turn::Wait(rx)
        } else {
            state.is_refreshing = true;
            Turn::Lead(LeaderGuard {
                coordinator: self,
                settled: false,
            })
        }
    }

    /// Ends the refresh window and hands `outcome` to every waiter
    fn release(&self, outcome: RefreshOutcome) {
        let waiters = {
            let mut state = self.lock();
            state.is_refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        if !waiters.is_empty() {
            tracing::debug!("Releasing {} queued request(s)", waiters.len());
        }
        for waiter in waiters {
            // A waiter whose caller gave up has dropped its receiver
            let _ = waiter.send(outcome.clone());
        }
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().is_refreshing
    }

    #[cfg(test)]
    fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }
}

/// Held by the request running the refresh
///
/// Dropping it unsettled (the leader's future was cancelled) releases the
/// waiters with [`RefreshError::Interrupted`] so none of them hang.
pub(crate) struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    pub(crate) fn settle(mut self, outcome: RefreshOutcome) {
        self.settled = true;
        self.coordinator.release(outcome);
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!("Refresh leader dropped before settling");
            self.coordinator.release(Err(RefreshError::Interrupted));
        }
    }
}

impl AuthenticatedClient {
    /// Exchanges the stored refresh token for a new one
    ///
    /// On success the new token replaces the stored one. On any failure
    /// other than a missing token or an unreadable store, the stored token
    /// is deleted.
    ///
    /// This does no coordination of its own. Concurrent callers should go
    /// through [`request`](Self::request), which guarantees one refresh
    /// per contention window.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        let token = self
            .store
            .get()
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .ok_or(RefreshError::NoCredential)?;

        let timeout = self.config.refresh_timeout();
        let exchanged = match tokio::time::timeout(timeout, self.exchange(&token)).await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::Timeout(timeout)),
        };

        match exchanged {
            Ok(new_token) => {
                self.store
                    .set(new_token.expose())
                    .map_err(|e| RefreshError::Storage(e.to_string()))?;
                tracing::info!("Session refreshed, new token {}", new_token.redacted());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                self.discard_token();
                Err(e)
            }
        }
    }

    async fn exchange(&self, token: &SecretToken) -> Result<SecretToken, RefreshError> {
        let url = self.config.endpoint(REFRESH_PATH);
        let timeout = self.config.refresh_timeout();
        tracing::debug!("Refreshing session with token {}", token.redacted());

        // Per-request timeout replaces the client-wide request timeout
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&RefreshRequest {
                refresh_token: token.expose(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RefreshError::Timeout(timeout)
                } else {
                    RefreshError::Network(Arc::new(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RefreshError::Timeout(timeout)
                } else {
                    RefreshError::InvalidResponse(e.to_string())
                }
            })?;

        Ok(SecretToken::new(body.refresh_token))
    }

    fn discard_token(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("Failed to clear refresh token: {}", e);
        }
    }

    /// Runs or joins the refresh for the current contention window
    pub(crate) async fn recover_session(&self) -> RefreshOutcome {
        match self.refresh_state.claim() {
            Turn::Lead(guard) => {
                let outcome = self.refresh().await;
                guard.settle(outcome.clone());
                outcome
            }
            Turn::Wait(rx) => rx.await.unwrap_or(Err(RefreshError::Interrupted)),
        }
    }
}
