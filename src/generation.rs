//! Generation tokens for view refreshes.
//!
//! Every refresh of a view takes a ticket. When a newer refresh starts (or the
//! slot is invalidated) before an older one finishes, the older result is
//! dropped without touching the slot.

use crate::errors::ServiceError;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTicket(u64);

#[derive(Debug, Default)]
pub struct FetchGeneration {
    current: AtomicU64,
}

impl FetchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> GenerationTicket {
        GenerationTicket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: GenerationTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState<T> {
    pub rows: Vec<T>,
    /// Notification for the last failed refresh
    pub error: Option<String>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed,
    Stale,
}

/// The latest assembled rows of one view.
#[derive(Debug, Default)]
pub struct ViewSlot<T> {
    generation: FetchGeneration,
    state: RwLock<ViewState<T>>,
}

impl<T: Clone> ViewSlot<T> {
    pub fn new() -> Self {
        Self {
            generation: FetchGeneration::new(),
            state: RwLock::new(ViewState::default()),
        }
    }

    /// Runs `fetch` and stores its result if no newer refresh started meanwhile.
    /// A failed fetch empties the rows and records the error.
    pub async fn refresh<F>(&self, fetch: F) -> RefreshOutcome
    where
        F: Future<Output = Result<Vec<T>, ServiceError>>,
    {
        let ticket = self.generation.begin();
        let result = fetch.await;

        let mut state = self.state.write().await;
        if !self.generation.is_current(ticket) {
            debug!(?ticket, "discarding stale view result");
            return RefreshOutcome::Stale;
        }
        match result {
            Ok(rows) => {
                *state = ViewState { rows, error: None };
                RefreshOutcome::Applied
            }
            Err(err) => {
                *state = ViewState {
                    rows: Vec::new(),
                    error: Some(err.response_message()),
                };
                RefreshOutcome::Failed
            }
        }
    }

    pub async fn snapshot(&self) -> ViewState<T> {
        self.state.read().await.clone()
    }

    /// Clears the error notification, keeping the rows.
    pub async fn dismiss(&self) {
        self.state.write().await.error = None;
    }

    pub fn invalidate(&self) {
        self.generation.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[test]
    fn only_the_newest_ticket_is_current() {
        let generation = FetchGeneration::new();
        let first = generation.begin();
        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
        generation.invalidate();
        assert!(!generation.is_current(second));
    }

    #[tokio::test]
    async fn stale_results_do_not_overwrite_newer_ones() {
        let slot = Arc::new(ViewSlot::<u32>::new());
        let (release, gate) = oneshot::channel::<()>();

        let slow = {
            let slot = Arc::clone(&slot);
            tokio::spawn(async move {
                slot.refresh(async move {
                    let _ = gate.await;
                    Ok(vec![1])
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        assert_eq!(slot.refresh(async { Ok(vec![2]) }).await, RefreshOutcome::Applied);
        let _ = release.send(());
        assert_eq!(slow.await.unwrap(), RefreshOutcome::Stale);
        assert_eq!(slot.snapshot().await.rows, vec![2]);
    }

    #[tokio::test]
    async fn failures_empty_the_view_until_dismissed() {
        let slot = ViewSlot::<u32>::new();
        slot.refresh(async { Ok(vec![7, 8]) }).await;

        let outcome = slot
            .refresh(async { Err(ServiceError::remote("timeout")) })
            .await;
        assert_eq!(outcome, RefreshOutcome::Failed);

        let state = slot.snapshot().await;
        assert!(state.rows.is_empty());
        assert_eq!(state.error.as_deref(), Some("Failed to load data"));

        slot.dismiss().await;
        assert_eq!(slot.snapshot().await.error, None);
    }
}
