//! History stores that misbehave on purpose

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use courier_common::{DeliveryItem, DeliveryItemId};
use courier_history::{HistoryError, HistoryStore};
use tokio_util::sync::CancellationToken;

/// History store whose every operation fails
#[derive(Debug, Default)]
pub struct FailingHistoryStore {
    adds: AtomicUsize,
}

impl FailingHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `add` calls attempted
    pub fn add_attempts(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryStore for FailingHistoryStore {
    async fn add(
        &self,
        _item: &DeliveryItem,
        _cancel: &CancellationToken,
    ) -> courier_history::Result<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        Err(HistoryError::Unavailable("history offline".to_string()))
    }

    async fn get(
        &self,
        _id: &DeliveryItemId,
        _cancel: &CancellationToken,
    ) -> courier_history::Result<Option<DeliveryItem>> {
        Err(HistoryError::Unavailable("history offline".to_string()))
    }
}
