use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use courier_common::{DeliveryItem, DeliveryItemId};
use tokio_util::sync::CancellationToken;

use crate::{HistoryError, r#trait::HistoryStore};

/// In-memory history store
///
/// Items are kept in a `HashMap` behind an `RwLock`. Re-adding an item with
/// an identifier already present replaces it.
///
/// # Attachment retention
/// With `retain_attachments` disabled, attachment bytes are dropped before an
/// item is stored and the stored copy is marked as not resendable.
///
/// # Capacity Management
/// An optional capacity bounds the number of stored items; adding a new item
/// beyond it fails with [`HistoryError::CapacityExceeded`].
#[derive(Debug, Clone)]
pub struct MemoryHistoryStore {
    pub(crate) items: Arc<RwLock<HashMap<DeliveryItemId, DeliveryItem>>>,
    capacity: Option<usize>,
    retain_attachments: bool,
}

impl MemoryHistoryStore {
    /// Create an unbounded store that retains attachments
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(HashMap::new())),
            capacity: None,
            retain_attachments: true,
        }
    }

    /// Limit the number of stored items
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Choose whether attachment bytes are kept
    #[must_use]
    pub const fn retain_attachments(mut self, retain: bool) -> Self {
        self.retain_attachments = retain;
        self
    }

    /// Number of stored items
    ///
    /// Recovers gracefully if the lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// All stored items, ordered by identifier (and so by creation time)
    ///
    /// # Errors
    /// If the lock is poisoned
    pub fn items(&self) -> crate::Result<Vec<DeliveryItem>> {
        let mut items: Vec<_> = self.items.read()?.values().cloned().collect();
        items.sort_by_key(DeliveryItem::id);
        Ok(items)
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    // Recording never blocks, so a cancelled token does not stop it.
    async fn add(&self, item: &DeliveryItem, _cancel: &CancellationToken) -> crate::Result<()> {
        let mut stored = item.clone();
        if !self.retain_attachments {
            stored.strip_attachment_content();
        }

        let mut items = self.items.write()?;

        if let Some(capacity) = self.capacity
            && !items.contains_key(&stored.id())
            && items.len() >= capacity
        {
            tracing::warn!(
                delivery_item_id = %stored.id(),
                capacity,
                "History store is full, item not recorded"
            );
            return Err(HistoryError::CapacityExceeded {
                len: items.len(),
                capacity,
            });
        }

        items.insert(stored.id(), stored);
        drop(items);

        Ok(())
    }

    async fn get(
        &self,
        id: &DeliveryItemId,
        cancel: &CancellationToken,
    ) -> crate::Result<Option<DeliveryItem>> {
        if cancel.is_cancelled() {
            return Err(HistoryError::Cancelled);
        }

        Ok(self.items.read()?.get(id).cloned())
    }
}
