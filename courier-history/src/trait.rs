use async_trait::async_trait;
use courier_common::{DeliveryItem, DeliveryItemId};
use tokio_util::sync::CancellationToken;

/// Persistence for terminal delivery items, keyed by item identifier.
///
/// The mailer records every send attempt here and reads items back when
/// resending. Implementations decide how much content they retain; an item
/// whose content was not fully kept must come back with
/// [`DeliveryItem::is_resendable`] returning `false`.
#[async_trait]
pub trait HistoryStore: Send + Sync + std::fmt::Debug {
    /// Record a delivery item
    ///
    /// # Errors
    /// If the item cannot be stored
    async fn add(&self, item: &DeliveryItem, cancel: &CancellationToken) -> crate::Result<()>;

    /// Look up a delivery item by identifier
    ///
    /// Returns `Ok(None)` if the store has no such item.
    ///
    /// # Errors
    /// If the store cannot be read
    async fn get(
        &self,
        id: &DeliveryItemId,
        cancel: &CancellationToken,
    ) -> crate::Result<Option<DeliveryItem>>;
}
