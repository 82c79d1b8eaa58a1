use std::sync::Arc;

use thiserror::Error;

use marketplace_accounts::{Buyer, Seller};
use marketplace_catalog::Item;
use marketplace_core::{BuyerId, Email, ItemId, Money, PurchaseId, SellerId};
use marketplace_purchasing::Purchase;

use super::query::{
    BuyerFilter, ItemFilter, ItemSales, Page, Pagination, PurchaseFilter, SellerFilter,
};

/// Entity store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. The
/// constraint variants mirror the relational schema so the in-memory and
/// Postgres stores fail the same way.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A check constraint failed or a value did not fit its column.
    #[error("check constraint violated: {0}")]
    CheckViolation(String),

    #[error("failed to decode stored record: {0}")]
    Decode(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Source of units of work.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    type UnitOfWork: UnitOfWork + 'static;

    /// Open a new unit of work (a transaction).
    async fn begin(&self) -> Result<Self::UnitOfWork, StoreError>;
}

#[async_trait::async_trait]
impl<S> EntityStore for Arc<S>
where
    S: EntityStore,
{
    type UnitOfWork = S::UnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, StoreError> {
        (**self).begin().await
    }
}

/// One atomic unit of reads and writes.
///
/// Writes become visible to other units of work only after [`UnitOfWork::commit`].
/// Dropping a unit of work without committing discards its writes.
///
/// ## Locking
///
/// `lock_item` and `lock_purchase` read a record and hold it exclusively until
/// the unit of work ends, so two concurrent buys of the same item serialize.
///
/// ## Constraints
///
/// Implementations must enforce:
/// - unique buyer email and unique seller email (`UniqueViolation`)
/// - items reference an existing seller, purchases an existing buyer and item
/// - records referenced by others cannot be deleted (`ForeignKeyViolation`)
#[async_trait::async_trait]
pub trait UnitOfWork: Send {
    // Buyers
    async fn find_buyer(&mut self, id: BuyerId) -> Result<Option<Buyer>, StoreError>;
    async fn find_buyer_by_email(&mut self, email: &Email) -> Result<Option<Buyer>, StoreError>;
    async fn buyer_exists(&mut self, id: BuyerId) -> Result<bool, StoreError>;
    /// Insert or overwrite.
    async fn save_buyer(&mut self, buyer: &Buyer) -> Result<(), StoreError>;
    /// Returns whether a record was removed.
    async fn delete_buyer(&mut self, id: BuyerId) -> Result<bool, StoreError>;
    async fn list_buyers(
        &mut self,
        filter: &BuyerFilter,
        pagination: Pagination,
    ) -> Result<Page<Buyer>, StoreError>;
    async fn count_buyers(&mut self, filter: &BuyerFilter) -> Result<u64, StoreError>;

    // Sellers
    async fn find_seller(&mut self, id: SellerId) -> Result<Option<Seller>, StoreError>;
    async fn find_seller_by_email(&mut self, email: &Email)
    -> Result<Option<Seller>, StoreError>;
    async fn seller_exists(&mut self, id: SellerId) -> Result<bool, StoreError>;
    async fn save_seller(&mut self, seller: &Seller) -> Result<(), StoreError>;
    async fn delete_seller(&mut self, id: SellerId) -> Result<bool, StoreError>;
    async fn list_sellers(
        &mut self,
        filter: &SellerFilter,
        pagination: Pagination,
    ) -> Result<Page<Seller>, StoreError>;
    async fn count_sellers(&mut self, filter: &SellerFilter) -> Result<u64, StoreError>;

    // Items
    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;
    /// Read an item and hold its row lock until the unit of work ends.
    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError>;
    async fn item_exists(&mut self, id: ItemId) -> Result<bool, StoreError>;
    async fn save_item(&mut self, item: &Item) -> Result<(), StoreError>;
    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError>;
    async fn list_items(
        &mut self,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> Result<Page<Item>, StoreError>;
    async fn count_items(&mut self, filter: &ItemFilter) -> Result<u64, StoreError>;

    // Purchases
    async fn find_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError>;
    /// Read a purchase and hold its row lock until the unit of work ends.
    async fn lock_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError>;
    async fn save_purchase(&mut self, purchase: &Purchase) -> Result<(), StoreError>;
    async fn delete_purchase(&mut self, id: PurchaseId) -> Result<bool, StoreError>;
    async fn list_purchases(
        &mut self,
        filter: &PurchaseFilter,
        pagination: Pagination,
    ) -> Result<Page<Purchase>, StoreError>;
    async fn count_purchases(&mut self, filter: &PurchaseFilter) -> Result<u64, StoreError>;
    /// Sum of `total_price` over matching purchases; zero when none match.
    async fn sum_total_price(&mut self, filter: &PurchaseFilter) -> Result<Money, StoreError>;
    /// Items ranked by units sold, best sellers first.
    async fn most_purchased_items(&mut self, limit: u32) -> Result<Vec<ItemSales>, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;
    async fn rollback(self) -> Result<(), StoreError>;
}
