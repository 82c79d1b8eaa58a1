//! Purchase Workflow: buy, cancel and validate, plus purchase queries.
//!
//! ## Buy
//!
//! ```text
//! resolve buyer ─► lock item ─► check quantity ─► check stock
//!   ─► withdraw stock ─► record purchase (price snapshot) ─► commit
//! ```
//!
//! Any failure rolls the whole unit of work back, so a stock decrement is
//! never visible without its purchase record.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument};

use marketplace_core::{BuyerId, DomainError, ItemId, Money, PurchaseId, SellerId};
use marketplace_purchasing::Purchase;

use super::error::{ServiceError, ServiceResult};
use super::finish;
use crate::clock::Clock;
use crate::entity_store::{EntityStore, ItemSales, Page, Pagination, PurchaseFilter, UnitOfWork};

pub async fn buy_in<U: UnitOfWork>(
    uow: &mut U,
    buyer_id: BuyerId,
    item_id: ItemId,
    quantity: i64,
    now: DateTime<Utc>,
) -> ServiceResult<Purchase> {
    if !uow.buyer_exists(buyer_id).await? {
        return Err(DomainError::not_found("buyer", buyer_id).into());
    }
    let mut item = uow
        .lock_item(item_id)
        .await?
        .ok_or_else(|| DomainError::not_found("item", item_id))?;

    item.withdraw(quantity)?;
    let purchase = Purchase::record(PurchaseId::new(), buyer_id, &item, quantity, now)?;

    uow.save_item(&item).await?;
    uow.save_purchase(&purchase).await?;
    Ok(purchase)
}

pub async fn cancel_in<U: UnitOfWork>(
    uow: &mut U,
    purchase_id: PurchaseId,
    now: DateTime<Utc>,
) -> ServiceResult<Purchase> {
    let purchase = uow
        .lock_purchase(purchase_id)
        .await?
        .ok_or_else(|| DomainError::not_found("purchase", purchase_id))?;
    purchase.ensure_cancellable(now)?;

    let mut item = uow
        .lock_item(purchase.item_id)
        .await?
        .ok_or_else(|| DomainError::not_found("item", purchase.item_id))?;
    item.restock(purchase.quantity)?;
    uow.save_item(&item).await?;
    uow.delete_purchase(purchase.id).await?;
    Ok(purchase)
}

/// Whether `buy_in` would succeed right now. Never writes.
pub async fn validate_in<U: UnitOfWork>(
    uow: &mut U,
    buyer_id: BuyerId,
    item_id: ItemId,
    quantity: i64,
) -> ServiceResult<bool> {
    if !uow.buyer_exists(buyer_id).await? {
        return Ok(false);
    }
    let Some(item) = uow.find_item(item_id).await? else {
        return Ok(false);
    };
    Ok(item.is_available(quantity) && Purchase::quote(&item, quantity).is_ok())
}

pub async fn get_purchase_in<U: UnitOfWork>(uow: &mut U, id: PurchaseId) -> ServiceResult<Purchase> {
    uow.find_purchase(id)
        .await?
        .ok_or_else(|| DomainError::not_found("purchase", id).into())
}

/// Runs buys and cancellations and answers purchase queries.
pub struct PurchaseWorkflow<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: EntityStore> PurchaseWorkflow<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self), fields(buyer_id = %buyer_id, item_id = %item_id), err)]
    pub async fn buy(
        &self,
        buyer_id: BuyerId,
        item_id: ItemId,
        quantity: i64,
    ) -> ServiceResult<Purchase> {
        let mut uow = self.store.begin().await?;
        let result = buy_in(&mut uow, buyer_id, item_id, quantity, self.clock.now()).await;
        if let Err(ServiceError::Domain(err)) = &result {
            debug!(error = %err, "purchase rejected");
        }
        let purchase = finish(uow, result).await?;
        info!(
            purchase_id = %purchase.id,
            total_price = %purchase.total_price,
            "purchase recorded"
        );
        Ok(purchase)
    }

    #[instrument(skip(self), fields(purchase_id = %purchase_id), err)]
    pub async fn cancel(&self, purchase_id: PurchaseId) -> ServiceResult<()> {
        let mut uow = self.store.begin().await?;
        let result = cancel_in(&mut uow, purchase_id, self.clock.now()).await;
        if let Err(ServiceError::Domain(err)) = &result {
            debug!(error = %err, "cancellation rejected");
        }
        let purchase = finish(uow, result).await?;
        info!(
            item_id = %purchase.item_id,
            restocked = purchase.quantity,
            "purchase cancelled"
        );
        Ok(())
    }

    pub async fn validate(
        &self,
        buyer_id: BuyerId,
        item_id: ItemId,
        quantity: i64,
    ) -> ServiceResult<bool> {
        let mut uow = self.store.begin().await?;
        let result = validate_in(&mut uow, buyer_id, item_id, quantity).await;
        // Read-only: nothing to keep.
        match uow.rollback().await {
            Ok(()) => result,
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_purchase(&self, id: PurchaseId) -> ServiceResult<Purchase> {
        let mut uow = self.store.begin().await?;
        let result = get_purchase_in(&mut uow, id).await;
        finish(uow, result).await
    }

    pub async fn list_purchases(
        &self,
        filter: PurchaseFilter,
        pagination: Pagination,
    ) -> ServiceResult<Page<Purchase>> {
        let mut uow = self.store.begin().await?;
        let result = uow.list_purchases(&filter, pagination).await.map_err(Into::into);
        finish(uow, result).await
    }

    /// Purchases made within the last `days` days, newest first.
    pub async fn recent_purchases(
        &self,
        days: u32,
        pagination: Pagination,
    ) -> ServiceResult<Page<Purchase>> {
        let since = Duration::try_days(i64::from(days))
            .and_then(|window| self.clock.now().checked_sub_signed(window))
            .ok_or_else(|| DomainError::validation(format!("days out of range: {days}")))?;
        let filter = PurchaseFilter {
            purchased_from: Some(since),
            ..Default::default()
        };
        self.list_purchases(filter, pagination).await
    }

    pub async fn total_revenue_for_seller(&self, seller_id: SellerId) -> ServiceResult<Money> {
        let mut uow = self.store.begin().await?;
        let result: ServiceResult<Money> = async {
            if !uow.seller_exists(seller_id).await? {
                return Err(DomainError::not_found("seller", seller_id).into());
            }
            Ok(uow.sum_total_price(&PurchaseFilter::by_seller(seller_id)).await?)
        }
        .await;
        finish(uow, result).await
    }

    pub async fn total_spending_for_buyer(&self, buyer_id: BuyerId) -> ServiceResult<Money> {
        let mut uow = self.store.begin().await?;
        let result: ServiceResult<Money> = async {
            if !uow.buyer_exists(buyer_id).await? {
                return Err(DomainError::not_found("buyer", buyer_id).into());
            }
            Ok(uow.sum_total_price(&PurchaseFilter::by_buyer(buyer_id)).await?)
        }
        .await;
        finish(uow, result).await
    }

    pub async fn most_purchased_items(&self, limit: u32) -> ServiceResult<Vec<ItemSales>> {
        let mut uow = self.store.begin().await?;
        let result = uow.most_purchased_items(limit).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn count_purchases(&self) -> ServiceResult<u64> {
        let mut uow = self.store.begin().await?;
        let result = uow
            .count_purchases(&PurchaseFilter::default())
            .await
            .map_err(Into::into);
        finish(uow, result).await
    }
}
