//! Catalog Manager: item lifecycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use marketplace_catalog::{Item, ItemDetails};
use marketplace_core::{DomainError, ItemId, SellerId};

use super::error::ServiceResult;
use super::finish;
use crate::clock::Clock;
use crate::entity_store::{EntityStore, ItemFilter, Page, Pagination, PurchaseFilter, UnitOfWork};

pub async fn create_item_in<U: UnitOfWork>(
    uow: &mut U,
    seller_id: SellerId,
    details: ItemDetails,
    now: DateTime<Utc>,
) -> ServiceResult<Item> {
    if !uow.seller_exists(seller_id).await? {
        return Err(DomainError::not_found("seller", seller_id).into());
    }
    let item = Item::list(ItemId::new(), seller_id, details, now);
    uow.save_item(&item).await?;
    Ok(item)
}

pub async fn get_item_in<U: UnitOfWork>(uow: &mut U, id: ItemId) -> ServiceResult<Item> {
    uow.find_item(id)
        .await?
        .ok_or_else(|| DomainError::not_found("item", id).into())
}

async fn lock_item_in<U: UnitOfWork>(uow: &mut U, id: ItemId) -> ServiceResult<Item> {
    uow.lock_item(id)
        .await?
        .ok_or_else(|| DomainError::not_found("item", id).into())
}

/// Overwrite an item's details under its row lock.
pub async fn update_item_in<U: UnitOfWork>(
    uow: &mut U,
    id: ItemId,
    details: ItemDetails,
) -> ServiceResult<Item> {
    let mut item = lock_item_in(uow, id).await?;
    item.revise(details);
    uow.save_item(&item).await?;
    Ok(item)
}

pub async fn update_item_quantity_in<U: UnitOfWork>(
    uow: &mut U,
    id: ItemId,
    quantity: i64,
) -> ServiceResult<Item> {
    let mut item = lock_item_in(uow, id).await?;
    item.set_quantity(quantity)?;
    uow.save_item(&item).await?;
    Ok(item)
}

pub async fn delete_item_in<U: UnitOfWork>(uow: &mut U, id: ItemId) -> ServiceResult<()> {
    let item = lock_item_in(uow, id).await?;
    let purchases = uow.count_purchases(&PurchaseFilter::by_item(id)).await?;
    item.ensure_deletable(purchases)?;
    uow.delete_item(id).await?;
    Ok(())
}

/// Unknown items are reported as unavailable rather than as an error.
pub async fn is_item_available_in<U: UnitOfWork>(
    uow: &mut U,
    id: ItemId,
    quantity: i64,
) -> ServiceResult<bool> {
    Ok(uow
        .find_item(id)
        .await?
        .is_some_and(|item| item.is_available(quantity)))
}

/// Owns the item lifecycle and its referential checks.
pub struct CatalogManager<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: EntityStore> CatalogManager<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, details), fields(seller_id = %seller_id), err)]
    pub async fn create_item(&self, seller_id: SellerId, details: ItemDetails) -> ServiceResult<Item> {
        let mut uow = self.store.begin().await?;
        let result = create_item_in(&mut uow, seller_id, details, self.clock.now()).await;
        let item = finish(uow, result).await?;
        info!(item_id = %item.id, quantity = item.quantity, "item listed");
        Ok(item)
    }

    pub async fn get_item(&self, id: ItemId) -> ServiceResult<Item> {
        let mut uow = self.store.begin().await?;
        let result = get_item_in(&mut uow, id).await;
        finish(uow, result).await
    }

    #[instrument(skip(self, details), fields(item_id = %id), err)]
    pub async fn update_item(&self, id: ItemId, details: ItemDetails) -> ServiceResult<Item> {
        let mut uow = self.store.begin().await?;
        let result = update_item_in(&mut uow, id, details).await;
        finish(uow, result).await
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn update_item_quantity(&self, id: ItemId, quantity: i64) -> ServiceResult<Item> {
        let mut uow = self.store.begin().await?;
        let result = update_item_quantity_in(&mut uow, id, quantity).await;
        finish(uow, result).await
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn delete_item(&self, id: ItemId) -> ServiceResult<()> {
        let mut uow = self.store.begin().await?;
        let result = delete_item_in(&mut uow, id).await;
        if let Err(err) = &result {
            debug!(error = %err, "item deletion rejected");
        }
        finish(uow, result).await
    }

    pub async fn list_items(
        &self,
        filter: ItemFilter,
        pagination: Pagination,
    ) -> ServiceResult<Page<Item>> {
        let mut uow = self.store.begin().await?;
        let result = uow.list_items(&filter, pagination).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn count_items(&self, filter: ItemFilter) -> ServiceResult<u64> {
        let mut uow = self.store.begin().await?;
        let result = uow.count_items(&filter).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn item_exists(&self, id: ItemId) -> ServiceResult<bool> {
        let mut uow = self.store.begin().await?;
        let result = uow.item_exists(id).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn is_item_available(&self, id: ItemId, quantity: i64) -> ServiceResult<bool> {
        let mut uow = self.store.begin().await?;
        let result = is_item_available_in(&mut uow, id, quantity).await;
        finish(uow, result).await
    }
}
