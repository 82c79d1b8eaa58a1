//! Account Manager: buyer and seller identity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use marketplace_accounts::{AccountDetails, Buyer, Seller, ensure_email_free};
use marketplace_core::{BuyerId, DomainError, Email, SellerId};

use super::error::ServiceResult;
use super::finish;
use crate::clock::Clock;
use crate::entity_store::{
    BuyerFilter, EntityStore, ItemFilter, Page, Pagination, PurchaseFilter, SellerFilter,
    UnitOfWork,
};

pub async fn register_buyer_in<U: UnitOfWork>(
    uow: &mut U,
    details: AccountDetails,
    now: DateTime<Utc>,
) -> ServiceResult<Buyer> {
    let holder = uow.find_buyer_by_email(details.email()).await?;
    ensure_email_free("buyer", details.email(), holder.map(|b| b.id), None)?;
    let buyer = Buyer::register(BuyerId::new(), details, now);
    uow.save_buyer(&buyer).await?;
    Ok(buyer)
}

pub async fn get_buyer_in<U: UnitOfWork>(uow: &mut U, id: BuyerId) -> ServiceResult<Buyer> {
    uow.find_buyer(id)
        .await?
        .ok_or_else(|| DomainError::not_found("buyer", id).into())
}

pub async fn get_buyer_by_email_in<U: UnitOfWork>(uow: &mut U, email: &Email) -> ServiceResult<Buyer> {
    uow.find_buyer_by_email(email)
        .await?
        .ok_or_else(|| DomainError::not_found("buyer", email).into())
}

pub async fn update_buyer_in<U: UnitOfWork>(
    uow: &mut U,
    id: BuyerId,
    details: AccountDetails,
) -> ServiceResult<Buyer> {
    let mut buyer = get_buyer_in(uow, id).await?;
    if buyer.changes_email(&details) {
        let holder = uow.find_buyer_by_email(details.email()).await?;
        ensure_email_free("buyer", details.email(), holder.map(|b| b.id), Some(id))?;
    }
    buyer.apply_details(details);
    uow.save_buyer(&buyer).await?;
    Ok(buyer)
}

pub async fn delete_buyer_in<U: UnitOfWork>(uow: &mut U, id: BuyerId) -> ServiceResult<()> {
    let buyer = get_buyer_in(uow, id).await?;
    let purchases = uow.count_purchases(&PurchaseFilter::by_buyer(id)).await?;
    buyer.ensure_deletable(purchases)?;
    uow.delete_buyer(id).await?;
    Ok(())
}

pub async fn register_seller_in<U: UnitOfWork>(
    uow: &mut U,
    details: AccountDetails,
    now: DateTime<Utc>,
) -> ServiceResult<Seller> {
    let holder = uow.find_seller_by_email(details.email()).await?;
    ensure_email_free("seller", details.email(), holder.map(|s| s.id), None)?;
    let seller = Seller::register(SellerId::new(), details, now);
    uow.save_seller(&seller).await?;
    Ok(seller)
}

pub async fn get_seller_in<U: UnitOfWork>(uow: &mut U, id: SellerId) -> ServiceResult<Seller> {
    uow.find_seller(id)
        .await?
        .ok_or_else(|| DomainError::not_found("seller", id).into())
}

pub async fn get_seller_by_email_in<U: UnitOfWork>(
    uow: &mut U,
    email: &Email,
) -> ServiceResult<Seller> {
    uow.find_seller_by_email(email)
        .await?
        .ok_or_else(|| DomainError::not_found("seller", email).into())
}

pub async fn update_seller_in<U: UnitOfWork>(
    uow: &mut U,
    id: SellerId,
    details: AccountDetails,
) -> ServiceResult<Seller> {
    let mut seller = get_seller_in(uow, id).await?;
    if seller.changes_email(&details) {
        let holder = uow.find_seller_by_email(details.email()).await?;
        ensure_email_free("seller", details.email(), holder.map(|s| s.id), Some(id))?;
    }
    seller.apply_details(details);
    uow.save_seller(&seller).await?;
    Ok(seller)
}

pub async fn delete_seller_in<U: UnitOfWork>(uow: &mut U, id: SellerId) -> ServiceResult<()> {
    let seller = get_seller_in(uow, id).await?;
    let items = uow.count_items(&ItemFilter::by_seller(id)).await?;
    seller.ensure_deletable(items)?;
    uow.delete_seller(id).await?;
    Ok(())
}

/// Owns buyer and seller identity: email uniqueness and guarded deletion.
pub struct AccountManager<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: EntityStore> AccountManager<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, details), fields(email = %details.email()), err)]
    pub async fn register_buyer(&self, details: AccountDetails) -> ServiceResult<Buyer> {
        let mut uow = self.store.begin().await?;
        let result = register_buyer_in(&mut uow, details, self.clock.now()).await;
        let buyer = finish(uow, result).await?;
        info!(buyer_id = %buyer.id, "buyer registered");
        Ok(buyer)
    }

    pub async fn get_buyer(&self, id: BuyerId) -> ServiceResult<Buyer> {
        let mut uow = self.store.begin().await?;
        let result = get_buyer_in(&mut uow, id).await;
        finish(uow, result).await
    }

    pub async fn get_buyer_by_email(&self, email: &str) -> ServiceResult<Buyer> {
        let email = Email::parse(email)?;
        let mut uow = self.store.begin().await?;
        let result = get_buyer_by_email_in(&mut uow, &email).await;
        finish(uow, result).await
    }

    #[instrument(skip(self, details), fields(buyer_id = %id), err)]
    pub async fn update_buyer(&self, id: BuyerId, details: AccountDetails) -> ServiceResult<Buyer> {
        let mut uow = self.store.begin().await?;
        let result = update_buyer_in(&mut uow, id, details).await;
        finish(uow, result).await
    }

    #[instrument(skip(self), fields(buyer_id = %id), err)]
    pub async fn delete_buyer(&self, id: BuyerId) -> ServiceResult<()> {
        let mut uow = self.store.begin().await?;
        let result = delete_buyer_in(&mut uow, id).await;
        if let Err(err) = &result {
            debug!(error = %err, "buyer deletion rejected");
        }
        finish(uow, result).await
    }

    pub async fn list_buyers(
        &self,
        filter: BuyerFilter,
        pagination: Pagination,
    ) -> ServiceResult<Page<Buyer>> {
        let mut uow = self.store.begin().await?;
        let result = uow.list_buyers(&filter, pagination).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn count_buyers(&self) -> ServiceResult<u64> {
        let mut uow = self.store.begin().await?;
        let result = uow.count_buyers(&BuyerFilter::default()).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn buyer_exists(&self, id: BuyerId) -> ServiceResult<bool> {
        let mut uow = self.store.begin().await?;
        let result = uow.buyer_exists(id).await.map_err(Into::into);
        finish(uow, result).await
    }

    #[instrument(skip(self, details), fields(email = %details.email()), err)]
    pub async fn register_seller(&self, details: AccountDetails) -> ServiceResult<Seller> {
        let mut uow = self.store.begin().await?;
        let result = register_seller_in(&mut uow, details, self.clock.now()).await;
        let seller = finish(uow, result).await?;
        info!(seller_id = %seller.id, "seller registered");
        Ok(seller)
    }

    pub async fn get_seller(&self, id: SellerId) -> ServiceResult<Seller> {
        let mut uow = self.store.begin().await?;
        let result = get_seller_in(&mut uow, id).await;
        finish(uow, result).await
    }

    pub async fn get_seller_by_email(&self, email: &str) -> ServiceResult<Seller> {
        let email = Email::parse(email)?;
        let mut uow = self.store.begin().await?;
        let result = get_seller_by_email_in(&mut uow, &email).await;
        finish(uow, result).await
    }

    #[instrument(skip(self, details), fields(seller_id = %id), err)]
    pub async fn update_seller(
        &self,
        id: SellerId,
        details: AccountDetails,
    ) -> ServiceResult<Seller> {
        let mut uow = self.store.begin().await?;
        let result = update_seller_in(&mut uow, id, details).await;
        finish(uow, result).await
    }

    #[instrument(skip(self), fields(seller_id = %id), err)]
    pub async fn delete_seller(&self, id: SellerId) -> ServiceResult<()> {
        let mut uow = self.store.begin().await?;
        let result = delete_seller_in(&mut uow, id).await;
        if let Err(err) = &result {
            debug!(error = %err, "seller deletion rejected");
        }
        finish(uow, result).await
    }

    pub async fn list_sellers(
        &self,
        filter: SellerFilter,
        pagination: Pagination,
    ) -> ServiceResult<Page<Seller>> {
        let mut uow = self.store.begin().await?;
        let result = uow.list_sellers(&filter, pagination).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn count_sellers(&self) -> ServiceResult<u64> {
        let mut uow = self.store.begin().await?;
        let result = uow.count_sellers(&SellerFilter::default()).await.map_err(Into::into);
        finish(uow, result).await
    }

    pub async fn seller_exists(&self, id: SellerId) -> ServiceResult<bool> {
        let mut uow = self.store.begin().await?;
        let result = uow.seller_exists(id).await.map_err(Into::into);
        finish(uow, result).await
    }
}
