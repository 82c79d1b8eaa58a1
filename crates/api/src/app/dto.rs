use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use marketplace_accounts::AccountDetails;
use marketplace_catalog::ItemDetails;
use marketplace_core::{DomainError, DomainResult, Money};
use marketplace_infra::entity_store::{
    BuyerFilter, ItemFilter, ItemSort, Pagination, PurchaseFilter, SellerFilter,
};

use crate::app::errors;

/// Days looked back by `/purchases/recent` when no `days` is given.
pub const DEFAULT_RECENT_DAYS: u32 = 7;
/// Entries returned by `/purchases/stats/most-purchased` when no `limit` is given.
pub const DEFAULT_RANKING_LIMIT: u32 = 10;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub name: String,
    pub email: String,
}

impl AccountRequest {
    pub fn details(&self) -> DomainResult<AccountDetails> {
        AccountDetails::new(&self.name, &self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i64,
}

impl ItemRequest {
    pub fn details(&self) -> DomainResult<ItemDetails> {
        ItemDetails::new(&self.name, self.description.as_deref(), self.price, self.quantity)
    }
}

/// `POST /items` names the seller in the body; `POST /sellers/:id/items` takes it from the path.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub seller_id: String,
    #[serde(flatten)]
    pub item: ItemRequest,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub buyer_id: String,
    pub item_id: String,
    pub quantity: i64,
}

// -------------------------
// Query-string DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.limit, self.offset)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct BuyerListQuery {
    pub name: Option<String>,
    #[serde(default)]
    pub with_purchases: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl BuyerListQuery {
    pub fn into_parts(self) -> (BuyerFilter, Pagination) {
        let pagination = Pagination::new(self.limit, self.offset);
        let filter = BuyerFilter {
            name_contains: non_blank(self.name),
            with_purchases: self.with_purchases,
        };
        (filter, pagination)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SellerListQuery {
    pub name: Option<String>,
    #[serde(default)]
    pub with_items: bool,
    #[serde(default)]
    pub with_sales: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SellerListQuery {
    pub fn into_parts(self) -> (SellerFilter, Pagination) {
        let pagination = Pagination::new(self.limit, self.offset);
        let filter = SellerFilter {
            name_contains: non_blank(self.name),
            with_items: self.with_items,
            with_sales: self.with_sales,
        };
        (filter, pagination)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub seller_id: Option<String>,
    pub name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub available: bool,
    /// Low-stock threshold (inclusive).
    pub max_quantity: Option<i64>,
    pub sort: Option<ItemSort>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ItemListQuery {
    pub fn into_parts(self) -> DomainResult<(ItemFilter, Pagination)> {
        let min_price = self.min_price.map(Money::new).transpose()?;
        let max_price = self.max_price.map(Money::new).transpose()?;
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(DomainError::validation("min_price cannot exceed max_price"));
            }
        }
        let filter = ItemFilter {
            seller_id: parse_opt(self.seller_id.as_deref())?,
            name_contains: non_blank(self.name),
            min_price,
            max_price,
            available_only: self.available,
            max_quantity: self.max_quantity,
            sort: self.sort.unwrap_or_default(),
        };
        Ok((filter, Pagination::new(self.limit, self.offset)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PurchaseListQuery {
    pub buyer_id: Option<String>,
    pub item_id: Option<String>,
    pub seller_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl PurchaseListQuery {
    pub fn into_parts(self) -> DomainResult<(PurchaseFilter, Pagination)> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DomainError::validation("from cannot be after to"));
            }
        }
        let filter = PurchaseFilter {
            buyer_id: parse_opt(self.buyer_id.as_deref())?,
            item_id: parse_opt(self.item_id.as_deref())?,
            seller_id: parse_opt(self.seller_id.as_deref())?,
            purchased_from: self.from,
            purchased_to: self.to,
        };
        Ok((filter, Pagination::new(self.limit, self.offset)))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub days: Option<u32>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub quantity: i64,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Parse a path segment into a typed id; malformed ids become a 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

fn parse_opt<T>(raw: Option<&str>) -> DomainResult<Option<T>>
where
    T: FromStr<Err = DomainError>,
{
    raw.map(str::parse).transpose()
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
