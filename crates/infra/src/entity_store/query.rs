//! Filters, pagination and paged results for entity queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{BuyerId, ItemId, Money, SellerId};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 1000;

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of records matching the filter (across all pages).
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, pagination: Pagination) -> Self {
        let has_more = total > u64::from(pagination.offset) + u64::from(pagination.limit);
        Self {
            items,
            total,
            pagination,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            pagination: self.pagination,
            has_more: self.has_more,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Only buyers with at least one purchase.
    pub with_purchases: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Only sellers owning at least one item.
    pub with_items: bool,
    /// Only sellers with at least one purchase of one of their items.
    pub with_sales: bool,
}

/// Item listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub seller_id: Option<SellerId>,
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    /// Only items with stock left.
    pub available_only: bool,
    /// Low-stock threshold: only items with `quantity <= max_quantity`.
    pub max_quantity: Option<i64>,
    pub sort: ItemSort,
}

impl ItemFilter {
    pub fn by_seller(seller_id: SellerId) -> Self {
        Self {
            seller_id: Some(seller_id),
            ..Default::default()
        }
    }
}

/// Purchase query filter. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseFilter {
    pub buyer_id: Option<BuyerId>,
    pub item_id: Option<ItemId>,
    /// Purchases of items owned by this seller.
    pub seller_id: Option<SellerId>,
    /// Inclusive lower bound on `purchased_at`.
    pub purchased_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `purchased_at`.
    pub purchased_to: Option<DateTime<Utc>>,
}

impl PurchaseFilter {
    pub fn by_buyer(buyer_id: BuyerId) -> Self {
        Self {
            buyer_id: Some(buyer_id),
            ..Default::default()
        }
    }

    pub fn by_item(item_id: ItemId) -> Self {
        Self {
            item_id: Some(item_id),
            ..Default::default()
        }
    }

    pub fn by_seller(seller_id: SellerId) -> Self {
        Self {
            seller_id: Some(seller_id),
            ..Default::default()
        }
    }
}

/// Units sold per item, for the most-purchased ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSales {
    pub item_id: ItemId,
    pub item_name: String,
    pub total_quantity: i64,
}

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
pub(crate) fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub(crate) fn name_matches(name: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => name.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_caps_limit() {
        let p = Pagination::new(Some(5000), None);
        assert_eq!(p.limit, MAX_LIMIT);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn page_reports_more_when_total_exceeds_window() {
        let page = Page::new(vec![1, 2], 5, Pagination::new(Some(2), Some(0)));
        assert!(page.has_more);
        let last = Page::new(vec![5], 5, Pagination::new(Some(2), Some(4)));
        assert!(!last.has_more);
    }

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn name_match_is_case_insensitive() {
        assert!(name_matches("Blue Widget", Some("WIDG")));
        assert!(!name_matches("Blue Widget", Some("gadget")));
        assert!(name_matches("anything", None));
    }
}
