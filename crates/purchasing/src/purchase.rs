use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use marketplace_catalog::Item;
use marketplace_core::{BuyerId, DomainError, DomainResult, Entity, ItemId, Money, PurchaseId};

/// Hours after `purchased_at` during which a purchase may still be cancelled.
pub const CANCELLATION_WINDOW_HOURS: i64 = 24;

pub fn cancellation_window() -> Duration {
    Duration::hours(CANCELLATION_WINDOW_HOURS)
}

/// A recorded purchase of some units of one item by one buyer.
///
/// `unit_price` and `total_price` are a snapshot taken at purchase time; later
/// price changes on the item do not affect them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub buyer_id: BuyerId,
    pub item_id: ItemId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub purchased_at: DateTime<Utc>,
}

impl Purchase {
    /// Record a purchase of `quantity` units of `item` at its current price.
    ///
    /// Stock is not touched here; callers withdraw from the item first.
    pub fn record(
        id: PurchaseId,
        buyer_id: BuyerId,
        item: &Item,
        quantity: i64,
        purchased_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let total_price = Self::quote(item, quantity)?;
        Ok(Self {
            id,
            buyer_id,
            item_id: item.id,
            quantity,
            unit_price: item.price,
            total_price,
            purchased_at,
        })
    }

    /// Total price of `quantity` units of `item`, if such a purchase can be recorded.
    pub fn quote(item: &Item, quantity: i64) -> DomainResult<Money> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        let total_price = item.price.times(quantity)?;
        total_price.ensure_storable()?;
        Ok(total_price)
    }

    /// Last instant at which the purchase can still be cancelled.
    pub fn cancellation_deadline(&self) -> DateTime<Utc> {
        self.purchased_at + cancellation_window()
    }

    pub fn is_cancellable(&self, now: DateTime<Utc>) -> bool {
        now <= self.cancellation_deadline()
    }

    pub fn ensure_cancellable(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_cancellable(now) {
            return Err(DomainError::policy(format!(
                "purchase can only be cancelled within {CANCELLATION_WINDOW_HOURS} hours"
            )));
        }
        Ok(())
    }
}

impl Entity for Purchase {
    type Id = PurchaseId;
    const KIND: &'static str = "purchase";

    fn id(&self) -> Self::Id {
        self.id
    }
}
