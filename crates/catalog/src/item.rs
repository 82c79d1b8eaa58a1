use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marketplace_core::{DomainError, DomainResult, Entity, ItemId, Money, SellerId};

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Validated mutable fields of an item (name, description, price, stock).
///
/// Creating an item and updating one both take a full `ItemDetails`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    name: String,
    description: Option<String>,
    price: Money,
    quantity: i64,
}

impl ItemDetails {
    pub fn new(
        name: &str,
        description: Option<&str>,
        price: Decimal,
        quantity: i64,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation("name is too long"));
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        if let Some(d) = &description {
            if d.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(DomainError::validation(format!(
                    "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
                )));
            }
        }

        if price <= Decimal::ZERO {
            return Err(DomainError::validation("price must be positive"));
        }
        if quantity < 0 {
            return Err(DomainError::validation("quantity must be zero or positive"));
        }

        let price = Money::new(price)?;
        price.ensure_storable()?;

        Ok(Self {
            name: name.to_string(),
            description,
            price,
            quantity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// A catalog item offered by a seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub seller_id: SellerId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    /// Units in stock; never negative.
    pub quantity: i64,
    pub listed_at: DateTime<Utc>,
}

impl Item {
    pub fn list(id: ItemId, seller_id: SellerId, details: ItemDetails, listed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            seller_id,
            name: details.name,
            description: details.description,
            price: details.price,
            quantity: details.quantity,
            listed_at,
        }
    }

    /// Overwrite name, description, price and stock.
    ///
    /// Purchases already recorded keep their own price snapshot.
    pub fn revise(&mut self, details: ItemDetails) {
        self.name = details.name;
        self.description = details.description;
        self.price = details.price;
        self.quantity = details.quantity;
    }

    pub fn set_quantity(&mut self, quantity: i64) -> DomainResult<()> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity must be zero or positive"));
        }
        self.quantity = quantity;
        Ok(())
    }

    /// Check that `requested` units could be taken from stock right now.
    ///
    /// Non-positive requests are a validation error, checked before stock.
    pub fn ensure_can_supply(&self, requested: i64) -> DomainResult<()> {
        if requested <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if self.quantity < requested {
            return Err(DomainError::insufficient_stock(self.quantity, requested));
        }
        Ok(())
    }

    pub fn is_available(&self, requested: i64) -> bool {
        self.ensure_can_supply(requested).is_ok()
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// Take `requested` units out of stock.
    pub fn withdraw(&mut self, requested: i64) -> DomainResult<()> {
        self.ensure_can_supply(requested)?;
        self.quantity -= requested;
        Ok(())
    }

    /// Put `returned` units back into stock (purchase cancellation).
    pub fn restock(&mut self, returned: i64) -> DomainResult<()> {
        if returned <= 0 {
            return Err(DomainError::validation("restocked quantity must be positive"));
        }
        self.quantity = self
            .quantity
            .checked_add(returned)
            .ok_or_else(|| DomainError::validation("stock quantity overflows"))?;
        Ok(())
    }

    /// Items referenced by purchases cannot be removed.
    pub fn ensure_deletable(&self, purchase_count: u64) -> DomainResult<()> {
        if purchase_count > 0 {
            return Err(DomainError::policy(format!(
                "cannot delete item with existing purchases ({purchase_count})"
            )));
        }
        Ok(())
    }
}

impl Entity for Item {
    type Id = ItemId;
    const KIND: &'static str = "item";

    fn id(&self) -> Self::Id {
        self.id
    }
}
