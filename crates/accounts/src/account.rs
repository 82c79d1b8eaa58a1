use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marketplace_core::{BuyerId, DomainError, DomainResult, Email, Entity, SellerId};

const MAX_NAME_LEN: usize = 255;

/// Validated identity fields shared by buyer and seller accounts.
///
/// Used both for registration and for updates (updates overwrite both fields).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    name: String,
    email: Email,
}

impl AccountDetails {
    pub fn new(name: &str, email: &str) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation("name is too long"));
        }
        Ok(Self {
            name: name.to_string(),
            email: Email::parse(email)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }
}

/// A marketplace customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: BuyerId,
    pub name: String,
    pub email: Email,
    pub registered_at: DateTime<Utc>,
}

/// A marketplace merchant owning catalog items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub name: String,
    pub email: Email,
    pub registered_at: DateTime<Utc>,
}

macro_rules! impl_account {
    ($t:ident, $id:ty, $kind:literal) => {
        impl $t {
            pub fn register(id: $id, details: AccountDetails, registered_at: DateTime<Utc>) -> Self {
                Self {
                    id,
                    name: details.name,
                    email: details.email,
                    registered_at,
                }
            }

            /// Whether applying `details` would move this account to a different email.
            pub fn changes_email(&self, details: &AccountDetails) -> bool {
                self.email != details.email
            }

            pub fn apply_details(&mut self, details: AccountDetails) {
                self.name = details.name;
                self.email = details.email;
            }
        }

        impl Entity for $t {
            type Id = $id;
            const KIND: &'static str = $kind;

            fn id(&self) -> Self::Id {
                self.id
            }
        }
    };
}

impl_account!(Buyer, BuyerId, "buyer");
impl_account!(Seller, SellerId, "seller");

impl Buyer {
    /// Buyers with purchase history cannot be removed.
    pub fn ensure_deletable(&self, purchase_count: u64) -> DomainResult<()> {
        if purchase_count > 0 {
            return Err(DomainError::policy(format!(
                "cannot delete buyer with existing purchases ({purchase_count})"
            )));
        }
        Ok(())
    }
}

impl Seller {
    /// Sellers still owning catalog items cannot be removed.
    pub fn ensure_deletable(&self, item_count: u64) -> DomainResult<()> {
        if item_count > 0 {
            return Err(DomainError::policy(format!(
                "cannot delete seller with existing items ({item_count})"
            )));
        }
        Ok(())
    }
}

/// Email uniqueness rule.
///
/// `holder` is whoever currently owns `email` (if anyone); `claimant` is the
/// account asking for it (`None` for a new registration). Re-claiming your own
/// address is allowed.
pub fn ensure_email_free<I: PartialEq>(
    kind: &'static str,
    email: &Email,
    holder: Option<I>,
    claimant: Option<I>,
) -> DomainResult<()> {
    match holder {
        Some(holder) if Some(&holder) != claimant.as_ref() => Err(DomainError::conflict(format!(
            "{kind} with email {email} already exists"
        ))),
        _ => Ok(()),
    }
}
