//! Value objects: equality by value, not identity.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two `Money`
/// amounts of `10.0` are interchangeable, two buyers named "Ann" are not.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// Longest address accepted (RFC 5321 path limit).
const MAX_EMAIL_LEN: usize = 254;

/// A validated, normalized email address.
///
/// Addresses are trimmed and lower-cased on construction, so uniqueness checks
/// against stored emails are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("email is required"));
        }
        if normalized.len() > MAX_EMAIL_LEN {
            return Err(DomainError::validation("email is too long"));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email should be valid"));
        }

        let (local, domain) = normalized
            .split_once('@')
            .ok_or_else(|| DomainError::validation("email should be valid"))?;
        let domain_ok = !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok {
            return Err(DomainError::validation("email should be valid"));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Email {}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// A non-negative monetary amount (single implicit currency).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Decimal places an amount may carry.
    pub const MAX_SCALE: u32 = 4;

    /// Exclusive upper bound of a single stored amount (a price or a purchase total).
    pub const MAX_STORED: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

    pub fn new(amount: Decimal) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        if amount.normalize().scale() > Self::MAX_SCALE {
            return Err(DomainError::validation(format!(
                "amount cannot have more than {} decimal places",
                Self::MAX_SCALE
            )));
        }
        Ok(Self(amount))
    }

    /// Check that the amount fits a price or total column.
    ///
    /// Sums (revenue, spending) are never stored and are not bounded.
    pub fn ensure_storable(&self) -> DomainResult<()> {
        if self.0 >= Self::MAX_STORED {
            return Err(DomainError::validation(format!(
                "amount must be below {}",
                Self::MAX_STORED
            )));
        }
        Ok(())
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Price of `quantity` units at this unit amount.
    pub fn times(&self, quantity: i64) -> DomainResult<Money> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Money)
            .ok_or_else(|| DomainError::validation("total price overflows"))
    }

    pub fn checked_add(&self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("amount overflows"))
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = Email::parse("  Ann.Lee@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "ann.lee@example.com");
    }

    #[test]
    fn email_rejects_malformed_addresses() {
        for raw in ["", "   ", "ann", "ann@", "@example.com", "ann@example", "a b@example.com", "a@b@c.com", "ann@.com"] {
            let err = Email::parse(raw).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn email_deserialization_validates() {
        let ok: Email = serde_json::from_str("\"Bob@Shop.io\"").unwrap();
        assert_eq!(ok.as_str(), "bob@shop.io");
        assert!(serde_json::from_str::<Email>("\"nope\"").is_err());
    }

    #[test]
    fn money_rejects_negative_amounts() {
        assert!(Money::new(Decimal::new(-1, 2)).is_err());
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn money_rejects_more_than_four_decimal_places() {
        assert!(matches!(Money::new(Decimal::new(4, 5)), Err(DomainError::Validation(_))));
        assert!(Money::new(Decimal::new(12345, 4)).is_ok());
        // Trailing zeros do not count.
        assert!(Money::new(Decimal::new(1_000_000, 6)).is_ok());
    }

    #[test]
    fn storable_bound_is_ten_to_the_fifteenth() {
        assert_eq!(Money::MAX_STORED, Decimal::new(1_000_000_000_000_000, 0));
        let below = Money::new(Decimal::new(999_999_999_999_999_999, 4)).unwrap();
        assert!(below.ensure_storable().is_ok());
        let at = Money::new(Money::MAX_STORED).unwrap();
        assert!(matches!(at.ensure_storable(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn money_times_quantity() {
        let price = Money::new(Decimal::new(100, 1)).unwrap();
        assert_eq!(price.times(3).unwrap().amount(), Decimal::new(30, 0));
    }

    #[test]
    fn money_times_reports_overflow() {
        let price = Money::new(Decimal::MAX).unwrap();
        assert!(matches!(price.times(2), Err(DomainError::Validation(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            .. ProptestConfig::default()
        })]

        #[test]
        fn times_matches_repeated_addition(cents in 1i64..1_000_000, quantity in 0i64..50) {
            let price = Money::new(Decimal::new(cents, 2)).unwrap();
            let mut sum = Money::ZERO;
            for _ in 0..quantity {
                sum = sum.checked_add(price).unwrap();
            }
            prop_assert_eq!(price.times(quantity).unwrap(), sum);
        }
    }
}
