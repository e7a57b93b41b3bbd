//! Value Objects for the cafeteria domain

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CURRENCY: &str = "COP";

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn cop(amount: Decimal) -> Self { Self::new(amount, DEFAULT_CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_positive(&self) -> bool { self.amount > Decimal::ZERO }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        let amount = self.amount.checked_add(other.amount).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Result<Money, MoneyError> {
        let amount = self.amount.checked_mul(Decimal::from(qty)).ok_or(MoneyError::Overflow)?;
        Ok(Money::new(amount, &self.currency))
    }
}

impl Default for Money { fn default() -> Self { Self::zero(DEFAULT_CURRENCY) } }

/// Renders as `$3,500` or `$7.50`; the currency code is left to the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.amount.round_dp(2);
        let digits = rounded.trunc().abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 { grouped.push(','); }
            grouped.push(ch);
        }
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        let cents = (rounded.fract().abs() * Decimal::ONE_HUNDRED).trunc().to_u32().unwrap_or(0);
        if cents == 0 { write!(f, "{sign}${grouped}") } else { write!(f, "{sign}${grouped}.{cents:02}") }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("Currency mismatch")]
    CurrencyMismatch,
    #[error("Amount is out of range")]
    Overflow,
}

/// Quantity value object
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 { None } else { Some(Self(self.0 - other)) }
    }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

/// Display name of a product, trimmed and bounded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductName(String);

impl ProductName {
    pub const MAX_LEN: usize = 100;

    pub fn new(value: impl Into<String>) -> Result<Self, NameError> {
        let value = value.into().trim().to_string();
        if value.is_empty() { return Err(NameError::Empty); }
        if value.chars().count() > Self::MAX_LEN { return Err(NameError::TooLong(Self::MAX_LEN)); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("Name cannot be empty")]
    Empty,
    #[error("Name is longer than {0} characters")]
    TooLong(usize),
}

/// Dine-in table code: `M` followed by three digits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCode(String);

impl TableCode {
    pub fn new(value: &str) -> Result<Self, TableCodeError> {
        let value = value.trim();
        let mut chars = value.chars();
        let valid = chars.next() == Some('M')
            && value.len() == 4
            && chars.all(|c| c.is_ascii_digit());
        if !valid { return Err(TableCodeError(value.to_string())); }
        Ok(Self(value.to_string()))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid table code '{0}', expected M followed by three digits")]
pub struct TableCodeError(pub String);

/// Customer rating for a delivered order, 1 to 5 stars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: u8) -> Result<Self, RatingError> {
        if !(1..=5).contains(&stars) { return Err(RatingError(stars)); }
        Ok(Self(stars))
    }
    pub fn stars(&self) -> u8 { self.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Rating must be between 1 and 5, got {0}")]
pub struct RatingError(pub u8);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    #[default]
    Takeaway,
    DineIn,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Takeaway => "takeaway", Self::DineIn => "dine_in", Self::Delivery => "delivery" }
    }
}

impl FromStr for OrderType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "takeaway" => Ok(Self::Takeaway),
            "dine_in" => Ok(Self::DineIn),
            "delivery" => Ok(Self::Delivery),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Digital,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Cash => "cash", Self::Card => "card", Self::Digital => "digital" }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "digital" => Ok(Self::Digital),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown value '{0}'")]
pub struct UnknownVariant(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_money_add() {
        let a = Money::cop(Decimal::new(3000, 0));
        let b = Money::cop(Decimal::new(500, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(3500, 0));
        assert_eq!(a.add(&Money::new(Decimal::ONE, "USD")), Err(MoneyError::CurrencyMismatch));
    }
    #[test]
    fn test_money_overflow_is_an_error() {
        let huge = Money::cop(Decimal::MAX);
        assert_eq!(huge.add(&Money::cop(Decimal::ONE)), Err(MoneyError::Overflow));
        assert_eq!(huge.multiply(2), Err(MoneyError::Overflow));
        assert_eq!(Money::cop(Decimal::new(750, 2)).multiply(3).unwrap().amount(), Decimal::new(2250, 2));
    }
    #[test]
    fn test_money_display() {
        assert_eq!(Money::cop(Decimal::new(3500, 0)).to_string(), "$3,500");
        assert_eq!(Money::cop(Decimal::new(1234567, 0)).to_string(), "$1,234,567");
        assert_eq!(Money::cop(Decimal::new(750, 2)).to_string(), "$7.50");
        assert_eq!(Money::cop(Decimal::ZERO).to_string(), "$0");
    }
    #[test]
    fn test_quantity_subtract() {
        assert_eq!(Quantity::new(5).subtract(2), Some(Quantity::new(3)));
        assert_eq!(Quantity::new(1).subtract(2), None);
    }
    #[test]
    fn test_product_name() {
        assert_eq!(ProductName::new("  Latte ").unwrap().as_str(), "Latte");
        assert_eq!(ProductName::new("   "), Err(NameError::Empty));
        assert!(ProductName::new("x".repeat(101)).is_err());
    }
    #[test]
    fn test_table_code() {
        assert!(TableCode::new("M012").is_ok());
        assert!(TableCode::new("M12").is_err());
        assert!(TableCode::new("X123").is_err());
        assert!(TableCode::new("M1a3").is_err());
    }
    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert_eq!(Rating::new(5).unwrap().stars(), 5);
        assert!(Rating::new(6).is_err());
    }
}
