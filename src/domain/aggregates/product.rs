//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Money, NameError, ProductName, Quantity};

#[derive(Clone, Debug)]
pub struct Product {
    id: String,
    name: ProductName,
    description: String,
    category_id: Option<String>,
    price: Money,
    stock: Quantity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

/// Persisted state of a product, used to rehydrate the aggregate.
#[derive(Clone, Debug)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_id: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a product; the price must be positive and the stock non-negative.
    pub fn create(id: impl Into<String>, name: &str, price: Money, stock: i64) -> Result<Self, ProductError> {
        let name = ProductName::new(name)?;
        validate_price(&price)?;
        let stock = validate_stock(stock)?;
        let id = id.into();
        let now = Utc::now();
        let mut product = Self {
            id: id.clone(), name: name.clone(), description: String::new(), category_id: None,
            price, stock: Quantity::new(stock), created_at: now, updated_at: now, events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, name: name.to_string() }));
        Ok(product)
    }

    pub fn restore(record: ProductRecord) -> Result<Self, ProductError> {
        Ok(Self {
            id: record.id,
            name: ProductName::new(record.name)?,
            description: record.description,
            category_id: record.category_id,
            price: record.price,
            stock: Quantity::new(record.stock),
            created_at: record.created_at,
            updated_at: record.updated_at,
            events: vec![],
        })
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn name(&self) -> &str { self.name.as_str() }
    pub fn description(&self) -> &str { &self.description }
    pub fn category_id(&self) -> Option<&str> { self.category_id.as_deref() }
    pub fn price(&self) -> &Money { &self.price }
    pub fn stock(&self) -> u32 { self.stock.value() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_available(&self) -> bool { !self.stock.is_zero() }

    pub fn describe(&mut self, description: impl Into<String>) { self.description = description.into(); self.touch(); }
    pub fn assign_category(&mut self, category_id: Option<String>) { self.category_id = category_id; self.touch(); }

    pub fn rename(&mut self, name: &str) -> Result<(), ProductError> {
        self.name = ProductName::new(name)?;
        self.touch();
        Ok(())
    }

    pub fn update_price(&mut self, new_price: Money) -> Result<(), ProductError> {
        validate_price(&new_price)?;
        self.price = new_price;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::PriceChanged { product_id: self.id.clone(), price: self.price.amount() }));
        Ok(())
    }

    /// Replaces the available quantity outright (administrative correction).
    pub fn set_stock(&mut self, quantity: i64) -> Result<(), ProductError> {
        self.stock = Quantity::new(validate_stock(quantity)?);
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockChanged { product_id: self.id.clone(), stock: self.stock.value() }));
        Ok(())
    }

    pub fn withdraw(&mut self, qty: u32) -> Result<(), ProductError> {
        self.stock = self.stock.subtract(qty).ok_or(ProductError::InsufficientStock { requested: qty, available: self.stock.value() })?;
        self.touch();
        Ok(())
    }

    pub fn restock(&mut self, qty: u32) { self.stock = self.stock.add(qty); self.touch(); }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

/// Largest accepted unit price: ten digits, two of them decimals.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);
pub const PRICE_DECIMALS: u32 = 2;

fn validate_price(price: &Money) -> Result<(), ProductError> {
    let amount = price.amount();
    if !price.is_positive() { return Err(ProductError::NonPositivePrice(amount)); }
    if amount > MAX_PRICE { return Err(ProductError::PriceTooLarge(amount)); }
    if amount.normalize().scale() > PRICE_DECIMALS { return Err(ProductError::PriceTooPrecise(amount)); }
    Ok(())
}

fn validate_stock(quantity: i64) -> Result<u32, ProductError> {
    if quantity < 0 { return Err(ProductError::NegativeStock(quantity)); }
    u32::try_from(quantity).map_err(|_| ProductError::StockTooLarge(quantity))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductError {
    #[error("Invalid product name: {0}")]
    InvalidName(#[from] NameError),
    #[error("Price must be greater than 0 (got {0})")]
    NonPositivePrice(Decimal),
    #[error("Price cannot exceed {max} (got {0})", max = MAX_PRICE)]
    PriceTooLarge(Decimal),
    #[error("Price can have at most {max} decimal places (got {0})", max = PRICE_DECIMALS)]
    PriceTooPrecise(Decimal),
    #[error("Quantity cannot be negative (got {0})")]
    NegativeStock(i64),
    #[error("Quantity {0} is too large")]
    StockTooLarge(i64),
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_product_create() {
        let p = Product::create("p-1", "Espresso", Money::cop(Decimal::new(3000, 0)), 60).unwrap();
        assert_eq!(p.name(), "Espresso");
        assert_eq!(p.stock(), 60);
        assert!(p.is_available());
    }
    #[test]
    fn test_rejects_invalid_price_and_stock() {
        assert_eq!(
            Product::create("p", "Free", Money::cop(Decimal::ZERO), 1).unwrap_err(),
            ProductError::NonPositivePrice(Decimal::ZERO)
        );
        assert_eq!(
            Product::create("p", "Ghost", Money::cop(Decimal::ONE), -1).unwrap_err(),
            ProductError::NegativeStock(-1)
        );
        let mut p = Product::create("p", "Muffin", Money::cop(Decimal::new(3200, 0)), 20).unwrap();
        assert!(p.update_price(Money::cop(Decimal::new(-5, 0))).is_err());
        assert!(p.set_stock(-3).is_err());
        assert_eq!(p.price().amount(), Decimal::new(3200, 0));
        assert_eq!(p.stock(), 20);
    }
    #[test]
    fn test_price_bounds() {
        assert_eq!(MAX_PRICE, Decimal::new(9_999_999_999, 2));
        assert!(Product::create("p", "Caviar", Money::cop(MAX_PRICE), 1).is_ok());
        assert_eq!(
            Product::create("p", "Gold", Money::cop(Decimal::MAX), 1).unwrap_err(),
            ProductError::PriceTooLarge(Decimal::MAX)
        );
        assert_eq!(
            Product::create("p", "Dust", Money::cop(Decimal::new(1, 3)), 1).unwrap_err(),
            ProductError::PriceTooPrecise(Decimal::new(1, 3))
        );
        assert!(Product::create("p", "Scone", Money::cop(Decimal::new(2750, 3)), 1).is_ok());
        let mut p = Product::create("p", "Tea", Money::cop(Decimal::new(3000, 0)), 1).unwrap();
        assert!(p.update_price(Money::cop(MAX_PRICE + Decimal::new(1, 2))).is_err());
        assert_eq!(p.price().amount(), Decimal::new(3000, 0));
    }
    #[test]
    fn test_availability_follows_stock() {
        let mut p = Product::create("p", "Latte", Money::cop(Decimal::new(5000, 0)), 2).unwrap();
        p.withdraw(2).unwrap();
        assert!(!p.is_available());
        assert!(p.withdraw(1).is_err());
        p.restock(4);
        assert_eq!(p.stock(), 4);
        assert!(p.is_available());
    }
    #[test]
    fn test_events_are_raised() {
        let mut p = Product::create("p", "Tea", Money::cop(Decimal::new(3000, 0)), 5).unwrap();
        p.update_price(Money::cop(Decimal::new(3100, 0))).unwrap();
        let events = p.take_events();
        assert_eq!(events.len(), 2);
        assert!(p.take_events().is_empty());
    }
}
