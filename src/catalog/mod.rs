//! Menu manager for the counter console.
//!
//! Products are kept in menu order and addressed by their 1-based position,
//! which is what the operator types. The product name doubles as its id.

mod store;

pub use store::{from_json, load_or_seed, to_json, CatalogStore, JsonFileStore, MemoryStore, MenuEntry, StoreError};

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::aggregates::{Product, ProductError, StockLedger};
use crate::domain::value_objects::Money;

const DEFAULT_MENU: [(&str, i64, i64); 10] = [
    ("Americano", 3500, 50),
    ("Café au Lait", 4000, 40),
    ("Cappuccino", 4500, 30),
    ("Latte", 5000, 25),
    ("Espresso", 3000, 60),
    ("Green Tea", 3000, 20),
    ("Hot Chocolate", 4200, 15),
    ("Croissant", 2800, 30),
    ("Muffin", 3200, 20),
    ("Sandwich", 6500, 15),
];

#[derive(Clone, Debug)]
pub struct Catalog {
    products: Vec<Product>,
    currency: String,
}

impl Catalog {
    pub fn new(currency: &str) -> Self { Self { products: vec![], currency: currency.to_string() } }

    /// The menu a fresh installation starts with.
    pub fn with_defaults(currency: &str) -> Self {
        let mut catalog = Self::new(currency);
        for (name, price, quantity) in DEFAULT_MENU {
            if let Err(e) = catalog.add_product(name, Decimal::from(price), quantity) {
                debug!(error = %e, name, "skipping default menu entry");
            }
        }
        catalog
    }

    pub fn from_entries(entries: Vec<(String, MenuEntry)>, currency: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(currency);
        for (name, entry) in entries {
            catalog.add_product(&name, entry.price, i64::from(entry.quantity))?;
        }
        Ok(catalog)
    }

    pub fn entries(&self) -> Vec<(String, MenuEntry)> {
        self.products.iter()
            .map(|p| (p.name().to_string(), MenuEntry { price: p.price().amount(), quantity: p.stock() }))
            .collect()
    }

    pub fn currency(&self) -> &str { &self.currency }
    pub fn products(&self) -> &[Product] { &self.products }
    pub fn len(&self) -> usize { self.products.len() }
    pub fn is_empty(&self) -> bool { self.products.is_empty() }
    pub fn get(&self, name: &str) -> Option<&Product> { self.products.iter().find(|p| p.name() == name) }

    pub fn by_position(&self, position: usize) -> Result<&Product, CatalogError> {
        position.checked_sub(1).and_then(|idx| self.products.get(idx)).ok_or(CatalogError::NotFound(position))
    }

    pub fn add_product(&mut self, name: &str, price: Decimal, quantity: i64) -> Result<&Product, CatalogError> {
        let name = name.trim();
        if self.get(name).is_some() { return Err(CatalogError::Duplicate(name.to_string())); }
        let product = Product::create(name, name, Money::new(price, &self.currency), quantity)?;
        self.products.push(product);
        Ok(&self.products[self.products.len() - 1])
    }

    pub fn remove_product(&mut self, position: usize) -> Result<Product, CatalogError> {
        let idx = self.index_of(position)?;
        Ok(self.products.remove(idx))
    }

    pub fn change_price(&mut self, position: usize, price: Decimal) -> Result<&Product, CatalogError> {
        let idx = self.index_of(position)?;
        let currency = self.currency.clone();
        let product = &mut self.products[idx];
        product.update_price(Money::new(price, &currency))?;
        Ok(&*product)
    }

    pub fn change_quantity(&mut self, position: usize, quantity: i64) -> Result<&Product, CatalogError> {
        let idx = self.index_of(position)?;
        let product = &mut self.products[idx];
        product.set_stock(quantity)?;
        Ok(&*product)
    }

    fn index_of(&self, position: usize) -> Result<usize, CatalogError> {
        match position.checked_sub(1) {
            Some(idx) if idx < self.products.len() => Ok(idx),
            _ => Err(CatalogError::NotFound(position)),
        }
    }
}

impl StockLedger for Catalog {
    fn available(&self, product_id: &str) -> Option<u32> {
        self.products.iter().find(|p| p.id() == product_id).map(Product::stock)
    }

    fn set_available(&mut self, product_id: &str, quantity: u32) {
        if let Some(product) = self.products.iter_mut().find(|p| p.id() == product_id) {
            let current = product.stock();
            if quantity > current {
                product.restock(quantity - current);
            } else if let Err(e) = product.withdraw(current - quantity) {
                warn!(product_id, error = %e, "stock update rejected");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Product '{0}' already exists on the menu")]
    Duplicate(String),
    #[error("No product with ID {0}")]
    NotFound(usize),
    #[error(transparent)]
    Product(#[from] ProductError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Order;

    #[test]
    fn test_defaults() {
        let catalog = Catalog::with_defaults("COP");
        assert_eq!(catalog.len(), 10);
        let espresso = catalog.get("Espresso").unwrap();
        assert_eq!(espresso.price().amount(), Decimal::from(3000));
        assert_eq!(espresso.stock(), 60);
        assert_eq!(catalog.by_position(1).unwrap().name(), "Americano");
    }

    #[test]
    fn test_admin_edits_validate() {
        let mut catalog = Catalog::with_defaults("COP");
        assert_eq!(catalog.add_product("Latte", Decimal::from(1), 1).unwrap_err(), CatalogError::Duplicate("Latte".into()));
        assert!(matches!(catalog.add_product("", Decimal::from(1), 1), Err(CatalogError::Product(ProductError::InvalidName(_)))));
        assert!(matches!(catalog.add_product("Scone", Decimal::ZERO, 1), Err(CatalogError::Product(ProductError::NonPositivePrice(_)))));
        assert!(matches!(catalog.add_product("Scone", Decimal::from(2500), -1), Err(CatalogError::Product(ProductError::NegativeStock(-1)))));
        assert!(matches!(catalog.add_product("Gold", Decimal::MAX, 5), Err(CatalogError::Product(ProductError::PriceTooLarge(_)))));
        assert!(matches!(catalog.add_product("Scone", Decimal::new(25001, 3), 5), Err(CatalogError::Product(ProductError::PriceTooPrecise(_)))));
        assert_eq!(catalog.len(), 10);

        catalog.add_product("Scone", Decimal::from(2500), 0).unwrap();
        assert!(!catalog.by_position(11).unwrap().is_available());
        assert!(catalog.change_price(11, Decimal::from(-1)).is_err());
        assert!(catalog.change_price(11, Decimal::from(100_000_000)).is_err());
        assert_eq!(catalog.change_price(11, Decimal::from(2700)).unwrap().price().amount(), Decimal::from(2700));
        assert_eq!(catalog.change_quantity(11, 12).unwrap().stock(), 12);
        assert_eq!(catalog.change_quantity(12, 1).unwrap_err(), CatalogError::NotFound(12));
        assert_eq!(catalog.by_position(0).unwrap_err(), CatalogError::NotFound(0));
        assert_eq!(catalog.remove_product(11).unwrap().name(), "Scone");
        assert!(catalog.get("Scone").is_none());
    }

    #[test]
    fn test_confirm_against_catalog() {
        let mut catalog = Catalog::with_defaults("COP");
        let mut order = Order::create("walk-in", "COP");
        order.add_item(catalog.get("Espresso").unwrap(), 2).unwrap();
        order.confirm(&mut catalog).unwrap();
        assert_eq!(catalog.get("Espresso").unwrap().stock(), 58);
    }
}
