//! Order Aggregate
//!
//! Lifecycle: `pending -> confirmed -> in_preparation -> ready -> delivered`,
//! with `cancelled` reachable from `pending` or `confirmed`. Items can only
//! change while the order is pending, and the total is always recomputed
//! from the items after a mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::product::Product;
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::{Money, MoneyError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    InPreparation,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending, Self::Confirmed, Self::InPreparation, Self::Ready, Self::Delivered, Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InPreparation => "in_preparation",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::InPreparation => "In preparation",
            Self::Ready => "Ready for pickup",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }
    pub fn is_cancellable(&self) -> bool { matches!(self, Self::Pending | Self::Confirmed) }

    /// Next status reachable through `advance`. Leaving `pending` goes through `confirm` instead.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Confirmed => Some(Self::InPreparation),
            Self::InPreparation => Some(Self::Ready),
            Self::Ready => Some(Self::Delivered),
            Self::Pending | Self::Delivered | Self::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|status| status.as_str() == s).ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

/// One product line. The subtotal is recomputed whenever price or quantity changes.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderItem {
    id: String,
    product_id: String,
    name: String,
    unit_price: Money,
    quantity: u32,
    subtotal: Money,
}

impl OrderItem {
    pub fn restore(id: impl Into<String>, product_id: impl Into<String>, name: impl Into<String>, unit_price: Money, quantity: u32) -> Result<Self, OrderError> {
        let subtotal = unit_price.multiply(quantity)?;
        Ok(Self { id: id.into(), product_id: product_id.into(), name: name.into(), unit_price, quantity, subtotal })
    }

    fn repriced(&self, unit_price: Money, quantity: u32) -> Result<Self, OrderError> {
        Self::restore(self.id.clone(), self.product_id.clone(), self.name.clone(), unit_price, quantity)
    }
    pub fn id(&self) -> &str { &self.id }
    pub fn product_id(&self) -> &str { &self.product_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn unit_price(&self) -> &Money { &self.unit_price }
    pub fn quantity(&self) -> u32 { self.quantity }
    pub fn subtotal(&self) -> Money { self.subtotal.clone() }
}

/// Units of one product committed to (or released from) an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Source of truth for available stock, keyed by product id.
///
/// `set_available` is only called for ids that `available` reported, after
/// every line of an order has been validated, so a confirmation either
/// writes all of its levels or none.
pub trait StockLedger {
    fn available(&self, product_id: &str) -> Option<u32>;
    fn set_available(&mut self, product_id: &str, quantity: u32);
}

impl StockLedger for HashMap<String, u32> {
    fn available(&self, product_id: &str) -> Option<u32> { self.get(product_id).copied() }
    fn set_available(&mut self, product_id: &str, quantity: u32) {
        if let Some(level) = self.get_mut(product_id) { *level = quantity; }
    }
}

/// Returns released units to the ledger. Unknown products are skipped.
pub fn restock(ledger: &mut impl StockLedger, lines: &[StockLine]) {
    for line in lines {
        if let Some(level) = ledger.available(&line.product_id) {
            ledger.set_available(&line.product_id, level.saturating_add(line.quantity));
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemAdjustment {
    Updated { quantity: u32 },
    Removed,
}

#[derive(Clone, Debug)]
pub struct Order {
    id: String,
    customer_id: String,
    status: OrderStatus,
    items: Vec<OrderItem>,
    total: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

/// Persisted state of an order, used to rehydrate the aggregate.
#[derive(Clone, Debug)]
pub struct OrderRecord {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn create(customer_id: impl Into<String>, currency: &str) -> Self {
        let id = Uuid::now_v7().to_string();
        let customer_id = customer_id.into();
        let now = Utc::now();
        let mut order = Self {
            id: id.clone(), customer_id: customer_id.clone(), status: OrderStatus::Pending, items: vec![],
            total: Money::zero(currency), currency: currency.to_string(), created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Created { order_id: id, customer_id }));
        order
    }

    pub fn restore(record: OrderRecord) -> Result<Self, OrderError> {
        let total = items_total(&record.items, &record.currency)?;
        Ok(Self {
            id: record.id, customer_id: record.customer_id, status: record.status, items: record.items,
            total, currency: record.currency,
            created_at: record.created_at, updated_at: record.updated_at, events: vec![],
        })
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn total(&self) -> &Money { &self.total }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn item(&self, item_id: &str) -> Option<&OrderItem> { self.items.iter().find(|i| i.id == item_id) }

    /// Adds `quantity` units of `product`, merging with an existing line for the same product.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), OrderError> {
        self.ensure_editable()?;
        if quantity == 0 { return Err(OrderError::InvalidQuantity); }
        if !product.is_available() { return Err(OrderError::ProductUnavailable(product.name().to_string())); }
        if product.price().currency() != self.currency { return Err(OrderError::CurrencyMismatch); }

        let existing = self.items.iter().position(|i| i.product_id == product.id());
        let current = existing.map_or(0, |idx| self.items[idx].quantity);
        let requested = current.saturating_add(quantity);
        if requested > product.stock() {
            return Err(OrderError::InsufficientStock { product: product.name().to_string(), requested, available: product.stock() });
        }

        let mut items = self.items.clone();
        match existing {
            Some(idx) => items[idx] = items[idx].repriced(product.price().clone(), requested)?,
            None => items.push(OrderItem::restore(Uuid::now_v7().to_string(), product.id(), product.name(), product.price().clone(), quantity)?),
        }
        self.replace_items(items)
    }

    /// Changes an item's quantity by `delta`. Growing re-checks the ledger; reaching zero removes the item.
    pub fn adjust_item(&mut self, item_id: &str, delta: i64, stock: &impl StockLedger) -> Result<ItemAdjustment, OrderError> {
        self.ensure_editable()?;
        if delta == 0 { return Err(OrderError::InvalidQuantity); }
        let idx = self.items.iter().position(|i| i.id == item_id).ok_or_else(|| OrderError::ItemNotFound(item_id.to_string()))?;

        let target = i64::from(self.items[idx].quantity) + delta;
        let mut items = self.items.clone();
        let outcome = if target <= 0 {
            items.remove(idx);
            ItemAdjustment::Removed
        } else {
            let item = &self.items[idx];
            let requested = u32::try_from(target).map_err(|_| OrderError::InvalidQuantity)?;
            if delta > 0 {
                let available = stock.available(&item.product_id).ok_or_else(|| OrderError::ProductNotFound(item.product_id.clone()))?;
                if requested > available {
                    return Err(OrderError::InsufficientStock { product: item.name.clone(), requested, available });
                }
            }
            items[idx] = item.repriced(item.unit_price.clone(), requested)?;
            ItemAdjustment::Updated { quantity: requested }
        };
        self.replace_items(items)?;
        Ok(outcome)
    }

    pub fn remove_item(&mut self, item_id: &str) -> Result<OrderItem, OrderError> {
        self.ensure_editable()?;
        let idx = self.items.iter().position(|i| i.id == item_id).ok_or_else(|| OrderError::ItemNotFound(item_id.to_string()))?;
        let mut items = self.items.clone();
        let removed = items.remove(idx);
        self.replace_items(items)?;
        Ok(removed)
    }

    /// Locks in the order: validates every line against the ledger, then
    /// decrements all of them and moves to `confirmed`. Any failure leaves
    /// both the ledger and the order untouched.
    pub fn confirm(&mut self, ledger: &mut impl StockLedger) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Confirmed });
        }
        if self.items.is_empty() { return Err(OrderError::NoItems); }

        let mut levels = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let available = ledger.available(&item.product_id).ok_or_else(|| OrderError::ProductNotFound(item.product_id.clone()))?;
            if item.quantity > available {
                return Err(OrderError::InsufficientStock { product: item.name.clone(), requested: item.quantity, available });
            }
            levels.push((item.product_id.as_str(), available - item.quantity));
        }
        for (product_id, level) in levels {
            ledger.set_available(product_id, level);
        }

        self.status = OrderStatus::Confirmed;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Confirmed { order_id: self.id.clone(), total: self.total.amount() }));
        Ok(())
    }

    /// Cancels a pending or confirmed order. Returns the stock committed by
    /// confirmation (empty for a pending order); restocking is the caller's call.
    pub fn cancel(&mut self) -> Result<Vec<StockLine>, OrderError> {
        if !self.status.is_cancellable() {
            return Err(OrderError::InvalidTransition { from: self.status, to: OrderStatus::Cancelled });
        }
        let committed = if self.status == OrderStatus::Confirmed { self.stock_lines() } else { vec![] };
        self.status = OrderStatus::Cancelled;
        self.touch();
        let restockable_units = committed.iter().map(|l| l.quantity).sum();
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id.clone(), restockable_units }));
        Ok(committed)
    }

    /// Staff transition along `confirmed -> in_preparation -> ready -> delivered`.
    pub fn advance(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if self.status.next() != Some(next) {
            return Err(OrderError::InvalidTransition { from: self.status, to: next });
        }
        self.status = next;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Advanced { order_id: self.id.clone(), status: next }));
        Ok(())
    }

    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.items.iter().map(|i| StockLine { product_id: i.product_id.clone(), quantity: i.quantity }).collect()
    }

    pub fn receipt(&self, customer_name: &str) -> Receipt {
        Receipt {
            order_id: self.id.clone(),
            date: self.created_at,
            customer: customer_name.to_string(),
            items: self.items.iter().map(|i| ReceiptLine {
                product: i.name.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price.clone(),
                subtotal: i.subtotal(),
            }).collect(),
            total: self.total.clone(),
            status: self.status,
            status_label: self.status.label().to_string(),
        }
    }

    /// Progress steps; every step up to the current status is complete.
    pub fn progress(&self) -> Vec<ProgressStep> {
        let current = PROGRESS_STEPS.iter().position(|(_, status)| *status == self.status);
        PROGRESS_STEPS.iter().enumerate().map(|(idx, (name, status))| ProgressStep {
            name: (*name).to_string(),
            status: *status,
            completed: current.is_some_and(|c| idx <= c),
        }).collect()
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }

    fn ensure_editable(&self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending { return Err(OrderError::NotEditable(self.status)); }
        Ok(())
    }

    /// Swaps in the edited lines only if their total is representable.
    fn replace_items(&mut self, items: Vec<OrderItem>) -> Result<(), OrderError> {
        self.total = items_total(&items, &self.currency)?;
        self.items = items;
        self.touch();
        Ok(())
    }

    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

fn items_total(items: &[OrderItem], currency: &str) -> Result<Money, MoneyError> {
    items.iter().try_fold(Money::zero(currency), |acc, i| acc.add(&i.subtotal))
}

const PROGRESS_STEPS: [(&str, OrderStatus); 4] = [
    ("Order received", OrderStatus::Confirmed),
    ("In preparation", OrderStatus::InPreparation),
    ("Ready for pickup", OrderStatus::Ready),
    ("Delivered", OrderStatus::Delivered),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Receipt {
    pub order_id: String,
    pub date: DateTime<Utc>,
    pub customer: String,
    pub items: Vec<ReceiptLine>,
    pub total: Money,
    pub status: OrderStatus,
    pub status_label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReceiptLine {
    pub product: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressStep {
    pub name: String,
    pub status: OrderStatus,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("No items in the order")]
    NoItems,
    #[error("Quantity must be greater than 0")]
    InvalidQuantity,
    #[error("{0} is not available")]
    ProductUnavailable(String),
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("Only {available} units of {product} available (requested {requested})")]
    InsufficientStock { product: String, requested: u32, available: u32 },
    #[error("Order is {0} and can no longer be edited")]
    NotEditable(OrderStatus),
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Unknown order status '{0}'")]
    UnknownStatus(String),
    #[error("Product priced in a different currency")]
    CurrencyMismatch,
    #[error(transparent)]
    Amount(#[from] MoneyError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::ProductRecord;
    use rust_decimal::Decimal;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product::create(id, id, Money::cop(Decimal::new(price, 0)), stock).unwrap()
    }

    fn ledger(products: &[&Product]) -> HashMap<String, u32> {
        products.iter().map(|p| (p.id().to_string(), p.stock())).collect()
    }

    #[test]
    fn test_espresso_scenario() {
        let espresso = product("Espresso", 3000, 60);
        let mut stock = ledger(&[&espresso]);
        let mut order = Order::create("walk-in", "COP");
        order.add_item(&espresso, 2).unwrap();
        assert_eq!(order.total().amount(), Decimal::new(6000, 0));

        order.confirm(&mut stock).unwrap();
        assert_eq!(stock["Espresso"], 58);
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn test_total_matches_items_after_every_mutation() {
        let latte = product("Latte", 5000, 25);
        let muffin = product("Muffin", 3200, 20);
        let stock = ledger(&[&latte, &muffin]);
        let mut order = Order::create("c", "COP");
        order.add_item(&latte, 1).unwrap();
        order.add_item(&muffin, 3).unwrap();
        order.add_item(&latte, 2).unwrap();
        assert_eq!(order.items().len(), 2);
        let sum = |o: &Order| o.items().iter().map(|i| i.subtotal().amount()).sum::<Decimal>();
        assert_eq!(order.total().amount(), sum(&order));
        assert_eq!(order.total().amount(), Decimal::new(3 * 5000 + 3 * 3200, 0));

        let muffin_item = order.items()[1].id().to_string();
        order.adjust_item(&muffin_item, -1, &stock).unwrap();
        assert_eq!(order.total().amount(), sum(&order));
        order.remove_item(&muffin_item).unwrap();
        assert_eq!(order.total().amount(), Decimal::new(15000, 0));
    }

    #[test]
    fn test_total_overflow_is_rejected_without_changes() {
        let tea = product("Tea", 3000, 5);
        let mut order = Order::create("c", "COP");
        order.add_item(&tea, 1).unwrap();

        let huge = Product::restore(ProductRecord {
            id: "Gold".into(), name: "Gold".into(), description: String::new(), category_id: None,
            price: Money::cop(Decimal::MAX), stock: 5, created_at: Utc::now(), updated_at: Utc::now(),
        })
        .unwrap();
        assert_eq!(order.add_item(&huge, 2).unwrap_err(), OrderError::Amount(MoneyError::Overflow));
        assert_eq!(order.add_item(&huge, 1).unwrap_err(), OrderError::Amount(MoneyError::Overflow));
        assert_eq!(order.items().len(), 1);
        assert_eq!(order.total().amount(), Decimal::new(3000, 0));

        let big = OrderItem::restore("i", "Gold", "Gold", Money::cop(Decimal::MAX), 2);
        assert_eq!(big.unwrap_err(), OrderError::Amount(MoneyError::Overflow));
    }

    #[test]
    fn test_add_item_rejects_over_stock_and_unavailable() {
        let sandwich = product("Sandwich", 6500, 3);
        let mut order = Order::create("c", "COP");
        order.add_item(&sandwich, 2).unwrap();
        let err = order.add_item(&sandwich, 2).unwrap_err();
        assert_eq!(err, OrderError::InsufficientStock { product: "Sandwich".into(), requested: 4, available: 3 });
        assert_eq!(order.items()[0].quantity(), 2);

        let empty = product("Croissant", 2800, 0);
        assert_eq!(order.add_item(&empty, 1).unwrap_err(), OrderError::ProductUnavailable("Croissant".into()));
        assert_eq!(order.add_item(&sandwich, 0).unwrap_err(), OrderError::InvalidQuantity);
    }

    #[test]
    fn test_adjust_item_rechecks_stock_and_removes_at_zero() {
        let tea = product("Tea", 3000, 3);
        let mut stock = ledger(&[&tea]);
        let mut order = Order::create("c", "COP");
        order.add_item(&tea, 2).unwrap();
        let item = order.items()[0].id().to_string();

        stock.insert("Tea".into(), 2);
        assert!(matches!(order.adjust_item(&item, 1, &stock), Err(OrderError::InsufficientStock { .. })));
        assert_eq!(order.adjust_item(&item, -1, &stock).unwrap(), ItemAdjustment::Updated { quantity: 1 });
        assert_eq!(order.adjust_item(&item, -5, &stock).unwrap(), ItemAdjustment::Removed);
        assert!(order.is_empty());
        assert_eq!(order.total().amount(), Decimal::ZERO);
        assert_eq!(order.adjust_item(&item, 1, &stock).unwrap_err(), OrderError::ItemNotFound(item));
    }

    #[test]
    fn test_confirm_empty_order_fails() {
        let mut order = Order::create("c", "COP");
        let mut stock = HashMap::new();
        assert_eq!(order.confirm(&mut stock).unwrap_err(), OrderError::NoItems);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_confirm_is_all_or_nothing() {
        let cake = product("Cake", 7000, 10);
        let juice = product("Juice", 5000, 10);
        let mut order = Order::create("c", "COP");
        order.add_item(&cake, 4).unwrap();
        order.add_item(&juice, 5).unwrap();

        // stock moved underneath the order since the items were added
        let mut stock = ledger(&[&cake, &juice]);
        stock.insert("Juice".into(), 3);
        let err = order.confirm(&mut stock).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientStock { requested: 5, available: 3, .. }));
        assert_eq!(stock["Cake"], 10);
        assert_eq!(stock["Juice"], 3);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_items_frozen_after_confirm() {
        let latte = product("Latte", 5000, 5);
        let mut stock = ledger(&[&latte]);
        let mut order = Order::create("c", "COP");
        order.add_item(&latte, 1).unwrap();
        order.confirm(&mut stock).unwrap();
        assert_eq!(order.add_item(&latte, 1).unwrap_err(), OrderError::NotEditable(OrderStatus::Confirmed));
        assert!(order.confirm(&mut stock).is_err());
        assert_eq!(stock["Latte"], 4);
    }

    #[test]
    fn test_cancel_rules() {
        let latte = product("Latte", 5000, 5);
        let mut stock = ledger(&[&latte]);

        let mut pending = Order::create("c", "COP");
        pending.add_item(&latte, 2).unwrap();
        assert!(pending.cancel().unwrap().is_empty());
        assert_eq!(pending.status(), OrderStatus::Cancelled);
        assert!(pending.cancel().is_err());

        let mut confirmed = Order::create("c", "COP");
        confirmed.add_item(&latte, 2).unwrap();
        confirmed.confirm(&mut stock).unwrap();
        let released = confirmed.cancel().unwrap();
        assert_eq!(released, vec![StockLine { product_id: "Latte".into(), quantity: 2 }]);
        // no automatic restock
        assert_eq!(stock["Latte"], 3);
        restock(&mut stock, &released);
        assert_eq!(stock["Latte"], 5);
    }

    #[test]
    fn test_cannot_cancel_delivered() {
        let latte = product("Latte", 5000, 5);
        let mut stock = ledger(&[&latte]);
        let mut order = Order::create("c", "COP");
        order.add_item(&latte, 1).unwrap();
        order.confirm(&mut stock).unwrap();
        order.advance(OrderStatus::InPreparation).unwrap();
        assert_eq!(
            order.cancel().unwrap_err(),
            OrderError::InvalidTransition { from: OrderStatus::InPreparation, to: OrderStatus::Cancelled }
        );
        order.advance(OrderStatus::Ready).unwrap();
        order.advance(OrderStatus::Delivered).unwrap();
        assert!(order.cancel().is_err());
        assert_eq!(order.status(), OrderStatus::Delivered);
    }

    #[test]
    fn test_advance_follows_fixed_sequence() {
        let latte = product("Latte", 5000, 5);
        let mut stock = ledger(&[&latte]);
        let mut order = Order::create("c", "COP");
        order.add_item(&latte, 1).unwrap();
        assert!(order.advance(OrderStatus::Confirmed).is_err());
        order.confirm(&mut stock).unwrap();
        assert!(order.advance(OrderStatus::Ready).is_err());
        assert!(order.advance(OrderStatus::Delivered).is_err());
        order.advance(OrderStatus::InPreparation).unwrap();
        assert!(order.advance(OrderStatus::Confirmed).is_err());
        assert_eq!(order.status(), OrderStatus::InPreparation);
    }

    #[test]
    fn test_progress_and_receipt() {
        let latte = product("Latte", 5000, 5);
        let mut stock = ledger(&[&latte]);
        let mut order = Order::create("c", "COP");
        assert!(order.progress().iter().all(|s| !s.completed));
        order.add_item(&latte, 2).unwrap();
        order.confirm(&mut stock).unwrap();
        order.advance(OrderStatus::InPreparation).unwrap();
        let done: Vec<bool> = order.progress().iter().map(|s| s.completed).collect();
        assert_eq!(done, vec![true, true, false, false]);

        let receipt = order.receipt("Ana");
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].subtotal.amount(), Decimal::new(10000, 0));
        assert_eq!(receipt.total.amount(), Decimal::new(10000, 0));
        assert_eq!(receipt.status_label, "In preparation");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("in_preparation".parse::<OrderStatus>().unwrap(), OrderStatus::InPreparation);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::Ready.next(), Some(OrderStatus::Delivered));
        assert_eq!(OrderStatus::Pending.next(), None);
    }
}
