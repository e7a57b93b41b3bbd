//! Aggregates module
pub mod product;
pub mod order;
pub mod customer;

pub use product::{Product, ProductError, ProductRecord};
pub use order::{restock, ItemAdjustment, Order, OrderError, OrderItem, OrderRecord, OrderStatus, ProgressStep, Receipt, ReceiptLine, StockLedger, StockLine};
pub use customer::{normalize_email, Customer, CustomerError};
