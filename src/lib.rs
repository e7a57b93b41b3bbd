//! Cafeteria ordering
//!
//! Two front ends over one order model:
//! - a counter console that manages a JSON-backed menu and takes walk-in orders
//! - a JSON web service with customer accounts, a product catalog and the
//!   order lifecycle (`pending -> confirmed -> in_preparation -> ready -> delivered`)
//!
//! ## Features
//! - Menu management with validated price and stock edits
//! - Orders with recomputed totals and stock checks on every change
//! - Atomic confirmation: stock is decremented for every line or for none
//! - Staff order progression, cancellation, receipts and progress tracking

pub mod catalog;
pub mod config;
pub mod console;
pub mod domain;
pub mod telemetry;
pub mod web;

use thiserror::Error;

use crate::catalog::{CatalogError, StoreError};
use crate::domain::access::AccessError;
use crate::domain::aggregates::{CustomerError, OrderError, ProductError};
use crate::domain::value_objects::{RatingError, TableCodeError};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CafeteriaError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Customer(#[from] CustomerError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    TableCode(#[from] TableCodeError),

    #[error(transparent)]
    Rating(#[from] RatingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a failure is reported to whoever triggered it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or a rule violation; nothing changed.
    Validation,
    /// The referenced product, item or order does not exist.
    NotFound,
    Unexpected,
}

impl CafeteriaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Order(OrderError::ProductNotFound(_) | OrderError::ItemNotFound(_)) => ErrorKind::NotFound,
            Self::Catalog(CatalogError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Unexpected,
            _ => ErrorKind::Validation,
        }
    }
}

pub type Result<T> = std::result::Result<T, CafeteriaError>;

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_error_kinds() {
        assert_eq!(CafeteriaError::from(OrderError::NoItems).kind(), ErrorKind::Validation);
        assert_eq!(CafeteriaError::from(CatalogError::NotFound(3)).kind(), ErrorKind::NotFound);
        assert_eq!(CafeteriaError::from(OrderError::ItemNotFound("x".into())).kind(), ErrorKind::NotFound);
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        assert_eq!(CafeteriaError::from(StoreError::from(io)).kind(), ErrorKind::Unexpected);
    }
}
