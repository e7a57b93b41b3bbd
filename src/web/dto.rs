//! Request and response bodies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::aggregates::{Customer, Order, OrderItem, OrderStatus, Product, ProgressStep, Receipt, StockLine};
use crate::domain::value_objects::{OrderType, PaymentMethod};

// ----------------------------------------------------------------------------
// Accounts
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CustomerView { pub id: String, pub name: String, pub phone: String, pub email: String }

impl From<&Customer> for CustomerView {
    fn from(c: &Customer) -> Self {
        Self { id: c.id().to_string(), name: c.name().to_string(), phone: c.phone().to_string(), email: c.email().to_string() }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse { pub token: String, pub customer: CustomerView }

// ----------------------------------------------------------------------------
// Order setup
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderTypeRequest { pub order_type: OrderType }

/// What the client should ask for next after choosing an order type.
#[derive(Debug, Serialize)]
pub struct OrderTypeResponse { pub order_type: OrderType, pub next: &'static str }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DeliveryAddress {
    #[validate(length(min = 1, max = 200))]
    pub address: String,
    #[validate(length(min = 1, max = 100))]
    pub neighborhood: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct TableRequest { pub code: String }

// ----------------------------------------------------------------------------
// Menu and catalog
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery { pub search: Option<String>, pub category: Option<String> }

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_id: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub stock: u32,
    pub available: bool,
}

impl From<&Product> for ProductView {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id().to_string(), name: p.name().to_string(), description: p.description().to_string(),
            category_id: p.category_id().map(str::to_string), price: p.price().amount(),
            currency: p.price().currency().to_string(), stock: p.stock(), available: p.is_available(),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryView { pub id: String, pub name: String, pub description: String }

#[derive(Debug, Serialize)]
pub struct MenuResponse { pub categories: Vec<CategoryView>, pub products: Vec<ProductView>, pub order: OrderView }

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<String>,
    #[serde(default)]
    pub stock: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery { pub threshold: Option<u32> }

// ----------------------------------------------------------------------------
// Orders
// ----------------------------------------------------------------------------

fn one() -> u32 { 1 }

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 1000))]
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemAction { Increase, Decrease, Remove }

#[derive(Debug, Deserialize)]
pub struct ModifyItemRequest { pub action: ItemAction }

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest { pub payment_method: PaymentMethod }

#[derive(Debug, Deserialize, Validate)]
pub struct RatingRequest {
    pub rating: u8,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest { pub status: OrderStatus }

#[derive(Debug, Deserialize)]
pub struct StatusQuery { pub status: Option<OrderStatus> }

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

impl From<&OrderItem> for OrderItemView {
    fn from(i: &OrderItem) -> Self {
        Self {
            id: i.id().to_string(), product_id: i.product_id().to_string(), name: i.name().to_string(),
            unit_price: i.unit_price().amount(), quantity: i.quantity(), subtotal: i.subtotal().amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub items: Vec<OrderItemView>,
    pub total: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(o: &Order) -> Self {
        Self {
            id: o.id().to_string(), customer_id: o.customer_id().to_string(), status: o.status(),
            status_label: o.status().label(), items: o.items().iter().map(OrderItemView::from).collect(),
            total: o.total().amount(), currency: o.currency().to_string(),
            created_at: o.created_at(), updated_at: o.updated_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderSummaryResponse {
    pub order: OrderView,
    pub order_type: OrderType,
    pub table_code: Option<String>,
    pub delivery_address: Option<DeliveryAddress>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub receipt: Receipt,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub order_id: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub steps: Vec<ProgressStep>,
}

/// Body of the "mark delivered" endpoint; never an error object.
#[derive(Debug, Serialize)]
pub struct DeliveredResponse {
    pub ok: bool,
    #[serde(rename = "pedido_id", skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveredResponse {
    pub fn delivered(order_id: &str) -> Self { Self { ok: true, order_id: Some(order_id.to_string()), error: None } }
    pub fn failed(error: impl Into<String>) -> Self { Self { ok: false, order_id: None, error: Some(error.into()) } }
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub order: OrderView,
    pub restocked: bool,
    pub released: Vec<StockLine>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse { pub order_id: String, pub rating: u8, pub comment: String }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_defaults_to_one_unit() {
        let req: AddItemRequest = serde_json::from_str(r#"{"product_id":"p1"}"#).unwrap();
        assert_eq!(req.quantity, 1);
        let req: AddItemRequest = serde_json::from_str(r#"{"product_id":"p1","quantity":0}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_delivered_response_shape() {
        let ok = serde_json::to_value(DeliveredResponse::delivered("o-1")).unwrap();
        assert_eq!(ok, serde_json::json!({"ok": true, "pedido_id": "o-1"}));
        let failed = serde_json::to_value(DeliveredResponse::failed("No order in progress")).unwrap();
        assert_eq!(failed, serde_json::json!({"ok": false, "error": "No order in progress"}));
    }
}
