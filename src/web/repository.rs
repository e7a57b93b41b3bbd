//! SQLite persistence for the web service.
//!
//! Every function takes a bare connection so callers decide whether it runs
//! inside a transaction. Orders are written with an expected status; a row
//! that moved underneath us is reported as a conflict instead of overwritten.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, SqliteConnection};

use super::dto::{CategoryView, DeliveryAddress, MenuQuery};
use super::error::ApiError;
use crate::domain::aggregates::{Customer, Order, OrderItem, OrderRecord, OrderStatus, Product, ProductRecord, StockLine};
use crate::domain::value_objects::{Money, OrderType, PaymentMethod, TableCode};

fn decimal(text: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(text).map_err(|e| ApiError::Internal(format!("stored amount '{text}' is not a decimal: {e}")))
}

fn count(value: i64) -> Result<u32, ApiError> {
    u32::try_from(value).map_err(|_| ApiError::Internal(format!("stored quantity {value} out of range")))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ============================================================================
// Customers and sessions
// ============================================================================

#[derive(FromRow)]
struct CustomerRow { id: String, name: String, phone: String, email: String, active: bool, registered_at: DateTime<Utc> }

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self { Customer::restore(r.id, r.name, r.phone, r.email, r.registered_at, r.active) }
}

pub struct Credentials { pub customer: Customer, pub password_hash: String }

pub async fn insert_customer(conn: &mut SqliteConnection, customer: &Customer, password_hash: &str) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO customers (id, name, phone, email, password_hash, active, registered_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
        .bind(customer.id()).bind(customer.name()).bind(customer.phone()).bind(customer.email())
        .bind(password_hash).bind(customer.is_active()).bind(customer.registered_at())
        .execute(conn).await
        .map_err(|e| if is_unique_violation(&e) { ApiError::Conflict("Email is already registered".into()) } else { e.into() })?;
    Ok(())
}

pub async fn find_customer(conn: &mut SqliteConnection, id: &str) -> Result<Option<Customer>, ApiError> {
    let row = sqlx::query_as::<_, CustomerRow>("SELECT id, name, phone, email, active, registered_at FROM customers WHERE id = ?")
        .bind(id).fetch_optional(conn).await?;
    Ok(row.map(Customer::from))
}

pub async fn find_credentials(conn: &mut SqliteConnection, email: &str) -> Result<Option<Credentials>, ApiError> {
    #[derive(FromRow)]
    struct Row { #[sqlx(flatten)] customer: CustomerRow, password_hash: String }

    let row = sqlx::query_as::<_, Row>("SELECT id, name, phone, email, active, registered_at, password_hash FROM customers WHERE email = ?")
        .bind(email).fetch_optional(conn).await?;
    Ok(row.map(|r| Credentials { customer: r.customer.into(), password_hash: r.password_hash }))
}

/// Per-login choices made while setting up an order.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: String,
    pub customer_id: String,
    pub order_type: Option<OrderType>,
    pub delivery_address: Option<DeliveryAddress>,
    pub table_code: Option<TableCode>,
}

#[derive(FromRow)]
struct SessionRow {
    token: String,
    customer_id: String,
    order_type: Option<String>,
    delivery_address: Option<String>,
    table_code: Option<String>,
}

impl TryFrom<SessionRow> for Session {
    type Error = ApiError;
    fn try_from(r: SessionRow) -> Result<Self, ApiError> {
        let corrupt = |what: &str| ApiError::Internal(format!("session {what} is corrupt"));
        Ok(Self {
            order_type: r.order_type.map(|s| s.parse()).transpose().map_err(|_| corrupt("order type"))?,
            delivery_address: r.delivery_address.map(|s| serde_json::from_str(&s)).transpose().map_err(|_| corrupt("address"))?,
            table_code: r.table_code.map(|s| TableCode::new(&s)).transpose().map_err(|_| corrupt("table code"))?,
            token: r.token,
            customer_id: r.customer_id,
        })
    }
}

pub async fn insert_session(conn: &mut SqliteConnection, token: &str, customer_id: &str) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO sessions (token, customer_id, created_at) VALUES (?, ?, ?)")
        .bind(token).bind(customer_id).bind(Utc::now()).execute(conn).await?;
    Ok(())
}

pub async fn find_session(conn: &mut SqliteConnection, token: &str) -> Result<Option<Session>, ApiError> {
    let row = sqlx::query_as::<_, SessionRow>("SELECT token, customer_id, order_type, delivery_address, table_code FROM sessions WHERE token = ?")
        .bind(token).fetch_optional(conn).await?;
    row.map(Session::try_from).transpose()
}

pub async fn delete_session(conn: &mut SqliteConnection, token: &str) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM sessions WHERE token = ?").bind(token).execute(conn).await?;
    Ok(())
}

pub enum Selection<'a> {
    OrderType(OrderType),
    Address(&'a DeliveryAddress),
    Table(&'a TableCode),
}

pub async fn update_selection(conn: &mut SqliteConnection, token: &str, selection: Selection<'_>) -> Result<(), ApiError> {
    let (column, value) = match selection {
        Selection::OrderType(t) => ("order_type", t.as_str().to_string()),
        Selection::Address(a) => ("delivery_address", serde_json::to_string(a).map_err(|e| ApiError::Internal(e.to_string()))?),
        Selection::Table(t) => ("table_code", t.as_str().to_string()),
    };
    sqlx::query(&format!("UPDATE sessions SET {column} = ? WHERE token = ?"))
        .bind(value).bind(token).execute(conn).await?;
    Ok(())
}

/// Forgets order setup on every session of a customer once an order is finished.
pub async fn clear_selections(conn: &mut SqliteConnection, customer_id: &str) -> Result<(), ApiError> {
    sqlx::query("UPDATE sessions SET order_type = NULL, delivery_address = NULL, table_code = NULL WHERE customer_id = ?")
        .bind(customer_id).execute(conn).await?;
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

pub async fn insert_category(conn: &mut SqliteConnection, category: &CategoryView) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO categories (id, name, description) VALUES (?, ?, ?)")
        .bind(&category.id).bind(&category.name).bind(&category.description)
        .execute(conn).await
        .map_err(|e| if is_unique_violation(&e) { ApiError::Conflict(format!("Category '{}' already exists", category.name)) } else { e.into() })?;
    Ok(())
}

pub async fn list_categories(conn: &mut SqliteConnection) -> Result<Vec<CategoryView>, ApiError> {
    Ok(sqlx::query_as::<_, CategoryView>("SELECT id, name, description FROM categories ORDER BY name").fetch_all(conn).await?)
}

pub async fn category_exists(conn: &mut SqliteConnection, id: &str) -> Result<bool, ApiError> {
    let found: Option<(String,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?").bind(id).fetch_optional(conn).await?;
    Ok(found.is_some())
}

#[derive(FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    category_id: Option<String>,
    price: String,
    currency: String,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = ApiError;
    fn try_from(r: ProductRow) -> Result<Self, ApiError> {
        let price = Money::new(decimal(&r.price)?, &r.currency);
        Product::restore(ProductRecord {
            id: r.id, name: r.name, description: r.description, category_id: r.category_id,
            price, stock: count(r.stock)?, created_at: r.created_at, updated_at: r.updated_at,
        }).map_err(|e| ApiError::Internal(e.to_string()))
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, category_id, price, currency, stock, created_at, updated_at";

fn products(rows: Vec<ProductRow>) -> Result<Vec<Product>, ApiError> {
    rows.into_iter().map(Product::try_from).collect()
}

pub async fn insert_product(conn: &mut SqliteConnection, p: &Product) -> Result<(), ApiError> {
    sqlx::query(&format!("INSERT INTO products ({PRODUCT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"))
        .bind(p.id()).bind(p.name()).bind(p.description()).bind(p.category_id())
        .bind(p.price().amount().to_string()).bind(p.price().currency()).bind(i64::from(p.stock()))
        .bind(p.created_at()).bind(p.updated_at())
        .execute(conn).await?;
    Ok(())
}

pub async fn update_product(conn: &mut SqliteConnection, p: &Product) -> Result<(), ApiError> {
    sqlx::query("UPDATE products SET name = ?, description = ?, category_id = ?, price = ?, stock = ?, updated_at = ? WHERE id = ?")
        .bind(p.name()).bind(p.description()).bind(p.category_id()).bind(p.price().amount().to_string())
        .bind(i64::from(p.stock())).bind(p.updated_at()).bind(p.id())
        .execute(conn).await?;
    Ok(())
}

pub async fn delete_product(conn: &mut SqliteConnection, id: &str) -> Result<bool, ApiError> {
    let done = sqlx::query("DELETE FROM products WHERE id = ?").bind(id).execute(conn).await?;
    Ok(done.rows_affected() > 0)
}

pub async fn find_product(conn: &mut SqliteConnection, id: &str) -> Result<Option<Product>, ApiError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"))
        .bind(id).fetch_optional(conn).await?;
    row.map(Product::try_from).transpose()
}

pub async fn count_products(conn: &mut SqliteConnection) -> Result<i64, ApiError> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(conn).await?;
    Ok(n)
}

/// Products with stock, optionally narrowed by a name/description search and a category.
pub async fn list_available(conn: &mut SqliteConnection, filter: &MenuQuery) -> Result<Vec<Product>, ApiError> {
    let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(|s| format!("%{s}%"));
    let category = filter.category.as_deref().filter(|s| !s.is_empty());
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE stock > 0 \
         AND (?1 IS NULL OR name LIKE ?1 OR description LIKE ?1) \
         AND (?2 IS NULL OR category_id = ?2) ORDER BY name"))
        .bind(search).bind(category).fetch_all(conn).await?;
    products(rows)
}

pub async fn random_available(conn: &mut SqliteConnection, limit: u32) -> Result<Vec<Product>, ApiError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE stock > 0 ORDER BY RANDOM() LIMIT ?"))
        .bind(i64::from(limit)).fetch_all(conn).await?;
    products(rows)
}

pub async fn low_stock(conn: &mut SqliteConnection, threshold: u32) -> Result<Vec<Product>, ApiError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE stock <= ? ORDER BY stock, name"))
        .bind(i64::from(threshold)).fetch_all(conn).await?;
    products(rows)
}

/// Current stock of the given products. Missing products are simply absent.
pub async fn stock_levels(conn: &mut SqliteConnection, product_ids: &[&str]) -> Result<HashMap<String, u32>, ApiError> {
    let mut levels = HashMap::with_capacity(product_ids.len());
    for id in product_ids {
        let row: Option<(i64,)> = sqlx::query_as("SELECT stock FROM products WHERE id = ?").bind(id).fetch_optional(&mut *conn).await?;
        if let Some((stock,)) = row { levels.insert((*id).to_string(), count(stock)?); }
    }
    Ok(levels)
}

/// Writes new stock levels, each guarded by the level it was computed from.
/// Any level that changed since it was read aborts with a conflict, so the
/// caller's transaction must be rolled back.
pub async fn write_stock(conn: &mut SqliteConnection, before: &HashMap<String, u32>, after: &HashMap<String, u32>) -> Result<(), ApiError> {
    let now = Utc::now();
    for (id, level) in after {
        let Some(previous) = before.get(id) else { continue };
        if previous == level { continue; }
        let done = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ? AND stock = ?")
            .bind(i64::from(*level)).bind(now).bind(id).bind(i64::from(*previous))
            .execute(&mut *conn).await?;
        if done.rows_affected() != 1 {
            return Err(ApiError::Conflict("Stock changed while confirming, please try again".into()));
        }
    }
    Ok(())
}

pub async fn restock(conn: &mut SqliteConnection, lines: &[StockLine]) -> Result<(), ApiError> {
    let now = Utc::now();
    for line in lines {
        sqlx::query("UPDATE products SET stock = stock + ?, updated_at = ? WHERE id = ?")
            .bind(i64::from(line.quantity)).bind(now).bind(&line.product_id)
            .execute(&mut *conn).await?;
    }
    Ok(())
}

// ============================================================================
// Orders
// ============================================================================

#[derive(FromRow)]
struct OrderRow { id: String, customer_id: String, status: String, currency: String, created_at: DateTime<Utc>, updated_at: DateTime<Utc> }

#[derive(FromRow)]
struct ItemRow { id: String, product_id: String, name: String, unit_price: String, quantity: i64 }

const ORDER_COLUMNS: &str = "id, customer_id, status, currency, created_at, updated_at";

async fn hydrate(conn: &mut SqliteConnection, row: OrderRow) -> Result<Order, ApiError> {
    let items = sqlx::query_as::<_, ItemRow>("SELECT id, product_id, name, unit_price, quantity FROM order_items WHERE order_id = ? ORDER BY position")
        .bind(&row.id).fetch_all(&mut *conn).await?
        .into_iter()
        .map(|i| -> Result<OrderItem, ApiError> {
            let unit_price = Money::new(decimal(&i.unit_price)?, &row.currency);
            OrderItem::restore(i.id, i.product_id, i.name, unit_price, count(i.quantity)?).map_err(|e| ApiError::Internal(e.to_string()))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    let status = OrderStatus::from_str(&row.status).map_err(|e| ApiError::Internal(e.to_string()))?;
    Order::restore(OrderRecord {
        id: row.id, customer_id: row.customer_id, status, currency: row.currency, items,
        created_at: row.created_at, updated_at: row.updated_at,
    })
    .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn hydrate_all(conn: &mut SqliteConnection, rows: Vec<OrderRow>) -> Result<Vec<Order>, ApiError> {
    let mut orders = Vec::with_capacity(rows.len());
    for row in rows { orders.push(hydrate(&mut *conn, row).await?); }
    Ok(orders)
}

pub async fn find_order(conn: &mut SqliteConnection, id: &str) -> Result<Option<Order>, ApiError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"))
        .bind(id).fetch_optional(&mut *conn).await?;
    match row { Some(row) => Ok(Some(hydrate(conn, row).await?)), None => Ok(None) }
}

pub async fn find_customer_order(conn: &mut SqliteConnection, id: &str, customer_id: &str) -> Result<Option<Order>, ApiError> {
    Ok(find_order(conn, id).await?.filter(|o| o.customer_id() == customer_id))
}

/// The customer's order in progress, if any.
pub async fn find_open_order(conn: &mut SqliteConnection, customer_id: &str) -> Result<Option<Order>, ApiError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ? AND status NOT IN ('delivered', 'cancelled')"))
        .bind(customer_id).fetch_optional(&mut *conn).await?;
    match row { Some(row) => Ok(Some(hydrate(conn, row).await?)), None => Ok(None) }
}

/// Returns the order in progress, starting an empty pending one when there is none.
pub async fn open_order(conn: &mut SqliteConnection, customer_id: &str, currency: &str) -> Result<Order, ApiError> {
    if let Some(order) = find_open_order(&mut *conn, customer_id).await? { return Ok(order); }
    let mut order = Order::create(customer_id, currency);
    sqlx::query(&format!("INSERT INTO orders ({ORDER_COLUMNS}, total) VALUES (?, ?, ?, ?, ?, ?, ?)"))
        .bind(order.id()).bind(order.customer_id()).bind(order.status().as_str()).bind(order.currency())
        .bind(order.created_at()).bind(order.updated_at()).bind(order.total().amount().to_string())
        .execute(&mut *conn).await
        .map_err(|e| if is_unique_violation(&e) { ApiError::Conflict("Another order is already in progress".into()) } else { e.into() })?;
    // creation is not interesting outside this service
    order.take_events();
    Ok(order)
}

pub async fn list_customer_orders(conn: &mut SqliteConnection, customer_id: &str) -> Result<Vec<Order>, ApiError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ? ORDER BY created_at DESC"))
        .bind(customer_id).fetch_all(&mut *conn).await?;
    hydrate_all(conn, rows).await
}

/// Staff queue: oldest first, everything except empty pending orders unless a status is asked for.
pub async fn list_orders(conn: &mut SqliteConnection, status: Option<OrderStatus>) -> Result<Vec<Order>, ApiError> {
    let rows = match status {
        Some(status) => sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status = ? ORDER BY created_at"))
            .bind(status.as_str()).fetch_all(&mut *conn).await?,
        None => sqlx::query_as::<_, OrderRow>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status != 'pending' ORDER BY created_at"))
            .fetch_all(&mut *conn).await?,
    };
    hydrate_all(conn, rows).await
}

/// Persists an order whose stored status is still `expected`, replacing its items.
pub async fn save_order(conn: &mut SqliteConnection, order: &Order, expected: OrderStatus) -> Result<(), ApiError> {
    let done = sqlx::query("UPDATE orders SET status = ?, total = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(order.status().as_str()).bind(order.total().amount().to_string()).bind(order.updated_at())
        .bind(order.id()).bind(expected.as_str())
        .execute(&mut *conn).await?;
    if done.rows_affected() != 1 {
        return Err(ApiError::Conflict("Order was changed by someone else, please reload it".into()));
    }

    sqlx::query("DELETE FROM order_items WHERE order_id = ?").bind(order.id()).execute(&mut *conn).await?;
    for (position, item) in order.items().iter().enumerate() {
        sqlx::query("INSERT INTO order_items (id, order_id, product_id, name, unit_price, quantity, position) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(item.id()).bind(order.id()).bind(item.product_id()).bind(item.name())
            .bind(item.unit_price().amount().to_string()).bind(i64::from(item.quantity()))
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn set_payment_method(conn: &mut SqliteConnection, order_id: &str, method: PaymentMethod) -> Result<(), ApiError> {
    sqlx::query("UPDATE orders SET payment_method = ? WHERE id = ?").bind(method.as_str()).bind(order_id).execute(conn).await?;
    Ok(())
}

pub async fn payment_method(conn: &mut SqliteConnection, order_id: &str) -> Result<Option<PaymentMethod>, ApiError> {
    let row: Option<(Option<String>,)> = sqlx::query_as("SELECT payment_method FROM orders WHERE id = ?").bind(order_id).fetch_optional(conn).await?;
    row.and_then(|(method,)| method)
        .map(|m| m.parse().map_err(|_| ApiError::Internal(format!("order {order_id} has an unknown payment method"))))
        .transpose()
}

pub async fn insert_rating(conn: &mut SqliteConnection, order_id: &str, stars: u8, comment: &str) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO ratings (order_id, stars, comment, created_at) VALUES (?, ?, ?, ?)")
        .bind(order_id).bind(i64::from(stars)).bind(comment).bind(Utc::now())
        .execute(conn).await
        .map_err(|e| if is_unique_violation(&e) { ApiError::Conflict("This order has already been rated".into()) } else { e.into() })?;
    Ok(())
}
