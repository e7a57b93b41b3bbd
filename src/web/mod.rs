//! JSON web service over SQLite.
//!
//! Customers register, set up an order (type, address or table), fill it from
//! the menu and check out; staff move confirmed orders along and manage the
//! catalog. Routes live under `/api/v1`.

pub mod auth;
pub mod dto;
pub mod error;
pub mod events;
pub mod handlers;
pub mod repository;


use std::str::FromStr;
use std::sync::Arc;

use axum::{routing::{get, post, put}, Router};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::access::Gate;
use crate::domain::aggregates::Product;
use crate::domain::value_objects::Money;
use handlers::{accounts, orders, staff};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub nats: Option<async_nats::Client>,
    pub config: Arc<Config>,
    pub gate: Gate,
}

impl AppState {
    pub fn new(db: SqlitePool, nats: Option<async_nats::Client>, config: Config) -> Self {
        let gate = config.gate();
        Self { db, nats, config: Arc::new(config), gate }
    }
}

/// Opens the pool and applies migrations. An in-memory database lives on a
/// single connection that is never recycled.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true).foreign_keys(true);
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let db = pool.connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    Ok(db)
}

const DEMO_CATALOG: [(&str, &str, &[(&str, i64)]); 3] = [
    ("Beverages", "Hot and cold drinks", &[("Coffee", 500), ("Orange Juice", 500)]),
    ("Meals", "Sandwiches and salads", &[("Sandwich", 750), ("Salad", 750)]),
    ("Desserts", "Something sweet", &[("Chocolate Cake", 750)]),
];

const DEMO_STOCK: i64 = 50;

/// Fills an empty catalog with a few categories and products. Returns how many products were added.
pub async fn seed_demo_catalog(db: &SqlitePool, currency: &str) -> anyhow::Result<usize> {
    let mut tx = db.begin().await?;
    if repository::count_products(&mut tx).await? > 0 { return Ok(0); }

    let mut added = 0;
    for (category, description, items) in DEMO_CATALOG {
        let category = dto::CategoryView { id: Uuid::now_v7().to_string(), name: category.to_string(), description: description.to_string() };
        repository::insert_category(&mut tx, &category).await?;
        for (name, cents) in items {
            let mut product = Product::create(Uuid::now_v7().to_string(), name, Money::new(Decimal::new(*cents, 2), currency), DEMO_STOCK)?;
            product.assign_category(Some(category.id.clone()));
            repository::insert_product(&mut tx, &product).await?;
            added += 1;
        }
    }
    tx.commit().await?;
    info!(products = added, "demo catalog seeded");
    Ok(added)
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
        .route("/me", get(accounts::me))
        .route("/menu", get(orders::menu))
        .route("/recommendations", get(orders::recommendations))
        .route("/order", get(orders::order_summary))
        .route("/order/active", get(orders::active_order))
        .route("/order/type", post(orders::choose_order_type))
        .route("/order/address", post(orders::set_address))
        .route("/order/table", post(orders::set_table))
        .route("/order/items", post(orders::add_item))
        .route("/order/items/:item_id", post(orders::modify_item))
        .route("/order/checkout", post(orders::checkout))
        .route("/order/delivered", post(orders::mark_delivered))
        .route("/orders", get(orders::history))
        .route("/orders/:id/invoice", get(orders::invoice))
        .route("/orders/:id/progress", get(orders::progress))
        .route("/orders/:id/rating", post(orders::rate))
        .route("/orders/:id/cancel", post(orders::cancel))
        .route("/staff/orders", get(staff::list_orders))
        .route("/staff/orders/:id/advance", post(staff::advance_order))
        .route("/staff/inventory/low-stock", get(staff::low_stock))
        .route("/staff/categories", post(staff::create_category))
        .route("/staff/products", post(staff::create_product))
        .route("/staff/products/:id", put(staff::update_product).delete(staff::delete_product));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
