use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{OrderStatus, Product};
use crate::domain::value_objects::Money;
use crate::web::auth::StaffAccess;
use crate::web::dto::{
    AdvanceRequest, CategoryRequest, CategoryView, CreateProductRequest, LowStockQuery, OrderView, ProductView,
    StatusQuery, UpdateProductRequest,
};
use crate::web::error::ApiError;
use crate::web::{events, repository, AppState};

const DEFAULT_LOW_STOCK: u32 = 5;

pub async fn list_orders(State(s): State<AppState>, _staff: StaffAccess, Query(q): Query<StatusQuery>) -> Result<Json<Vec<OrderView>>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let orders = repository::list_orders(&mut conn, q.status).await?;
    Ok(Json(orders.iter().map(OrderView::from).collect()))
}

pub async fn advance_order(State(s): State<AppState>, staff: StaffAccess, Path(id): Path<String>, Json(r): Json<AdvanceRequest>) -> Result<Json<OrderView>, ApiError> {
    let mut tx = s.db.begin().await?;
    let mut order = repository::find_order(&mut tx, &id).await?.ok_or(ApiError::NotFound("Order"))?;
    let before = order.status();
    order.advance(r.status)?;
    repository::save_order(&mut tx, &order, before).await?;
    if order.status() == OrderStatus::Delivered {
        repository::clear_selections(&mut tx, order.customer_id()).await?;
    }
    tx.commit().await?;

    info!(order_id = order.id(), from = %before, to = %order.status(), role = ?staff.role, "order advanced");
    events::publish(s.nats.as_ref(), order.take_events()).await;
    Ok(Json(OrderView::from(&order)))
}

pub async fn low_stock(State(s): State<AppState>, _staff: StaffAccess, Query(q): Query<LowStockQuery>) -> Result<Json<Vec<ProductView>>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let products = repository::low_stock(&mut conn, q.threshold.unwrap_or(DEFAULT_LOW_STOCK)).await?;
    Ok(Json(products.iter().map(ProductView::from).collect()))
}

pub async fn create_category(State(s): State<AppState>, staff: StaffAccess, Json(r): Json<CategoryRequest>) -> Result<(StatusCode, Json<CategoryView>), ApiError> {
    staff.ensure_catalog_manager()?;
    r.validate()?;
    let category = CategoryView { id: Uuid::now_v7().to_string(), name: r.name.trim().to_string(), description: r.description.trim().to_string() };
    let mut conn = s.db.acquire().await?;
    repository::insert_category(&mut conn, &category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn create_product(State(s): State<AppState>, staff: StaffAccess, Json(r): Json<CreateProductRequest>) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    staff.ensure_catalog_manager()?;
    let mut product = Product::create(Uuid::now_v7().to_string(), &r.name, Money::new(r.price, &s.config.currency), r.stock)?;
    product.describe(r.description.trim());

    let mut conn = s.db.acquire().await?;
    if let Some(category_id) = r.category_id {
        if !repository::category_exists(&mut conn, &category_id).await? { return Err(ApiError::NotFound("Category")); }
        product.assign_category(Some(category_id));
    }
    repository::insert_product(&mut conn, &product).await?;

    info!(product_id = product.id(), name = product.name(), "product created");
    events::publish(s.nats.as_ref(), product.take_events()).await;
    Ok((StatusCode::CREATED, Json(ProductView::from(&product))))
}

pub async fn update_product(State(s): State<AppState>, staff: StaffAccess, Path(id): Path<String>, Json(r): Json<UpdateProductRequest>) -> Result<Json<ProductView>, ApiError> {
    staff.ensure_catalog_manager()?;
    let mut tx = s.db.begin().await?;
    let mut product = repository::find_product(&mut tx, &id).await?.ok_or(ApiError::NotFound("Product"))?;

    if let Some(name) = &r.name { product.rename(name)?; }
    if let Some(description) = r.description { product.describe(description.trim()); }
    if let Some(price) = r.price {
        let currency = product.price().currency().to_string();
        product.update_price(Money::new(price, &currency))?;
    }
    if let Some(stock) = r.stock { product.set_stock(stock)?; }
    if let Some(category_id) = r.category_id {
        if !repository::category_exists(&mut tx, &category_id).await? { return Err(ApiError::NotFound("Category")); }
        product.assign_category(Some(category_id));
    }
    repository::update_product(&mut tx, &product).await?;
    tx.commit().await?;

    info!(product_id = product.id(), "product updated");
    events::publish(s.nats.as_ref(), product.take_events()).await;
    Ok(Json(ProductView::from(&product)))
}

pub async fn delete_product(State(s): State<AppState>, staff: StaffAccess, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    staff.ensure_catalog_manager()?;
    let mut conn = s.db.acquire().await?;
    if !repository::delete_product(&mut conn, &id).await? { return Err(ApiError::NotFound("Product")); }
    info!(product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
