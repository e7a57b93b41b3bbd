//! Customer-facing order flow: pick a type, browse, fill the order, check out,
//! then follow it until delivery.

use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use tracing::info;
use validator::Validate;

use crate::domain::aggregates::{Order, OrderStatus};
use crate::domain::value_objects::{OrderType, Rating, TableCode};
use crate::web::auth::CurrentCustomer;
use crate::web::dto::{
    AddItemRequest, CancelResponse, CheckoutRequest, DeliveredResponse, DeliveryAddress, InvoiceResponse, ItemAction,
    MenuQuery, MenuResponse, ModifyItemRequest, OrderSummaryResponse, OrderTypeRequest, OrderTypeResponse, OrderView,
    ProductView, ProgressResponse, RatingRequest, RatingResponse, TableRequest,
};
use crate::web::error::ApiError;
use crate::web::repository::{self, Selection};
use crate::web::{events, AppState};

const RECOMMENDATIONS: u32 = 6;

fn product_ids(order: &Order) -> Vec<&str> { order.items().iter().map(|i| i.product_id()).collect() }

pub async fn active_order(State(s): State<AppState>, current: CurrentCustomer) -> Result<Json<Option<OrderView>>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let order = repository::find_open_order(&mut conn, current.customer.id()).await?;
    Ok(Json(order.as_ref().map(OrderView::from)))
}

pub async fn choose_order_type(State(s): State<AppState>, current: CurrentCustomer, Json(r): Json<OrderTypeRequest>) -> Result<Json<OrderTypeResponse>, ApiError> {
    let mut tx = s.db.begin().await?;
    repository::open_order(&mut tx, current.customer.id(), &s.config.currency).await?;
    repository::update_selection(&mut tx, &current.session.token, Selection::OrderType(r.order_type)).await?;
    tx.commit().await?;

    let next = match r.order_type { OrderType::Delivery => "address", OrderType::DineIn => "table", OrderType::Takeaway => "menu" };
    Ok(Json(OrderTypeResponse { order_type: r.order_type, next }))
}

pub async fn set_address(State(s): State<AppState>, current: CurrentCustomer, Json(r): Json<DeliveryAddress>) -> Result<StatusCode, ApiError> {
    r.validate()?;
    let mut conn = s.db.acquire().await?;
    repository::update_selection(&mut conn, &current.session.token, Selection::Address(&r)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_table(State(s): State<AppState>, current: CurrentCustomer, Json(r): Json<TableRequest>) -> Result<StatusCode, ApiError> {
    let code = TableCode::new(&r.code)?;
    let mut conn = s.db.acquire().await?;
    repository::update_selection(&mut conn, &current.session.token, Selection::Table(&code)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn menu(State(s): State<AppState>, current: CurrentCustomer, Query(q): Query<MenuQuery>) -> Result<Json<MenuResponse>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let order = repository::open_order(&mut conn, current.customer.id(), &s.config.currency).await?;
    let categories = repository::list_categories(&mut conn).await?;
    let products = repository::list_available(&mut conn, &q).await?;
    Ok(Json(MenuResponse { categories, products: products.iter().map(ProductView::from).collect(), order: OrderView::from(&order) }))
}

pub async fn recommendations(State(s): State<AppState>, _current: CurrentCustomer) -> Result<Json<Vec<ProductView>>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let products = repository::random_available(&mut conn, RECOMMENDATIONS).await?;
    Ok(Json(products.iter().map(ProductView::from).collect()))
}

pub async fn order_summary(State(s): State<AppState>, current: CurrentCustomer) -> Result<Json<OrderSummaryResponse>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let order = repository::open_order(&mut conn, current.customer.id(), &s.config.currency).await?;
    let session = current.session;
    Ok(Json(OrderSummaryResponse {
        order: OrderView::from(&order),
        order_type: session.order_type.unwrap_or_default(),
        table_code: session.table_code.map(|t| t.as_str().to_string()),
        delivery_address: session.delivery_address,
    }))
}

pub async fn add_item(State(s): State<AppState>, current: CurrentCustomer, Json(r): Json<AddItemRequest>) -> Result<Json<OrderView>, ApiError> {
    r.validate()?;
    let mut tx = s.db.begin().await?;
    let product = repository::find_product(&mut tx, &r.product_id).await?.ok_or(ApiError::NotFound("Product"))?;
    let mut order = repository::open_order(&mut tx, current.customer.id(), &s.config.currency).await?;
    let before = order.status();
    order.add_item(&product, r.quantity)?;
    repository::save_order(&mut tx, &order, before).await?;
    tx.commit().await?;
    Ok(Json(OrderView::from(&order)))
}

pub async fn modify_item(State(s): State<AppState>, current: CurrentCustomer, Path(item_id): Path<String>, Json(r): Json<ModifyItemRequest>) -> Result<Json<OrderView>, ApiError> {
    let mut tx = s.db.begin().await?;
    let mut order = repository::find_open_order(&mut tx, current.customer.id()).await?.ok_or(ApiError::NotFound("Order"))?;
    let before = order.status();
    match r.action {
        ItemAction::Increase | ItemAction::Decrease => {
            let levels = repository::stock_levels(&mut tx, &product_ids(&order)).await?;
            let delta = if matches!(r.action, ItemAction::Increase) { 1 } else { -1 };
            order.adjust_item(&item_id, delta, &levels)?;
        }
        ItemAction::Remove => { order.remove_item(&item_id)?; }
    }
    repository::save_order(&mut tx, &order, before).await?;
    tx.commit().await?;
    Ok(Json(OrderView::from(&order)))
}

/// Confirms the order in progress. Stock for every line is decremented in
/// the same transaction as the status change, or not at all.
pub async fn checkout(State(s): State<AppState>, current: CurrentCustomer, Json(r): Json<CheckoutRequest>) -> Result<Json<InvoiceResponse>, ApiError> {
    let mut tx = s.db.begin().await?;
    let mut order = repository::find_open_order(&mut tx, current.customer.id()).await?.ok_or(ApiError::NotFound("Order"))?;
    let before = order.status();

    let snapshot = repository::stock_levels(&mut tx, &product_ids(&order)).await?;
    let mut levels = snapshot.clone();
    order.confirm(&mut levels)?;
    repository::write_stock(&mut tx, &snapshot, &levels).await?;
    repository::save_order(&mut tx, &order, before).await?;
    repository::set_payment_method(&mut tx, order.id(), r.payment_method).await?;
    tx.commit().await?;

    info!(order_id = order.id(), total = %order.total().amount(), payment = r.payment_method.as_str(), "order confirmed");
    events::publish(s.nats.as_ref(), order.take_events()).await;
    Ok(Json(InvoiceResponse { receipt: order.receipt(current.customer.name()), payment_method: r.payment_method }))
}

/// Customer acknowledges pickup or delivery of a ready order.
pub async fn mark_delivered(State(s): State<AppState>, current: CurrentCustomer) -> Result<(StatusCode, Json<DeliveredResponse>), ApiError> {
    let mut tx = s.db.begin().await?;
    let Some(mut order) = repository::find_open_order(&mut tx, current.customer.id()).await? else {
        return Ok((StatusCode::BAD_REQUEST, Json(DeliveredResponse::failed("No order in progress"))));
    };
    let before = order.status();
    if let Err(e) = order.advance(OrderStatus::Delivered) {
        return Ok((StatusCode::CONFLICT, Json(DeliveredResponse::failed(e.to_string()))));
    }
    repository::save_order(&mut tx, &order, before).await?;
    repository::clear_selections(&mut tx, current.customer.id()).await?;
    tx.commit().await?;

    info!(order_id = order.id(), "order delivered");
    events::publish(s.nats.as_ref(), order.take_events()).await;
    Ok((StatusCode::OK, Json(DeliveredResponse::delivered(order.id()))))
}

pub async fn history(State(s): State<AppState>, current: CurrentCustomer) -> Result<Json<Vec<OrderView>>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let orders = repository::list_customer_orders(&mut conn, current.customer.id()).await?;
    Ok(Json(orders.iter().map(OrderView::from).collect()))
}

pub async fn invoice(State(s): State<AppState>, current: CurrentCustomer, Path(id): Path<String>) -> Result<Json<InvoiceResponse>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let order = repository::find_customer_order(&mut conn, &id, current.customer.id()).await?.ok_or(ApiError::NotFound("Order"))?;
    let payment_method = repository::payment_method(&mut conn, order.id()).await?.unwrap_or_default();
    Ok(Json(InvoiceResponse { receipt: order.receipt(current.customer.name()), payment_method }))
}

pub async fn progress(State(s): State<AppState>, current: CurrentCustomer, Path(id): Path<String>) -> Result<Json<ProgressResponse>, ApiError> {
    let mut conn = s.db.acquire().await?;
    let order = repository::find_customer_order(&mut conn, &id, current.customer.id()).await?.ok_or(ApiError::NotFound("Order"))?;
    Ok(Json(ProgressResponse { order_id: order.id().to_string(), status: order.status(), status_label: order.status().label(), steps: order.progress() }))
}

pub async fn rate(State(s): State<AppState>, current: CurrentCustomer, Path(id): Path<String>, Json(r): Json<RatingRequest>) -> Result<(StatusCode, Json<RatingResponse>), ApiError> {
    r.validate()?;
    let rating = Rating::new(r.rating)?;
    let mut conn = s.db.acquire().await?;
    let order = repository::find_customer_order(&mut conn, &id, current.customer.id()).await?.ok_or(ApiError::NotFound("Order"))?;
    if order.status() != OrderStatus::Delivered {
        return Err(ApiError::Conflict("Only delivered orders can be rated".into()));
    }
    repository::insert_rating(&mut conn, order.id(), rating.stars(), r.comment.trim()).await?;
    Ok((StatusCode::CREATED, Json(RatingResponse { order_id: order.id().to_string(), rating: rating.stars(), comment: r.comment.trim().to_string() })))
}

pub async fn cancel(State(s): State<AppState>, current: CurrentCustomer, Path(id): Path<String>) -> Result<Json<CancelResponse>, ApiError> {
    let mut tx = s.db.begin().await?;
    let mut order = repository::find_customer_order(&mut tx, &id, current.customer.id()).await?.ok_or(ApiError::NotFound("Order"))?;
    let before = order.status();
    let released = order.cancel()?;
    let restocked = s.config.restock_on_cancel && !released.is_empty();
    if restocked { repository::restock(&mut tx, &released).await?; }
    repository::save_order(&mut tx, &order, before).await?;
    repository::clear_selections(&mut tx, current.customer.id()).await?;
    tx.commit().await?;

    info!(order_id = order.id(), restocked, "order cancelled");
    events::publish(s.nats.as_ref(), order.take_events()).await;
    Ok(Json(CancelResponse { order: OrderView::from(&order), restocked, released }))
}
