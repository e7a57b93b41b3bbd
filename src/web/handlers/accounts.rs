use axum::{extract::State, http::StatusCode, Json};
use tracing::info;
use validator::Validate;

use crate::domain::aggregates::{normalize_email, Customer};
use crate::web::auth::{hash_password, new_token, verify_password, CurrentCustomer};
use crate::web::dto::{CustomerView, LoginRequest, RegisterRequest, SessionResponse};
use crate::web::error::ApiError;
use crate::web::{repository, AppState};

pub async fn register(State(s): State<AppState>, Json(r): Json<RegisterRequest>) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    r.validate()?;
    let customer = Customer::register(&r.name, &r.phone, &r.email)?;
    let password = r.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    let token = new_token();

    let mut tx = s.db.begin().await?;
    repository::insert_customer(&mut tx, &customer, &password_hash).await?;
    repository::insert_session(&mut tx, &token, customer.id()).await?;
    tx.commit().await?;

    info!(customer_id = customer.id(), "customer registered");
    Ok((StatusCode::CREATED, Json(SessionResponse { token, customer: CustomerView::from(&customer) })))
}

pub async fn login(State(s): State<AppState>, Json(r): Json<LoginRequest>) -> Result<Json<SessionResponse>, ApiError> {
    r.validate()?;
    let mut conn = s.db.acquire().await?;
    let credentials = repository::find_credentials(&mut conn, &normalize_email(&r.email)).await?
        .filter(|c| c.customer.is_active())
        .ok_or(ApiError::Unauthorized)?;
    let (password, stored) = (r.password, credentials.password_hash.clone());
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !verified { return Err(ApiError::Unauthorized); }

    let token = new_token();
    repository::insert_session(&mut conn, &token, credentials.customer.id()).await?;
    Ok(Json(SessionResponse { token, customer: CustomerView::from(&credentials.customer) }))
}

pub async fn logout(State(s): State<AppState>, current: CurrentCustomer) -> Result<StatusCode, ApiError> {
    let mut conn = s.db.acquire().await?;
    repository::delete_session(&mut conn, &current.session.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(current: CurrentCustomer) -> Json<CustomerView> { Json(CustomerView::from(&current.customer)) }
