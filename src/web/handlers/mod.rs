pub mod accounts;
pub mod orders;
pub mod staff;

use axum::Json;

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "cafeteria"}))
}
