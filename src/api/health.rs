use axum::response::Json;
use serde_json::{Value, json};

/// Liveness probe with the running version.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
