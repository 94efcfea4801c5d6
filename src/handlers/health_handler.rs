use actix_web::{get, web, HttpResponse};
use serde_json::json;

use crate::app_state::AppState;

#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[get("/health/live")]
pub async fn live() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "alive" }))
}

/// Ready once MongoDB answers a ping.
#[get("/health/ready")]
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    let Some(db) = &state.db else {
        return HttpResponse::Ok().json(json!({ "status": "ready", "database": "not configured" }));
    };

    match db.health_check().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ready",
            "database": db.db_name(),
        })),
        Err(err) => {
            log::error!("Readiness check failed: {}", err);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "unavailable",
                "error": err.to_string(),
            }))
        }
    }
}
