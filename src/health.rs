// inside bluemoon-rbac/src/health.rs
use actix_web::{HttpResponse, Responder};
use serde_json::json;
use crate::registry::page_count;

pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "name": crate::NAME,
        "version": crate::VERSION,
        "pages": page_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
