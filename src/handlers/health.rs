use actix_web::HttpResponse;
use serde::Serialize;

use crate::db::now_timestamp;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// GET /api/health - liveness probe
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        timestamp: now_timestamp(),
    })
}
