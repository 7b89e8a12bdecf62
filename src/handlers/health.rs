use actix_web::{web, HttpResponse, Result};

use crate::models::ApiResponse;
use crate::services::pipeline::PipelineOrchestrator;

#[derive(serde::Serialize)]
struct HealthStatus {
    status: &'static str,
    storage_available: bool,
}

pub async fn health_check(
    orchestrator: web::Data<PipelineOrchestrator>,
) -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthStatus {
        status: "ok",
        storage_available: orchestrator.writer().is_available(),
    });
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
