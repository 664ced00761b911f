//! `POST /generate`

use super::Caller;
use crate::app::AppState;
use crate::error::Result;
use crate::services::{GenerateRequest, GenerationReport};
use actix_web::{web, HttpResponse};

pub fn configure_generate_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/generate", web::post().to(generate));
}

async fn generate(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<GenerateRequest>,
) -> Result<HttpResponse> {
    let report: GenerationReport = state
        .generation
        .generate(caller.user_id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
