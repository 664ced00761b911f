//! Logo records and editor saves

use super::Caller;
use crate::app::AppState;
use crate::error::Result;
use crate::services::SaveRequest;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn configure_logo_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/logos", web::get().to(list_logos))
        .route("/logos/save", web::post().to(save_logo))
        .route("/logos/{id}", web::get().to(get_logo))
        .route("/logos/{id}", web::delete().to(delete_logo));
}

async fn list_logos(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    let logos = state.logos.list_logos(caller.user_id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "logos": logos })))
}

async fn get_logo(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let detail = state.logos.get_logo(caller.user_id(), &path).await?;
    Ok(HttpResponse::Ok().json(detail))
}

async fn save_logo(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<SaveRequest>,
) -> Result<HttpResponse> {
    let receipt = state
        .logos
        .save_logo(caller.user_id(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(receipt))
}

async fn delete_logo(
    state: web::Data<AppState>,
    caller: Caller,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    state.logos.delete_logo(caller.user_id(), &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
