use super::Caller;
use crate::app::AppState;
use crate::error::Result;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn configure_profile_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/profiles/me", web::get().to(current_profile));
}

async fn current_profile(state: web::Data<AppState>, caller: Caller) -> Result<HttpResponse> {
    let profile = state.profiles.get_profile(caller.user_id()).await?;
    Ok(HttpResponse::Ok().json(json!({ "profile": profile })))
}
