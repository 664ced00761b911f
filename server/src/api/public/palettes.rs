use crate::palettes::PRESETS;
use actix_web::{web, HttpResponse};
use serde_json::json;

pub fn configure_palette_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/palettes", web::get().to(list_palettes));
}

async fn list_palettes() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "palettes": PRESETS }))
}
