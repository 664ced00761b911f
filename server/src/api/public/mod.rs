//! Routes that need no session

pub mod health;
pub mod palettes;
pub mod storage;

use actix_web::web;

pub fn configure_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure_health_routes)
        .configure(palettes::configure_palette_routes)
        .configure(storage::configure_storage_routes);
}
