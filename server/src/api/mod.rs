//! HTTP surface
//!
//! Thin actix handlers over the services in `AppState`. Handlers resolve the
//! caller, call one service method and serialize the result; every failure
//! goes through `AppError`'s `ResponseError` impl.

pub mod auth;
pub mod billing;
pub mod generate;
pub mod logos;
pub mod profiles;
pub mod public;

pub use auth::Caller;

use crate::app::AppState;
use crate::error::AppError;
use actix_web::{middleware::Logger, web, App, HttpServer};

const JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// JSON extractor config; malformed bodies get the usual error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

/// Configure all routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(public::configure_public_routes)
        .configure(generate::configure_generate_routes)
        .configure(logos::configure_logo_routes)
        .configure(profiles::configure_profile_routes)
        .configure(billing::configure_billing_routes);
}

/// Run the HTTP server until shutdown
pub async fn serve(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{}:{}", host, port);
    tracing::info!("Listening on http://{}", addr);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(json_config())
            .wrap(Logger::default())
            .configure(configure_routes)
    })
    .bind(&addr)?
    .run()
    .await
}
