//! Checkout and payment webhook
//!
//! The webhook body is read as raw bytes: the signature covers the exact
//! payload, so it must not be re-serialized before verification.

use super::Caller;
use crate::app::AppState;
use crate::error::Result;
use crate::services::CheckoutRequest;
use actix_web::http::header::ORIGIN;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

pub fn configure_billing_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/billing/checkout", web::post().to(checkout))
        .route("/billing/webhook", web::post().to(webhook));
}

/// An absent or unreadable body selects the default pack
async fn checkout(
    state: web::Data<AppState>,
    caller: Caller,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let request: CheckoutRequest = serde_json::from_slice(&body).unwrap_or_default();
    let origin = req.headers().get(ORIGIN).and_then(|v| v.to_str().ok());

    let link = state
        .checkout
        .create_checkout(caller.user_id(), request, origin)
        .await?;
    Ok(HttpResponse::Ok().json(link))
}

async fn webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let now = chrono::Utc::now().timestamp();

    let outcome = state.billing.handle_webhook(&body, signature, now).await?;
    tracing::debug!("Webhook outcome: {:?}", outcome);

    Ok(HttpResponse::Ok().json(json!({ "received": true })))
}
