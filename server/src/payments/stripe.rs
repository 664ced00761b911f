//! Stripe Checkout client
//!
//! Calls `POST {base}/v1/checkout/sessions` with a form-encoded body and
//! reads `id` and `url` from the response.

use super::{CheckoutGateway, CheckoutSession, CheckoutSessionRequest};
use crate::config::BillingSettings;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize, Debug)]
struct SessionResponse {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    message: String,
}

pub struct StripeCheckoutClient {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeCheckoutClient {
    pub fn new(settings: &BillingSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("logosmith/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            secret_key: settings.secret_key.clone(),
        })
    }
}

/// Form fields in the provider's bracketed encoding
fn form_fields(request: &CheckoutSessionRequest) -> Vec<(&'static str, String)> {
    vec![
        ("mode", "payment".to_string()),
        ("line_items[0][price]", request.price_id.clone()),
        ("line_items[0][quantity]", request.quantity.to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("allow_promotion_codes", "true".to_string()),
        ("billing_address_collection", "auto".to_string()),
        ("metadata[user_id]", request.user_id.clone()),
        ("metadata[pack]", request.pack.clone()),
    ]
}

#[async_trait]
impl CheckoutGateway for StripeCheckoutClient {
    async fn create_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession> {
        if self.secret_key.is_empty() {
            return Err(AppError::Payment("Missing payment provider key".to_string()));
        }

        let url = format!("{}/v1/checkout/sessions", self.base_url);
        tracing::info!("Opening checkout for {} ({})", request.user_id, request.pack);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form_fields(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            tracing::warn!("Checkout provider returned status {}: {}", status, message);
            return Err(AppError::Payment(format!("{}: {}", status, message)));
        }

        let body: SessionResponse = response.json().await?;
        let url = body
            .url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Payment(format!("Session {} has no URL", body.id)))?;

        Ok(CheckoutSession { id: body.id, url })
    }
}
