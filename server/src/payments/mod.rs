//! Payment provider
//!
//! Opening a hosted checkout page is the only outbound call made to the
//! payment processor. Completion comes back through the signed webhook,
//! carrying the metadata attached here.

pub mod stripe;

pub use stripe::StripeCheckoutClient;

use crate::error::Result;
use async_trait::async_trait;

/// One hosted checkout for a single price
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub price_id: String,
    pub quantity: u32,
    pub success_url: String,
    pub cancel_url: String,
    /// Echoed back in the webhook as `data.object.metadata`
    pub user_id: String,
    pub pack: String,
}

/// A created checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Client for the payment processor's checkout API
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession>;
}
