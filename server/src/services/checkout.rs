//! Credit pack checkout
//!
//! Opens a hosted payment page for a credit pack. The caller's id and the
//! pack travel as session metadata and come back on the completion webhook.

use crate::config::{BillingSettings, DEFAULT_PACK};
use crate::error::{AppError, Result};
use crate::payments::{CheckoutGateway, CheckoutSessionRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /billing/checkout`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub pack: Option<String>,
}

/// Where to send the user to pay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutLink {
    pub url: String,
}

/// Pack ids and the price configured for each
#[derive(Debug, Clone, Default)]
pub struct PackPrices {
    pub credits_10: String,
}

impl PackPrices {
    pub fn from_settings(settings: &BillingSettings) -> Self {
        Self {
            credits_10: settings.price_credits_10.trim().to_string(),
        }
    }

    /// Price id for a known pack with a configured price
    fn price_for(&self, pack: &str) -> Option<&str> {
        let price = match pack {
            "credits_10" => self.credits_10.as_str(),
            _ => return None,
        };
        (!price.is_empty()).then_some(price)
    }
}

/// Service creating checkout sessions
#[derive(Clone)]
pub struct CheckoutService {
    gateway: Arc<dyn CheckoutGateway>,
    prices: PackPrices,
    app_url: Option<String>,
}

impl CheckoutService {
    pub fn new(
        gateway: Arc<dyn CheckoutGateway>,
        prices: PackPrices,
        app_url: Option<String>,
    ) -> Self {
        Self {
            gateway,
            prices,
            app_url: app_url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        }
    }

    /// Open a checkout for `caller`.
    ///
    /// The return URL is the configured app URL, else the request origin.
    pub async fn create_checkout(
        &self,
        caller: Option<&str>,
        request: CheckoutRequest,
        origin: Option<&str>,
    ) -> Result<CheckoutLink> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        let pack = request
            .pack
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PACK)
            .to_string();
        let price_id = self
            .prices
            .price_for(&pack)
            .ok_or_else(|| AppError::Validation("Missing or invalid pack/price ID".to_string()))?
            .to_string();

        let return_url = self
            .app_url
            .clone()
            .or_else(|| origin.map(|o| o.trim_end_matches('/').to_string()))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Validation("No return URL for checkout".to_string()))?;

        let session = self
            .gateway
            .create_session(&CheckoutSessionRequest {
                price_id,
                quantity: 1,
                success_url: return_url.clone(),
                cancel_url: return_url,
                user_id: user_id.to_string(),
                pack: pack.clone(),
            })
            .await?;

        tracing::info!("Checkout {} opened for {} ({})", session.id, user_id, pack);
        Ok(CheckoutLink { url: session.url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::CheckoutSession;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeGateway {
        requests: Mutex<Vec<CheckoutSessionRequest>>,
    }

    impl FakeGateway {
        fn requests(&self) -> Vec<CheckoutSessionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CheckoutGateway for FakeGateway {
        async fn create_session(
            &self,
            request: &CheckoutSessionRequest,
        ) -> Result<CheckoutSession> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(CheckoutSession {
                id: "cs_test_1".to_string(),
                url: "https://pay.test/cs_test_1".to_string(),
            })
        }
    }

    fn service(gateway: Arc<FakeGateway>, price: &str, app_url: Option<&str>) -> CheckoutService {
        CheckoutService::new(
            gateway,
            PackPrices {
                credits_10: price.to_string(),
            },
            app_url.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_checkout_carries_user_and_pack() {
        let gateway = Arc::new(FakeGateway::default());
        let link = service(gateway.clone(), "price_10", Some("https://app.test/"))
            .create_checkout(Some("alice"), CheckoutRequest::default(), Some("http://other"))
            .await
            .unwrap();

        assert_eq!(link.url, "https://pay.test/cs_test_1");
        let sent = &gateway.requests()[0];
        assert_eq!(sent.user_id, "alice");
        assert_eq!(sent.pack, "credits_10");
        assert_eq!(sent.price_id, "price_10");
        assert_eq!(sent.quantity, 1);
        assert_eq!(sent.success_url, "https://app.test");
    }

    #[tokio::test]
    async fn test_origin_used_without_app_url() {
        let gateway = Arc::new(FakeGateway::default());
        service(gateway.clone(), "price_10", None)
            .create_checkout(Some("alice"), CheckoutRequest::default(), Some("http://localhost:3000"))
            .await
            .unwrap();

        assert_eq!(gateway.requests()[0].cancel_url, "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_unauthenticated_is_rejected_first() {
        let gateway = Arc::new(FakeGateway::default());
        let result = service(gateway.clone(), "", None)
            .create_checkout(None, CheckoutRequest::default(), None)
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
        assert!(gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_pack_or_missing_price() {
        let gateway = Arc::new(FakeGateway::default());

        let unknown = service(gateway.clone(), "price_10", Some("https://app.test"))
            .create_checkout(
                Some("alice"),
                CheckoutRequest {
                    pack: Some("credits_1000".to_string()),
                },
                None,
            )
            .await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let unpriced = service(gateway.clone(), "", Some("https://app.test"))
            .create_checkout(Some("alice"), CheckoutRequest::default(), None)
            .await;
        assert!(matches!(unpriced, Err(AppError::Validation(_))));

        assert!(gateway.requests().is_empty());
    }
}
