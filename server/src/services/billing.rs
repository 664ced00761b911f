//! Billing reconciliation
//!
//! Credits a user's balance when the payment processor confirms a checkout.
//! Events are delivered at least once: the signature is checked before the
//! body is trusted, replays of an event id are no-ops, and every verified
//! event is acknowledged even when applying it fails.

use crate::crypto::WebhookVerifier;
use crate::database::{CreditOutcome, Repository};
use crate::error::{AppError, Result};
use serde::Deserialize;
use std::sync::Arc;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<EventData>,
}

#[derive(Debug, Deserialize)]
struct EventData {
    #[serde(default)]
    object: Option<CheckoutSession>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSession {
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    #[serde(default)]
    user_id: Option<String>,
    /// Credit pack named at checkout
    #[serde(default)]
    pack: Option<String>,
}

impl WebhookEvent {
    fn pack(&self) -> Option<&str> {
        self.data
            .as_ref()?
            .object
            .as_ref()?
            .metadata
            .as_ref()?
            .pack
            .as_deref()
    }

    /// User to credit, when this is a paid checkout
    fn paid_user(&self) -> Option<&str> {
        if self.event_type != CHECKOUT_COMPLETED {
            return None;
        }
        let session = self.data.as_ref()?.object.as_ref()?;
        if session.payment_status.as_deref() != Some("paid") {
            return None;
        }
        session
            .metadata
            .as_ref()?
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// What happened to a verified event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Credited { user_id: String, credits: i64 },
    Duplicate { event_id: String },
    Ignored { event_type: String },
    /// Verified but not applied; acknowledged anyway
    Failed { reason: String },
}

/// Service applying payment events to balances
#[derive(Clone)]
pub struct BillingService {
    repo: Repository,
    verifier: Arc<dyn WebhookVerifier>,
    credits_per_purchase: i64,
}

impl BillingService {
    pub fn new(
        repo: Repository,
        verifier: Arc<dyn WebhookVerifier>,
        credits_per_purchase: i64,
    ) -> Self {
        Self {
            repo,
            verifier,
            credits_per_purchase,
        }
    }

    /// Handle one webhook delivery.
    ///
    /// Returns `Err(InvalidSignature)` when the payload cannot be trusted;
    /// every other result means the delivery should be acknowledged.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: i64,
    ) -> Result<WebhookOutcome> {
        let signature = signature.ok_or(AppError::InvalidSignature)?;
        self.verifier.verify(payload, signature, now).map_err(|e| {
            tracing::warn!("Rejected webhook delivery: {}", e);
            AppError::InvalidSignature
        })?;

        let event: WebhookEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Verified webhook body is not a valid event: {}", e);
                return Ok(WebhookOutcome::Failed {
                    reason: e.to_string(),
                });
            }
        };

        let Some(user_id) = event.paid_user() else {
            tracing::info!("Ignoring webhook event {} ({})", event.id, event.event_type);
            return Ok(WebhookOutcome::Ignored {
                event_type: event.event_type,
            });
        };

        let outcome = match self
            .repo
            .apply_payment_event(&event.id, &event.event_type, user_id, self.credits_per_purchase)
            .await
        {
            Ok(CreditOutcome::Credited { credits }) => {
                tracing::info!(
                    "Credited {} to {} for event {} (pack {}, balance {})",
                    self.credits_per_purchase,
                    user_id,
                    event.id,
                    event.pack().unwrap_or("unknown"),
                    credits
                );
                WebhookOutcome::Credited {
                    user_id: user_id.to_string(),
                    credits,
                }
            }
            Ok(CreditOutcome::AlreadyProcessed) => {
                tracing::info!("Webhook event {} already applied", event.id);
                WebhookOutcome::Duplicate { event_id: event.id }
            }
            Err(e) => {
                tracing::error!("Failed to apply webhook event {}: {}", event.id, e);
                WebhookOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign, SignatureVerifier};
    use crate::database::create_memory_pool;

    const SECRET: &str = "whsec_test";
    const NOW: i64 = 1_760_000_000;

    async fn create_test_service() -> (BillingService, Repository) {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        let verifier = Arc::new(SignatureVerifier::new(SECRET, 300));
        (BillingService::new(repo.clone(), verifier, 20), repo)
    }

    fn checkout_event(id: &str, user_id: &str, status: &str) -> Vec<u8> {
        serde_json::json!({
            "id": id,
            "type": CHECKOUT_COMPLETED,
            "data": { "object": {
                "payment_status": status,
                "metadata": { "user_id": user_id }
            }}
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_paid_checkout_credits_once() {
        let (service, repo) = create_test_service().await;
        repo.create_profile("alice", 1).await.unwrap();

        let payload = checkout_event("evt_1", "alice", "paid");
        let header = sign(SECRET, NOW, &payload).unwrap();

        let first = service
            .handle_webhook(&payload, Some(&header), NOW)
            .await
            .unwrap();
        assert_eq!(
            first,
            WebhookOutcome::Credited {
                user_id: "alice".to_string(),
                credits: 21
            }
        );

        let replay = service
            .handle_webhook(&payload, Some(&header), NOW + 5)
            .await
            .unwrap();
        assert!(matches!(replay, WebhookOutcome::Duplicate { .. }));
        assert_eq!(repo.get_credits("alice").await.unwrap(), Some(21));
    }

    #[tokio::test]
    async fn test_invalid_signature_never_mutates() {
        let (service, repo) = create_test_service().await;
        repo.create_profile("alice", 0).await.unwrap();

        let payload = checkout_event("evt_1", "alice", "paid");
        let forged = sign("whsec_forged", NOW, &payload).unwrap();

        for header in [Some(forged.as_str()), Some("t=1,v1=00"), None] {
            let result = service.handle_webhook(&payload, header, NOW).await;
            assert!(matches!(result, Err(AppError::InvalidSignature)));
        }
        assert_eq!(repo.get_credits("alice").await.unwrap(), Some(0));
        assert!(!repo.is_event_processed("evt_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unpaid_and_other_events_are_ignored() {
        let (service, repo) = create_test_service().await;
        repo.create_profile("alice", 0).await.unwrap();

        let unpaid = checkout_event("evt_1", "alice", "unpaid");
        let header = sign(SECRET, NOW, &unpaid).unwrap();
        let outcome = service
            .handle_webhook(&unpaid, Some(&header), NOW)
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Ignored { .. }));

        let other = br#"{"id":"evt_2","type":"invoice.paid","data":{"object":{}}}"#;
        let header = sign(SECRET, NOW, other).unwrap();
        let outcome = service
            .handle_webhook(other, Some(&header), NOW)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                event_type: "invoice.paid".to_string()
            }
        );

        assert_eq!(repo.get_credits("alice").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_unknown_user_is_acknowledged_as_failed() {
        let (service, _repo) = create_test_service().await;

        let payload = checkout_event("evt_1", "ghost", "paid");
        let header = sign(SECRET, NOW, &payload).unwrap();
        let outcome = service
            .handle_webhook(&payload, Some(&header), NOW)
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_garbage_body_with_valid_signature_is_acknowledged() {
        let (service, _repo) = create_test_service().await;

        let payload = b"not json";
        let header = sign(SECRET, NOW, payload).unwrap();
        let outcome = service
            .handle_webhook(payload, Some(&header), NOW)
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Failed { .. }));
    }
}
