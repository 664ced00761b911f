//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::{Settings, WEBHOOK_TOLERANCE_SECS};
use crate::crypto::{SignatureVerifier, WebhookVerifier};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::generator::{ImageGenerator, OpenAiImageClient};
use crate::identity::{IdentityGateway, SessionIdentity};
use crate::payments::{CheckoutGateway, StripeCheckoutClient};
use crate::services::{
    BillingService, CheckoutService, GenerationService, LogosService, PackPrices, ProfilesService,
};
use crate::storage::{FsObjectStore, ObjectStore};
use std::sync::Arc;

/// Tunables that services take from settings
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub images_per_request: u32,
    pub credits_per_purchase: i64,
    pub pack_prices: PackPrices,
    /// Checkout return URL; `None` uses the request origin
    pub app_url: Option<String>,
}

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub repo: Repository,
    pub store: Arc<dyn ObjectStore>,
    pub identity: Arc<dyn IdentityGateway>,
    pub generation: GenerationService,
    pub logos: LogosService,
    pub billing: BillingService,
    pub checkout: CheckoutService,
    pub profiles: ProfilesService,
}

impl AppState {
    /// Wire services around the given collaborators
    pub fn new(
        repo: Repository,
        store: Arc<dyn ObjectStore>,
        generator: Arc<dyn ImageGenerator>,
        verifier: Arc<dyn WebhookVerifier>,
        payments: Arc<dyn CheckoutGateway>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            identity: Arc::new(SessionIdentity::new(repo.clone())),
            generation: GenerationService::new(
                repo.clone(),
                store.clone(),
                generator,
                options.images_per_request,
            ),
            logos: LogosService::new(repo.clone(), store.clone()),
            billing: BillingService::new(repo.clone(), verifier, options.credits_per_purchase),
            checkout: CheckoutService::new(payments, options.pack_prices, options.app_url),
            profiles: ProfilesService::new(repo.clone()),
            repo,
            store,
        }
    }

    /// Open the database and object store described by `settings`
    pub async fn initialize(settings: &Settings) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("Database: {:?}", settings.database.path);

        let pool = create_pool(&settings.database.path).await?;
        let repo = Repository::new(pool);

        let store = FsObjectStore::new(
            settings.storage.root.clone(),
            settings.storage.public_base_url.clone(),
        );
        store.initialize().await?;

        if settings.generator.api_key.is_empty() {
            tracing::warn!("No generator API key configured; generation requests will fail");
        }
        if settings.billing.webhook_secret.is_empty() {
            tracing::warn!("No webhook secret configured; payment events will be rejected");
        }
        if settings.billing.secret_key.is_empty() {
            tracing::warn!("No payment provider key configured; checkout will fail");
        }

        let generator = OpenAiImageClient::new(&settings.generator)?;
        let verifier = SignatureVerifier::new(
            settings.billing.webhook_secret.clone(),
            WEBHOOK_TOLERANCE_SECS,
        );
        let payments = StripeCheckoutClient::new(&settings.billing)?;

        let state = Self::new(
            repo,
            Arc::new(store),
            Arc::new(generator),
            Arc::new(verifier),
            Arc::new(payments),
            ServiceOptions {
                images_per_request: settings.generator.images_per_request,
                credits_per_purchase: settings.billing.credits_per_purchase,
                pack_prices: PackPrices::from_settings(&settings.billing),
                app_url: Some(settings.billing.app_url.clone()),
            },
        );

        tracing::info!("Application initialized successfully");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = Settings::load(None).unwrap();
        settings.database.path = temp_dir.path().join("db").join("logosmith.db");
        settings.storage.root = temp_dir.path().join("objects");

        let state = AppState::initialize(&settings).await.unwrap();

        assert!(settings.database.path.exists());
        assert!(settings.storage.root.exists());
        assert_eq!(state.repo.count_logos("nobody").await.unwrap(), 0);
    }
}
