//! Application configuration
//!
//! Central location for configuration constants, resource limits and
//! validation boundaries, plus the runtime `Settings` loaded from an optional
//! TOML file and `LOGOSMITH__*` environment variables.

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

// ===== Billing =====

/// Images requested from the generator per generation call
pub const IMAGES_PER_REQUEST: u32 = 1;

/// Credits consumed by one generation that persisted at least one image
pub const GENERATION_COST: i64 = 1;

/// Credits added by one confirmed purchase
pub const CREDITS_PER_PURCHASE: i64 = 20;

/// Maximum clock skew accepted on a signed webhook timestamp (5 minutes)
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

/// Credit pack bought when a checkout request names none
pub const DEFAULT_PACK: &str = "credits_10";

// ===== Generation Request Limits =====

pub const MAX_BRAND_LEN: usize = 120;
pub const MAX_SYMBOL_LEN: usize = 1_000;
pub const MAX_DESCRIPTION_LEN: usize = 2_000;
pub const MAX_INSTRUCTION_LEN: usize = 1_000;

/// Maximum number of palette colors accepted on a request
pub const MAX_PALETTE_COLORS: usize = 8;

// ===== Object Store =====

/// Bucket holding generated originals (`{user_id}/{random_id}.png`)
pub const LOGOS_BUCKET: &str = "logos";

/// Bucket holding editor previews (`{user_id}/{logo_id}.png`)
pub const PREVIEWS_BUCKET: &str = "logo-previews";

// ===== Editor =====

/// Version written into every serialized editor document
pub const EDITOR_STATE_VERSION: u32 = 1;

pub const DEFAULT_CANVAS_SIZE: f64 = 600.0;
pub const DEFAULT_BACKGROUND: &str = "#FFFFFF";
pub const DEFAULT_TEXT: &str = "Text Box";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_FONT_SIZE: f64 = 72.0;
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Share of the canvas the base image occupies when first placed
pub const IMAGE_FIT_MARGIN: f64 = 0.8;

/// Distance in pixels from a centerline at which drags snap onto it
pub const SNAP_THRESHOLD_PX: f64 = 8.0;

pub const MIN_ROTATION_DEG: f64 = -180.0;
pub const MAX_ROTATION_DEG: f64 = 180.0;

/// Device pixel ratio used for user downloads
pub const DOWNLOAD_PIXEL_RATIO: f32 = 2.0;

/// Runtime settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub billing: BillingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::host_default")]
    pub host: String,
    #[serde(default = "ServerSettings::port_default")]
    pub port: u16,
}

impl ServerSettings {
    fn host_default() -> String {
        "127.0.0.1".to_string()
    }

    fn port_default() -> u16 {
        8080
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::host_default(),
            port: Self::port_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::path_default")]
    pub path: PathBuf,
}

impl DatabaseSettings {
    fn path_default() -> PathBuf {
        PathBuf::from("./data/logosmith.db")
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: Self::path_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "StorageSettings::root_default")]
    pub root: PathBuf,
    /// Base URL under which `/storage/{bucket}/{path}` is reachable
    #[serde(default = "StorageSettings::public_base_url_default")]
    pub public_base_url: String,
}

impl StorageSettings {
    fn root_default() -> PathBuf {
        PathBuf::from("./data/objects")
    }

    fn public_base_url_default() -> String {
        "http://127.0.0.1:8080/storage".to_string()
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: Self::root_default(),
            public_base_url: Self::public_base_url_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "GeneratorSettings::base_url_default")]
    pub base_url: String,
    #[serde(default = "GeneratorSettings::model_default")]
    pub model: String,
    #[serde(default = "GeneratorSettings::size_default")]
    pub size: String,
    #[serde(default = "GeneratorSettings::images_per_request_default")]
    pub images_per_request: u32,
}

impl GeneratorSettings {
    fn base_url_default() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn model_default() -> String {
        "gpt-image-1".to_string()
    }

    fn size_default() -> String {
        "1024x1024".to_string()
    }

    fn images_per_request_default() -> u32 {
        IMAGES_PER_REQUEST
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::base_url_default(),
            model: Self::model_default(),
            size: Self::size_default(),
            images_per_request: Self::images_per_request_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingSettings {
    #[serde(default)]
    pub webhook_secret: String,
    #[serde(default = "BillingSettings::credits_per_purchase_default")]
    pub credits_per_purchase: i64,
    /// Payment provider API key used to open checkout sessions
    #[serde(default)]
    pub secret_key: String,
    #[serde(default = "BillingSettings::api_base_url_default")]
    pub api_base_url: String,
    /// Provider price id of the `credits_10` pack
    #[serde(default)]
    pub price_credits_10: String,
    /// Where checkout returns to; falls back to the request origin
    #[serde(default)]
    pub app_url: String,
}

impl BillingSettings {
    fn credits_per_purchase_default() -> i64 {
        CREDITS_PER_PURCHASE
    }

    fn api_base_url_default() -> String {
        "https://api.stripe.com".to_string()
    }
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            webhook_secret: String::new(),
            credits_per_purchase: Self::credits_per_purchase_default(),
            secret_key: String::new(),
            api_base_url: Self::api_base_url_default(),
            price_credits_10: String::new(),
            app_url: String::new(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file, overridden by `LOGOSMITH__SECTION__KEY` variables
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("LOGOSMITH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Generic(format!("Failed to load settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.generator.images_per_request == 0 {
            return Err(AppError::Validation(
                "generator.images_per_request must be at least 1".to_string(),
            ));
        }
        if self.billing.credits_per_purchase <= 0 {
            return Err(AppError::Validation(
                "billing.credits_per_purchase must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
