//! HTTP client for the service
//!
//! Used by front ends and tooling: generation, profile reads and editor
//! saves over the JSON API, plus the resume-after-login flow in `resume`.

pub mod resume;

pub use resume::{FlowState, GenerationApi, PendingAction, ResumeFlow, SessionPolicy, SessionCheck};

use crate::database::Profile;
use crate::editor::EditorBackend;
use crate::error::{AppError, Result};
use crate::services::{CheckoutLink, CheckoutRequest, GenerateRequest, SaveReceipt, SaveRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::RwLock;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// One logo as returned by the API
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteLogo {
    pub id: String,
    pub brand_name: String,
    pub url: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub parent_logo_id: Option<String>,
}

/// `POST /generate` success body
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLogos {
    pub model: String,
    pub prompt: String,
    pub logos: Vec<RemoteLogo>,
    pub remaining_credits: i64,
    #[serde(default)]
    pub attempted: usize,
    #[serde(default)]
    pub failed: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    profile: Profile,
}

/// Rebuild the typed error from a failed response
fn error_from_response(status: u16, body: &str) -> AppError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.as_deref());
    let message = parsed
        .as_ref()
        .map(|b| b.error.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status));

    match (status, code) {
        (401, _) => AppError::Unauthorized,
        (402, _) | (_, Some("INSUFFICIENT_CREDITS")) => AppError::InsufficientCredits,
        (_, Some("PROFILE_NOT_FOUND")) => AppError::ProfileNotFound,
        (404, _) => AppError::NotFound(message),
        (403, _) => AppError::Forbidden(message),
        (_, Some("VALIDATION_ERROR")) => AppError::Validation(message),
        (_, Some("GENERATION_FAILED")) => AppError::Generator(message),
        (_, Some("CHECKOUT_FAILED")) => AppError::Payment(message),
        _ => AppError::Generic(message),
    }
}

/// JSON API client authenticated with a bearer session token
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("logosmith-client/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        })
    }

    /// Install or clear the session token
    pub fn set_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = token;
        }
    }

    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), &body));
        }
        Ok(response.json().await?)
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedLogos> {
        let response = self
            .request(reqwest::Method::POST, "/generate")
            .json(request)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn profile(&self) -> Result<Profile> {
        let response = self
            .request(reqwest::Method::GET, "/profiles/me")
            .send()
            .await?;
        let envelope: ProfileEnvelope = Self::read(response).await?;
        Ok(envelope.profile)
    }

    /// Hosted payment page URL for a credit pack
    pub async fn checkout(&self, pack: Option<&str>) -> Result<String> {
        let response = self
            .request(reqwest::Method::POST, "/billing/checkout")
            .json(&CheckoutRequest {
                pack: pack.map(str::to_string),
            })
            .send()
            .await?;
        let link: CheckoutLink = Self::read(response).await?;
        Ok(link.url)
    }
}

#[async_trait]
impl GenerationApi for ApiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GeneratedLogos> {
        ApiClient::generate(self, request).await
    }
}

#[async_trait]
impl SessionCheck for ApiClient {
    async fn has_session(&self) -> bool {
        if self.token().is_none() {
            return false;
        }
        !matches!(self.profile().await, Err(AppError::Unauthorized))
    }
}

#[async_trait]
impl EditorBackend for ApiClient {
    async fn save_logo(&self, request: SaveRequest) -> Result<SaveReceipt> {
        let response = self
            .request(reqwest::Method::POST, "/logos/save")
            .json(&request)
            .send()
            .await?;
        Self::read(response).await
    }
}
