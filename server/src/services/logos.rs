//! Logos service
//!
//! Listing, reading, saving editor output for, and deleting the caller's
//! logo records. Integrates Repository and ObjectStore; every operation is
//! scoped to the authenticated caller.

use crate::config::{LOGOS_BUCKET, PREVIEWS_BUCKET};
use crate::database::{Logo, PreviewUpdate, Repository};
use crate::editor::{EditorBackend, EditorState};
use crate::error::{AppError, Result};
use crate::storage::ObjectStore;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A logo record enriched with public URLs
#[derive(Debug, Clone, Serialize)]
pub struct LogoView {
    #[serde(flatten)]
    pub logo: Logo,
    pub palette: Option<Vec<String>>,
    pub url: String,
    /// Preview URL carrying `?v=<updated_at millis>` so re-saves bust caches
    pub preview_url: Option<String>,
}

impl LogoView {
    pub fn present(logo: Logo, store: &dyn ObjectStore) -> Self {
        let url = store.public_url(LOGOS_BUCKET, &logo.image_path);
        let preview_url = logo
            .preview_path
            .as_deref()
            .map(|path| preview_url(store, path, &logo.updated_at));
        Self {
            palette: logo.palette(),
            logo,
            url,
            preview_url,
        }
    }
}

/// A single logo together with its stored editor document
#[derive(Debug, Clone, Serialize)]
pub struct LogoDetail {
    #[serde(flatten)]
    pub view: LogoView,
    pub editor_state: Option<EditorState>,
}

/// Body of a save request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub logo_id: String,
    pub preview_data_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_state: Option<serde_json::Value>,
}

/// Result of a successful save
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaveReceipt {
    pub preview_url: String,
    pub updated_at: DateTime<Utc>,
}

/// Service for managing logo records
#[derive(Clone)]
pub struct LogosService {
    repo: Repository,
    store: Arc<dyn ObjectStore>,
}

impl LogosService {
    pub fn new(repo: Repository, store: Arc<dyn ObjectStore>) -> Self {
        Self { repo, store }
    }

    /// List the caller's logos, newest first
    pub async fn list_logos(&self, caller: Option<&str>) -> Result<Vec<LogoView>> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        let logos = self.repo.list_logos(user_id).await?;
        Ok(logos
            .into_iter()
            .map(|logo| LogoView::present(logo, self.store.as_ref()))
            .collect())
    }

    /// Get one of the caller's logos with its editor state
    pub async fn get_logo(&self, caller: Option<&str>, id: &str) -> Result<LogoDetail> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        let logo = self.repo.get_logo(user_id, id).await?;
        let editor_state = logo
            .editor_state_json
            .as_deref()
            .and_then(EditorState::from_json_lenient);

        Ok(LogoDetail {
            view: LogoView::present(logo, self.store.as_ref()),
            editor_state,
        })
    }

    /// Store an editor snapshot as the logo's preview and record the editor state
    pub async fn save_logo(&self, caller: Option<&str>, req: SaveRequest) -> Result<SaveReceipt> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        if req.logo_id.trim().is_empty() {
            return Err(AppError::Validation("Missing logoId".to_string()));
        }

        let logo = self.repo.get_logo(user_id, &req.logo_id).await?;
        let png = decode_png_data_url(&req.preview_data_url)?;

        let editor_state_json = match req.editor_state {
            Some(value) => Some(EditorState::from_value(value)?.to_json()?),
            None => None,
        };

        // Reuse a preview path only when it already lives under the caller's prefix
        let owner_prefix = format!("{}/", user_id);
        let preview_path = match logo.preview_path {
            Some(path) if path.starts_with(&owner_prefix) => path,
            _ => format!("{}{}.png", owner_prefix, logo.id),
        };

        tracing::info!("Saving preview for logo {} at {}", logo.id, preview_path);

        self.store
            .put(PREVIEWS_BUCKET, &preview_path, &png, "image/png")
            .await?;

        let updated = self
            .repo
            .update_logo_preview(
                user_id,
                &logo.id,
                PreviewUpdate {
                    preview_path: preview_path.clone(),
                    editor_state_json,
                },
            )
            .await?;

        Ok(SaveReceipt {
            preview_url: preview_url(self.store.as_ref(), &preview_path, &updated.updated_at),
            updated_at: updated.updated_at,
        })
    }

    /// Delete a logo: stored original first, then preview, then the row.
    ///
    /// If the original cannot be removed the row is kept.
    pub async fn delete_logo(&self, caller: Option<&str>, id: &str) -> Result<()> {
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        let logo = self.repo.get_logo(user_id, id).await?;
        tracing::info!("Deleting logo: {}", logo.id);

        self.store
            .delete(LOGOS_BUCKET, &logo.image_path)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to remove stored image {}: {}", logo.image_path, e);
                AppError::Storage(format!("Failed to remove stored image: {}", e))
            })?;

        if let Some(preview_path) = &logo.preview_path {
            if let Err(e) = self.store.delete(PREVIEWS_BUCKET, preview_path).await {
                tracing::warn!("Failed to remove preview {}: {}", preview_path, e);
            }
        }

        self.repo.delete_logo(user_id, &logo.id).await?;

        tracing::info!("Logo deleted successfully: {}", logo.id);
        Ok(())
    }

    /// Bind the service to one user, for in-process editor saves
    pub fn bind(&self, user_id: impl Into<String>) -> UserLogos {
        UserLogos {
            service: self.clone(),
            user_id: user_id.into(),
        }
    }
}

/// A `LogosService` acting on behalf of one user
#[derive(Clone)]
pub struct UserLogos {
    service: LogosService,
    user_id: String,
}

impl UserLogos {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn service(&self) -> &LogosService {
        &self.service
    }
}

#[async_trait]
impl EditorBackend for UserLogos {
    async fn save_logo(&self, request: SaveRequest) -> Result<SaveReceipt> {
        self.service.save_logo(Some(&self.user_id), request).await
    }
}

fn preview_url(store: &dyn ObjectStore, path: &str, updated_at: &DateTime<Utc>) -> String {
    format!(
        "{}?v={}",
        store.public_url(PREVIEWS_BUCKET, path),
        updated_at.timestamp_millis()
    )
}

/// Decode a `data:image/png;base64,...` URL
pub fn decode_png_data_url(data_url: &str) -> Result<Vec<u8>> {
    let invalid = || AppError::Validation("Invalid previewDataUrl".to_string());

    let prefix_ok = data_url
        .get(..PNG_DATA_URL_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(PNG_DATA_URL_PREFIX));
    if !prefix_ok {
        return Err(invalid());
    }

    let payload = &data_url[PNG_DATA_URL_PREFIX.len()..];
    if payload.is_empty() {
        return Err(invalid());
    }

    STANDARD.decode(payload).map_err(|_| invalid())
}

/// Encode PNG bytes as a data URL
pub fn encode_png_data_url(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(png))
}
