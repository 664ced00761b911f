//! Generation workflow
//!
//! Authenticate, check the balance, build the prompt, call the generator
//! once, persist each returned image independently, then debit one credit
//! if anything was persisted.

use crate::config::{
    GENERATION_COST, LOGOS_BUCKET, MAX_BRAND_LEN, MAX_DESCRIPTION_LEN, MAX_INSTRUCTION_LEN,
    MAX_PALETTE_COLORS, MAX_SYMBOL_LEN,
};
use crate::database::{NewLogo, Repository};
use crate::error::{AppError, Result};
use crate::generator::{build_prompt, ImageGenerator, PromptParts, RawImage};
use crate::palettes::is_hex_color;
use crate::services::logos::LogoView;
use crate::storage::ObjectStore;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Body of `POST /generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_logo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_instruction: Option<String>,
}

/// Edit target extracted from a validated request
#[derive(Debug, Clone, PartialEq)]
struct EditTarget {
    parent_logo_id: String,
    instruction: String,
}

/// A request that passed validation, with trimmed fields
#[derive(Debug, Clone, PartialEq)]
struct ValidRequest {
    brand: String,
    symbol: String,
    description: Option<String>,
    palette: Option<Vec<String>>,
    edit: Option<EditTarget>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl GenerateRequest {
    fn validate(&self) -> Result<ValidRequest> {
        let parent = trimmed(self.parent_logo_id.as_deref());
        let instruction = trimmed(self.edit_instruction.as_deref());

        let edit = match (parent, instruction) {
            (Some(parent_logo_id), Some(instruction)) => {
                if instruction.chars().count() > MAX_INSTRUCTION_LEN {
                    return Err(AppError::Validation("Edit instruction is too long".to_string()));
                }
                Some(EditTarget {
                    parent_logo_id,
                    instruction,
                })
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(AppError::Validation("Missing editInstruction".to_string()))
            }
            (None, Some(_)) => {
                return Err(AppError::Validation("Missing parentLogoId".to_string()))
            }
        };

        let brand = self.brand.trim().to_string();
        let symbol = self.symbol.trim().to_string();
        let description = trimmed(self.description.as_deref());

        // Edits inherit brand, symbol and description from the parent
        if edit.is_none() {
            if brand.is_empty() {
                return Err(AppError::Validation("Missing brand".to_string()));
            }
            if symbol.is_empty() {
                return Err(AppError::Validation("Missing symbol".to_string()));
            }
            if brand.chars().count() > MAX_BRAND_LEN {
                return Err(AppError::Validation("Brand is too long".to_string()));
            }
            if symbol.chars().count() > MAX_SYMBOL_LEN {
                return Err(AppError::Validation("Symbol is too long".to_string()));
            }
            if description
                .as_ref()
                .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
            {
                return Err(AppError::Validation("Description is too long".to_string()));
            }
        }

        let palette = match &self.palette {
            Some(colors) if !colors.is_empty() => {
                if colors.len() > MAX_PALETTE_COLORS {
                    return Err(AppError::Validation(format!(
                        "Palette may contain at most {} colors",
                        MAX_PALETTE_COLORS
                    )));
                }
                if let Some(bad) = colors.iter().find(|c| !is_hex_color(c.trim())) {
                    return Err(AppError::Validation(format!("Invalid palette color: {}", bad)));
                }
                Some(colors.iter().map(|c| c.trim().to_string()).collect())
            }
            _ => None,
        };

        Ok(ValidRequest {
            brand,
            symbol,
            description,
            palette,
            edit,
        })
    }
}

/// Outcome of persisting one generated image
#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Persisted(LogoView),
    Failed { index: usize, reason: String },
}

/// Result of one generation request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationReport {
    pub model: String,
    pub prompt: String,
    pub logos: Vec<LogoView>,
    pub remaining_credits: i64,
    /// Images the generator returned
    pub attempted: usize,
    /// Images that could not be persisted
    pub failed: usize,
}

impl GenerationReport {
    fn from_outcomes(
        model: String,
        prompt: String,
        outcomes: Vec<ImageOutcome>,
        remaining_credits: i64,
    ) -> Self {
        let attempted = outcomes.len();
        let logos: Vec<LogoView> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                ImageOutcome::Persisted(view) => Some(view),
                ImageOutcome::Failed { index, reason } => {
                    tracing::debug!("Image {} skipped: {}", index, reason);
                    None
                }
            })
            .collect();
        let failed = attempted - logos.len();

        Self {
            model,
            prompt,
            logos,
            remaining_credits,
            attempted,
            failed,
        }
    }
}

/// Credit-gated generation service
#[derive(Clone)]
pub struct GenerationService {
    repo: Repository,
    store: Arc<dyn ObjectStore>,
    generator: Arc<dyn ImageGenerator>,
    images_per_request: u32,
}

impl GenerationService {
    pub fn new(
        repo: Repository,
        store: Arc<dyn ObjectStore>,
        generator: Arc<dyn ImageGenerator>,
        images_per_request: u32,
    ) -> Self {
        Self {
            repo,
            store,
            generator,
            images_per_request: images_per_request.max(1),
        }
    }

    /// Run one generation request for `caller`
    pub async fn generate(
        &self,
        caller: Option<&str>,
        request: GenerateRequest,
    ) -> Result<GenerationReport> {
        let mut req = request.validate()?;
        let user_id = caller.ok_or(AppError::Unauthorized)?;

        // Balance is read fresh; nothing paid happens below the floor
        let balance = self
            .repo
            .get_credits(user_id)
            .await?
            .ok_or(AppError::ProfileNotFound)?;
        if balance < GENERATION_COST {
            tracing::info!("Generation refused for {}: balance {}", user_id, balance);
            return Err(AppError::InsufficientCredits);
        }

        if let Some(edit) = &req.edit {
            let parent = self
                .repo
                .find_logo_any_owner(&edit.parent_logo_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("logo {}", edit.parent_logo_id)))?;
            if parent.user_id != user_id {
                tracing::warn!(
                    "User {} attempted to edit logo {} owned by another user",
                    user_id,
                    parent.id
                );
                return Err(AppError::Forbidden(format!("logo {}", parent.id)));
            }

            let parent_palette = parent.palette();
            req.brand = parent.brand_name;
            req.symbol = parent.symbol_description;
            req.description = parent.business_description;
            if req.palette.is_none() {
                req.palette = parent_palette;
            }
        }

        let prompt = build_prompt(&PromptParts {
            brand: &req.brand,
            symbol: &req.symbol,
            description: req.description.as_deref(),
            palette: req.palette.as_deref(),
            edit_instruction: req.edit.as_ref().map(|e| e.instruction.as_str()),
        });

        tracing::info!(
            "Generating {} image(s) for {} (brand: {})",
            self.images_per_request,
            user_id,
            req.brand
        );
        let images = self
            .generator
            .generate_images(&prompt, self.images_per_request)
            .await?;

        if images.is_empty() {
            return Err(AppError::Generator("No image returned from generator".to_string()));
        }

        let mut outcomes = Vec::with_capacity(images.len());
        for (index, raw) in images.iter().enumerate() {
            let outcome = match self.persist_image(user_id, &req, raw).await {
                Ok(view) => ImageOutcome::Persisted(view),
                Err(e) => {
                    tracing::warn!("Failed to persist image {} for {}: {}", index, user_id, e);
                    ImageOutcome::Failed {
                        index,
                        reason: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        let persisted = outcomes
            .iter()
            .filter(|o| matches!(o, ImageOutcome::Persisted(_)))
            .count();

        let remaining_credits = if persisted > 0 {
            self.debit(user_id, balance).await
        } else {
            tracing::warn!("No images persisted for {}; not charging", user_id);
            balance
        };

        tracing::info!(
            "Generation finished for {}: {}/{} persisted, {} credits left",
            user_id,
            persisted,
            outcomes.len(),
            remaining_credits
        );

        Ok(GenerationReport::from_outcomes(
            self.generator.model().to_string(),
            prompt,
            outcomes,
            remaining_credits,
        ))
    }

    /// Debit one generation; falls back to the pre-debit balance on failure
    async fn debit(&self, user_id: &str, balance: i64) -> i64 {
        match self
            .repo
            .adjust_credits_if_at_least(user_id, -GENERATION_COST, GENERATION_COST)
            .await
        {
            Ok(Some(credits)) => credits,
            Ok(None) => {
                tracing::warn!("Debit skipped for {}: balance fell below cost", user_id);
                balance
            }
            Err(e) => {
                tracing::warn!("Debit failed for {}: {}", user_id, e);
                balance
            }
        }
    }

    async fn persist_image(
        &self,
        user_id: &str,
        req: &ValidRequest,
        raw: &RawImage,
    ) -> Result<LogoView> {
        let bytes = STANDARD.decode(raw.b64.trim())?;
        match image::guess_format(&bytes) {
            Ok(image::ImageFormat::Png) => {}
            _ => return Err(AppError::Validation("Generated image is not a PNG".to_string())),
        }

        let path = format!("{}/{}.png", user_id, Uuid::new_v4());
        self.store
            .put(LOGOS_BUCKET, &path, &bytes, "image/png")
            .await?;

        let inserted = self
            .repo
            .insert_logo(NewLogo {
                user_id: user_id.to_string(),
                brand_name: req.brand.clone(),
                symbol_description: req.symbol.clone(),
                business_description: req.description.clone(),
                palette: req.palette.clone(),
                image_path: path.clone(),
                parent_logo_id: req.edit.as_ref().map(|e| e.parent_logo_id.clone()),
                edit_instruction: req.edit.as_ref().map(|e| e.instruction.clone()),
            })
            .await;

        match inserted {
            Ok(logo) => Ok(LogoView::present(logo, self.store.as_ref())),
            Err(e) => {
                // The object has no row pointing at it; drop it
                if let Err(cleanup) = self.store.delete(LOGOS_BUCKET, &path).await {
                    tracing::warn!("Failed to remove orphaned object {}: {}", path, cleanup);
                }
                Err(e)
            }
        }
    }
}
