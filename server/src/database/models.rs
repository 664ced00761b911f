//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Prepaid balance of one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: String,
    pub credits: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bearer session resolving to a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// One persisted generated or edited image
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Logo {
    pub id: String,
    pub user_id: String,
    pub brand_name: String,
    pub symbol_description: String,
    pub business_description: Option<String>,
    /// JSON array of color strings
    pub palette_json: Option<String>,
    pub image_path: String,
    pub preview_path: Option<String>,
    /// Serialized editor document
    pub editor_state_json: Option<String>,
    pub parent_logo_id: Option<String>,
    pub edit_instruction: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Logo {
    /// Decoded palette; a malformed column reads as no palette
    pub fn palette(&self) -> Option<Vec<String>> {
        self.palette_json
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Insert request for a logo row
#[derive(Debug, Clone)]
pub struct NewLogo {
    pub user_id: String,
    pub brand_name: String,
    pub symbol_description: String,
    pub business_description: Option<String>,
    pub palette: Option<Vec<String>>,
    pub image_path: String,
    pub parent_logo_id: Option<String>,
    pub edit_instruction: Option<String>,
}

/// Editor save applied to an existing logo row
#[derive(Debug, Clone)]
pub struct PreviewUpdate {
    pub preview_path: String,
    /// `None` leaves the stored editor state untouched
    pub editor_state_json: Option<String>,
}

/// Outcome of applying a payment event to a balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    Credited { credits: i64 },
    AlreadyProcessed,
}
