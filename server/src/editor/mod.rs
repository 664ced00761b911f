//! Canvas editor
//!
//! One base image plus any number of text layers, each independently
//! transformable. The session keeps the document, the selection and drag
//! state; a `Surface` draws it and produces PNG snapshots; an
//! `EditorBackend` persists saves.

pub mod document;
pub mod markup;
pub mod selection;
pub mod session;
pub mod snap;
pub mod surface;

pub use document::{EditorState, ImageTransform, TextLayer};
pub use markup::{Format, Style};
pub use selection::Selection;
pub use session::{EditorSession, SnapshotOptions, TextPatch, TransformPatch};
pub use snap::Guides;
pub use surface::{CanvasSize, Frame, Surface, SvgSurface};

use crate::error::Result;
use crate::services::logos::{SaveReceipt, SaveRequest};
use async_trait::async_trait;

/// Where editor saves go: in-process service or remote API
#[async_trait]
pub trait EditorBackend: Send + Sync {
    async fn save_logo(&self, request: SaveRequest) -> Result<SaveReceipt>;
}

/// `"{brand}-{logo_id}.png"`, with "logo" standing in for a missing brand
pub fn download_file_name(brand: Option<&str>, logo_id: &str) -> String {
    let brand = brand
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or("logo");
    format!("{}-{}.png", brand, logo_id)
}
