//! Image generation
//!
//! The generator is an external, metered service: one synchronous call
//! returns zero or more base64-encoded images, never partial results.

pub mod openai;
pub mod prompt;

pub use openai::OpenAiImageClient;
pub use prompt::{build_prompt, PromptParts};

use crate::error::Result;
use async_trait::async_trait;

/// One image as returned by the generator, still base64 encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub b64: String,
}

/// Client for an image-generation provider
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Model identifier reported back to callers
    fn model(&self) -> &str;

    /// Request up to `count` images for `prompt`
    async fn generate_images(&self, prompt: &str, count: u32) -> Result<Vec<RawImage>>;
}
