//! Editor document
//!
//! The serialized form stored in `logos.editor_state_json`:
//!
//! ```json
//! {"v":1,"bgColor":"#FFFFFF",
//!  "image":{"rotation":0,"opacity":1,"x":60,"y":60,"scaleX":0.47,"scaleY":0.47},
//!  "textLayers":[{"id":"...","text":"Acme","html":"<b>Acme</b>","fontFamily":"Inter",
//!                 "fontSize":72,"color":"#000000","x":300,"y":300,"rotation":0,
//!                 "scaleX":1,"scaleY":1,"opacity":1}]}
//! ```
//!
//! Stored documents may predate fields; anything missing is filled with the
//! editor defaults on load.

use super::markup;
use crate::config::{
    DEFAULT_BACKGROUND, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_TEXT, DEFAULT_TEXT_COLOR,
    EDITOR_STATE_VERSION,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_version() -> u32 {
    EDITOR_STATE_VERSION
}

fn default_background() -> String {
    DEFAULT_BACKGROUND.to_string()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_text_color() -> String {
    DEFAULT_TEXT_COLOR.to_string()
}

fn one() -> f64 {
    1.0
}

/// Full editor document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    #[serde(rename = "v", default = "default_version")]
    pub version: u32,
    #[serde(rename = "bgColor", default = "default_background")]
    pub background_color: String,
    #[serde(default)]
    pub image: ImageTransform,
    /// Insertion order; later layers draw on top
    #[serde(default)]
    pub text_layers: Vec<TextLayer>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            version: EDITOR_STATE_VERSION,
            background_color: default_background(),
            image: ImageTransform::default(),
            text_layers: Vec::new(),
        }
    }
}

/// Transform of the base image. Position is the top-left corner before
/// rotation; absent position or scale means "fit to canvas".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTransform {
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            opacity: 1.0,
            x: None,
            y: None,
            scale_x: None,
            scale_y: None,
        }
    }
}

impl ImageTransform {
    pub fn is_placed(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// One independently transformable text layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
    /// Inline markup limited to bold, italic and underline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default = "default_text_color")]
    pub color: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "one")]
    pub scale_x: f64,
    #[serde(default = "one")]
    pub scale_y: f64,
    #[serde(default = "one")]
    pub opacity: f64,
}

impl TextLayer {
    /// A new layer with the editor defaults, anchored at `(x, y)`
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: DEFAULT_TEXT.to_string(),
            html: Some(markup::escape_text(DEFAULT_TEXT)),
            font_family: default_font_family(),
            font_size: DEFAULT_FONT_SIZE,
            color: default_text_color(),
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
        }
    }

    /// Markup for this layer, derived from the plain text when absent
    pub fn markup(&self) -> String {
        self.html
            .clone()
            .unwrap_or_else(|| markup::escape_text(&self.text))
    }
}

impl EditorState {
    /// Parse a stored document. Missing fields take defaults; a document that
    /// is not an object at all is rejected.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(AppError::Validation(
                "Editor state must be a JSON object".to_string(),
            ));
        }
        let state: EditorState = serde_json::from_value(value)
            .map_err(|e| AppError::Validation(format!("Invalid editor state: {}", e)))?;
        Ok(state.normalized())
    }

    /// Parse stored text, treating anything unreadable as "no state"
    pub fn from_json_lenient(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        match Self::from_value(value) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!("Ignoring unreadable editor state: {}", e);
                None
            }
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn text_layer(&self, id: &str) -> Option<&TextLayer> {
        self.text_layers.iter().find(|l| l.id == id)
    }

    pub fn text_layer_mut(&mut self, id: &str) -> Option<&mut TextLayer> {
        self.text_layers.iter_mut().find(|l| l.id == id)
    }

    /// Fill gaps left by older documents
    fn normalized(mut self) -> Self {
        self.version = EDITOR_STATE_VERSION;
        self.image.opacity = self.image.opacity.clamp(0.0, 1.0);

        for layer in &mut self.text_layers {
            if layer.id.is_empty() {
                layer.id = Uuid::new_v4().to_string();
            }
            match &layer.html {
                Some(html) => layer.text = markup::plain_text(html),
                None => layer.html = Some(markup::escape_text(&layer.text)),
            }
            layer.opacity = layer.opacity.clamp(0.0, 1.0);
        }
        self
    }
}
