//! Editor session
//!
//! Owns one editor document and drives a `Surface` with it. Controls that
//! act "on the selection" dispatch over `Selection`: rotation and opacity
//! work for the image and for text layers, font and color controls only for
//! text layers.

use super::document::{EditorState, TextLayer};
use super::markup::{self, Format, Style};
use super::selection::Selection;
use super::snap::{snap_to_center, Guides};
use super::surface::{fit_placement, Frame, Surface};
use super::{download_file_name, EditorBackend};
use crate::config::{DOWNLOAD_PIXEL_RATIO, MAX_ROTATION_DEG, MIN_ROTATION_DEG, SNAP_THRESHOLD_PX};
use crate::error::{AppError, Result};
use crate::palettes::is_hex_color;
use crate::services::logos::{encode_png_data_url, SaveReceipt, SaveRequest};
use std::ops::Range;

/// Changes to a text layer's content and typography
#[derive(Debug, Clone, Default)]
pub struct TextPatch {
    pub text: Option<String>,
    /// Takes precedence over `text` when both are set
    pub html: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<String>,
}

/// Changes to a layer's placement
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    /// 0..1
    pub opacity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotOptions {
    /// Leave the background fill out of the export
    pub transparent: bool,
    pub pixel_ratio: f32,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            transparent: false,
            pixel_ratio: DOWNLOAD_PIXEL_RATIO,
        }
    }
}

impl SnapshotOptions {
    /// Options used for stored previews
    pub fn preview() -> Self {
        Self {
            transparent: false,
            pixel_ratio: 1.0,
        }
    }
}

fn clamp_rotation(deg: f64) -> f64 {
    deg.clamp(MIN_ROTATION_DEG, MAX_ROTATION_DEG)
}

/// Offset from a top-left origin to the center of a `w` x `h` box rotated by `deg`
fn center_offset(w: f64, h: f64, deg: f64) -> (f64, f64) {
    let (sin, cos) = deg.to_radians().sin_cos();
    ((w * cos - h * sin) / 2.0, (w * sin + h * cos) / 2.0)
}

fn validate_color(color: &str) -> Result<String> {
    let color = color.trim();
    if !is_hex_color(color) {
        return Err(AppError::Validation(format!("Invalid color: {}", color)));
    }
    Ok(color.to_string())
}

pub struct EditorSession<S: Surface> {
    logo_id: String,
    brand: Option<String>,
    state: EditorState,
    selection: Selection,
    surface: S,
    dragging: Option<Selection>,
    guides: Guides,
    /// Serialized state at load or last save
    baseline: String,
}

impl<S: Surface> EditorSession<S> {
    /// Open a session on a logo, hydrating any stored state
    pub fn open(
        logo_id: impl Into<String>,
        brand: Option<String>,
        stored: Option<EditorState>,
        surface: S,
    ) -> Self {
        let mut session = Self {
            logo_id: logo_id.into(),
            brand,
            state: stored.unwrap_or_default(),
            selection: Selection::Image,
            surface,
            dragging: None,
            guides: Guides::default(),
            baseline: String::new(),
        };

        if !session.state.image.is_placed() {
            if let Some((w, h)) = session.surface.image_size() {
                session.fit_image(w, h);
            }
        }
        session.baseline = session.serialized();
        session
    }

    pub fn logo_id(&self) -> &str {
        &self.logo_id
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn guides(&self) -> Guides {
        self.guides
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn serialized(&self) -> String {
        self.state.to_json().unwrap_or_default()
    }

    /// Whether the document differs from what was loaded or last saved
    pub fn is_dirty(&self) -> bool {
        self.serialized() != self.baseline
    }

    // ===== Layers =====

    /// Add a default text layer at the canvas center and select it
    pub fn add_text_layer(&mut self) -> String {
        let canvas = self.surface.canvas();
        let layer = TextLayer::new(canvas.width / 2.0, canvas.height / 2.0);
        let id = layer.id.clone();
        self.state.text_layers.push(layer);
        self.selection = Selection::Text(id.clone());
        id
    }

    pub fn remove_text_layer(&mut self, id: &str) -> Result<()> {
        let before = self.state.text_layers.len();
        self.state.text_layers.retain(|l| l.id != id);
        if self.state.text_layers.len() == before {
            return Err(AppError::NotFound(format!("text layer {}", id)));
        }
        if self.selection.text_id() == Some(id) {
            self.selection = Selection::None;
        }
        Ok(())
    }

    fn layer_mut(&mut self, id: &str) -> Result<&mut TextLayer> {
        self.state
            .text_layer_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("text layer {}", id)))
    }

    pub fn update_text_layer(&mut self, id: &str, patch: TextPatch) -> Result<()> {
        let color = patch.color.as_deref().map(validate_color).transpose()?;
        if patch.font_size.is_some_and(|s| !s.is_finite() || s <= 0.0) {
            return Err(AppError::Validation("Font size must be positive".to_string()));
        }

        let layer = self.layer_mut(id)?;
        if let Some(html) = patch.html {
            layer.text = markup::plain_text(&html);
            layer.html = Some(html);
        } else if let Some(text) = patch.text {
            layer.html = Some(markup::escape_text(&text));
            layer.text = text;
        }
        if let Some(family) = patch.font_family.filter(|f| !f.trim().is_empty()) {
            layer.font_family = family;
        }
        if let Some(size) = patch.font_size {
            layer.font_size = size;
        }
        if let Some(color) = color {
            layer.color = color;
        }
        Ok(())
    }

    /// Move, rotate, scale or fade the image or a text layer
    pub fn reposition_layer(&mut self, target: &Selection, patch: TransformPatch) -> Result<()> {
        match target {
            Selection::None => Err(AppError::Validation("No layer to reposition".to_string())),
            Selection::Image => self.set_image_transform(patch),
            Selection::Text(id) => {
                let layer = self.layer_mut(id)?;
                if let Some(x) = patch.x {
                    layer.x = x;
                }
                if let Some(y) = patch.y {
                    layer.y = y;
                }
                if let Some(rotation) = patch.rotation {
                    layer.rotation = clamp_rotation(rotation);
                }
                if let Some(sx) = patch.scale_x {
                    layer.scale_x = sx;
                }
                if let Some(sy) = patch.scale_y {
                    layer.scale_y = sy;
                }
                if let Some(opacity) = patch.opacity {
                    layer.opacity = opacity.clamp(0.0, 1.0);
                }
                Ok(())
            }
        }
    }

    pub fn set_image_transform(&mut self, patch: TransformPatch) -> Result<()> {
        let image = &mut self.state.image;
        if let Some(x) = patch.x {
            image.x = Some(x);
        }
        if let Some(y) = patch.y {
            image.y = Some(y);
        }
        if let Some(rotation) = patch.rotation {
            image.rotation = clamp_rotation(rotation);
        }
        if let Some(sx) = patch.scale_x {
            image.scale_x = Some(sx);
        }
        if let Some(sy) = patch.scale_y {
            image.scale_y = Some(sy);
        }
        if let Some(opacity) = patch.opacity {
            image.opacity = opacity.clamp(0.0, 1.0);
        }
        Ok(())
    }

    /// Center the image at the fit margin, keeping its rotation
    pub fn fit_image(&mut self, image_width: f64, image_height: f64) {
        let placement = fit_placement(self.surface.canvas(), image_width, image_height);
        let image = &mut self.state.image;
        image.x = Some(placement.x);
        image.y = Some(placement.y);
        image.scale_x = Some(placement.scale);
        image.scale_y = Some(placement.scale);
    }

    pub fn set_background(&mut self, color: &str) -> Result<()> {
        self.state.background_color = validate_color(color)?;
        Ok(())
    }

    // ===== Selection =====

    pub fn select(&mut self, selection: Selection) -> Result<()> {
        if let Selection::Text(id) = &selection {
            if self.state.text_layer(id).is_none() {
                return Err(AppError::NotFound(format!("text layer {}", id)));
            }
        }
        self.selection = selection;
        Ok(())
    }

    fn selected_layer_mut(&mut self) -> Option<&mut TextLayer> {
        let id = self.selection.text_id()?.to_string();
        self.state.text_layer_mut(&id)
    }

    /// Rotation of the selection, in degrees
    pub fn rotation(&self) -> Option<f64> {
        match &self.selection {
            Selection::None => None,
            Selection::Image => Some(self.state.image.rotation),
            Selection::Text(id) => self.state.text_layer(id).map(|l| l.rotation),
        }
    }

    /// Rotate the selection; clamped to -180..180. Returns whether anything changed.
    pub fn set_rotation(&mut self, deg: f64) -> bool {
        if !deg.is_finite() {
            return false;
        }
        let deg = clamp_rotation(deg);
        match self.selection.clone() {
            Selection::None => false,
            Selection::Image => {
                self.state.image.rotation = deg;
                true
            }
            Selection::Text(_) => match self.selected_layer_mut() {
                Some(layer) => {
                    layer.rotation = deg;
                    true
                }
                None => false,
            },
        }
    }

    /// Opacity of the selection as a percentage
    pub fn opacity_pct(&self) -> Option<f64> {
        let opacity = match &self.selection {
            Selection::None => None,
            Selection::Image => Some(self.state.image.opacity),
            Selection::Text(id) => self.state.text_layer(id).map(|l| l.opacity),
        }?;
        Some((opacity * 100.0).round())
    }

    /// Set the selection's opacity from a 0..100 percentage
    pub fn set_opacity_pct(&mut self, pct: f64) -> bool {
        if !pct.is_finite() {
            return false;
        }
        let opacity = pct.clamp(0.0, 100.0) / 100.0;
        match self.selection.clone() {
            Selection::None => false,
            Selection::Image => {
                self.state.image.opacity = opacity;
                true
            }
            Selection::Text(_) => match self.selected_layer_mut() {
                Some(layer) => {
                    layer.opacity = opacity;
                    true
                }
                None => false,
            },
        }
    }

    /// No-op unless a text layer is selected
    pub fn set_text_color(&mut self, color: &str) -> Result<bool> {
        let color = validate_color(color)?;
        Ok(match self.selected_layer_mut() {
            Some(layer) => {
                layer.color = color;
                true
            }
            None => false,
        })
    }

    /// No-op unless a text layer is selected
    pub fn set_font_family(&mut self, family: &str) -> bool {
        let family = family.trim();
        if family.is_empty() {
            return false;
        }
        match self.selected_layer_mut() {
            Some(layer) => {
                layer.font_family = family.to_string();
                true
            }
            None => false,
        }
    }

    /// No-op unless a text layer is selected
    pub fn set_font_size(&mut self, size: f64) -> bool {
        if !size.is_finite() || size <= 0.0 {
            return false;
        }
        match self.selected_layer_mut() {
            Some(layer) => {
                layer.font_size = size;
                true
            }
            None => false,
        }
    }

    /// Toggle inline formatting over a character range of the selected layer
    pub fn toggle_format(&mut self, format: Format, range: Range<usize>) -> bool {
        match self.selected_layer_mut() {
            Some(layer) => {
                let html = markup::toggle(&layer.markup(), range, format);
                layer.text = markup::plain_text(&html);
                layer.html = Some(html);
                true
            }
            None => false,
        }
    }

    /// Formatting over a range of the selected layer
    pub fn format_state(&self, range: Range<usize>) -> Option<Style> {
        let layer = self.state.text_layer(self.selection.text_id()?)?;
        Some(markup::format_state(&layer.markup(), range))
    }

    // ===== Dragging =====

    /// Start dragging a layer; selects it
    pub fn begin_drag(&mut self, target: Selection) -> Result<()> {
        if target.is_none() {
            return Err(AppError::Validation("Nothing to drag".to_string()));
        }
        self.select(target.clone())?;
        self.dragging = Some(target);
        Ok(())
    }

    /// Move the dragged layer.
    ///
    /// For text layers `(x, y)` is the layer anchor; for the image it is the
    /// image center. Either snaps onto the canvas centerlines.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Guides {
        let canvas = self.surface.canvas();
        let (x, y, guides) = snap_to_center(x, y, canvas.width, canvas.height, SNAP_THRESHOLD_PX);

        match self.dragging.clone() {
            None | Some(Selection::None) => return Guides::default(),
            Some(Selection::Image) => {
                let Some((iw, ih)) = self.surface.image_size() else {
                    return Guides::default();
                };
                let fit = fit_placement(canvas, iw, ih);
                let image = &mut self.state.image;
                let w = iw * image.scale_x.unwrap_or(fit.scale);
                let h = ih * image.scale_y.unwrap_or(fit.scale);
                let (dx, dy) = center_offset(w, h, image.rotation);
                image.x = Some(x - dx);
                image.y = Some(y - dy);
            }
            Some(Selection::Text(id)) => {
                let Some(layer) = self.state.text_layer_mut(&id) else {
                    return Guides::default();
                };
                layer.x = x;
                layer.y = y;
            }
        }

        self.guides = guides;
        guides
    }

    /// Finish the drag; guides disappear
    pub fn end_drag(&mut self) {
        self.dragging = None;
        self.guides = Guides::default();
    }

    // ===== Export =====

    /// Rasterize the canvas without selection handles.
    ///
    /// Overlay and background visibility are restored before returning,
    /// whether or not rasterization succeeded.
    pub async fn capture_snapshot(&mut self, opts: SnapshotOptions) -> Result<Vec<u8>> {
        let overlay = self.surface.overlay_visible();
        let background = self.surface.background_visible();

        self.surface.set_overlay_visible(false);
        if opts.transparent {
            self.surface.set_background_visible(false);
        }
        self.surface.next_frame().await;

        let frame = Frame {
            state: &self.state,
            selection: &self.selection,
            guides: self.guides,
        };
        let result = self.surface.rasterize(&frame, opts.pixel_ratio);

        self.surface.set_overlay_visible(overlay);
        self.surface.set_background_visible(background);

        result
    }

    /// PNG download at the download pixel ratio, with its file name
    pub async fn download(&mut self) -> Result<(String, Vec<u8>)> {
        let png = self.capture_snapshot(SnapshotOptions::default()).await?;
        Ok((download_file_name(self.brand.as_deref(), &self.logo_id), png))
    }

    /// Snapshot the canvas as the logo's preview and persist the document
    pub async fn save(&mut self, backend: &dyn EditorBackend) -> Result<SaveReceipt> {
        if self.surface.image_size().is_none() && self.state.text_layers.is_empty() {
            return Err(AppError::Generic("Nothing to save".to_string()));
        }

        let png = self.capture_snapshot(SnapshotOptions::preview()).await?;
        let receipt = backend
            .save_logo(SaveRequest {
                logo_id: self.logo_id.clone(),
                preview_data_url: encode_png_data_url(&png),
                editor_state: Some(self.state.to_value()?),
            })
            .await?;

        self.baseline = self.serialized();
        tracing::info!("Saved editor state for logo {}", self.logo_id);
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::surface::CanvasSize;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Surface double recording what was visible at rasterization time
    struct RecordingSurface {
        canvas: CanvasSize,
        image: Option<(f64, f64)>,
        overlay: bool,
        background: bool,
        frames_waited: usize,
        rasterized_with: Vec<(bool, bool, f32)>,
        fail: bool,
    }

    impl RecordingSurface {
        fn new() -> Self {
            Self {
                canvas: CanvasSize::square(600.0),
                image: Some((1024.0, 1024.0)),
                overlay: true,
                background: true,
                frames_waited: 0,
                rasterized_with: Vec::new(),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Surface for RecordingSurface {
        fn canvas(&self) -> CanvasSize {
            self.canvas
        }
        fn image_size(&self) -> Option<(f64, f64)> {
            self.image
        }
        fn overlay_visible(&self) -> bool {
            self.overlay
        }
        fn set_overlay_visible(&mut self, visible: bool) {
            self.overlay = visible;
        }
        fn background_visible(&self) -> bool {
            self.background
        }
        fn set_background_visible(&mut self, visible: bool) {
            self.background = visible;
        }
        async fn next_frame(&mut self) {
            self.frames_waited += 1;
        }
        fn rasterize(&mut self, _frame: &Frame<'_>, pixel_ratio: f32) -> Result<Vec<u8>> {
            self.rasterized_with
                .push((self.overlay, self.background, pixel_ratio));
            if self.fail {
                return Err(AppError::Render("boom".to_string()));
            }
            Ok(b"\x89PNG".to_vec())
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        requests: Mutex<Vec<SaveRequest>>,
    }

    #[async_trait]
    impl EditorBackend for RecordingBackend {
        async fn save_logo(&self, request: SaveRequest) -> Result<SaveReceipt> {
            self.requests.lock().unwrap().push(request);
            Ok(SaveReceipt {
                preview_url: "http://cdn.test/p.png?v=1".to_string(),
                updated_at: Utc::now(),
            })
        }
    }

    fn session() -> EditorSession<RecordingSurface> {
        EditorSession::open("logo-1", Some("Acme".to_string()), None, RecordingSurface::new())
    }

    #[test]
    fn test_open_fits_unplaced_image() {
        let s = session();
        let image = &s.state().image;
        assert_eq!(image.scale_x, Some(480.0 / 1024.0));
        assert_eq!(image.x, Some(60.0));
        assert_eq!(image.y, Some(60.0));
        assert_eq!(s.selection(), &Selection::Image);
        assert!(!s.is_dirty());
    }

    #[test]
    fn test_open_keeps_stored_placement() {
        let mut stored = EditorState::default();
        stored.image.x = Some(5.0);
        stored.image.y = Some(6.0);
        let s = EditorSession::open("logo-1", None, Some(stored), RecordingSurface::new());
        assert_eq!(s.state().image.x, Some(5.0));
        assert_eq!(s.state().image.scale_x, None);
    }

    #[test]
    fn test_text_layers_keep_insertion_order() {
        let mut s = session();
        let a = s.add_text_layer();
        let b = s.add_text_layer();

        let ids: Vec<&str> = s.state().text_layers.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str()]);
        assert_eq!(s.selection(), &Selection::Text(b.clone()));

        let layer = s.state().text_layer(&a).unwrap();
        assert_eq!(layer.text, "Text Box");
        assert_eq!((layer.x, layer.y), (300.0, 300.0));
        assert!(s.is_dirty());
    }

    #[test]
    fn test_update_text_layer() {
        let mut s = session();
        let id = s.add_text_layer();

        s.update_text_layer(
            &id,
            TextPatch {
                text: Some("Fish & Chips".to_string()),
                color: Some("#ff0000".to_string()),
                font_size: Some(48.0),
                ..Default::default()
            },
        )
        .unwrap();
        let layer = s.state().text_layer(&id).unwrap();
        assert_eq!(layer.html.as_deref(), Some("Fish &amp; Chips"));
        assert_eq!(layer.color, "#ff0000");
        assert_eq!(layer.font_size, 48.0);

        assert!(matches!(
            s.update_text_layer("missing", TextPatch::default()),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            s.update_text_layer(
                &id,
                TextPatch {
                    color: Some("red".to_string()),
                    ..Default::default()
                }
            ),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_controls_follow_selection() {
        let mut s = session();

        assert!(s.set_rotation(400.0));
        assert_eq!(s.state().image.rotation, 180.0);
        assert!(s.set_opacity_pct(50.0));
        assert_eq!(s.state().image.opacity, 0.5);
        // Font and color controls ignore the image
        assert!(!s.set_font_family("Georgia"));
        assert!(!s.set_text_color("#00FF00").unwrap());

        let id = s.add_text_layer();
        assert!(s.set_rotation(-45.0));
        assert!(s.set_opacity_pct(150.0));
        assert!(s.set_font_family("Georgia"));
        assert!(s.set_text_color("#00FF00").unwrap());

        let layer = s.state().text_layer(&id).unwrap();
        assert_eq!(layer.rotation, -45.0);
        assert_eq!(layer.opacity, 1.0);
        assert_eq!(layer.font_family, "Georgia");
        assert_eq!(layer.color, "#00FF00");
        assert_eq!(s.state().image.rotation, 180.0);
        assert_eq!(s.opacity_pct(), Some(100.0));

        s.select(Selection::None).unwrap();
        assert!(!s.set_rotation(10.0));
        assert_eq!(s.rotation(), None);
        assert!(s.select(Selection::Text("ghost".to_string())).is_err());
    }

    #[test]
    fn test_formatting_on_selected_layer() {
        let mut s = session();
        assert!(!s.toggle_format(Format::Bold, 0..4));

        let id = s.add_text_layer();
        assert!(s.toggle_format(Format::Bold, 0..4));
        assert!(s.format_state(0..4).unwrap().bold);
        assert!(!s.format_state(5..8).unwrap().bold);

        let layer = s.state().text_layer(&id).unwrap();
        assert_eq!(layer.html.as_deref(), Some("<b>Text</b> Box"));
        assert_eq!(layer.text, "Text Box");

        // Survives export and reload
        let reloaded = EditorState::from_value(s.state().to_value().unwrap()).unwrap();
        let html = reloaded.text_layer(&id).unwrap().markup();
        assert!(markup::format_state(&html, 0..4).bold);
    }

    #[test]
    fn test_text_drag_snaps_anchor() {
        let mut s = session();
        let id = s.add_text_layer();

        s.begin_drag(Selection::Text(id.clone())).unwrap();
        let guides = s.drag_to(295.0, 120.0);
        assert!(guides.vertical && !guides.horizontal);
        assert_eq!(s.guides(), guides);

        let layer = s.state().text_layer(&id).unwrap();
        assert_eq!((layer.x, layer.y), (300.0, 120.0));

        s.end_drag();
        assert!(!s.guides().any());
    }

    #[test]
    fn test_image_drag_snaps_center() {
        let mut s = session();
        s.set_rotation(90.0);

        s.begin_drag(Selection::Image).unwrap();
        let guides = s.drag_to(303.0, 297.0);
        assert!(guides.vertical && guides.horizontal);

        // 480x480 box rotated 90 degrees about its top-left corner
        let image = &s.state().image;
        assert!((image.x.unwrap() - 540.0).abs() < 1e-6);
        assert!((image.y.unwrap() - 60.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_snapshot_restores_visibility() {
        for transparent in [false, true] {
            for overlay_before in [true, false] {
                let mut s = session();
                s.surface_mut().overlay = overlay_before;

                s.capture_snapshot(SnapshotOptions {
                    transparent,
                    pixel_ratio: 2.0,
                })
                .await
                .unwrap();

                let surface = s.surface();
                assert_eq!(surface.overlay, overlay_before);
                assert!(surface.background);
                assert_eq!(surface.frames_waited, 1);
                assert_eq!(surface.rasterized_with, vec![(false, !transparent, 2.0)]);
            }
        }
    }

    #[tokio::test]
    async fn test_snapshot_restores_visibility_on_failure() {
        let mut s = session();
        s.surface_mut().fail = true;
        let selection = s.selection().clone();

        let result = s
            .capture_snapshot(SnapshotOptions {
                transparent: true,
                pixel_ratio: 1.0,
            })
            .await;

        assert!(result.is_err());
        assert!(s.surface().overlay);
        assert!(s.surface().background);
        assert_eq!(s.selection(), &selection);
    }

    #[tokio::test]
    async fn test_save_sends_preview_and_state() {
        let mut s = session();
        s.add_text_layer();
        assert!(s.is_dirty());

        let backend = RecordingBackend::default();
        s.save(&backend).await.unwrap();

        assert!(!s.is_dirty());
        let requests = backend.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].logo_id, "logo-1");
        assert!(requests[0].preview_data_url.starts_with("data:image/png;base64,"));
        let sent = EditorState::from_value(requests[0].editor_state.clone().unwrap()).unwrap();
        assert_eq!(&sent, s.state());
        // Previews render at ratio 1
        assert_eq!(s.surface().rasterized_with[0].2, 1.0);
    }

    #[tokio::test]
    async fn test_save_without_content_fails() {
        let mut surface = RecordingSurface::new();
        surface.image = None;
        let mut s = EditorSession::open("logo-1", None, None, surface);

        let backend = RecordingBackend::default();
        assert!(matches!(s.save(&backend).await, Err(AppError::Generic(_))));
        assert!(backend.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_download_name_and_ratio() {
        let mut s = session();
        let (name, _png) = s.download().await.unwrap();
        assert_eq!(name, "Acme-logo-1.png");
        assert_eq!(s.surface().rasterized_with[0].2, 2.0);
    }
}
