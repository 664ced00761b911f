//! Rendering surface
//!
//! The session drives a `Surface` with the current document. `SvgSurface`
//! builds an SVG scene (background, base image, text layers, selection
//! overlay, snap guides) and rasterizes it with resvg.

use super::document::{EditorState, TextLayer};
use super::markup::{self, Run};
use super::selection::Selection;
use super::snap::Guides;
use crate::config::IMAGE_FIT_MARGIN;
use crate::error::{AppError, Result};
use crate::services::logos::encode_png_data_url;
use async_trait::async_trait;
use std::fmt::Write as _;
use std::sync::Arc;

const OVERLAY_COLOR: &str = "#3B82F6";
const GUIDE_COLOR: &str = "#EC4899";
const LINE_HEIGHT: f64 = 1.2;
/// Rough advance of one glyph relative to the font size
const GLYPH_WIDTH: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn square(size: f64) -> Self {
        Self {
            width: size,
            height: size,
        }
    }
}

/// Initial placement of an image: uniformly scaled into the fit margin and centered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

pub fn fit_placement(canvas: CanvasSize, image_width: f64, image_height: f64) -> Placement {
    let iw = image_width.max(1.0);
    let ih = image_height.max(1.0);
    let scale = ((canvas.width * IMAGE_FIT_MARGIN) / iw).min((canvas.height * IMAGE_FIT_MARGIN) / ih);
    Placement {
        x: (canvas.width - iw * scale) / 2.0,
        y: (canvas.height - ih * scale) / 2.0,
        scale,
    }
}

/// Everything needed to draw one frame
pub struct Frame<'a> {
    pub state: &'a EditorState,
    pub selection: &'a Selection,
    pub guides: Guides,
}

/// Something the editor can draw on and export from
#[async_trait]
pub trait Surface: Send {
    fn canvas(&self) -> CanvasSize;

    /// Natural size of the base image, if one is loaded
    fn image_size(&self) -> Option<(f64, f64)>;

    fn overlay_visible(&self) -> bool;
    fn set_overlay_visible(&mut self, visible: bool);

    fn background_visible(&self) -> bool;
    fn set_background_visible(&mut self, visible: bool);

    /// Resolve once pending transforms have been flushed
    async fn next_frame(&mut self);

    /// Encode the frame as PNG at `pixel_ratio` device pixels per canvas pixel
    fn rasterize(&mut self, frame: &Frame<'_>, pixel_ratio: f32) -> Result<Vec<u8>>;
}

struct BaseImage {
    data_url: String,
    width: f64,
    height: f64,
}

/// SVG scene rasterized with resvg
pub struct SvgSurface {
    canvas: CanvasSize,
    base: Option<BaseImage>,
    overlay_visible: bool,
    background_visible: bool,
    fontdb: Arc<usvg::fontdb::Database>,
}

impl SvgSurface {
    pub fn new(canvas: CanvasSize) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        Self {
            canvas,
            base: None,
            overlay_visible: true,
            background_visible: true,
            fontdb: Arc::new(db),
        }
    }

    /// Load the base image from PNG bytes
    pub fn with_base_image(mut self, png: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
            .map_err(|e| AppError::Render(format!("decode base image: {}", e)))?;

        self.base = Some(BaseImage {
            data_url: encode_png_data_url(png),
            width: f64::from(decoded.width()),
            height: f64::from(decoded.height()),
        });
        Ok(self)
    }

    /// SVG markup for a frame under the current visibility flags
    pub fn scene(&self, frame: &Frame<'_>) -> String {
        let CanvasSize { width, height } = self.canvas;
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );

        if self.background_visible {
            let _ = write!(
                svg,
                r#"<rect id="background" x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
                attr(&frame.state.background_color)
            );
        }

        let image_box = self.image_box(frame.state);
        if let (Some(base), Some(bx)) = (&self.base, &image_box) {
            let _ = write!(
                svg,
                r#"<g id="image" transform="{}" opacity="{}"><image width="{}" height="{}" xlink:href="{}"/></g>"#,
                bx.transform(),
                frame.state.image.opacity,
                base.width,
                base.height,
                base.data_url
            );
        }

        for layer in &frame.state.text_layers {
            svg.push_str(&text_element(layer));
        }

        if self.overlay_visible {
            let selected = match frame.selection {
                Selection::None => None,
                Selection::Image => image_box,
                Selection::Text(id) => frame.state.text_layer(id).map(text_box),
            };
            if let Some(bx) = selected {
                let _ = write!(
                    svg,
                    r#"<g id="selection" transform="{}"><rect x="0" y="0" width="{}" height="{}" fill="none" stroke="{OVERLAY_COLOR}" stroke-width="1" stroke-dasharray="4 4" vector-effect="non-scaling-stroke"/></g>"#,
                    bx.transform(),
                    bx.width,
                    bx.height
                );
            }
            if frame.guides.vertical {
                let x = width / 2.0;
                let _ = write!(
                    svg,
                    r#"<line class="guide" x1="{x}" y1="0" x2="{x}" y2="{height}" stroke="{GUIDE_COLOR}" stroke-width="1"/>"#
                );
            }
            if frame.guides.horizontal {
                let y = height / 2.0;
                let _ = write!(
                    svg,
                    r#"<line class="guide" x1="0" y1="{y}" x2="{width}" y2="{y}" stroke="{GUIDE_COLOR}" stroke-width="1"/>"#
                );
            }
        }

        svg.push_str("</svg>");
        svg
    }

    fn image_box(&self, state: &EditorState) -> Option<LayerBox> {
        let base = self.base.as_ref()?;
        let fit = fit_placement(self.canvas, base.width, base.height);
        let image = &state.image;
        Some(LayerBox {
            x: image.x.unwrap_or(fit.x),
            y: image.y.unwrap_or(fit.y),
            rotation: image.rotation,
            scale_x: image.scale_x.unwrap_or(fit.scale),
            scale_y: image.scale_y.unwrap_or(fit.scale),
            width: base.width,
            height: base.height,
        })
    }
}

#[async_trait]
impl Surface for SvgSurface {
    fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    fn image_size(&self) -> Option<(f64, f64)> {
        self.base.as_ref().map(|b| (b.width, b.height))
    }

    fn overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    fn set_overlay_visible(&mut self, visible: bool) {
        self.overlay_visible = visible;
    }

    fn background_visible(&self) -> bool {
        self.background_visible
    }

    fn set_background_visible(&mut self, visible: bool) {
        self.background_visible = visible;
    }

    async fn next_frame(&mut self) {
        tokio::task::yield_now().await;
    }

    fn rasterize(&mut self, frame: &Frame<'_>, pixel_ratio: f32) -> Result<Vec<u8>> {
        if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
            return Err(AppError::Render(format!("invalid pixel ratio {}", pixel_ratio)));
        }

        let svg = self.scene(frame);
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
            .map_err(|e| AppError::Render(format!("parse scene: {}", e)))?;

        let width = ((self.canvas.width as f32) * pixel_ratio).round().max(1.0) as u32;
        let height = ((self.canvas.height as f32) * pixel_ratio).round().max(1.0) as u32;
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| AppError::Render("failed to allocate pixmap".to_string()))?;

        let xform = resvg::tiny_skia::Transform::from_scale(pixel_ratio, pixel_ratio);
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        pixmap
            .encode_png()
            .map_err(|e| AppError::Render(format!("encode png: {}", e)))
    }
}

/// Unrotated size plus the transform placing it on the canvas
#[derive(Debug, Clone, Copy)]
struct LayerBox {
    x: f64,
    y: f64,
    rotation: f64,
    scale_x: f64,
    scale_y: f64,
    width: f64,
    height: f64,
}

impl LayerBox {
    fn transform(&self) -> String {
        format!(
            "translate({} {}) rotate({}) scale({} {})",
            self.x, self.y, self.rotation, self.scale_x, self.scale_y
        )
    }
}

fn text_lines(layer: &TextLayer) -> Vec<Vec<Run>> {
    let mut lines: Vec<Vec<Run>> = vec![Vec::new()];
    for run in markup::parse(&layer.markup()) {
        for (i, piece) in run.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(Vec::new());
            }
            if !piece.is_empty() {
                if let Some(line) = lines.last_mut() {
                    line.push(Run {
                        text: piece.to_string(),
                        style: run.style,
                    });
                }
            }
        }
    }
    lines
}

fn text_box(layer: &TextLayer) -> LayerBox {
    let lines = text_lines(layer);
    let longest = lines
        .iter()
        .map(|line| line.iter().map(|r| r.text.chars().count()).sum::<usize>())
        .max()
        .unwrap_or(0);

    LayerBox {
        x: layer.x,
        y: layer.y,
        rotation: layer.rotation,
        scale_x: layer.scale_x,
        scale_y: layer.scale_y,
        width: (longest.max(1) as f64) * layer.font_size * GLYPH_WIDTH,
        height: (lines.len() as f64) * layer.font_size * LINE_HEIGHT,
    }
}

fn text_element(layer: &TextLayer) -> String {
    let bx = text_box(layer);
    let mut out = String::new();
    let _ = write!(
        out,
        r#"<g class="text-layer" transform="{}" opacity="{}"><text font-family="{}" font-size="{}" fill="{}" xml:space="preserve">"#,
        bx.transform(),
        layer.opacity,
        attr(&layer.font_family),
        layer.font_size,
        attr(&layer.color)
    );

    for (i, line) in text_lines(layer).iter().enumerate() {
        let baseline = layer.font_size * (1.0 + LINE_HEIGHT * i as f64);
        let _ = write!(out, r#"<tspan x="0" y="{}">"#, baseline);
        for run in line {
            out.push_str("<tspan");
            if run.style.bold {
                out.push_str(r#" font-weight="bold""#);
            }
            if run.style.italic {
                out.push_str(r#" font-style="italic""#);
            }
            if run.style.underline {
                out.push_str(r#" text-decoration="underline""#);
            }
            let _ = write!(out, ">{}</tspan>", markup::escape_text(&run.text));
        }
        out.push_str("</tspan>");
    }

    out.push_str("</text></g>");
    out
}

fn attr(value: &str) -> String {
    markup::escape_text(value)
}
