//! Canvas renderer for the zone designer.
//! Renders the draft polygon over an optional camera frame using tiny-skia.
//!
//! Frame order:
//! - device-pixel-ratio scale, then viewport translate, then viewport scale
//! - background frame at world origin, or a flat fill over the canvas rect
//! - polygon path through the points plus the hover preview, filled once it has 3+ points
//! - vertex markers sized in screen pixels regardless of zoom

use std::path::Path;

use anpr_console_core::constants::VERTEX_RADIUS_PX;
use image::{Rgba, RgbaImage};
use tiny_skia::{
    Color, ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

use crate::designer_state::ZoneDesigner;
use crate::model::{Point, ZoneType};

const EDGE_WIDTH: f32 = 2.0;
const VERTEX_OUTLINE_PX: f32 = 1.0;
const FILL_ALPHA: u8 = 0x22;

fn bg_color() -> Color {
    Color::from_rgba8(0xf8, 0xfa, 0xfc, 255)
}
fn vertex_outline_color() -> Color {
    Color::from_rgba8(0x0f, 0x17, 0x2a, 255)
}

/// RGB of the colour used for a zone type.
pub fn zone_rgb(zone_type: ZoneType) -> [u8; 3] {
    match zone_type {
        ZoneType::Entry => [0x16, 0xa3, 0x4a],
        ZoneType::Exit => [0xdc, 0x26, 0x26],
        ZoneType::Control => [0x25, 0x63, 0xeb],
    }
}

/// CSS hex form of [`zone_rgb`], e.g. `#16a34a`.
pub fn zone_hex(zone_type: ZoneType) -> String {
    let [r, g, b] = zone_rgb(zone_type);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

fn zone_color(zone_type: ZoneType, alpha: u8) -> Color {
    let [r, g, b] = zone_rgb(zone_type);
    Color::from_rgba8(r, g, b, alpha)
}

/// Errors raised while loading a background frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to decode background image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Background image has an unusable size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// A decoded camera frame drawn behind the polygon, in premultiplied form.
#[derive(Clone)]
pub struct Background {
    pixmap: Pixmap,
}

impl Background {
    /// Loads a frame from an image file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let img = image::open(path)?;
        Self::from_image(&img.to_rgba8())
    }

    /// Decodes a frame from encoded bytes (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RenderError> {
        let img = image::load_from_memory(bytes)?;
        Self::from_image(&img.to_rgba8())
    }

    pub fn from_image(img: &RgbaImage) -> Result<Self, RenderError> {
        let (width, height) = img.dimensions();
        let mut pixmap =
            Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

impl std::fmt::Debug for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Background")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Draws designer state onto a fixed-size canvas.
#[derive(Debug, Clone)]
pub struct CanvasRenderer {
    width: u32,
    height: u32,
    device_pixel_ratio: f32,
    background: Option<Background>,
}

impl CanvasRenderer {
    /// Creates a renderer for a canvas of `width` x `height` CSS pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
            background: None,
        }
    }

    /// Sets the device pixel ratio. Non-positive or non-finite values fall back to 1.
    pub fn with_device_pixel_ratio(mut self, dpr: f32) -> Self {
        self.device_pixel_ratio = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self
    }

    pub fn set_background(&mut self, background: Option<Background>) {
        self.background = background;
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Size of the backing surface in device pixels.
    pub fn surface_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.device_pixel_ratio).round() as u32,
            (self.height as f32 * self.device_pixel_ratio).round() as u32,
        )
    }

    /// Combined device-pixel-ratio and viewport transform.
    fn frame_transform(&self, designer: &ZoneDesigner) -> Transform {
        let dpr = self.device_pixel_ratio;
        let scale = designer.scale() as f32;
        let t = designer.translation();
        Transform::from_scale(dpr, dpr)
            .pre_translate(t.x as f32, t.y as f32)
            .pre_scale(scale, scale)
    }

    /// Renders one frame. Returns `None` when the surface size is zero.
    pub fn render_pixmap(&self, designer: &ZoneDesigner) -> Option<Pixmap> {
        let (w, h) = self.surface_size();
        let mut pixmap = Pixmap::new(w, h)?;
        let transform = self.frame_transform(designer);

        self.draw_background(&mut pixmap, transform);

        let mut draw_points: Vec<Point> = designer.points().to_vec();
        if let Some(hover) = designer.hover_point() {
            draw_points.push(hover);
        }
        if draw_points.is_empty() {
            return Some(pixmap);
        }

        let zone_type = designer.zone_type();
        draw_outline(&mut pixmap, &draw_points, zone_type, transform);

        let scale = designer.scale() as f32;
        for p in &draw_points {
            draw_vertex(&mut pixmap, p, zone_type, scale, transform);
        }

        Some(pixmap)
    }

    /// Renders one frame into an RGBA image buffer.
    pub fn render(&self, designer: &ZoneDesigner) -> RgbaImage {
        let (w, h) = self.surface_size();
        match self.render_pixmap(designer) {
            Some(pixmap) => pixmap_to_image(&pixmap),
            None => RgbaImage::new(w, h),
        }
    }

    fn draw_background(&self, pixmap: &mut Pixmap, transform: Transform) {
        match &self.background {
            Some(bg) => {
                pixmap.draw_pixmap(
                    0,
                    0,
                    bg.pixmap.as_ref(),
                    &PixmapPaint::default(),
                    transform,
                    None,
                );
            }
            None => {
                let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width as f32, self.height as f32)
                else {
                    return;
                };
                let mut paint = Paint::default();
                paint.set_color(bg_color());
                pixmap.fill_rect(rect, &paint, transform, None);
            }
        }
    }
}

fn draw_outline(pixmap: &mut Pixmap, points: &[Point], zone_type: ZoneType, transform: Transform) {
    let mut pb = PathBuilder::new();
    let (first, rest) = match points.split_first() {
        Some(split) => split,
        None => return,
    };
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    let closed = points.len() > 2;
    if closed {
        pb.close();
    }
    // a lone move_to has no segments to draw
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    if closed {
        paint.set_color(zone_color(zone_type, FILL_ALPHA));
        pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    paint.set_color(zone_color(zone_type, 255));
    let stroke = Stroke {
        width: EDGE_WIDTH,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, transform, None);
}

fn draw_vertex(
    pixmap: &mut Pixmap,
    p: &Point,
    zone_type: ZoneType,
    scale: f32,
    transform: Transform,
) {
    let radius = VERTEX_RADIUS_PX as f32 / scale;
    let Some(circle) = PathBuilder::from_circle(p.x as f32, p.y as f32, radius) else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.set_color(zone_color(zone_type, 255));
    pixmap.fill_path(&circle, &paint, FillRule::Winding, transform, None);

    paint.set_color(vertex_outline_color());
    let stroke = Stroke {
        width: VERTEX_OUTLINE_PX / scale,
        ..Default::default()
    };
    pixmap.stroke_path(&circle, &paint, &stroke, transform, None);
}

/// Converts a premultiplied pixmap into a straight-alpha image.
pub fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    img
}
