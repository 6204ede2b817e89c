//! Draw commands for the 2D canvas
//!
//! Every coordinate is in canvas pixels with any per-balloon translation and
//! scale already applied, so a painter only has to replay the list.

use glam::Vec2;

use crate::sim::BalloonColor;

/// Straight (non-premultiplied) color with an alpha channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Multiply alpha, as canvas `globalAlpha` would
    pub fn fade(self, factor: f32) -> Self {
        Self {
            a: self.a * factor,
            ..self
        }
    }

    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a.clamp(0.0, 1.0))
    }
}

impl From<BalloonColor> for Rgba {
    fn from(c: BalloonColor) -> Self {
        Self::new(c.r, c.g, c.b, 1.0)
    }
}

/// Colors used by the scene
pub mod colors {
    use super::Rgba;

    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 1.0);
    pub const ROPE: Rgba = Rgba::new(0x66, 0x66, 0x66, 1.0);
    pub const FLASH: Rgba = Rgba::new(255, 255, 200, 0.4);
    pub const GOLD: Rgba = Rgba::new(0xFF, 0xD7, 0x00, 1.0);
    pub const WARNING: Rgba = Rgba::new(0xFF, 0x6B, 0x6B, 1.0);
    pub const PANEL_FILL: Rgba = Rgba::new(0, 0, 0, 0.5);
    pub const PANEL_BORDER: Rgba = Rgba::new(255, 255, 255, 0.3);
}

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        }
    }
}

/// One canvas operation
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Wipe the whole canvas
    Clear,
    /// Current camera image stretched over the canvas, flipped horizontally
    CameraFrame,
    FillCircle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    StrokeCircle {
        center: Vec2,
        radius: f32,
        line_width: f32,
        color: Rgba,
    },
    /// Circle filled with a radial gradient from its centre to its rim
    GradientCircle {
        center: Vec2,
        radius: f32,
        stops: Vec<(f32, Rgba)>,
    },
    /// Ellipse filled with a radial gradient centred on `focus`
    GradientEllipse {
        center: Vec2,
        radii: Vec2,
        focus: Vec2,
        focus_radius: f32,
        stops: Vec<(f32, Rgba)>,
    },
    Polyline {
        points: Vec<Vec2>,
        line_width: f32,
        color: Rgba,
    },
    RoundRect {
        origin: Vec2,
        size: Vec2,
        corner: f32,
        fill: Rgba,
        stroke: Rgba,
        line_width: f32,
    },
    /// Text anchored at its top edge
    Text {
        text: String,
        pos: Vec2,
        font: &'static str,
        align: TextAlign,
        color: Rgba,
    },
}

/// Text width measurement, provided by whatever owns the font renderer
pub trait TextMeasure {
    fn text_width(&self, text: &str, font: &str) -> f32;
}

/// Fixed-advance estimate for when no canvas is around (tests, headless)
#[derive(Debug, Clone, Copy, Default)]
pub struct ApproxMeasure;

impl TextMeasure for ApproxMeasure {
    fn text_width(&self, text: &str, font: &str) -> f32 {
        let px = font
            .split_whitespace()
            .find_map(|part| part.strip_suffix("px")?.parse::<f32>().ok())
            .unwrap_or(16.0);
        text.chars().count() as f32 * px * 0.6
    }
}
