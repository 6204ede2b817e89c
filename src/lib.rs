//! Balloon Pop - A camera motion-activated balloon popping game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (frame differencing, hit resolution, balloons, session)
//! - `renderer`: Draw-list construction and the 2D canvas painter
//! - `platform`: Browser/native platform abstraction (clock, camera)
//! - `settings`: Live game configuration
//! - `history`: In-memory record of finished sessions

pub mod history;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use history::{GameHistory, GameRecord};
pub use settings::{Settings, SpeedTier, Volume};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Motion buffer resolution (the camera is downsampled to this before diffing)
    pub const MOTION_WIDTH: u32 = 80;
    pub const MOTION_HEIGHT: u32 = 60;

    /// Balloon geometry
    pub const BALLOON_MIN_RADIUS: f32 = 30.0;
    pub const BALLOON_RADIUS_RANGE: f32 = 20.0;
    /// Spawn keeps balloon centres this far from every canvas edge
    pub const SPAWN_MARGIN: f32 = 50.0;

    /// Translational speed in pixels per tick
    pub const BALLOON_MIN_SPEED: f32 = 0.5;
    pub const BALLOON_SPEED_RANGE: f32 = 0.5;

    /// Sinusoidal wobble
    pub const FLOAT_MIN_SPEED: f32 = 0.5;
    pub const FLOAT_SPEED_RANGE: f32 = 1.0;
    pub const FLOAT_PHASE_STEP: f32 = 0.05;
    pub const FLOAT_DRIFT: f32 = 0.3;

    /// Default lifetime before a balloon pops by itself (ms)
    pub const BALLOON_LIFETIME_MS: f64 = 3000.0;
    /// Time a popped balloon lingers for its decay animation (ms)
    pub const DECAY_WINDOW_MS: f64 = 1000.0;

    /// Scoring
    pub const BASE_POINTS: u64 = 10;
    pub const COMBO_BONUS_MIN: u32 = 3;
    pub const COMBO_BONUS_PER_STEP: u64 = 2;

    /// Combo floating text lifetime (ms)
    pub const COMBO_EFFECT_MS: f64 = 1500.0;

    /// Countdown tick period (ms)
    pub const COUNTDOWN_PERIOD_MS: f64 = 1000.0;

    /// Number of history records shown in the side panel
    pub const HISTORY_DISPLAY: usize = 5;
}

/// Size of the drawing surface in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamp a point so a circle of `radius` stays fully inside
    #[inline]
    pub fn clamp_inside(&self, pos: Vec2, radius: f32) -> Vec2 {
        Vec2::new(
            pos.x.clamp(radius, (self.width - radius).max(radius)),
            pos.y.clamp(radius, (self.height - radius).max(radius)),
        )
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}
