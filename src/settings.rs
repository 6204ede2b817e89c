//! Game settings
//!
//! Everything here is externally settable (sliders in the page) and read by the
//! simulation each time it is needed. Only the spawn interval and the session
//! duration are captured when a session starts.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::BALLOON_LIFETIME_MS;

/// Balloon speed tier (1 = very slow ... 5 = very fast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SpeedTier(u8);

impl SpeedTier {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Build a tier, clamping out-of-range values
    pub fn new(tier: u8) -> Self {
        Self(tier.clamp(Self::MIN, Self::MAX))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Milliseconds between spawn attempts (faster tier spawns more often)
    pub fn spawn_interval_ms(&self) -> f64 {
        1500.0 - f64::from(self.0) * 200.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            1 => "Very slow",
            2 => "Slow",
            3 => "Medium",
            4 => "Fast",
            _ => "Very fast",
        }
    }
}

impl Default for SpeedTier {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for SpeedTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("speed tier {} out of range 1..=5", value))
        }
    }
}

impl From<SpeedTier> for u8 {
    fn from(tier: SpeedTier) -> Self {
        tier.0
    }
}

/// Which camera the browser should open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => "environment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown camera facing mode: {0:?}")]
pub struct UnknownFacingMode(pub String);

impl FromStr for FacingMode {
    type Err = UnknownFacingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "front" => Ok(FacingMode::User),
            "environment" | "back" | "rear" => Ok(FacingMode::Environment),
            _ => Err(UnknownFacingMode(s.to_string())),
        }
    }
}

/// Sound level driven by the volume slider and the mute button
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    level: f32,
    muted: bool,
}

impl Default for Volume {
    fn default() -> Self {
        Self {
            level: 0.7,
            muted: false,
        }
    }
}

impl Volume {
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Set master level (0.0 - 1.0)
    pub fn set_level(&mut self, level: f32) {
        self.level = if level.is_finite() { level.clamp(0.0, 1.0) } else { 0.0 };
    }

    /// Slider position in percent
    pub fn set_percent(&mut self, percent: u32) {
        self.set_level(percent.min(100) as f32 / 100.0);
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Flip mute and return the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Gain actually applied to sounds
    pub fn effective(&self) -> f32 {
        if self.muted { 0.0 } else { self.level }
    }
}

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Session ===
    /// Session length in seconds
    pub session_duration_secs: u32,
    /// Spawn cadence tier
    pub balloon_speed: SpeedTier,
    /// Cap on live balloons
    pub max_balloons: usize,
    /// Lifetime before a balloon pops by itself (<= 0 disables expiry)
    pub balloon_lifetime_ms: f64,

    // === Motion detection ===
    /// Per-pixel |dR|+|dG|+|dB| above which a pixel counts as moving
    pub motion_threshold: u32,
    /// Minimum time between two frame comparisons
    pub detection_interval_ms: f64,
    /// A balloon pops when strictly more motion points than this land inside it
    pub vote_threshold: u32,

    // === Camera ===
    pub facing_mode: FacingMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_duration_secs: 60,
            balloon_speed: SpeedTier::default(),
            max_balloons: 8,
            balloon_lifetime_ms: BALLOON_LIFETIME_MS,

            motion_threshold: 45,
            detection_interval_ms: 150.0,
            vote_threshold: 8,

            facing_mode: FacingMode::User,
        }
    }
}

impl Settings {
    pub const MIN_DURATION_SECS: u32 = 10;
    pub const MAX_DURATION_SECS: u32 = 300;
    pub const MAX_BALLOONS_LIMIT: usize = 20;

    /// Parse settings pushed from the page; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn set_session_duration(&mut self, secs: u32) {
        self.session_duration_secs = secs.clamp(Self::MIN_DURATION_SECS, Self::MAX_DURATION_SECS);
    }

    pub fn set_balloon_speed(&mut self, tier: u8) {
        self.balloon_speed = SpeedTier::new(tier);
    }

    pub fn set_max_balloons(&mut self, count: usize) {
        self.max_balloons = count.clamp(1, Self::MAX_BALLOONS_LIMIT);
    }

    /// Pull every field back into its valid range
    pub fn sanitize(&mut self) {
        self.set_session_duration(self.session_duration_secs);
        self.set_max_balloons(self.max_balloons);
        if !self.detection_interval_ms.is_finite() || self.detection_interval_ms < 0.0 {
            self.detection_interval_ms = Settings::default().detection_interval_ms;
        }
        if !self.balloon_lifetime_ms.is_finite() {
            self.balloon_lifetime_ms = BALLOON_LIFETIME_MS;
        }
    }
}
