//! Balloon entities, scoring counters and game events

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::history::GameRecord;
use crate::CanvasSize;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No session (initial, or after reset)
    Idle,
    /// Session running
    Active,
    /// Session suspended; timers stopped, live balloons frozen
    Paused,
    /// Session finished; counters kept until reset or next start
    Ended,
}

impl GamePhase {
    /// Active or paused
    pub fn in_session(&self) -> bool {
        matches!(self, GamePhase::Active | GamePhase::Paused)
    }
}

/// Why a balloon popped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PopCause {
    /// Touched by motion or pointer - scores and extends the combo
    Manual,
    /// Lifetime ran out - counts as a miss
    Expired,
}

/// Live or decaying
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BalloonState {
    /// Moving, hittable, subject to lifetime expiry
    Live,
    /// Popped; kept only for the decay animation
    Decaying {
        popped_at: f64,
        cause: PopCause,
        /// 0-1 over the decay window
        progress: f32,
    },
}

/// Balloon palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalloonColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BalloonColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

pub const PALETTE: [BalloonColor; 10] = [
    BalloonColor::new(0xFF, 0x6B, 0x6B),
    BalloonColor::new(0xFF, 0xD1, 0x66),
    BalloonColor::new(0xFF, 0x9E, 0x6D),
    BalloonColor::new(0xFF, 0x40, 0x81),
    BalloonColor::new(0x7C, 0x4D, 0xFF),
    BalloonColor::new(0xEF, 0x47, 0x6F),
    BalloonColor::new(0xFF, 0xEB, 0x3B),
    BalloonColor::new(0x4C, 0xAF, 0x50),
    BalloonColor::new(0x00, 0xBC, 0xD4),
    BalloonColor::new(0xE9, 0x1E, 0x63),
];

/// A balloon target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balloon {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub color: BalloonColor,
    /// Unit direction of travel
    pub direction: Vec2,
    /// Pixels per tick
    pub speed: f32,
    pub float_phase: f32,
    pub float_speed: f32,
    /// Lifetime in ms; zero or negative never expires
    pub lifetime_ms: f64,
    pub created_at: f64,
    pub state: BalloonState,
}

impl Balloon {
    /// Roll a new balloon somewhere inside `canvas`
    pub fn random<R: Rng>(
        id: u32,
        rng: &mut R,
        canvas: CanvasSize,
        lifetime_ms: f64,
        now: f64,
    ) -> Self {
        let pos = Vec2::new(
            spawn_coord(rng, canvas.width),
            spawn_coord(rng, canvas.height),
        );

        let raw_dir = Vec2::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );

        Self {
            id,
            pos,
            radius: BALLOON_MIN_RADIUS + rng.random::<f32>() * BALLOON_RADIUS_RANGE,
            color: PALETTE[rng.random_range(0..PALETTE.len())],
            direction: unit_direction(raw_dir),
            speed: BALLOON_MIN_SPEED + rng.random::<f32>() * BALLOON_SPEED_RANGE,
            float_phase: rng.random::<f32>() * std::f32::consts::TAU,
            float_speed: FLOAT_MIN_SPEED + rng.random::<f32>() * FLOAT_SPEED_RANGE,
            lifetime_ms,
            created_at: now,
            state: BalloonState::Live,
        }
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        matches!(self.state, BalloonState::Live)
    }

    /// Point containment (inclusive of the rim)
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        self.pos.distance(point) <= self.radius
    }

    /// Lifetime has run out at `now`
    pub fn is_expired(&self, now: f64) -> bool {
        self.lifetime_ms > 0.0 && now - self.created_at > self.lifetime_ms
    }

    /// Enter the decay state. Returns false if already decaying.
    pub fn pop(&mut self, cause: PopCause, now: f64) -> bool {
        if !self.is_live() {
            return false;
        }
        self.state = BalloonState::Decaying {
            popped_at: now,
            cause,
            progress: 0.0,
        };
        true
    }
}

/// Random coordinate inside `[margin, extent - margin)`; centre line when the
/// extent is too small for the margin
fn spawn_coord<R: Rng>(rng: &mut R, extent: f32) -> f32 {
    let span = extent - 2.0 * SPAWN_MARGIN;
    if span > 0.0 {
        SPAWN_MARGIN + rng.random::<f32>() * span
    } else {
        extent / 2.0
    }
}

/// Normalize a direction, substituting +X for a zero-length vector
pub fn unit_direction(v: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(Vec2::X)
}

/// Score and accuracy counters for one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: u64,
    pub hits: u32,
    /// Balloons that expired without being hit
    pub misses: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub total_spawned: u32,
    pub time_remaining: u32,
}

impl Scoreboard {
    pub fn new(time_remaining: u32) -> Self {
        Self {
            time_remaining,
            ..Default::default()
        }
    }

    /// Hits over everything spawned (0 when nothing spawned)
    pub fn accuracy(&self) -> f64 {
        if self.total_spawned == 0 {
            0.0
        } else {
            f64::from(self.hits) / f64::from(self.total_spawned)
        }
    }

    /// Accuracy as a rounded whole percent
    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy() * 100.0).round() as u32
    }

    /// Register a manual hit, returning the points awarded
    pub fn record_hit(&mut self) -> u64 {
        self.hits += 1;
        self.combo += 1;

        let mut points = BASE_POINTS;
        if self.combo >= COMBO_BONUS_MIN {
            points += u64::from(self.combo) * COMBO_BONUS_PER_STEP;
        }
        self.score += points;
        self.max_combo = self.max_combo.max(self.combo);
        points
    }

    /// Register an expiry
    pub fn record_miss(&mut self) {
        self.combo = 0;
        self.misses += 1;
    }

    pub fn to_record(&self, timestamp: f64) -> GameRecord {
        GameRecord {
            score: self.score,
            hits: self.hits,
            misses: self.misses,
            accuracy: self.accuracy_percent(),
            max_combo: self.max_combo,
            timestamp,
        }
    }
}

/// Unlockable achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Achievement {
    /// First balloon popped
    FirstHit,
    /// Five pops in a row
    ComboFive,
    /// Ten or more hits with no misses
    PerfectGame,
}

impl Achievement {
    pub const ALL: [Achievement; 3] = [
        Achievement::FirstHit,
        Achievement::ComboFive,
        Achievement::PerfectGame,
    ];

    /// DOM id of the badge
    pub fn element_id(&self) -> &'static str {
        match self {
            Achievement::FirstHit => "first-hit",
            Achievement::ComboFive => "combo-5",
            Achievement::PerfectGame => "perfect-game",
        }
    }

    /// Whether the counters satisfy this achievement right now
    pub fn is_met(&self, board: &Scoreboard) -> bool {
        match self {
            Achievement::FirstHit => board.hits == 1,
            Achievement::ComboFive => board.combo == 5,
            Achievement::PerfectGame => {
                let attempts = board.hits + board.misses;
                let rate = if attempts > 0 {
                    (f64::from(board.hits) / f64::from(attempts) * 100.0).round() as u32
                } else {
                    0
                };
                board.hits >= 10 && rate == 100
            }
        }
    }
}

/// Floating "N Combo!" text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboEffect {
    pub pos: Vec2,
    pub combo: u32,
    pub bonus: u64,
    pub started_at: f64,
}

impl ComboEffect {
    pub fn label(&self) -> String {
        format!("{} Combo! +{}", self.combo, self.bonus)
    }

    /// 0-1 over the effect lifetime
    pub fn progress(&self, now: f64) -> f32 {
        ((now - self.started_at) / COMBO_EFFECT_MS).clamp(0.0, 1.0) as f32
    }
}

/// Things that happened during a tick, for the shell to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SessionStarted,
    SessionPaused,
    SessionResumed,
    SessionEnded(GameRecord),
    SessionReset,
    /// Countdown ticked; seconds left
    TimeTick(u32),
    BalloonSpawned { id: u32 },
    /// Manual pop with the points it earned
    BalloonPopped { id: u32, points: u64, combo: u32 },
    /// Lifetime ran out
    BalloonExpired { id: u32 },
    /// Decay finished and the balloon left the field
    BalloonRemoved { id: u32, cause: PopCause },
    ComboEffect(ComboEffect),
    AchievementUnlocked(Achievement),
}

/// Audio the shell should play for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Pop,
    /// Pop while a combo bonus is active
    ComboPop,
    SessionEnd,
}

impl GameEvent {
    /// Expired balloons are silent
    pub fn sound_cue(&self) -> Option<SoundCue> {
        match self {
            GameEvent::BalloonPopped { combo, .. } if *combo >= COMBO_BONUS_MIN => {
                Some(SoundCue::ComboPop)
            }
            GameEvent::BalloonPopped { .. } => Some(SoundCue::Pop),
            GameEvent::SessionEnded(_) => Some(SoundCue::SessionEnd),
            _ => None,
        }
    }
}
