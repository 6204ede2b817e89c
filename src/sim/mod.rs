//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay platform-free:
//! - Time is always passed in as milliseconds, never read from a clock
//! - Seeded RNG only
//! - Balloons iterate in spawn order
//! - No rendering or browser dependencies

pub mod balloons;
pub mod clock;
pub mod hit;
pub mod motion;
pub mod session;
pub mod state;
pub mod tick;

pub use balloons::{AdvanceReport, BalloonField};
pub use clock::{Scheduler, TimerKind, should_sample_now};
pub use hit::{motion_targets, motion_votes, pointer_target};
pub use motion::{FrameDifferencer, FrameError, MotionFrame, rgb_delta};
pub use session::{Game, StartError};
pub use state::{
    Achievement, Balloon, BalloonColor, BalloonState, ComboEffect, GameEvent, GamePhase, PALETTE,
    PopCause, Scoreboard, SoundCue,
};
pub use tick::{TickInput, tick};
