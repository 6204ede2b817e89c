//! Balloon simulator
//!
//! Owns the balloon collection. Balloons are kept in spawn order, so the last
//! element is the visually topmost one.

use rand::Rng;

use super::state::{Balloon, BalloonState, PopCause};
use crate::consts::{DECAY_WINDOW_MS, FLOAT_DRIFT, FLOAT_PHASE_STEP};
use crate::CanvasSize;

/// What a single `advance` did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceReport {
    /// Balloons whose lifetime ran out this tick
    pub expired: Vec<u32>,
    /// Balloons whose decay finished and left the field
    pub removed: Vec<(u32, PopCause)>,
}

/// The active balloon collection
#[derive(Debug, Clone)]
pub struct BalloonField {
    balloons: Vec<Balloon>,
    next_id: u32,
}

impl Default for BalloonField {
    fn default() -> Self {
        Self::new()
    }
}

impl BalloonField {
    pub fn new() -> Self {
        Self {
            balloons: Vec::new(),
            next_id: 1,
        }
    }

    pub fn balloons(&self) -> &[Balloon] {
        &self.balloons
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Balloon> {
        self.balloons.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.balloons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balloons.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.balloons.iter().filter(|b| b.is_live()).count()
    }

    pub fn clear(&mut self) {
        self.balloons.clear();
    }

    /// Spawn a balloon unless `max_live` live balloons already exist
    pub fn try_spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        canvas: CanvasSize,
        max_live: usize,
        lifetime_ms: f64,
        now: f64,
    ) -> Option<u32> {
        if self.live_count() >= max_live {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        let balloon = Balloon::random(id, rng, canvas, lifetime_ms, now);
        log::debug!(
            "Spawned balloon {} at ({:.0}, {:.0}) r={:.1}",
            id,
            balloon.pos.x,
            balloon.pos.y,
            balloon.radius
        );
        self.balloons.push(balloon);
        Some(id)
    }

    /// Push every live balloon's creation time forward, so time spent paused
    /// does not count against its lifetime
    pub fn shift_lifetimes(&mut self, delta_ms: f64) {
        for balloon in self.balloons.iter_mut().filter(|b| b.is_live()) {
            balloon.created_at += delta_ms;
        }
    }

    /// Advance one frame.
    ///
    /// Decay always progresses. Live balloons only expire and move when
    /// `move_live` is set (session active and not paused).
    pub fn advance(&mut self, now: f64, canvas: CanvasSize, move_live: bool) -> AdvanceReport {
        let mut report = AdvanceReport::default();

        for balloon in &mut self.balloons {
            match balloon.state {
                BalloonState::Decaying {
                    popped_at,
                    cause,
                    ref mut progress,
                } => {
                    *progress = ((now - popped_at) / DECAY_WINDOW_MS).clamp(0.0, 1.0) as f32;
                    if now - popped_at > DECAY_WINDOW_MS {
                        report.removed.push((balloon.id, cause));
                    }
                }
                BalloonState::Live if move_live => {
                    if balloon.is_expired(now) {
                        balloon.pop(PopCause::Expired, now);
                        report.expired.push(balloon.id);
                    } else {
                        step_balloon(balloon, canvas);
                    }
                }
                BalloonState::Live => {}
            }
        }

        if !report.removed.is_empty() {
            self.balloons.retain(|b| !report.removed.iter().any(|(id, _)| *id == b.id));
        }

        report
    }
}

/// Move a live balloon one tick: drift, wobble, bounce off the edges
fn step_balloon(balloon: &mut Balloon, canvas: CanvasSize) {
    balloon.pos += balloon.direction * balloon.speed;
    balloon.pos.x += balloon.float_phase.sin() * FLOAT_DRIFT;
    balloon.float_phase += balloon.float_speed * FLOAT_PHASE_STEP;

    let r = balloon.radius;
    if balloon.pos.x < r || balloon.pos.x > canvas.width - r {
        balloon.direction.x = -balloon.direction.x;
    }
    if balloon.pos.y < r || balloon.pos.y > canvas.height - r {
        balloon.direction.y = -balloon.direction.y;
    }
    balloon.pos = canvas.clamp_inside(balloon.pos, r);
}
