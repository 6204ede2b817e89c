//! Game session state machine
//!
//! Idle -> Active -> (Paused <-> Active) -> Ended -> Idle (reset).
//!
//! `Game` owns everything a session touches: counters, balloons, the motion
//! buffer, timers and history. Transitions that are not valid from the
//! current phase are no-ops.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use super::balloons::BalloonField;
use super::clock::{Scheduler, TimerKind, should_sample_now};
use super::hit;
use super::motion::{FrameDifferencer, MotionFrame};
use super::state::{
    Achievement, Balloon, ComboEffect, GameEvent, GamePhase, PopCause, Scoreboard,
};
use crate::consts::{COMBO_BONUS_MIN, COMBO_BONUS_PER_STEP, COMBO_EFFECT_MS, COUNTDOWN_PERIOD_MS};
use crate::history::{GameHistory, GameRecord};
use crate::settings::Settings;
use crate::CanvasSize;

/// Why a session could not start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("camera access has not been granted")]
    CameraUnavailable,
}

/// A game instance: one player, any number of consecutive sessions
#[derive(Debug, Clone)]
pub struct Game {
    /// Live configuration; read on every use
    pub settings: Settings,
    canvas: CanvasSize,
    phase: GamePhase,
    board: Scoreboard,
    field: BalloonField,
    differencer: FrameDifferencer,
    scheduler: Scheduler,
    rng: Pcg32,
    history: GameHistory,
    effects: Vec<ComboEffect>,
    unlocked: Vec<Achievement>,
    events: Vec<GameEvent>,
    /// Spawn cadence captured at session start
    spawn_interval_ms: f64,
    paused_at: Option<f64>,
    last_sample: Option<f64>,
}

impl Game {
    pub fn new(settings: Settings, canvas: CanvasSize, seed: u64) -> Self {
        let board = Scoreboard::new(settings.session_duration_secs);
        let spawn_interval_ms = settings.balloon_speed.spawn_interval_ms();
        Self {
            settings,
            canvas,
            phase: GamePhase::Idle,
            board,
            field: BalloonField::new(),
            differencer: FrameDifferencer::new(),
            scheduler: Scheduler::new(),
            rng: Pcg32::seed_from_u64(seed),
            history: GameHistory::new(),
            effects: Vec::new(),
            unlocked: Vec::new(),
            events: Vec::new(),
            spawn_interval_ms,
            paused_at: None,
            last_sample: None,
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Active
    }

    pub fn board(&self) -> &Scoreboard {
        &self.board
    }

    pub fn balloons(&self) -> &[Balloon] {
        self.field.balloons()
    }

    pub fn history(&self) -> &GameHistory {
        &self.history
    }

    pub fn effects(&self) -> &[ComboEffect] {
        &self.effects
    }

    pub fn unlocked(&self) -> &[Achievement] {
        &self.unlocked
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        self.canvas = canvas;
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Drain events produced since the last call
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Change the session length. Outside a session the countdown display
    /// follows immediately; a running session keeps its captured duration.
    pub fn set_session_duration(&mut self, secs: u32) {
        self.settings.set_session_duration(secs);
        if !self.phase.in_session() {
            self.board.time_remaining = self.settings.session_duration_secs;
        }
    }

    // === Transitions ===

    /// Start a session from Idle or Ended.
    ///
    /// Returns `Ok(false)` when a session is already running.
    pub fn start(&mut self, camera_ready: bool, now: f64) -> Result<bool, StartError> {
        if self.phase.in_session() {
            return Ok(false);
        }
        if !camera_ready {
            log::warn!("Refusing to start: camera not available");
            return Err(StartError::CameraUnavailable);
        }

        self.scheduler.cancel_all();
        self.field.clear();
        self.effects.clear();
        self.differencer.reset();
        self.last_sample = None;
        self.paused_at = None;

        self.board = Scoreboard::new(self.settings.session_duration_secs);
        self.spawn_interval_ms = self.settings.balloon_speed.spawn_interval_ms();
        self.phase = GamePhase::Active;
        self.start_timers(now);

        log::info!(
            "Session started: {}s, spawn every {}ms, max {} balloons",
            self.board.time_remaining,
            self.spawn_interval_ms,
            self.settings.max_balloons
        );
        self.events.push(GameEvent::SessionStarted);
        Ok(true)
    }

    /// Active -> Paused
    pub fn pause(&mut self, now: f64) -> bool {
        if self.phase != GamePhase::Active {
            return false;
        }
        self.scheduler.cancel_all();
        self.phase = GamePhase::Paused;
        self.paused_at = Some(now);
        log::info!("Session paused ({}s left)", self.board.time_remaining);
        self.events.push(GameEvent::SessionPaused);
        true
    }

    /// Paused -> Active
    pub fn resume(&mut self, now: f64) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        if let Some(paused_at) = self.paused_at.take() {
            self.field.shift_lifetimes((now - paused_at).max(0.0));
        }
        self.phase = GamePhase::Active;
        self.start_timers(now);
        log::info!("Session resumed");
        self.events.push(GameEvent::SessionResumed);
        true
    }

    pub fn toggle_pause(&mut self, now: f64) -> bool {
        match self.phase {
            GamePhase::Active => self.pause(now),
            GamePhase::Paused => self.resume(now),
            _ => false,
        }
    }

    /// Active/Paused -> Ended. Appends and returns the session record.
    pub fn end(&mut self, now: f64) -> Option<GameRecord> {
        if !self.phase.in_session() {
            return None;
        }
        self.scheduler.cancel_all();
        self.phase = GamePhase::Ended;
        self.paused_at = None;

        let record = self.board.to_record(now);
        let game_number = self.history.push(record.clone());
        log::info!(
            "Session {} ended: score {}, hits {}, misses {}, accuracy {}%",
            game_number,
            record.score,
            record.hits,
            record.misses,
            record.accuracy
        );
        self.events.push(GameEvent::SessionEnded(record.clone()));
        Some(record)
    }

    /// Start when idle/ended, end when running
    pub fn toggle(&mut self, camera_ready: bool, now: f64) -> Result<(), StartError> {
        if self.phase.in_session() {
            self.end(now);
        } else {
            self.start(camera_ready, now)?;
        }
        Ok(())
    }

    /// Any -> Idle. Counters zeroed, balloons gone, timers stopped.
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.phase = GamePhase::Idle;
        self.board = Scoreboard::new(self.settings.session_duration_secs);
        self.field.clear();
        self.effects.clear();
        self.differencer.reset();
        self.last_sample = None;
        self.paused_at = None;
        self.events.push(GameEvent::SessionReset);
    }

    fn start_timers(&mut self, now: f64) {
        self.scheduler.start(TimerKind::Countdown, COUNTDOWN_PERIOD_MS, now);
        self.scheduler.start(TimerKind::Spawner, self.spawn_interval_ms, now);
    }

    // === Timers ===

    /// Fire every timer due by `now`, in timestamp order
    pub fn run_timers(&mut self, now: f64) {
        while let Some((kind, at)) = self.scheduler.pop_due(now) {
            match kind {
                TimerKind::Countdown => self.countdown_tick(at),
                TimerKind::Spawner => self.spawn_tick(at),
            }
        }
    }

    fn countdown_tick(&mut self, at: f64) {
        if self.phase != GamePhase::Active {
            return;
        }
        self.board.time_remaining = self.board.time_remaining.saturating_sub(1);
        self.events.push(GameEvent::TimeTick(self.board.time_remaining));
        if self.board.time_remaining == 0 {
            self.end(at);
        }
    }

    fn spawn_tick(&mut self, at: f64) {
        if self.phase != GamePhase::Active {
            return;
        }
        if let Some(id) = self.field.try_spawn(
            &mut self.rng,
            self.canvas,
            self.settings.max_balloons,
            self.settings.balloon_lifetime_ms,
            at,
        ) {
            self.board.total_spawned += 1;
            self.events.push(GameEvent::BalloonSpawned { id });
        }
    }

    // === Hits ===

    /// Pointer/touch at a canvas point; pops at most one balloon. Works in
    /// every phase, so balloons left over after a session can still be hit.
    pub fn pointer_pop(&mut self, point: Vec2, now: f64) -> Option<u32> {
        let index = hit::pointer_target(self.field.balloons(), point)?;
        self.manual_pop(index, now)
    }

    /// Whether the motion detector should run this frame
    pub fn wants_motion_sample(&self, now: f64) -> bool {
        self.is_active()
            && should_sample_now(self.last_sample, now, self.settings.detection_interval_ms)
    }

    /// Diff a camera frame against the previous one and pop every balloon
    /// with enough motion votes. Ignored unless a sample is due.
    pub fn process_motion_frame(&mut self, frame: MotionFrame, now: f64) -> Vec<u32> {
        if !self.wants_motion_sample(now) {
            return Vec::new();
        }
        self.last_sample = Some(now);

        let points = self
            .differencer
            .detect(frame, self.settings.motion_threshold, self.canvas);
        if points.is_empty() {
            return Vec::new();
        }

        let targets = hit::motion_targets(
            self.field.balloons(),
            &points,
            self.settings.vote_threshold,
        );
        if !targets.is_empty() {
            log::debug!(
                "{} motion points popped {} balloon(s)",
                points.len(),
                targets.len()
            );
        }
        targets
            .into_iter()
            .filter_map(|index| self.manual_pop(index, now))
            .collect()
    }

    fn manual_pop(&mut self, index: usize, now: f64) -> Option<u32> {
        let balloon = self.field.get_mut(index)?;
        if !balloon.pop(PopCause::Manual, now) {
            return None;
        }
        let (id, pos) = (balloon.id, balloon.pos);

        let points = self.board.record_hit();
        let combo = self.board.combo;
        self.check_achievements();

        if combo >= COMBO_BONUS_MIN {
            let effect = ComboEffect {
                pos,
                combo,
                bonus: u64::from(combo) * COMBO_BONUS_PER_STEP,
                started_at: now,
            };
            self.effects.push(effect.clone());
            self.events.push(GameEvent::ComboEffect(effect));
        }

        self.events.push(GameEvent::BalloonPopped { id, points, combo });
        Some(id)
    }

    fn check_achievements(&mut self) {
        for achievement in Achievement::ALL {
            if !self.unlocked.contains(&achievement) && achievement.is_met(&self.board) {
                log::info!("Achievement unlocked: {:?}", achievement);
                self.unlocked.push(achievement);
                self.events.push(GameEvent::AchievementUnlocked(achievement));
            }
        }
    }

    // === Simulation ===

    /// Advance balloons one frame and drop finished combo effects
    pub fn advance(&mut self, now: f64) {
        let report = self.field.advance(now, self.canvas, self.is_active());

        for id in report.expired {
            self.board.record_miss();
            self.events.push(GameEvent::BalloonExpired { id });
        }
        for (id, cause) in report.removed {
            self.board.combo = 0;
            self.events.push(GameEvent::BalloonRemoved { id, cause });
        }

        self.effects
            .retain(|e| now - e.started_at < COMBO_EFFECT_MS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::BalloonState;

    fn game() -> Game {
        Game::new(Settings::default(), CanvasSize::new(800.0, 600.0), 42)
    }

    /// Started game with `n` balloons spawned
    fn game_with_balloons(n: usize) -> Game {
        let mut g = game();
        g.settings.max_balloons = n;
        g.start(true, 0.0).unwrap();
        // Tier 3 spawns every 900ms
        g.run_timers(900.0 * n as f64);
        assert_eq!(g.balloons().len(), n);
        g
    }

    fn points_inside(b: &Balloon, n: usize) -> Vec<Vec2> {
        (0..n).map(|i| b.pos + Vec2::new(i as f32 * 0.5, 0.0)).collect()
    }

    fn frame(value: u8) -> MotionFrame {
        MotionFrame::from_rgba(4, 3, vec![value; 4 * 3 * 4]).unwrap()
    }

    #[test]
    fn start_requires_camera() {
        let mut g = game();
        assert_eq!(g.start(false, 0.0), Err(StartError::CameraUnavailable));
        assert_eq!(g.phase(), GamePhase::Idle);
        assert!(g.scheduler().is_idle());

        assert_eq!(g.start(true, 0.0), Ok(true));
        assert_eq!(g.phase(), GamePhase::Active);
        // Double start is a no-op
        assert_eq!(g.start(true, 10.0), Ok(false));
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let mut g = game();
        assert!(!g.pause(0.0));
        assert!(!g.resume(0.0));
        assert!(g.end(0.0).is_none());
        assert!(g.history().is_empty());
    }

    #[test]
    fn countdown_ends_session_and_records_history() {
        let mut g = game();
        g.settings.set_session_duration(10);
        g.start(true, 0.0).unwrap();

        g.run_timers(9_999.0);
        assert_eq!(g.board().time_remaining, 1);
        assert_eq!(g.phase(), GamePhase::Active);

        g.run_timers(10_000.0);
        assert_eq!(g.phase(), GamePhase::Ended);
        assert!(g.scheduler().is_idle());
        assert_eq!(g.history().len(), 1);

        // Nothing fires once ended
        let spawned = g.board().total_spawned;
        g.run_timers(60_000.0);
        assert_eq!(g.board().total_spawned, spawned);
    }

    #[test]
    fn duration_snapshot_survives_mid_session_change() {
        let mut g = game();
        g.start(true, 0.0).unwrap();
        g.set_session_duration(120);
        assert_eq!(g.board().time_remaining, 60);

        g.end(1.0);
        g.set_session_duration(30);
        assert_eq!(g.board().time_remaining, 30);
    }

    #[test]
    fn spawn_interval_is_captured_at_start() {
        let mut g = game();
        g.start(true, 0.0).unwrap();
        g.settings.set_balloon_speed(5);
        g.run_timers(899.0);
        assert_eq!(g.board().total_spawned, 0);
        g.run_timers(900.0);
        assert_eq!(g.board().total_spawned, 1);
    }

    #[test]
    fn max_balloons_applies_immediately() {
        let mut g = game_with_balloons(2);
        g.settings.set_max_balloons(3);
        g.run_timers(2700.0);
        assert_eq!(g.balloons().len(), 3);
        g.run_timers(5000.0);
        assert_eq!(g.balloons().len(), 3);
        assert_eq!(g.board().total_spawned, 3);
    }

    #[test]
    fn pointer_pop_scores() {
        let mut g = game_with_balloons(1);
        let pos = g.balloons()[0].pos;
        assert_eq!(g.pointer_pop(pos, 2000.0), Some(1));
        assert_eq!(g.board().score, 10);
        assert_eq!(g.board().hits, 1);
        assert_eq!(g.board().combo, 1);
        // Already decaying
        assert_eq!(g.pointer_pop(pos, 2001.0), None);

        let events = g.take_events();
        assert!(events.contains(&GameEvent::AchievementUnlocked(Achievement::FirstHit)));
        assert!(events.contains(&GameEvent::BalloonPopped { id: 1, points: 10, combo: 1 }));
    }

    #[test]
    fn pointer_still_pops_after_refused_restart() {
        let mut g = game_with_balloons(1);
        let pos = g.balloons()[0].pos;
        g.end(1000.0);
        assert_eq!(g.start(false, 1100.0), Err(StartError::CameraUnavailable));
        assert_eq!(g.phase(), GamePhase::Ended);
        assert!(g.balloons()[0].is_live());

        assert_eq!(g.pointer_pop(pos, 1200.0), Some(1));
        assert_eq!(g.board().hits, 1);
        assert!(!g.balloons()[0].is_live());
    }

    #[test]
    fn pointer_on_idle_game_hits_nothing() {
        let mut g = game();
        assert_eq!(g.pointer_pop(Vec2::new(400.0, 300.0), 0.0), None);
        assert_eq!(g.board().hits, 0);
    }

    #[test]
    fn nine_motion_points_pop_balloon() {
        let mut g = game_with_balloons(1);
        let target = g.balloons()[0].clone();
        let points = points_inside(&target, 9);
        let targets = hit::motion_targets(g.balloons(), &points, g.settings.vote_threshold);
        assert_eq!(targets, vec![0]);

        let popped = g.manual_pop(0, 1000.0);
        assert_eq!(popped, Some(target.id));
        assert_eq!(g.board().combo, 1);
        assert_eq!(g.board().score, 10);
    }

    #[test]
    fn motion_frames_are_throttled_and_seeded() {
        let mut g = game_with_balloons(1);
        assert!(g.wants_motion_sample(1000.0));
        // First frame only seeds the buffer
        assert!(g.process_motion_frame(frame(0), 1000.0).is_empty());
        assert!(!g.wants_motion_sample(1100.0));
        assert!(g.process_motion_frame(frame(255), 1100.0).is_empty());
        assert!(g.wants_motion_sample(1150.5));
    }

    #[test]
    fn full_frame_motion_pops_every_live_balloon() {
        let mut g = game_with_balloons(3);
        g.process_motion_frame(
            MotionFrame::from_rgba(80, 60, vec![0; 80 * 60 * 4]).unwrap(),
            3000.0,
        );
        let popped = g.process_motion_frame(
            MotionFrame::from_rgba(80, 60, vec![255; 80 * 60 * 4]).unwrap(),
            3200.0,
        );
        assert_eq!(popped.len(), 3);
        assert_eq!(g.board().combo, 3);
        // 10 + 10 + (10 + 6)
        assert_eq!(g.board().score, 36);
        assert_eq!(g.effects().len(), 1);
        assert_eq!(g.effects()[0].label(), "3 Combo! +6");
    }

    #[test]
    fn no_motion_inside_balloons_changes_nothing() {
        let mut g = game_with_balloons(2);
        let before = g.board().clone();
        g.process_motion_frame(frame(0), 2000.0);
        g.process_motion_frame(frame(0), 2200.0);
        assert_eq!(g.board(), &before);
        assert!(g.balloons().iter().all(|b| b.is_live()));
    }

    #[test]
    fn motion_away_from_balloons_pops_nothing() {
        let mut g = game_with_balloons(2);
        g.field.get_mut(0).unwrap().pos = Vec2::new(600.0, 450.0);
        g.field.get_mut(1).unwrap().pos = Vec2::new(450.0, 350.0);
        let before = g.board().clone();

        let dark = MotionFrame::from_rgba(80, 60, vec![0; 80 * 60 * 4]).unwrap();
        // Bright 5x5 patch in the top-left corner, canvas (0..50, 0..50)
        let mut pixels = vec![0u8; 80 * 60 * 4];
        for y in 0..5 {
            for x in 0..5 {
                let i = (y * 80 + x) * 4;
                pixels[i..i + 3].copy_from_slice(&[255, 255, 255]);
            }
        }
        let patch = MotionFrame::from_rgba(80, 60, pixels).unwrap();

        assert!(g.process_motion_frame(dark, 2000.0).is_empty());
        let mut replay = g.differencer.clone();
        let points = replay.detect(patch.clone(), g.settings.motion_threshold, g.canvas());
        assert_eq!(points.len(), 25);

        assert!(g.process_motion_frame(patch, 2200.0).is_empty());
        assert_eq!(g.board(), &before);
        assert!(g.balloons().iter().all(|b| b.is_live()));
        assert!(g.take_events().iter().all(|e| !matches!(e, GameEvent::BalloonPopped { .. })));
    }

    #[test]
    fn expiry_is_a_miss() {
        let mut g = game_with_balloons(1);
        let pos = g.balloons()[0].pos;
        g.pointer_pop(pos, 950.0);
        g.run_timers(1800.0);
        let expiring = g.balloons()[1].id;
        assert_eq!(g.board().combo, 1);

        // Second balloon created at 1800 expires after 4800
        g.advance(1949.0);
        g.take_events();
        g.advance(4801.0);
        assert_eq!(g.board().misses, 1);
        assert_eq!(g.board().combo, 0);
        assert_eq!(g.board().score, 10);
        assert!(g.take_events().contains(&GameEvent::BalloonExpired { id: expiring }));
    }

    #[test]
    fn decay_completion_resets_combo() {
        let mut g = game_with_balloons(2);
        let a = g.balloons()[0].pos;
        g.pointer_pop(a, 2000.0);
        assert_eq!(g.board().combo, 1);
        g.advance(2500.0);
        assert_eq!(g.board().combo, 1);
        g.advance(3000.5);
        assert_eq!(g.board().combo, 0);
        assert_eq!(g.balloons().len(), 1);
        assert_eq!(g.board().hits, 1);
    }

    #[test]
    fn pause_freezes_counters_and_positions() {
        let mut g = game_with_balloons(2);
        g.advance(1800.0);
        let board = g.board().clone();
        let positions: Vec<_> = g.balloons().iter().map(|b| b.pos).collect();

        assert!(g.pause(1800.0));
        assert!(g.scheduler().is_idle());
        for t in 0..100 {
            let now = 1800.0 + t as f64 * 100.0;
            g.run_timers(now);
            g.process_motion_frame(frame(t as u8), now);
            g.advance(now);
        }
        assert_eq!(g.board(), &board);
        let paused_positions: Vec<_> = g.balloons().iter().map(|b| b.pos).collect();
        assert_eq!(paused_positions, positions);

        // Ten seconds paused must not expire the 3s balloons on resume
        assert!(g.resume(11_800.0));
        g.advance(11_801.0);
        assert!(g.balloons().iter().all(|b| b.is_live()));
        assert_eq!(g.board().misses, 0);
    }

    #[test]
    fn decay_continues_while_paused() {
        let mut g = game_with_balloons(1);
        let pos = g.balloons()[0].pos;
        g.pointer_pop(pos, 1000.0);
        g.pause(1000.0);
        g.advance(2000.5);
        assert!(g.balloons().is_empty());
    }

    #[test]
    fn seventy_percent_accuracy_record() {
        let mut g = game();
        g.start(true, 0.0).unwrap();
        g.board.hits = 7;
        g.board.total_spawned = 10;
        let record = g.end(5000.0).unwrap();
        assert_eq!(record.accuracy, 70);
        assert_eq!(g.history().latest(), Some(&record));
    }

    #[test]
    fn restart_clears_session_state() {
        let mut g = game_with_balloons(2);
        let pos = g.balloons()[0].pos;
        g.pointer_pop(pos, 2000.0);
        g.end(2500.0);

        g.start(true, 3000.0).unwrap();
        assert!(g.balloons().is_empty());
        assert_eq!(g.board(), &Scoreboard::new(60));
        // Achievements are per game instance, not per session
        assert_eq!(g.unlocked(), &[Achievement::FirstHit]);
    }

    #[test]
    fn reset_goes_idle_from_anywhere() {
        let mut g = game_with_balloons(2);
        g.pause(2000.0);
        g.reset();
        assert_eq!(g.phase(), GamePhase::Idle);
        assert!(g.balloons().is_empty());
        assert!(g.scheduler().is_idle());
        assert_eq!(g.board().total_spawned, 0);
    }

    #[test]
    fn every_balloon_is_live_or_decaying() {
        let mut g = game_with_balloons(4);
        let pos = g.balloons()[1].pos;
        g.pointer_pop(pos, 3600.0);
        for b in g.balloons() {
            let decaying = matches!(b.state, BalloonState::Decaying { .. });
            assert_ne!(b.is_live(), decaying);
        }
    }
}
