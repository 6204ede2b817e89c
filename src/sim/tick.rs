//! Per-frame orchestration
//!
//! One call per display refresh: pointer input, due timers, throttled motion
//! detection, balloon advancement, then the events for the shell.

use glam::Vec2;

use super::motion::MotionFrame;
use super::session::Game;
use super::state::GameEvent;

/// Input gathered since the previous frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Click/touch points in canvas space
    pub taps: Vec<Vec2>,
    /// Downsampled camera frame, present only when the camera was ready and
    /// `Game::wants_motion_sample` asked for one
    pub frame: Option<MotionFrame>,
}

/// Advance the game to `now` (ms) and return what happened
pub fn tick(game: &mut Game, input: TickInput, now: f64) -> Vec<GameEvent> {
    for tap in input.taps {
        game.pointer_pop(tap, now);
    }

    game.run_timers(now);

    // A missing frame means the camera is not warmed up yet: skip this tick
    if let Some(frame) = input.frame {
        game.process_motion_frame(frame, now);
    }

    game.advance(now);
    game.take_events()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanvasSize;
    use crate::settings::Settings;
    use crate::sim::state::{GamePhase, PopCause};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn frame(value: u8) -> MotionFrame {
        MotionFrame::from_rgba(80, 60, vec![value; 80 * 60 * 4]).unwrap()
    }

    #[test]
    fn full_session_runs_to_completion() {
        let mut settings = Settings::default();
        settings.set_session_duration(10);
        let mut game = Game::new(settings, CanvasSize::new(800.0, 600.0), 7);
        game.start(true, 0.0).unwrap();

        let mut events = Vec::new();
        let mut now = 0.0;
        while game.phase() == GamePhase::Active {
            now += FRAME_MS;
            events.extend(tick(&mut game, TickInput::default(), now));
            assert!(now < 11_000.0, "session did not end");
        }

        assert_eq!(game.phase(), GamePhase::Ended);
        let spawned = game.board().total_spawned;
        assert!(spawned > 0);
        // Untouched balloons either expire or are still live when time runs out
        let expired = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BalloonExpired { .. }))
            .count() as u32;
        assert_eq!(game.board().misses, expired);
        assert_eq!(game.board().hits, 0);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, GameEvent::SessionEnded(r) if r.accuracy == 0))
        );
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::BalloonRemoved { cause: PopCause::Expired, .. }
        )));
    }

    #[test]
    fn taps_pop_balloons() {
        let mut game = Game::new(Settings::default(), CanvasSize::new(800.0, 600.0), 3);
        game.start(true, 0.0).unwrap();
        tick(&mut game, TickInput::default(), 950.0);
        let pos = game.balloons()[0].pos;

        let events = tick(
            &mut game,
            TickInput {
                taps: vec![pos],
                frame: None,
            },
            960.0,
        );
        assert!(events.iter().any(|e| matches!(e, GameEvent::BalloonPopped { id: 1, .. })));
        assert_eq!(game.board().hits, 1);
    }

    #[test]
    fn waving_over_the_canvas_pops_everything() {
        let mut settings = Settings::default();
        settings.balloon_lifetime_ms = 0.0;
        let mut game = Game::new(settings, CanvasSize::new(800.0, 600.0), 11);
        game.start(true, 0.0).unwrap();

        // Let four balloons spawn
        let mut now = 0.0;
        while now < 3700.0 {
            now += FRAME_MS;
            tick(&mut game, TickInput::default(), now);
        }
        assert_eq!(game.balloons().len(), 4);

        tick(
            &mut game,
            TickInput {
                taps: Vec::new(),
                frame: Some(frame(0)),
            },
            now,
        );
        now += 200.0;
        let events = tick(
            &mut game,
            TickInput {
                taps: Vec::new(),
                frame: Some(frame(200)),
            },
            now,
        );

        let popped = events
            .iter()
            .filter(|e| matches!(e, GameEvent::BalloonPopped { .. }))
            .count();
        assert_eq!(popped, 4);
        assert_eq!(game.board().max_combo, 4);
    }
}
