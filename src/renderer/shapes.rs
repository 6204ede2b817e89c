//! Scene construction: game state in, draw commands out

use glam::Vec2;

use super::command::{DrawCmd, Rgba, TextAlign, TextMeasure, colors};
use crate::sim::{Balloon, BalloonState, ComboEffect, Game, PopCause, Scoreboard};

/// Vertical bob of a live balloon, in pixels
const FLOAT_BOB: f32 = 5.0;
/// Rope starts just below the balloon body
const ROPE_START: f32 = 1.05;
const ROPE_SEGMENTS: usize = 10;
const ROPE_STEP: f32 = 3.0;
const ROPE_SWAY: f32 = 3.0;
const KNOT_RADIUS: f32 = 3.0;

/// Body opacity from centre to rim
const BODY_STOPS: [(f32, f32); 5] = [(0.0, 0.15), (0.2, 0.25), (0.5, 0.5), (0.8, 0.95), (1.0, 1.0)];

const RING_COUNT: usize = 3;
const DECAY_LINE_WIDTH: f32 = 3.0;

/// Floating combo text rises this far over its lifetime
const COMBO_RISE: f32 = 50.0;
const COMBO_FONT: &str = "bold 28px Arial, sans-serif";

pub const HUD_FONT: &str = "bold 24px Arial, sans-serif";
const HUD_ORIGIN: Vec2 = Vec2::new(10.0, 10.0);
const HUD_PADDING: f32 = 15.0;
const HUD_LINE_HEIGHT: f32 = 30.0;
const HUD_CORNER: f32 = 10.0;
const HUD_BORDER: f32 = 2.0;

/// Build the full frame.
///
/// The camera image goes down first, then balloons in spawn order (newest on
/// top), combo text, and the HUD while a session is running.
pub fn build_scene(
    game: &Game,
    now: f64,
    camera_ready: bool,
    measure: &impl TextMeasure,
) -> Vec<DrawCmd> {
    let mut cmds = vec![DrawCmd::Clear];
    if camera_ready {
        cmds.push(DrawCmd::CameraFrame);
    }

    for balloon in game.balloons() {
        match balloon.state {
            BalloonState::Live => live_balloon(&mut cmds, balloon),
            BalloonState::Decaying { cause, progress, .. } => {
                decaying_balloon(&mut cmds, balloon, cause, progress)
            }
        }
    }

    for effect in game.effects() {
        combo_text(&mut cmds, effect, now);
    }

    if game.phase().in_session() {
        hud(&mut cmds, game.board(), measure);
    }

    cmds
}

fn live_balloon(cmds: &mut Vec<DrawCmd>, b: &Balloon) {
    let color = Rgba::from(b.color);
    let r = b.radius;
    let center = b.pos + Vec2::new(0.0, b.float_phase.sin() * FLOAT_BOB);

    cmds.push(DrawCmd::GradientCircle {
        center,
        radius: r,
        stops: BODY_STOPS
            .iter()
            .map(|&(offset, alpha)| (offset, color.with_alpha(alpha)))
            .collect(),
    });

    // Highlight
    cmds.push(DrawCmd::GradientEllipse {
        center: center + Vec2::new(-0.15, -0.2) * r,
        radii: Vec2::new(0.25, 0.3) * r,
        focus: center + Vec2::splat(-0.3) * r,
        focus_radius: r * 0.5,
        stops: vec![
            (0.0, colors::WHITE.with_alpha(0.5)),
            (1.0, colors::WHITE.with_alpha(0.0)),
        ],
    });

    let knot = center + Vec2::new(0.0, r * ROPE_START);
    let mut rope = Vec::with_capacity(ROPE_SEGMENTS + 1);
    rope.push(knot);
    for i in 1..=ROPE_SEGMENTS {
        let i = i as f32;
        rope.push(knot + Vec2::new((i * 0.5 + b.float_phase).sin() * ROPE_SWAY, i * ROPE_STEP));
    }
    cmds.push(DrawCmd::Polyline {
        points: rope,
        line_width: 2.0,
        color: colors::ROPE,
    });
    cmds.push(DrawCmd::FillCircle {
        center: knot,
        radius: KNOT_RADIUS,
        color: colors::ROPE,
    });
}

fn decaying_balloon(cmds: &mut Vec<DrawCmd>, b: &Balloon, cause: PopCause, progress: f32) {
    let color = Rgba::from(b.color);
    let scale = 1.0 + progress * 0.5;
    let alpha = 1.0 - progress;
    let r = b.radius * scale;
    let c = b.pos;

    match cause {
        PopCause::Expired => {
            cmds.push(DrawCmd::FillCircle {
                center: c,
                radius: r * (1.0 - progress),
                color: color.fade(alpha),
            });
            let cross = colors::WHITE.with_alpha(0.8).fade(alpha);
            let arm = r * 0.5;
            for (from, to) in [
                (Vec2::new(-arm, -arm), Vec2::new(arm, arm)),
                (Vec2::new(arm, -arm), Vec2::new(-arm, arm)),
            ] {
                cmds.push(DrawCmd::Polyline {
                    points: vec![c + from, c + to],
                    line_width: DECAY_LINE_WIDTH * scale,
                    color: cross,
                });
            }
        }
        PopCause::Manual => {
            for i in 0..RING_COUNT {
                let i = i as f32;
                cmds.push(DrawCmd::StrokeCircle {
                    center: c,
                    radius: r * (0.5 + i * 0.3) * (1.0 + progress * 2.0),
                    line_width: DECAY_LINE_WIDTH * scale,
                    color: color.with_alpha(0.7 * alpha * (1.0 - i * 0.3)),
                });
            }
            cmds.push(DrawCmd::FillCircle {
                center: c,
                radius: r * 0.3 * (1.0 - progress * 0.5),
                color: colors::WHITE.with_alpha(0.9).fade(1.0 - progress * 0.5),
            });
            cmds.push(DrawCmd::FillCircle {
                center: c,
                radius: r * 1.5 * progress,
                color: colors::FLASH.fade(0.6 * alpha),
            });
        }
    }
}

fn combo_text(cmds: &mut Vec<DrawCmd>, effect: &ComboEffect, now: f64) {
    let t = effect.progress(now);
    cmds.push(DrawCmd::Text {
        text: effect.label(),
        pos: effect.pos - Vec2::new(0.0, COMBO_RISE * t),
        font: COMBO_FONT,
        align: TextAlign::Center,
        color: colors::GOLD.fade(1.0 - t),
    });
}

/// Score panel in the top-left corner
fn hud(cmds: &mut Vec<DrawCmd>, board: &Scoreboard, measure: &impl TextMeasure) {
    let lines = [
        (format!("Score: {}", board.score), colors::WHITE),
        (format!("Hits: {}", board.hits), colors::WHITE),
        (
            format!("Combo: {}", board.combo),
            if board.combo >= crate::consts::COMBO_BONUS_MIN {
                colors::GOLD
            } else {
                colors::WHITE
            },
        ),
        (
            format!("Time: {}s", board.time_remaining),
            if board.time_remaining <= 10 {
                colors::WARNING
            } else {
                colors::WHITE
            },
        ),
    ];

    let text_width = lines
        .iter()
        .map(|(text, _)| measure.text_width(text, HUD_FONT))
        .fold(0.0, f32::max);
    cmds.push(DrawCmd::RoundRect {
        origin: HUD_ORIGIN,
        size: Vec2::new(
            text_width + HUD_PADDING * 2.0,
            HUD_LINE_HEIGHT * lines.len() as f32 + HUD_PADDING * 2.0,
        ),
        corner: HUD_CORNER,
        fill: colors::PANEL_FILL,
        stroke: colors::PANEL_BORDER,
        line_width: HUD_BORDER,
    });

    let mut pos = HUD_ORIGIN + Vec2::splat(HUD_PADDING);
    for (text, color) in lines {
        cmds.push(DrawCmd::Text {
            text,
            pos,
            font: HUD_FONT,
            align: TextAlign::Left,
            color,
        });
        pos.y += HUD_LINE_HEIGHT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::command::ApproxMeasure;
    use crate::settings::Settings;
    use crate::sim::{GamePhase, PALETTE};
    use crate::CanvasSize;

    fn balloon(state: BalloonState) -> Balloon {
        Balloon {
            id: 1,
            pos: Vec2::new(200.0, 200.0),
            radius: 40.0,
            color: PALETTE[0],
            direction: Vec2::X,
            speed: 1.0,
            float_phase: 0.0,
            float_speed: 1.0,
            lifetime_ms: 3000.0,
            created_at: 0.0,
            state,
        }
    }

    fn texts(cmds: &[DrawCmd]) -> Vec<(&str, Rgba)> {
        cmds.iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, color, .. } => Some((text.as_str(), *color)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn live_balloon_has_body_highlight_rope_and_knot() {
        let mut cmds = Vec::new();
        live_balloon(&mut cmds, &balloon(BalloonState::Live));
        assert_eq!(cmds.len(), 4);
        match &cmds[0] {
            DrawCmd::GradientCircle { center, radius, stops } => {
                assert_eq!(*center, Vec2::new(200.0, 200.0));
                assert_eq!(*radius, 40.0);
                assert_eq!(stops.len(), 5);
                assert_eq!(stops[0].1.a, 0.15);
                assert_eq!(stops[4].1.a, 1.0);
            }
            other => panic!("expected body, got {other:?}"),
        }
        match &cmds[2] {
            DrawCmd::Polyline { points, .. } => {
                assert_eq!(points.len(), 11);
                assert_eq!(points[0], Vec2::new(200.0, 242.0));
                assert!((points[10].y - (242.0 + 30.0)).abs() < 1e-4);
            }
            other => panic!("expected rope, got {other:?}"),
        }
    }

    #[test]
    fn expired_decay_draws_cross() {
        let mut cmds = Vec::new();
        let b = balloon(BalloonState::Decaying {
            popped_at: 0.0,
            cause: PopCause::Expired,
            progress: 0.5,
        });
        decaying_balloon(&mut cmds, &b, PopCause::Expired, 0.5);
        assert_eq!(cmds.len(), 3);
        // radius * scale * (1 - progress) = 40 * 1.25 * 0.5
        assert!(matches!(
            cmds[0],
            DrawCmd::FillCircle { radius, .. } if (radius - 25.0).abs() < 1e-4
        ));
        assert!(cmds[1..].iter().all(|c| matches!(c, DrawCmd::Polyline { .. })));
    }

    #[test]
    fn manual_decay_draws_rings_core_and_flash() {
        let mut cmds = Vec::new();
        let b = balloon(BalloonState::Live);
        decaying_balloon(&mut cmds, &b, PopCause::Manual, 0.0);
        let rings = cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::StrokeCircle { .. }))
            .count();
        assert_eq!(rings, 3);
        assert_eq!(cmds.len(), 5);
        // Flash starts at zero size
        assert!(matches!(cmds[4], DrawCmd::FillCircle { radius, .. } if radius == 0.0));
    }

    #[test]
    fn hud_only_during_session() {
        let mut game = Game::new(Settings::default(), CanvasSize::new(800.0, 600.0), 1);
        let idle = build_scene(&game, 0.0, true, &ApproxMeasure);
        assert_eq!(idle, vec![DrawCmd::Clear, DrawCmd::CameraFrame]);

        game.start(true, 0.0).unwrap();
        let active = build_scene(&game, 0.0, false, &ApproxMeasure);
        assert!(!active.contains(&DrawCmd::CameraFrame));
        let lines = texts(&active);
        assert_eq!(lines[0].0, "Score: 0");
        assert_eq!(lines[3], ("Time: 60s", colors::WHITE));

        game.pause(10.0);
        assert_eq!(game.phase(), GamePhase::Paused);
        assert_eq!(texts(&build_scene(&game, 10.0, true, &ApproxMeasure)).len(), 4);
    }

    #[test]
    fn hud_highlights_low_time() {
        let mut game = Game::new(Settings::default(), CanvasSize::new(800.0, 600.0), 1);
        game.set_session_duration(10);
        game.start(true, 0.0).unwrap();
        let cmds = build_scene(&game, 0.0, true, &ApproxMeasure);
        assert_eq!(texts(&cmds)[3], ("Time: 10s", colors::WARNING));
        match &cmds[2] {
            DrawCmd::RoundRect { size, .. } => assert_eq!(size.y, 150.0),
            other => panic!("expected panel, got {other:?}"),
        }
    }

    #[test]
    fn combo_text_rises_and_fades() {
        let effect = ComboEffect {
            pos: Vec2::new(100.0, 100.0),
            combo: 4,
            bonus: 8,
            started_at: 0.0,
        };
        let mut cmds = Vec::new();
        combo_text(&mut cmds, &effect, 750.0);
        match &cmds[0] {
            DrawCmd::Text { text, pos, color, .. } => {
                assert_eq!(text, "4 Combo! +8");
                assert_eq!(*pos, Vec2::new(100.0, 75.0));
                assert!((color.a - 0.5).abs() < 1e-6);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }
}
