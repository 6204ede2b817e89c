//! Hit resolution: which live balloons does an input touch?
//!
//! Two policies share the same containment test (distance <= radius):
//! - pointer/touch picks at most one balloon, topmost (newest) first
//! - motion points vote per balloon and everything above the threshold pops

use glam::Vec2;

use super::state::Balloon;

/// Index of the topmost live balloon containing `point`
pub fn pointer_target(balloons: &[Balloon], point: Vec2) -> Option<usize> {
    balloons
        .iter()
        .enumerate()
        .rev()
        .find(|(_, b)| b.is_live() && b.contains(point))
        .map(|(i, _)| i)
}

/// Motion points inside each balloon; decaying balloons always get zero
pub fn motion_votes(balloons: &[Balloon], points: &[Vec2]) -> Vec<u32> {
    balloons
        .iter()
        .map(|b| {
            if b.is_live() {
                points.iter().filter(|p| b.contains(**p)).count() as u32
            } else {
                0
            }
        })
        .collect()
}

/// Indices of live balloons with strictly more than `threshold` votes
pub fn motion_targets(balloons: &[Balloon], points: &[Vec2], threshold: u32) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }
    motion_votes(balloons, points)
        .into_iter()
        .enumerate()
        .filter(|(_, votes)| *votes > threshold)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{BalloonState, PALETTE, PopCause};

    fn balloon(id: u32, x: f32, y: f32, radius: f32) -> Balloon {
        Balloon {
            id,
            pos: Vec2::new(x, y),
            radius,
            color: PALETTE[0],
            direction: Vec2::X,
            speed: 0.0,
            float_phase: 0.0,
            float_speed: 0.0,
            lifetime_ms: 0.0,
            created_at: 0.0,
            state: BalloonState::Live,
        }
    }

    fn cluster(center: Vec2, n: usize) -> Vec<Vec2> {
        (0..n).map(|i| center + Vec2::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn pointer_prefers_newest_overlap() {
        let balloons = vec![balloon(1, 100.0, 100.0, 40.0), balloon(2, 120.0, 100.0, 40.0)];
        assert_eq!(pointer_target(&balloons, Vec2::new(110.0, 100.0)), Some(1));
        assert_eq!(pointer_target(&balloons, Vec2::new(65.0, 100.0)), Some(0));
        assert_eq!(pointer_target(&balloons, Vec2::new(300.0, 300.0)), None);
    }

    #[test]
    fn pointer_rim_counts() {
        let balloons = vec![balloon(1, 0.0, 0.0, 30.0)];
        assert_eq!(pointer_target(&balloons, Vec2::new(30.0, 0.0)), Some(0));
    }

    #[test]
    fn pointer_skips_decaying() {
        let mut balloons = vec![balloon(1, 100.0, 100.0, 40.0), balloon(2, 100.0, 100.0, 40.0)];
        balloons[1].pop(PopCause::Manual, 0.0);
        assert_eq!(pointer_target(&balloons, Vec2::new(100.0, 100.0)), Some(0));
    }

    #[test]
    fn votes_need_strictly_more_than_threshold() {
        let balloons = vec![balloon(1, 100.0, 100.0, 40.0)];
        let eight = cluster(Vec2::new(90.0, 100.0), 8);
        assert!(motion_targets(&balloons, &eight, 8).is_empty());

        let nine = cluster(Vec2::new(90.0, 100.0), 9);
        assert_eq!(motion_targets(&balloons, &nine, 8), vec![0]);
    }

    #[test]
    fn motion_can_pop_several() {
        let balloons = vec![
            balloon(1, 100.0, 100.0, 40.0),
            balloon(2, 400.0, 100.0, 40.0),
            balloon(3, 700.0, 100.0, 40.0),
        ];
        let mut points = cluster(Vec2::new(95.0, 100.0), 10);
        points.extend(cluster(Vec2::new(695.0, 100.0), 10));
        assert_eq!(motion_targets(&balloons, &points, 8), vec![0, 2]);
    }

    #[test]
    fn far_points_pop_nothing() {
        let balloons = vec![balloon(1, 100.0, 100.0, 40.0)];
        let points = cluster(Vec2::new(500.0, 500.0), 50);
        assert_eq!(motion_votes(&balloons, &points), vec![0]);
        assert!(motion_targets(&balloons, &points, 8).is_empty());
    }
}
