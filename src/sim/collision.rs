//! Collision detection for lane traffic
//!
//! Everything on the road is an axis-aligned box around its center, so a
//! crash is a plain separating-axis test on both axes.

use glam::Vec2;

use super::state::Obstacle;

/// Axis-aligned box described by its center and full size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub const fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Strict overlap: boxes that only touch along an edge don't collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let delta = (self.center - other.center).abs();
        let reach = (self.size + other.size) * 0.5;
        delta.x < reach.x && delta.y < reach.y
    }
}

/// Index of an obstacle overlapping `player`, if any
///
/// Any hit ends the run, so which one is found first doesn't matter.
pub fn find_collision(player: &Aabb, obstacles: &[Obstacle]) -> Option<usize> {
    obstacles.iter().position(|o| player.overlaps(&o.bounds()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::ObstacleKind;

    fn obstacle_at(x: f32, y: f32) -> Obstacle {
        Obstacle {
            id: 1,
            lane: 0,
            pos: Vec2::new(x, y),
            width: 60.0,
            height: 120.0,
            approach_speed: 60.0,
            color: [1.0; 4],
            kind: ObstacleKind::Car,
        }
    }

    #[test]
    fn test_vertical_overlap_same_lane() {
        let player = Aabb::new(Vec2::new(100.0, 500.0), Vec2::new(60.0, 120.0));
        let other = Aabb::new(Vec2::new(100.0, 520.0), Vec2::new(60.0, 120.0));
        assert!(player.overlaps(&other));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(60.0, 120.0));
        let cases = [
            Vec2::new(59.0, 0.0),
            Vec2::new(60.0, 0.0),
            Vec2::new(0.0, 119.0),
            Vec2::new(-30.0, -100.0),
            Vec2::new(80.0, 10.0),
        ];
        for c in cases {
            let b = Aabb::new(c, Vec2::new(60.0, 120.0));
            assert_eq!(a.overlaps(&b), b.overlaps(&a), "asymmetric at {c:?}");
        }
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(60.0, 120.0));
        let side = Aabb::new(Vec2::new(60.0, 0.0), Vec2::new(60.0, 120.0));
        let below = Aabb::new(Vec2::new(0.0, 120.0), Vec2::new(60.0, 120.0));
        assert!(!a.overlaps(&side));
        assert!(!a.overlaps(&below));
    }

    #[test]
    fn test_adjacent_lanes_miss() {
        // Lane centers are 80 apart, cars are 60 wide
        let player = Aabb::new(Vec2::new(280.0, 420.0), Vec2::new(60.0, 120.0));
        let obstacles = [obstacle_at(360.0, 420.0), obstacle_at(200.0, 430.0)];
        assert_eq!(find_collision(&player, &obstacles), None);
    }

    #[test]
    fn test_find_collision_independent_of_order() {
        let player = Aabb::new(Vec2::new(100.0, 500.0), Vec2::new(60.0, 120.0));
        let mut obstacles = vec![
            obstacle_at(300.0, 500.0),
            obstacle_at(100.0, 520.0),
            obstacle_at(100.0, -200.0),
        ];
        assert!(find_collision(&player, &obstacles).is_some());
        obstacles.reverse();
        assert!(find_collision(&player, &obstacles).is_some());
    }
}
