//! Obstacle spawning
//!
//! Batches of traffic appear just above the top edge. All randomness comes
//! from the run's seeded RNG so a seed replays the same traffic.

use glam::Vec2;
use rand::Rng;

use super::state::{Obstacle, ObstacleKind, SimContext};
use crate::Viewport;
use crate::consts::{CAR_HEIGHT, CAR_WIDTH};

/// Spawn one batch of obstacles, returning how many were added
pub fn spawn_batch(ctx: &mut SimContext, viewport: Viewport) -> u32 {
    let min_batch = ctx.tuning.min_batch;
    let max_batch = ctx.tuning.max_batch.max(min_batch);
    let count = ctx.rng.random_range(min_batch..=max_batch);

    for _ in 0..count {
        let lane = ctx.rng.random_range(0..ctx.world.lane_count);
        let jitter = ctx.rng.random::<f32>() * ctx.tuning.spawn_height_jitter;
        let (lo, hi) = (ctx.tuning.approach_speed_min, ctx.tuning.approach_speed_max);
        let approach_speed = if hi > lo {
            ctx.rng.random_range(lo..hi)
        } else {
            lo
        };
        let palette = ctx.world.environment.palette();
        let color = palette.obstacles[ctx.rng.random_range(0..palette.obstacles.len())];
        let kind = ObstacleKind::from_roll(
            ctx.world.environment,
            ctx.rng.random::<f32>(),
            ctx.tuning.cow_chance,
        );

        let id = ctx.world.next_entity_id();
        ctx.world.obstacles.push(Obstacle {
            id,
            lane,
            pos: Vec2::new(
                viewport.lane_center_x(lane as f32),
                -CAR_HEIGHT - jitter,
            ),
            width: CAR_WIDTH,
            height: CAR_HEIGHT,
            approach_speed,
            color,
            kind,
        });
    }

    log::debug!(
        "Spawned {} obstacle(s), {} on road",
        count,
        ctx.world.obstacles.len()
    );
    count
}
