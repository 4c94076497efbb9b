//! Per-frame simulation tick
//!
//! `step` advances a `SimContext` by one frame of wall-clock time and reports
//! what happened as events. No rendering, audio or platform calls happen here.

use super::collision::find_collision;
use super::spawn::spawn_batch;
use super::state::{EndCause, GameEvent, GameMode, RunPhase, SimContext};
use crate::consts::MAX_DT;
use crate::input::InputSnapshot;
use crate::{Viewport, kmh_to_mps};

/// Advance the run by `dt` seconds
pub fn step(
    ctx: &mut SimContext,
    input: &InputSnapshot,
    dt: f32,
    viewport: Viewport,
) -> Vec<GameEvent> {
    let mut events = Vec::new();

    // Edge toggles are honored in every phase
    if input.toggle_camera {
        ctx.camera = ctx.camera.toggled();
        events.push(GameEvent::CameraChanged(ctx.camera));
    }
    if input.toggle_pause {
        match ctx.run.phase {
            RunPhase::Running => {
                ctx.run.phase = RunPhase::Paused;
                events.push(GameEvent::PhaseChanged(RunPhase::Paused));
            }
            RunPhase::Paused => {
                ctx.run.phase = RunPhase::Running;
                events.push(GameEvent::PhaseChanged(RunPhase::Running));
            }
            RunPhase::Ended => {}
        }
    }
    if let Some(kmh) = input.speed_override {
        if ctx.run.phase != RunPhase::Ended {
            ctx.run.speed = kmh.clamp(0.0, ctx.tuning.absolute_max_speed);
        }
    }

    // Don't tick if paused or over
    if !ctx.run.is_running() {
        ctx.run.nitro_active = false;
        return events;
    }

    // NaN or negative deltas integrate as a stalled frame
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 };

    update_speed(ctx, input, dt);
    update_lane(ctx, input, dt);
    ctx.world.player.place(viewport, ctx.camera);
    update_progress(ctx, dt);

    // Spawning
    ctx.world.spawn_countdown -= dt;
    if ctx.world.spawn_countdown <= 0.0 {
        let count = spawn_batch(ctx, viewport);
        ctx.world.spawn_countdown = ctx.tuning.spawn_interval_at(ctx.run.speed);
        events.push(GameEvent::ObstaclesSpawned { count });
    }

    // Closing speed is player speed plus the obstacle's own approach
    let speed = ctx.run.speed;
    for obstacle in &mut ctx.world.obstacles {
        obstacle.pos.y += kmh_to_mps(obstacle.approach_speed + speed) * dt;
    }
    let cull_line = viewport.height + crate::consts::CULL_MARGIN;
    ctx.world.obstacles.retain(|o| o.pos.y <= cull_line);

    if find_collision(&ctx.world.player.bounds(), &ctx.world.obstacles).is_none() {
        return events;
    }
    if let Some(score) = ctx.run.finish() {
        log::info!("Crashed at {:.0} km/h, score {}", ctx.run.speed, score);
        ctx.run.nitro_active = false;
        events.push(GameEvent::PhaseChanged(RunPhase::Ended));
        events.push(GameEvent::RunEnded {
            score,
            cause: EndCause::Collision,
        });
    }

    events
}

/// Throttle, drag, brake and nitro
fn update_speed(ctx: &mut SimContext, input: &InputSnapshot, dt: f32) {
    let t = &ctx.tuning;
    let run = &mut ctx.run;

    if input.accelerate {
        // Throttle tops out at max_speed but never drags a nitro boost back down
        if run.speed < t.max_speed {
            run.speed = (run.speed + t.accel_rate * dt).min(t.max_speed);
        }
    } else {
        run.speed = (run.speed - t.drag_rate * dt).max(0.0);
    }
    if input.brake {
        run.speed = (run.speed - t.brake_rate * dt).max(0.0);
    }

    run.nitro_active = false;
    if input.nitro {
        if run.nitro > 0.0 {
            run.speed = (run.speed + t.nitro_boost * dt).min(t.absolute_max_speed);
            run.nitro = (run.nitro - t.nitro_burn * dt).max(0.0);
            run.nitro_active = true;
        }
    } else {
        run.nitro = (run.nitro + t.nitro_regen * dt).min(100.0);
    }

    run.speed = run.speed.clamp(0.0, t.absolute_max_speed);
}

/// Slide toward the lane the player is steering at
fn update_lane(ctx: &mut SimContext, input: &InputSnapshot, dt: f32) {
    let max_lane = ctx.world.max_lane();
    let player = &mut ctx.world.player;
    let lane = player.lane.clamp(0.0, max_lane);
    let target = (lane + input.steer_axis()).clamp(0.0, max_lane);
    let max_step = ctx.tuning.lane_change_rate * dt;
    player.lane = if (target - lane).abs() <= max_step {
        target
    } else {
        lane + max_step.copysign(target - lane)
    };
}

/// Distance and score
fn update_progress(ctx: &mut SimContext, dt: f32) {
    ctx.world.traveled_distance += kmh_to_mps(ctx.run.speed) * dt;
    ctx.run.play_time += dt;

    let distance_points =
        (ctx.world.traveled_distance / ctx.tuning.meters_per_point).floor() as u64;
    // Endless adds one point per whole second survived on top of distance
    let survival_bonus = match ctx.mode {
        GameMode::Endless => ctx.run.play_time.floor() as u64,
        GameMode::Timed => 0,
    };
    ctx.run.score = ctx.run.score.max(distance_points + survival_bonus);
}

/// One-second countdown for Timed mode, driven by its own timer
///
/// Ends the run when the clock reaches zero. Returns the end event once.
pub fn countdown_tick(ctx: &mut SimContext) -> Option<GameEvent> {
    if ctx.mode != GameMode::Timed || !ctx.run.is_running() {
        return None;
    }
    ctx.run.time_remaining = ctx.run.time_remaining.saturating_sub(1);
    if ctx.run.time_remaining > 0 {
        return None;
    }
    let score = ctx.run.finish()?;
    ctx.run.nitro_active = false;
    log::info!("Time up, score {}", score);
    Some(GameEvent::RunEnded {
        score,
        cause: EndCause::TimeUp,
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::Environment;
    use crate::sim::state::{CameraMode, Obstacle, ObstacleKind};
    use crate::tuning::Tuning;

    const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);
    const DT: f32 = 0.05;

    fn ctx(mode: GameMode) -> SimContext {
        SimContext::new(mode, Environment::City, Tuning::default(), 12345)
    }

    /// Keep the road empty for kinematics tests
    fn no_traffic(ctx: &mut SimContext) {
        ctx.world.spawn_countdown = f32::MAX;
    }

    fn hold(f: impl FnOnce(&mut InputSnapshot)) -> InputSnapshot {
        let mut input = InputSnapshot::default();
        f(&mut input);
        input
    }

    fn run_for(ctx: &mut SimContext, input: &InputSnapshot, seconds: f32) -> Vec<GameEvent> {
        let ticks = (seconds / DT).round() as usize;
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(step(ctx, input, DT, VIEWPORT));
        }
        events
    }

    #[test]
    fn test_accelerate_from_standstill() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        c.run.speed = 0.0;
        run_for(&mut c, &hold(|i| i.accelerate = true), 2.0);
        assert!((c.run.speed - 120.0).abs() < 1e-3, "speed {}", c.run.speed);
    }

    #[test]
    fn test_accelerate_caps_at_max_speed() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        run_for(&mut c, &hold(|i| i.accelerate = true), 5.0);
        assert_eq!(c.run.speed, 240.0);
    }

    #[test]
    fn test_drag_and_brake_floor_at_zero() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        run_for(&mut c, &hold(|i| i.brake = true), 1.0);
        assert_eq!(c.run.speed, 0.0);
        run_for(&mut c, &InputSnapshot::default(), 1.0);
        assert_eq!(c.run.speed, 0.0);
    }

    #[test]
    fn test_nitro_drains_to_zero_and_stays() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        let nitro = hold(|i| i.nitro = true);
        run_for(&mut c, &nitro, 4.0);
        assert!(c.run.nitro < 1e-3, "nitro {}", c.run.nitro);
        run_for(&mut c, &nitro, 1.0);
        assert_eq!(c.run.nitro, 0.0);
        assert!(!c.run.nitro_active);
        assert!(c.run.speed <= 320.0);
    }

    #[test]
    fn test_nitro_regenerates_when_released() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        c.run.nitro = 50.0;
        run_for(&mut c, &InputSnapshot::default(), 1.0);
        assert!((c.run.nitro - 58.0).abs() < 1e-3);
    }

    #[test]
    fn test_nitro_pushes_past_throttle_cap() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        c.run.speed = 240.0;
        run_for(&mut c, &hold(|i| {
            i.accelerate = true;
            i.nitro = true;
        }), 1.0);
        assert!(c.run.speed > 240.0);
        assert!(c.run.speed <= 320.0);
    }

    #[test]
    fn test_lane_change_eases_and_clamps() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        let right = hold(|i| i.steer_right = true);
        step(&mut c, &right, DT, VIEWPORT);
        // 8 lanes/s * 0.05 s
        assert!((c.world.player.lane - 1.4).abs() < 1e-5);
        run_for(&mut c, &right, 2.0);
        assert_eq!(c.world.player.lane, 3.0);

        run_for(&mut c, &hold(|i| i.steer_left = true), 2.0);
        assert_eq!(c.world.player.lane, 0.0);
        assert_eq!(c.world.player.pos.x, VIEWPORT.lane_center_x(0.0));
    }

    #[test]
    fn test_player_follows_resize() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        assert_eq!(c.world.player.pos, Vec2::new(400.0 - 160.0 + 120.0, 420.0));
        step(&mut c, &InputSnapshot::default(), DT, Viewport::new(400.0, 900.0));
        assert_eq!(c.world.player.pos, Vec2::new(200.0 - 160.0 + 120.0, 720.0));
    }

    #[test]
    fn test_large_dt_is_clamped() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        c.run.speed = 0.0;
        step(&mut c, &hold(|i| i.accelerate = true), 10.0, VIEWPORT);
        assert!((c.run.speed - 60.0 * MAX_DT).abs() < 1e-5);
        step(&mut c, &hold(|i| i.accelerate = true), f32::NAN, VIEWPORT);
        assert!((c.run.speed - 60.0 * MAX_DT).abs() < 1e-5);
    }

    #[test]
    fn test_distance_score() {
        let mut c = ctx(GameMode::Timed);
        no_traffic(&mut c);
        c.tuning.drag_rate = 0.0;
        c.run.speed = 36.0; // 10 m/s, one point per second
        run_for(&mut c, &InputSnapshot::default(), 3.0);
        assert!((c.world.traveled_distance - 30.0).abs() < 0.01);
        // Timed runs score distance only
        assert_eq!(c.run.score, (c.world.traveled_distance / 10.0).floor() as u64);
    }

    #[test]
    fn test_endless_adds_survival_bonus() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        c.run.speed = 0.0;
        run_for(&mut c, &InputSnapshot::default(), 3.05);
        assert_eq!(c.world.traveled_distance, 0.0);
        assert_eq!(c.run.score, 3);
    }

    #[test]
    fn test_first_tick_spawns() {
        let mut c = ctx(GameMode::Endless);
        let events = step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        assert!(matches!(events[..], [GameEvent::ObstaclesSpawned { count: 1..=2 }]));
        let expected = Tuning::default().spawn_interval_at(c.run.speed);
        assert!((c.world.spawn_countdown - expected).abs() < 1e-6);
    }

    #[test]
    fn test_obstacles_advance_and_cull() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        c.run.speed = 0.0;
        c.world.obstacles.push(Obstacle {
            id: 1,
            lane: 3,
            pos: Vec2::new(VIEWPORT.lane_center_x(3.0), 0.0),
            width: 60.0,
            height: 120.0,
            approach_speed: 72.0, // 20 m/s
            color: [1.0; 4],
            kind: ObstacleKind::Car,
        });
        step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        assert!((c.world.obstacles[0].pos.y - 1.0).abs() < 1e-4);

        c.world.obstacles[0].pos.y = 649.5;
        step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        assert!(c.world.obstacles.is_empty());
    }

    #[test]
    fn test_collision_ends_run_once() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        let player = c.world.player.pos;
        c.world.obstacles.push(Obstacle {
            id: 9,
            lane: 1,
            pos: player + Vec2::new(0.0, -100.0),
            width: 60.0,
            height: 120.0,
            approach_speed: 40.0,
            color: [1.0; 4],
            kind: ObstacleKind::Cow,
        });
        let events = step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        assert_eq!(c.run.phase, RunPhase::Ended);
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
            .collect();
        assert_eq!(
            ended,
            vec![&GameEvent::RunEnded {
                score: c.run.score,
                cause: EndCause::Collision
            }]
        );

        // Nothing moves and nothing is reported again
        let distance = c.world.traveled_distance;
        let events = step(&mut c, &InputSnapshot::default(), DT, VIEWPORT);
        assert!(events.is_empty());
        assert_eq!(c.world.traveled_distance, distance);
        assert_eq!(countdown_tick(&mut c), None);
    }

    #[test]
    fn test_pause_freezes_and_resumes() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        let pause = hold(|i| i.toggle_pause = true);
        let events = step(&mut c, &pause, DT, VIEWPORT);
        assert_eq!(events, vec![GameEvent::PhaseChanged(RunPhase::Paused)]);

        run_for(&mut c, &hold(|i| i.accelerate = true), 1.0);
        assert_eq!(c.world.traveled_distance, 0.0);
        assert_eq!(c.run.speed, 120.0);

        step(&mut c, &pause, DT, VIEWPORT);
        assert_eq!(c.run.phase, RunPhase::Running);
        assert!(c.world.traveled_distance > 0.0);
    }

    #[test]
    fn test_camera_toggle_moves_player() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        let events = step(&mut c, &hold(|i| i.toggle_camera = true), DT, VIEWPORT);
        assert_eq!(events, vec![GameEvent::CameraChanged(CameraMode::Cockpit)]);
        assert_eq!(c.world.player.pos.y, 480.0);
    }

    #[test]
    fn test_speed_slider_sets_speed() {
        let mut c = ctx(GameMode::Endless);
        no_traffic(&mut c);
        step(&mut c, &hold(|i| i.speed_override = Some(999.0)), 0.0, VIEWPORT);
        assert_eq!(c.run.speed, 320.0);
        step(&mut c, &hold(|i| i.speed_override = Some(-5.0)), 0.0, VIEWPORT);
        assert_eq!(c.run.speed, 0.0);
    }

    #[test]
    fn test_timed_countdown_ends_run() {
        let mut c = ctx(GameMode::Timed);
        no_traffic(&mut c);
        run_for(&mut c, &InputSnapshot::default(), 2.0);
        c.run.time_remaining = 1;
        let expected = (c.world.traveled_distance / 10.0).floor() as u64;

        let event = countdown_tick(&mut c);
        assert_eq!(
            event,
            Some(GameEvent::RunEnded {
                score: expected,
                cause: EndCause::TimeUp
            })
        );
        assert_eq!(c.run.phase, RunPhase::Ended);
        assert_eq!(c.run.time_remaining, 0);
        assert_eq!(countdown_tick(&mut c), None);
    }

    #[test]
    fn test_countdown_ignores_endless_and_pause() {
        let mut c = ctx(GameMode::Endless);
        assert_eq!(countdown_tick(&mut c), None);
        assert_eq!(c.run.time_remaining, 60);

        let mut c = ctx(GameMode::Timed);
        c.run.phase = RunPhase::Paused;
        assert_eq!(countdown_tick(&mut c), None);
        assert_eq!(c.run.time_remaining, 60);
    }

    #[test]
    fn test_determinism() {
        let mut a = ctx(GameMode::Endless);
        let mut b = ctx(GameMode::Endless);
        let inputs = [
            hold(|i| i.accelerate = true),
            hold(|i| i.steer_left = true),
            hold(|i| i.nitro = true),
            InputSnapshot::default(),
        ];
        for _ in 0..50 {
            for input in &inputs {
                step(&mut a, input, DT, VIEWPORT);
                step(&mut b, input, DT, VIEWPORT);
            }
        }
        assert_eq!(a.run.score, b.run.score);
        assert_eq!(a.run.phase, b.run.phase);
        assert_eq!(a.world.obstacles.len(), b.world.obstacles.len());
    }

    fn arb_input() -> impl Strategy<Value = InputSnapshot> {
        (any::<[bool; 7]>(), proptest::option::of(-100.0f32..500.0)).prop_map(|(b, speed)| {
            InputSnapshot {
                steer_left: b[0],
                steer_right: b[1],
                accelerate: b[2],
                brake: b[3],
                nitro: b[4],
                toggle_camera: b[5],
                toggle_pause: b[6],
                speed_override: speed,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_state_stays_bounded(
            frames in proptest::collection::vec((arb_input(), 0.0f32..2.0), 1..200),
            width in 200.0f32..2000.0,
            height in 200.0f32..2000.0,
        ) {
            let mut c = ctx(GameMode::Endless);
            let viewport = Viewport::new(width, height);
            let mut last_score = 0;
            let mut ended = 0;
            for (input, dt) in &frames {
                for event in step(&mut c, input, *dt, viewport) {
                    if matches!(event, GameEvent::RunEnded { .. }) {
                        ended += 1;
                    }
                }
                prop_assert!((0.0..=320.0).contains(&c.run.speed));
                prop_assert!((0.0..=100.0).contains(&c.run.nitro));
                prop_assert!((0.0..=3.0).contains(&c.world.player.lane));
                prop_assert!(c.run.score >= last_score);
                last_score = c.run.score;
            }
            prop_assert!(ended <= 1);
        }
    }
}
