//! Frame draw list
//!
//! Turns the read-only simulation state into screen-space triangles. All
//! geometry comes from the live viewport on every call so resizes between
//! frames need no bookkeeping.

use super::shapes::{dashed_vline, rect, rect_centered, vertical_gradient};
use super::vertex::{Vertex, colors};
use crate::Viewport;
use crate::catalog::Vehicle;
use crate::consts::*;
use crate::sim::{CameraMode, ObstacleKind, SimContext};

/// Vertical dash scroll for the lane dividers, in [0, dash + gap)
pub fn dash_offset(time_ms: f64, speed: f32) -> f32 {
    let period = (DASH_LENGTH + DASH_GAP) as f64;
    (time_ms * speed as f64 / 2000.0).rem_euclid(period) as f32
}

/// Build the frame, or None when the viewport has no area
pub fn build(
    ctx: &SimContext,
    vehicle: Vehicle,
    viewport: Viewport,
    time_ms: f64,
) -> Option<Vec<Vertex>> {
    if viewport.is_empty() {
        return None;
    }

    let world = &ctx.world;
    let palette = world.environment.palette();
    let (w, h) = (viewport.width, viewport.height);
    let mut out = Vec::with_capacity(256 + world.obstacles.len() * 24);

    // Background
    let [bg_top, bg_bottom] = palette.background;
    vertical_gradient(&mut out, 0.0, 0.0, w, h, &[(0.0, bg_top), (1.0, bg_bottom)]);

    // Road
    let road_x = viewport.road_left();
    rect(&mut out, road_x, 0.0, world.road_width, h, palette.road);

    // Lane dividers
    let offset = dash_offset(time_ms, ctx.run.speed);
    for i in 1..world.lane_count {
        let x = road_x + i as f32 * world.lane_width;
        dashed_vline(
            &mut out,
            x,
            DIVIDER_WIDTH,
            h,
            DASH_LENGTH,
            DASH_GAP,
            offset,
            palette.divider,
        );
    }

    // Traffic
    for o in &world.obstacles {
        rect_centered(&mut out, o.pos.x, o.pos.y, o.width, o.height, o.color);
        if o.kind == ObstacleKind::Cow {
            let (x, y) = (o.pos.x, o.pos.y);
            rect(&mut out, x - 15.0, y - 20.0, 30.0, 15.0, colors::COW_MARKINGS);
            rect(&mut out, x - 10.0, y - 5.0, 8.0, 8.0, colors::COW_MARKINGS);
            rect(&mut out, x + 2.0, y - 5.0, 8.0, 8.0, colors::COW_MARKINGS);
        }
    }

    // Player with gloss
    let p = &world.player;
    let (px, py) = (p.pos.x - p.width / 2.0, p.pos.y - p.height / 2.0);
    rect(&mut out, px, py, p.width, p.height, vehicle.color());
    vertical_gradient(
        &mut out,
        px,
        py,
        p.width,
        p.height,
        &[
            (0.0, colors::GLOSS_TOP),
            (0.3, colors::GLOSS_MID),
            (1.0, colors::GLOSS_BOTTOM),
        ],
    );

    if ctx.camera == CameraMode::Cockpit {
        rect(&mut out, 0.0, 0.0, w, COCKPIT_TOP_BAR, colors::LETTERBOX);
        rect(
            &mut out,
            0.0,
            h - COCKPIT_BOTTOM_BAR,
            w,
            COCKPIT_BOTTOM_BAR,
            colors::LETTERBOX,
        );
    }

    Some(out)
}
