//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform dependencies:
//! - Seeded RNG only
//! - Time enters only as the `dt` handed to `step`
//! - State lives in one `SimContext` owned by the driver

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, find_collision};
pub use spawn::spawn_batch;
pub use state::{
    CameraMode, EndCause, GameEvent, GameMode, Obstacle, ObstacleKind, PlayerState, RunPhase,
    RunState, SimContext, WorldState,
};
pub use tick::{countdown_tick, step};
