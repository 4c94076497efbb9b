//! Lane Rush - A lane-dodging arcade driving game
//!
//! Core modules:
//! - `sim`: Simulation (speed, lanes, spawning, collisions, scoring)
//! - `input`: Keyboard/touch sampling into per-frame snapshots
//! - `audio`: Engine and nitro tone feedback
//! - `renderer`: Draw-list building and the WebGPU pipeline
//! - `driver`: Per-frame session that ties everything together
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod catalog;
pub mod driver;
pub mod error;
pub mod highscores;
pub mod input;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use catalog::{Environment, Vehicle};
pub use driver::{Frame, RunConfig, Session};
pub use highscores::{HighScoreProvider, HighScores};
pub use settings::Settings;
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Largest timestep a single tick will integrate (seconds)
    pub const MAX_DT: f32 = 0.05;

    /// Road geometry
    pub const LANE_COUNT: u32 = 4;
    pub const LANE_WIDTH: f32 = 80.0;
    pub const ROAD_WIDTH: f32 = LANE_COUNT as f32 * LANE_WIDTH;

    /// Car footprint (player and traffic share it)
    pub const CAR_WIDTH: f32 = 60.0;
    pub const CAR_HEIGHT: f32 = 120.0;

    /// Player distance from the bottom edge per camera mode
    pub const THIRD_PERSON_OFFSET: f32 = 180.0;
    pub const COCKPIT_OFFSET: f32 = 120.0;

    /// Obstacles this far below the viewport are dropped
    pub const CULL_MARGIN: f32 = 50.0;

    /// Lane divider dashes
    pub const DASH_LENGTH: f32 = 30.0;
    pub const DASH_GAP: f32 = 40.0;
    pub const DIVIDER_WIDTH: f32 = 4.0;

    /// Cockpit letterbox bar heights
    pub const COCKPIT_TOP_BAR: f32 = 50.0;
    pub const COCKPIT_BOTTOM_BAR: f32 = 70.0;
}

/// Live drawing-surface size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension collapsed (hidden tab, mid-resize)
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Left edge of the road band, centered horizontally
    #[inline]
    pub fn road_left(&self) -> f32 {
        self.width / 2.0 - consts::ROAD_WIDTH / 2.0
    }

    /// Screen x of a (possibly fractional) lane center
    #[inline]
    pub fn lane_center_x(&self, lane: f32) -> f32 {
        self.road_left() + consts::LANE_WIDTH * (0.5 + lane)
    }
}

/// Convert km/h to m/s
#[inline]
pub fn kmh_to_mps(kmh: f32) -> f32 {
    kmh * 1000.0 / 3600.0
}
