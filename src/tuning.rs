//! Data-driven game balance
//!
//! Every rate the simulation integrates lives here so a run can be replayed
//! or rebalanced from JSON without touching the step code.

use serde::{Deserialize, Serialize};

/// Balance knobs for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Longitudinal (km/h, km/h per second) ===
    /// Throttle gain while accelerate is held
    pub accel_rate: f32,
    /// Coast-down while accelerate is released
    pub drag_rate: f32,
    /// Extra deceleration while brake is held
    pub brake_rate: f32,
    /// Throttle alone never pushes past this
    pub max_speed: f32,
    /// Hard ceiling, reachable only with nitro
    pub absolute_max_speed: f32,

    // === Nitro (percent, percent per second) ===
    pub nitro_boost: f32,
    pub nitro_burn: f32,
    pub nitro_regen: f32,

    // === Lateral ===
    /// Lanes per second the car slides toward its target lane
    pub lane_change_rate: f32,
    /// Lane index at run start
    pub start_lane: f32,

    // === Spawning ===
    /// Countdown after a batch at standstill (seconds)
    pub spawn_interval: f32,
    /// Player speed that removes one second from the interval
    pub spawn_speed_divisor: f32,
    /// Shortest allowed interval (seconds)
    pub spawn_interval_floor: f32,
    pub min_batch: u32,
    pub max_batch: u32,
    /// Incoming speed range for traffic (km/h)
    pub approach_speed_min: f32,
    pub approach_speed_max: f32,
    /// Chance of a cow in environments that have them
    pub cow_chance: f32,
    /// Random extra height above the top edge for new obstacles
    pub spawn_height_jitter: f32,

    // === Scoring ===
    pub meters_per_point: f32,

    // === Run defaults ===
    pub initial_speed: f32,
    pub initial_nitro: f32,
    /// Countdown length for Timed mode (whole seconds)
    pub timed_duration: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            accel_rate: 60.0,
            drag_rate: 20.0,
            brake_rate: 120.0,
            max_speed: 240.0,
            absolute_max_speed: 320.0,

            nitro_boost: 160.0,
            nitro_burn: 25.0,
            nitro_regen: 8.0,

            lane_change_rate: 8.0,
            start_lane: 1.0,

            spawn_interval: 1.2,
            spawn_speed_divisor: 300.0,
            spawn_interval_floor: 0.5,
            min_batch: 1,
            max_batch: 2,
            approach_speed_min: 40.0,
            approach_speed_max: 140.0,
            cow_chance: 0.15,
            spawn_height_jitter: 200.0,

            meters_per_point: 10.0,

            initial_speed: 120.0,
            initial_nitro: 100.0,
            timed_duration: 60,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Seconds until the next batch, shrinking as the player speeds up
    pub fn spawn_interval_at(&self, speed: f32) -> f32 {
        (self.spawn_interval - speed / self.spawn_speed_divisor).max(self.spawn_interval_floor)
    }
}
