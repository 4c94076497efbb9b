//! Game state and core simulation types
//!
//! `SimContext` is the single mutable context the driver threads through
//! `tick::step`; nothing else mutates world or run state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::Viewport;
use crate::catalog::Environment;
use crate::consts::*;
use crate::tuning::Tuning;

/// How a run is scored and when it ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    /// Drive until you crash; earns a per-second survival bonus
    #[default]
    Endless,
    /// Drive until you crash or the countdown hits zero
    Timed,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Endless => "Endless",
            GameMode::Timed => "Timed",
        }
    }

    pub fn from_id(id: &str) -> Self {
        match id {
            "Timed" => GameMode::Timed,
            _ => GameMode::Endless,
        }
    }
}

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Active driving
    Running,
    /// Frozen, resumable
    Paused,
    /// Run over (terminal until restart)
    Ended,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndCause {
    Collision,
    TimeUp,
}

/// Viewpoint, shifts the player vertically and adds the letterbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CameraMode {
    #[default]
    ThirdPerson,
    Cockpit,
}

impl CameraMode {
    pub fn toggled(self) -> Self {
        match self {
            CameraMode::ThirdPerson => CameraMode::Cockpit,
            CameraMode::Cockpit => CameraMode::ThirdPerson,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CameraMode::ThirdPerson => "Third-person",
            CameraMode::Cockpit => "Cockpit",
        }
    }

    /// Player center distance from the bottom edge
    pub fn player_offset(&self) -> f32 {
        match self {
            CameraMode::ThirdPerson => THIRD_PERSON_OFFSET,
            CameraMode::Cockpit => COCKPIT_OFFSET,
        }
    }
}

/// The player's car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// Continuous lane index in [0, lane_count - 1]
    pub lane: f32,
    /// Screen-space center, derived from `lane` every tick
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

impl PlayerState {
    pub fn new(lane: f32) -> Self {
        Self {
            lane,
            pos: Vec2::ZERO,
            width: CAR_WIDTH,
            height: CAR_HEIGHT,
        }
    }

    /// Recompute the screen position from the lane and live viewport
    pub fn place(&mut self, viewport: Viewport, camera: CameraMode) {
        self.pos = Vec2::new(
            viewport.lane_center_x(self.lane),
            viewport.height - camera.player_offset(),
        );
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(self.width, self.height))
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    Car,
    Cow,
}

impl ObstacleKind {
    /// Pick a kind from a uniform roll in [0, 1)
    pub fn from_roll(environment: Environment, roll: f32, cow_chance: f32) -> Self {
        if environment.has_cows() && roll < cow_chance {
            ObstacleKind::Cow
        } else {
            ObstacleKind::Car
        }
    }
}

/// Oncoming traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    /// Lane chosen at spawn; `pos.x` is fixed from it and never re-derived
    pub lane: u32,
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Own incoming speed (km/h), added to the player's to get closing speed
    pub approach_speed: f32,
    pub color: [f32; 4],
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(self.width, self.height))
    }
}

/// Road, player and traffic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldState {
    pub lane_count: u32,
    pub lane_width: f32,
    pub road_width: f32,
    pub player: PlayerState,
    pub obstacles: Vec<Obstacle>,
    pub environment: Environment,
    /// Meters driven this run
    pub traveled_distance: f32,
    /// Seconds until the next spawn batch
    pub spawn_countdown: f32,
    next_id: u32,
}

impl WorldState {
    pub fn new(environment: Environment, tuning: &Tuning) -> Self {
        let max_lane = (LANE_COUNT - 1) as f32;
        Self {
            lane_count: LANE_COUNT,
            lane_width: LANE_WIDTH,
            road_width: ROAD_WIDTH,
            player: PlayerState::new(tuning.start_lane.clamp(0.0, max_lane)),
            obstacles: Vec::new(),
            environment,
            traveled_distance: 0.0,
            spawn_countdown: 0.0,
            next_id: 1,
        }
    }

    /// Highest valid lane index
    pub fn max_lane(&self) -> f32 {
        (self.lane_count - 1) as f32
    }

    /// Allocate a new obstacle ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Per-run scalars the HUD shows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// km/h in [0, absolute_max_speed]
    pub speed: f32,
    /// Percent in [0, 100]
    pub nitro: f32,
    pub score: u64,
    /// Whole seconds left (Timed mode only)
    pub time_remaining: u32,
    pub phase: RunPhase,
    /// Seconds spent in `Running`
    pub play_time: f32,
    /// Nitro actually burned on the last tick
    pub nitro_active: bool,
}

impl RunState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            speed: tuning.initial_speed.clamp(0.0, tuning.absolute_max_speed),
            nitro: tuning.initial_nitro.clamp(0.0, 100.0),
            score: 0,
            time_remaining: tuning.timed_duration,
            phase: RunPhase::Running,
            play_time: 0.0,
            nitro_active: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    /// Move to `Ended`, returning the score only on the first transition
    pub fn finish(&mut self) -> Option<u64> {
        if self.phase == RunPhase::Ended {
            return None;
        }
        self.phase = RunPhase::Ended;
        Some(self.score)
    }
}

/// Events emitted by a tick for the driver to act on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ObstaclesSpawned { count: u32 },
    PhaseChanged(RunPhase),
    CameraChanged(CameraMode),
    /// Emitted exactly once per run
    RunEnded { score: u64, cause: EndCause },
}

/// Everything one run owns
#[derive(Debug, Clone)]
pub struct SimContext {
    pub mode: GameMode,
    pub camera: CameraMode,
    pub tuning: Tuning,
    pub world: WorldState,
    pub run: RunState,
    pub seed: u64,
    pub rng: Pcg32,
}

impl SimContext {
    pub fn new(mode: GameMode, environment: Environment, tuning: Tuning, seed: u64) -> Self {
        Self {
            mode,
            camera: CameraMode::default(),
            world: WorldState::new(environment, &tuning),
            run: RunState::new(&tuning),
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Fresh world and run with the same mode, environment and camera
    pub fn reset(&mut self, seed: u64) {
        self.world = WorldState::new(self.world.environment, &self.tuning);
        self.run = RunState::new(&self.tuning);
        self.seed = seed;
        self.rng = Pcg32::seed_from_u64(seed);
    }
}
