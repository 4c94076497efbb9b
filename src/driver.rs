//! Game loop driver
//!
//! A `Session` owns one run: the simulation context, the input sampler, the
//! audio sink and the high-score provider. Platform glue calls `frame` once
//! per display refresh and `countdown_tick` once per second; everything else
//! (scheduling, DOM, GPU) stays outside so the loop can be tested natively.

use serde::{Deserialize, Serialize};

use crate::Viewport;
use crate::audio::{AudioSink, ToneTargets};
use crate::catalog::{Environment, Vehicle};
use crate::consts::MAX_DT;
use crate::highscores::{HighScoreProvider, RunSummary};
use crate::input::InputSampler;
use crate::renderer::{Vertex, scene};
use crate::settings::Settings;
use crate::sim::{self, CameraMode, EndCause, GameEvent, GameMode, RunPhase, SimContext};
use crate::tuning::Tuning;

/// Construction parameters handed over by the menu
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub mode: GameMode,
    pub vehicle: Vehicle,
    pub environment: Environment,
    pub camera: CameraMode,
    /// Gain multiplier in [0, 1]
    pub volume: f32,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::default(),
            vehicle: Vehicle::default(),
            environment: Environment::default(),
            camera: CameraMode::default(),
            volume: 1.0,
            seed: 0,
        }
    }
}

impl RunConfig {
    pub fn from_settings(settings: &Settings, seed: u64) -> Self {
        Self {
            mode: settings.mode,
            vehicle: settings.vehicle,
            environment: settings.environment,
            camera: settings.camera,
            volume: settings.effective_volume(),
            seed,
        }
    }
}

/// Values the HUD shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hud {
    /// km/h, rounded
    pub speed: u32,
    /// Percent, rounded
    pub nitro: u32,
    pub mode: GameMode,
    /// Only in Timed mode
    pub time_remaining: Option<u32>,
    pub score: u64,
    pub best: u64,
    pub camera: &'static str,
    pub phase: RunPhase,
}

/// Output of one frame
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// None when nothing should be drawn (zero-sized viewport, shut down)
    pub scene: Option<Vec<Vertex>>,
    pub events: Vec<GameEvent>,
}

/// One run, from start to teardown
pub struct Session {
    config: RunConfig,
    tuning: Tuning,
    ctx: SimContext,
    input: InputSampler,
    audio: Box<dyn AudioSink>,
    scores: Box<dyn HighScoreProvider>,
    last_frame_ms: Option<f64>,
    reported: bool,
    shut_down: bool,
}

impl Session {
    pub fn new(
        config: RunConfig,
        tuning: Tuning,
        audio: Box<dyn AudioSink>,
        scores: Box<dyn HighScoreProvider>,
    ) -> Self {
        let ctx = new_context(&config, &tuning);
        log::info!(
            "Run started: {} / {} / {} (seed {})",
            config.mode.as_str(),
            config.vehicle.as_str(),
            config.environment.as_str(),
            config.seed
        );
        Self {
            config,
            tuning,
            ctx,
            input: InputSampler::new(),
            audio,
            scores,
            last_frame_ms: None,
            reported: false,
            shut_down: false,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Read-only view of the simulation
    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    /// Direct access for tests and tools that stage a scenario
    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// Device events land here between frames
    pub fn input_mut(&mut self) -> &mut InputSampler {
        &mut self.input
    }

    pub fn phase(&self) -> RunPhase {
        self.ctx.run.phase
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Run one display frame at wall-clock `now_ms`
    pub fn frame(&mut self, now_ms: f64, viewport: Viewport) -> Frame {
        if self.shut_down {
            return Frame::default();
        }

        let dt = self.frame_dt(now_ms);

        // Pending toggles wait for a frame that can actually run
        if viewport.is_empty() {
            self.update_audio(dt);
            return Frame::default();
        }

        let input = self.input.snapshot();
        let events = sim::step(&mut self.ctx, &input, dt, viewport);
        for event in &events {
            self.handle_event(event);
        }

        self.update_audio(dt);

        Frame {
            scene: scene::build(&self.ctx, self.config.vehicle, viewport, now_ms),
            events,
        }
    }

    /// Seconds since the previous frame, clamped to [0, MAX_DT]
    fn frame_dt(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => 0.0,
        };
        if now_ms.is_finite() {
            self.last_frame_ms = Some(now_ms);
        }
        if dt.is_finite() { dt.clamp(0.0, MAX_DT) } else { 0.0 }
    }

    fn update_audio(&mut self, dt: f32) {
        let targets = ToneTargets::for_state(
            self.ctx.run.speed,
            self.ctx.run.nitro_active,
            self.ctx.run.phase,
            self.config.volume,
        );
        self.audio.update(&targets, dt);
    }

    /// Whether the one-second Timed countdown should be running right now
    pub fn countdown_armed(&self) -> bool {
        !self.shut_down && self.ctx.mode == GameMode::Timed && self.ctx.run.is_running()
    }

    /// Called by the one-second timer
    pub fn countdown_tick(&mut self) -> Option<GameEvent> {
        if self.shut_down {
            return None;
        }
        let event = sim::countdown_tick(&mut self.ctx)?;
        self.handle_event(&event);
        Some(event)
    }

    fn handle_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::RunEnded { score, cause } => self.report(score, cause),
            GameEvent::PhaseChanged(RunPhase::Paused) => log::info!("Paused"),
            GameEvent::PhaseChanged(RunPhase::Running) => log::info!("Resumed"),
            GameEvent::CameraChanged(camera) => log::info!("Camera: {}", camera.label()),
            GameEvent::PhaseChanged(RunPhase::Ended) | GameEvent::ObstaclesSpawned { .. } => {}
        }
    }

    /// Hand the final score to the provider, once per run
    fn report(&mut self, score: u64, cause: EndCause) {
        if self.reported {
            return;
        }
        self.reported = true;
        let new_best = self.scores.record(RunSummary {
            score,
            mode: self.ctx.mode,
            environment: self.ctx.world.environment,
        });
        log::info!(
            "Run ended ({:?}): score {}{}",
            cause,
            score,
            if new_best { " - new best!" } else { "" }
        );
    }

    /// Pause/resume; applied on the next frame like any other toggle
    pub fn toggle_pause(&mut self) {
        self.input.request_pause_toggle();
    }

    /// Pause right now, without waiting for a frame
    ///
    /// Hidden tabs get no animation frames, so a queued toggle would never
    /// land while the countdown interval keeps firing.
    pub fn pause(&mut self) -> Option<GameEvent> {
        if self.shut_down || !self.ctx.run.is_running() {
            return None;
        }
        self.ctx.run.phase = RunPhase::Paused;
        self.ctx.run.nitro_active = false;
        let event = GameEvent::PhaseChanged(RunPhase::Paused);
        self.handle_event(&event);
        Some(event)
    }

    /// Retry starting audio output; call from user gesture handlers
    pub fn resume_audio(&mut self) {
        if !self.shut_down {
            self.audio.resume();
        }
    }

    /// Fresh run with the same mode, vehicle and environment
    pub fn restart(&mut self, seed: u64) {
        self.ctx.reset(seed);
        self.config.seed = seed;
        self.input.release_all();
        self.last_frame_ms = None;
        self.reported = false;
        log::info!("Run restarted with seed: {}", seed);
    }

    /// New mode, vehicle or environment: rebuild everything
    pub fn reconfigure(&mut self, config: RunConfig) {
        self.ctx = new_context(&config, &self.tuning);
        self.config = config;
        self.input = InputSampler::new();
        self.last_frame_ms = None;
        self.reported = false;
        log::info!(
            "Run reconfigured: {} / {} / {}",
            config.mode.as_str(),
            config.vehicle.as_str(),
            config.environment.as_str()
        );
    }

    pub fn hud(&self) -> Hud {
        let run = &self.ctx.run;
        Hud {
            speed: run.speed.round() as u32,
            nitro: run.nitro.round() as u32,
            mode: self.ctx.mode,
            time_remaining: (self.ctx.mode == GameMode::Timed).then_some(run.time_remaining),
            score: run.score,
            best: self.scores.best().max(run.score),
            camera: self.ctx.camera.label(),
            phase: run.phase,
        }
    }

    /// Release audio and stop accepting frames; safe to call repeatedly
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.audio.release();
        self.input.release_all();
        log::info!("Session shut down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn new_context(config: &RunConfig, tuning: &Tuning) -> SimContext {
    let mut ctx = SimContext::new(
        config.mode,
        config.environment,
        tuning.clone(),
        config.seed,
    );
    ctx.camera = config.camera;
    ctx
}
