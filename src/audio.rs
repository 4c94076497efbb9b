//! Engine and nitro tone feedback
//!
//! Two continuous oscillators follow the car: an engine drone whose pitch
//! tracks speed and a nitro whine while the boost burns. Targets are
//! approached with a time constant (Web Audio `setTargetAtTime`) so jumps in
//! speed glide instead of clicking. Audio is a one-way sink: nothing here is
//! read back by the simulation, and a missing audio device just means silence.

use crate::sim::RunPhase;

/// Engine gain while driving
pub const ENGINE_GAIN: f32 = 0.04;
/// Nitro gain while boosting
pub const NITRO_GAIN: f32 = 0.03;
/// Nitro whine pitch
pub const NITRO_HZ: f32 = 440.0;

/// Smoothing time constants (seconds)
pub const ENGINE_FREQ_TAU: f32 = 0.05;
pub const ENGINE_GAIN_TAU: f32 = 0.1;
pub const NITRO_ATTACK_TAU: f32 = 0.02;
pub const NITRO_RELEASE_TAU: f32 = 0.2;

/// A target value plus how quickly to approach it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub value: f32,
    pub tau: f32,
}

/// Desired tone parameters for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneTargets {
    pub engine_freq: Target,
    pub engine_gain: Target,
    pub nitro_freq: Target,
    pub nitro_gain: Target,
}

impl ToneTargets {
    /// Map run state to tone targets
    pub fn for_state(speed: f32, nitro_engaged: bool, phase: RunPhase, volume: f32) -> Self {
        let running = phase == RunPhase::Running;
        let engine_gain = if running { ENGINE_GAIN } else { 0.0 };
        let boosting = running && nitro_engaged;
        let nitro_tau = if boosting {
            NITRO_ATTACK_TAU
        } else {
            NITRO_RELEASE_TAU
        };

        Self {
            engine_freq: Target {
                value: engine_frequency(speed),
                tau: ENGINE_FREQ_TAU,
            },
            engine_gain: Target {
                value: engine_gain * volume,
                tau: ENGINE_GAIN_TAU,
            },
            nitro_freq: Target {
                value: if boosting { NITRO_HZ } else { 0.0 },
                tau: nitro_tau,
            },
            nitro_gain: Target {
                value: if boosting { NITRO_GAIN * volume } else { 0.0 },
                tau: nitro_tau,
            },
        }
    }
}

/// Engine pitch: 60 Hz idle, +220 Hz per 200 km/h
#[inline]
pub fn engine_frequency(speed: f32) -> f32 {
    60.0 + (speed / 200.0) * 220.0
}

/// Destination for tone targets
pub trait AudioSink {
    /// Glide toward `targets`; `dt` is the frame time in seconds
    fn update(&mut self, targets: &ToneTargets, dt: f32);

    /// Stop oscillators and free the audio graph; safe to call twice
    fn release(&mut self);

    /// Restart output blocked by autoplay rules (needs a user gesture)
    fn resume(&mut self) {}
}

/// Silent sink for headless runs and platforms without audio
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn update(&mut self, _targets: &ToneTargets, _dt: f32) {}
    fn release(&mut self) {}
}

/// Exponential approach matching `AudioParam.setTargetAtTime`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SmoothedParam {
    pub value: f32,
}

impl SmoothedParam {
    pub const fn new(value: f32) -> Self {
        Self { value }
    }

    /// Move toward `target`, covering 1 - e^(-dt/tau) of the remaining gap
    pub fn approach(&mut self, target: Target, dt: f32) {
        if target.tau <= 0.0 {
            self.value = target.value;
            return;
        }
        let k = 1.0 - (-dt.max(0.0) / target.tau).exp();
        self.value += (target.value - self.value) * k;
    }
}

/// Software model of the two-oscillator graph
///
/// Used natively (headless demo, tests) where there is no Web Audio.
#[derive(Debug, Clone, Default)]
pub struct ToneModel {
    pub engine_freq: SmoothedParam,
    pub engine_gain: SmoothedParam,
    pub nitro_freq: SmoothedParam,
    pub nitro_gain: SmoothedParam,
    pub released: bool,
}

impl ToneModel {
    /// Same starting point as the Web Audio graph
    pub fn new() -> Self {
        Self {
            engine_freq: SmoothedParam::new(80.0),
            engine_gain: SmoothedParam::new(ENGINE_GAIN),
            nitro_freq: SmoothedParam::new(0.0),
            nitro_gain: SmoothedParam::new(0.0),
            released: false,
        }
    }
}

impl AudioSink for ToneModel {
    fn update(&mut self, targets: &ToneTargets, dt: f32) {
        if self.released {
            return;
        }
        self.engine_freq.approach(targets.engine_freq, dt);
        self.engine_gain.approach(targets.engine_gain, dt);
        self.nitro_freq.approach(targets.nitro_freq, dt);
        self.nitro_gain.approach(targets.nitro_gain, dt);
    }

    fn release(&mut self) {
        self.released = true;
        self.engine_gain.value = 0.0;
        self.nitro_gain.value = 0.0;
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioEngine;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, ENGINE_GAIN, Target, ToneTargets};

    /// Oscillator + gain pair wired to the destination
    struct Voice {
        osc: OscillatorNode,
        gain: GainNode,
    }

    /// Web Audio backed engine/nitro tones
    pub struct WebAudioEngine {
        ctx: Option<AudioContext>,
        engine: Option<Voice>,
        nitro: Option<Voice>,
    }

    impl WebAudioEngine {
        pub fn new() -> Self {
            // May fail outside a secure context
            let Some(ctx) = AudioContext::new().ok() else {
                log::warn!("Failed to create AudioContext - audio disabled");
                return Self {
                    ctx: None,
                    engine: None,
                    nitro: None,
                };
            };

            let engine = create_voice(&ctx, OscillatorType::Sawtooth, 80.0, ENGINE_GAIN);
            let nitro = create_voice(&ctx, OscillatorType::Square, 0.0, 0.0);
            if engine.is_none() || nitro.is_none() {
                log::warn!("Failed to build oscillator graph - tones partially disabled");
            }

            Self {
                ctx: Some(ctx),
                engine,
                nitro,
            }
        }

        /// Resume audio context (required after user gesture)
        fn resume_if_suspended(&self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }
    }

    fn create_voice(
        ctx: &AudioContext,
        osc_type: OscillatorType,
        freq: f32,
        gain_value: f32,
    ) -> Option<Voice> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        gain.gain().set_value(gain_value);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;
        osc.start().ok()?;

        Some(Voice { osc, gain })
    }

    fn glide(param: &web_sys::AudioParam, target: Target, now: f64) {
        param
            .set_target_at_time(target.value, now, target.tau as f64)
            .ok();
    }

    impl AudioSink for WebAudioEngine {
        fn update(&mut self, targets: &ToneTargets, _dt: f32) {
            // Created before any gesture on page load; retry until it runs
            self.resume_if_suspended();
            let Some(ctx) = &self.ctx else { return };
            let now = ctx.current_time();
            if let Some(engine) = &self.engine {
                glide(&engine.osc.frequency(), targets.engine_freq, now);
                glide(&engine.gain.gain(), targets.engine_gain, now);
            }
            if let Some(nitro) = &self.nitro {
                glide(&nitro.osc.frequency(), targets.nitro_freq, now);
                glide(&nitro.gain.gain(), targets.nitro_gain, now);
            }
        }

        fn resume(&mut self) {
            self.resume_if_suspended();
        }

        fn release(&mut self) {
            for voice in [self.engine.take(), self.nitro.take()].into_iter().flatten() {
                voice.osc.stop().ok();
                voice.osc.disconnect().ok();
                voice.gain.disconnect().ok();
            }
            if let Some(ctx) = self.ctx.take() {
                let _ = ctx.close();
                log::info!("Audio released");
            }
        }
    }

    impl Drop for WebAudioEngine {
        fn drop(&mut self) {
            self.release();
        }
    }
}
