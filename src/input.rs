//! Input sampling
//!
//! Keyboard and on-screen controls write "held" flags as events arrive; the
//! driver takes one `InputSnapshot` per frame. Camera and pause are edges:
//! one press fires once, however long the key stays down.

use serde::{Deserialize, Serialize};

/// Keys the game reacts to, by DOM `KeyboardEvent.code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    ArrowLeft,
    ArrowRight,
    KeyW,
    KeyS,
    Space,
    KeyC,
    Escape,
}

impl KeyCode {
    /// Unmapped codes return None and are ignored
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" => Some(KeyCode::ArrowLeft),
            "ArrowRight" => Some(KeyCode::ArrowRight),
            "KeyW" => Some(KeyCode::KeyW),
            "KeyS" => Some(KeyCode::KeyS),
            "Space" => Some(KeyCode::Space),
            "KeyC" => Some(KeyCode::KeyC),
            "Escape" => Some(KeyCode::Escape),
            _ => None,
        }
    }
}

/// Hold-style controls, shared by keys and on-screen buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    SteerLeft,
    SteerRight,
    Accelerate,
    Brake,
    Nitro,
}

impl Control {
    /// On-screen button element id for this control
    pub fn button_id(&self) -> &'static str {
        match self {
            Control::SteerLeft => "btn-left",
            Control::SteerRight => "btn-right",
            Control::Accelerate => "btn-accel",
            Control::Brake => "btn-brake",
            Control::Nitro => "btn-nitro",
        }
    }

    pub const ALL: [Control; 5] = [
        Control::SteerLeft,
        Control::SteerRight,
        Control::Accelerate,
        Control::Brake,
        Control::Nitro,
    ];
}

/// What the player intends this frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    pub steer_left: bool,
    pub steer_right: bool,
    pub accelerate: bool,
    pub brake: bool,
    pub nitro: bool,
    /// Camera toggle pressed since the last snapshot
    pub toggle_camera: bool,
    /// Pause toggle pressed since the last snapshot
    pub toggle_pause: bool,
    /// Speed slider moved since the last snapshot (km/h)
    pub speed_override: Option<f32>,
}

impl InputSnapshot {
    /// Lane offset the player is steering toward (-1, 0 or 1)
    pub fn steer_axis(&self) -> f32 {
        (self.steer_right as i32 - self.steer_left as i32) as f32
    }
}

/// Accumulates device events between frames
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    held: InputSnapshot,
    toggle_camera: bool,
    toggle_pause: bool,
    speed_override: Option<f32>,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a keydown; auto-repeat events are dropped entirely
    pub fn key_down(&mut self, code: &str, repeat: bool) {
        if repeat {
            return;
        }
        let Some(key) = KeyCode::from_code(code) else {
            return;
        };
        match key {
            KeyCode::KeyC => self.toggle_camera = true,
            KeyCode::Escape => self.toggle_pause = true,
            _ => self.set_key(key, true),
        }
    }

    pub fn key_up(&mut self, code: &str) {
        if let Some(key) = KeyCode::from_code(code) {
            self.set_key(key, false);
        }
    }

    fn set_key(&mut self, key: KeyCode, down: bool) {
        let control = match key {
            KeyCode::ArrowLeft => Control::SteerLeft,
            KeyCode::ArrowRight => Control::SteerRight,
            KeyCode::KeyW => Control::Accelerate,
            KeyCode::KeyS => Control::Brake,
            KeyCode::Space => Control::Nitro,
            KeyCode::KeyC | KeyCode::Escape => return,
        };
        self.set_control(control, down);
    }

    /// Touch/mouse press on an on-screen control
    pub fn press(&mut self, control: Control) {
        self.set_control(control, true);
    }

    pub fn release(&mut self, control: Control) {
        self.set_control(control, false);
    }

    fn set_control(&mut self, control: Control, down: bool) {
        match control {
            Control::SteerLeft => self.held.steer_left = down,
            Control::SteerRight => self.held.steer_right = down,
            Control::Accelerate => self.held.accelerate = down,
            Control::Brake => self.held.brake = down,
            Control::Nitro => self.held.nitro = down,
        }
    }

    /// Pause/resume button
    pub fn request_pause_toggle(&mut self) {
        self.toggle_pause = true;
    }

    pub fn request_camera_toggle(&mut self) {
        self.toggle_camera = true;
    }

    /// Speed slider position (km/h); the latest value wins
    pub fn set_speed_slider(&mut self, kmh: f32) {
        if kmh.is_finite() {
            self.speed_override = Some(kmh);
        }
    }

    /// Drop all held controls (focus lost, run restarted)
    pub fn release_all(&mut self) {
        self.held = InputSnapshot::default();
    }

    /// Read this frame's intent and consume pending edges
    pub fn snapshot(&mut self) -> InputSnapshot {
        InputSnapshot {
            toggle_camera: std::mem::take(&mut self.toggle_camera),
            toggle_pause: std::mem::take(&mut self.toggle_pause),
            speed_override: self.speed_override.take(),
            ..self.held
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_and_release() {
        let mut input = InputSampler::new();
        input.key_down("ArrowLeft", false);
        input.key_down("KeyW", false);
        let snap = input.snapshot();
        assert!(snap.steer_left && snap.accelerate);
        // Held flags persist across snapshots
        assert!(input.snapshot().steer_left);
        input.key_up("ArrowLeft");
        let snap = input.snapshot();
        assert!(!snap.steer_left && snap.accelerate);
    }

    #[test]
    fn test_toggles_fire_once_per_press() {
        let mut input = InputSampler::new();
        input.key_down("KeyC", false);
        // Auto-repeat while the key stays down
        input.key_down("KeyC", true);
        input.key_down("KeyC", true);
        assert!(input.snapshot().toggle_camera);
        assert!(!input.snapshot().toggle_camera);

        input.key_down("Escape", false);
        let snap = input.snapshot();
        assert!(snap.toggle_pause);
        assert!(!snap.toggle_camera);
        assert!(!input.snapshot().toggle_pause);
    }

    #[test]
    fn test_repeat_keydown_is_ignored() {
        let mut input = InputSampler::new();
        input.key_down("Space", true);
        assert!(!input.snapshot().nitro);
    }

    #[test]
    fn test_unmapped_keys_ignored() {
        let mut input = InputSampler::new();
        input.key_down("KeyQ", false);
        input.key_up("F5");
        assert_eq!(input.snapshot(), InputSnapshot::default());
    }

    #[test]
    fn test_touch_matches_keyboard() {
        let mut keys = InputSampler::new();
        let mut touch = InputSampler::new();
        keys.key_down("ArrowRight", false);
        keys.key_down("KeyS", false);
        keys.key_down("Space", false);
        touch.press(Control::SteerRight);
        touch.press(Control::Brake);
        touch.press(Control::Nitro);
        assert_eq!(keys.snapshot(), touch.snapshot());

        touch.release(Control::Nitro);
        assert!(!touch.snapshot().nitro);
    }

    #[test]
    fn test_speed_slider_consumed_once() {
        let mut input = InputSampler::new();
        input.set_speed_slider(80.0);
        input.set_speed_slider(200.0);
        assert_eq!(input.snapshot().speed_override, Some(200.0));
        assert_eq!(input.snapshot().speed_override, None);
        input.set_speed_slider(f32::NAN);
        assert_eq!(input.snapshot().speed_override, None);
    }

    #[test]
    fn test_steer_axis() {
        let mut snap = InputSnapshot::default();
        assert_eq!(snap.steer_axis(), 0.0);
        snap.steer_left = true;
        assert_eq!(snap.steer_axis(), -1.0);
        snap.steer_right = true;
        assert_eq!(snap.steer_axis(), 0.0);
    }

    #[test]
    fn test_release_all() {
        let mut input = InputSampler::new();
        for control in Control::ALL {
            input.press(control);
        }
        input.release_all();
        assert_eq!(input.snapshot(), InputSnapshot::default());
    }
}
