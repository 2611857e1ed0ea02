//! Keyboard, pointer and gamepad state.
//!
//! The simulation never listens to devices. The host captures events however
//! it likes and hands the core an [`InputSnapshot`] before each frame; systems
//! treat it as read-only.
//!
//! Key codes are DOM `KeyboardEvent.code` names (`"KeyW"`, `"Space"`).
//! Pointer coordinates are normalized device coordinates: `(0, 0)` is the
//! center of the view, `+y` is up, the edges are at `±1`.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyState {
    pub down: bool,
    /// Host timestamp of the last transition, in milliseconds.
    pub at: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub down: bool,
    pub at: f64,
}

impl PointerState {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonState {
    pub pressed: bool,
    pub touched: bool,
    pub value: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamepadState {
    pub axes: Vec<f32>,
    pub buttons: Vec<ButtonState>,
    pub connected: bool,
}

impl GamepadState {
    /// Read a two-axis stick in world orientation (`+y` up; gamepads report
    /// `+y` down). Returns `None` when either axis is missing.
    pub fn stick(&self, axes: [usize; 2]) -> Option<Vec2> {
        let x = *self.axes.get(axes[0])?;
        let y = *self.axes.get(axes[1])?;
        Some(Vec2::new(x, -y))
    }
}

/// Input state for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    pub keys: HashMap<String, KeyState>,
    pub pointers: HashMap<u32, PointerState>,
    pub gamepads: Vec<GamepadState>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the key is currently held down.
    pub fn pressed(&self, code: &str) -> bool {
        self.keys.get(code).is_some_and(|k| k.down)
    }

    pub fn pointer(&self, id: u32) -> Option<&PointerState> {
        self.pointers.get(&id)
    }

    /// Returns `true` if the pointer is known and pressed.
    pub fn pointer_down(&self, id: u32) -> bool {
        self.pointer(id).is_some_and(|p| p.down)
    }

    /// The first stick deflection past `deadzone` among connected gamepads.
    pub fn stick(&self, axes: [usize; 2], deadzone: f32) -> Option<Vec2> {
        self.gamepads
            .iter()
            .filter(|pad| pad.connected)
            .filter_map(|pad| pad.stick(axes))
            .find(|v| v.length() > deadzone)
    }

    // ── Host-side writers ────────────────────────────────────────────

    /// Record a key press.
    pub fn press(&mut self, code: &str, at: f64) {
        self.keys.insert(code.to_string(), KeyState { down: true, at });
    }

    /// Record a key release.
    pub fn release(&mut self, code: &str, at: f64) {
        self.keys.insert(code.to_string(), KeyState { down: false, at });
    }

    /// Record a pointer position and button state.
    pub fn set_pointer(&mut self, id: u32, position: Vec2, down: bool, at: f64) {
        self.pointers.insert(
            id,
            PointerState {
                x: position.x,
                y: position.y,
                down,
                at,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_and_release() {
        let mut input = InputSnapshot::new();
        assert!(!input.pressed("KeyW"));
        input.press("KeyW", 10.0);
        assert!(input.pressed("KeyW"));
        input.release("KeyW", 20.0);
        assert!(!input.pressed("KeyW"));
        assert_eq!(input.keys["KeyW"].at, 20.0);
    }

    #[test]
    fn pointer_down_requires_known_pointer() {
        let mut input = InputSnapshot::new();
        assert!(!input.pointer_down(1));
        input.set_pointer(1, Vec2::new(0.5, -0.5), true, 0.0);
        assert!(input.pointer_down(1));
        assert_eq!(input.pointer(1).unwrap().position(), Vec2::new(0.5, -0.5));
    }

    #[test]
    fn stick_respects_deadzone_and_connection() {
        let mut input = InputSnapshot::new();
        input.gamepads.push(GamepadState {
            axes: vec![0.0, 0.0, 0.1, 0.0],
            buttons: Vec::new(),
            connected: true,
        });
        assert_eq!(input.stick([2, 3], 0.2), None);

        input.gamepads.push(GamepadState {
            axes: vec![0.0, 0.0, 0.0, 0.9],
            buttons: Vec::new(),
            connected: false,
        });
        assert_eq!(input.stick([2, 3], 0.2), None);

        input.gamepads[0].axes[3] = 0.5;
        // Gamepad +y is down; world +y is up.
        assert_eq!(input.stick([2, 3], 0.2), Some(Vec2::new(0.1, -0.5)));
    }

    #[test]
    fn deserializes_from_host_json() {
        let input: InputSnapshot = serde_json::from_str(
            r#"{
                "keys": { "Space": { "down": true, "at": 12.5 } },
                "pointers": { "1": { "x": 0.1, "y": 0.2, "down": false, "at": 3.0 } }
            }"#,
        )
        .unwrap();
        assert!(input.pressed("Space"));
        assert!(!input.pointer_down(1));
        assert!(input.gamepads.is_empty());
    }
}
