//! Input sampling and movement-intent derivation
//!
//! The horizontal axis turns the player, or strafes while the modifier is
//! held; the vertical axis moves forward and back. A dead player produces
//! no intent at all.

use macroquad::prelude::*;
use shared::{derive_intent, MovementIntent};

/// One frame's worth of sampled player input.
#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub intent: Option<MovementIntent>,
    pub fire: bool,
    pub reset_score: bool,
}

/// Samples the keyboard once per frame and turns it into commands.
pub struct InputManager {
    // Previous frame key states for edge detection
    prev_fire: bool,
    prev_reset: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_fire: false,
            prev_reset: false,
        }
    }

    /// Samples movement axes and command keys. `alive` comes from the
    /// replicated state; a dead player sends nothing but may still reset
    /// its score administratively.
    pub fn sample(&mut self, alive: bool) -> InputFrame {
        let fire_key = is_key_down(KeyCode::Space);
        let reset_key = is_key_down(KeyCode::R);

        // Detect key press events (current && !previous)
        let fire = fire_key && !self.prev_fire && alive;
        let reset_score = reset_key && !self.prev_reset;

        self.prev_fire = fire_key;
        self.prev_reset = reset_key;

        if !alive {
            return InputFrame {
                intent: None,
                fire: false,
                reset_score,
            };
        }

        let horizontal = axis(
            is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
        );
        let vertical = axis(
            is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
        );
        let strafe = is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift);

        InputFrame {
            intent: Some(derive_intent(horizontal, vertical, strafe)),
            fire,
            reset_score,
        }
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapses a key pair into a normalized axis value.
fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_values() {
        assert_eq!(axis(true, false), 1.0);
        assert_eq!(axis(false, true), -1.0);
        assert_eq!(axis(false, false), 0.0);
        assert_eq!(axis(true, true), 0.0);
    }

    #[test]
    fn test_input_manager_starts_unpressed() {
        let manager = InputManager::new();
        assert!(!manager.prev_fire);
        assert!(!manager.prev_reset);
    }

    #[test]
    fn test_input_frame_default_is_idle() {
        let frame = InputFrame::default();
        assert!(frame.intent.is_none());
        assert!(!frame.fire);
        assert!(!frame.reset_score);
    }
}
