use winit::keyboard::{KeyCode, PhysicalKey};

/// Radians per arrow-key press.
pub const NUDGE_STEP: f32 = 5.0 * std::f32::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyAction {
    None,
    Quit,
    Nudge { yaw: f32, pitch: f32 },
    ResetRotation,
    FlipView,
}

pub fn map_key(key: PhysicalKey, pressed: bool) -> KeyAction {
    if !pressed {
        return KeyAction::None;
    }
    match key {
        PhysicalKey::Code(KeyCode::Escape) => KeyAction::Quit,
        PhysicalKey::Code(KeyCode::ArrowLeft) => KeyAction::Nudge {
            yaw: -NUDGE_STEP,
            pitch: 0.0,
        },
        PhysicalKey::Code(KeyCode::ArrowRight) => KeyAction::Nudge {
            yaw: NUDGE_STEP,
            pitch: 0.0,
        },
        // Same direction as dragging up or down.
        PhysicalKey::Code(KeyCode::ArrowUp) => KeyAction::Nudge {
            yaw: 0.0,
            pitch: NUDGE_STEP,
        },
        PhysicalKey::Code(KeyCode::ArrowDown) => KeyAction::Nudge {
            yaw: 0.0,
            pitch: -NUDGE_STEP,
        },
        PhysicalKey::Code(KeyCode::KeyR) => KeyAction::ResetRotation,
        PhysicalKey::Code(KeyCode::KeyF) => KeyAction::FlipView,
        _ => KeyAction::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releases_do_nothing() {
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::Escape), false),
            KeyAction::None
        );
    }

    #[test]
    fn arrows_nudge_and_letters_map() {
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::ArrowRight), true),
            KeyAction::Nudge {
                yaw: NUDGE_STEP,
                pitch: 0.0
            }
        );
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::KeyF), true),
            KeyAction::FlipView
        );
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::KeyQ), true),
            KeyAction::None
        );
    }

    #[test]
    fn up_arrow_tilts_like_an_upward_drag() {
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::ArrowUp), true),
            KeyAction::Nudge {
                yaw: 0.0,
                pitch: NUDGE_STEP
            }
        );
        assert_eq!(
            map_key(PhysicalKey::Code(KeyCode::ArrowDown), true),
            KeyAction::Nudge {
                yaw: 0.0,
                pitch: -NUDGE_STEP
            }
        );
    }
}
