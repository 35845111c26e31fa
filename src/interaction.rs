//! Pointer-driven garment rotation.
//!
//! In manual mode a drag accumulates yaw/pitch and writes it back to the
//! store as [`Intent::SetManualRotation`]. Outside a drag, and always in
//! automatic mode, the pointer only feeds the ambient parallax target that
//! the damper reads each frame; nothing is persisted.

use crate::store::{GarmentState, Intent, RotationMode, StateChange};
use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Radians per pointer pixel.
pub const DRAG_SENSITIVITY: f32 = 0.005;
pub const PITCH_LIMIT: f32 = FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last: Vec2 },
}

#[derive(Debug, Clone)]
pub struct InteractionController {
    drag: DragState,
    /// x = pitch, y = yaw.
    accumulator: Vec2,
    /// Pointer in normalized device coordinates, y up, `[-1, 1]` on both axes.
    pointer: Vec2,
    sensitivity: f32,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(DRAG_SENSITIVITY)
    }
}

impl InteractionController {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            drag: DragState::Idle,
            accumulator: Vec2::ZERO,
            pointer: Vec2::ZERO,
            sensitivity,
        }
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Starts a drag when the garment is in manual mode. Returns whether a
    /// drag began.
    pub fn pointer_down(&mut self, position: Vec2, state: &GarmentState) -> bool {
        if state.rotation_mode != RotationMode::Manual {
            return false;
        }
        self.seed(state);
        self.drag = DragState::Dragging { last: position };
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Pointer moved to `position` (logical pixels) inside a viewport of
    /// `viewport` size.
    pub fn pointer_moved(
        &mut self,
        position: Vec2,
        viewport: Vec2,
        state: &GarmentState,
    ) -> Option<Intent> {
        if viewport.x > 0.0 && viewport.y > 0.0 {
            self.pointer = Vec2::new(
                position.x / viewport.x * 2.0 - 1.0,
                -(position.y / viewport.y) * 2.0 + 1.0,
            )
            .clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        }
        let DragState::Dragging { last } = self.drag else {
            return None;
        };
        self.drag = DragState::Dragging { last: position };
        self.drag_by(position - last, state)
    }

    /// Moves the drag anchor without rotating. Used when the cursor re-enters
    /// the window after a drag continued outside it.
    pub fn reanchor(&mut self, position: Vec2) {
        if let DragState::Dragging { .. } = self.drag {
            self.drag = DragState::Dragging { last: position };
        }
    }

    /// Raw pointer motion, used while the cursor is outside the window.
    pub fn pointer_delta(&mut self, delta: Vec2, state: &GarmentState) -> Option<Intent> {
        let DragState::Dragging { last } = self.drag else {
            return None;
        };
        self.drag = DragState::Dragging {
            last: last + delta,
        };
        self.drag_by(delta, state)
    }

    /// Keyboard nudge in radians; same clamping as a drag.
    pub fn nudge(&mut self, yaw: f32, pitch: f32, state: &GarmentState) -> Option<Intent> {
        if state.rotation_mode != RotationMode::Manual {
            return None;
        }
        if !self.is_dragging() {
            self.seed(state);
        }
        self.accumulator.y += yaw;
        self.accumulator.x = (self.accumulator.x + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Some(self.rotation_intent(state))
    }

    pub fn on_state_change(&mut self, change: &StateChange) {
        match change {
            StateChange::RotationMode(RotationMode::Automatic) => {
                if self.is_dragging() {
                    log::debug!("Rotation mode left manual mid-drag; ending drag");
                }
                self.drag = DragState::Idle;
            }
            StateChange::ModelSelected { .. } => {
                self.accumulator = Vec2::ZERO;
            }
            _ => {}
        }
    }

    /// Rotation the garment drifts toward when it is not under manual control.
    pub fn ambient_target(&self) -> Vec3 {
        Vec3::new(self.pointer.y / 7.0, -self.pointer.x / 2.0, 0.0)
    }

    /// Stored pitch may sit outside the drag range when set from a slider.
    fn seed(&mut self, state: &GarmentState) {
        self.accumulator = Vec2::new(
            state.manual_rotation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            state.manual_rotation.y,
        );
    }

    fn drag_by(&mut self, delta: Vec2, state: &GarmentState) -> Option<Intent> {
        if state.rotation_mode != RotationMode::Manual {
            self.drag = DragState::Idle;
            return None;
        }
        if delta == Vec2::ZERO {
            return None;
        }
        self.accumulator.y += delta.x * self.sensitivity;
        self.accumulator.x -= delta.y * self.sensitivity;
        self.accumulator.x = self.accumulator.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Some(self.rotation_intent(state))
    }

    fn rotation_intent(&self, state: &GarmentState) -> Intent {
        Intent::SetManualRotation(Vec3::new(
            self.accumulator.x,
            self.accumulator.y,
            state.manual_rotation.z,
        ))
    }
}
