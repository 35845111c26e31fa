use crate::render::damping::DampedVec3;
use glam::Vec3;

pub const CAMERA_SMOOTH_TIME: f32 = 0.25;
const WIDE_BREAKPOINT: f32 = 1260.0;
const NARROW_BREAKPOINT: f32 = 600.0;

/// Where the camera should sit for the current screen and layout. `width` is
/// the viewport width in logical pixels.
pub fn camera_target(intro: bool, width: f32) -> Vec3 {
    if intro {
        if width <= NARROW_BREAKPOINT {
            Vec3::new(0.0, 0.2, 2.5)
        } else if width <= WIDE_BREAKPOINT {
            Vec3::new(0.0, 0.0, 2.0)
        } else {
            Vec3::new(-0.4, 0.0, 2.0)
        }
    } else if width <= NARROW_BREAKPOINT {
        Vec3::new(0.0, 0.0, 2.5)
    } else {
        Vec3::new(0.0, 0.0, 2.0)
    }
}

/// Camera position easing toward the breakpoint target.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    position: DampedVec3,
}

impl CameraRig {
    pub fn new(intro: bool, width: f32) -> Self {
        Self {
            position: DampedVec3::new(camera_target(intro, width)),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position.value()
    }

    /// Returns true while the camera is still moving.
    pub fn update(&mut self, intro: bool, width: f32, dt: f32) -> bool {
        self.position
            .step(camera_target(intro, width), CAMERA_SMOOTH_TIME, dt)
    }
}
