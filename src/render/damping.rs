//! Critically damped smoothing toward a moving target.
//!
//! Each step advances by the real frame delta, so the curve is the same at
//! 30 Hz and 144 Hz. Values within [`SETTLE_EPSILON`] of their target snap
//! onto it and report settled.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

pub const SETTLE_EPSILON: f32 = 0.001;
const MIN_SMOOTH_TIME: f32 = 0.0001;

/// One critically damped step for a scalar. Returns true while still moving.
pub fn smooth_damp(
    current: &mut f32,
    velocity: &mut f32,
    target: f32,
    smooth_time: f32,
    dt: f32,
) -> bool {
    if !dt.is_finite() || dt <= 0.0 {
        return (*current - target).abs() > SETTLE_EPSILON;
    }
    if (*current - target).abs() <= SETTLE_EPSILON {
        *current = target;
        *velocity = 0.0;
        return false;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = *current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Never overshoot.
    if (target - *current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    *current = output;
    true
}

/// Wraps an angle difference into `[-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return angle;
    }
    (angle + PI).rem_euclid(TAU) - PI
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DampedVec3 {
    value: Vec3,
    velocity: Vec3,
}

impl DampedVec3 {
    pub fn new(value: Vec3) -> Self {
        Self {
            value,
            velocity: Vec3::ZERO,
        }
    }

    pub fn value(&self) -> Vec3 {
        self.value
    }

    pub fn step(&mut self, target: Vec3, smooth_time: f32, dt: f32) -> bool {
        let mut moving = false;
        for axis in 0..3 {
            moving |= smooth_damp(
                &mut self.value[axis],
                &mut self.velocity[axis],
                target[axis],
                smooth_time,
                dt,
            );
        }
        moving
    }
}

/// Euler angles damped along the shortest arc per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DampedEuler {
    value: Vec3,
    velocity: Vec3,
}

impl DampedEuler {
    pub fn new(value: Vec3) -> Self {
        Self {
            value,
            velocity: Vec3::ZERO,
        }
    }

    pub fn value(&self) -> Vec3 {
        self.value
    }

    pub fn step(&mut self, target: Vec3, smooth_time: f32, dt: f32) -> bool {
        let mut moving = false;
        for axis in 0..3 {
            let current = self.value[axis];
            let nearest = current + wrap_angle(target[axis] - current);
            moving |= smooth_damp(
                &mut self.value[axis],
                &mut self.velocity[axis],
                nearest,
                smooth_time,
                dt,
            );
        }
        moving
    }
}
