mod camera;
pub mod damping;

pub use camera::{camera_target, CameraRig, CAMERA_SMOOTH_TIME};
pub use damping::{DampedEuler, DampedVec3};

use crate::config::{DecalTarget, GarmentId};
use crate::scene::{FramePose, FrameScene, GarmentVisual};
use crate::store::{GarmentState, RotationMode};
use glam::Vec3;

pub const COLOR_SMOOTH_TIME: f32 = 0.25;
pub const MANUAL_ROTATION_SMOOTH_TIME: f32 = 0.1;
pub const AMBIENT_ROTATION_SMOOTH_TIME: f32 = 0.2;

/// Tessellated control panels for one frame.
#[derive(Default)]
pub struct UiFrame {
    pub clipped_primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
    pub screen_size_px: [u32; 2],
}

/// Receives one declarative scene per frame and owns all GPU work.
pub trait RenderSurface {
    fn resize(&mut self, width: u32, height: u32);
    fn present(&mut self, scene: &FrameScene, ui: &UiFrame);
}

#[derive(Debug, Clone, PartialEq)]
struct SceneSummary {
    model: GarmentId,
    visual: &'static str,
    mesh: Option<String>,
    material: Option<String>,
    decals: Vec<DecalTarget>,
}

impl SceneSummary {
    fn of(scene: &FrameScene) -> Self {
        let (visual, mesh, material) = match &scene.visual {
            GarmentVisual::Loading => ("loading", None, None),
            GarmentVisual::Error { .. } => ("error", None, None),
            GarmentVisual::Mesh(resolved) => (
                "mesh",
                resolved.geometry.geometry().map(|geometry| geometry.node.clone()),
                resolved.material.name().map(str::to_string),
            ),
        };
        Self {
            model: scene.model,
            visual,
            mesh,
            material,
            decals: scene.decals.decals.iter().map(|decal| decal.target).collect(),
        }
    }
}

/// Surface that reports what it would draw through `log`.
#[derive(Debug, Default)]
pub struct LogSurface {
    size: (u32, u32),
    frames: u64,
    last: Option<SceneSummary>,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderSurface for LogSurface {
    fn resize(&mut self, width: u32, height: u32) {
        if self.size != (width, height) {
            log::debug!("Surface resized to {width}x{height}");
        }
        self.size = (width, height);
    }

    fn present(&mut self, scene: &FrameScene, ui: &UiFrame) {
        self.frames += 1;
        log::trace!(
            "Frame {}: {} ui primitives at {:.2} ppp",
            self.frames,
            ui.clipped_primitives.len(),
            ui.pixels_per_point
        );
        let summary = SceneSummary::of(scene);
        if self.last.as_ref() == Some(&summary) {
            return;
        }
        match &scene.visual {
            GarmentVisual::Error { reason } => {
                log::warn!("Showing fallback cube for {}: {reason}", summary.model)
            }
            _ => log::info!(
                "Scene: {} {} mesh={} material={} decals={:?}",
                summary.model,
                summary.visual,
                summary.mesh.as_deref().unwrap_or("-"),
                summary.material.as_deref().unwrap_or("synthesized"),
                summary.decals
            ),
        }
        self.last = Some(summary);
    }
}

/// Per-frame smoothing of everything that visibly moves.
#[derive(Debug, Clone, Copy)]
pub struct FrameDamper {
    color: DampedVec3,
    garment_rotation: DampedEuler,
    rig_rotation: DampedEuler,
    camera: CameraRig,
}

impl FrameDamper {
    pub fn new(state: &GarmentState, viewport_width: f32) -> Self {
        Self {
            color: DampedVec3::new(state.base_color.to_vec3()),
            garment_rotation: DampedEuler::default(),
            rig_rotation: DampedEuler::default(),
            camera: CameraRig::new(state.intro, viewport_width),
        }
    }

    /// Advances all smoothed values by `dt` seconds toward the targets implied
    /// by `state` and the ambient pointer rotation.
    pub fn tick(
        &mut self,
        state: &GarmentState,
        ambient: Vec3,
        viewport_width: f32,
        dt: f32,
    ) -> FramePose {
        self.color
            .step(state.base_color.to_vec3(), COLOR_SMOOTH_TIME, dt);
        match state.rotation_mode {
            RotationMode::Manual => {
                self.garment_rotation
                    .step(state.manual_rotation, MANUAL_ROTATION_SMOOTH_TIME, dt);
                self.rig_rotation
                    .step(Vec3::ZERO, AMBIENT_ROTATION_SMOOTH_TIME, dt);
            }
            RotationMode::Automatic => {
                self.garment_rotation
                    .step(ambient, AMBIENT_ROTATION_SMOOTH_TIME, dt);
                self.rig_rotation
                    .step(ambient, AMBIENT_ROTATION_SMOOTH_TIME, dt);
            }
        }
        self.camera.update(state.intro, viewport_width, dt);
        self.pose()
    }

    pub fn pose(&self) -> FramePose {
        FramePose {
            camera_position: self.camera.position(),
            rig_rotation: self.rig_rotation.value(),
            garment_rotation: self.garment_rotation.value(),
            material_color: self.color.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HexColor, Registry};
    use crate::scene::GarmentVisual;

    const DT: f32 = 1.0 / 60.0;

    fn state() -> GarmentState {
        GarmentState::from_registry(&Registry::builtin())
    }

    #[test]
    fn color_change_is_smoothed_not_instant() {
        let mut state = state();
        let mut damper = FrameDamper::new(&state, 1280.0);
        state.base_color = HexColor::from_rgb(255, 255, 255);

        let pose = damper.tick(&state, Vec3::ZERO, 1280.0, DT);
        assert!(pose.material_color.x < 1.0);
        assert!(pose.material_color.x > state_color_start().x);

        for _ in 0..300 {
            damper.tick(&state, Vec3::ZERO, 1280.0, DT);
        }
        assert_eq!(damper.pose().material_color, Vec3::ONE);
    }

    fn state_color_start() -> Vec3 {
        Registry::builtin().defaults().base_color.to_vec3()
    }

    #[test]
    fn manual_mode_tracks_stored_rotation() {
        let mut state = state();
        state.rotation_mode = RotationMode::Manual;
        state.manual_rotation = Vec3::new(0.3, 2.0, -0.2);
        let mut damper = FrameDamper::new(&state, 1280.0);

        for _ in 0..300 {
            damper.tick(&state, Vec3::new(0.1, 0.4, 0.0), 1280.0, DT);
        }
        let pose = damper.pose();
        assert!(pose.garment_rotation.abs_diff_eq(Vec3::new(0.3, 2.0, -0.2), 1e-3));
        assert_eq!(pose.rig_rotation, Vec3::ZERO);
    }

    #[test]
    fn automatic_mode_follows_ambient_target() {
        let state = state();
        let ambient = Vec3::new(1.0 / 7.0, -0.5, 0.0);
        let mut damper = FrameDamper::new(&state, 1280.0);

        let first = damper.tick(&state, ambient, 1280.0, DT);
        assert!(first.garment_rotation.y < 0.0 && first.garment_rotation.y > -0.5);

        for _ in 0..300 {
            damper.tick(&state, ambient, 1280.0, DT);
        }
        let pose = damper.pose();
        assert!(pose.garment_rotation.abs_diff_eq(ambient, 1e-3));
        assert!(pose.rig_rotation.abs_diff_eq(ambient, 1e-3));
    }

    #[test]
    fn camera_follows_layout_changes() {
        let mut state = state();
        let mut damper = FrameDamper::new(&state, 1920.0);
        assert_eq!(damper.pose().camera_position, Vec3::new(-0.4, 0.0, 2.0));

        state.intro = false;
        for _ in 0..300 {
            damper.tick(&state, Vec3::ZERO, 500.0, DT);
        }
        assert_eq!(damper.pose().camera_position, Vec3::new(0.0, 0.0, 2.5));
    }

    #[test]
    fn log_surface_counts_frames() {
        let registry = Registry::builtin();
        let state = GarmentState::from_registry(&registry);
        let damper = FrameDamper::new(&state, 1280.0);
        let scene = FrameScene::assemble(
            &state,
            registry.default_model(),
            &GarmentVisual::Loading,
            damper.pose(),
        );
        let mut surface = LogSurface::new();
        surface.resize(1280, 720);
        surface.present(&scene, &UiFrame::default());
        surface.present(&scene, &UiFrame::default());
        assert_eq!(surface.frames(), 2);
    }
}
