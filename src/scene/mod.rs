pub mod decal;

pub use decal::{plan_decals, DecalBlend, DecalInstance, DecalPlan, DecalTransform};

use crate::assets::{CatalogState, ResolvedGarment};
use crate::config::{GarmentId, GarmentModel, HexColor, ModelTransform};
use crate::diagnostics::Diagnostics;
use crate::store::GarmentState;
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::sync::Arc;

pub const LOADING_COLOR: HexColor = HexColor::from_rgb(0x80, 0x80, 0x80);
pub const ERROR_COLOR: HexColor = HexColor::from_rgb(0xff, 0x00, 0x00);
pub const CAMERA_FOV_DEGREES: f32 = 25.0;

/// What the garment slot shows this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GarmentVisual {
    /// Gray unit cube while the catalog is still loading.
    Loading,
    Mesh(ResolvedGarment),
    /// Red unit cube: the asset failed to load or has no mesh at all.
    Error { reason: String },
}

impl GarmentVisual {
    pub fn from_catalog(
        catalog: Option<&CatalogState>,
        model: &GarmentModel,
        base_color: HexColor,
        diagnostics: &Diagnostics,
    ) -> Self {
        match catalog {
            None | Some(CatalogState::Pending) => GarmentVisual::Loading,
            Some(CatalogState::Failed(error)) => GarmentVisual::Error {
                reason: error.clone(),
            },
            Some(CatalogState::Ready(catalog)) => {
                let resolved = ResolvedGarment::resolve(catalog, model, base_color, diagnostics);
                if resolved.geometry.geometry().is_some() {
                    GarmentVisual::Mesh(resolved)
                } else {
                    GarmentVisual::Error {
                        reason: format!("{} contains no mesh", model.asset_path),
                    }
                }
            }
        }
    }

    /// Fixed tint of the placeholder cube; `None` for a real mesh.
    pub fn placeholder_color(&self) -> Option<HexColor> {
        match self {
            GarmentVisual::Loading => Some(LOADING_COLOR),
            GarmentVisual::Mesh(_) => None,
            GarmentVisual::Error { .. } => Some(ERROR_COLOR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogKey {
    Missing,
    Pending,
    Ready(*const ()),
    Failed,
}

impl CatalogKey {
    fn of(catalog: Option<&CatalogState>) -> Self {
        match catalog {
            None => CatalogKey::Missing,
            Some(CatalogState::Pending) => CatalogKey::Pending,
            Some(CatalogState::Ready(catalog)) => CatalogKey::Ready(Arc::as_ptr(catalog).cast()),
            Some(CatalogState::Failed(_)) => CatalogKey::Failed,
        }
    }
}

/// The selected garment's resolved visual, recomputed only when the selected
/// model or its catalog changes.
#[derive(Debug)]
pub struct GarmentSlot {
    key: Option<(GarmentId, CatalogKey)>,
    visual: GarmentVisual,
}

impl Default for GarmentSlot {
    fn default() -> Self {
        Self {
            key: None,
            visual: GarmentVisual::Loading,
        }
    }
}

impl GarmentSlot {
    pub fn visual(&self) -> &GarmentVisual {
        &self.visual
    }

    /// Returns true when the visual was re-resolved.
    pub fn sync(
        &mut self,
        model: &GarmentModel,
        catalog: Option<&CatalogState>,
        base_color: HexColor,
        diagnostics: &Diagnostics,
    ) -> bool {
        let key = (model.id, CatalogKey::of(catalog));
        if self.key == Some(key) {
            return false;
        }
        self.key = Some(key);
        self.visual = GarmentVisual::from_catalog(catalog, model, base_color, diagnostics);
        true
    }
}

/// Smoothed values the damper produces for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePose {
    pub camera_position: Vec3,
    pub rig_rotation: Vec3,
    pub garment_rotation: Vec3,
    pub material_color: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
}

/// Declarative description of one frame, handed to the render surface.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameScene {
    pub camera: CameraPose,
    pub model: GarmentId,
    pub visual: GarmentVisual,
    pub rig_rotation: Vec3,
    pub garment_rotation: Vec3,
    pub model_transform: ModelTransform,
    pub material_color: Vec3,
    pub decals: DecalPlan,
}

impl FrameScene {
    pub fn assemble(
        state: &GarmentState,
        model: &GarmentModel,
        visual: &GarmentVisual,
        pose: FramePose,
    ) -> Self {
        let (material_color, model_transform, decals) = match visual.placeholder_color() {
            Some(color) => (color.to_vec3(), ModelTransform::default(), DecalPlan::default()),
            None => (pose.material_color, model.transform, plan_decals(state, model)),
        };
        Self {
            camera: CameraPose {
                position: pose.camera_position,
                target: Vec3::ZERO,
                fov_degrees: CAMERA_FOV_DEGREES,
            },
            model: model.id,
            visual: visual.clone(),
            rig_rotation: pose.rig_rotation,
            garment_rotation: pose.garment_rotation,
            model_transform,
            material_color,
            decals,
        }
    }

    /// World matrix of the garment mesh: rig, then garment rotation, then
    /// the model's own scale and offset.
    pub fn garment_matrix(&self) -> Mat4 {
        let rig = compose_transform(Vec3::ZERO, self.rig_rotation, Vec3::ONE);
        let garment = compose_transform(Vec3::ZERO, self.garment_rotation, Vec3::ONE);
        let model = compose_transform(
            self.model_transform.offset,
            Vec3::ZERO,
            Vec3::splat(self.model_transform.scale),
        );
        rig * garment * model
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera.position, self.camera.target, Vec3::Y)
    }
}

/// Translation * rotation * scale with XYZ Euler angles in radians.
pub fn compose_transform(position: Vec3, rotation: Vec3, scale: Vec3) -> Mat4 {
    let rotation = Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z);
    Mat4::from_scale_rotation_translation(scale, rotation, position)
}
