//! Decal placement: where each logo and the full-pattern overlay land on the
//! garment for the current state.

use crate::assets::TextureId;
use crate::config::{DecalPlacement, DecalSide, DecalTarget, GarmentModel};
use crate::store::GarmentState;
use glam::Vec3;
use std::f32::consts::PI;

pub const DEFAULT_DECAL_SCALE: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalTransform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
}

/// Blend settings the surface applies when projecting a decal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalBlend {
    pub depth_test: bool,
    pub depth_write: bool,
    /// `(factor, units)`; pulls the decal toward the camera to avoid z-fighting.
    pub polygon_offset: Option<(f32, f32)>,
    pub anisotropy: u8,
}

impl DecalBlend {
    fn for_target(target: DecalTarget) -> Self {
        match target {
            DecalTarget::Logo(DecalSide::Front) => Self {
                depth_test: false,
                depth_write: false,
                polygon_offset: Some((-10.0, -1.0)),
                anisotropy: 16,
            },
            DecalTarget::Logo(DecalSide::Back) => Self {
                depth_test: false,
                depth_write: true,
                polygon_offset: None,
                anisotropy: 16,
            },
            DecalTarget::FullPattern => Self {
                depth_test: true,
                depth_write: true,
                polygon_offset: None,
                anisotropy: 1,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecalInstance {
    pub target: DecalTarget,
    pub transform: DecalTransform,
    pub texture: TextureId,
    pub blend: DecalBlend,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecalPlan {
    pub decals: Vec<DecalInstance>,
    /// Texture bound on back-facing paths. Falls back to the front image
    /// when no back image exists; visibility is still decided by `decals`.
    pub back_texture: Option<TextureId>,
}

impl DecalPlan {
    pub fn get(&self, target: DecalTarget) -> Option<&DecalInstance> {
        self.decals.iter().find(|decal| decal.target == target)
    }
}

fn effective_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        DEFAULT_DECAL_SCALE
    }
}

pub fn front_transform(placement: &DecalPlacement) -> DecalTransform {
    DecalTransform {
        position: placement.position,
        rotation: placement.rotation.unwrap_or(Vec3::ZERO),
        scale: effective_scale(placement.scale),
    }
}

/// Same as the front transform, but yawed half a turn so the image faces
/// out of the garment's back.
pub fn back_transform(placement: &DecalPlacement) -> DecalTransform {
    let rotation = placement.rotation.unwrap_or(Vec3::ZERO);
    DecalTransform {
        position: placement.position,
        rotation: Vec3::new(rotation.x, rotation.y + PI, rotation.z),
        scale: effective_scale(placement.scale),
    }
}

pub fn full_pattern_transform() -> DecalTransform {
    DecalTransform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: 1.0,
    }
}

pub fn plan_decals(state: &GarmentState, model: &GarmentModel) -> DecalPlan {
    let mut decals = Vec::new();

    if state.texture_mode.full_pattern {
        if let Some(image) = &state.full_pattern_decal {
            decals.push(DecalInstance {
                target: DecalTarget::FullPattern,
                transform: full_pattern_transform(),
                texture: image.texture_id(),
                blend: DecalBlend::for_target(DecalTarget::FullPattern),
            });
        }
    }

    if state.texture_mode.logo_overlay && !model.decal_exempt {
        for side in [DecalSide::Front, DecalSide::Back] {
            let target = DecalTarget::Logo(side);
            let Some(image) = state.decal(target) else {
                continue;
            };
            if !state.logo_visible(side) {
                continue;
            }
            let placement = state.placement(side);
            let transform = match side {
                DecalSide::Front => front_transform(placement),
                DecalSide::Back => back_transform(placement),
            };
            decals.push(DecalInstance {
                target,
                transform,
                texture: image.texture_id(),
                blend: DecalBlend::for_target(target),
            });
        }
    }

    let back_texture = state
        .back_decal
        .as_ref()
        .or(state.front_decal.as_ref())
        .map(|image| image.texture_id());

    DecalPlan {
        decals,
        back_texture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::texture::tests::png_bytes;
    use crate::assets::DecalImage;
    use crate::config::{GarmentId, Registry};
    use std::f32::consts::TAU;

    fn image(shade: u8) -> DecalImage {
        DecalImage::decode(&png_bytes(1, 1, [shade, shade, shade, 255]), "logo.png").unwrap()
    }

    fn model(registry: &Registry, id: GarmentId) -> GarmentModel {
        registry
            .models()
            .iter()
            .find(|model| model.id == id)
            .unwrap()
            .clone()
    }

    fn assert_same_angle(a: f32, b: f32) {
        let diff = (a - b).rem_euclid(TAU);
        assert!(diff < 1e-4 || TAU - diff < 1e-4, "{a} vs {b}");
    }

    #[test]
    fn back_yaw_is_flipped_for_any_stored_value() {
        for stored in [0.0, 1.0, -1.0, -PI, 3.0 * PI, 12.5, -40.0] {
            let placement = DecalPlacement {
                position: Vec3::new(0.0, 0.04, -0.15),
                rotation: Some(Vec3::new(0.2, stored, -0.3)),
                scale: 0.15,
            };
            let transform = back_transform(&placement);
            assert_same_angle(transform.rotation.y, stored + PI);
            assert_eq!(transform.rotation.x, 0.2);
            assert_eq!(transform.rotation.z, -0.3);
        }
    }

    #[test]
    fn unset_values_take_defaults() {
        let placement = DecalPlacement {
            position: Vec3::new(0.0, 0.04, 0.15),
            rotation: None,
            scale: 0.0,
        };
        let front = front_transform(&placement);
        assert_eq!(front.rotation, Vec3::ZERO);
        assert_eq!(front.scale, DEFAULT_DECAL_SCALE);

        let back = back_transform(&DecalPlacement {
            scale: f32::NAN,
            ..placement
        });
        assert_eq!(back.rotation, Vec3::new(0.0, PI, 0.0));
        assert_eq!(back.scale, DEFAULT_DECAL_SCALE);
    }

    #[test]
    fn front_placement_is_used_verbatim() {
        let placement = DecalPlacement {
            position: Vec3::new(0.01, 0.02, 0.16),
            rotation: Some(Vec3::new(0.1, 0.2, 0.3)),
            scale: 0.3,
        };
        let transform = front_transform(&placement);
        assert_eq!(transform.position, placement.position);
        assert_eq!(transform.rotation, Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(transform.scale, 0.3);
    }

    #[test]
    fn logos_need_visibility_and_image() {
        let registry = Registry::builtin();
        let shirt = model(&registry, GarmentId::Shirt);
        let mut state = GarmentState::from_registry(&registry);

        assert!(plan_decals(&state, &shirt).decals.is_empty());

        state.front_decal = Some(image(10));
        state.back_decal = Some(image(20));
        let plan = plan_decals(&state, &shirt);
        assert_eq!(plan.decals.len(), 2);

        state.show_back_logo = false;
        let plan = plan_decals(&state, &shirt);
        assert!(plan.get(DecalTarget::Logo(DecalSide::Back)).is_none());
        assert!(plan.get(DecalTarget::Logo(DecalSide::Front)).is_some());

        state.texture_mode.logo_overlay = false;
        assert!(plan_decals(&state, &shirt).decals.is_empty());
    }

    #[test]
    fn decal_exempt_model_skips_logos_but_keeps_pattern() {
        let registry = Registry::builtin();
        let hoodie = model(&registry, GarmentId::Hoodie);
        let mut state = GarmentState::from_registry(&registry);
        state.front_decal = Some(image(10));
        state.full_pattern_decal = Some(image(30));
        state.texture_mode.full_pattern = true;

        let plan = plan_decals(&state, &hoodie);
        assert_eq!(plan.decals.len(), 1);
        let pattern = plan.get(DecalTarget::FullPattern).unwrap();
        assert_eq!(pattern.transform, full_pattern_transform());
    }

    #[test]
    fn pattern_and_logo_can_coexist() {
        let registry = Registry::builtin();
        let shirt = model(&registry, GarmentId::Shirt);
        let mut state = GarmentState::from_registry(&registry);
        state.front_decal = Some(image(10));
        state.full_pattern_decal = Some(image(30));
        state.texture_mode.full_pattern = true;

        let plan = plan_decals(&state, &shirt);
        assert!(plan.get(DecalTarget::FullPattern).is_some());
        assert!(plan.get(DecalTarget::Logo(DecalSide::Front)).is_some());
    }

    #[test]
    fn missing_back_image_binds_front_texture_without_showing_it() {
        let registry = Registry::builtin();
        let shirt = model(&registry, GarmentId::Shirt);
        let mut state = GarmentState::from_registry(&registry);
        let front = image(10);
        state.front_decal = Some(front.clone());
        state.show_back_logo = true;

        let plan = plan_decals(&state, &shirt);
        assert_eq!(plan.back_texture, Some(front.texture_id()));
        assert!(plan.get(DecalTarget::Logo(DecalSide::Back)).is_none());
    }
}
