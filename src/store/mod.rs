//! Garment state store.
//!
//! All mutation goes through [`Store::dispatch`] with a named [`Intent`].
//! Every applied intent yields the [`StateChange`]s it caused; those are
//! returned to the caller and fanned out to subscribers.

use crate::assets::DecalImage;
use crate::config::{DecalPlacement, DecalSide, DecalTarget, GarmentId, HexColor, Registry};
use crate::diagnostics::{Diagnostic, Diagnostics};
use glam::Vec3;
use std::f32::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationMode {
    Automatic,
    Manual,
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationMode::Automatic => f.write_str("automatic"),
            RotationMode::Manual => f.write_str("manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

/// Logo overlay and full-pattern overlay are toggled independently; both
/// may be on at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureMode {
    pub logo_overlay: bool,
    pub full_pattern: bool,
}

impl TextureMode {
    pub fn is_none(self) -> bool {
        !self.logo_overlay && !self.full_pattern
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarmentState {
    pub intro: bool,
    pub selected_model: GarmentId,
    pub base_color: HexColor,
    pub texture_mode: TextureMode,
    pub front_decal: Option<DecalImage>,
    pub back_decal: Option<DecalImage>,
    pub full_pattern_decal: Option<DecalImage>,
    pub show_front_logo: bool,
    pub show_back_logo: bool,
    pub front_placement: DecalPlacement,
    pub back_placement: DecalPlacement,
    pub rotation_mode: RotationMode,
    /// Only meaningful while `rotation_mode` is manual.
    pub manual_rotation: Vec3,
    pub debug: bool,
}

impl GarmentState {
    pub fn from_registry(registry: &Registry) -> Self {
        let defaults = registry.defaults();
        let model = registry.default_model();
        Self {
            intro: true,
            selected_model: model.id,
            base_color: defaults.base_color,
            texture_mode: TextureMode {
                logo_overlay: defaults.logo_overlay,
                full_pattern: defaults.full_pattern,
            },
            front_decal: None,
            back_decal: None,
            full_pattern_decal: None,
            show_front_logo: true,
            show_back_logo: true,
            front_placement: model.placements.front,
            back_placement: model.placements.back,
            rotation_mode: RotationMode::Automatic,
            manual_rotation: Vec3::ZERO,
            debug: defaults.debug,
        }
    }

    pub fn placement(&self, side: DecalSide) -> &DecalPlacement {
        match side {
            DecalSide::Front => &self.front_placement,
            DecalSide::Back => &self.back_placement,
        }
    }

    fn placement_mut(&mut self, side: DecalSide) -> &mut DecalPlacement {
        match side {
            DecalSide::Front => &mut self.front_placement,
            DecalSide::Back => &mut self.back_placement,
        }
    }

    pub fn logo_visible(&self, side: DecalSide) -> bool {
        match side {
            DecalSide::Front => self.show_front_logo,
            DecalSide::Back => self.show_back_logo,
        }
    }

    fn logo_visible_mut(&mut self, side: DecalSide) -> &mut bool {
        match side {
            DecalSide::Front => &mut self.show_front_logo,
            DecalSide::Back => &mut self.show_back_logo,
        }
    }

    pub fn decal(&self, target: DecalTarget) -> Option<&DecalImage> {
        match target {
            DecalTarget::Logo(DecalSide::Front) => self.front_decal.as_ref(),
            DecalTarget::Logo(DecalSide::Back) => self.back_decal.as_ref(),
            DecalTarget::FullPattern => self.full_pattern_decal.as_ref(),
        }
    }

    fn decal_mut(&mut self, target: DecalTarget) -> &mut Option<DecalImage> {
        match target {
            DecalTarget::Logo(DecalSide::Front) => &mut self.front_decal,
            DecalTarget::Logo(DecalSide::Back) => &mut self.back_decal,
            DecalTarget::FullPattern => &mut self.full_pattern_decal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    SelectModel(GarmentId),
    SetBaseColor(HexColor),
    SetLogoOverlay(bool),
    SetFullPattern(bool),
    /// A freshly decoded upload. Logo uploads also make their side visible.
    ApplyDecal {
        target: DecalTarget,
        image: DecalImage,
    },
    /// A configured default image; display flags are left alone.
    InstallDecal {
        target: DecalTarget,
        image: DecalImage,
    },
    SetLogoVisible {
        side: DecalSide,
        visible: bool,
    },
    SetPlacementPosition {
        side: DecalSide,
        position: Vec3,
    },
    SetPlacementRotation {
        side: DecalSide,
        rotation: Vec3,
    },
    SetPlacementScale {
        side: DecalSide,
        scale: f32,
    },
    ResetPlacement(DecalSide),
    SetRotationMode(RotationMode),
    SetManualRotation(Vec3),
    SetManualRotationAxis {
        axis: Axis,
        radians: f32,
    },
    ResetRotation,
    /// Turn the garment so `side` faces the camera.
    ShowSide(DecalSide),
    SetIntro(bool),
    SetDebug(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    ModelSelected {
        previous: GarmentId,
        current: GarmentId,
    },
    BaseColor,
    TextureMode,
    Decal(DecalTarget),
    LogoVisibility(DecalSide),
    Placement(DecalSide),
    RotationMode(RotationMode),
    ManualRotation,
    Intro,
    Debug,
}

pub type Subscriber = Box<dyn FnMut(&StateChange, &GarmentState)>;

pub struct Store {
    registry: Registry,
    state: GarmentState,
    subscribers: Vec<Subscriber>,
}

impl Store {
    pub fn new(registry: Registry) -> Self {
        let state = GarmentState::from_registry(&registry);
        Self {
            registry,
            state,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &GarmentState {
        &self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn dispatch(&mut self, intent: Intent, diagnostics: &Diagnostics) -> Vec<StateChange> {
        let changes = self.apply(intent, diagnostics);
        for change in &changes {
            for subscriber in &mut self.subscribers {
                subscriber(change, &self.state);
            }
        }
        changes
    }

    fn apply(&mut self, intent: Intent, diagnostics: &Diagnostics) -> Vec<StateChange> {
        let mut changes = Vec::new();
        match intent {
            Intent::SelectModel(requested) => {
                let model = self.registry.model(requested, diagnostics);
                let previous = self.state.selected_model;
                self.state.selected_model = model.id;
                // Copies, so later edits never reach the registry or the other side.
                self.state.front_placement = model.placements.front;
                self.state.back_placement = model.placements.back;
                self.state.manual_rotation = Vec3::ZERO;
                diagnostics.emit(Diagnostic::PlacementsReset { model: model.id });
                changes.push(StateChange::ModelSelected {
                    previous,
                    current: model.id,
                });
                changes.push(StateChange::Placement(DecalSide::Front));
                changes.push(StateChange::Placement(DecalSide::Back));
                changes.push(StateChange::ManualRotation);
                if !self.state.texture_mode.logo_overlay {
                    self.state.texture_mode.logo_overlay = true;
                    changes.push(StateChange::TextureMode);
                }
            }
            Intent::SetBaseColor(color) => {
                if self.state.base_color != color {
                    self.state.base_color = color;
                    changes.push(StateChange::BaseColor);
                }
            }
            Intent::SetLogoOverlay(enabled) => {
                if self.state.texture_mode.logo_overlay != enabled {
                    self.state.texture_mode.logo_overlay = enabled;
                    changes.push(StateChange::TextureMode);
                }
            }
            Intent::SetFullPattern(enabled) => {
                if self.state.texture_mode.full_pattern != enabled {
                    self.state.texture_mode.full_pattern = enabled;
                    changes.push(StateChange::TextureMode);
                }
            }
            Intent::ApplyDecal { target, image } => {
                *self.state.decal_mut(target) = Some(image);
                changes.push(StateChange::Decal(target));
                match target {
                    DecalTarget::Logo(side) => {
                        let visible = self.state.logo_visible_mut(side);
                        if !*visible {
                            *visible = true;
                            changes.push(StateChange::LogoVisibility(side));
                        }
                    }
                    DecalTarget::FullPattern => {
                        if !self.state.texture_mode.full_pattern {
                            self.state.texture_mode.full_pattern = true;
                            changes.push(StateChange::TextureMode);
                        }
                    }
                }
            }
            Intent::InstallDecal { target, image } => {
                *self.state.decal_mut(target) = Some(image);
                changes.push(StateChange::Decal(target));
            }
            Intent::SetLogoVisible { side, visible } => {
                let current = self.state.logo_visible_mut(side);
                if *current != visible {
                    *current = visible;
                    changes.push(StateChange::LogoVisibility(side));
                }
            }
            Intent::SetPlacementPosition { side, position } => {
                if position.is_finite() {
                    self.state.placement_mut(side).position = position;
                    changes.push(StateChange::Placement(side));
                }
            }
            Intent::SetPlacementRotation { side, rotation } => {
                if rotation.is_finite() {
                    self.state.placement_mut(side).rotation = Some(rotation);
                    changes.push(StateChange::Placement(side));
                }
            }
            Intent::SetPlacementScale { side, scale } => {
                let clamped = self.registry.logo_scale().clamp(scale);
                self.state.placement_mut(side).scale = clamped;
                changes.push(StateChange::Placement(side));
            }
            Intent::ResetPlacement(side) => {
                let model = self.registry.model(self.state.selected_model, diagnostics);
                *self.state.placement_mut(side) = model.placements.get(side);
                changes.push(StateChange::Placement(side));
            }
            Intent::SetRotationMode(mode) => {
                if self.state.rotation_mode != mode {
                    self.state.rotation_mode = mode;
                    changes.push(StateChange::RotationMode(mode));
                    if mode == RotationMode::Automatic && self.state.manual_rotation != Vec3::ZERO
                    {
                        self.state.manual_rotation = Vec3::ZERO;
                        changes.push(StateChange::ManualRotation);
                    }
                }
            }
            Intent::SetManualRotation(rotation) => {
                if rotation.is_finite() {
                    self.state.manual_rotation = rotation;
                    changes.push(StateChange::ManualRotation);
                }
            }
            Intent::SetManualRotationAxis { axis, radians } => {
                if radians.is_finite() {
                    self.state.manual_rotation[axis.index()] = radians;
                    changes.push(StateChange::ManualRotation);
                }
            }
            Intent::ResetRotation => {
                self.state.manual_rotation = Vec3::ZERO;
                changes.push(StateChange::ManualRotation);
            }
            Intent::ShowSide(side) => {
                if self.state.rotation_mode != RotationMode::Manual {
                    self.state.rotation_mode = RotationMode::Manual;
                    changes.push(StateChange::RotationMode(RotationMode::Manual));
                }
                self.state.manual_rotation = match side {
                    DecalSide::Front => Vec3::ZERO,
                    DecalSide::Back => Vec3::new(0.0, PI, 0.0),
                };
                changes.push(StateChange::ManualRotation);
            }
            Intent::SetIntro(intro) => {
                if self.state.intro != intro {
                    self.state.intro = intro;
                    changes.push(StateChange::Intro);
                }
            }
            Intent::SetDebug(debug) => {
                if self.state.debug != debug {
                    self.state.debug = debug;
                    diagnostics.set_enabled(debug);
                    changes.push(StateChange::Debug);
                }
            }
        }
        changes
    }
}
