use crate::config::DecalSide;
use crate::store::{GarmentState, Intent, RotationMode};
use std::f32::consts::FRAC_PI_2;

/// How a tab button draws its icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabIcon {
    /// Named vector glyph shipped with the app.
    Vector(&'static str),
    /// Raster icon path relative to the asset root.
    Image(&'static str),
    /// A single text glyph (emoji or symbol).
    Glyph(&'static str),
}

impl TabIcon {
    /// Text drawn on the button. Vector and image icons fall back to the
    /// tab label until the surface can draw textures into the UI.
    pub fn button_text<'a>(&self, label: &'a str) -> &'a str {
        match self {
            TabIcon::Glyph(glyph) => *glyph,
            TabIcon::Vector(_) | TabIcon::Image(_) => label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorTab {
    ColorPicker,
    FilePicker,
    ModelPicker,
    RotationControl,
    LogoControl,
}

impl EditorTab {
    pub const ALL: [EditorTab; 5] = [
        EditorTab::ColorPicker,
        EditorTab::FilePicker,
        EditorTab::ModelPicker,
        EditorTab::RotationControl,
        EditorTab::LogoControl,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EditorTab::ColorPicker => "Color",
            EditorTab::FilePicker => "Upload",
            EditorTab::ModelPicker => "Model",
            EditorTab::RotationControl => "Rotation",
            EditorTab::LogoControl => "Logo",
        }
    }

    pub fn icon(self) -> TabIcon {
        match self {
            EditorTab::ColorPicker => TabIcon::Vector("swatch"),
            EditorTab::FilePicker => TabIcon::Vector("file"),
            EditorTab::ModelPicker => TabIcon::Glyph("👕"),
            EditorTab::RotationControl => TabIcon::Glyph("🔄"),
            EditorTab::LogoControl => TabIcon::Glyph("📐"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterTab {
    LogoOverlay,
    FullPattern,
    ViewToggle,
}

impl FilterTab {
    pub const ALL: [FilterTab; 3] = [
        FilterTab::LogoOverlay,
        FilterTab::FullPattern,
        FilterTab::ViewToggle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FilterTab::LogoOverlay => "Logo",
            FilterTab::FullPattern => "Pattern",
            FilterTab::ViewToggle => "Flip",
        }
    }

    pub fn icon(self) -> TabIcon {
        match self {
            FilterTab::LogoOverlay => TabIcon::Image("logo-cloth.png"),
            FilterTab::FullPattern => TabIcon::Image("stylish-cloth.png"),
            FilterTab::ViewToggle => TabIcon::Image("flip-switch.svg"),
        }
    }

    /// Active state is read back from the garment state, so the tabs never
    /// drift from what is rendered.
    pub fn is_active(self, state: &GarmentState) -> bool {
        match self {
            FilterTab::LogoOverlay => state.texture_mode.logo_overlay,
            FilterTab::FullPattern => state.texture_mode.full_pattern,
            FilterTab::ViewToggle => showing_back(state),
        }
    }

    pub fn toggle(self, state: &GarmentState) -> Intent {
        match self {
            FilterTab::LogoOverlay => Intent::SetLogoOverlay(!state.texture_mode.logo_overlay),
            FilterTab::FullPattern => Intent::SetFullPattern(!state.texture_mode.full_pattern),
            FilterTab::ViewToggle => Intent::ShowSide(if showing_back(state) {
                DecalSide::Front
            } else {
                DecalSide::Back
            }),
        }
    }
}

/// The back faces the camera when the manual yaw is more than a quarter
/// turn away from the front.
pub fn showing_back(state: &GarmentState) -> bool {
    state.rotation_mode == RotationMode::Manual
        && crate::render::damping::wrap_angle(state.manual_rotation.y).abs() > FRAC_PI_2
}
