pub mod serialization;

use crate::diagnostics::{Diagnostic, Diagnostics};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("registry has no garment models")]
    NoModels,
    #[error("default model {0} is not in the registry")]
    MissingDefaultModel(GarmentId),
    #[error("garment model {0} is registered twice")]
    DuplicateModel(GarmentId),
    #[error("invalid logo scale bounds: min {min}, default {default}, max {max}")]
    InvalidScaleLimits { min: f32, default: f32, max: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color '{0}' must start with '#'")]
    MissingHash(String),
    #[error("color '{0}' must have 3 or 6 hex digits")]
    BadLength(String),
    #[error("color '{0}' contains non-hex digits")]
    BadDigit(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown garment model '{0}'")]
pub struct UnknownGarment(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentId {
    Shirt,
    Hoodie,
}

impl GarmentId {
    pub const ALL: [GarmentId; 2] = [GarmentId::Shirt, GarmentId::Hoodie];

    pub fn as_str(self) -> &'static str {
        match self {
            GarmentId::Shirt => "shirt",
            GarmentId::Hoodie => "hoodie",
        }
    }
}

impl fmt::Display for GarmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GarmentId {
    type Err = UnknownGarment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "shirt" => Ok(GarmentId::Shirt),
            "hoodie" => Ok(GarmentId::Hoodie),
            other => Err(UnknownGarment(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecalSide {
    Front,
    Back,
}

impl fmt::Display for DecalSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecalSide::Front => f.write_str("front"),
            DecalSide::Back => f.write_str("back"),
        }
    }
}

/// Anything a decal image can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecalTarget {
    Logo(DecalSide),
    FullPattern,
}

impl fmt::Display for DecalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecalTarget::Logo(side) => write!(f, "{side} logo"),
            DecalTarget::FullPattern => f.write_str("full pattern"),
        }
    }
}

/// sRGB color written as `#rrggbb` (or `#rgb`) in config and state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor([u8; 3]);

impl HexColor {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }

    /// Normalized sRGB components in `[0, 1]`.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.0[0] as f32 / 255.0,
            self.0[1] as f32 / 255.0,
            self.0[2] as f32 / 255.0,
        )
    }
}

impl FromStr for HexColor {
    type Err = ColorParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(value.to_string()))?;
        if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(value.to_string()));
        }
        let channel = |text: &str| {
            u8::from_str_radix(text, 16).map_err(|_| ColorParseError::BadDigit(value.to_string()))
        };
        match digits.len() {
            6 => Ok(Self([
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            ])),
            3 => {
                let mut rgb = [0u8; 3];
                for (slot, index) in rgb.iter_mut().zip(0..3) {
                    let nibble = channel(&digits[index..index + 1])?;
                    *slot = nibble * 17;
                }
                Ok(Self(rgb))
            }
            _ => Err(ColorParseError::BadLength(value.to_string())),
        }
    }
}

impl TryFrom<String> for HexColor {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.to_string()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// Position, rotation and scale of one logo decal.
///
/// `rotation` may be absent in config; consumers default it to zero at the
/// point of use, the same way a zero or non-finite `scale` falls back to the
/// registry default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecalPlacement {
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Option<Vec3>,
    pub scale: f32,
}

impl DecalPlacement {
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            rotation: Some(Vec3::ZERO),
            scale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidePlacements {
    pub front: DecalPlacement,
    pub back: DecalPlacement,
}

impl SidePlacements {
    pub fn get(&self, side: DecalSide) -> DecalPlacement {
        match side {
            DecalSide::Front => self.front,
            DecalSide::Back => self.back,
        }
    }
}

/// Group transform applied around a model's mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelTransform {
    pub scale: f32,
    pub offset: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec3::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GarmentModel {
    pub id: GarmentId,
    pub display_name: String,
    pub asset_path: String,
    pub primary_geometry: String,
    #[serde(default)]
    pub primary_material: Option<String>,
    #[serde(default)]
    pub fallback_geometries: Vec<String>,
    pub placements: SidePlacements,
    /// Decals for this model are drawn by its own renderer, not the
    /// placement engine.
    #[serde(default)]
    pub decal_exempt: bool,
    #[serde(default)]
    pub transform: ModelTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogoScaleLimits {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl LogoScaleLimits {
    pub fn clamp(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.min, self.max)
        } else {
            self.default
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPreset {
    pub name: String,
    pub color: HexColor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecalSources {
    #[serde(default)]
    pub front: Option<String>,
    #[serde(default)]
    pub back: Option<String>,
    #[serde(default)]
    pub full_pattern: Option<String>,
}

impl DecalSources {
    pub fn entries(&self) -> Vec<(DecalTarget, &str)> {
        [
            (DecalTarget::Logo(DecalSide::Front), self.front.as_deref()),
            (DecalTarget::Logo(DecalSide::Back), self.back.as_deref()),
            (DecalTarget::FullPattern, self.full_pattern.as_deref()),
        ]
        .into_iter()
        .filter_map(|(target, path)| path.map(|path| (target, path)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppDefaults {
    pub selected_model: GarmentId,
    pub base_color: HexColor,
    pub logo_overlay: bool,
    pub full_pattern: bool,
    #[serde(default)]
    pub decals: DecalSources,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root for relative asset paths; the crate's `assets/` directory when unset.
    #[serde(default)]
    pub asset_root: Option<PathBuf>,
    pub defaults: AppDefaults,
    pub logo_scale: LogoScaleLimits,
    pub models: Vec<GarmentModel>,
    #[serde(default)]
    pub color_presets: Vec<ColorPreset>,
}

const DEFAULT_LOGO_SCALE: f32 = 0.15;

fn shirt_style_placements() -> SidePlacements {
    SidePlacements {
        front: DecalPlacement::new(Vec3::new(0.0, 0.04, 0.15), DEFAULT_LOGO_SCALE),
        back: DecalPlacement::new(Vec3::new(0.0, 0.04, -0.15), DEFAULT_LOGO_SCALE),
    }
}

impl AppConfig {
    pub fn builtin() -> Self {
        let presets = [
            ("Royal Blue", (0x25, 0x63, 0xeb)),
            ("Ocean Blue", (0x3b, 0x82, 0xf6)),
            ("Sky Blue", (0x60, 0xa5, 0xfa)),
            ("Navy", (0x1d, 0x4e, 0xd8)),
            ("Black", (0x00, 0x00, 0x00)),
            ("Charcoal", (0x2d, 0x37, 0x48)),
            ("Light Gray", (0xe2, 0xe8, 0xf0)),
            ("White", (0xff, 0xff, 0xff)),
            ("Emerald", (0x05, 0x96, 0x69)),
            ("Forest", (0x06, 0x5f, 0x46)),
            ("Crimson", (0xdc, 0x26, 0x26)),
            ("Burgundy", (0x7f, 0x1d, 0x1d)),
            ("Amber", (0xf5, 0x9e, 0x0b)),
            ("Orange", (0xea, 0x58, 0x0c)),
            ("Purple", (0x7c, 0x3a, 0xed)),
            ("Rose", (0xe1, 0x1d, 0x48)),
        ];

        Self {
            asset_root: None,
            defaults: AppDefaults {
                selected_model: GarmentId::Shirt,
                base_color: HexColor::from_rgb(0x25, 0x63, 0xeb),
                logo_overlay: true,
                full_pattern: false,
                decals: DecalSources {
                    front: Some("front-design.png".to_string()),
                    back: Some("boson-back.png".to_string()),
                    full_pattern: Some("pattern.png".to_string()),
                },
                debug: false,
            },
            logo_scale: LogoScaleLimits {
                min: 0.05,
                max: 0.5,
                default: DEFAULT_LOGO_SCALE,
            },
            models: vec![
                GarmentModel {
                    id: GarmentId::Shirt,
                    display_name: "T-Shirt".to_string(),
                    asset_path: "shirt-baked.glb".to_string(),
                    primary_geometry: "T_Shirt_male".to_string(),
                    primary_material: Some("lambert1".to_string()),
                    fallback_geometries: ["Object_2", "Object_0", "Shirt", "shirt", "Mesh"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    placements: shirt_style_placements(),
                    decal_exempt: false,
                    transform: ModelTransform::default(),
                },
                GarmentModel {
                    id: GarmentId::Hoodie,
                    display_name: "Hoodie".to_string(),
                    asset_path: "hoodie.glb".to_string(),
                    primary_geometry: "Hoodie_FABRIC_3_FRONT_1850_0".to_string(),
                    primary_material: Some("FABRIC_3_FRONT_1850".to_string()),
                    fallback_geometries: [
                        "hoodie_single",
                        "Hoodie001",
                        "Mesh",
                        "hoodie",
                        "Object",
                        "Cube",
                    ]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                    placements: shirt_style_placements(),
                    decal_exempt: true,
                    transform: ModelTransform {
                        scale: 0.009,
                        offset: Vec3::new(0.0, -1.2, 0.0),
                    },
                },
            ],
            color_presets: presets
                .into_iter()
                .map(|(name, (r, g, b))| ColorPreset {
                    name: name.to_string(),
                    color: HexColor::from_rgb(r, g, b),
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.id) {
                return Err(ConfigError::DuplicateModel(model.id));
            }
        }
        if !seen.contains(&self.defaults.selected_model) {
            return Err(ConfigError::MissingDefaultModel(self.defaults.selected_model));
        }
        let limits = self.logo_scale;
        let ordered = 0.0 < limits.min && limits.min <= limits.default && limits.default <= limits.max;
        if !ordered {
            return Err(ConfigError::InvalidScaleLimits {
                min: limits.min,
                default: limits.default,
                max: limits.max,
            });
        }
        Ok(())
    }
}

/// Validated, immutable view of an [`AppConfig`].
///
/// Lookups never fail: an id that is not registered resolves to the default
/// model and reports a diagnostic.
#[derive(Debug, Clone)]
pub struct Registry {
    config: AppConfig,
    default_index: usize,
    asset_root: PathBuf,
}

impl Registry {
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let default_index = config
            .models
            .iter()
            .position(|model| model.id == config.defaults.selected_model)
            .ok_or(ConfigError::MissingDefaultModel(config.defaults.selected_model))?;
        let asset_root = config
            .asset_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"));
        Ok(Self {
            config,
            default_index,
            asset_root,
        })
    }

    pub fn builtin() -> Self {
        let config = AppConfig::builtin();
        Self {
            default_index: 0,
            asset_root: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn defaults(&self) -> &AppDefaults {
        &self.config.defaults
    }

    pub fn logo_scale(&self) -> LogoScaleLimits {
        self.config.logo_scale
    }

    pub fn color_presets(&self) -> &[ColorPreset] {
        &self.config.color_presets
    }

    pub fn models(&self) -> &[GarmentModel] {
        &self.config.models
    }

    pub fn default_model(&self) -> &GarmentModel {
        &self.config.models[self.default_index]
    }

    pub fn contains(&self, id: GarmentId) -> bool {
        self.config.models.iter().any(|model| model.id == id)
    }

    pub fn model(&self, id: GarmentId, diagnostics: &Diagnostics) -> &GarmentModel {
        match self.config.models.iter().find(|model| model.id == id) {
            Some(model) => model,
            None => {
                let fallback = self.default_model();
                diagnostics.emit(Diagnostic::UnknownModel {
                    requested: id.to_string(),
                    fallback: fallback.id,
                });
                fallback
            }
        }
    }

    /// Parse a model id typed by a user or read from the environment.
    pub fn resolve_id(&self, requested: &str, diagnostics: &Diagnostics) -> GarmentId {
        match requested.parse::<GarmentId>() {
            Ok(id) if self.contains(id) => id,
            _ => {
                let fallback = self.default_model().id;
                diagnostics.emit(Diagnostic::UnknownModel {
                    requested: requested.to_string(),
                    fallback,
                });
                fallback
            }
        }
    }

    pub fn resolve_asset_path(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.asset_root.join(candidate)
        }
    }
}
