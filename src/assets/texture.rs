use crate::assets::AssetError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Decoded RGBA decal texture.
///
/// Clones share the pixel buffer; `source_hash` identifies the texture for
/// the render surface.
#[derive(Clone)]
pub struct DecalImage {
    label: String,
    source_hash: String,
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl DecalImage {
    pub fn decode(bytes: &[u8], label: &str) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes).map_err(|source| AssetError::Decode {
            path: label.to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            label: label.to_string(),
            source_hash: format!("{:x}", Sha256::digest(bytes)),
            width,
            height,
            pixels: Arc::from(rgba.into_raw()),
        })
    }

    pub fn open(path: &Path) -> Result<Self, AssetError> {
        let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let label = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("decal");
        Self::decode(&bytes, label)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn texture_id(&self) -> TextureId {
        TextureId(self.source_hash.clone())
    }
}

impl fmt::Debug for DecalImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecalImage")
            .field("label", &self.label)
            .field("source_hash", &self.source_hash)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl PartialEq for DecalImage {
    fn eq(&self, other: &Self) -> bool {
        self.source_hash == other.source_hash
    }
}

/// Content-addressed handle the render surface binds textures by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureId(pub String);
