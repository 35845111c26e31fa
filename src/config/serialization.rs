use crate::config::{AppConfig, ConfigError, Registry};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_config_to_file(config: &AppConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

/// Registry from `GARMENT_STUDIO_CONFIG` when set, else the builtin one.
pub fn registry_from_env() -> Result<Registry> {
    match std::env::var_os("GARMENT_STUDIO_CONFIG") {
        Some(path) => {
            let config = load_config_from_file(Path::new(&path))?;
            log::info!("Loaded garment registry from {:?}", path);
            Ok(Registry::new(config)?)
        }
        None => Ok(Registry::builtin()),
    }
}
