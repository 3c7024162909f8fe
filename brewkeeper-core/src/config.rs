//! Keeper configuration
//!
//! Tuning for the periodic keeper. Stored either as TOML text or as a binary
//! postcard record; the TOML form wins when both are present:
//!
//! ```toml
//! version = 1
//! min_period_s = 60
//! min_temperature_step = 0.2
//! stable_threshold = 1
//! ```

use core::str;

use brewkeeper_hal::{Storage, StorageError, StorageKey};
use serde::{Deserialize, Serialize};

use crate::schedule::DEFAULT_STABLE_THRESHOLD;

/// Current configuration version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum serialized config size (binary)
const MAX_CONFIG_SIZE: usize = 64;

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = 512;

/// Keeper tuning parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct KeeperConfig {
    pub version: u8,
    /// Minimum seconds between two effective keep calls
    pub min_period_s: u32,
    /// Minimum setpoint change before a command is sent
    pub min_temperature_step: f32,
    /// Stability threshold in gravity points for steps without their own
    pub stable_threshold: u16,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            min_period_s: 60,
            min_temperature_step: 0.2,
            stable_threshold: DEFAULT_STABLE_THRESHOLD,
        }
    }
}

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Storage operation failed
    Storage(StorageError),
    /// Deserialization failed
    Deserialize,
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Config version mismatch
    VersionMismatch,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        ConfigError::Storage(e)
    }
}

/// Parse a TOML configuration; missing keys take their defaults
pub fn from_toml(text: &str) -> Result<KeeperConfig, ConfigError> {
    let config: KeeperConfig = toml::from_str(text).map_err(|_| ConfigError::TomlParse)?;
    check_version(config)
}

/// Load the keeper configuration
///
/// Tries TOML first, then the binary record, and falls back to defaults.
pub fn load_config<S: Storage>(storage: &mut S) -> KeeperConfig {
    if storage.exists(StorageKey::KeeperConfigToml) {
        match load_toml(storage) {
            Ok(config) => {
                info!("loaded keeper config from TOML");
                return config;
            }
            Err(e) => warn!("failed to load TOML config: {}, trying binary", e),
        }
    } else {
        debug!("no TOML config found, trying binary format");
    }

    match load_binary(storage) {
        Ok(config) => {
            info!("loaded keeper config from binary record");
            config
        }
        Err(e) => {
            debug!("no usable binary config ({}), using defaults", e);
            KeeperConfig::default()
        }
    }
}

/// Write the binary configuration record
///
/// A TOML record would take precedence on the next load, so it is removed.
pub fn save_config<S: Storage>(storage: &mut S, config: &KeeperConfig) -> Result<(), ConfigError> {
    let mut buffer = [0u8; MAX_CONFIG_SIZE];
    let record =
        postcard::to_slice(config, &mut buffer).map_err(|_| ConfigError::Deserialize)?;
    storage.write(StorageKey::KeeperConfig, record)?;
    storage.remove(StorageKey::KeeperConfigToml)?;
    debug!("keeper config saved ({} bytes)", record.len());
    Ok(())
}

fn load_toml<S: Storage>(storage: &mut S) -> Result<KeeperConfig, ConfigError> {
    let mut buffer = [0u8; MAX_TOML_SIZE];
    let len = storage.read(StorageKey::KeeperConfigToml, &mut buffer)?;
    let text = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;
    from_toml(text)
}

fn load_binary<S: Storage>(storage: &mut S) -> Result<KeeperConfig, ConfigError> {
    let mut buffer = [0u8; MAX_CONFIG_SIZE];
    let len = storage.read(StorageKey::KeeperConfig, &mut buffer)?;
    let config: KeeperConfig =
        postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;
    check_version(config)
}

fn check_version(config: KeeperConfig) -> Result<KeeperConfig, ConfigError> {
    if config.version != CONFIG_VERSION {
        warn!(
            "config version mismatch: found {}, expected {}",
            config.version,
            CONFIG_VERSION
        );
        return Err(ConfigError::VersionMismatch);
    }
    Ok(config)
}
