//! Bridge configuration, persisted as `{config_dir}/bridge.json`.

use crate::endpoint::{FORWARD_SUFFIX, IpcEndpoint, REVERSE_SUFFIX, create_endpoint};
use crate::error::config::ConfigError;
use crate::transport::{IpcTransport, RendererTarget};

use common::ErrorLocation;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "bridge.json";
const CONFIG_VERSION: u32 = 1;

// ============================================
// CONFIG STRUCTS
// ============================================

/// Channel suffixes for the two exposure directions.
///
/// Both processes must load the same values or their endpoints will never
/// meet on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default = "default_forward_suffix")]
    pub forward_suffix: String,
    #[serde(default = "default_reverse_suffix")]
    pub reverse_suffix: String,
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            forward_suffix: default_forward_suffix(),
            reverse_suffix: default_reverse_suffix(),
        }
    }
}

impl ChannelsConfig {
    /// Endpoint exposing a main-process object, using the configured suffix.
    pub fn forward_endpoint<T: IpcTransport + ?Sized>(
        &self,
        transport: &Rc<T>,
    ) -> IpcEndpoint<T> {
        create_endpoint(transport, &self.forward_suffix, None)
    }

    /// Endpoint exposing a renderer-process object, using the configured suffix.
    pub fn reverse_endpoint<T: IpcTransport + ?Sized>(
        &self,
        transport: &Rc<T>,
        target: Option<Rc<dyn RendererTarget>>,
    ) -> IpcEndpoint<T> {
        create_endpoint(transport, &self.reverse_suffix, target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub channels: ChannelsConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: default_log_level(),
            channels: ChannelsConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_forward_suffix() -> String {
    FORWARD_SUFFIX.to_string()
}
fn default_reverse_suffix() -> String {
    REVERSE_SUFFIX.to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl BridgeConfig {
    /// Where the config for `config_dir` lives.
    pub fn path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Load `bridge.json` from `config_dir`, falling back to defaults when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read, parsed or validated.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(config_dir);
        match read_config(&path)? {
            Some(config) => Ok(config),
            None => {
                info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
        }
    }

    /// Like [`BridgeConfig::load`], but writes the defaults out on first run so
    /// both processes can be pointed at one file afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file is invalid or the defaults
    /// cannot be written.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(config_dir);
        if let Some(config) = read_config(&path)? {
            return Ok(config);
        }

        let config = Self::default();
        config.save(config_dir)?;
        info!("Wrote default config to {}", path.display());
        Ok(config)
    }

    /// Persist to `config_dir`, replacing any previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, serialization or any filesystem step fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::caller(),
            reason: e.to_string(),
        })?;

        fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            location: ErrorLocation::caller(),
            path: config_dir.to_path_buf(),
            source,
        })?;
        replace_file(&Self::path(config_dir), &json)?;

        debug!("Config saved under {}", config_dir.display());
        Ok(())
    }

    /// Parsed `log_level`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an unknown level name.
    #[track_caller]
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level).map_err(|_| ConfigError::ValidationError {
            location: ErrorLocation::caller(),
            reason: format!(
                "Invalid log level: {} (expected off, error, warn, info, debug or trace)",
                self.log_level
            ),
        })
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::caller(),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        self.level_filter()?;

        let channels = &self.channels;
        if channels.forward_suffix == channels.reverse_suffix {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::caller(),
                reason: format!(
                    "Forward and reverse suffixes collide: '{}'",
                    channels.forward_suffix
                ),
            });
        }

        for suffix in [&channels.forward_suffix, &channels.reverse_suffix] {
            if suffix.chars().any(char::is_whitespace) {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::caller(),
                    reason: format!("Channel suffix contains whitespace: '{}'", suffix),
                });
            }
        }

        Ok(())
    }
}

// ============================================
// FILE I/O
// ============================================

/// `Ok(None)` when there is no file at `path`.
fn read_config(path: &Path) -> Result<Option<BridgeConfig>, ConfigError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            warn!("Cannot read {}: {source}", path.display());
            return Err(ConfigError::ReadError {
                location: ErrorLocation::caller(),
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config: BridgeConfig = serde_json::from_str(&contents).map_err(|e| {
        warn!("Malformed config {}: {e}", path.display());
        ConfigError::ParseError {
            location: ErrorLocation::caller(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    config.validate()?;

    info!("Config loaded from {}", path.display());
    Ok(Some(config))
}

/// Write `contents` next to `path` and rename it into place.
fn replace_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let staged = path.with_extension("json.tmp");
    let write_error = |path: &Path, source| ConfigError::WriteError {
        location: ErrorLocation::caller(),
        path: path.to_path_buf(),
        source,
    };

    fs::write(&staged, contents).map_err(|e| write_error(&staged, e))?;
    fs::rename(&staged, path).map_err(|e| write_error(path, e))
}
