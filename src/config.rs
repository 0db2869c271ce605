//! Engine configuration
//!
//! Plain serde structs with defaults, loadable from and savable to JSON.
//! Missing fields fall back to their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};

/// Upper bound on playback lines (excluding the recorder's line)
pub const MAX_LINES: usize = 16;

/// Read-ahead window per playback line, in samples
pub const DEFAULT_READ_AHEAD_SAMPLES: usize = 65536;

/// Write-ahead ring for the recorder, in samples per channel
pub const DEFAULT_WRITE_BUFFER_SAMPLES: usize = 32768;

/// Control tick period
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Playback side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Look-ahead window per line, in samples
    pub read_ahead_samples: usize,
    /// Longest wait of the audio thread for missing samples, in ms
    pub read_timeout_ms: u64,
    /// Output channels per line bus
    pub channels_per_bus: usize,
    /// Line count of a fresh player
    pub initial_files: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            read_ahead_samples: DEFAULT_READ_AHEAD_SAMPLES,
            read_timeout_ms: 0,
            channels_per_bus: 2,
            initial_files: 1,
        }
    }
}

/// Recording side settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Write-ahead ring size, in samples per channel
    pub write_buffer_samples: usize,
    /// Channels captured per take
    pub num_channels: usize,
    /// 16, 24 or 32 (float)
    pub bit_depth: u16,
    /// Where takes without an explicit name are created
    pub take_directory: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            write_buffer_samples: DEFAULT_WRITE_BUFFER_SAMPLES,
            num_channels: 2,
            bit_depth: 24,
            take_directory: PathBuf::from("."),
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub player: PlayerConfig,
    pub recorder: RecorderConfig,
    /// Period of the control tick, in ms
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            recorder: RecorderConfig::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl EngineConfig {
    /// Load a JSON configuration file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TransportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check value ranges
    ///
    /// # Errors
    /// * `Config` - For zero buffer sizes, zero channel counts, bit depths
    ///   other than 16/24/32, a zero tick interval, or `initial_files`
    ///   outside `1..=MAX_LINES`
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| -> Result<()> {
            Err(TransportError::Config {
                reason: reason.to_string(),
            })
        };

        if self.player.read_ahead_samples == 0 {
            return fail("player.read_ahead_samples must be positive");
        }
        if self.player.channels_per_bus == 0 {
            return fail("player.channels_per_bus must be positive");
        }
        if !(1..=MAX_LINES).contains(&self.player.initial_files) {
            return fail("player.initial_files must be within 1..=16");
        }
        if self.recorder.write_buffer_samples == 0 {
            return fail("recorder.write_buffer_samples must be positive");
        }
        if self.recorder.num_channels == 0 {
            return fail("recorder.num_channels must be positive");
        }
        if !matches!(self.recorder.bit_depth, 16 | 24 | 32) {
            return fail("recorder.bit_depth must be 16, 24 or 32");
        }
        if self.tick_interval_ms == 0 {
            return fail("tick_interval_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.player.read_ahead_samples, 65536);
        assert_eq!(config.recorder.write_buffer_samples, 32768);
        assert_eq!(config.tick_interval_ms, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "player": { "read_timeout_ms": 20 } }"#).unwrap();
        assert_eq!(config.player.read_timeout_ms, 20);
        assert_eq!(config.player.channels_per_bus, 2);
        assert_eq!(config.recorder, RecorderConfig::default());
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn test_save_load_preserves_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.recorder.bit_depth = 16;
        config.player.initial_files = 3;

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_depth() {
        let mut config = EngineConfig::default();
        config.recorder.bit_depth = 8;
        let err = config.validate().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_validate_rejects_too_many_files() {
        let mut config = EngineConfig::default();
        config.player.initial_files = MAX_LINES + 1;
        assert!(config.validate().is_err());
    }
}
