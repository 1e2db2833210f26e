//! Match configuration.
//!
//! Loaded from RON files; every field has a default so a config file only
//! needs to name what it changes.

use std::path::{Path, PathBuf};

use arena_core::agent::StatVariance;
use arena_core::decal::DEFAULT_DECAL_LIFETIME;
use arena_core::math::ArenaBounds;
use arena_render::RenderLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Parsed but unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// External encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Encoder executable, looked up on `PATH` when relative.
    pub binary: PathBuf,
    /// Video file name inside the output directory.
    pub output_file_name: String,
    /// Video codec.
    pub codec: String,
    /// Output pixel format.
    pub pixel_format: String,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            output_file_name: "render.mp4".to_string(),
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
        }
    }
}

/// Everything a match needs besides its players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Sidebar width in pixels, carved from the left of the frame.
    pub sidebar_width: u32,
    /// Ticks per second of video.
    pub fps: u32,
    /// Hard tick ceiling for one match.
    pub max_ticks: u64,
    /// Relative spread applied to class stats at registration.
    pub stat_variance: f32,
    /// Ticks a blood decal stays visible.
    pub decal_lifetime: u32,
    /// Encoder invocation.
    pub encoder: EncoderSettings,
    /// Colours and sidebar metrics.
    pub layout: RenderLayout,
}

impl Default for MatchConfig {
    fn default() -> Self {
        let fps = 60;
        Self {
            width: 960,
            height: 540,
            sidebar_width: 200,
            fps,
            max_ticks: 3 * 60 * u64::from(fps),
            stat_variance: StatVariance::default().band,
            decal_lifetime: DEFAULT_DECAL_LIFETIME,
            encoder: EncoderSettings::default(),
            layout: RenderLayout::default(),
        }
    }
}

impl MatchConfig {
    /// Load a config from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that cannot produce a video.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid("frame size must be non-zero".to_string()));
        }
        // yuv420p subsamples chroma 2x2.
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size {}x{} must be even",
                self.width, self.height
            )));
        }
        if self.sidebar_width >= self.width {
            return Err(ConfigError::Invalid(format!(
                "sidebar ({}) leaves no arena in a {} wide frame",
                self.sidebar_width, self.width
            )));
        }
        if self.fps == 0 {
            return Err(ConfigError::Invalid("fps must be positive".to_string()));
        }
        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid("max_ticks must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&self.stat_variance) {
            return Err(ConfigError::Invalid(format!(
                "stat_variance {} outside [0, 1)",
                self.stat_variance
            )));
        }
        if self.encoder.output_file_name.is_empty() {
            return Err(ConfigError::Invalid("encoder output file name is empty".to_string()));
        }
        Ok(())
    }

    /// Play area for these dimensions.
    #[must_use]
    pub fn bounds(&self) -> ArenaBounds {
        ArenaBounds::new(self.width as f32, self.height as f32, self.sidebar_width as f32)
    }

    /// Stat spread applied at registration.
    #[must_use]
    pub fn variance(&self) -> StatVariance {
        StatVariance {
            band: self.stat_variance,
        }
    }

    /// Convert a tick count to seconds of video.
    #[must_use]
    pub fn ticks_to_secs(&self, ticks: u64) -> f64 {
        ticks as f64 / f64::from(self.fps.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MatchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_ticks, 10_800);
        assert_eq!(config.encoder.output_file_name, "render.mp4");
        assert_eq!(config.bounds(), ArenaBounds::default());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = MatchConfig::from_ron_str("(fps: 30, encoder: (codec: \"libx265\"))").unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.width, 960);
        assert_eq!(config.encoder.codec, "libx265");
        assert_eq!(config.encoder.pixel_format, "yuv420p");
        assert!((config.ticks_to_secs(90) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        let err = MatchConfig::from_ron_str("(width: 961)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_bad_ron_is_parse_error() {
        let err = MatchConfig::from_ron_str("(fps: \"fast\")").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = MatchConfig::load("/definitely/not/a/config.ron").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_bundled_config_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/default.ron");
        assert_eq!(MatchConfig::load(path).unwrap(), MatchConfig::default());
    }
}
