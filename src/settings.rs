//! Presentation settings and preferences
//!
//! These only shape cosmetic effects (fragment counts for destruction bursts).
//! Nothing here changes simulation outcomes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Fraction of the nominal fragment count spawned by destruction effects
    pub fn fragment_scale(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Fragment effects (shards, crumble chunks, sparkles)
    pub particles: bool,
    /// Reduced motion (halves fragment bursts)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Number of fragments to spawn for an effect with `nominal` fragments
    ///
    /// Returns 0 when particles are disabled. Any enabled effect keeps at
    /// least one fragment so its lifetime is still observable.
    pub fn fragment_count(&self, nominal: usize) -> usize {
        if !self.particles {
            return 0;
        }
        let mut scale = self.quality.fragment_scale();
        if self.reduced_motion {
            scale *= 0.5;
        }
        ((nominal as f32 * scale).round() as usize).max(1)
    }

    /// Read settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read settings from `path`, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {})", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::from_str("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
        assert_eq!(QualityPreset::Low.as_str(), "Low");
    }

    #[test]
    fn test_fragment_count_scaling() {
        let high = Settings::from_preset(QualityPreset::High);
        assert_eq!(high.fragment_count(100), 100);

        let low = Settings::from_preset(QualityPreset::Low);
        assert_eq!(low.fragment_count(100), 25);

        let calm = Settings {
            reduced_motion: true,
            ..high
        };
        assert_eq!(calm.fragment_count(100), 50);

        let off = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(off.fragment_count(100), 0);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load("/nonexistent/void-runner-settings.json");
        assert_eq!(settings.quality, QualityPreset::Medium);
        assert!(Settings::load_from("/nonexistent/void-runner-settings.json").is_err());
    }
}
