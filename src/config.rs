//! Configuration management for dynamic parameter tuning
//!
//! Runtime configuration can be loaded from a JSON file so beat detection
//! and feature mapping parameters can be adjusted without recompilation.
//! Partial updates are expressed as patch structs with all-optional fields,
//! merged over the current values between pipeline ticks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::spectrum::Band;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub beat_detection: BeatDetectionSettings,
    pub feature_mapping: FeatureMappingTable,
}

/// Pipeline driver scheduling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum interval between analysis ticks in milliseconds.
    ///
    /// Callers may invoke `tick()` from a display-refresh callback; ticks
    /// arriving faster than this gate are throttled to one analysis per
    /// interval.
    pub tick_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        // ~60 Hz analysis cadence
        Self {
            tick_interval_ms: 16,
        }
    }
}

/// Beat detection algorithm parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatDetectionSettings {
    /// Static bass-energy threshold, used when the adaptive branch is inactive.
    /// Must be greater than zero.
    pub threshold: f32,
    /// Intensity decay factor; scaled by a fixed gain of 20 over a 500 ms window.
    pub decay: f32,
    /// Refractory interval in seconds; candidate beats closer together than
    /// this are suppressed regardless of energy. Must be non-negative.
    pub minimum_time: f32,
    /// Recompute the threshold from recent beat history instead of using the
    /// static value.
    pub adaptive_threshold: bool,
}

impl Default for BeatDetectionSettings {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            decay: 0.02,
            minimum_time: 0.25,
            adaptive_threshold: true,
        }
    }
}

/// Partial update for [BeatDetectionSettings].
///
/// Fields left as `None` keep their current value. Numeric values are not
/// range-validated here; callers are responsible for supplying sane values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatSettingsPatch {
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub decay: Option<f32>,
    #[serde(default)]
    pub minimum_time: Option<f32>,
    #[serde(default)]
    pub adaptive_threshold: Option<bool>,
}

impl BeatDetectionSettings {
    /// Merge a patch over the current settings, leaving unset fields untouched.
    pub fn apply_patch(&mut self, patch: &BeatSettingsPatch) {
        if let Some(threshold) = patch.threshold {
            self.threshold = threshold;
        }
        if let Some(decay) = patch.decay {
            self.decay = decay;
        }
        if let Some(minimum_time) = patch.minimum_time {
            self.minimum_time = minimum_time;
        }
        if let Some(adaptive_threshold) = patch.adaptive_threshold {
            self.adaptive_threshold = adaptive_threshold;
        }
    }
}

/// How one band's energy contributes to named visual parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandMapping {
    /// Parameter receiving the full weighted energy.
    pub primary: String,
    /// Optional parameter receiving the weighted energy scaled by 0.7.
    #[serde(default)]
    pub secondary: Option<String>,
    /// Non-negative multiplier applied to the band energy.
    pub weight: f32,
}

/// Band-to-parameter mapping table.
///
/// Bands absent from the table are ignored by the mapper; multiple bands may
/// target the same parameter (contributions accumulate).
pub type FeatureMappingTable = HashMap<Band, BandMapping>;

/// Default mapping used when no table is configured.
pub fn default_feature_mapping() -> FeatureMappingTable {
    let mut table = HashMap::new();
    table.insert(
        Band::Bass,
        BandMapping {
            primary: "pulse".to_string(),
            secondary: Some("glow".to_string()),
            weight: 1.0,
        },
    );
    table.insert(
        Band::MidLow,
        BandMapping {
            primary: "swell".to_string(),
            secondary: None,
            weight: 0.8,
        },
    );
    table.insert(
        Band::Mid,
        BandMapping {
            primary: "flow".to_string(),
            secondary: Some("swirl".to_string()),
            weight: 0.7,
        },
    );
    table.insert(
        Band::HighMid,
        BandMapping {
            primary: "shimmer".to_string(),
            secondary: None,
            weight: 0.6,
        },
    );
    table.insert(
        Band::High,
        BandMapping {
            primary: "sparkle".to_string(),
            secondary: Some("shimmer".to_string()),
            weight: 0.5,
        },
    );
    table
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            beat_detection: BeatDetectionSettings::default(),
            feature_mapping: default_feature_mapping(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file.
    ///
    /// Falls back to defaults (with a logged warning) if the file is missing
    /// or fails to parse.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.tick_interval_ms, 16);
        assert_eq!(config.beat_detection.threshold, 0.3);
        assert_eq!(config.beat_detection.minimum_time, 0.25);
        assert!(config.beat_detection.adaptive_threshold);
        assert_eq!(config.feature_mapping.len(), 5);
    }

    #[test]
    fn test_settings_patch_merges_only_set_fields() {
        let mut settings = BeatDetectionSettings::default();
        let patch = BeatSettingsPatch {
            threshold: Some(0.5),
            adaptive_threshold: Some(false),
            ..Default::default()
        };

        settings.apply_patch(&patch);

        assert_eq!(settings.threshold, 0.5);
        assert!(!settings.adaptive_threshold);
        // Untouched fields keep their defaults
        assert_eq!(settings.decay, 0.02);
        assert_eq!(settings.minimum_time, 0.25);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let mut settings = BeatDetectionSettings::default();
        let before = settings.clone();
        settings.apply_patch(&BeatSettingsPatch::default());
        assert_eq!(settings.threshold, before.threshold);
        assert_eq!(settings.decay, before.decay);
        assert_eq!(settings.minimum_time, before.minimum_time);
        assert_eq!(settings.adaptive_threshold, before.adaptive_threshold);
    }

    #[test]
    fn test_settings_patch_json_defaults() {
        // Absent fields deserialize to None
        let patch: BeatSettingsPatch = serde_json::from_str(r#"{"threshold": 0.4}"#).unwrap();
        assert_eq!(patch.threshold, Some(0.4));
        assert!(patch.decay.is_none());
        assert!(patch.minimum_time.is_none());
        assert!(patch.adaptive_threshold.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(
            parsed.pipeline.tick_interval_ms,
            config.pipeline.tick_interval_ms
        );
        assert_eq!(
            parsed.beat_detection.threshold,
            config.beat_detection.threshold
        );
        assert_eq!(
            parsed.feature_mapping.get(&Band::Bass),
            config.feature_mapping.get(&Band::Bass)
        );
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/vizpulse.json");
        assert_eq!(config.beat_detection.threshold, 0.3);
    }
}
