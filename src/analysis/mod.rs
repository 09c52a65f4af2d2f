// Analysis module - per-tick feature extraction pipeline
//
// This module orchestrates the analysis of one spectral snapshot into one
// feature record:
//
//   SpectralSnapshot -> BeatDetector -> intensity + stability -> FeatureMapper
//
// All carried state lives in the beat history, the detection settings, and
// the mapping table; everything else is recomputed fresh each tick.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{BeatDetectionSettings, BeatSettingsPatch, FeatureMappingTable};
use crate::spectrum::SpectralSnapshot;

pub mod beat;
pub mod history;
pub mod intensity;
pub mod mapper;
pub mod stability;

pub use beat::BeatDetector;
pub use history::{BeatEvent, BeatHistory, MAX_BEAT_HISTORY};
pub use mapper::FeatureMapper;

/// Per-tick analysis output consumed by the visualization side.
///
/// Created fresh each tick and never mutated afterward; carries no identity
/// beyond its tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRecord {
    /// The snapshot this record was computed from.
    pub snapshot: SpectralSnapshot,
    /// Whether a beat was confirmed on this tick.
    pub beat_detected: bool,
    /// 0-1 intensity: 1.0 on the confirming tick, decaying afterward.
    pub beat_intensity: f32,
    /// Accumulated weighted energies keyed by visual parameter name.
    pub visual_params: HashMap<String, f32>,
    /// Unweighted mean of all band energies.
    pub total_energy: f32,
    /// 0-1 score from inter-beat interval variance; 0.5 until enough history.
    pub rhythm_stability: f32,
    /// Milliseconds since pipeline start.
    pub timestamp_ms: u64,
}

/// Runs one snapshot through the full analysis chain.
pub struct FeatureExtractor {
    detector: BeatDetector,
    mapper: FeatureMapper,
    start: Instant,
}

impl FeatureExtractor {
    pub fn new(
        settings: BeatDetectionSettings,
        mapping: FeatureMappingTable,
        start: Instant,
    ) -> Self {
        Self {
            detector: BeatDetector::new(settings),
            mapper: FeatureMapper::new(mapping),
            start,
        }
    }

    /// Analyze one snapshot, producing the enriched feature record.
    pub fn process(&mut self, snapshot: &SpectralSnapshot, now: Instant) -> FeatureRecord {
        let beat_detected = self.detector.detect(
            snapshot.beat_candidate,
            snapshot.bands.bass,
            snapshot.average_power,
            now,
        );
        let beat_intensity = self.detector.intensity(beat_detected, now);
        let rhythm_stability = self.detector.stability();
        let visual_params = self.mapper.map(&snapshot.bands);
        let total_energy = snapshot.bands.mean();

        FeatureRecord {
            snapshot: *snapshot,
            beat_detected,
            beat_intensity,
            visual_params,
            total_energy,
            rhythm_stability,
            timestamp_ms: now.duration_since(self.start).as_millis() as u64,
        }
    }

    pub fn beat_history_len(&self) -> usize {
        self.detector.history().len()
    }

    /// Merge a partial beat-detection settings update.
    pub fn apply_settings_patch(&mut self, patch: &BeatSettingsPatch) {
        self.detector.apply_settings_patch(patch);
    }

    /// Merge a partial feature-mapping update.
    pub fn merge_mapping(&mut self, update: FeatureMappingTable) {
        self.mapper.merge_table(update);
    }

    pub fn detector(&self) -> &BeatDetector {
        &self.detector
    }

    pub fn mapper(&self) -> &FeatureMapper {
        &self.mapper
    }
}
