// BeatDetector - adaptive-threshold beat confirmation with a refractory gate
//
// The source supplies a raw candidate signal from its simpler energy-rise
// check; this detector confirms or rejects it:
// 1. Refractory gate: candidates inside `minimum_time` of the last confirmed
//    beat are vetoed regardless of energy, preventing double-triggering on a
//    single transient.
// 2. Threshold: with adaptive thresholding enabled and more than 5 events of
//    history, the threshold anchors to recent local energy (mean of the last
//    5 confirmed energies x 0.8) so the detector stays calibrated as track
//    loudness changes. Otherwise the static configured threshold applies.
// 3. Confirmation requires both the candidate signal and bass energy above
//    the threshold.
//
// The refractory gate deliberately ignores the adaptive flag, and the
// adaptive branch silently falls back to the static threshold with 5 or
// fewer events.

use std::time::Instant;

use crate::analysis::history::{BeatEvent, BeatHistory};
use crate::analysis::{intensity, stability};
use crate::config::{BeatDetectionSettings, BeatSettingsPatch};

/// Fraction of the recent-energy mean used as the adaptive threshold.
const ADAPTIVE_THRESHOLD_RATIO: f32 = 0.8;

/// Number of recent events averaged for the adaptive threshold; also the
/// minimum history length (exclusive) for the adaptive branch to engage.
const ADAPTIVE_WINDOW: usize = 5;

/// Confirms candidate beats and owns the bounded beat history.
pub struct BeatDetector {
    settings: BeatDetectionSettings,
    history: BeatHistory,
}

impl BeatDetector {
    pub fn new(settings: BeatDetectionSettings) -> Self {
        Self {
            settings,
            history: BeatHistory::new(),
        }
    }

    /// Decide whether a beat occurred on this tick.
    ///
    /// `candidate` is the source's raw energy-rise signal. On confirmation the
    /// event is appended to the history and `true` is returned.
    pub fn detect(
        &mut self,
        candidate: bool,
        bass_energy: f32,
        average_power: f32,
        now: Instant,
    ) -> bool {
        if let Some(last) = self.history.last() {
            let since_last = now.duration_since(last.time).as_secs_f32();
            if since_last < self.settings.minimum_time {
                return false;
            }
        }

        let threshold = self.current_threshold();

        if candidate && bass_energy > threshold {
            self.history.push(BeatEvent {
                time: now,
                energy: bass_energy,
                power: average_power,
            });
            log::debug!(
                "[BeatDetector] Beat confirmed: energy={:.3} threshold={:.3} history={}",
                bass_energy,
                threshold,
                self.history.len()
            );
            return true;
        }

        false
    }

    /// Threshold in effect for the next candidate.
    pub fn current_threshold(&self) -> f32 {
        if self.settings.adaptive_threshold && self.history.len() > ADAPTIVE_WINDOW {
            self.history.recent_energy_mean(ADAPTIVE_WINDOW) * ADAPTIVE_THRESHOLD_RATIO
        } else {
            self.settings.threshold
        }
    }

    /// Continuous 0-1 beat intensity; 1.0 on the confirming tick, decaying
    /// afterward.
    pub fn intensity(&self, beat_detected: bool, now: Instant) -> f32 {
        intensity::beat_intensity(&self.history, beat_detected, now, self.settings.decay)
    }

    /// 0-1 rhythm stability from inter-beat interval variance.
    pub fn stability(&self) -> f32 {
        stability::rhythm_stability(&self.history)
    }

    pub fn history(&self) -> &BeatHistory {
        &self.history
    }

    pub fn settings(&self) -> &BeatDetectionSettings {
        &self.settings
    }

    /// Replace the settings wholesale.
    pub fn set_settings(&mut self, settings: BeatDetectionSettings) {
        self.settings = settings;
    }

    /// Merge a partial settings update; unset fields keep their values.
    pub fn apply_settings_patch(&mut self, patch: &BeatSettingsPatch) {
        self.settings.apply_patch(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn detector_with(threshold: f32, minimum_time: f32, adaptive: bool) -> BeatDetector {
        BeatDetector::new(BeatDetectionSettings {
            threshold,
            decay: 0.02,
            minimum_time,
            adaptive_threshold: adaptive,
        })
    }

    #[test]
    fn test_no_beats_without_candidate_signal() {
        let base = Instant::now();
        let mut detector = detector_with(0.2, 0.0, false);

        // Flat, high-energy signal but the candidate flag never rises
        for i in 0..20u64 {
            let now = base + Duration::from_millis(i * 100);
            assert!(!detector.detect(false, 0.9, 0.8, now));
        }
        assert!(detector.history().is_empty());
    }

    #[test]
    fn test_candidate_below_threshold_rejected() {
        let base = Instant::now();
        let mut detector = detector_with(0.5, 0.0, false);
        assert!(!detector.detect(true, 0.4, 0.4, base));
        assert!(detector.history().is_empty());
    }

    #[test]
    fn test_confirmation_appends_event() {
        let base = Instant::now();
        let mut detector = detector_with(0.2, 0.0, false);
        assert!(detector.detect(true, 0.9, 0.8, base));

        let event = detector.history().last().unwrap();
        assert_eq!(event.energy, 0.9);
        assert_eq!(event.power, 0.8);
        assert_eq!(event.time, base);
    }

    #[test]
    fn test_refractory_suppresses_regardless_of_energy() {
        let base = Instant::now();
        let mut detector = detector_with(0.2, 0.25, false);

        assert!(detector.detect(true, 0.9, 0.8, base));
        // 100 ms later, maximum energy: still vetoed
        let early = base + Duration::from_millis(100);
        assert!(!detector.detect(true, 1.0, 1.0, early));
        // Past the refractory interval: confirmed
        let later = base + Duration::from_millis(300);
        assert!(detector.detect(true, 0.9, 0.8, later));
        assert_eq!(detector.history().len(), 2);
    }

    #[test]
    fn test_empty_history_has_no_refractory_veto() {
        let base = Instant::now();
        let mut detector = detector_with(0.2, 10.0, false);
        // Huge minimum_time, but nothing to be refractory against
        assert!(detector.detect(true, 0.9, 0.8, base));
    }

    #[test]
    fn test_adaptive_threshold_requires_more_than_five_events() {
        let base = Instant::now();
        let mut detector = detector_with(0.3, 0.0, true);

        // With 5 or fewer events the static threshold applies
        for i in 0..5u64 {
            let now = base + Duration::from_millis(i * 300);
            assert!(detector.detect(true, 0.5, 0.5, now));
            assert_eq!(detector.settings().threshold, detector.current_threshold());
        }

        // Sixth event tips the history past the gate
        let now = base + Duration::from_millis(5 * 300);
        assert!(detector.detect(true, 0.5, 0.5, now));
        let expected = 0.5 * ADAPTIVE_THRESHOLD_RATIO;
        assert!((detector.current_threshold() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_threshold_tracks_recent_energy() {
        let base = Instant::now();
        let mut detector = detector_with(0.1, 0.0, true);

        // Loud section
        for i in 0..6u64 {
            let now = base + Duration::from_millis(i * 300);
            assert!(detector.detect(true, 0.9, 0.8, now));
        }
        assert!((detector.current_threshold() - 0.9 * ADAPTIVE_THRESHOLD_RATIO).abs() < 1e-6);

        // A quieter candidate below the adapted threshold is rejected even
        // though it clears the static threshold
        let now = base + Duration::from_millis(6 * 300);
        assert!(!detector.detect(true, 0.5, 0.5, now));
    }

    #[test]
    fn test_adaptive_flag_off_keeps_static_threshold() {
        let base = Instant::now();
        let mut detector = detector_with(0.3, 0.0, false);
        for i in 0..10u64 {
            let now = base + Duration::from_millis(i * 300);
            detector.detect(true, 0.9, 0.8, now);
        }
        assert_eq!(detector.current_threshold(), 0.3);
    }

    #[test]
    fn test_settings_patch_takes_effect() {
        let base = Instant::now();
        let mut detector = detector_with(0.2, 0.0, false);
        assert!(detector.detect(true, 0.5, 0.5, base));

        detector.apply_settings_patch(&BeatSettingsPatch {
            threshold: Some(0.8),
            ..Default::default()
        });

        let now = base + Duration::from_millis(300);
        assert!(!detector.detect(true, 0.5, 0.5, now));
    }
}
