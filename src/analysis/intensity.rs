// Beat intensity - instant attack, linear decay
//
// Intensity rises to 1.0 on the exact tick a beat is confirmed and decays
// linearly afterward. The decay is normalized to a 500 ms window and scaled
// by the configured decay factor times a fixed gain of 20, which decouples
// the perceptual pulse length from the tick rate.

use std::time::Instant;

use crate::analysis::history::BeatHistory;

/// Window over which elapsed time since the last beat is normalized.
const DECAY_WINDOW_SECS: f32 = 0.5;

/// Fixed gain applied to the configured decay factor.
const DECAY_GAIN: f32 = 20.0;

/// Continuous 0-1 beat intensity derived from the beat history.
pub fn beat_intensity(history: &BeatHistory, beat_detected: bool, now: Instant, decay: f32) -> f32 {
    if history.len() < 2 {
        return if beat_detected { 1.0 } else { 0.0 };
    }

    if beat_detected {
        return 1.0;
    }

    let last = match history.last() {
        Some(event) => event,
        None => return 0.0,
    };

    let elapsed = now.duration_since(last.time).as_secs_f32();
    let normalized = (elapsed / DECAY_WINDOW_SECS).min(1.0);
    (1.0 - normalized * decay * DECAY_GAIN).max(0.0)
}
