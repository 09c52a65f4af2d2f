// Rhythm stability - coefficient of variation over inter-beat intervals
//
// Normalizing the interval standard deviation by the mean makes the score
// tempo-independent: a steady slow beat and a steady fast beat both score
// near 1.0.

use crate::analysis::history::BeatHistory;

/// Minimum history length for a meaningful estimate.
const MIN_EVENTS: usize = 4;

/// Neutral score returned while the history is too short to judge.
const NEUTRAL_STABILITY: f32 = 0.5;

/// 0-1 rhythm stability computed purely from the beat history.
pub fn rhythm_stability(history: &BeatHistory) -> f32 {
    if history.len() < MIN_EVENTS {
        return NEUTRAL_STABILITY;
    }

    let intervals = history.intervals();
    let avg_interval = intervals.iter().sum::<f32>() / intervals.len() as f32;

    // Near-simultaneous duplicate timestamps: treat as minimum stability
    // rather than dividing by zero.
    if avg_interval == 0.0 {
        return 0.0;
    }

    let variance = intervals
        .iter()
        .map(|interval| (interval - avg_interval).powi(2))
        .sum::<f32>()
        / intervals.len() as f32;
    let std_dev = variance.sqrt();
    let normalized_deviation = (std_dev / avg_interval).min(1.0);

    1.0 - normalized_deviation
}
