// Beat history - bounded FIFO of confirmed beat events
//
// The history is owned exclusively by the BeatDetector and mutated in place;
// the intensity and stability estimators read it by shared reference. The
// buffer is pre-allocated at its fixed capacity so steady-state operation
// never reallocates.

use std::collections::VecDeque;
use std::time::Instant;

/// Maximum number of beat events retained; the oldest is evicted past this.
pub const MAX_BEAT_HISTORY: usize = 30;

/// One confirmed beat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatEvent {
    /// Monotonic timestamp at detection.
    pub time: Instant,
    /// Bass energy at detection.
    pub energy: f32,
    /// Overall average power at detection.
    pub power: f32,
}

/// Time-ascending FIFO ring of the most recent beat events.
#[derive(Debug)]
pub struct BeatHistory {
    events: VecDeque<BeatEvent>,
}

impl BeatHistory {
    pub fn new() -> Self {
        Self {
            events: VecDeque::with_capacity(MAX_BEAT_HISTORY),
        }
    }

    /// Append an event, evicting the oldest entry when at capacity.
    pub fn push(&mut self, event: BeatEvent) {
        if self.events.len() == MAX_BEAT_HISTORY {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Most recent beat, if any.
    pub fn last(&self) -> Option<&BeatEvent> {
        self.events.back()
    }

    /// Events oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &BeatEvent> {
        self.events.iter()
    }

    /// Mean bass energy of the most recent `count` events.
    ///
    /// Returns 0.0 for an empty history.
    pub fn recent_energy_mean(&self, count: usize) -> f32 {
        let take = count.min(self.events.len());
        if take == 0 {
            return 0.0;
        }
        let sum: f32 = self
            .events
            .iter()
            .rev()
            .take(take)
            .map(|event| event.energy)
            .sum();
        sum / take as f32
    }

    /// Consecutive inter-beat intervals in seconds, oldest-first.
    pub fn intervals(&self) -> Vec<f32> {
        self.events
            .iter()
            .zip(self.events.iter().skip(1))
            .map(|(prev, next)| next.time.duration_since(prev.time).as_secs_f32())
            .collect()
    }
}

impl Default for BeatHistory {
    fn default() -> Self {
        Self::new()
    }
}
