//! Pipeline driver: tick-scheduled orchestration of the analysis chain.
//!
//! The driver owns the feature extractor and two trait-based collaborators:
//! a [SpectralSource] it pulls snapshots from and a [VisualSink] it forwards
//! feature records to. Each tick runs to completion before the next is
//! considered; there are no suspension points inside a tick. Per-tick
//! collaborator failures are logged and the tick is dropped; only an explicit
//! `stop()` halts the pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use crate::analysis::{FeatureExtractor, FeatureRecord};
use crate::config::{AppConfig, BeatSettingsPatch, FeatureMappingTable};
use crate::error::PipelineError;
use crate::spectrum::SpectralSnapshot;
use crate::time::{SystemTimeSource, TimeSource};

/// Capacity of the feature broadcast channel; lagged subscribers drop the
/// oldest records.
const FEATURE_CHANNEL_CAPACITY: usize = 100;

/// External producer of spectral snapshots (FFT acquisition lives behind it).
pub trait SpectralSource: Send {
    fn is_initialized(&self) -> bool;

    /// Pull one snapshot. `Ok(None)` means no data this tick, which the
    /// driver treats as a skipped tick, not an error.
    fn sample(&mut self) -> anyhow::Result<Option<SpectralSnapshot>>;
}

/// External consumer of feature records.
///
/// Must not block longer than the tick interval or it becomes the system's
/// bottleneck. The driver imposes no retry on failure.
pub trait VisualSink: Send {
    fn is_initialized(&self) -> bool;

    fn consume(&mut self, record: &FeatureRecord) -> anyhow::Result<()>;
}

/// Pipeline lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Active,
    Stopped,
}

/// Outcome of a single `tick()` call, mainly for tests and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Pipeline is not `Active`.
    Inactive,
    /// Call arrived inside the minimum tick interval and was gated.
    Throttled,
    /// Source produced no data or failed; no record forwarded.
    Skipped,
    /// Full analysis ran and a record was produced. Delivery failures are
    /// logged but do not change the outcome.
    Completed(FeatureRecord),
}

/// Read-only diagnostic snapshot of the pipeline's wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub analyzer_initialized: bool,
    pub visualizer_initialized: bool,
    pub data_flow_active: bool,
    pub beat_history_length: usize,
    pub is_active: bool,
}

/// Handle for requesting a cooperative stop from outside the run loop.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Orchestrates sampling, analysis, and delivery at a fixed cadence.
pub struct PipelineDriver {
    source: Box<dyn SpectralSource>,
    sink: Box<dyn VisualSink>,
    extractor: FeatureExtractor,
    time_source: Arc<dyn TimeSource>,
    state: PipelineState,
    initialized: bool,
    tick_interval: Duration,
    last_tick: Option<Instant>,
    data_flow_active: bool,
    stop_requested: Arc<AtomicBool>,
    feature_tx: broadcast::Sender<FeatureRecord>,
}

impl PipelineDriver {
    pub fn new(
        source: Box<dyn SpectralSource>,
        sink: Box<dyn VisualSink>,
        config: &AppConfig,
    ) -> Self {
        Self::with_time_source(source, sink, config, Arc::new(SystemTimeSource::default()))
    }

    /// Construct with an explicit time source (deterministic in tests).
    pub fn with_time_source(
        source: Box<dyn SpectralSource>,
        sink: Box<dyn VisualSink>,
        config: &AppConfig,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let start = time_source.now();
        let extractor = FeatureExtractor::new(
            config.beat_detection.clone(),
            config.feature_mapping.clone(),
            start,
        );
        let (feature_tx, _) = broadcast::channel(FEATURE_CHANNEL_CAPACITY);

        Self {
            source,
            sink,
            extractor,
            time_source,
            state: PipelineState::Idle,
            initialized: false,
            tick_interval: Duration::from_millis(config.pipeline.tick_interval_ms),
            last_tick: None,
            data_flow_active: false,
            stop_requested: Arc::new(AtomicBool::new(false)),
            feature_tx,
        }
    }

    /// Verify both collaborators are ready. On failure the pipeline stays
    /// `Idle` and the offending side is named in the error.
    pub fn initialize(&mut self) -> Result<(), PipelineError> {
        if !self.source.is_initialized() {
            log::warn!("[Pipeline] Spectral source not ready; staying idle");
            return Err(PipelineError::AnalyzerNotReady);
        }
        if !self.sink.is_initialized() {
            log::warn!("[Pipeline] Visualization consumer not ready; staying idle");
            return Err(PipelineError::VisualizerNotReady);
        }
        self.initialized = true;
        log::info!("[Pipeline] Initialized");
        Ok(())
    }

    /// Transition `Idle`/`Stopped` to `Active`. Re-entrant calls while
    /// already `Active` are no-ops.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if !self.initialized {
            return Err(PipelineError::NotInitialized);
        }
        if self.state == PipelineState::Active {
            return Ok(());
        }
        self.stop_requested.store(false, Ordering::SeqCst);
        self.state = PipelineState::Active;
        log::info!("[Pipeline] Started");
        Ok(())
    }

    /// Transition `Active` to `Stopped`. Idempotent.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Active {
            self.state = PipelineState::Stopped;
            self.data_flow_active = false;
            log::info!("[Pipeline] Stopped");
        }
    }

    /// Handle that requests a cooperative stop, observed at the top of the
    /// next tick.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Arc::clone(&self.stop_requested),
        }
    }

    /// Subscribe to the feature record broadcast (diagnostic tap; the sink
    /// remains the primary consumer).
    pub fn subscribe(&self) -> broadcast::Receiver<FeatureRecord> {
        self.feature_tx.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Merge a partial beat-detection settings update; effective next tick.
    pub fn update_beat_detection_settings(&mut self, patch: &BeatSettingsPatch) {
        self.extractor.apply_settings_patch(patch);
    }

    /// Merge a partial feature-mapping update; effective next tick.
    pub fn update_feature_mapping(&mut self, update: FeatureMappingTable) {
        self.extractor.merge_mapping(update);
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus {
            analyzer_initialized: self.source.is_initialized(),
            visualizer_initialized: self.sink.is_initialized(),
            data_flow_active: self.data_flow_active,
            beat_history_length: self.extractor.beat_history_len(),
            is_active: self.state == PipelineState::Active,
        }
    }

    /// Run one analysis tick.
    ///
    /// Safe to call from any scheduling source (timer, render-loop hook,
    /// dedicated thread); calls arriving faster than the configured interval
    /// are throttled to one analysis per interval.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stop_requested.load(Ordering::SeqCst) {
            self.stop();
        }
        if self.state != PipelineState::Active {
            return TickOutcome::Inactive;
        }

        let now = self.time_source.now();
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < self.tick_interval {
                return TickOutcome::Throttled;
            }
        }
        self.last_tick = Some(now);

        let snapshot = match self.source.sample() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                log::debug!("[Pipeline] No spectral data this tick; skipping");
                self.data_flow_active = false;
                return TickOutcome::Skipped;
            }
            Err(err) => {
                log::warn!("[Pipeline] Spectral source failed: {err:#}; skipping tick");
                self.data_flow_active = false;
                return TickOutcome::Skipped;
            }
        };

        let record = self.extractor.process(&snapshot, now);
        self.data_flow_active = true;

        // Diagnostic tap; no subscribers is fine.
        let _ = self.feature_tx.send(record.clone());

        if let Err(err) = self.sink.consume(&record) {
            log::warn!("[Pipeline] Consumer rejected record: {err:#}; tick dropped");
        }

        TickOutcome::Completed(record)
    }

    /// Drive `tick()` from a tokio interval until stopped.
    ///
    /// No timeout is applied to the source call: a slow source degrades the
    /// effective cadence rather than being cancelled mid-tick.
    pub async fn run(&mut self) {
        let period = self.tick_interval.max(Duration::from_millis(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if self.tick() == TickOutcome::Inactive {
                break;
            }
        }
    }
}
