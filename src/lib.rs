// Vizpulse - real-time audio feature extraction for visualizations
//
// Consumes per-band spectral snapshots from an external source and produces
// a stream of feature records (beat detection, intensity, rhythm stability,
// weighted visual parameters) for a visualization consumer.

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod spectrum;
pub mod time;

// Re-exports for convenience
pub use analysis::{BeatDetector, FeatureExtractor, FeatureRecord};
pub use config::{AppConfig, BeatDetectionSettings, BeatSettingsPatch, FeatureMappingTable};
pub use error::PipelineError;
pub use pipeline::{
    ConnectionStatus, PipelineDriver, PipelineState, SpectralSource, TickOutcome, VisualSink,
};
pub use spectrum::{Band, BandEnergies, SpectralSnapshot};
