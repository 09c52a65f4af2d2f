use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::Rng;

use vizpulse::pipeline::{PipelineDriver, SpectralSource, VisualSink};
use vizpulse::spectrum::{BandEnergies, SpectralSnapshot};
use vizpulse::{AppConfig, FeatureRecord};

#[derive(Parser, Debug)]
#[command(
    name = "vizpulse_cli",
    about = "Synthetic-source harness for the vizpulse analysis pipeline"
)]
struct Cli {
    /// Optional JSON configuration file (defaults are used when absent)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline against a synthetic beat source, streaming feature
    /// records to stdout as JSON lines
    Run {
        /// Tempo of the synthetic bass pulses
        #[arg(long, default_value_t = 120)]
        bpm: u32,
        /// How long to run before stopping
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
    },
    /// Print the effective configuration as JSON
    DumpConfig,
}

/// Synthetic spectral source: bass pulses on a BPM grid with random
/// mid/high texture, standing in for a real FFT analyzer.
struct SyntheticSource {
    beat_period: Duration,
    tick: Duration,
    since_beat: Duration,
}

impl SyntheticSource {
    fn new(bpm: u32, tick: Duration) -> Self {
        let bpm = bpm.max(1);
        Self {
            beat_period: Duration::from_secs_f64(60.0 / bpm as f64),
            tick,
            since_beat: Duration::from_secs(3600),
        }
    }
}

impl SpectralSource for SyntheticSource {
    fn is_initialized(&self) -> bool {
        true
    }

    fn sample(&mut self) -> Result<Option<SpectralSnapshot>> {
        let mut rng = rand::thread_rng();

        self.since_beat += self.tick;

        let on_beat = self.since_beat >= self.beat_period;
        if on_beat {
            self.since_beat = Duration::ZERO;
        }

        // Bass spikes on the grid and relaxes between pulses
        let decay = (self.since_beat.as_secs_f32() / self.beat_period.as_secs_f32()).min(1.0);
        let bass = if on_beat {
            0.85 + rng.gen_range(0.0..0.15)
        } else {
            (0.6 * (1.0 - decay)).max(0.05)
        };

        let bands = BandEnergies {
            bass,
            mid_low: rng.gen_range(0.2..0.5),
            mid: rng.gen_range(0.2..0.6),
            high_mid: rng.gen_range(0.1..0.4),
            high: rng.gen_range(0.05..0.3),
        };
        let average_power = bands.mean();

        Ok(Some(SpectralSnapshot::new(bands, average_power, on_beat)))
    }
}

/// Prints each feature record as one JSON line.
struct StdoutSink;

impl VisualSink for StdoutSink {
    fn is_initialized(&self) -> bool {
        true
    }

    fn consume(&mut self, record: &FeatureRecord) -> Result<()> {
        println!("{}", serde_json::to_string(record)?);
        Ok(())
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Run { bpm, duration_secs } => run_pipeline(&config, bpm, duration_secs),
        Commands::DumpConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_pipeline(config: &AppConfig, bpm: u32, duration_secs: u64) -> Result<ExitCode> {
    let tick = Duration::from_millis(config.pipeline.tick_interval_ms);
    let source = SyntheticSource::new(bpm, tick);
    let mut driver = PipelineDriver::new(Box::new(source), Box::new(StdoutSink), config);

    driver.initialize()?;
    driver.start()?;
    let stop = driver.stop_handle();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(duration_secs)).await;
            stop.request_stop();
        });
        driver.run().await;
    });

    Ok(ExitCode::from(0))
}
