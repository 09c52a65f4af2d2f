// Spectrum types - per-band energy snapshots consumed by the analysis pipeline
//
// A SpectralSnapshot is the read-only input produced once per tick by an
// external spectral source (FFT acquisition is out of scope for this crate).

use serde::{Deserialize, Serialize};

/// Analysis frequency bands, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Band {
    Bass,
    MidLow,
    Mid,
    HighMid,
    High,
}

impl Band {
    /// All bands in ascending frequency order.
    pub const ALL: [Band; 5] = [
        Band::Bass,
        Band::MidLow,
        Band::Mid,
        Band::HighMid,
        Band::High,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Band::Bass => "bass",
            Band::MidLow => "midLow",
            Band::Mid => "mid",
            Band::HighMid => "highMid",
            Band::High => "high",
        }
    }
}

/// Normalized energy per band, each in 0.0-1.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandEnergies {
    pub bass: f32,
    pub mid_low: f32,
    pub mid: f32,
    pub high_mid: f32,
    pub high: f32,
}

impl BandEnergies {
    pub fn get(&self, band: Band) -> f32 {
        match band {
            Band::Bass => self.bass,
            Band::MidLow => self.mid_low,
            Band::Mid => self.mid,
            Band::HighMid => self.high_mid,
            Band::High => self.high,
        }
    }

    /// Unweighted mean across all five bands.
    ///
    /// This is the `total_energy` reported in each feature record and is
    /// independent of any feature mapping weights.
    pub fn mean(&self) -> f32 {
        Band::ALL.iter().map(|b| self.get(*b)).sum::<f32>() / Band::ALL.len() as f32
    }
}

/// One tick's worth of spectral data from the source.
///
/// `beat_candidate` is the source's raw energy-rise signal; the beat detector
/// confirms or rejects it against its adaptive threshold and refractory gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectralSnapshot {
    pub bands: BandEnergies,
    /// Overall average power in 0.0-1.0.
    pub average_power: f32,
    pub beat_candidate: bool,
}

impl SpectralSnapshot {
    pub fn new(bands: BandEnergies, average_power: f32, beat_candidate: bool) -> Self {
        Self {
            bands,
            average_power,
            beat_candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_lookup_matches_fields() {
        let energies = BandEnergies {
            bass: 0.1,
            mid_low: 0.2,
            mid: 0.3,
            high_mid: 0.4,
            high: 0.5,
        };

        assert_eq!(energies.get(Band::Bass), 0.1);
        assert_eq!(energies.get(Band::MidLow), 0.2);
        assert_eq!(energies.get(Band::Mid), 0.3);
        assert_eq!(energies.get(Band::HighMid), 0.4);
        assert_eq!(energies.get(Band::High), 0.5);
    }

    #[test]
    fn test_mean_is_unweighted() {
        let energies = BandEnergies {
            bass: 1.0,
            mid_low: 0.0,
            mid: 0.0,
            high_mid: 0.0,
            high: 0.0,
        };
        assert!((energies.mean() - 0.2).abs() < 1e-6);

        let flat = BandEnergies {
            bass: 0.5,
            mid_low: 0.5,
            mid: 0.5,
            high_mid: 0.5,
            high: 0.5,
        };
        assert!((flat.mean() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(Band::Bass.label(), "bass");
        assert_eq!(Band::MidLow.label(), "midLow");
        assert_eq!(Band::High.label(), "high");
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let snapshot = SpectralSnapshot::new(
            BandEnergies {
                bass: 0.9,
                mid_low: 0.4,
                mid: 0.3,
                high_mid: 0.2,
                high: 0.1,
            },
            0.8,
            true,
        );

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: SpectralSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert!(json.contains("averagePower"));
    }
}
