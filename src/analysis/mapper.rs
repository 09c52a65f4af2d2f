// FeatureMapper - weighted band-energy to visual-parameter accumulation
//
// Each mapped band contributes energy x weight to its primary parameter and
// 70% of that to its optional secondary parameter. Accumulation is additive
// and order-independent; results are unbounded above zero, and downstream
// consumers clamp or scale to their own visual ranges.

use std::collections::HashMap;

use crate::config::FeatureMappingTable;
use crate::spectrum::{Band, BandEnergies};

/// Fraction of the weighted energy routed to a secondary parameter.
const SECONDARY_RATIO: f32 = 0.7;

/// Applies a configurable mapping table to per-band energies.
pub struct FeatureMapper {
    table: FeatureMappingTable,
}

impl FeatureMapper {
    pub fn new(table: FeatureMappingTable) -> Self {
        Self { table }
    }

    /// Accumulate weighted band energies into named visual parameters.
    ///
    /// Bands absent from the table contribute nothing.
    pub fn map(&self, energies: &BandEnergies) -> HashMap<String, f32> {
        let mut visual_params: HashMap<String, f32> = HashMap::new();

        for band in Band::ALL {
            let Some(mapping) = self.table.get(&band) else {
                continue;
            };

            let weighted = energies.get(band) * mapping.weight;
            *visual_params.entry(mapping.primary.clone()).or_insert(0.0) += weighted;

            if let Some(ref secondary) = mapping.secondary {
                *visual_params.entry(secondary.clone()).or_insert(0.0) +=
                    weighted * SECONDARY_RATIO;
            }
        }

        visual_params
    }

    pub fn table(&self) -> &FeatureMappingTable {
        &self.table
    }

    /// Replace the table wholesale.
    pub fn set_table(&mut self, table: FeatureMappingTable) {
        self.table = table;
    }

    /// Merge a partial table over the current one; bands not named in the
    /// update keep their current mapping.
    pub fn merge_table(&mut self, update: FeatureMappingTable) {
        self.table.extend(update);
    }
}
