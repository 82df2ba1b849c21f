// 🧮 Row Enrichment - factor lookup and CO2e per entry
// A pure projection of Ledger + FactorRegistry, never stored

use crate::error::EngineResult;
use crate::factors::FactorRegistry;
use crate::ledger::{ActivityEntry, Ledger};
use serde::{Deserialize, Serialize};

/// An entry with its factor and emissions; no rounding applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub activity_code: String,
    pub quantity: f64,
    pub unit: String,
    pub scope: u8,
    pub quality: String,
    pub ef: f64,
    #[serde(rename = "kgCO2e")]
    pub kg_co2e: f64,
    #[serde(rename = "tCO2e")]
    pub t_co2e: f64,
}

/// kgCO2e = quantity × ef, tCO2e = kgCO2e / 1000
pub fn enrich(entry: &ActivityEntry, registry: &FactorRegistry) -> EngineResult<EnrichedRow> {
    let ef = registry.lookup(&entry.activity_code)?;
    let kg_co2e = entry.quantity * ef;

    Ok(EnrichedRow {
        activity_code: entry.activity_code.clone(),
        quantity: entry.quantity,
        unit: entry.unit.clone(),
        scope: entry.scope,
        quality: entry.quality.clone(),
        ef,
        kg_co2e,
        t_co2e: kg_co2e / 1000.0,
    })
}

/// Enrich the whole ledger in order; the first unknown code aborts the run
pub fn enrich_all(ledger: &Ledger, registry: &FactorRegistry) -> EngineResult<Vec<EnrichedRow>> {
    ledger
        .entries()
        .iter()
        .map(|entry| enrich(entry, registry))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
