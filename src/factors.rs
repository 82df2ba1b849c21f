// 🏭 Factor Registry - Emission factors as data
// One factor per activity code, immutable once built

use crate::error::{EngineError, EngineResult};
use anyhow::Context as AnyhowContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, info};

// ============================================================================
// EMISSION FACTOR
// ============================================================================

/// kg CO2e emitted per unit of activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionFactor {
    /// Activity code (e.g., "diesel_litre")
    pub activity_code: String,

    /// kg CO2e per unit, always > 0
    pub factor: f64,

    /// Unit the factor is expressed per (e.g., "litre")
    pub per_unit: String,
}

impl EmissionFactor {
    pub fn new(activity_code: impl Into<String>, factor: f64, per_unit: impl Into<String>) -> Self {
        EmissionFactor {
            activity_code: activity_code.into(),
            factor,
            per_unit: per_unit.into(),
        }
    }
}

/// Built-in table: (code, kg CO2e per unit, unit)
const BUILTIN_FACTORS: &[(&str, f64, &str)] = &[
    ("electricity_kwh", 0.43, "kWh"),
    ("diesel_litre", 2.68, "litre"),
    ("petrol_litre", 2.31, "litre"),
    ("r134a_kg", 1430.0, "kg"),
    ("r410a_kg", 2088.0, "kg"),
    ("paper_kg", 1.3, "kg"),
    ("water_m3", 0.344, "m³"),
    ("business_air_domestic_km", 0.27, "km"),
    ("business_air_longhaul_km", 0.15, "km"),
    ("taxi_km", 0.251, "km"),
    ("waste_landfill_kg", 1.9, "kg"),
    ("waste_incineration_kg", 2.5, "kg"),
    ("employee_commute_km", 0.15, "km"),
];

// ============================================================================
// FACTOR REGISTRY
// ============================================================================

/// FactorRegistry - the single source of truth for emission factors
///
/// There is no mutating API: a registry is built once (built-in table or file)
/// and shared read-only, so re-running the same ledger through the same
/// registry always yields the same numbers.
#[derive(Debug, Clone)]
pub struct FactorRegistry {
    factors: BTreeMap<String, EmissionFactor>,
}

impl FactorRegistry {
    /// Registry with the built-in factor table
    pub fn builtin() -> Self {
        let factors = BUILTIN_FACTORS
            .iter()
            .map(|(code, factor, unit)| (code.to_string(), EmissionFactor::new(*code, *factor, *unit)))
            .collect();

        FactorRegistry { factors }
    }

    /// Build from explicit factors, rejecting duplicates and non-positive values
    pub fn from_factors(list: Vec<EmissionFactor>) -> EngineResult<Self> {
        let mut factors = BTreeMap::new();

        for ef in list {
            if !ef.factor.is_finite() || ef.factor <= 0.0 {
                return Err(EngineError::Config(format!(
                    "factor for '{}' must be > 0, got {}",
                    ef.activity_code, ef.factor
                )));
            }
            if factors.contains_key(&ef.activity_code) {
                return Err(EngineError::Config(format!(
                    "duplicate factor for '{}'",
                    ef.activity_code
                )));
            }
            factors.insert(ef.activity_code.clone(), ef);
        }

        Ok(FactorRegistry { factors })
    }

    /// Load a JSON array of factors from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read factor file: {:?}", path.as_ref()))?;

        let list: Vec<EmissionFactor> =
            serde_json::from_str(&content).context("Failed to parse factor JSON")?;

        let registry = FactorRegistry::from_factors(list)?;
        info!(count = registry.count(), path = ?path.as_ref(), "loaded emission factors");
        Ok(registry)
    }

    /// kg CO2e per unit for `activity_code`
    ///
    /// A missing code is a configuration defect: it never defaults to zero.
    pub fn lookup(&self, activity_code: &str) -> EngineResult<f64> {
        match self.factors.get(activity_code) {
            Some(ef) => Ok(ef.factor),
            None => {
                error!(code = activity_code, "emission factor lookup failed");
                Err(EngineError::UnknownActivity {
                    code: activity_code.to_string(),
                })
            }
        }
    }

    pub fn get(&self, activity_code: &str) -> Option<&EmissionFactor> {
        self.factors.get(activity_code)
    }

    pub fn contains(&self, activity_code: &str) -> bool {
        self.factors.contains_key(activity_code)
    }

    /// All factors, ordered by activity code
    pub fn list_all(&self) -> Vec<&EmissionFactor> {
        self.factors.values().collect()
    }

    pub fn count(&self) -> usize {
        self.factors.len()
    }
}

impl Default for FactorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// TESTS
// ============================================================================
