// 🔌 Estimation Calculator - Scope 2 proxies
// Converts a non-metered proxy into an equivalent kWh quantity

use crate::error::{EngineError, EngineResult, ValidationError};
use crate::ledger::QUALITY_ESTIMATED_PROXY;
use anyhow::Context as AnyhowContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{error, info};

// ============================================================================
// PREMISE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PremiseType {
    Office,
    Retail,
    Warehouse,
}

impl PremiseType {
    pub const ALL: [PremiseType; 3] = [PremiseType::Office, PremiseType::Retail, PremiseType::Warehouse];

    pub fn label(&self) -> &'static str {
        match self {
            PremiseType::Office => "Office",
            PremiseType::Retail => "Retail",
            PremiseType::Warehouse => "Warehouse",
        }
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Intensity constants used by the proxies (kWh per unit of proxy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// kWh per m² of floor area
    #[serde(default = "default_area_intensity")]
    pub area_intensity: f64,

    /// kWh per occupant
    #[serde(default = "default_occupant_intensity")]
    pub occupant_intensity: f64,

    /// kWh per m² by premise category
    #[serde(default = "default_premise_intensity")]
    pub premise_intensity: BTreeMap<PremiseType, f64>,
}

fn default_area_intensity() -> f64 {
    200.0
}

fn default_occupant_intensity() -> f64 {
    1000.0
}

fn default_premise_intensity() -> BTreeMap<PremiseType, f64> {
    BTreeMap::from([
        (PremiseType::Office, 200.0),
        (PremiseType::Retail, 300.0),
        (PremiseType::Warehouse, 90.0),
    ])
}

impl Default for EstimationConfig {
    fn default() -> Self {
        EstimationConfig {
            area_intensity: default_area_intensity(),
            occupant_intensity: default_occupant_intensity(),
            premise_intensity: default_premise_intensity(),
        }
    }
}

impl EstimationConfig {
    /// Read a JSON config file; missing keys fall back to the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read estimation config: {:?}", path.as_ref()))?;

        let config: EstimationConfig =
            serde_json::from_str(&content).context("Failed to parse estimation config JSON")?;
        Ok(config)
    }

    /// Defaults, or the given file, validated once at startup
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(p) => EstimationConfig::from_file(p)?,
            None => EstimationConfig::default(),
        };
        config.validate()?;
        info!(
            area_intensity = config.area_intensity,
            occupant_intensity = config.occupant_intensity,
            "estimation constants loaded"
        );
        Ok(config)
    }

    /// Every constant must be finite and > 0, and every premise type covered
    pub fn validate(&self) -> EngineResult<()> {
        let mut problems = Vec::new();

        if !is_positive(self.area_intensity) {
            problems.push(format!("area_intensity must be > 0, got {}", self.area_intensity));
        }
        if !is_positive(self.occupant_intensity) {
            problems.push(format!(
                "occupant_intensity must be > 0, got {}",
                self.occupant_intensity
            ));
        }
        for premise in PremiseType::ALL {
            match self.premise_intensity.get(&premise) {
                Some(v) if is_positive(*v) => {}
                Some(v) => problems.push(format!("premise intensity for {} must be > 0, got {}", premise.label(), v)),
                None => problems.push(format!("premise intensity for {} is missing", premise.label())),
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Config(problems.join("; ")))
        }
    }

    fn premise(&self, premise: PremiseType) -> EngineResult<f64> {
        self.premise_intensity
            .get(&premise)
            .copied()
            .ok_or_else(|| EngineError::Config(format!("premise intensity for {} is missing", premise.label())))
    }

    /// Run one proxy; never combines methods
    ///
    /// Bad inputs are a `Validation` error. A non-positive result from valid
    /// inputs can only come from the constants and is reported as `Config`.
    pub fn estimate(&self, proxy: &Proxy) -> EngineResult<Estimate> {
        proxy.validate()?;

        let kwh = match *proxy {
            Proxy::FloorArea { area_m2 } => area_m2 * self.area_intensity,
            Proxy::Occupancy { occupants } => occupants as f64 * self.occupant_intensity,
            Proxy::BulkPower { total_kw, hours } => total_kw * hours,
            Proxy::Premise { premise, area_m2 } => area_m2 * self.premise(premise)?,
            Proxy::ApplianceInventory { units, kw_per_unit, hours } => units as f64 * kw_per_unit * hours,
        };

        if !is_positive(kwh) {
            error!(method = proxy.label(), kwh, "estimation constants produced a non-positive result");
            return Err(EngineError::Config(format!(
                "{} estimate must be > 0, got {}",
                proxy.label(),
                kwh
            )));
        }

        Ok(Estimate {
            kwh,
            quality: QUALITY_ESTIMATED_PROXY.to_string(),
        })
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

// ============================================================================
// PROXIES
// ============================================================================

/// The five mutually exclusive estimation methods
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Proxy {
    FloorArea { area_m2: f64 },
    Occupancy { occupants: u32 },
    BulkPower { total_kw: f64, hours: f64 },
    Premise { premise: PremiseType, area_m2: f64 },
    ApplianceInventory { units: u32, kw_per_unit: f64, hours: f64 },
}

impl Proxy {
    pub fn label(&self) -> &'static str {
        match self {
            Proxy::FloorArea { .. } => "Floor area",
            Proxy::Occupancy { .. } => "Occupants",
            Proxy::BulkPower { .. } => "Bulk kW",
            Proxy::Premise { .. } => "Premise type",
            Proxy::ApplianceInventory { .. } => "Appliance list",
        }
    }

    /// All inputs strictly positive; reports every bad input at once
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(format!("Scope 2 / Energy / {}", self.label()));

        match *self {
            Proxy::FloorArea { area_m2 } => check_positive(&mut err, "area_m2", area_m2),
            Proxy::Occupancy { occupants } => check_count(&mut err, "occupants", occupants),
            Proxy::BulkPower { total_kw, hours } => {
                check_positive(&mut err, "total_kw", total_kw);
                check_positive(&mut err, "hours", hours);
            }
            Proxy::Premise { area_m2, .. } => check_positive(&mut err, "area_m2", area_m2),
            Proxy::ApplianceInventory { units, kw_per_unit, hours } => {
                check_count(&mut err, "units", units);
                check_positive(&mut err, "kw_per_unit", kw_per_unit);
                check_positive(&mut err, "hours", hours);
            }
        }

        err.into_result()
    }
}

pub(crate) fn check_positive(err: &mut ValidationError, field: &str, value: f64) {
    if !is_positive(value) {
        err.push(field, format!("must be > 0, got {}", value));
    }
}

pub(crate) fn check_count(err: &mut ValidationError, field: &str, value: u32) {
    if value == 0 {
        err.push(field, "must be a positive integer");
    }
}

/// A proxy result, always tagged as estimated
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub kwh: f64,
    pub quality: String,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_floor_area_proxy() {
        let config = EstimationConfig::default();
        let est = config.estimate(&Proxy::FloorArea { area_m2: 50.0 }).unwrap();
        assert_eq!(est.kwh, 10000.0);
        assert_eq!(est.quality, "Estimated – proxy");
    }

    #[test]
    fn test_occupancy_proxy() {
        let config = EstimationConfig::default();
        let est = config.estimate(&Proxy::Occupancy { occupants: 5 }).unwrap();
        assert_eq!(est.kwh, 5000.0);
    }

    #[test]
    fn test_bulk_premise_and_appliance_proxies() {
        let config = EstimationConfig::default();

        let bulk = config.estimate(&Proxy::BulkPower { total_kw: 12.5, hours: 100.0 }).unwrap();
        assert_eq!(bulk.kwh, 1250.0);

        let retail = config
            .estimate(&Proxy::Premise { premise: PremiseType::Retail, area_m2: 10.0 })
            .unwrap();
        assert_eq!(retail.kwh, 3000.0);

        let warehouse = config
            .estimate(&Proxy::Premise { premise: PremiseType::Warehouse, area_m2: 10.0 })
            .unwrap();
        assert_eq!(warehouse.kwh, 900.0);

        let appliances = config
            .estimate(&Proxy::ApplianceInventory { units: 4, kw_per_unit: 0.5, hours: 10.0 })
            .unwrap();
        assert_eq!(appliances.kwh, 20.0);
    }

    #[test]
    fn test_non_positive_inputs_rejected() {
        let config = EstimationConfig::default();

        let err = config.estimate(&Proxy::FloorArea { area_m2: 0.0 }).unwrap_err();
        assert!(err.validation().unwrap().has_field("area_m2"));

        let err = config
            .estimate(&Proxy::ApplianceInventory { units: 0, kw_per_unit: -1.0, hours: 0.0 })
            .unwrap_err();
        assert_eq!(err.validation().unwrap().errors.len(), 3);

        let err = config.estimate(&Proxy::BulkPower { total_kw: f64::NAN, hours: 1.0 }).unwrap_err();
        assert!(err.validation().unwrap().has_field("total_kw"));

        let err = config.estimate(&Proxy::BulkPower { total_kw: 5.0, hours: 0.0 }).unwrap_err();
        assert!(err.validation().unwrap().has_field("hours"));
    }

    #[test]
    fn test_office_premise_constant() {
        let config = EstimationConfig::default();
        let office = config
            .estimate(&Proxy::Premise { premise: PremiseType::Office, area_m2: 10.0 })
            .unwrap();
        assert_eq!(office.kwh, 2000.0);
    }

    #[test]
    fn test_zero_constant_is_config_error_not_user_error() {
        let mut config = EstimationConfig::default();
        config.area_intensity = 0.0;

        let err = config.estimate(&Proxy::FloorArea { area_m2: 50.0 }).unwrap_err();
        assert!(err.is_config());
        assert!(!err.is_validation());

        let mut config = EstimationConfig::default();
        config.premise_intensity.remove(&PremiseType::Office);
        let err = config
            .estimate(&Proxy::Premise { premise: PremiseType::Office, area_m2: 10.0 })
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_validate_rejects_zero_constants() {
        let mut config = EstimationConfig::default();
        assert!(config.validate().is_ok());

        config.area_intensity = 0.0;
        assert!(config.validate().is_err());

        let mut config = EstimationConfig::default();
        config.premise_intensity.remove(&PremiseType::Warehouse);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Warehouse"));
    }

    #[test]
    fn test_tunable_constants_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"area_intensity": 150.0, "premise_intensity": {{"Office": 180.0, "Retail": 250.0, "Warehouse": 80.0}}}}"#).unwrap();

        let config = EstimationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.area_intensity, 150.0);
        assert_eq!(config.occupant_intensity, 1000.0);

        let est = config.estimate(&Proxy::FloorArea { area_m2: 2.0 }).unwrap();
        assert_eq!(est.kwh, 300.0);
    }

    #[test]
    fn test_load_fails_on_zero_constant_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"occupant_intensity": 0.0}}"#).unwrap();

        assert!(EstimationConfig::load(Some(file.path())).is_err());
    }
}
