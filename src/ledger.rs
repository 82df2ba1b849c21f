// 📒 Ledger - append-only activity history for one reporting session
// Rows are never edited in place: corrections are new rows

use crate::error::{EngineError, EngineResult, ValidationError};
use crate::factors::FactorRegistry;
use crate::taxonomy::Scope;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ============================================================================
// DATA QUALITY TAGS
// ============================================================================

pub const QUALITY_MEASURED: &str = "Measured";
pub const QUALITY_MEASURED_FLEET: &str = "Measured – fleet";
pub const QUALITY_ESTIMATED_PROXY: &str = "Estimated – proxy";

// ============================================================================
// ACTIVITY ENTRY
// ============================================================================

/// One raw activity row, as produced by the taxonomy or a bulk upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub activity_code: String,
    pub quantity: f64,
    /// Display label only (e.g., "litre", "kWh")
    pub unit: String,
    /// 1, 2 or 3
    pub scope: u8,
    /// Provenance tag (e.g., "Measured", "Estimated – proxy")
    pub quality: String,
}

impl ActivityEntry {
    pub fn new(
        activity_code: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
        scope: Scope,
        quality: impl Into<String>,
    ) -> Self {
        ActivityEntry {
            activity_code: activity_code.into(),
            quantity,
            unit: unit.into(),
            scope: scope.number(),
            quality: quality.into(),
        }
    }

    /// Row invariants: positive quantity, known code, valid scope that agrees
    /// with the taxonomy when the code belongs to it
    pub fn check(&self, registry: &FactorRegistry) -> EngineResult<()> {
        let mut err = ValidationError::new(format!("Entry {}", self.activity_code));

        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            err.push("quantity", format!("must be > 0, got {}", self.quantity));
        }

        match Scope::from_number(self.scope) {
            None => err.push("scope", format!("must be 1, 2 or 3, got {}", self.scope)),
            Some(scope) => {
                if let Some(expected) = Scope::for_activity_code(&self.activity_code) {
                    if expected != scope {
                        err.push(
                            "scope",
                            format!("{} belongs to scope {}, got {}", self.activity_code, expected.number(), scope.number()),
                        );
                    }
                }
            }
        }

        if self.quality.trim().is_empty() {
            err.push("quality", "required field is empty");
        }

        err.into_result()?;

        if !registry.contains(&self.activity_code) {
            return Err(EngineError::UnknownActivity {
                code: self.activity_code.clone(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Ordered, append-only sequence of accepted entries
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<ActivityEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger { entries: Vec::new() }
    }

    /// Append one already-classified entry after re-checking its invariants
    pub fn append(&mut self, entry: ActivityEntry, registry: &FactorRegistry) -> EngineResult<&ActivityEntry> {
        if let Err(e) = entry.check(registry) {
            warn!(code = %entry.activity_code, error = %e, "ledger append rejected");
            return Err(e);
        }

        debug!(
            code = %entry.activity_code,
            quantity = entry.quantity,
            scope = entry.scope,
            quality = %entry.quality,
            "ledger append"
        );
        let index = self.entries.len();
        self.entries.push(entry);
        Ok(&self.entries[index])
    }

    /// All-or-nothing bulk append: one bad row leaves the ledger untouched
    pub fn append_all(&mut self, entries: Vec<ActivityEntry>, registry: &FactorRegistry) -> EngineResult<usize> {
        for (i, entry) in entries.iter().enumerate() {
            entry.check(registry).map_err(|e| match e {
                EngineError::Validation(mut v) => {
                    v.context = format!("row {}: {}", i + 1, v.context);
                    EngineError::Validation(v)
                }
                other => other,
            })?;
        }

        let count = entries.len();
        self.entries.extend(entries);
        debug!(count, total = self.entries.len(), "ledger bulk append");
        Ok(count)
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start over (new reporting context)
    pub fn reset(&mut self) {
        debug!(dropped = self.entries.len(), "ledger reset");
        self.entries.clear();
    }
}

// ============================================================================
// BULK UPLOAD
// ============================================================================

/// Parse raw entries (activity_code,quantity,unit,scope,quality) from CSV
///
/// Rows are numbered from 1, not counting the header.
pub fn read_entries<R: Read>(reader: R) -> EngineResult<Vec<ActivityEntry>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();

    for (i, result) in rdr.deserialize().enumerate() {
        let entry: ActivityEntry = result.map_err(|source| EngineError::MalformedRow { row: i + 1, source })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Load a raw entries CSV file into a fresh ledger
pub fn load_csv(csv_path: &Path, registry: &FactorRegistry) -> EngineResult<Ledger> {
    let file = std::fs::File::open(csv_path).map_err(|source| EngineError::Read {
        path: csv_path.to_path_buf(),
        source,
    })?;

    let entries = read_entries(file)?;

    let mut ledger = Ledger::new();
    ledger.append_all(entries, registry)?;

    Ok(ledger)
}

// ============================================================================
// TESTS
// ============================================================================
