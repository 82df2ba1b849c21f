// 📤 Report Exporter - CSV, JSON and fixed-layout document renderings
// Every rendering is produced from the rows/ledger handed in at call time

use crate::aggregation::{grand_total, totals_by_scope};
use crate::enrichment::{enrich_all, EnrichedRow};
use crate::error::{EngineError, EngineResult};
use crate::factors::FactorRegistry;
use crate::ledger::Ledger;
use crate::profile::CompanyProfile;
use crate::taxonomy::Scope;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Column order of the tabular export
pub const CSV_HEADER: [&str; 8] = [
    "activity_code",
    "quantity",
    "unit",
    "scope",
    "quality",
    "ef",
    "kgCO2e",
    "tCO2e",
];

// ============================================================================
// CSV
// ============================================================================

/// Flat table, header row first, one line per enriched row
pub fn export_csv(rows: &[EnrichedRow]) -> EngineResult<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    wtr.write_record(CSV_HEADER)
        .map_err(|e| EngineError::export("csv", e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| EngineError::export("csv", e))?;
    }

    wtr.into_inner()
        .map_err(|e| EngineError::export("csv", e.into_error()))
}

// ============================================================================
// JSON
// ============================================================================

/// Structured report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonReport {
    pub company: String,
    pub industry: String,
    pub year: i32,
    /// ISO-8601 UTC
    pub generated: String,
    pub activities: Vec<EnrichedRow>,
}

impl JsonReport {
    pub fn new(rows: &[EnrichedRow], profile: &CompanyProfile, generated: DateTime<Utc>) -> Self {
        JsonReport {
            company: profile.name.clone(),
            industry: profile.industry.name().to_string(),
            year: profile.reporting_year,
            generated: generated.to_rfc3339_opts(SecondsFormat::Secs, true),
            activities: rows.to_vec(),
        }
    }
}

pub fn export_json(rows: &[EnrichedRow], profile: &CompanyProfile) -> EngineResult<String> {
    export_json_at(rows, profile, Utc::now())
}

/// Same as `export_json` with an explicit generation time
pub fn export_json_at(
    rows: &[EnrichedRow],
    profile: &CompanyProfile,
    generated: DateTime<Utc>,
) -> EngineResult<String> {
    let report = JsonReport::new(rows, profile, generated);
    serde_json::to_string_pretty(&report).map_err(|e| EngineError::export("json", e))
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// SHA-256 of the CSV export, printed on the document so both can be matched
pub fn report_digest(rows: &[EnrichedRow]) -> EngineResult<String> {
    let csv = export_csv(rows)?;
    let mut hasher = Sha256::new();
    hasher.update(&csv);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn export_document(ledger: &Ledger, registry: &FactorRegistry, profile: &CompanyProfile) -> EngineResult<Vec<u8>> {
    export_document_at(ledger, registry, profile, Utc::now())
}

/// Fixed-layout report built from the ledger as it is right now
pub fn export_document_at(
    ledger: &Ledger,
    registry: &FactorRegistry,
    profile: &CompanyProfile,
    generated: DateTime<Utc>,
) -> EngineResult<Vec<u8>> {
    let rows = enrich_all(ledger, registry)?;
    let by_scope = totals_by_scope(&rows);
    let digest = report_digest(&rows)?;

    let rule = "=".repeat(48);
    let thin = "-".repeat(48);

    let mut lines = vec![
        "EcoLedger Emissions Report".to_string(),
        rule.clone(),
        format!("{:<20}{}", "Company:", profile.name),
        format!("{:<20}{}", "Industry:", profile.industry),
        format!("{:<20}{}", "Reporting year:", profile.reporting_year),
        format!("{:<20}{}", "Generated (UTC):", generated.format("%Y-%m-%d %H:%M:%S")),
        format!("{:<20}{}", "Activities:", rows.len()),
        thin.clone(),
    ];
    for scope in Scope::ALL {
        let total = by_scope.get(&scope.number()).copied().unwrap_or(0.0);
        lines.push(format!("{:<20}{:>14.3} tCO2e", format!("{} total:", scope), total));
    }
    lines.push(thin);
    lines.push(format!("{:<20}{:>14.3} tCO2e", "Total:", grand_total(&rows)));
    lines.push(rule);
    lines.push("Data digest (SHA-256 of results.csv):".to_string());
    lines.push(digest);

    let mut doc = lines.join("\n");
    doc.push('\n');

    Ok(doc.into_bytes())
}

// ============================================================================
// FILES
// ============================================================================

#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub document: PathBuf,
}

/// Write results.csv, report.json and report.txt into `dir`
///
/// Failures surface as `EngineError::Export`; the ledger is only read.
pub fn write_exports(
    dir: &Path,
    ledger: &Ledger,
    registry: &FactorRegistry,
    profile: &CompanyProfile,
) -> EngineResult<ExportPaths> {
    write_exports_at(dir, ledger, registry, profile, Utc::now())
}

/// Same as `write_exports`; every file of the set carries `generated`
pub fn write_exports_at(
    dir: &Path,
    ledger: &Ledger,
    registry: &FactorRegistry,
    profile: &CompanyProfile,
    generated: DateTime<Utc>,
) -> EngineResult<ExportPaths> {
    let rows = enrich_all(ledger, registry)?;

    let csv = export_csv(&rows)?;
    let json = export_json_at(&rows, profile, generated)?;
    let document = export_document_at(ledger, registry, profile, generated)?;

    fs::create_dir_all(dir).map_err(|e| EngineError::export(dir.display().to_string(), e))?;

    let paths = ExportPaths {
        csv: dir.join("results.csv"),
        json: dir.join("report.json"),
        document: dir.join("report.txt"),
    };

    write_file(&paths.csv, &csv)?;
    write_file(&paths.json, json.as_bytes())?;
    write_file(&paths.document, &document)?;

    info!(dir = %dir.display(), rows = rows.len(), "exports written");
    Ok(paths)
}

fn write_file(path: &Path, bytes: &[u8]) -> EngineResult<()> {
    fs::write(path, bytes).map_err(|e| EngineError::export(path.display().to_string(), e))
}

// ============================================================================
// TESTS
// ============================================================================
