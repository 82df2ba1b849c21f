// EcoLedger - Core Library
// Emission classification & aggregation engine used by the CLI, API server and tests

pub mod error;
pub mod factors;
pub mod taxonomy;
pub mod estimation;
pub mod ledger;
pub mod enrichment;
pub mod aggregation;
pub mod profile;
pub mod export;
pub mod session;

// Re-export commonly used types
pub use error::{EngineError, EngineResult, ExportFailure, FieldError, ValidationError};
pub use factors::{EmissionFactor, FactorRegistry};
pub use taxonomy::{
    classify, ActivityRequest, Category, FuelType, InputKind, InputSpec, Refrigerant, Scope, TravelMode,
    WasteRoute,
};
pub use estimation::{Estimate, EstimationConfig, PremiseType, Proxy};
pub use ledger::{
    load_csv, read_entries, ActivityEntry, Ledger, QUALITY_ESTIMATED_PROXY, QUALITY_MEASURED,
    QUALITY_MEASURED_FLEET,
};
pub use enrichment::{enrich, enrich_all, EnrichedRow};
pub use aggregation::{grand_total, summarize, totals_by_scope, AggregateSummary, Pivot, SummaryGroup};
pub use profile::{CompanyProfile, Industry};
pub use export::{
    export_csv, export_document, export_json, report_digest, write_exports, write_exports_at, ExportPaths, JsonReport,
};
pub use session::{ReportingSession, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
