// 🧾 Reporting Session - one company/year context owning its own ledger
// Registry and estimation constants are shared read-only; the ledger is not shared

use crate::aggregation::{grand_total, summarize, totals_by_scope, AggregateSummary};
use crate::enrichment::{enrich_all, EnrichedRow};
use crate::error::{EngineError, EngineResult};
use crate::estimation::EstimationConfig;
use crate::export::{export_csv, export_document, export_json, write_exports, ExportPaths};
use crate::factors::FactorRegistry;
use crate::ledger::{read_entries, ActivityEntry, Ledger};
use crate::profile::CompanyProfile;
use crate::taxonomy::{classify, ActivityRequest};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct ReportingSession {
    pub id: Uuid,
    pub profile: CompanyProfile,
    pub created_at: DateTime<Utc>,
    ledger: Ledger,
    registry: Arc<FactorRegistry>,
    config: Arc<EstimationConfig>,
}

impl ReportingSession {
    /// Fails with `EngineError::Config` when the estimation constants are unusable
    pub fn new(
        registry: Arc<FactorRegistry>,
        config: Arc<EstimationConfig>,
        profile: CompanyProfile,
    ) -> EngineResult<Self> {
        config.validate()?;
        Ok(ReportingSession::with_checked_config(registry, config, profile))
    }

    /// Session over the built-in factors and default constants
    pub fn with_defaults(profile: CompanyProfile) -> Self {
        ReportingSession::with_checked_config(
            Arc::new(FactorRegistry::builtin()),
            Arc::new(EstimationConfig::default()),
            profile,
        )
    }

    // Callers have already validated `config`
    fn with_checked_config(
        registry: Arc<FactorRegistry>,
        config: Arc<EstimationConfig>,
        profile: CompanyProfile,
    ) -> Self {
        ReportingSession {
            id: Uuid::new_v4(),
            profile,
            created_at: Utc::now(),
            ledger: Ledger::new(),
            registry,
            config,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn registry(&self) -> &FactorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    // ========================================================================
    // VALIDATED APPEND
    // ========================================================================

    /// Classify one form submission and append it; a rejection changes nothing
    pub fn submit(&mut self, request: &ActivityRequest) -> EngineResult<&ActivityEntry> {
        let entry = classify(request, &self.config).map_err(|e| {
            warn!(session = %self.id, error = %e, "submission rejected");
            e
        })?;

        self.append(entry)
    }

    /// Label-driven variant of `submit` for generic forms
    pub fn submit_raw(
        &mut self,
        scope: u8,
        category: &str,
        variant: &str,
        inputs: &BTreeMap<String, f64>,
    ) -> EngineResult<&ActivityEntry> {
        let request = ActivityRequest::from_raw(scope, category, variant, inputs).map_err(|e| {
            warn!(session = %self.id, error = %e, "submission rejected");
            EngineError::from(e)
        })?;

        self.submit(&request)
    }

    /// Append an entry that was classified elsewhere
    pub fn append(&mut self, entry: ActivityEntry) -> EngineResult<&ActivityEntry> {
        self.ledger.append(entry, &self.registry)
    }

    /// Bulk upload of raw entries; all rows or none
    pub fn import_csv<R: Read>(&mut self, reader: R) -> EngineResult<usize> {
        let entries = read_entries(reader)?;
        let count = self.ledger.append_all(entries, &self.registry)?;
        debug!(session = %self.id, count, "bulk import");
        Ok(count)
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
    }

    // ========================================================================
    // DERIVED VIEWS (recomputed on every call)
    // ========================================================================

    pub fn enriched_rows(&self) -> EngineResult<Vec<EnrichedRow>> {
        enrich_all(&self.ledger, &self.registry)
    }

    pub fn summary(&self) -> EngineResult<AggregateSummary> {
        Ok(summarize(&self.enriched_rows()?))
    }

    pub fn totals_by_scope(&self) -> EngineResult<BTreeMap<u8, f64>> {
        Ok(totals_by_scope(&self.enriched_rows()?))
    }

    pub fn total(&self) -> EngineResult<f64> {
        Ok(grand_total(&self.enriched_rows()?))
    }

    // ========================================================================
    // EXPORTS
    // ========================================================================

    pub fn export_csv(&self) -> EngineResult<Vec<u8>> {
        export_csv(&self.enriched_rows()?)
    }

    pub fn export_json(&self) -> EngineResult<String> {
        export_json(&self.enriched_rows()?, &self.profile)
    }

    pub fn export_document(&self) -> EngineResult<Vec<u8>> {
        export_document(&self.ledger, &self.registry, &self.profile)
    }

    pub fn write_exports(&self, dir: &Path) -> EngineResult<ExportPaths> {
        write_exports(dir, &self.ledger, &self.registry, &self.profile)
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

/// Independent sessions keyed by id; no ledger is ever shared between them
pub struct SessionStore {
    registry: Arc<FactorRegistry>,
    config: Arc<EstimationConfig>,
    sessions: HashMap<Uuid, ReportingSession>,
}

impl SessionStore {
    /// Constants are checked once here, so opening a session cannot fail
    pub fn new(registry: Arc<FactorRegistry>, config: Arc<EstimationConfig>) -> EngineResult<Self> {
        config.validate()?;
        Ok(SessionStore {
            registry,
            config,
            sessions: HashMap::new(),
        })
    }

    pub fn open(&mut self, profile: CompanyProfile) -> Uuid {
        let session = ReportingSession::with_checked_config(self.registry.clone(), self.config.clone(), profile);
        let id = session.id;
        self.sessions.insert(id, session);
        debug!(session = %id, "session opened");
        id
    }

    pub fn get(&self, id: &Uuid) -> Option<&ReportingSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut ReportingSession> {
        self.sessions.get_mut(id)
    }

    pub fn close(&mut self, id: &Uuid) -> Option<ReportingSession> {
        self.sessions.remove(id)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::{PremiseType, Proxy};
    use crate::ledger::{QUALITY_ESTIMATED_PROXY, QUALITY_MEASURED};
    use crate::taxonomy::{FuelType, Refrigerant, Scope, TravelMode, WasteRoute};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_end_to_end_scenario() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());

        session
            .append(ActivityEntry::new("diesel_litre", 100.0, "litre", Scope::One, QUALITY_MEASURED))
            .unwrap();
        session
            .submit(&ActivityRequest::ElectricityMeasured { kwh: 1000.0 })
            .unwrap();

        let rows = session.enriched_rows().unwrap();
        assert_eq!(rows[0].ef, 2.68);
        assert!(approx(rows[0].kg_co2e, 268.0));
        assert!(approx(rows[0].t_co2e, 0.268));

        let summary = session.summary().unwrap();
        assert_eq!(summary.len(), 2);
        assert!(approx(summary.get(1, "Measured").unwrap(), 0.268));
        assert!(approx(summary.get(2, "Measured").unwrap(), 0.43));
        assert!(approx(session.total().unwrap(), 0.698));
    }

    #[test]
    fn test_rejected_fleet_submission_leaves_ledger_unchanged() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());

        let err = session
            .submit(&ActivityRequest::Fuel {
                fuel: FuelType::Diesel,
                economy_l_per_100km: 0.0,
                distance_km: 15000.0,
                fleet_size: 4,
            })
            .unwrap_err();

        assert!(err.is_validation());
        assert!(session.ledger().is_empty());
    }

    #[test]
    fn test_summary_reflects_latest_ledger() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());
        session.submit(&ActivityRequest::ElectricityMeasured { kwh: 1000.0 }).unwrap();
        assert_eq!(session.summary().unwrap().len(), 1);

        session
            .submit(&ActivityRequest::ElectricityEstimated { proxy: Proxy::Occupancy { occupants: 5 } })
            .unwrap();

        let summary = session.summary().unwrap();
        assert_eq!(summary.len(), 2);
        assert!(approx(summary.get(2, QUALITY_ESTIMATED_PROXY).unwrap(), 2.15));
    }

    #[test]
    fn test_submit_raw() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());
        let inputs = BTreeMap::from([("km".to_string(), 1000.0)]);

        let entry = session.submit_raw(3, "Business travel", "Taxi", &inputs).unwrap();
        assert_eq!(entry.activity_code, "taxi_km");

        let err = session.submit_raw(3, "Business travel", "Taxi", &BTreeMap::new()).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.ledger().len(), 1);
    }

    #[test]
    fn test_import_csv_and_reset() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());
        let data = "activity_code,quantity,unit,scope,quality\n\
                    paper_kg,50,kg,3,Measured\n\
                    water_m3,10,m³,3,Measured\n";

        assert_eq!(session.import_csv(data.as_bytes()).unwrap(), 2);
        assert_eq!(session.ledger().len(), 2);

        let bad = "activity_code,quantity,unit,scope,quality\n\
                   paper_kg,50,kg,3,Measured\n\
                   lng_kg,10,kg,1,Measured\n";
        assert!(session.import_csv(bad.as_bytes()).unwrap_err().is_unknown_activity());
        assert_eq!(session.ledger().len(), 2);

        let negative = "activity_code,quantity,unit,scope,quality\n\
                        paper_kg,-5,kg,3,Measured\n";
        assert!(session.import_csv(negative.as_bytes()).unwrap_err().is_validation());

        let garbled = "activity_code,quantity,unit,scope,quality\n\
                       paper_kg,five,kg,3,Measured\n";
        let err = session.import_csv(garbled.as_bytes()).unwrap_err();
        assert!(matches!(err, EngineError::MalformedRow { row: 1, .. }));
        assert_eq!(session.ledger().len(), 2);

        session.reset();
        assert!(session.ledger().is_empty());
        assert!(session.summary().unwrap().is_empty());
    }

    #[test]
    fn test_sessions_do_not_share_ledgers() {
        let mut store = SessionStore::new(
            Arc::new(FactorRegistry::builtin()),
            Arc::new(EstimationConfig::default()),
        )
        .unwrap();
        let a = store.open(CompanyProfile::default());
        let b = store.open(CompanyProfile::default());
        assert_ne!(a, b);

        store
            .get_mut(&a)
            .unwrap()
            .submit(&ActivityRequest::Paper { kg: 10.0 })
            .unwrap();

        assert_eq!(store.get(&a).unwrap().ledger().len(), 1);
        assert!(store.get(&b).unwrap().ledger().is_empty());

        assert!(store.close(&a).is_some());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_zero_constants_rejected_when_session_is_built() {
        let mut config = EstimationConfig::default();
        config.area_intensity = 0.0;
        let config = Arc::new(config);
        let registry = Arc::new(FactorRegistry::builtin());

        let err = ReportingSession::new(registry.clone(), config.clone(), CompanyProfile::default())
            .err()
            .unwrap();
        assert!(err.is_config());

        let err = SessionStore::new(registry, config).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn test_non_positive_submissions_leave_ledger_unchanged() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());
        session.submit(&ActivityRequest::Paper { kg: 1.0 }).unwrap();

        let rejected = [
            ActivityRequest::Refrigerant { gas: Refrigerant::R134a, kg: 0.0 },
            ActivityRequest::Refrigerant { gas: Refrigerant::R410a, kg: -3.0 },
            ActivityRequest::Fuel {
                fuel: FuelType::Petrol,
                economy_l_per_100km: 7.0,
                distance_km: 0.0,
                fleet_size: 2,
            },
            ActivityRequest::Fuel {
                fuel: FuelType::Diesel,
                economy_l_per_100km: 7.0,
                distance_km: 12000.0,
                fleet_size: 0,
            },
            ActivityRequest::ElectricityMeasured { kwh: 0.0 },
            ActivityRequest::ElectricityEstimated { proxy: Proxy::BulkPower { total_kw: 40.0, hours: 0.0 } },
            ActivityRequest::ElectricityEstimated {
                proxy: Proxy::Premise { premise: PremiseType::Office, area_m2: 0.0 },
            },
            ActivityRequest::BusinessTravel { mode: TravelMode::Taxi, km: -10.0 },
            ActivityRequest::WasteDisposal { route: WasteRoute::Incineration, kg: 0.0 },
            ActivityRequest::Water { m3: 0.0 },
        ];

        for request in &rejected {
            let err = session.submit(request).unwrap_err();
            assert!(err.is_validation(), "{:?} should be a validation error", request);
            assert_eq!(session.ledger().len(), 1, "{:?} reached the ledger", request);
        }
    }

    #[test]
    fn test_raw_submission_with_stray_variant_rejected() {
        let mut session = ReportingSession::with_defaults(CompanyProfile::default());
        let inputs = BTreeMap::from([("m3".to_string(), 5.0)]);

        let err = session.submit_raw(3, "Water", "Incineration", &inputs).unwrap_err();
        assert!(err.validation().unwrap().has_field("variant"));
        assert!(session.ledger().is_empty());
    }
}
