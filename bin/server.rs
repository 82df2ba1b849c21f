// EcoLedger - Web Server
// REST host for the emission engine: one independent ledger per session

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use ecoledger::{
    ActivityEntry, ActivityRequest, CompanyProfile, EngineError, EnrichedRow, EstimationConfig, FactorRegistry,
    Industry, InputSpec, Scope, SessionStore, SummaryGroup,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Shared application state
#[derive(Clone)]
struct AppState {
    registry: Arc<FactorRegistry>,
    sessions: Arc<Mutex<SessionStore>>,
}

impl AppState {
    fn sessions(&self) -> MutexGuard<'_, SessionStore> {
        // A panicked handler cannot leave a ledger half-appended
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldIssue>,
}

#[derive(Serialize)]
struct FieldIssue {
    field: String,
    message: String,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: Vec::new(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

enum ApiError {
    Engine(EngineError),
    SessionNotFound(Uuid),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            ApiError::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("session {} not found", id), Vec::new()),
            ApiError::Engine(EngineError::Validation(v)) => {
                let fields = v
                    .errors
                    .iter()
                    .map(|e| FieldIssue {
                        field: e.field.clone(),
                        message: e.message.clone(),
                    })
                    .collect();
                (StatusCode::UNPROCESSABLE_ENTITY, v.to_string(), fields)
            }
            ApiError::Engine(e) => {
                error!("engine error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), Vec::new())
            }
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
            fields,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
struct OpenSessionRequest {
    #[serde(default = "default_company")]
    company: String,
    #[serde(default = "default_industry")]
    industry: Industry,
    #[serde(default = "default_year")]
    year: i32,
}

fn default_company() -> String {
    CompanyProfile::default().name
}

fn default_industry() -> Industry {
    CompanyProfile::default().industry
}

fn default_year() -> i32 {
    CompanyProfile::default().reporting_year
}

#[derive(Serialize)]
struct SessionResponse {
    id: Uuid,
    profile: CompanyProfile,
    entries: usize,
}

#[derive(Serialize)]
struct SummaryResponse {
    groups: Vec<SummaryGroup>,
    by_scope: BTreeMap<u8, f64>,
    total: f64,
}

#[derive(Serialize)]
struct CategoryDescription {
    scope: u8,
    category: &'static str,
    unit: &'static str,
    variants: Vec<VariantDescription>,
}

#[derive(Serialize)]
struct VariantDescription {
    label: &'static str,
    inputs: Vec<InputSpec>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/taxonomy - Scopes, categories, variants and their input schemas
async fn get_taxonomy() -> Json<ApiResponse<Vec<CategoryDescription>>> {
    let mut categories = Vec::new();

    for scope in Scope::ALL {
        for category in scope.categories() {
            let labels = match category.variants() {
                v if v.is_empty() => vec![""],
                v => v,
            };
            let variants = labels
                .into_iter()
                .map(|label| VariantDescription {
                    label,
                    inputs: category.required_inputs(label),
                })
                .collect();

            categories.push(CategoryDescription {
                scope: scope.number(),
                category: category.label(),
                unit: category.unit(),
                variants,
            });
        }
    }

    Json(ApiResponse::ok(categories))
}

/// GET /api/factors - Emission factor table
async fn get_factors(State(state): State<AppState>) -> impl IntoResponse {
    let factors: Vec<_> = state.registry.list_all().into_iter().cloned().collect();
    Json(ApiResponse::ok(factors))
}

/// POST /api/sessions - Open a new reporting session
async fn open_session(
    State(state): State<AppState>,
    Json(req): Json<OpenSessionRequest>,
) -> (StatusCode, Json<ApiResponse<SessionResponse>>) {
    let profile = CompanyProfile::new(req.company, req.industry, req.year);
    let id = state.sessions().open(profile.clone());
    info!(session = %id, company = %profile.name, "session opened");

    (
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionResponse { id, profile, entries: 0 })),
    )
}

/// GET /api/sessions/:id - Session metadata
async fn get_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<SessionResponse> {
    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;

    Ok(Json(ApiResponse::ok(SessionResponse {
        id,
        profile: session.profile.clone(),
        entries: session.ledger().len(),
    })))
}

/// DELETE /api/sessions/:id - Close a session and drop its ledger
async fn close_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    state.sessions().close(&id).ok_or(ApiError::SessionNotFound(id))?;
    info!(session = %id, "session closed");
    Ok(Json(ApiResponse::ok(id)))
}

/// POST /api/sessions/:id/entries - Classify and append one submission
async fn submit_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ActivityRequest>,
) -> ApiResult<ActivityEntry> {
    let mut sessions = state.sessions();
    let session = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;

    let entry = session.submit(&request)?.clone();
    Ok(Json(ApiResponse::ok(entry)))
}

/// GET /api/sessions/:id/entries - Raw ledger
async fn get_entries(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Vec<ActivityEntry>> {
    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(ApiResponse::ok(session.ledger().entries().to_vec())))
}

/// POST /api/sessions/:id/reset - Clear the ledger
async fn reset_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<usize> {
    let mut sessions = state.sessions();
    let session = sessions.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
    session.reset();
    Ok(Json(ApiResponse::ok(0)))
}

/// GET /api/sessions/:id/rows - Enriched dataset
async fn get_rows(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Vec<EnrichedRow>> {
    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(ApiResponse::ok(session.enriched_rows()?)))
}

/// GET /api/sessions/:id/summary - tCO2e by (scope, quality), by scope and overall
async fn get_summary(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<SummaryResponse> {
    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;

    let summary = session.summary()?;
    Ok(Json(ApiResponse::ok(SummaryResponse {
        groups: summary.records(),
        by_scope: session.totals_by_scope()?,
        total: summary.total(),
    })))
}

/// GET /api/sessions/:id/export/:format - results.csv, report.json or report.txt
async fn export(
    State(state): State<AppState>,
    Path((id, format)): Path<(Uuid, String)>,
) -> Result<Response, ApiError> {
    let sessions = state.sessions();
    let session = sessions.get(&id).ok_or(ApiError::SessionNotFound(id))?;

    let (content_type, filename, body) = match format.as_str() {
        "csv" => ("text/csv; charset=utf-8", "results.csv", session.export_csv()?),
        "json" => ("application/json", "report.json", session.export_json()?.into_bytes()),
        "document" => ("text/plain; charset=utf-8", "report.txt", session.export_document()?),
        other => {
            return Ok((StatusCode::NOT_FOUND, format!("unknown export format: {}", other)).into_response());
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 EcoLedger - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Factors and constants are validated once, before serving
    let registry = match env::var("ECOLEDGER_FACTORS") {
        Ok(path) => FactorRegistry::from_file(&path)?,
        Err(_) => FactorRegistry::builtin(),
    };
    let config_path = env::var("ECOLEDGER_CONFIG").ok().map(std::path::PathBuf::from);
    let config = EstimationConfig::load(config_path.as_deref())?;
    println!("✓ {} emission factors loaded", registry.count());

    let registry = Arc::new(registry);
    let state = AppState {
        registry: registry.clone(),
        sessions: Arc::new(Mutex::new(SessionStore::new(registry, Arc::new(config))?)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/taxonomy", get(get_taxonomy))
        .route("/factors", get(get_factors))
        .route("/sessions", post(open_session))
        .route("/sessions/:id", get(get_session).delete(close_session))
        .route("/sessions/:id/entries", get(get_entries).post(submit_entry))
        .route("/sessions/:id/reset", post(reset_session))
        .route("/sessions/:id/rows", get(get_rows))
        .route("/sessions/:id/summary", get(get_summary))
        .route("/sessions/:id/export/:format", get(export))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    // Start server
    let addr = env::var("ECOLEDGER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/taxonomy", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
