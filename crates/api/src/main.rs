mod config;
mod metrics;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::{mapref::entry::Entry, DashMap};
use index::EmbedderKind;
use ingest::Catalog;
use query::{Assistant, AssistantResponse, QueryError, SessionMemory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use config::{AppConfig, LogFormat, ServerConfig};
use metrics::{Metrics, MetricsSnapshot, TimedOperation};

/// Each session sits behind its own lock so questions on one session run
/// one at a time while different sessions proceed in parallel.
type SharedSession = Arc<Mutex<SessionMemory>>;

struct AppState {
    assistant: Assistant,
    sessions: DashMap<Uuid, SharedSession>,
    metrics: Metrics,
}

impl AppState {
    fn new(assistant: Assistant) -> Self {
        Self {
            assistant,
            sessions: DashMap::new(),
            metrics: Metrics::new(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    catalog_entries: usize,
    chunks: usize,
    embedder: Option<EmbedderKind>,
    llm_configured: bool,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
    /// Omit to start a new session
    session_id: Option<Uuid>,
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    session_id: Uuid,
    #[serde(flatten)]
    response: AssistantResponse,
}

#[derive(Serialize)]
struct DrugSummary {
    entry_id: String,
    name: String,
    class: String,
    brand_names: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = match err {
            QueryError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);

    let catalog = match &config.catalog.path {
        Some(path) => {
            let (catalog, report) = ingest::load_catalog(path).await?;
            for rejected in &report.rejected {
                warn!(error = %rejected, "Skipped catalog record");
            }
            catalog
        }
        None => Catalog::builtin().context("Failed to load bundled catalog")?,
    };

    let assistant = Assistant::bootstrap(catalog, config.assistant_config())?;
    info!(
        entries = assistant.catalog().len(),
        chunks = assistant.index().len(),
        llm_configured = assistant.generator_configured(),
        "Assistant ready"
    );

    let app = build_router(Arc::new(AppState::new(assistant)));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match server.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ask", post(ask))
        .route("/drugs", get(list_drugs))
        .route("/sessions/:id", get(get_session))
        .route("/metrics", get(get_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let assistant = &state.assistant;
    Json(HealthResponse {
        status: "ok",
        catalog_entries: assistant.catalog().len(),
        chunks: assistant.index().len(),
        embedder: assistant.embedder_kind(),
        llm_configured: assistant.generator_configured(),
    })
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let timer = TimedOperation::start();
    let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);

    // The shard guard must not outlive this statement
    let (session, created) = match state.sessions.entry(session_id) {
        Entry::Occupied(entry) => (entry.get().clone(), false),
        Entry::Vacant(entry) => (entry.insert(SharedSession::default()).clone(), true),
    };

    let mut memory = session.lock().await;
    let response = match state
        .assistant
        .ask(&req.question, &mut memory, req.top_k)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            drop(memory);
            if created {
                // Forget the new id unless another request picked it up
                state.sessions.remove_if(&session_id, |_, s| {
                    Arc::strong_count(s) == 2
                        && s.try_lock().is_ok_and(|m| m.questions_answered() == 0)
                });
            }
            state.metrics.record_rejected();
            warn!(session = %session_id, error = %e, "Rejected question");
            return Err(e.into());
        }
    };
    drop(memory);

    state.metrics.record_answer(response.source, timer.elapsed());

    Ok(Json(AskResponse {
        session_id,
        response,
    }))
}

async fn list_drugs(State(state): State<Arc<AppState>>) -> Json<Vec<DrugSummary>> {
    let drugs = state
        .assistant
        .catalog()
        .iter()
        .map(|record| DrugSummary {
            entry_id: record.entry_id.clone(),
            name: record.name.clone(),
            class: record.class.clone(),
            brand_names: record.brand_names.clone(),
        })
        .collect();

    Json(drugs)
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionMemory>, StatusCode> {
    let session = state
        .sessions
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or(StatusCode::NOT_FOUND)?;
    let snapshot = session.lock().await.clone();
    Ok(Json(snapshot))
}

async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
