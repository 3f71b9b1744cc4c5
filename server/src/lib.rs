use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use webidx_core::{DocId, IndexStore, Phase, SearchEngine};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchResult>,
}

#[derive(Serialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    pub score: f64,
    pub path: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: SearchEngine,
}

type ApiError = (StatusCode, String);

fn internal(err: webidx_core::IndexError) -> ApiError {
    tracing::error!(%err, "index read failed");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub fn build_app(index_dir: String) -> Result<Router> {
    let store = IndexStore::open(&index_dir)?;
    if !store.is_complete(Phase::Normalize)? {
        tracing::warn!(%index_dir, "index has not finished building, searches will return nothing");
    }
    Ok(router(store))
}

pub fn router(store: IndexStore) -> Router {
    let app_state = AppState { engine: SearchEngine::new(store) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:shard/:local", get(doc_handler))
        .route("/stats", get(stats_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let hits = state.engine.search(&params.q).map_err(internal)?;
    let total_hits = hits.len();
    let k = params.k.clamp(1, 100);

    let mut results = Vec::with_capacity(k.min(total_hits));
    for hit in hits.into_iter().take(k) {
        let path = state.engine.store().document(&hit.doc_id).map_err(internal)?.map(|d| d.path);
        results.push(SearchResult { doc_id: hit.doc_id, score: hit.score, path });
    }

    Ok(Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path((shard, local)): Path<(u32, u32)>) -> Result<Json<serde_json::Value>, ApiError> {
    let doc_id = DocId::new(shard, local);
    match state.engine.store().document(&doc_id).map_err(internal)? {
        Some(record) => Ok(Json(serde_json::json!({ "doc_id": record.id, "path": record.path }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.engine.store();
    let mut phases = serde_json::Map::new();
    for phase in Phase::ALL {
        phases.insert(phase.to_string(), store.is_complete(phase).map_err(internal)?.into());
    }
    let meta = store.load_meta().map_err(internal)?;
    Ok(Json(serde_json::json!({
        "relations": store.counts(),
        "phases": phases,
        "meta": meta,
    })))
}
