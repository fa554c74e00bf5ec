// Metis Backend - REST API with Axum
//
// Router and handlers live in the library so tests can drive them with
// `tower::ServiceExt::oneshot` without binding a socket.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsOrigins;
use crate::error::{MetisError, Result};
use crate::graduates::{GraduateReader, GraduateRow};
use crate::items::{Item, ItemRegistry, ItemUpdate, NewItem};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<ItemRegistry>,
    pub graduates: Arc<GraduateReader>,
}

impl AppState {
    pub fn new(graduates_path: impl Into<PathBuf>) -> Self {
        AppState {
            items: Arc::new(ItemRegistry::new()),
            graduates: Arc::new(GraduateReader::new(graduates_path)),
        }
    }
}

impl IntoResponse for MetisError {
    fn into_response(self) -> Response {
        let status = match &self {
            MetisError::ItemNotFound(_) | MetisError::SourceNotFound(_) => StatusCode::NOT_FOUND,
            MetisError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MetisError::Config(_) | MetisError::Io(_) | MetisError::Source(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let detail = if status.is_server_error() {
            tracing::error!("request failed: {:#}", self);
            "Internal server error".to_string()
        } else {
            if let MetisError::SourceNotFound(path) = &self {
                tracing::warn!(path = %path.display(), "graduates file missing");
            }
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET / - Welcome message
async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to Metis Backend API" }))
}

/// GET /health - Health check
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// GET /items/ - All items
async fn list_items(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.items.list())
}

/// GET /items/:id
async fn get_item(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Item>> {
    let id = item_id(path)?;
    state.items.get(id).map(Json)
}

/// POST /items/ - Create an item
async fn create_item(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewItem>, JsonRejection>,
) -> Result<Json<Item>> {
    let Json(new_item) = payload.map_err(|rejection| MetisError::Validation(rejection.body_text()))?;
    Ok(Json(state.items.create(new_item)))
}

/// PUT /items/:id - Partial update
async fn update_item(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
    payload: std::result::Result<Json<ItemUpdate>, JsonRejection>,
) -> Result<Json<Item>> {
    let id = item_id(path)?;
    let Json(update) = payload.map_err(|rejection| MetisError::Validation(rejection.body_text()))?;
    state.items.update(id, update).map(Json)
}

/// DELETE /items/:id
async fn delete_item(
    State(state): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Value>> {
    let id = item_id(path)?;
    state.items.delete(id)?;
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}

fn item_id(path: std::result::Result<Path<String>, PathRejection>) -> Result<u64> {
    let Path(raw) = path.map_err(|rejection| MetisError::Validation(rejection.body_text()))?;
    parse_item_id(&raw)
}

/// Integer ids that no item can carry (negative, or past `u64::MAX`) are
/// misses, not malformed input. Anything that is not an integer is 422.
pub fn parse_item_id(raw: &str) -> Result<u64> {
    let digits = raw.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MetisError::Validation(format!(
            "Item id must be an integer, got '{}'",
            raw
        )));
    }

    // Ids start at 1, so 0 stands in for an id that cannot exist
    if raw.starts_with('-') {
        return Err(MetisError::ItemNotFound(0));
    }
    digits.parse::<u64>().map_err(|_| MetisError::ItemNotFound(0))
}

/// GET /analytics/graduates - Normalized graduate rows
async fn list_graduates(State(state): State<AppState>) -> Result<Json<Vec<GraduateRow>>> {
    let reader = Arc::clone(&state.graduates);

    // File lock + spreadsheet decode block; keep them off the async workers
    let rows = tokio::task::spawn_blocking(move || reader.rows())
        .await
        .map_err(|e| MetisError::Source(e.into()))??;

    Ok(Json(rows.as_ref().clone()))
}

// ============================================================================
// Router
// ============================================================================

/// Routes with state attached, without CORS
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/items", get(list_items).post(create_item))
        .route("/items/", get(list_items).post(create_item))
        .route("/items/:id", get(get_item).put(update_item).delete(delete_item))
        .route("/analytics/graduates", get(list_graduates))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Full application: routes plus CORS
pub fn app(state: AppState, origins: &CorsOrigins) -> Result<Router> {
    Ok(router(state).layer(cors_layer(origins)?))
}

pub fn cors_layer(origins: &CorsOrigins) -> Result<CorsLayer> {
    match origins {
        CorsOrigins::Any => Ok(CorsLayer::permissive()),
        CorsOrigins::List(list) => {
            let values = list
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .map_err(|e| MetisError::Config(format!("invalid CORS origin '{}': {}", origin, e)))
                })
                .collect::<Result<Vec<_>>>()?;

            // Credentials forbid wildcards, so mirror the preflight instead
            Ok(CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true))
        }
    }
}
