// HTTP request handlers
//
// Every route is pure translation: validate the body, rename fields into
// command params, make one bridge call, map the outcome onto an HTTP
// status. No business rules live here.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::agent::catalog;
use crate::bridge::BridgeClient;
use crate::errors::BridgeError;

/// Shared state for all routes
pub struct AppState {
    pub bridge: Arc<BridgeClient>,
}

/// Create the mediating service router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/scene/info", post(scene_info))
        .route("/v1/scene/object", post(scene_object))
        .route("/v1/objects/create", post(objects_create))
        .route("/v1/objects/modify", post(objects_modify))
        .route("/v1/objects/delete", post(objects_delete))
        .route("/v1/objects/material", post(objects_material))
        .route("/v1/assets/status", post(assets_status))
        .route("/v1/assets/search", post(assets_search))
        .route("/v1/assets/download", post(assets_download))
        .route("/v1/assets/generate", post(assets_generate))
        .route("/v1/assets/job", post(assets_job))
        .route("/v1/assets/import", post(assets_import))
        .route("/v1/tools/run", post(run_tool))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Handle GET /health - liveness only, no bridge call
async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Handle POST /v1/scene/info
async fn scene_info(
    State(state): State<Arc<AppState>>,
    Json(_body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    call(&state, "get_scene_info", Map::new()).await
}

/// Handle POST /v1/scene/object
async fn scene_object(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "object_name", &mut params)?;
    call(&state, "get_object_info", params).await
}

/// Handle POST /v1/objects/create
async fn objects_create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "kind", &mut params)?;
    copy_optional_str(&body, "name", &mut params)?;
    copy_optional_str(&body, "color", &mut params)?;
    copy_optional_vec3(&body, "location", &mut params)?;
    call(&state, "create_object", params).await
}

/// Handle POST /v1/objects/modify
async fn objects_modify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "object_name", &mut params)?;
    copy_optional_vec3(&body, "location", &mut params)?;
    copy_optional_vec3(&body, "rotation", &mut params)?;
    copy_optional_vec3(&body, "scale", &mut params)?;
    call(&state, "modify_object", params).await
}

/// Handle POST /v1/objects/delete
async fn objects_delete(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "object_name", &mut params)?;
    call(&state, "delete_object", params).await
}

/// Handle POST /v1/objects/material
async fn objects_material(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "object_name", &mut params)?;
    copy_required_str(&body, "color", &mut params)?;
    call(&state, "set_material", params).await
}

/// Handle POST /v1/assets/status
async fn assets_status(
    State(state): State<Arc<AppState>>,
    Json(_body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    call(&state, "get_assets_status", Map::new()).await
}

/// Handle POST /v1/assets/search
async fn assets_search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_optional_str(&body, "asset_type", &mut params)?;
    copy_optional_str(&body, "query", &mut params)?;
    call(&state, "search_assets", params).await
}

/// Handle POST /v1/assets/download - uses the long asset deadline
async fn assets_download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "asset_id", &mut params)?;
    copy_required_str(&body, "asset_type", &mut params)?;
    copy_optional_str(&body, "resolution", &mut params)?;
    call(&state, "download_asset", params).await
}

/// Handle POST /v1/assets/generate
async fn assets_generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "prompt", &mut params)?;
    call(&state, "generate_model", params).await
}

/// Handle POST /v1/assets/job
async fn assets_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "job_id", &mut params)?;
    call(&state, "poll_job", params).await
}

/// Handle POST /v1/assets/import
async fn assets_import(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let mut params = Map::new();
    copy_required_str(&body, "job_id", &mut params)?;
    call(&state, "import_generated", params).await
}

/// Handle POST /v1/tools/run - generic passthrough, mirrors the command
/// namespace 1:1. This is the route the agent loop uses.
async fn run_tool(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let name = body
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Validation("missing required field: type".to_string()))?
        .to_string();

    let params = match body.get("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(AppError::Validation(
                "field params must be an object".to_string(),
            ))
        }
    };

    call(&state, &name, params).await
}

/// Make exactly one bridge call with the deadline appropriate for the
/// command.
async fn call(
    state: &AppState,
    command: &str,
    params: Map<String, Value>,
) -> Result<Json<Value>, AppError> {
    let deadline = if catalog::is_long_running(command) {
        state.bridge.config().asset_timeout
    } else {
        state.bridge.config().timeout
    };

    let result = state
        .bridge
        .call_with_timeout(command, params, deadline)
        .await?;
    Ok(Json(result))
}

fn copy_required_str(body: &Value, key: &str, params: &mut Map<String, Value>) -> Result<(), AppError> {
    match body.get(key) {
        Some(Value::String(s)) => {
            params.insert(key.to_string(), Value::String(s.clone()));
            Ok(())
        }
        Some(_) => Err(AppError::Validation(format!("field {} must be a string", key))),
        None => Err(AppError::Validation(format!("missing required field: {}", key))),
    }
}

fn copy_optional_str(body: &Value, key: &str, params: &mut Map<String, Value>) -> Result<(), AppError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(s)) => {
            params.insert(key.to_string(), Value::String(s.clone()));
            Ok(())
        }
        Some(_) => Err(AppError::Validation(format!("field {} must be a string", key))),
    }
}

fn copy_optional_vec3(body: &Value, key: &str, params: &mut Map<String, Value>) -> Result<(), AppError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) if items.len() == 3 && items.iter().all(Value::is_number) => {
            params.insert(key.to_string(), Value::Array(items.clone()));
            Ok(())
        }
        Some(_) => Err(AppError::Validation(format!(
            "field {} must be an array of 3 numbers",
            key
        ))),
    }
}

/// Application error with the bridge taxonomy mapped onto HTTP statuses
pub enum AppError {
    /// Request body failed validation; no bridge call was made
    Validation(String),
    Bridge(BridgeError),
}

impl From<BridgeError> for AppError {
    fn from(err: BridgeError) -> Self {
        AppError::Bridge(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "validation_error", message)
            }
            AppError::Bridge(err) => {
                tracing::warn!(error = %err, "Bridge call failed");
                match &err {
                    BridgeError::UnknownCommand(_) => {
                        (StatusCode::NOT_FOUND, "unknown_command", err.to_string())
                    }
                    BridgeError::Handler(_) => {
                        (StatusCode::BAD_REQUEST, "handler_error", err.to_string())
                    }
                    BridgeError::Timeout(_) => {
                        (StatusCode::GATEWAY_TIMEOUT, "timeout", err.to_string())
                    }
                    BridgeError::Transport(_) | BridgeError::Protocol(_) => {
                        (StatusCode::BAD_GATEWAY, "bridge_error", err.to_string())
                    }
                }
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}
