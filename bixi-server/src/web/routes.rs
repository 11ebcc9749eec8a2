//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::error::{ErrorKind, QueryError};

use super::dto::*;
use super::state::AppState;
use super::tools::{self, Tool};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(call_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The tool catalogue.
async fn list_tools() -> Json<ToolList> {
    Json(ToolList {
        tools: Tool::ALL.iter().map(Tool::info).collect(),
    })
}

/// Invoke a tool with a JSON object of arguments.
async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let tool = Tool::parse(&name).ok_or_else(|| AppError::NotFound {
        message: format!("unknown tool '{name}'"),
    })?;
    let args = parse_arguments(&body)?;

    Ok(tools::call(&state.service, tool, args).await?)
}

/// Parse a request body as a JSON object. An empty body is no arguments.
fn parse_arguments(body: &[u8]) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, body = %String::from_utf8_lossy(body), "unparseable tool arguments");
        AppError::BadRequest {
            message: format!("invalid JSON: {e}"),
        }
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Default::default())),
        _ => Err(AppError::BadRequest {
            message: "arguments must be a JSON object".to_string(),
        }),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        let message = e.to_string();
        match e.kind() {
            ErrorKind::InvalidArgument => AppError::BadRequest { message },
            ErrorKind::NotFound => AppError::NotFound { message },
            ErrorKind::Transport => AppError::Upstream { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::BadRequest { message } => {
                (StatusCode::BAD_REQUEST, ErrorKind::InvalidArgument, message)
            }
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, ErrorKind::NotFound, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, ErrorKind::Transport, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "tool call failed");
        } else {
            warn!(%status, %message, "tool call rejected");
        }

        let body = Json(ErrorResponse {
            error: message,
            kind: kind.as_str().to_string(),
        });
        (status, body).into_response()
    }
}
