//! Management HTTP surface (spec §9's ambient "management HTTP surface,
//! distinct from the HSTP transport bindings") — health, statistics, and
//! activity introspection for operators. This is not an HSTP wire
//! transport; it never sends or receives [`crate::message::HstpMessage`]s.

use crate::activity::{Activity, ActivityManager, ActivityQuery, ActivityStatistics, ActivityStatus};
use crate::domain_types::ActivityId;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// `GET /api/v1/health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

/// `GET /api/v1/activities` query parameters.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ActivitySearchParams {
    pub schema_id: Option<String>,
    pub status: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Shared state handed to every route.
#[derive(Clone)]
pub struct ManagementState {
    pub activities: Arc<ActivityManager>,
}

/// Builds the management router. Distinct from any HSTP transport binding
/// — operators reach this over plain HTTP for visibility, not HSTP
/// messaging.
#[must_use]
pub fn create_app(state: ManagementState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/stats", get(get_statistics))
        .route("/api/v1/activities", get(search_activities))
        .route("/api/v1/activities/{id}", get(get_activity))
        .with_state(state)
}

/// Binds and serves the management router until the process is asked to
/// shut down.
///
/// # Errors
/// Returns an error if the listener cannot bind `addr` or the server
/// fails.
pub async fn serve(addr: SocketAddr, state: ManagementState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_app(state);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
    })
}

async fn get_statistics(State(state): State<ManagementState>) -> Json<ActivityStatistics> {
    Json(state.activities.get_statistics())
}

fn parse_status(raw: &str) -> Option<ActivityStatus> {
    match raw.to_ascii_uppercase().as_str() {
        "CREATED" => Some(ActivityStatus::Created),
        "QUEUED" => Some(ActivityStatus::Queued),
        "RUNNING" => Some(ActivityStatus::Running),
        "PAUSED" => Some(ActivityStatus::Paused),
        "COMPLETED" => Some(ActivityStatus::Completed),
        "FAILED" => Some(ActivityStatus::Failed),
        "CANCELLED" => Some(ActivityStatus::Cancelled),
        _ => None,
    }
}

async fn search_activities(
    State(state): State<ManagementState>,
    Query(params): Query<ActivitySearchParams>,
) -> impl IntoResponse {
    let status = match params.status.as_deref() {
        Some(raw) => match parse_status(raw) {
            Some(status) => Some(status),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "invalid status filter".to_string(),
                        details: Some(raw.to_string()),
                    }),
                )
                    .into_response();
            }
        },
        None => None,
    };
    let schema_id = match params.schema_id.as_deref().map(crate::domain_types::SchemaId::try_new) {
        Some(Ok(id)) => Some(id),
        Some(Err(e)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid schema_id filter".to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response();
        }
        None => None,
    };
    let query = ActivityQuery {
        schema_id,
        status,
        created_by: params.created_by,
    };
    let results: Vec<Activity> = state.activities.search_activities(&query);
    (StatusCode::OK, Json(results)).into_response()
}

async fn get_activity(State(state): State<ManagementState>, Path(id_str): Path<String>) -> impl IntoResponse {
    let id = match id_str.parse::<uuid::Uuid>() {
        Ok(uuid) => ActivityId::from(uuid),
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "invalid activity id format".to_string(),
                    details: Some("activity id must be a valid UUID".to_string()),
                }),
            )
                .into_response();
        }
    };
    match state.activities.get_activity(id) {
        Some(activity) => (StatusCode::OK, Json(activity)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "activity not found".to_string(),
                details: Some(format!("no activity with id {id_str}")),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_response_reports_healthy() {
        let response = HealthCheckResponse {
            status: "healthy".to_string(),
        };
        assert_eq!(response.status, "healthy");
    }

    #[test]
    fn parse_status_accepts_case_insensitive_names() {
        assert_eq!(parse_status("running"), Some(ActivityStatus::Running));
        assert_eq!(parse_status("COMPLETED"), Some(ActivityStatus::Completed));
        assert_eq!(parse_status("not-a-status"), None);
    }
}
