use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cafecrawl_core::TracingCrawlReporter;
use cafecrawl_core::schedule::DEFAULT_JOB_NAME;
use cafecrawl_core::traits::{CafeStore, RunLog};

use crate::auth::require_admin_token;
use crate::dto::{
    CafeListResponse, CafeResponse, CrawlRunListResponse, CrawlRunResponse,
    CrawlSummaryResponse, ErrorResponse, HealthResponse, ListCafesQuery, ListRunsQuery,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/v1/crawls", post(start_crawl))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_token,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .route("/v1/crawls", get(list_crawls))
        .route("/v1/cafes", get(list_cafes))
        .route("/v1/cafes/{external_id}", get(get_cafe))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(admin).with_state(state)
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

// ---------------------------------------------------------------------------
// Crawls
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/crawls",
    responses(
        (status = 200, description = "Crawl finished", body = CrawlSummaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin endpoints disabled", body = ErrorResponse),
        (status = 409, description = "A crawl is already running", body = ErrorResponse),
        (status = 500, description = "Crawl task failed", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "crawls"
)]
pub async fn start_crawl(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Ok(guard) = state.crawl_lock.clone().try_lock_owned() else {
        let body = ErrorResponse {
            error: "conflict".to_string(),
            message: "A crawl is already running".to_string(),
        };
        return (StatusCode::CONFLICT, axum::Json(body)).into_response();
    };

    // The run outlives a dropped request: the task owns the lock guard and
    // records the run even if nobody awaits the response.
    let task_state = state.clone();
    let handle = tokio::spawn(async move {
        let _guard = guard;
        let summary = task_state
            .crawler
            .run(&task_state.zones, &task_state.shutdown, &TracingCrawlReporter)
            .await;

        let run_id = match task_state
            .db
            .run_repo()
            .record_run(DEFAULT_JOB_NAME, &summary)
            .await
        {
            Ok(run) => Some(run.id),
            Err(e) => {
                tracing::error!(error = %e, "Failed to record crawl run");
                None
            }
        };
        (summary, run_id)
    });

    match handle.await {
        Ok((summary, run_id)) => {
            axum::Json(CrawlSummaryResponse::new(summary, run_id)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Crawl task failed");
            let body = ErrorResponse {
                error: "internal_error".to_string(),
                message: "Crawl task failed".to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/crawls",
    params(ListRunsQuery),
    responses(
        (status = 200, description = "Recent crawl runs, newest first", body = CrawlRunListResponse),
    ),
    tag = "crawls"
)]
pub async fn list_crawls(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRunsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let runs = state
        .db
        .run_repo()
        .recent_runs(DEFAULT_JOB_NAME, clamp_limit(query.limit))
        .await?;
    let total = runs.len();

    let response = CrawlRunListResponse {
        runs: runs.into_iter().map(CrawlRunResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Cafés
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/cafes",
    params(ListCafesQuery),
    responses(
        (status = 200, description = "Stored cafés, most recently updated first", body = CafeListResponse),
    ),
    tag = "cafes"
)]
pub async fn list_cafes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListCafesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.cafe_repo();
    let limit = clamp_limit(query.limit);
    let cafes = match query.zone.as_deref() {
        Some(zone) => repo.list_by_zone(zone, limit).await?,
        None => repo.list_recent(limit).await?,
    };
    let total = cafes.len();

    let response = CafeListResponse {
        cafes: cafes.into_iter().map(CafeResponse::from).collect(),
        total,
    };

    Ok(axum::Json(response))
}

#[utoipa::path(
    get,
    path = "/v1/cafes/{external_id}",
    params(
        ("external_id" = String, Path, description = "Kakao place id")
    ),
    responses(
        (status = 200, description = "Café details", body = CafeResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
    ),
    tag = "cafes"
)]
pub async fn get_cafe(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.db.cafe_repo().get(&external_id).await? {
        Some(cafe) => Ok(axum::Json(CafeResponse::from(cafe)).into_response()),
        None => {
            let body = ErrorResponse {
                error: "not_found".to_string(),
                message: format!("Cafe not found: {external_id}"),
            };
            Ok((StatusCode::NOT_FOUND, axum::Json(body)).into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = state.db.cafe_repo().health_check().await.is_ok();

    let (status, response) = if healthy {
        (
            StatusCode::OK,
            HealthResponse {
                status: "healthy",
                database: "ok",
            },
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            HealthResponse {
                status: "unhealthy",
                database: "error",
            },
        )
    };

    (status, axum::Json(response))
}
