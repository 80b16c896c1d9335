use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tripplan_core::GenerateError;
use tripplan_core::itinerary::{fetch_itinerary, generate_for_trip_id};
use tripplan_core::llm::{ChatCompletion, LlmCredentials};
use tripplan_core::trip::{duration_text, short_range_text};
use tripplan_db::models::{DayPlan, Trip};
use tripplan_db::queries::{day_plans, trips};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub llm: Arc<dyn ChatCompletion>,
    pub credentials: Arc<LlmCredentials>,
    /// Cancelled on server shutdown; each generation runs under a child token.
    pub shutdown: CancellationToken,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "storage",
            message: format!("{err:#}"),
        }
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        let status = match &err {
            GenerateError::Validation(_) => StatusCode::BAD_REQUEST,
            GenerateError::TripNotFound(_) => StatusCode::NOT_FOUND,
            GenerateError::Configuration(_) => StatusCode::PRECONDITION_FAILED,
            GenerateError::Transport(_)
            | GenerateError::EmptyResponse
            | GenerateError::Parse(_) => StatusCode::BAD_GATEWAY,
            GenerateError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GenerateError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TripSummaryResponse {
    #[serde(flatten)]
    pub trip: Trip,
    pub duration: String,
    pub date_range: String,
    pub planned_days: i64,
}

#[derive(Debug, Serialize)]
pub struct TripDetailResponse {
    #[serde(flatten)]
    pub trip: Trip,
    pub duration: String,
    pub date_range: String,
    pub days: Vec<DayPlan>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/trips", get(list_trips))
        .route("/api/trips/{id}", get(get_trip_detail))
        .route("/api/trips/{id}/plan", get(get_plan).post(generate_plan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("tripplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    tracing::info!("tripplan serve shut down");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler; serving until killed");
        std::future::pending::<()>().await;
    }
    // Abort in-flight generations before their replace step.
    shutdown.cancel();
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn load_trip(pool: &PgPool, id: i64) -> Result<Trip, AppError> {
    trips::get_trip(pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("trip {id} not found")))
}

async fn list_trips(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let all = trips::list_trips(&state.pool)
        .await
        .map_err(AppError::internal)?;

    let mut results = Vec::with_capacity(all.len());
    for trip in all {
        let planned_days = day_plans::count_day_plans(&state.pool, trip.id)
            .await
            .map_err(AppError::internal)?;
        results.push(TripSummaryResponse {
            duration: duration_text(trip.start_date, trip.end_date),
            date_range: short_range_text(trip.start_date, trip.end_date),
            planned_days,
            trip,
        });
    }

    Ok(Json(results).into_response())
}

async fn get_trip_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, AppError> {
    let trip = load_trip(&state.pool, id).await?;
    let days = fetch_itinerary(&state.pool, id).await?;

    Ok(Json(TripDetailResponse {
        duration: duration_text(trip.start_date, trip.end_date),
        date_range: short_range_text(trip.start_date, trip.end_date),
        days,
        trip,
    })
    .into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, AppError> {
    load_trip(&state.pool, id).await?;
    let days = fetch_itinerary(&state.pool, id).await?;
    Ok(Json(days).into_response())
}

async fn generate_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, AppError> {
    let cancel = state.shutdown.child_token();
    let days = generate_for_trip_id(
        &state.pool,
        state.llm.as_ref(),
        id,
        &state.credentials,
        &cancel,
    )
    .await
    .map_err(|err| {
        tracing::warn!(trip_id = id, kind = err.kind(), error = %err, "generation failed");
        AppError::from(err)
    })?;

    Ok(Json(days).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use tripplan_core::GenerateError;
    use tripplan_core::itinerary::ParseError;
    use tripplan_core::llm::{ChatCompletion, LlmCredentials, LlmError};
    use tripplan_core::trip::ValidationError;
    use tripplan_test_utils::{create_test_db, drop_test_db, seed_trip};

    use super::{AppError, AppState};

    // -----------------------------------------------------------------------
    // Scripted LLM
    // -----------------------------------------------------------------------

    /// Replies with `reply`, or fails with a 502 from upstream when `None`.
    struct ScriptedLlm {
        reply: Option<String>,
    }

    #[async_trait]
    impl ChatCompletion for ScriptedLlm {
        async fn complete(
            &self,
            credentials: &LlmCredentials,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<String, LlmError> {
            credentials.check_present()?;
            self.reply.clone().ok_or(LlmError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            })
        }
    }

    const TWO_DAYS: &str = r#"{"days":[
        {"dayNumber":1,"summary":"Alfama","description":"Old town walk."},
        {"dayNumber":2,"summary":"Belem","description":"Riverside monuments."}
    ]}"#;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state(pool: sqlx::PgPool, reply: Option<&str>, credentials: LlmCredentials) -> AppState {
        AppState {
            pool,
            llm: Arc::new(ScriptedLlm {
                reply: reply.map(str::to_string),
            }),
            credentials: Arc::new(credentials),
            shutdown: CancellationToken::new(),
        }
    }

    fn creds() -> LlmCredentials {
        LlmCredentials::new("https://llm.test", "sk-test")
    }

    async fn send(state: AppState, method: Method, uri: &str) -> axum::response::Response {
        let app = super::build_router(state);
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Error mapping
    // -----------------------------------------------------------------------

    #[test]
    fn generate_errors_map_to_statuses() {
        let cases = [
            (
                GenerateError::Validation(ValidationError::MissingCity),
                StatusCode::BAD_REQUEST,
                "validation",
            ),
            (GenerateError::TripNotFound(4), StatusCode::NOT_FOUND, "not_found"),
            (
                GenerateError::Configuration("no key".to_string()),
                StatusCode::PRECONDITION_FAILED,
                "configuration",
            ),
            (
                GenerateError::Transport(LlmError::InvalidResponse("html".to_string())),
                StatusCode::BAD_GATEWAY,
                "transport",
            ),
            (GenerateError::EmptyResponse, StatusCode::BAD_GATEWAY, "empty_response"),
            (
                GenerateError::Parse(ParseError::NoDays),
                StatusCode::BAD_GATEWAY,
                "parse",
            ),
            (
                GenerateError::Storage(anyhow::anyhow!("connection reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage",
            ),
            (GenerateError::Cancelled, StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
        ];
        for (err, status, kind) in cases {
            let app_err = AppError::from(err);
            assert_eq!(app_err.status, status, "{kind}");
            assert_eq!(app_err.kind, kind);
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_list_trips_empty() {
        let (pool, db_name) = create_test_db().await;

        let resp = send(state(pool.clone(), None, creds()), Method::GET, "/api/trips").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_list_trips_with_data() {
        let (pool, db_name) = create_test_db().await;
        let trip = seed_trip(&pool, "2025-09-05", "2025-09-07").await;

        let resp = send(state(pool.clone(), None, creds()), Method::GET, "/api/trips").await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let arr = json.as_array().expect("response should be an array");
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["id"], trip.id);
        assert_eq!(arr[0]["city"], "Lisbon");
        assert_eq!(arr[0]["duration"], "3 days");
        assert_eq!(arr[0]["date_range"], "Sep 5–7, 2025");
        assert_eq!(arr[0]["planned_days"], 0);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_get_trip_not_found() {
        let (pool, db_name) = create_test_db().await;

        for uri in ["/api/trips/4242", "/api/trips/4242/plan"] {
            let resp = send(state(pool.clone(), None, creds()), Method::GET, uri).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            let json = body_json(resp).await;
            assert_eq!(json["kind"], "not_found");
            assert!(json["error"].as_str().unwrap().contains("4242"));
        }

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_generate_then_read_plan() {
        let (pool, db_name) = create_test_db().await;
        let trip = seed_trip(&pool, "2025-09-05", "2025-09-06").await;
        let st = state(pool.clone(), Some(TWO_DAYS), creds());

        let uri = format!("/api/trips/{}/plan", trip.id);
        let resp = send(st.clone(), Method::POST, &uri).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let generated = body_json(resp).await;
        let days = generated.as_array().unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0]["day_number"], 1);
        assert_eq!(days[0]["summary"], "Alfama");

        let resp = send(st.clone(), Method::GET, &uri).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, generated);

        let resp = send(st, Method::GET, &format!("/api/trips/{}", trip.id)).await;
        let detail = body_json(resp).await;
        assert_eq!(detail["duration"], "2 days");
        assert_eq!(detail["days"], generated);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_generate_unknown_trip() {
        let (pool, db_name) = create_test_db().await;

        let resp = send(
            state(pool.clone(), Some(TWO_DAYS), creds()),
            Method::POST,
            "/api/trips/77/plan",
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["kind"], "not_found");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_generate_failures_map_to_kinds() {
        let (pool, db_name) = create_test_db().await;
        let trip = seed_trip(&pool, "2025-09-05", "2025-09-06").await;
        let uri = format!("/api/trips/{}/plan", trip.id);

        let cases = [
            (Some("no json here"), creds(), StatusCode::BAD_GATEWAY, "parse"),
            (None, creds(), StatusCode::BAD_GATEWAY, "transport"),
            (
                Some(TWO_DAYS),
                LlmCredentials::new("", "sk-test"),
                StatusCode::PRECONDITION_FAILED,
                "configuration",
            ),
        ];
        for (reply, credentials, status, kind) in cases {
            let resp = send(state(pool.clone(), reply, credentials), Method::POST, &uri).await;
            assert_eq!(resp.status(), status, "{kind}");
            assert_eq!(body_json(resp).await["kind"], kind);
        }

        assert_eq!(
            tripplan_db::queries::day_plans::count_day_plans(&pool, trip.id)
                .await
                .unwrap(),
            0
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_generate_during_shutdown_is_unavailable() {
        let (pool, db_name) = create_test_db().await;
        let trip = seed_trip(&pool, "2025-09-05", "2025-09-06").await;
        let st = state(pool.clone(), Some(TWO_DAYS), creds());
        st.shutdown.cancel();

        let resp = send(st, Method::POST, &format!("/api/trips/{}/plan", trip.id)).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["kind"], "cancelled");

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
