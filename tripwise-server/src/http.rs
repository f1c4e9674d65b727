//! Tripwise HTTP REST API
//!
//! Axum-based HTTP server for the travel planner.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions are directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET  /health                          — health check with DB status
//! - GET  /version                         — server version info
//! - POST /api/auth/register               — create an account
//! - POST /api/auth/login                  — verify credentials
//! - GET  /api/profile/:user_id            — public profile
//! - POST /api/preferences                 — submit preferences, generate itinerary
//! - GET  /api/itineraries/:user_id        — latest itinerary payload
//! - POST /api/trips                       — create a trip
//! - GET  /api/trips/:user_id              — list a user's trips
//! - GET  /api/dashboard/popular_cities    — popular cities by country
//! - GET  /api/cities/search               — city search

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tripwise_core::models::{NewTrip, PreferenceDraft};
use tripwise_core::TripwiseConfig;
use uuid::Uuid;

use crate::subsystems::accounts::{self, AccountError, LoginRequest, RegisterRequest};
use crate::subsystems::cities::{self, CityError};
use crate::subsystems::planner::{Planner, PlannerError};
use crate::subsystems::trips::{self, TripError};

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub pool: PgPool,
    pub config: TripwiseConfig,
    pub planner: Planner,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.http.request_timeout_seconds);

    let api = Router::new()
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/profile/:user_id", get(profile_handler))
        .route("/preferences", post(preferences_handler))
        .route("/itineraries/:user_id", get(itinerary_handler))
        .route("/trips", post(create_trip_handler))
        .route("/trips/:user_id", get(list_trips_handler))
        .route("/dashboard/popular_cities", get(popular_cities_handler))
        .route("/cities/search", get(search_cities_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .nest("/api", api)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(timeout_body))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: HttpState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Tripwise HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PreferenceRequest {
    /// Kept untyped so a non-string id is reported as missing, not rejected.
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(flatten)]
    pub preferences: PreferenceDraft,
}

#[derive(Debug, Default, Deserialize)]
pub struct PopularCitiesQuery {
    pub country: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CitySearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

// ============================================================================
// Error bodies
// ============================================================================

/// Standard error body: `{"status":"error","error":..,"kind":..}`.
pub fn error_body(kind: &str, message: impl Into<String>) -> Value {
    json!({
        "status": "error",
        "error": message.into(),
        "kind": kind,
    })
}

/// Bodies that are not a JSON object (or not JSON at all) are validation
/// errors like any other bad input.
pub fn json_rejection_response(rejection: JsonRejection) -> (StatusCode, Value) {
    (
        StatusCode::BAD_REQUEST,
        error_body("validation", rejection.body_text()),
    )
}

/// `TimeoutLayer` answers with an empty 408; give it the standard error body.
async fn timeout_body(resp: Response) -> Response {
    if resp.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("Request exceeded the configured timeout");
        return (
            StatusCode::REQUEST_TIMEOUT,
            Json(error_body("timeout", "Request timed out")),
        )
            .into_response();
    }
    resp
}

fn missing_fields_body(missing: &[String], message: String) -> Value {
    let mut body = error_body("validation", message);
    body["missing"] = json!(missing);
    body
}

pub fn planner_error_response(err: &PlannerError) -> (StatusCode, Value) {
    let status = match err {
        PlannerError::Validation { .. } => StatusCode::BAD_REQUEST,
        PlannerError::NotFound | PlannerError::UnknownUser(_) => StatusCode::NOT_FOUND,
        PlannerError::GenerationUnavailable
        | PlannerError::Generation(_)
        | PlannerError::MalformedOutput { .. }
        | PlannerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match err {
        PlannerError::Validation { missing } => missing_fields_body(missing, err.to_string()),
        PlannerError::MalformedOutput { excerpt } => {
            let mut body = error_body(err.kind(), err.to_string());
            body["excerpt"] = json!(excerpt);
            body
        }
        // storage details stay in the logs
        PlannerError::Storage(_) => error_body(err.kind(), "Internal storage error"),
        _ => error_body(err.kind(), err.to_string()),
    };

    if status.is_server_error() {
        tracing::error!(kind = err.kind(), error = %err, "Planner request failed");
    }

    (status, body)
}

fn account_error_response(err: &AccountError) -> (StatusCode, Value) {
    match err {
        AccountError::MissingFields(missing) => (
            StatusCode::BAD_REQUEST,
            missing_fields_body(missing, err.to_string()),
        ),
        AccountError::EmailTaken => (StatusCode::CONFLICT, error_body("conflict", err.to_string())),
        AccountError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            error_body("unauthorized", err.to_string()),
        ),
        AccountError::NotFound => (StatusCode::NOT_FOUND, error_body("not_found", err.to_string())),
        AccountError::Hash(_) | AccountError::Database(_) => {
            tracing::error!(error = %err, "Account request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("storage", "Internal storage error"),
            )
        }
    }
}

fn trip_error_response(err: &TripError) -> (StatusCode, Value) {
    match err {
        TripError::MissingFields(missing) => (
            StatusCode::BAD_REQUEST,
            missing_fields_body(missing, err.to_string()),
        ),
        TripError::Invalid(_) => (
            StatusCode::BAD_REQUEST,
            error_body("validation", err.to_string()),
        ),
        TripError::UnknownUser(_) => (StatusCode::NOT_FOUND, error_body("not_found", err.to_string())),
        TripError::Database(_) => {
            tracing::error!(error = %err, "Trip request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("storage", "Internal storage error"),
            )
        }
    }
}

fn city_error_response(err: &CityError) -> (StatusCode, Value) {
    match err {
        CityError::EmptyQuery => (
            StatusCode::BAD_REQUEST,
            error_body("validation", err.to_string()),
        ),
        CityError::Database(_) => {
            tracing::error!(error = %err, "City request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("storage", "Internal storage error"),
            )
        }
    }
}

/// Parse a path user id, producing a 400 body on failure.
pub fn parse_user_id(raw: &str) -> std::result::Result<Uuid, (StatusCode, Value)> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            error_body("validation", format!("invalid user id: {}", raw)),
        )
    })
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check — queries DB and returns (status_code, json_body).
pub async fn health_inner(pool: &PgPool) -> (StatusCode, Value) {
    let pg_ver = match tripwise_core::db::health_check(pool).await {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                }),
            );
        }
    };

    let schema = match tripwise_core::db::schema_version(pool).await {
        Ok(Some(v)) => json!(v),
        Ok(None) | Err(_) => json!("unmigrated"),
    };

    (
        StatusCode::OK,
        json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
            "postgresql": pg_ver,
            "schema_version": schema,
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tripwise",
    })
}

pub async fn register_inner(pool: &PgPool, req: RegisterRequest) -> (StatusCode, Value) {
    match accounts::register(pool, req).await {
        Ok(user) => (
            StatusCode::CREATED,
            json!({ "message": "User registered", "user": user }),
        ),
        Err(e) => account_error_response(&e),
    }
}

pub async fn login_inner(pool: &PgPool, req: LoginRequest) -> (StatusCode, Value) {
    match accounts::login(pool, req).await {
        Ok(user) => (StatusCode::OK, json!({ "message": "Login successful", "user": user })),
        Err(e) => account_error_response(&e),
    }
}

pub async fn profile_inner(pool: &PgPool, user_id: &str) -> (StatusCode, Value) {
    let user_id = match parse_user_id(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match accounts::profile(pool, user_id).await {
        Ok(user) => (StatusCode::OK, json!(user)),
        Err(e) => account_error_response(&e),
    }
}

/// Inner preference submission — validates, generates and stores an itinerary.
pub async fn submit_preferences_inner(
    planner: &Planner,
    req: PreferenceRequest,
) -> (StatusCode, Value) {
    let user_id = req
        .user_id
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

    let Some(user_id) = user_id else {
        let mut missing = vec!["user_id".to_string()];
        if let Err(rest) = req.preferences.validate() {
            missing.extend(rest);
        }
        return planner_error_response(&PlannerError::Validation { missing });
    };

    match planner.submit_preferences(user_id, req.preferences).await {
        Ok(record) => (
            StatusCode::CREATED,
            json!({
                "message": "Preferences saved and itinerary generated",
                "itinerary": record,
            }),
        ),
        Err(e) => planner_error_response(&e),
    }
}

/// Inner itinerary lookup — payload of the most recent record for the user.
pub async fn latest_itinerary_inner(planner: &Planner, user_id: &str) -> (StatusCode, Value) {
    let user_id = match parse_user_id(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match planner.latest_itinerary(user_id).await {
        Ok(record) => (StatusCode::OK, record.payload),
        Err(e) => planner_error_response(&e),
    }
}

pub async fn create_trip_inner(pool: &PgPool, trip: NewTrip) -> (StatusCode, Value) {
    match trips::create_trip(pool, trip).await {
        Ok(trip) => (StatusCode::CREATED, json!(trip)),
        Err(e) => trip_error_response(&e),
    }
}

pub async fn list_trips_inner(pool: &PgPool, user_id: &str) -> (StatusCode, Value) {
    let user_id = match parse_user_id(user_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match trips::list_trips(pool, user_id).await {
        Ok(trips) => (StatusCode::OK, json!(trips)),
        Err(e) => trip_error_response(&e),
    }
}

pub async fn popular_cities_inner(pool: &PgPool, query: PopularCitiesQuery) -> (StatusCode, Value) {
    match cities::popular_cities(pool, query.country.as_deref(), query.limit).await {
        Ok(cities) => (StatusCode::OK, json!(cities)),
        Err(e) => city_error_response(&e),
    }
}

pub async fn search_cities_inner(pool: &PgPool, query: CitySearchQuery) -> (StatusCode, Value) {
    let q = query.q.unwrap_or_default();
    match cities::search_cities(pool, &q, query.limit).await {
        Ok(cities) => (StatusCode::OK, json!(cities)),
        Err(e) => city_error_response(&e),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn register_handler(
    State(state): State<Arc<HttpState>>,
    req: Result<Json<RegisterRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match req {
        Ok(Json(req)) => register_inner(&state.pool, req).await,
        Err(rejection) => json_rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn login_handler(
    State(state): State<Arc<HttpState>>,
    req: Result<Json<LoginRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match req {
        Ok(Json(req)) => login_inner(&state.pool, req).await,
        Err(rejection) => json_rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn profile_handler(
    State(state): State<Arc<HttpState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = profile_inner(&state.pool, &user_id).await;
    (status, Json(body))
}

pub async fn preferences_handler(
    State(state): State<Arc<HttpState>>,
    req: Result<Json<PreferenceRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match req {
        Ok(Json(req)) => submit_preferences_inner(&state.planner, req).await,
        Err(rejection) => json_rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn itinerary_handler(
    State(state): State<Arc<HttpState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = latest_itinerary_inner(&state.planner, &user_id).await;
    (status, Json(body))
}

pub async fn create_trip_handler(
    State(state): State<Arc<HttpState>>,
    trip: Result<Json<NewTrip>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match trip {
        Ok(Json(trip)) => create_trip_inner(&state.pool, trip).await,
        Err(rejection) => json_rejection_response(rejection),
    };
    (status, Json(body))
}

pub async fn list_trips_handler(
    State(state): State<Arc<HttpState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = list_trips_inner(&state.pool, &user_id).await;
    (status, Json(body))
}

pub async fn popular_cities_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<PopularCitiesQuery>,
) -> impl IntoResponse {
    let (status, body) = popular_cities_inner(&state.pool, query).await;
    (status, Json(body))
}

pub async fn search_cities_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<CitySearchQuery>,
) -> impl IntoResponse {
    let (status, body) = search_cities_inner(&state.pool, query).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests — pure helpers and error mapping
// ============================================================================
