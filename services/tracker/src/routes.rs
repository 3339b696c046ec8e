//! Tracker service routes

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::error;

use crate::{
    error::{TrackerError, TrackerResult},
    models::{
        Credentials, LoginOutcome,
        requests::{
            AuthResponse, CompletionRequest, DeleteTicketRequest, MessageResponse, PointsRequest,
            TicketQuery, TicketRequest,
        },
    },
    state::AppState,
    validation::{
        validate_completion, validate_delta, validate_id, validate_ticket, validate_ticket_query,
    },
};

/// Create the router for the tracker service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/show", get(list_open_tickets))
        .route("/completed", get(list_completed_tickets))
        .route("/admin-home", post(create_ticket))
        .route("/show-post", post(archive_ticket).delete(delete_ticket))
        .route("/complete", post(complete_ticket))
        .route("/show-points", get(get_points).put(increment_points))
        .route("/priority-counts", get(priority_counts))
        .route("/priority-counts/cached", get(cached_priority_counts))
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state)
}

/// Log a failed operation before it becomes a response
fn logged(operation: &'static str) -> impl Fn(TrackerError) -> TrackerError {
    move |e| {
        match &e {
            TrackerError::Validation(_) | TrackerError::DuplicateId(_) => {}
            _ => error!("Failed to {}: {}", operation, e),
        }
        e
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "ticket-tracker"
    }))
}

/// List open tickets, optionally filtered by `?client=` and `?priority=`
pub async fn list_open_tickets(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> TrackerResult<impl IntoResponse> {
    let filter = validate_ticket_query(&query)?;
    let tickets = state
        .tickets
        .list_open(&filter)
        .await
        .map_err(logged("list tickets"))?;

    Ok(Json(tickets))
}

/// List archived tickets
pub async fn list_completed_tickets(
    State(state): State<AppState>,
) -> TrackerResult<impl IntoResponse> {
    let tickets = state
        .tickets
        .list_completed()
        .await
        .map_err(logged("list completed tickets"))?;

    Ok(Json(tickets))
}

/// Open a new ticket
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(payload): Json<TicketRequest>,
) -> TrackerResult<impl IntoResponse> {
    let ticket = validate_ticket(&payload)?;
    state
        .tickets
        .submit_ticket(&ticket)
        .await
        .map_err(logged("create ticket"))?;

    Ok(Json(MessageResponse::new("Data inserted")))
}

/// Archive a ticket without touching the open table or the score
pub async fn archive_ticket(
    State(state): State<AppState>,
    Json(payload): Json<CompletionRequest>,
) -> TrackerResult<impl IntoResponse> {
    let ticket = validate_completion(&payload)?;
    state
        .tickets
        .archive_ticket(&ticket)
        .await
        .map_err(logged("archive ticket"))?;

    Ok(Json(MessageResponse::new("Data inserted")))
}

/// Archive, score and close a ticket in one step
pub async fn complete_ticket(
    State(state): State<AppState>,
    Json(payload): Json<CompletionRequest>,
) -> TrackerResult<impl IntoResponse> {
    let ticket = validate_completion(&payload)?;
    let delta = payload.delta.unwrap_or(i64::from(ticket.points));
    state
        .tickets
        .complete_ticket(&ticket, delta)
        .await
        .map_err(logged("complete ticket"))?;

    Ok(Json(MessageResponse::new("Ticket completed")))
}

/// Delete an open ticket; unknown ids succeed
pub async fn delete_ticket(
    State(state): State<AppState>,
    Json(payload): Json<DeleteTicketRequest>,
) -> TrackerResult<impl IntoResponse> {
    let id = validate_id(payload.id)?;
    state
        .tickets
        .remove_ticket(id)
        .await
        .map_err(logged("delete ticket"))?;

    Ok(Json(MessageResponse::new("Ticket deleted successfully")))
}

/// Add a delta to the shared score
pub async fn increment_points(
    State(state): State<AppState>,
    Json(payload): Json<PointsRequest>,
) -> TrackerResult<impl IntoResponse> {
    let delta = validate_delta(payload.points)?;
    state
        .tickets
        .increment_points(delta)
        .await
        .map_err(logged("update points"))?;

    Ok(Json(MessageResponse::new("Points updated successfully")))
}

/// Current score as a bare number
pub async fn get_points(State(state): State<AppState>) -> TrackerResult<impl IntoResponse> {
    let total = state
        .tickets
        .get_points()
        .await
        .map_err(logged("fetch points"))?;

    Ok(Json(total))
}

/// Exact per-priority counts of open tickets
pub async fn priority_counts(State(state): State<AppState>) -> TrackerResult<impl IntoResponse> {
    let tally = state
        .tickets
        .priority_tally()
        .await
        .map_err(logged("count tickets by priority"))?;

    Ok(Json(tally))
}

/// Best-effort display counters
pub async fn cached_priority_counts(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.tickets.cached_priority_tally().await)
}

/// Credential failures are soft: HTTP 200 with `success: false`.
fn auth_reply(result: TrackerResult<()>, success_message: &str) -> Json<AuthResponse> {
    let (success, message) = match result {
        Ok(()) => (true, success_message.to_string()),
        Err(
            e @ (TrackerError::DuplicateUser
            | TrackerError::UserNotFound
            | TrackerError::WrongPassword),
        ) => (false, e.to_string()),
        Err(TrackerError::Validation(msg)) => (false, msg),
        Err(e) => {
            error!("Credential check failed: {}", e);
            (false, "DB Error".to_string())
        }
    };

    Json(AuthResponse { success, message })
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> impl IntoResponse {
    let result = state.credentials.register(&payload).await;
    auth_reply(result, "Registration successful")
}

/// Check a username/password pair
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> impl IntoResponse {
    let result = match state.credentials.login(&payload).await {
        Ok(LoginOutcome::Authenticated) => Ok(()),
        Ok(LoginOutcome::WrongPassword) => Err(TrackerError::WrongPassword),
        Err(e) => Err(e),
    };
    auth_reply(result, "Login success")
}
