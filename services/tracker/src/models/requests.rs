//! Request and response payloads for the HTTP surface
//!
//! Request fields are optional so that a missing field is reported as a
//! validation error by the service instead of a deserialization rejection.

use serde::{Deserialize, Serialize};

/// Query string of `GET /show`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQuery {
    pub client: Option<String>,
    pub priority: Option<String>,
}

/// Body of `POST /admin-home`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub client: Option<String>,
    pub points: Option<i32>,
    pub problem: Option<String>,
    pub priority: Option<String>,
}

/// Body of `POST /show-post` and `POST /complete`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionRequest {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub client: Option<String>,
    pub points: Option<i32>,
    pub problem: Option<String>,
    pub solution: Option<String>,
    /// Score delta for `POST /complete`; defaults to `points`
    pub delta: Option<i64>,
}

/// Body of `DELETE /show-post`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTicketRequest {
    pub id: Option<i64>,
}

/// Body of `PUT /show-points`
#[derive(Debug, Clone, Deserialize)]
pub struct PointsRequest {
    pub points: Option<i64>,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Reply of `POST /register` and `POST /login`
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
}
