//! Input validation utilities
//!
//! Turns loosely typed request payloads into domain values, reporting the
//! first problem found as [`TrackerError::Validation`].

use crate::{
    error::{TrackerError, TrackerResult},
    models::{
        NewCompletedTicket, Priority, Ticket, TicketFilter,
        requests::{CompletionRequest, TicketQuery, TicketRequest},
    },
};

const MAX_TEXT_LEN: usize = 4096;
const MAX_USERNAME_LEN: usize = 256;

/// Validate username
///
/// Any non-empty string is accepted; usernames are compared byte for byte.
pub fn validate_username(username: &str) -> TrackerResult<()> {
    if username.is_empty() {
        return Err(TrackerError::validation("Username is required"));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(TrackerError::validation(format!(
            "Username must be at most {} bytes long",
            MAX_USERNAME_LEN
        )));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> TrackerResult<()> {
    if password.is_empty() {
        return Err(TrackerError::validation("Password is required"));
    }

    if password.len() > 128 {
        return Err(TrackerError::validation(
            "Password must be at most 128 characters long",
        ));
    }

    Ok(())
}

fn required_text(value: Option<&str>, field: &str) -> TrackerResult<String> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(TrackerError::validation(format!("{} is required", field)));
    }
    if value.len() > MAX_TEXT_LEN {
        return Err(TrackerError::validation(format!(
            "{} must be at most {} bytes long",
            field, MAX_TEXT_LEN
        )));
    }
    Ok(value.to_string())
}

fn required<T>(value: Option<T>, field: &str) -> TrackerResult<T> {
    value.ok_or_else(|| TrackerError::validation(format!("{} is required", field)))
}

fn validate_points(points: i32) -> TrackerResult<i32> {
    if points < 0 {
        return Err(TrackerError::validation("points must not be negative"));
    }
    Ok(points)
}

/// Validate a ticket id
pub fn validate_id(id: Option<i64>) -> TrackerResult<i64> {
    required(id, "id")
}

/// Validate an open-ticket submission
pub fn validate_ticket(request: &TicketRequest) -> TrackerResult<Ticket> {
    let priority = required_text(request.priority.as_deref(), "priority")?
        .parse::<Priority>()
        .map_err(TrackerError::Validation)?;

    Ok(Ticket {
        id: validate_id(request.id)?,
        name: required_text(request.name.as_deref(), "name")?,
        client: required_text(request.client.as_deref(), "client")?,
        points: validate_points(required(request.points, "points")?)?,
        problem: required_text(request.problem.as_deref(), "problem")?,
        priority,
    })
}

/// Validate an archive submission
pub fn validate_completion(request: &CompletionRequest) -> TrackerResult<NewCompletedTicket> {
    Ok(NewCompletedTicket {
        id: validate_id(request.id)?,
        name: required_text(request.name.as_deref(), "name")?,
        client: required_text(request.client.as_deref(), "client")?,
        points: validate_points(required(request.points, "points")?)?,
        problem: required_text(request.problem.as_deref(), "problem")?,
        solution: required_text(request.solution.as_deref(), "solution")?,
    })
}

/// Validate the open-ticket filters; blank values are treated as absent
pub fn validate_ticket_query(query: &TicketQuery) -> TrackerResult<TicketFilter> {
    let non_blank = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let priority = non_blank(&query.priority)
        .map(|p| p.parse::<Priority>())
        .transpose()
        .map_err(TrackerError::Validation)?;

    Ok(TicketFilter {
        client: non_blank(&query.client),
        priority,
    })
}

/// Validate a score delta
pub fn validate_delta(delta: Option<i64>) -> TrackerResult<i64> {
    required(delta, "points")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket_request() -> TicketRequest {
        TicketRequest {
            id: Some(1),
            name: Some("Fix login".to_string()),
            client: Some("Acme".to_string()),
            points: Some(5),
            problem: Some("Login page returns 500".to_string()),
            priority: Some("High".to_string()),
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("jane doe").is_ok());
        assert!(validate_username("José").is_ok());
        assert!(validate_username(&"a".repeat(40)).is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(257)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("correct").is_ok());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_ticket_trims_fields() {
        let mut request = ticket_request();
        request.client = Some("  Acme  ".to_string());

        let ticket = validate_ticket(&request).unwrap();
        assert_eq!(ticket.client, "Acme");
        assert_eq!(ticket.priority, Priority::High);
    }

    #[test]
    fn test_validate_ticket_rejects_missing_or_blank_fields() {
        let mut missing_id = ticket_request();
        missing_id.id = None;
        assert!(matches!(
            validate_ticket(&missing_id),
            Err(TrackerError::Validation(msg)) if msg == "id is required"
        ));

        let mut blank_name = ticket_request();
        blank_name.name = Some("   ".to_string());
        assert!(matches!(
            validate_ticket(&blank_name),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_ticket_rejects_unknown_priority() {
        let mut request = ticket_request();
        request.priority = Some("Urgent".to_string());
        assert!(matches!(
            validate_ticket(&request),
            Err(TrackerError::Validation(msg)) if msg.contains("Urgent")
        ));
    }

    #[test]
    fn test_validate_ticket_query() {
        assert_eq!(
            validate_ticket_query(&TicketQuery::default()).unwrap(),
            TicketFilter::default()
        );

        let query = TicketQuery {
            client: Some("  ".to_string()),
            priority: Some("Medium".to_string()),
        };
        let filter = validate_ticket_query(&query).unwrap();
        assert_eq!(filter.client, None);
        assert_eq!(filter.priority, Some(Priority::Medium));

        let query = TicketQuery {
            client: None,
            priority: Some("urgent".to_string()),
        };
        assert!(matches!(
            validate_ticket_query(&query),
            Err(TrackerError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_completion_requires_solution() {
        let request = CompletionRequest {
            id: Some(1),
            name: Some("Fix login".to_string()),
            client: Some("Acme".to_string()),
            points: Some(5),
            problem: Some("Login page returns 500".to_string()),
            solution: None,
            delta: None,
        };

        assert!(matches!(
            validate_completion(&request),
            Err(TrackerError::Validation(msg)) if msg == "solution is required"
        ));
    }
}
