//! Ticket models: open tickets, archived tickets and priorities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Get the priority name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            other => Err(format!(
                "Priority must be one of High, Medium, Low (got {:?})",
                other
            )),
        }
    }
}

/// Open ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub name: String,
    pub client: String,
    pub points: i32,
    pub problem: String,
    pub priority: Priority,
}

/// Narrowing of the open-ticket list; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    /// Case-insensitive substring of `client`
    pub client: Option<String>,
    pub priority: Option<Priority>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        let client_matches = self.client.as_ref().is_none_or(|needle| {
            ticket
                .client
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let priority_matches = self.priority.is_none_or(|p| ticket.priority == p);

        client_matches && priority_matches
    }
}

/// Archive payload: the ticket data plus its resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompletedTicket {
    pub id: i64,
    pub name: String,
    pub client: String,
    pub points: i32,
    pub problem: String,
    pub solution: String,
}

impl NewCompletedTicket {
    /// Build the archive payload for an open ticket
    pub fn from_ticket(ticket: &Ticket, solution: impl Into<String>) -> Self {
        Self {
            id: ticket.id,
            name: ticket.name.clone(),
            client: ticket.client.clone(),
            points: ticket.points,
            problem: ticket.problem.clone(),
            solution: solution.into(),
        }
    }
}

/// Archived ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedTicket {
    pub id: i64,
    pub name: String,
    pub client: String,
    pub points: i32,
    pub problem: String,
    pub solution: String,
    pub completed_at: DateTime<Utc>,
}

impl CompletedTicket {
    pub fn new(ticket: NewCompletedTicket, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: ticket.id,
            name: ticket.name,
            client: ticket.client,
            points: ticket.points,
            problem: ticket.problem,
            solution: ticket.solution,
            completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_canonical_names_only() {
        for priority in Priority::ALL {
            assert_eq!(priority.as_str().parse::<Priority>(), Ok(priority));
        }
        assert!("high".parse::<Priority>().is_err());
        assert!("Urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn ticket_serializes_priority_by_name() {
        let ticket = Ticket {
            id: 1,
            name: "Fix login".to_string(),
            client: "Acme".to_string(),
            points: 5,
            problem: "Login page returns 500".to_string(),
            priority: Priority::High,
        };

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["priority"], "High");
        assert_eq!(json["points"], 5);
    }

    #[test]
    fn filter_matches_client_substring_ignoring_case() {
        let ticket = Ticket {
            id: 1,
            name: "Fix login".to_string(),
            client: "Acme Corp".to_string(),
            points: 5,
            problem: "Login page returns 500".to_string(),
            priority: Priority::High,
        };

        assert!(TicketFilter::default().matches(&ticket));

        let by_client = TicketFilter {
            client: Some("aCME".to_string()),
            priority: None,
        };
        assert!(by_client.matches(&ticket));

        let wrong_priority = TicketFilter {
            client: Some("corp".to_string()),
            priority: Some(Priority::Low),
        };
        assert!(!wrong_priority.matches(&ticket));
    }

    #[test]
    fn archive_payload_drops_priority_and_adds_solution() {
        let ticket = Ticket {
            id: 3,
            name: "Slow report".to_string(),
            client: "Globex".to_string(),
            points: 2,
            problem: "Report takes minutes".to_string(),
            priority: Priority::Low,
        };

        let archived = NewCompletedTicket::from_ticket(&ticket, "Added index");
        assert_eq!(archived.id, 3);
        assert_eq!(archived.points, 2);
        assert_eq!(archived.solution, "Added index");
    }
}
