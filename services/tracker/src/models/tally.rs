//! Per-priority ticket counts

use serde::{Deserialize, Serialize};

use super::ticket::{Priority, Ticket};

/// Ticket counts by priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTally {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl PriorityTally {
    /// Exact tally of the given tickets
    pub fn from_tickets<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Self {
        let mut tally = Self::default();
        for ticket in tickets {
            tally.observe(ticket.priority);
        }
        tally
    }

    pub fn observe(&mut self, priority: Priority) {
        *self.slot_mut(priority) += 1;
    }

    pub fn get(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    pub fn set(&mut self, priority: Priority, count: u64) {
        *self.slot_mut(priority) = count;
    }

    fn slot_mut(&mut self, priority: Priority) -> &mut u64 {
        match priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(id: i64, priority: Priority) -> Ticket {
        Ticket {
            id,
            name: format!("ticket {}", id),
            client: "Acme".to_string(),
            points: 1,
            problem: "broken".to_string(),
            priority,
        }
    }

    #[test]
    fn from_tickets_groups_by_priority() {
        let tickets = vec![
            ticket(1, Priority::High),
            ticket(2, Priority::Low),
            ticket(3, Priority::High),
        ];

        let tally = PriorityTally::from_tickets(&tickets);
        assert_eq!(
            tally,
            PriorityTally {
                high: 2,
                medium: 0,
                low: 1
            }
        );
    }
}
