//! Tracker service models

pub mod requests;
pub mod tally;
pub mod ticket;
pub mod user;

// Re-export for convenience
pub use tally::PriorityTally;
pub use ticket::{CompletedTicket, NewCompletedTicket, Priority, Ticket, TicketFilter};
pub use user::{Credentials, LoginOutcome, User};
