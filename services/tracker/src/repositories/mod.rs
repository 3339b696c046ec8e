//! Repositories for the tracker tables
//!
//! Each table family sits behind a trait so the service can run against
//! PostgreSQL or the in-process store. Implementations must resolve
//! duplicate-key races themselves: one writer wins, the other gets
//! `DuplicateUser` / `DuplicateId`.

use async_trait::async_trait;

use crate::{
    error::TrackerResult,
    models::{CompletedTicket, NewCompletedTicket, Ticket, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Credential records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; `DuplicateUser` if the username is taken
    async fn insert_user(&self, username: &str, password_hash: &str) -> TrackerResult<User>;

    /// Find a user by exact (case-sensitive) username
    async fn find_user(&self, username: &str) -> TrackerResult<Option<User>>;
}

/// Open tickets
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Insert an open ticket; `DuplicateId` if the id is already open
    async fn insert_ticket(&self, ticket: &Ticket) -> TrackerResult<()>;

    /// All open tickets in insertion order
    async fn list_tickets(&self) -> TrackerResult<Vec<Ticket>>;

    /// Remove an open ticket. Returns whether a row was removed; a missing id
    /// is not an error.
    async fn delete_ticket(&self, id: i64) -> TrackerResult<bool>;
}

/// Archived tickets
#[async_trait]
pub trait CompletionArchive: Send + Sync {
    /// Archive a ticket; `DuplicateId` if the id is already archived
    async fn insert_completed(&self, ticket: &NewCompletedTicket)
    -> TrackerResult<CompletedTicket>;

    /// All archived tickets in archival order
    async fn list_completed(&self) -> TrackerResult<Vec<CompletedTicket>>;
}

/// The shared point total
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Atomically add `delta` and return the new total
    async fn increment_points(&self, delta: i64) -> TrackerResult<i64>;

    /// Current total, `0` if never initialised
    async fn get_points(&self) -> TrackerResult<i64>;
}

/// Everything the lifecycle service writes, plus the one cross-table
/// operation.
#[async_trait]
pub trait TicketStore: TicketRepository + CompletionArchive + ScoreLedger {
    /// Archive `ticket`, add `delta` to the score and drop the open ticket
    /// with the same id, all or nothing.
    async fn complete_ticket(
        &self,
        ticket: &NewCompletedTicket,
        delta: i64,
    ) -> TrackerResult<CompletedTicket>;
}
