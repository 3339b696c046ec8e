//! Ticket lifecycle service
//!
//! The only component that writes open tickets, the archive and the score.
//! A ticket is either open, completed or removed; the only transitions are
//! open → completed (archival) and open → removed (deletion).

use std::sync::Arc;
use tracing::info;

use crate::{
    error::TrackerResult,
    models::{CompletedTicket, NewCompletedTicket, PriorityTally, Ticket, TicketFilter},
    repositories::TicketStore,
    tally::TallyCache,
};

/// Orchestrates the ticket tables and the score ledger
#[derive(Clone)]
pub struct TicketLifecycleService {
    store: Arc<dyn TicketStore>,
    tally: TallyCache,
}

impl TicketLifecycleService {
    pub fn new(store: Arc<dyn TicketStore>, tally: TallyCache) -> Self {
        Self { store, tally }
    }

    /// Open a new ticket; `DuplicateId` if the id is already open
    pub async fn submit_ticket(&self, ticket: &Ticket) -> TrackerResult<()> {
        self.store.insert_ticket(ticket).await?;
        info!(
            ticket_id = ticket.id,
            priority = %ticket.priority,
            "Ticket submitted"
        );

        self.tally.observe(ticket.priority).await;
        Ok(())
    }

    /// Open tickets in insertion order, narrowed by `filter`
    pub async fn list_open(&self, filter: &TicketFilter) -> TrackerResult<Vec<Ticket>> {
        let mut tickets = self.store.list_tickets().await?;
        tickets.retain(|ticket| filter.matches(ticket));
        Ok(tickets)
    }

    pub async fn list_completed(&self) -> TrackerResult<Vec<CompletedTicket>> {
        self.store.list_completed().await
    }

    /// Archive a ticket, credit `points_delta` and close the open ticket in
    /// one transaction.
    pub async fn complete_ticket(
        &self,
        ticket: &NewCompletedTicket,
        points_delta: i64,
    ) -> TrackerResult<CompletedTicket> {
        self.store.complete_ticket(ticket, points_delta).await
    }

    /// Archive only. The open ticket and the score are left alone; callers
    /// that use this path issue the delete and the increment themselves.
    pub async fn archive_ticket(
        &self,
        ticket: &NewCompletedTicket,
    ) -> TrackerResult<CompletedTicket> {
        let archived = self.store.insert_completed(ticket).await?;
        info!(ticket_id = ticket.id, "Ticket archived");
        Ok(archived)
    }

    /// Delete an open ticket. Unknown ids succeed.
    pub async fn remove_ticket(&self, id: i64) -> TrackerResult<()> {
        let removed = self.store.delete_ticket(id).await?;
        info!(ticket_id = id, removed, "Ticket delete requested");
        Ok(())
    }

    pub async fn increment_points(&self, delta: i64) -> TrackerResult<i64> {
        let total = self.store.increment_points(delta).await?;
        info!(delta, total, "Points updated");
        Ok(total)
    }

    pub async fn get_points(&self) -> TrackerResult<i64> {
        self.store.get_points().await
    }

    /// Exact per-priority counts of the open tickets
    pub async fn priority_tally(&self) -> TrackerResult<PriorityTally> {
        let tickets = self.store.list_tickets().await?;
        Ok(PriorityTally::from_tickets(&tickets))
    }

    /// The monotonic display counters
    pub async fn cached_priority_tally(&self) -> PriorityTally {
        self.tally.snapshot().await
    }
}
