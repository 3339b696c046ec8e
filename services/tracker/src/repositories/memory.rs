//! In-process store
//!
//! Keeps every table behind one async mutex and the score in an atomic.
//! Used for local runs (`TRACKER_STORAGE=memory`) and tests.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicI64, Ordering},
};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    error::{TrackerError, TrackerResult},
    models::{CompletedTicket, NewCompletedTicket, Ticket, User},
};

use super::{CompletionArchive, ScoreLedger, TicketRepository, TicketStore, UserRepository};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    tickets: Vec<Ticket>,
    completed: Vec<CompletedTicket>,
}

/// In-memory implementation of every repository trait
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    points: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare-and-swap loop; the total is left untouched on overflow.
    fn add_points(&self, delta: i64) -> TrackerResult<i64> {
        let mut current = self.points.load(Ordering::Acquire);
        loop {
            let next = current
                .checked_add(delta)
                .ok_or_else(|| TrackerError::validation("score total would overflow"))?;

            match self.points.compare_exchange_weak(
                current,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(next),
                Err(actual) => current = actual,
            }
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> TrackerResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.contains_key(username) {
            return Err(TrackerError::DuplicateUser);
        }

        let user = User {
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        tables.users.insert(user.username.clone(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> TrackerResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(username).cloned())
    }
}

#[async_trait]
impl TicketRepository for MemoryStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> TrackerResult<()> {
        let mut tables = self.tables.lock().await;
        if tables.tickets.iter().any(|t| t.id == ticket.id) {
            return Err(TrackerError::DuplicateId(ticket.id));
        }
        tables.tickets.push(ticket.clone());
        Ok(())
    }

    async fn list_tickets(&self) -> TrackerResult<Vec<Ticket>> {
        Ok(self.tables.lock().await.tickets.clone())
    }

    async fn delete_ticket(&self, id: i64) -> TrackerResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.tickets.len();
        tables.tickets.retain(|t| t.id != id);
        Ok(tables.tickets.len() != before)
    }
}

#[async_trait]
impl CompletionArchive for MemoryStore {
    async fn insert_completed(
        &self,
        ticket: &NewCompletedTicket,
    ) -> TrackerResult<CompletedTicket> {
        let mut tables = self.tables.lock().await;
        if tables.completed.iter().any(|t| t.id == ticket.id) {
            return Err(TrackerError::DuplicateId(ticket.id));
        }

        let archived = CompletedTicket::new(ticket.clone(), Utc::now());
        tables.completed.push(archived.clone());
        Ok(archived)
    }

    async fn list_completed(&self) -> TrackerResult<Vec<CompletedTicket>> {
        Ok(self.tables.lock().await.completed.clone())
    }
}

#[async_trait]
impl ScoreLedger for MemoryStore {
    async fn increment_points(&self, delta: i64) -> TrackerResult<i64> {
        self.add_points(delta)
    }

    async fn get_points(&self) -> TrackerResult<i64> {
        Ok(self.points.load(Ordering::Acquire))
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn complete_ticket(
        &self,
        ticket: &NewCompletedTicket,
        delta: i64,
    ) -> TrackerResult<CompletedTicket> {
        let mut tables = self.tables.lock().await;

        // Every fallible step runs before the first mutation.
        if tables.completed.iter().any(|t| t.id == ticket.id) {
            return Err(TrackerError::DuplicateId(ticket.id));
        }
        let total = self.add_points(delta)?;

        let archived = CompletedTicket::new(ticket.clone(), Utc::now());
        tables.completed.push(archived.clone());
        let before = tables.tickets.len();
        tables.tickets.retain(|t| t.id != ticket.id);
        let removed = tables.tickets.len() != before;

        info!(
            ticket_id = ticket.id,
            delta, total, removed, "Ticket completed"
        );
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use std::sync::Arc;

    fn ticket(id: i64) -> Ticket {
        Ticket {
            id,
            name: "Fix login".to_string(),
            client: "Acme".to_string(),
            points: 5,
            problem: "Login page returns 500".to_string(),
            priority: Priority::High,
        }
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_points(1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_points().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn increment_overflow_leaves_total_unchanged() {
        let store = MemoryStore::new();
        store.increment_points(i64::MAX).await.unwrap();

        assert!(matches!(
            store.increment_points(1).await,
            Err(TrackerError::Validation(_))
        ));
        assert_eq!(store.get_points().await.unwrap(), i64::MAX);

        assert_eq!(store.increment_points(-10).await.unwrap(), i64::MAX - 10);
    }

    #[tokio::test]
    async fn list_tickets_keeps_insertion_order() {
        let store = MemoryStore::new();
        for id in [3, 1, 2] {
            store.insert_ticket(&ticket(id)).await.unwrap();
        }

        let ids: Vec<i64> = store
            .list_tickets()
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn complete_ticket_overflow_has_no_partial_effect() {
        let store = MemoryStore::new();
        store.insert_ticket(&ticket(1)).await.unwrap();
        store.increment_points(i64::MAX).await.unwrap();

        let archived = NewCompletedTicket::from_ticket(&ticket(1), "Patched");
        assert!(store.complete_ticket(&archived, 5).await.is_err());

        assert_eq!(store.list_tickets().await.unwrap().len(), 1);
        assert!(store.list_completed().await.unwrap().is_empty());
        assert_eq!(store.get_points().await.unwrap(), i64::MAX);
    }
}
