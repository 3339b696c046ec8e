//! PostgreSQL repositories

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};
use tracing::info;

use crate::{
    error::{TrackerError, TrackerResult},
    models::{CompletedTicket, NewCompletedTicket, Priority, Ticket, User},
};

use super::{CompletionArchive, ScoreLedger, TicketRepository, TicketStore, UserRepository};

/// Schema migrations shipped with the service
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// PostgreSQL-backed store for users, tickets, archive and score
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store on top of a connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map an insert failure, turning a unique violation into `duplicate`
fn map_write_error(err: sqlx::Error, duplicate: TrackerError) -> TrackerError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return duplicate;
        }
        if db.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
            return TrackerError::validation("score total would overflow");
        }
    }
    TrackerError::from(err)
}

fn ticket_from_row(row: &PgRow) -> TrackerResult<Ticket> {
    let priority: String = row.try_get("priority")?;
    let priority = priority
        .parse::<Priority>()
        .map_err(|e| TrackerError::Storage(format!("corrupt priority column: {}", e)))?;

    Ok(Ticket {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        client: row.try_get("client")?,
        points: row.try_get("points")?,
        problem: row.try_get("problem")?,
        priority,
    })
}

fn completed_from_row(row: &PgRow) -> TrackerResult<CompletedTicket> {
    Ok(CompletedTicket {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        client: row.try_get("client")?,
        points: row.try_get("points")?,
        problem: row.try_get("problem")?,
        solution: row.try_get("solution")?,
        completed_at: row.try_get("completed_at")?,
    })
}

async fn insert_completed_with<'e, E>(
    executor: E,
    ticket: &NewCompletedTicket,
) -> TrackerResult<CompletedTicket>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO complete (id, name, client, points, problem, solution)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, client, points, problem, solution, completed_at
        "#,
    )
    .bind(ticket.id)
    .bind(&ticket.name)
    .bind(&ticket.client)
    .bind(ticket.points)
    .bind(&ticket.problem)
    .bind(&ticket.solution)
    .fetch_one(executor)
    .await
    .map_err(|e| map_write_error(e, TrackerError::DuplicateId(ticket.id)))?;

    completed_from_row(&row)
}

/// `point + delta` is evaluated by the server in one statement, so racing
/// increments serialize on the row lock instead of losing updates.
async fn increment_points_with<'e, E>(executor: E, delta: i64) -> TrackerResult<i64>
where
    E: PgExecutor<'e>,
{
    let total: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO points (id, point)
        VALUES (1, $1)
        ON CONFLICT (id) DO UPDATE SET point = points.point + EXCLUDED.point
        RETURNING point
        "#,
    )
    .bind(delta)
    .fetch_one(executor)
    .await
    .map_err(|e| map_write_error(e, TrackerError::Storage("points row conflict".to_string())))?;

    Ok(total)
}

async fn delete_ticket_with<'e, E>(executor: E, id: i64) -> TrackerResult<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, username: &str, password_hash: &str) -> TrackerResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, TrackerError::DuplicateUser))?;

        Ok(User {
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
        })
    }

    async fn find_user(&self, username: &str) -> TrackerResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT username, password_hash
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(User {
                username: row.try_get("username")?,
                password_hash: row.try_get("password_hash")?,
            })),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TicketRepository for PgStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> TrackerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tickets (id, name, client, points, problem, priority)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ticket.id)
        .bind(&ticket.name)
        .bind(&ticket.client)
        .bind(ticket.points)
        .bind(&ticket.problem)
        .bind(ticket.priority.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, TrackerError::DuplicateId(ticket.id)))?;

        Ok(())
    }

    async fn list_tickets(&self) -> TrackerResult<Vec<Ticket>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, client, points, problem, priority
            FROM tickets
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(ticket_from_row).collect()
    }

    async fn delete_ticket(&self, id: i64) -> TrackerResult<bool> {
        delete_ticket_with(&self.pool, id).await
    }
}

#[async_trait]
impl CompletionArchive for PgStore {
    async fn insert_completed(
        &self,
        ticket: &NewCompletedTicket,
    ) -> TrackerResult<CompletedTicket> {
        insert_completed_with(&self.pool, ticket).await
    }

    async fn list_completed(&self) -> TrackerResult<Vec<CompletedTicket>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, client, points, problem, solution, completed_at
            FROM complete
            ORDER BY completed_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(completed_from_row).collect()
    }
}

#[async_trait]
impl ScoreLedger for PgStore {
    async fn increment_points(&self, delta: i64) -> TrackerResult<i64> {
        increment_points_with(&self.pool, delta).await
    }

    async fn get_points(&self) -> TrackerResult<i64> {
        let total: Option<i64> = sqlx::query_scalar("SELECT point FROM points WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(total.unwrap_or(0))
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn complete_ticket(
        &self,
        ticket: &NewCompletedTicket,
        delta: i64,
    ) -> TrackerResult<CompletedTicket> {
        // Dropping the transaction without commit rolls it back, which also
        // covers cancellation of this future.
        let mut tx = self.pool.begin().await?;

        let archived = insert_completed_with(&mut *tx, ticket).await?;
        let total = increment_points_with(&mut *tx, delta).await?;
        let removed = delete_ticket_with(&mut *tx, ticket.id).await?;

        tx.commit().await?;

        info!(
            ticket_id = ticket.id,
            delta, total, removed, "Ticket completed"
        );
        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    //! These tests need a PostgreSQL instance reachable via `DATABASE_URL`:
    //! `cargo test -p tracker -- --ignored`.
    use super::*;
    use common::database::{DatabaseConfig, init_pool, run_migrations};
    use std::sync::Arc;

    async fn store() -> PgStore {
        let config = DatabaseConfig::from_env().expect("database config");
        let pool = init_pool(&config).await.expect("database pool");
        run_migrations(&pool, &MIGRATOR).await.expect("migrations");
        sqlx::query("TRUNCATE users, tickets, complete, points")
            .execute(&pool)
            .await
            .expect("truncate");
        PgStore::new(pool)
    }

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
    #[ignore = "requires a running PostgreSQL instance"]
    #[serial_test::serial(postgres)]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(store().await);
        assert_eq!(store.get_points().await.unwrap(), 0);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_points(1).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_points().await.unwrap(), 50);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    #[serial_test::serial(postgres)]
    async fn duplicate_keys_are_reported() {
        let store = store().await;

        store.insert_ticket(&ticket(7)).await.unwrap();
        assert!(matches!(
            store.insert_ticket(&ticket(7)).await,
            Err(TrackerError::DuplicateId(7))
        ));
        assert_eq!(store.list_tickets().await.unwrap().len(), 1);

        store.insert_user("alice", "hash").await.unwrap();
        assert!(matches!(
            store.insert_user("alice", "other").await,
            Err(TrackerError::DuplicateUser)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    #[serial_test::serial(postgres)]
    async fn failed_completion_rolls_back() {
        let store = store().await;
        store.insert_ticket(&ticket(1)).await.unwrap();

        let archived = NewCompletedTicket::from_ticket(&ticket(1), "Patched");
        store.complete_ticket(&archived, 5).await.unwrap();
        assert!(store.list_tickets().await.unwrap().is_empty());
        assert_eq!(store.get_points().await.unwrap(), 5);

        // Second completion of the same id fails on the archive key; neither
        // the reopened ticket nor the score may change.
        store.insert_ticket(&ticket(1)).await.unwrap();
        assert!(matches!(
            store.complete_ticket(&archived, 5).await,
            Err(TrackerError::DuplicateId(1))
        ));
        assert_eq!(store.list_tickets().await.unwrap().len(), 1);
        assert_eq!(store.get_points().await.unwrap(), 5);
        assert_eq!(store.list_completed().await.unwrap().len(), 1);
    }
}
