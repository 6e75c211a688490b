//! Pool handle and connection lease

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::Serialize;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};
use tokio::sync::OwnedSemaphorePermit;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use parish_core::DomainError;

use super::connection::PoolLimits;
use super::gate::ConnectionGate;

/// Shared handle to the pool of one database. Clones refer to the same pool.
#[derive(Clone)]
pub struct PoolHandle {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    database: Arc<str>,
    pool: PgPool,
    gate: ConnectionGate,
}

/// Point-in-time occupancy of one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub database: String,
    pub max_connections: usize,
    pub in_use: usize,
    pub available: usize,
    pub waiting: usize,
    /// Physical connections currently open, idle or not.
    pub open: u32,
}

impl PoolHandle {
    pub fn new(database: &str, pool: PgPool, limits: PoolLimits) -> Self {
        let database: Arc<str> = Arc::from(database);
        Self {
            inner: Arc::new(PoolInner {
                gate: ConnectionGate::new(database.clone(), limits),
                database,
                pool,
            }),
        }
    }

    pub fn database(&self) -> &str {
        &self.inner.database
    }

    /// Borrows a connection within the pool's acquire timeout.
    pub async fn acquire(&self) -> Result<PooledConnection, DomainError> {
        self.acquire_by(None).await
    }

    /// Borrows a connection, giving up at `deadline` if that comes first.
    pub async fn acquire_by(&self, deadline: Option<Instant>) -> Result<PooledConnection, DomainError> {
        let deadline = self.inner.gate.deadline(deadline);
        let admission = self.inner.gate.admit(Some(deadline)).await?;

        // Dropping `admission` on any error below returns the slot
        let conn = match tokio::time::timeout_at(deadline, self.inner.pool.acquire()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(self.acquire_error(e)),
            Err(_) => return Err(self.timed_out()),
        };

        debug!(database = %self.inner.database, in_use = self.inner.gate.in_use(), "Connection borrowed");
        Ok(PooledConnection {
            conn,
            _admission: admission,
        })
    }

    pub fn stats(&self) -> PoolStats {
        let gate = &self.inner.gate;
        PoolStats {
            database: self.database().to_string(),
            max_connections: gate.max_connections(),
            in_use: gate.in_use(),
            available: gate.available(),
            waiting: gate.waiting(),
            open: self.inner.pool.size(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.gate.is_closed() || self.inner.pool.is_closed()
    }

    /// Refuses new borrows, then waits for borrowed connections to come back
    /// and closes every physical connection.
    pub async fn close(&self) {
        self.inner.gate.close();
        self.inner.pool.close().await;
    }

    pub fn same_pool(&self, other: &PoolHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A timeout with a slot admitted and no connection open anywhere in the
    /// pool means the server could not be reached, not that the pool is full.
    fn timed_out(&self) -> DomainError {
        let database = self.database().to_string();
        if self.inner.pool.size() == 0 {
            error!(database = %database, "No connection could be established before the acquire timeout");
            DomainError::PoolConstructionFailed {
                database,
                reason: "no connection could be established before the acquire timeout".into(),
            }
        } else {
            warn!(
                database = %database,
                in_use = self.inner.gate.in_use(),
                open = self.inner.pool.size(),
                "Timed out waiting for a database connection"
            );
            DomainError::PoolExhausted { database }
        }
    }

    fn acquire_error(&self, e: sqlx::Error) -> DomainError {
        let database = self.database().to_string();
        match e {
            sqlx::Error::PoolTimedOut => self.timed_out(),
            sqlx::Error::PoolClosed => DomainError::PoolClosed { database },
            other => {
                error!(database = %database, "Failed to open database connection: {}", other);
                DomainError::PoolConstructionFailed {
                    database,
                    reason: other.to_string(),
                }
            }
        }
    }
}

/// A borrowed connection. Dropping it returns the connection to its pool and
/// frees the admission slot, on every exit path.
#[derive(Debug)]
pub struct PooledConnection {
    // Field order matters: the connection goes back before the slot reopens
    conn: PoolConnection<Postgres>,
    _admission: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = PgConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}
