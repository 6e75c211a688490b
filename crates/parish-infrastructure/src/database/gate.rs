//! Admission control in front of a connection pool
//!
//! A gate hands out at most `max_connections` permits. When none is free a
//! caller either fails immediately (queue limit zero, or the queue is full)
//! or waits in FIFO order until a permit is returned or its deadline passes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::time::Instant;
use tracing::warn;

use parish_core::DomainError;

use super::connection::PoolLimits;

pub struct ConnectionGate {
    database: Arc<str>,
    permits: Arc<Semaphore>,
    max_connections: usize,
    queue_limit: usize,
    waiting: AtomicUsize,
    acquire_timeout: Duration,
}

/// Decrements the waiter count on every exit path of a queued wait.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ConnectionGate {
    pub fn new(database: Arc<str>, limits: PoolLimits) -> Self {
        let max_connections = limits.max_connections as usize;
        Self {
            database,
            permits: Arc::new(Semaphore::new(max_connections)),
            max_connections,
            queue_limit: limits.queue_limit as usize,
            waiting: AtomicUsize::new(0),
            acquire_timeout: limits.acquire_timeout,
        }
    }

    /// The earlier of the caller's deadline and this gate's acquire timeout.
    pub fn deadline(&self, caller: Option<Instant>) -> Instant {
        let own = Instant::now() + self.acquire_timeout;
        caller.map_or(own, |deadline| deadline.min(own))
    }

    pub async fn admit(&self, deadline: Option<Instant>) -> Result<OwnedSemaphorePermit, DomainError> {
        match self.permits.clone().try_acquire_owned() {
            Ok(permit) => return Ok(permit),
            Err(TryAcquireError::Closed) => return Err(self.closed()),
            Err(TryAcquireError::NoPermits) => {}
        }

        if self.queue_limit == 0 {
            return Err(self.exhausted("pool saturated"));
        }

        let queued = self.waiting.fetch_add(1, Ordering::AcqRel);
        let _slot = QueueSlot(&self.waiting);
        if queued >= self.queue_limit {
            return Err(self.exhausted("acquire queue full"));
        }

        let deadline = self.deadline(deadline);
        match tokio::time::timeout_at(deadline, self.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(self.closed()),
            Err(_) => Err(self.exhausted("acquire timed out")),
        }
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.max_connections.saturating_sub(self.available())
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Wakes every waiter with `PoolClosed` and refuses new admissions.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    fn exhausted(&self, reason: &str) -> DomainError {
        warn!(
            database = %self.database,
            in_use = self.in_use(),
            limit = self.max_connections,
            waiting = self.waiting(),
            "Connection pool exhausted: {}",
            reason
        );
        DomainError::PoolExhausted {
            database: self.database.to_string(),
        }
    }

    fn closed(&self) -> DomainError {
        DomainError::PoolClosed {
            database: self.database.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(max_connections: u32, queue_limit: u32, timeout_secs: u64) -> Arc<ConnectionGate> {
        Arc::new(ConnectionGate::new(
            Arc::from("grace_chapel"),
            PoolLimits {
                max_connections,
                queue_limit,
                acquire_timeout: Duration::from_secs(timeout_secs),
            },
        ))
    }

    fn assert_elapsed(started: Instant, expected: Duration) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "expected about {:?}, got {:?}",
            expected,
            elapsed
        );
    }

    #[tokio::test]
    async fn test_borrow_and_release_restores_available() {
        let gate = gate(2, 0, 10);
        assert_eq!(gate.available(), 2);

        let permit = gate.admit(None).await.unwrap();
        assert_eq!(gate.available(), 1);
        assert_eq!(gate.in_use(), 1);

        drop(permit);
        assert_eq!(gate.available(), 2);
        assert_eq!(gate.in_use(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_saturated_without_queue_fails_fast() {
        let gate = gate(1, 0, 10);
        let _held = gate.admit(None).await.unwrap();

        let started = Instant::now();
        let err = gate.admit(None).await.unwrap_err();
        assert!(matches!(err, DomainError::PoolExhausted { .. }));
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_waiter_times_out_at_acquire_timeout() {
        let gate = gate(1, 1, 10);
        let _held = gate.admit(None).await.unwrap();

        let started = Instant::now();
        let err = gate.admit(None).await.unwrap_err();
        assert!(matches!(err, DomainError::PoolExhausted { .. }));
        assert_elapsed(started, Duration::from_secs(10));
        assert_eq!(gate.waiting(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_deadline_shortens_wait() {
        let gate = gate(1, 1, 10);
        let _held = gate.admit(None).await.unwrap();

        let started = Instant::now();
        let deadline = started + Duration::from_secs(2);
        assert!(gate.admit(Some(deadline)).await.is_err());
        assert_elapsed(started, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiter_receives_released_permit() {
        let gate = gate(1, 1, 10);
        let held = gate.admit(None).await.unwrap();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.admit(None).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(gate.waiting(), 1);

        drop(held);
        assert!(waiter.await.unwrap().is_ok());
        assert_eq!(gate.waiting(), 0);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_queue_rejects_immediately() {
        let gate = gate(1, 1, 10);
        let _held = gate.admit(None).await.unwrap();

        let _waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.admit(None).await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let started = Instant::now();
        assert!(matches!(
            gate.admit(None).await,
            Err(DomainError::PoolExhausted { .. })
        ));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(gate.waiting(), 1);
    }

    #[tokio::test]
    async fn test_closed_gate_rejects_admission() {
        let gate = gate(1, 0, 10);
        gate.close();
        assert!(gate.is_closed());
        assert!(matches!(gate.admit(None).await, Err(DomainError::PoolClosed { .. })));
    }
}
