// crates/fieldgate-core/src/runtime/counter.rs
// ============================================================================
// Module: Fieldgate Synchronization Counters
// Description: Per-field outstanding-task counters with zero wakeups.
// Purpose: Let conditional evaluations block until prerequisites resolve.
// Dependencies: tokio, thiserror, std
// ============================================================================

//! ## Overview
//! Each field with at least one bound rule gets a [`FieldCounter`]. The
//! evaluator pre-increments the counter once per task before any task runs,
//! and every task decrements exactly once when it finishes; dependent gates
//! wait until the counter reaches zero. `clear` force-resets a counter for
//! fields that are absent from the input so no dependent blocks forever.
//!
//! A counter lives for one top-level validation call and is discarded after.
//! A decrement below zero is a programming error, surfaced as
//! [`CounterError::Underflow`] and mapped to an internal-invariant
//! validation error by the evaluator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::pin::pin;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::MutexGuard;
use tokio::sync::Notify;

// ============================================================================
// SECTION: Counter Errors
// ============================================================================

/// Errors raised by synchronization counters.
///
/// # Invariants
/// - Variants indicate programming errors, never bad input data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CounterError {
    /// Counter state mutex was poisoned by a panicked task.
    #[error("field counter mutex poisoned")]
    Poisoned,
    /// Counter was decremented below zero.
    #[error("field counter underflow (count {count})")]
    Underflow {
        /// Count observed after the offending decrement.
        count: i64,
    },
}

// ============================================================================
// SECTION: Field Counter
// ============================================================================

/// Outstanding-task counter for one field.
///
/// # Invariants
/// - The count never goes negative; reaching a negative count is fatal.
/// - Waiters are woken exactly when the count reaches zero.
#[derive(Debug, Default)]
pub struct FieldCounter {
    /// Outstanding task count.
    count: Mutex<i64>,
    /// Wakeup for waiters observing the count reach zero.
    zero: Notify,
    /// Serializes tasks bound to the same field.
    task_lock: AsyncMutex<()>,
}

impl FieldCounter {
    /// Creates a counter with no outstanding tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `n` tasks about to run for this field.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Poisoned`] when the state mutex is poisoned.
    pub fn add(&self, n: usize) -> Result<(), CounterError> {
        let mut count = self.count.lock().map_err(|_| CounterError::Poisoned)?;
        *count = count.saturating_add(i64::try_from(n).unwrap_or(i64::MAX));
        Ok(())
    }

    /// Acquires the per-field task lock, serializing same-field tasks.
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.task_lock.lock().await
    }

    /// Records one task as finished, waking waiters at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Underflow`] when the count drops below zero
    /// and [`CounterError::Poisoned`] when the state mutex is poisoned.
    pub fn release(&self) -> Result<(), CounterError> {
        let mut count = self.count.lock().map_err(|_| CounterError::Poisoned)?;
        *count -= 1;
        if *count < 0 {
            return Err(CounterError::Underflow {
                count: *count,
            });
        }
        if *count == 0 {
            self.zero.notify_waiters();
        }
        Ok(())
    }

    /// Blocks until the count reaches zero.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Poisoned`] when the state mutex is poisoned.
    pub async fn wait(&self) -> Result<(), CounterError> {
        loop {
            let mut notified = pin!(self.zero.notified());
            notified.as_mut().enable();
            {
                let count = self.count.lock().map_err(|_| CounterError::Poisoned)?;
                if *count == 0 {
                    return Ok(());
                }
            }
            notified.await;
        }
    }

    /// Force-resets the count to zero and wakes all waiters.
    ///
    /// Used when a field is absent from the input so no task will ever run
    /// for it; without this, dependent conditionals would wait forever.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Poisoned`] when the state mutex is poisoned.
    pub fn clear(&self) -> Result<(), CounterError> {
        let mut count = self.count.lock().map_err(|_| CounterError::Poisoned)?;
        *count = 0;
        self.zero.notify_waiters();
        Ok(())
    }

    /// Returns the current outstanding count.
    ///
    /// # Errors
    ///
    /// Returns [`CounterError::Poisoned`] when the state mutex is poisoned.
    pub fn current(&self) -> Result<i64, CounterError> {
        Ok(*self.count.lock().map_err(|_| CounterError::Poisoned)?)
    }
}

// ============================================================================
// SECTION: Counter Set
// ============================================================================

/// Counters for every field bound in one validation run.
#[derive(Debug, Default)]
pub struct CounterSet {
    /// Counters keyed by field name.
    counters: BTreeMap<String, Arc<FieldCounter>>,
}

impl CounterSet {
    /// Allocates one counter per provided field name.
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            counters: keys
                .into_iter()
                .map(|key| (key.into(), Arc::new(FieldCounter::new())))
                .collect(),
        }
    }

    /// Returns the counter for a field, if the field has bound rules.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<FieldCounter>> {
        self.counters.get(key).map(Arc::clone)
    }
}
