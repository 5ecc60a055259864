// crates/fieldgate-core/src/runtime/context.rs
// ============================================================================
// Module: Fieldgate Evaluation Context
// Description: Cooperative cancellation and deadline signal for evaluation.
// Purpose: Let callers bound or abort in-flight validation runs.
// Dependencies: crate::core::error, tokio
// ============================================================================

//! ## Overview
//! An [`EvalContext`] carries an optional deadline and a cancellation signal
//! shared by every task of one validation run. Tasks check it at start and
//! before every output write; the evaluator's aggregation loop watches it to
//! stop intake while still draining in-flight tasks. The terminal error kind
//! distinguishes a deadline expiry from a manual cancellation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tokio::time::sleep_until;

use crate::core::error::ErrorKind;

// ============================================================================
// SECTION: Cancellation Handle
// ============================================================================

/// Caller-side handle that cancels an evaluation context.
#[derive(Debug, Clone)]
pub struct EvalHandle {
    /// Cancellation broadcast sender.
    sender: Arc<watch::Sender<bool>>,
}

impl EvalHandle {
    /// Signals cancellation to every task observing the paired context.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

// ============================================================================
// SECTION: Evaluation Context
// ============================================================================

/// Cancellable, deadline-bearing execution context for one validation run.
///
/// # Invariants
/// - Clones observe the same cancellation signal.
/// - Once cancelled or expired, the context never reverts.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// Cancellation broadcast receiver.
    cancel: watch::Receiver<bool>,
    /// Optional absolute deadline.
    deadline: Option<Instant>,
}

impl EvalContext {
    /// Creates a context that is never cancelled and has no deadline.
    #[must_use]
    pub fn unbounded() -> Self {
        let (_sender, cancel) = watch::channel(false);
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Creates a context with a caller-held cancellation handle.
    #[must_use]
    pub fn cancellable() -> (Self, EvalHandle) {
        let (sender, cancel) = watch::channel(false);
        (
            Self {
                cancel,
                deadline: None,
            },
            EvalHandle {
                sender: Arc::new(sender),
            },
        )
    }

    /// Creates a context that expires after the provided duration.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let mut ctx = Self::unbounded();
        ctx.deadline = Some(Instant::now() + timeout);
        ctx
    }

    /// Creates a context that expires at the provided instant.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        let mut ctx = Self::unbounded();
        ctx.deadline = Some(deadline);
        ctx
    }

    /// Attaches a deadline to an existing context.
    #[must_use]
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns true once the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if *self.cancel.borrow() {
            return true;
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves when the context is cancelled or its deadline passes.
    ///
    /// Pends forever for an unbounded, uncancelled context.
    pub async fn cancelled(&self) {
        let deadline = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };
        let signal = async {
            let mut receiver = self.cancel.clone();
            loop {
                if *receiver.borrow_and_update() {
                    return;
                }
                if receiver.changed().await.is_err() {
                    // Sender dropped without cancelling; nothing left to observe.
                    pending::<()>().await;
                }
            }
        };
        tokio::select! {
            () = deadline => {},
            () = signal => {},
        }
    }

    /// Returns the terminal error kind for a cancelled run.
    #[must_use]
    pub fn terminal_kind(&self) -> ErrorKind {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            ErrorKind::Timeout
        } else {
            ErrorKind::Cancelled
        }
    }
}
