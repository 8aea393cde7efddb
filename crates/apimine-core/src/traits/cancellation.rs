//! Cooperative cancellation token and checkpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::Interrupt;

/// Cooperative cancellation flag.
///
/// Used by long-running operations (clustering, elimination, search) to
/// check whether a stop has been requested.
pub trait Cancellable {
    /// Check if cancellation has been requested.
    fn is_cancelled(&self) -> bool;

    /// Request cancellation.
    fn cancel(&self);
}

/// Default implementation of a cancellation token wrapping an `AtomicBool`.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new cancellation token (not cancelled).
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellable for CancellationToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// The place long loops poll to find out whether they should stop.
///
/// A checkpoint combines the run-wide cancellation token with the
/// interruption tokens and deadline of every enclosing unit of work.
/// Cancellation wins over interruption when both are set.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    cancel: CancellationToken,
    interrupts: Vec<CancellationToken>,
    deadline: Option<Instant>,
}

impl Checkpoint {
    /// A checkpoint bound to the given run-wide cancellation token.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            interrupts: vec![CancellationToken::new()],
            deadline: None,
        }
    }

    /// A checkpoint that never fires unless someone calls `cancel` or
    /// `interrupt` on it.
    pub fn unbounded() -> Self {
        Self::new(CancellationToken::new())
    }

    /// A nested unit of work: shares the run-wide token and every enclosing
    /// interruption token, adds its own, and tightens the deadline.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let mut interrupts = self.interrupts.clone();
        interrupts.push(CancellationToken::new());
        let own_deadline = timeout.map(|t| Instant::now() + t);
        let deadline = match (self.deadline, own_deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            cancel: self.cancel.clone(),
            interrupts,
            deadline,
        }
    }

    /// Request a global stop of the whole run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Abandon this unit of work (and every child created from it).
    pub fn interrupt(&self) {
        if let Some(own) = self.interrupts.last() {
            own.cancel();
        }
    }

    /// The run-wide cancellation token.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The effective deadline of this unit, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Poll the checkpoint.
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.cancel.is_cancelled() {
            return Err(Interrupt::Cancelled);
        }
        if self.interrupts.iter().any(|t| t.is_cancelled()) {
            return Err(Interrupt::Interrupted);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Interrupt::Interrupted);
            }
        }
        Ok(())
    }

    /// Poll only every `stride`-th call; `counter` is caller-owned.
    pub fn check_every(&self, counter: &mut usize, stride: usize) -> Result<(), Interrupt> {
        *counter += 1;
        if *counter % stride.max(1) == 0 {
            self.check()
        } else {
            Ok(())
        }
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_checkpoint_passes() {
        let cp = Checkpoint::unbounded();
        assert_eq!(cp.check(), Ok(()));
    }

    #[test]
    fn test_cancel_wins_over_interrupt() {
        let cp = Checkpoint::unbounded();
        cp.interrupt();
        assert_eq!(cp.check(), Err(Interrupt::Interrupted));
        cp.cancel();
        assert_eq!(cp.check(), Err(Interrupt::Cancelled));
    }

    #[test]
    fn test_child_sees_parent_interrupt_but_not_reverse() {
        let parent = Checkpoint::unbounded();
        let child = parent.child(None);
        child.interrupt();
        assert_eq!(child.check(), Err(Interrupt::Interrupted));
        assert_eq!(parent.check(), Ok(()));

        let other = parent.child(None);
        parent.interrupt();
        assert_eq!(other.check(), Err(Interrupt::Interrupted));
    }

    #[test]
    fn test_zero_timeout_interrupts() {
        let cp = Checkpoint::unbounded().child(Some(Duration::ZERO));
        assert_eq!(cp.check(), Err(Interrupt::Interrupted));
    }

    #[test]
    fn test_check_every_only_polls_on_stride() {
        let cp = Checkpoint::unbounded();
        cp.interrupt();
        let mut counter = 0;
        assert!(cp.check_every(&mut counter, 3).is_ok());
        assert!(cp.check_every(&mut counter, 3).is_ok());
        assert!(cp.check_every(&mut counter, 3).is_err());
    }
}
