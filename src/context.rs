// Cancellable operation context

use crate::error::{Result, StoreError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Per-call cancellation scope passed to every store operation.
///
/// Clones share one token. Derived contexts get a child token: cancelling
/// the parent ends them, cancelling them leaves the parent live. A deadline,
/// when set, ends the context once it passes.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that never ends on its own
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that also ends after `timeout`
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that also ends at `deadline`; an earlier existing
    /// deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why this context has ended, if it has
    pub fn err(&self) -> Option<StoreError> {
        if self.is_cancelled() {
            return Some(StoreError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(StoreError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<()> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_live() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        ctx.cancel();

        assert!(matches!(clone.check(), Err(StoreError::Cancelled)));
    }

    #[test]
    fn test_parent_cancel_reaches_child() {
        let parent = Context::background();
        let child = parent.with_timeout(Duration::from_secs(60));
        parent.cancel();

        assert!(child.is_cancelled());
        assert!(matches!(child.check(), Err(StoreError::Cancelled)));
    }

    #[test]
    fn test_child_cancel_leaves_parent_live() {
        let parent = Context::background();
        let child = parent.with_timeout(Duration::from_secs(60));
        child.cancel();

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
        assert!(parent.check().is_ok());
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = Context::background().with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(ctx.check(), Err(StoreError::DeadlineExceeded)));
    }

    #[test]
    fn test_with_deadline_keeps_earlier() {
        let now = Instant::now();
        let early = now + Duration::from_secs(1);
        let late = now + Duration::from_secs(10);

        let ctx = Context::background().with_deadline(early).with_deadline(late);
        assert_eq!(ctx.deadline(), Some(early));
    }
}
