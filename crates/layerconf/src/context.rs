use crate::error::LoadError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cancellation and deadline signal for one resolution pass.
///
/// Clones share the cancellation flag, so a clone handed to another thread can stop a running
/// [`load`](crate::load). The resolver checks the context before every field and every backend
/// lookup; fields written before cancellation keep their new values.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Sets a deadline. An earlier deadline already present is kept.
    #[must_use = "The context must be passed to the resolver to take effect"]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// Sets a deadline `timeout` from now.
    #[must_use = "The context must be passed to the resolver to take effect"]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// # Errors
    /// Returns [`LoadError::Canceled`] once the context is cancelled or its deadline has passed.
    pub fn check(&self) -> Result<(), LoadError> {
        if self.is_cancelled() {
            return Err(LoadError::Canceled { reason: "context canceled".into(), context: None });
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(LoadError::Canceled { reason: "deadline exceeded".into(), context: None });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_context_never_fires() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_reaches_clones() {
        let ctx = Context::background();
        let clone = ctx.clone();
        clone.cancel();

        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(LoadError::Canceled { .. })));
    }

    #[test]
    fn elapsed_deadline_fires() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert!(matches!(ctx.check(), Err(LoadError::Canceled { .. })));
    }

    #[test]
    fn earlier_deadline_wins() {
        let soon = Instant::now() + Duration::from_secs(1);
        let ctx = Context::background().with_deadline(soon).with_timeout(Duration::from_secs(3_600));
        assert_eq!(ctx.deadline(), Some(soon));
    }
}
