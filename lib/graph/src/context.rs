use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An error produced by a cancelled or expired [`QueryContext`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query cancelled")]
    Cancelled,
    #[error("query deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation scope for a driven iterator tree.
///
/// Every advance boundary of the algebra checks [`QueryContext::done`] before
/// touching the store, so a cancelled or expired context terminates a
/// traversal within a bounded number of store calls. Cloning is cheap; clones
/// share the cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    cancel: Option<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

impl QueryContext {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        QueryContext::default()
    }

    /// A context with an explicit cancellation handle.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = QueryContext {
            cancel: Some(flag.clone()),
            deadline: None,
        };
        (ctx, CancelHandle(flag))
    }

    /// Returns a copy of this context that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        QueryContext {
            cancel: self.cancel.clone(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// Reports why the context is done, if it is.
    pub fn done(&self) -> Option<QueryError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Some(QueryError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Some(QueryError::DeadlineExceeded);
            }
        }
        None
    }

    pub fn is_done(&self) -> bool {
        self.done().is_some()
    }
}

/// Cancels the [`QueryContext`] it was created with.
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}
