// LogPane - core/cancel.rs
//
// Cooperative cancellation for a single load.
//
// The token is a shared flag plus an optional deadline armed when the load
// starts. Readers poll `is_cancelled()` at line boundaries; once the deadline
// passes the flag latches so every clone agrees from then on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
    budget: Option<Duration>,
}

impl CancelToken {
    /// A token that only fires when `cancel()` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also fires once `budget` has elapsed from now.
    pub fn with_deadline(budget: Duration) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(budget),
            budget: Some(budget),
        }
    }

    /// Request cancellation from any thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.flag.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    /// The armed budget, if any.
    pub fn budget(&self) -> Option<Duration> {
        self.budget
    }
}
