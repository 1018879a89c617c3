use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A one-way stop flag shared between the control loop and whoever may ask it to
/// stop (a UI button, a signal handler).
///
/// Clones share the same flag. The loop only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
