use std::time::Duration;

use store::LockOptions;

/// Tuning for the booking saga and payment controller.
#[derive(Debug, Clone, Copy)]
pub struct SagaOptions {
    /// Budget for one supplier booking or cancellation call.
    pub supplier_timeout: Duration,
    /// Entity lock timing for booking and payment rows.
    pub lock: LockOptions,
}

impl Default for SagaOptions {
    fn default() -> Self {
        Self {
            supplier_timeout: Duration::from_millis(5000),
            lock: LockOptions::default(),
        }
    }
}
