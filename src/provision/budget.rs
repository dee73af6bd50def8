use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// The wall-clock budget of one invocation, with a safety margin reserved at its tail for
/// checkpointing and scheduling the next invocation.
#[derive(Debug, Clone, Copy)]
pub struct InvocationBudget {
    deadline: Instant,
    safety_margin: Duration,
}

impl InvocationBudget {
    pub fn new(deadline: Instant, safety_margin: Duration) -> Self {
        Self {
            deadline,
            safety_margin,
        }
    }

    /// Build a budget from a deadline in milliseconds since the Unix epoch, as found in the
    /// Lambda invocation context.
    #[must_use]
    pub fn from_epoch_millis(deadline_ms: u64, safety_margin: Duration) -> Self {
        let deadline = UNIX_EPOCH + Duration::from_millis(deadline_ms);
        let remaining = deadline
            .duration_since(SystemTime::now())
            .unwrap_or_default();
        Self::new(Instant::now() + remaining, safety_margin)
    }

    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// True once only the safety margin is left.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.remaining() <= self.safety_margin
    }

    /// True if waiting `wait` still leaves more than the safety margin.
    #[must_use]
    pub fn allows_wait(&self, wait: Duration) -> bool {
        self.remaining() > wait + self.safety_margin
    }
}
