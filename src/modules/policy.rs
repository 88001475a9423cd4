use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::args::DEFAULT_MAX_CONSECUTIVE_FAILURES;
use crate::error::{AppError, AppResult, ExportError};

/// How a module reacts to failed calls against an external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Consecutive failures tolerated; one more aborts the run.
    pub max_consecutive_failures: u32,
    /// Pause after every failed call.
    pub backoff: Duration,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Consecutive failure streak shared by all workers of one module.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    module: &'static str,
    policy: FailurePolicy,
    streak: Arc<AtomicU32>,
}

impl FailureTracker {
    #[must_use]
    pub fn new(module: &'static str, policy: FailurePolicy) -> Self {
        Self {
            module,
            policy,
            streak: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn record_success(&self) {
        self.streak.store(0, Ordering::Release);
    }

    /// Records a failed call, backs off, and errors once the streak passes the threshold.
    ///
    /// # Errors
    ///
    /// Returns `TooManyFailures` when the streak exceeds the policy limit.
    pub async fn record_failure(&self) -> AppResult<()> {
        let previous = self.streak.fetch_add(1, Ordering::AcqRel);
        let failures = previous.saturating_add(1);
        if failures > self.policy.max_consecutive_failures {
            error!(
                critical = true,
                "{} failed {} times in a row; aborting",
                self.module,
                failures
            );
            return Err(AppError::export(ExportError::TooManyFailures {
                module: self.module,
                failures,
            }));
        }
        warn!(
            "{} call failed ({} consecutive); backing off {:?}",
            self.module, failures, self.policy.backoff
        );
        if !self.policy.backoff.is_zero() {
            sleep(self.policy.backoff).await;
        }
        Ok(())
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.streak.load(Ordering::Acquire)
    }
}
