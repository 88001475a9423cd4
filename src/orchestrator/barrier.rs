use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// Counting barrier shared by the workers of a phase.
///
/// Every worker holds a [`PhaseTicket`]; [`PhaseBarrier::wait`] resolves once
/// all outstanding tickets have signaled.
#[derive(Debug, Clone, Default)]
pub struct PhaseBarrier {
    inner: Arc<BarrierState>,
}

#[derive(Debug, Default)]
struct BarrierState {
    pending: AtomicUsize,
    signaled: AtomicUsize,
    notify: Notify,
}

impl PhaseBarrier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more worker in the current phase.
    #[must_use]
    pub fn ticket(&self) -> PhaseTicket {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);
        PhaseTicket {
            barrier: Some(self.clone()),
        }
    }

    /// Workers registered but not yet signaled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Total completion signals fired over the barrier's lifetime.
    #[must_use]
    pub fn signaled(&self) -> usize {
        self.inner.signaled.load(Ordering::Acquire)
    }

    /// Waits until no registered worker is outstanding.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn signal(&self) {
        self.inner.signaled.fetch_add(1, Ordering::AcqRel);
        if self.inner.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }
}

/// Completion handle for one worker. Signals on [`PhaseTicket::done`] or on drop.
#[derive(Debug)]
pub struct PhaseTicket {
    barrier: Option<PhaseBarrier>,
}

impl PhaseTicket {
    pub fn done(mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.signal();
        }
    }
}

impl Drop for PhaseTicket {
    fn drop(&mut self) {
        if let Some(barrier) = self.barrier.take() {
            barrier.signal();
        }
    }
}
