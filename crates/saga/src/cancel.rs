//! Caller abandonment signalling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag telling a saga run that its caller went away.
///
/// The orchestrator only consults it before steps that have not committed
/// any downstream state (see [`SagaStep::is_abandonable`]).
///
/// [`SagaStep::is_abandonable`]: crate::state::SagaStep::is_abandonable
#[derive(Debug, Clone, Default)]
pub struct AbandonSignal(Arc<AtomicBool>);

impl AbandonSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the run as abandoned.
    pub fn abandon(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_abandoned(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns a guard that abandons the run when dropped, unless disarmed.
    pub fn guard(&self) -> AbandonGuard {
        AbandonGuard {
            signal: Some(self.clone()),
        }
    }
}

/// Drop guard held by the request handler for the lifetime of the request.
#[derive(Debug)]
#[must_use = "dropping the guard immediately abandons the saga"]
pub struct AbandonGuard {
    signal: Option<AbandonSignal>,
}

impl AbandonGuard {
    /// Releases the guard without abandoning the run.
    pub fn disarm(mut self) {
        self.signal = None;
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.take() {
            tracing::debug!("request dropped before saga finished");
            signal.abandon();
        }
    }
}
