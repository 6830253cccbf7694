//! Cooperative cancellation of in-flight attack runs.
//!
//! A single [`CancellationToken`] is shared by every run the
//! [`crate::runner::AttackRunner`] starts. SIGINT or SIGTERM cancels it, and
//! each run stops at its next word-position boundary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Shutdown coordinator
// ---------------------------------------------------------------------------

/// Shares one cancellation token and counts the runs still in flight.
#[derive(Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    in_flight: Arc<AtomicUsize>,
}

impl ShutdownCoordinator {
    /// Create a coordinator with no runs in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the cancellation token.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Register a run as in flight until the returned guard drops.
    #[must_use]
    pub fn track_task(&self) -> TaskGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Number of runs currently in flight.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Request cancellation of every run.
    pub fn trigger(&self) {
        self.token.cancel();
    }
}

// ---------------------------------------------------------------------------
// Task guard (RAII counter)
// ---------------------------------------------------------------------------

/// RAII guard that decrements the in-flight counter on drop.
pub struct TaskGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Signal handling
// ---------------------------------------------------------------------------

/// Resolves when SIGINT or SIGTERM arrives (Ctrl-C only off Unix), or when
/// the token is cancelled elsewhere, then cancels every run.
pub async fn shutdown_signal(coordinator: ShutdownCoordinator) {
    let token = coordinator.token();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Shutdown signal received (SIGTERM)"),
                    _ = sigint.recv() => info!("Shutdown signal received (SIGINT)"),
                    _ = token.cancelled() => return,
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to install signal handlers; Ctrl-C will not cancel runs");
                token.cancelled().await;
                return;
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Shutdown signal received (Ctrl-C)"),
            _ = token.cancelled() => return,
        }
    }

    warn!(
        in_flight = coordinator.in_flight_count(),
        "Cancelling in-flight attacks at their next word boundary"
    );
    coordinator.trigger();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
