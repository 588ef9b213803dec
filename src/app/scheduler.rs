//! PollingScheduler: runs ticks on a fixed period on one background thread.
//!
//! Ticks never overlap. Firings missed while a tick overran are skipped, not
//! queued. Stopping waits for a tick in progress to finish, since a remote
//! write cannot be interrupted safely.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use gc_mod_github::{ReconcileError, ReconcileOutcome};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Building,
    Reconciling,
}

/// Shared view of the phase the scheduler thread is in.
#[derive(Clone)]
pub struct PhaseTracker(Arc<Mutex<Phase>>);

impl Default for PhaseTracker {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Phase::Idle)))
    }
}

impl PhaseTracker {
    pub fn set(&self, phase: Phase) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = phase;
    }

    pub fn get(&self) -> Phase {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Result of one tick. Failures are contained here and never stop the timer.
#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing to report
    Clean,
    Recorded(ReconcileOutcome),
    Failed(ReconcileError),
}

pub trait TickRunner {
    fn run_tick(&mut self, phase: &PhaseTracker) -> TickOutcome;
}

/// Emit the per-tick notification.
pub fn log_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Clean => debug!("working tree clean, nothing to record"),
        TickOutcome::Recorded(o) => info!(rows = o.rows(), outcome = ?o, "activity recorded"),
        TickOutcome::Failed(ReconcileError::Conflict) => {
            warn!("activity log changed remotely during this tick, will catch up next tick")
        }
        TickOutcome::Failed(e) => warn!(error = %e, "could not record activity, will try again next tick"),
    }
}

pub struct PollingScheduler;

impl PollingScheduler {
    /// Start ticking immediately, then every `period`.
    pub fn start<T>(runner: T, period: Duration) -> SchedulerHandle
    where
        T: TickRunner + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let phase = PhaseTracker::default();
        let phase_clone = phase.clone();

        let thread = thread::spawn(move || {
            run_loop(runner, period, stop_rx, phase_clone);
        });

        SchedulerHandle { stop_tx: Some(stop_tx), thread: Some(thread), phase }
    }
}

fn run_loop<T: TickRunner>(mut runner: T, period: Duration, stop_rx: mpsc::Receiver<()>, phase: PhaseTracker) {
    let mut next = Instant::now();
    loop {
        let wait = next.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }

        let outcome = runner.run_tick(&phase);
        phase.set(Phase::Idle);
        log_outcome(&outcome);

        next += period;
        let now = Instant::now();
        if next <= now {
            let missed = u32::try_from((now - next).as_nanos() / period.as_nanos().max(1) + 1).unwrap_or(u32::MAX);
            next += period * missed;
            warn!(missed, "tick overran the polling period, skipping missed firings");
        }
    }
    debug!("scheduler loop exited");
}

pub struct SchedulerHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    phase: PhaseTracker,
}

impl SchedulerHandle {
    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Stop the timer. A tick in progress completes first. Idempotent.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
