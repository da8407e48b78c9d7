//! Progress notification port
//!
//! Defines how a run reports progress to observers. The coordinator never
//! exposes mutable state; observers receive immutable [`ProgressEvent`]
//! values and project their own state keyed by worker id.

use panel_domain::{ProgressEvent, RunPhase};
use tokio::sync::mpsc;

/// Callback for progress updates during a panel run.
///
/// Implementations can display progress however they like (console, UI,
/// persistence); the streaming callbacks default to no-ops for consumers
/// that only care about phase transitions.
pub trait ProgressNotifier: Send + Sync {
    /// Called on every state-machine transition.
    fn on_phase_change(&self, phase: RunPhase);

    /// Called when a worker call settles, successfully or not.
    fn on_worker_settled(&self, worker_id: &str, success: bool);

    /// Called when a worker's call is dispatched.
    fn on_worker_started(&self, _worker_id: &str) {}

    /// Called for each text delta from a streaming worker.
    fn on_worker_delta(&self, _worker_id: &str, _delta: &str) {}

    /// Called whenever the running worker-cost total changes.
    fn on_cost_update(&self, _workers_usd: f64) {}

    /// Called when synthesis is served from cache at zero cost.
    fn on_cache_hit(&self, _fingerprint: &str) {}

    /// Called for each text delta from the streaming synthesizer.
    fn on_synthesis_delta(&self, _delta: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed.
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_change(&self, _phase: RunPhase) {}
    fn on_worker_settled(&self, _worker_id: &str, _success: bool) {}
}

/// Notifier that forwards immutable [`ProgressEvent`] values into a channel.
///
/// Delivery is guaranteed while the receiver lives: a slow subscriber must
/// never miss the terminal phase transition, so the channel is unbounded.
/// Worker deltas are already rate-limited upstream by the coordinator's
/// bounded delta channel. Sends after the receiver is dropped are ignored.
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelNotifier {
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }

    /// Create a notifier together with its subscriber end.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressNotifier for ChannelNotifier {
    fn on_phase_change(&self, phase: RunPhase) {
        self.emit(ProgressEvent::PhaseChanged { phase });
    }

    fn on_worker_settled(&self, worker_id: &str, success: bool) {
        self.emit(ProgressEvent::WorkerSettled {
            worker_id: worker_id.to_string(),
            success,
        });
    }

    fn on_worker_started(&self, worker_id: &str) {
        self.emit(ProgressEvent::WorkerStarted {
            worker_id: worker_id.to_string(),
        });
    }

    fn on_worker_delta(&self, worker_id: &str, delta: &str) {
        self.emit(ProgressEvent::WorkerDelta {
            worker_id: worker_id.to_string(),
            delta: delta.to_string(),
        });
    }

    fn on_cost_update(&self, workers_usd: f64) {
        self.emit(ProgressEvent::CostUpdated { workers_usd });
    }

    fn on_cache_hit(&self, fingerprint: &str) {
        self.emit(ProgressEvent::CacheHit {
            fingerprint: fingerprint.to_string(),
        });
    }

    fn on_synthesis_delta(&self, delta: &str) {
        self.emit(ProgressEvent::SynthesisDelta {
            delta: delta.to_string(),
        });
    }
}
