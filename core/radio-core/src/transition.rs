//! Worker dispatch for hardware transitions.
//!
//! Driver calls can block for a variable, user-noticeable time, so each request
//! runs on its own named thread. The tracker keeps the handle of the latest
//! request. There is no timeout and no cancellation: once issued, a request
//! runs to completion and a newer intent can only be queued behind it.

use chrono::{DateTime, Utc};
use radio_protocol::RadioKind;
use serde::Serialize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::policies::RadioPolicy;

pub struct TransitionHandle {
    radio: RadioKind,
    desired_on: bool,
    issued_at: DateTime<Utc>,
    started: Instant,
    worker: Option<JoinHandle<()>>,
}

/// Serializable view of the most recent transition request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransitionSnapshot {
    pub desired_on: bool,
    pub issued_at: String,
    pub elapsed_ms: u64,
    pub worker_finished: bool,
}

impl TransitionHandle {
    /// Runs `policy.request_state_change(desired_on)` on a new worker thread.
    pub fn spawn(policy: Arc<dyn RadioPolicy>, desired_on: bool) -> Self {
        let radio = policy.kind();
        let worker = thread::Builder::new()
            .name(format!("radio-{}-transition", radio))
            .spawn(move || policy.request_state_change(desired_on));

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(err) => {
                // The tracker stays in transition; same outcome as a driver that never answers.
                tracing::error!(
                    radio = %radio,
                    desired_on,
                    error = %err,
                    "Failed to spawn transition worker"
                );
                None
            }
        };

        Self {
            radio,
            desired_on,
            issued_at: Utc::now(),
            started: Instant::now(),
            worker,
        }
    }

    pub fn radio(&self) -> RadioKind {
        self.radio
    }

    pub fn desired_on(&self) -> bool {
        self.desired_on
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// True once the driver call has returned (or never started).
    pub fn is_finished(&self) -> bool {
        self.worker
            .as_ref()
            .map(|worker| worker.is_finished())
            .unwrap_or(true)
    }

    /// Blocks until the driver call returns.
    pub fn join(mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!(
                    radio = %self.radio,
                    desired_on = self.desired_on,
                    "Transition worker panicked"
                );
            }
        }
    }

    pub fn snapshot(&self) -> TransitionSnapshot {
        TransitionSnapshot {
            desired_on: self.desired_on,
            issued_at: self.issued_at.to_rfc3339(),
            elapsed_ms: u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX),
            worker_finished: self.is_finished(),
        }
    }
}
