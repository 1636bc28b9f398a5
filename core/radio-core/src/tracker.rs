//! Radio state reconciliation engine.
//!
//! Tracks reality versus the user's intent for one radio. Reality moves slowly
//! (drivers take a variable time to switch a radio on or off) compared to the
//! user's expectations, so a toggle that arrives mid-transition is remembered
//! and replayed once the in-flight transition settles, unless the radio already
//! landed where the user wanted it.
//!
//! # Bookkeeping
//!
//! | observation  | `actual` | `in_transition` |
//! |--------------|----------|-----------------|
//! | `Disabled`   | false    | false           |
//! | `Enabled`    | true     | false           |
//! | `TurningOn`  | false    | true            |
//! | `TurningOff` | true     | true            |
//!
//! Other observations (`Unknown`, `Unavailable`) leave the booleans untouched.
//!
//! # Limitations
//!
//! A transition whose driver never reports completion keeps the tracker in
//! transition forever; later toggles only update the deferred intent.
//! Observations must arrive in the order the hardware emitted them.

use radio_protocol::{FiveState, HardwareEvent, RadioKind, TriState};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::policies::RadioPolicy;
use crate::transition::{TransitionHandle, TransitionSnapshot};

/// Callback fired whenever the externally visible state changes.
pub type StateListener = Arc<dyn Fn(RadioKind, FiveState) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeferredOutcome {
    /// No transition completed, or nothing was deferred.
    Idle,
    /// The radio settled where the user last asked; nothing to replay.
    Discarded,
    /// The radio settled opposite to the user's last request; replay it.
    Replay(bool),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TrackerState {
    actual: Option<bool>,
    in_transition: bool,
    intended: Option<bool>,
    deferred_pending: bool,
    reported: Option<FiveState>,
}

impl TrackerState {
    pub(crate) fn projection(&self) -> FiveState {
        if self.in_transition {
            return if self.actual == Some(true) {
                FiveState::TurningOff
            } else {
                FiveState::TurningOn
            };
        }
        match self.reported {
            Some(state @ (FiveState::Unknown | FiveState::Unavailable)) => state,
            _ => match self.actual {
                Some(true) => FiveState::Enabled,
                Some(false) => FiveState::Disabled,
                None => FiveState::Unknown,
            },
        }
    }

    /// Records a hardware observation and decides what to do with a deferred request.
    pub(crate) fn observe(&mut self, new_state: FiveState) -> DeferredOutcome {
        let was_in_transition = self.in_transition;
        match new_state {
            FiveState::Disabled => {
                self.in_transition = false;
                self.actual = Some(false);
            }
            FiveState::Enabled => {
                self.in_transition = false;
                self.actual = Some(true);
            }
            FiveState::TurningOn => {
                self.in_transition = true;
                self.actual = Some(false);
            }
            FiveState::TurningOff => {
                self.in_transition = true;
                self.actual = Some(true);
            }
            FiveState::Intermediate | FiveState::Unknown | FiveState::Unavailable => {}
        }
        self.reported = Some(new_state);

        if !was_in_transition || self.in_transition || !self.deferred_pending {
            return DeferredOutcome::Idle;
        }

        self.deferred_pending = false;
        match (self.intended, self.actual) {
            (Some(intended), Some(actual)) if intended == actual => DeferredOutcome::Discarded,
            (Some(intended), _) => {
                self.in_transition = true;
                DeferredOutcome::Replay(intended)
            }
            (None, _) => DeferredOutcome::Discarded,
        }
    }

    /// Starts a tracker-owned transition toward `desired_on`.
    pub(crate) fn begin_transition(&mut self, desired_on: bool) {
        self.intended = Some(desired_on);
        self.in_transition = true;
        self.actual = Some(!desired_on);
    }

    /// Flips the intent while a transition is in flight. Last write wins.
    ///
    /// The first deferral is decided against the transition's target, which is
    /// always the opposite of `actual`; `intended` may be left over from an
    /// earlier transition the hardware has since moved away from.
    pub(crate) fn defer_toggle(&mut self) -> bool {
        let current_target = if self.deferred_pending {
            self.intended.unwrap_or_else(|| !self.actual.unwrap_or(false))
        } else {
            !self.actual.unwrap_or(false)
        };
        let next = !current_target;
        self.intended = Some(next);
        self.deferred_pending = true;
        next
    }
}

/// Serializable view of a tracker for health and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerSnapshot {
    pub radio: RadioKind,
    pub state: FiveState,
    pub actual: Option<bool>,
    pub in_transition: bool,
    pub intended: Option<bool>,
    pub deferred_pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionSnapshot>,
}

/// Reconciles one radio's intended on/off state against reported hardware state.
///
/// Thread-safe: the whole bookkeeping set sits behind one mutex so the
/// read-modify-write in [`StateTracker::set_current_state`] is atomic.
pub struct StateTracker {
    policy: Arc<dyn RadioPolicy>,
    state: Mutex<TrackerState>,
    transition: Mutex<Option<TransitionHandle>>,
    listeners: RwLock<Vec<StateListener>>,
}

impl StateTracker {
    pub fn new(policy: Arc<dyn RadioPolicy>) -> Self {
        Self {
            policy,
            state: Mutex::new(TrackerState::default()),
            transition: Mutex::new(None),
            listeners: RwLock::new(vec![]),
        }
    }

    pub fn kind(&self) -> RadioKind {
        self.policy.kind()
    }

    /// Requests the opposite of the current hardware state.
    ///
    /// While a transition is in flight no second request is issued; the flipped
    /// intent is stored and replayed when the transition settles. Outside a
    /// transition only `Enabled`/`Disabled` hardware states act; anything else
    /// (unknown, unavailable, transitioning outside our control) is a no-op.
    pub fn toggle(&self) {
        let radio = self.kind();
        let mut state = self.lock_state();
        let before = state.projection();

        if state.in_transition {
            let intended = state.defer_toggle();
            tracing::debug!(
                radio = %radio,
                intended,
                "Toggle during transition; deferring request"
            );
            return;
        }

        let desired_on = match self.policy.actual_state() {
            FiveState::Disabled => true,
            FiveState::Enabled => false,
            other if other.is_transitional() => {
                tracing::debug!(
                    radio = %radio,
                    actual = %other,
                    "Toggle ignored; hardware transition not started by tracker"
                );
                return;
            }
            other => {
                tracing::debug!(radio = %radio, actual = %other, "Toggle ignored");
                return;
            }
        };

        state.begin_transition(desired_on);
        let after = state.projection();
        tracing::info!(radio = %radio, desired_on, "Requesting state change");
        self.dispatch(desired_on);
        drop(state);

        self.notify_if_changed(before, after);
    }

    /// Applies a hardware observation, replaying a deferred request if the
    /// transition just completed away from the user's last intent.
    pub fn set_current_state(&self, new_state: FiveState) {
        let radio = self.kind();
        let mut state = self.lock_state();
        let before = state.projection();

        tracing::debug!(radio = %radio, observed = %new_state, "Hardware state observed");
        match state.observe(new_state) {
            DeferredOutcome::Idle => {}
            DeferredOutcome::Discarded => {
                tracing::debug!(
                    radio = %radio,
                    "Deferred request dropped; intended state already reached"
                );
            }
            DeferredOutcome::Replay(desired_on) => {
                tracing::info!(radio = %radio, desired_on, "Replaying deferred state change");
                self.dispatch(desired_on);
            }
        }

        let after = state.projection();
        drop(state);

        self.notify_if_changed(before, after);
    }

    /// Translates an inbound event and applies it if it belongs to this radio.
    /// Returns whether the event was accepted.
    pub fn on_actual_state_change(&self, event: &HardwareEvent) -> bool {
        match self.policy.translate_event(event) {
            Some(state) => {
                self.set_current_state(state);
                true
            }
            None => false,
        }
    }

    /// Fresh hardware read, bypassing bookkeeping.
    pub fn actual_state(&self) -> FiveState {
        self.policy.actual_state()
    }

    /// Externally visible state derived from the bookkeeping.
    pub fn state(&self) -> FiveState {
        self.lock_state().projection()
    }

    /// Collapsed three-value state from a fresh hardware read.
    ///
    /// May briefly disagree with [`StateTracker::state`]; the hardware is the
    /// authority here.
    pub fn tri_state(&self) -> TriState {
        self.policy.actual_state().to_tri_state()
    }

    /// Whether the last recorded intent was "on". Meaningful only mid-transition.
    pub fn is_turning_on(&self) -> bool {
        self.lock_state().intended == Some(true)
    }

    pub fn subscribe(&self, listener: StateListener) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    /// Waits for the most recently issued driver call to return.
    pub fn join_pending_transition(&self) {
        let handle = self
            .transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.join();
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let state = self.lock_state().clone();
        let transition = self
            .transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(TransitionHandle::snapshot);

        TrackerSnapshot {
            radio: self.kind(),
            state: state.projection(),
            actual: state.actual,
            in_transition: state.in_transition,
            intended: state.intended,
            deferred_pending: state.deferred_pending,
            transition,
        }
    }

    fn dispatch(&self, desired_on: bool) {
        let handle = TransitionHandle::spawn(Arc::clone(&self.policy), desired_on);
        // Replacing the previous handle detaches its worker; it still runs to completion.
        *self
            .transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
    }

    fn notify_if_changed(&self, before: FiveState, after: FiveState) {
        if before == after {
            return;
        }
        let listeners: Vec<StateListener> = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for listener in listeners {
            listener(self.kind(), after);
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
