//! Per-radio policies bridging the tracker's five-state model to one subsystem.
//! Add new radio kinds here and wire them up in `registry.rs`.

mod bluetooth;
mod usb_tether;
mod wifi;
mod wifi_ap;
mod wimax;

pub use bluetooth::BluetoothPolicy;
pub use usb_tether::UsbTetherPolicy;
pub use wifi::WifiPolicy;
pub use wifi_ap::WifiApPolicy;
pub use wimax::WimaxPolicy;

use radio_protocol::{FiveState, HardwareEvent, RadioKind};

/// Capability set the reconciliation engine needs from one radio kind.
///
/// Implementors should:
/// - Return `FiveState::Unknown` when the hardware is absent, never panic
/// - Log driver failures via `tracing::warn!`; completion is observed through events
/// - Ignore events outside their own namespace
pub trait RadioPolicy: Send + Sync {
    fn kind(&self) -> RadioKind;

    /// Synchronous read of the current hardware state.
    fn actual_state(&self) -> FiveState;

    /// Issues the driver command. May block; the engine runs it on a worker.
    fn request_state_change(&self, desired_on: bool);

    /// Maps an inbound event onto a five-state observation.
    /// Returns None for events belonging to another radio.
    fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState>;
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use radio_protocol::WifiState;
    use std::sync::Mutex;

    /// Scriptable policy that records every driver request.
    pub struct FakePolicy {
        pub kind: RadioKind,
        pub actual: Mutex<FiveState>,
        pub requests: Mutex<Vec<bool>>,
    }

    impl FakePolicy {
        pub fn new(kind: RadioKind, actual: FiveState) -> Self {
            Self {
                kind,
                actual: Mutex::new(actual),
                requests: Mutex::new(vec![]),
            }
        }

        pub fn set_actual(&self, state: FiveState) {
            *self.actual.lock().unwrap() = state;
        }

        pub fn requests(&self) -> Vec<bool> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl RadioPolicy for FakePolicy {
        fn kind(&self) -> RadioKind {
            self.kind
        }

        fn actual_state(&self) -> FiveState {
            *self.actual.lock().unwrap()
        }

        fn request_state_change(&self, desired_on: bool) {
            self.requests.lock().unwrap().push(desired_on);
        }

        fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState> {
            match event {
                HardwareEvent::WifiStateChanged { state } => Some(match state {
                    WifiState::Enabled => FiveState::Enabled,
                    WifiState::Disabled => FiveState::Disabled,
                    WifiState::Enabling => FiveState::TurningOn,
                    WifiState::Disabling => FiveState::TurningOff,
                    WifiState::Unknown => FiveState::Unknown,
                }),
                _ => None,
            }
        }
    }
}
