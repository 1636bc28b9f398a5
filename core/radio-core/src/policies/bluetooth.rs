//! Bluetooth policy. A device without an adapter (emulators) reports Unknown.

use radio_protocol::{BluetoothState, FiveState, HardwareEvent, RadioKind};
use std::sync::Arc;

use super::RadioPolicy;
use crate::hardware::BluetoothAdapter;

pub struct BluetoothPolicy {
    adapter: Option<Arc<dyn BluetoothAdapter>>,
}

impl BluetoothPolicy {
    pub fn new(adapter: Option<Arc<dyn BluetoothAdapter>>) -> Self {
        Self { adapter }
    }
}

fn bluetooth_state_to_five_state(state: BluetoothState) -> FiveState {
    match state {
        BluetoothState::Off => FiveState::Disabled,
        BluetoothState::On => FiveState::Enabled,
        BluetoothState::TurningOn => FiveState::TurningOn,
        BluetoothState::TurningOff => FiveState::TurningOff,
        BluetoothState::Unknown => FiveState::Unknown,
    }
}

impl RadioPolicy for BluetoothPolicy {
    fn kind(&self) -> RadioKind {
        RadioKind::Bluetooth
    }

    fn actual_state(&self) -> FiveState {
        match &self.adapter {
            Some(adapter) => bluetooth_state_to_five_state(adapter.state()),
            None => FiveState::Unknown,
        }
    }

    fn request_state_change(&self, desired_on: bool) {
        let Some(adapter) = &self.adapter else {
            tracing::debug!("No Bluetooth adapter; dropping state change");
            return;
        };

        let result = if desired_on {
            adapter.enable()
        } else {
            adapter.disable()
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, desired_on, "Bluetooth state change rejected");
        }
    }

    fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState> {
        match event {
            HardwareEvent::BluetoothStateChanged { state } => {
                Some(bluetooth_state_to_five_state(*state))
            }
            _ => None,
        }
    }
}
