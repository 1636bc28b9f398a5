//! WiMAX policy. Listens on both the 4G state and the enabled-changed actions.

use radio_protocol::{FiveState, HardwareEvent, RadioKind, WimaxState};
use std::sync::Arc;

use super::RadioPolicy;
use crate::hardware::WimaxController;

pub struct WimaxPolicy {
    controller: Option<Arc<dyn WimaxController>>,
}

impl WimaxPolicy {
    pub fn new(controller: Option<Arc<dyn WimaxController>>) -> Self {
        Self { controller }
    }

    fn supported_controller(&self) -> Option<&Arc<dyn WimaxController>> {
        self.controller
            .as_ref()
            .filter(|controller| controller.is_supported())
    }
}

fn wimax_state_to_five_state(state: WimaxState) -> FiveState {
    match state {
        WimaxState::Disabled => FiveState::Disabled,
        WimaxState::Enabled => FiveState::Enabled,
        WimaxState::Enabling => FiveState::TurningOn,
        WimaxState::Disabling => FiveState::TurningOff,
        WimaxState::Unknown => FiveState::Unknown,
    }
}

impl RadioPolicy for WimaxPolicy {
    fn kind(&self) -> RadioKind {
        RadioKind::Wimax
    }

    fn actual_state(&self) -> FiveState {
        match self.supported_controller() {
            Some(controller) => wimax_state_to_five_state(controller.state()),
            None => FiveState::Unknown,
        }
    }

    fn request_state_change(&self, desired_on: bool) {
        let Some(controller) = self.supported_controller() else {
            tracing::error!("WiMAX is not supported");
            return;
        };
        if let Err(err) = controller.set_enabled(desired_on) {
            tracing::warn!(error = %err, desired_on, "WiMAX state change rejected");
        }
    }

    fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState> {
        match event {
            HardwareEvent::Wimax4gStateChanged { state }
            | HardwareEvent::WimaxEnabledChanged { state } => {
                Some(wimax_state_to_five_state(*state))
            }
            _ => None,
        }
    }
}
