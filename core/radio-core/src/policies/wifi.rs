//! Wi-Fi station policy.
//!
//! Station and access-point mode share one chip, so enabling the station first
//! turns the access point off when it is up or coming up.

use radio_protocol::{FiveState, HardwareEvent, RadioKind, WifiApState, WifiState};
use std::sync::Arc;

use super::RadioPolicy;
use crate::hardware::WifiManager;

pub struct WifiPolicy {
    manager: Option<Arc<dyn WifiManager>>,
}

impl WifiPolicy {
    pub fn new(manager: Option<Arc<dyn WifiManager>>) -> Self {
        Self { manager }
    }
}

fn wifi_state_to_five_state(state: WifiState) -> FiveState {
    match state {
        WifiState::Disabled => FiveState::Disabled,
        WifiState::Enabled => FiveState::Enabled,
        WifiState::Disabling => FiveState::TurningOff,
        WifiState::Enabling => FiveState::TurningOn,
        WifiState::Unknown => FiveState::Unknown,
    }
}

impl RadioPolicy for WifiPolicy {
    fn kind(&self) -> RadioKind {
        RadioKind::Wifi
    }

    fn actual_state(&self) -> FiveState {
        match &self.manager {
            Some(manager) => wifi_state_to_five_state(manager.wifi_state()),
            None => FiveState::Unknown,
        }
    }

    fn request_state_change(&self, desired_on: bool) {
        let Some(manager) = &self.manager else {
            tracing::debug!("No Wi-Fi manager; dropping state change");
            return;
        };

        if desired_on
            && matches!(
                manager.wifi_ap_state(),
                WifiApState::Enabling | WifiApState::Enabled
            )
        {
            tracing::info!("Disabling Wi-Fi access point before enabling station mode");
            if let Err(err) = manager.set_wifi_ap_enabled(false) {
                tracing::warn!(error = %err, "Failed to disable Wi-Fi access point");
            }
        }

        if let Err(err) = manager.set_wifi_enabled(desired_on) {
            tracing::warn!(error = %err, desired_on, "Wi-Fi state change rejected");
        }
    }

    fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState> {
        match event {
            HardwareEvent::WifiStateChanged { state } => Some(wifi_state_to_five_state(*state)),
            _ => None,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::FakeWifiManager;
    use super::*;

    fn policy(wifi: WifiState, ap: WifiApState) -> (Arc<FakeWifiManager>, WifiPolicy) {
        let manager = Arc::new(FakeWifiManager::new(wifi, ap));
        let policy = WifiPolicy::new(Some(manager.clone()));
        (manager, policy)
    }

    #[test]
    fn maps_wifi_states() {
        let (manager, policy) = policy(WifiState::Enabling, WifiApState::Disabled);
        assert_eq!(policy.actual_state(), FiveState::TurningOn);

        *manager.wifi.lock().unwrap() = WifiState::Disabling;
        assert_eq!(policy.actual_state(), FiveState::TurningOff);

        *manager.wifi.lock().unwrap() = WifiState::Unknown;
        assert_eq!(policy.actual_state(), FiveState::Unknown);
    }

    #[test]
    fn missing_manager_is_unknown() {
        let policy = WifiPolicy::new(None);
        assert_eq!(policy.actual_state(), FiveState::Unknown);
        policy.request_state_change(true);
    }

    #[test]
    fn enabling_disables_active_access_point_first() {
        for ap in [WifiApState::Enabled, WifiApState::Enabling] {
            let (manager, policy) = policy(WifiState::Disabled, ap);
            policy.request_state_change(true);
            assert_eq!(manager.calls(), vec![("ap", false), ("wifi", true)], "{:?}", ap);
        }
    }

    #[test]
    fn enabling_leaves_idle_access_point_alone() {
        let (manager, policy) = policy(WifiState::Disabled, WifiApState::Disabled);
        policy.request_state_change(true);
        assert_eq!(manager.calls(), vec![("wifi", true)]);
    }

    #[test]
    fn disabling_never_touches_access_point() {
        let (manager, policy) = policy(WifiState::Enabled, WifiApState::Enabled);
        policy.request_state_change(false);
        assert_eq!(manager.calls(), vec![("wifi", false)]);
    }

    #[test]
    fn translates_only_wifi_events() {
        let (_manager, policy) = policy(WifiState::Disabled, WifiApState::Disabled);
        assert_eq!(
            policy.translate_event(&HardwareEvent::WifiStateChanged {
                state: WifiState::Enabled
            }),
            Some(FiveState::Enabled)
        );
        assert_eq!(
            policy.translate_event(&HardwareEvent::WifiApStateChanged {
                state: WifiApState::Enabled
            }),
            None
        );
    }
}
