//! Wi-Fi access-point (hotspot) policy; mirror image of the station policy.

use radio_protocol::{FiveState, HardwareEvent, RadioKind, WifiApState, WifiState};
use std::sync::Arc;

use super::RadioPolicy;
use crate::hardware::WifiManager;

pub struct WifiApPolicy {
    manager: Option<Arc<dyn WifiManager>>,
}

impl WifiApPolicy {
    pub fn new(manager: Option<Arc<dyn WifiManager>>) -> Self {
        Self { manager }
    }
}

fn wifi_ap_state_to_five_state(state: WifiApState) -> FiveState {
    match state {
        WifiApState::Disabled => FiveState::Disabled,
        WifiApState::Enabled => FiveState::Enabled,
        WifiApState::Disabling => FiveState::TurningOff,
        WifiApState::Enabling => FiveState::TurningOn,
        WifiApState::Failed | WifiApState::Unknown => FiveState::Unknown,
    }
}

impl RadioPolicy for WifiApPolicy {
    fn kind(&self) -> RadioKind {
        RadioKind::WifiAp
    }

    fn actual_state(&self) -> FiveState {
        match &self.manager {
            Some(manager) => wifi_ap_state_to_five_state(manager.wifi_ap_state()),
            None => FiveState::Unknown,
        }
    }

    fn request_state_change(&self, desired_on: bool) {
        let Some(manager) = &self.manager else {
            tracing::debug!("No Wi-Fi manager; dropping access point state change");
            return;
        };

        if desired_on
            && matches!(
                manager.wifi_state(),
                WifiState::Enabling | WifiState::Enabled
            )
        {
            tracing::info!("Disabling Wi-Fi station before enabling access point");
            if let Err(err) = manager.set_wifi_enabled(false) {
                tracing::warn!(error = %err, "Failed to disable Wi-Fi station");
            }
        }

        tracing::info!(desired_on, "Setting Wi-Fi access point");
        if let Err(err) = manager.set_wifi_ap_enabled(desired_on) {
            tracing::warn!(error = %err, desired_on, "Wi-Fi access point state change rejected");
        }
    }

    fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState> {
        match event {
            HardwareEvent::WifiApStateChanged { state } => {
                Some(wifi_ap_state_to_five_state(*state))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::wifi::test_utils::FakeWifiManager;
    use super::*;

    #[test]
    fn failed_access_point_is_unknown() {
        let manager = Arc::new(FakeWifiManager::new(WifiState::Disabled, WifiApState::Failed));
        let policy = WifiApPolicy::new(Some(manager));
        assert_eq!(policy.actual_state(), FiveState::Unknown);
    }

    #[test]
    fn enabling_disables_active_station_first() {
        for wifi in [WifiState::Enabled, WifiState::Enabling] {
            let manager = Arc::new(FakeWifiManager::new(wifi, WifiApState::Disabled));
            let policy = WifiApPolicy::new(Some(manager.clone()));
            policy.request_state_change(true);
            assert_eq!(manager.calls(), vec![("wifi", false), ("ap", true)], "{:?}", wifi);
        }
    }

    #[test]
    fn disabling_only_touches_access_point() {
        let manager = Arc::new(FakeWifiManager::new(WifiState::Enabled, WifiApState::Enabled));
        let policy = WifiApPolicy::new(Some(manager.clone()));
        policy.request_state_change(false);
        assert_eq!(manager.calls(), vec![("ap", false)]);
    }

    #[test]
    fn translates_only_access_point_events() {
        let policy = WifiApPolicy::new(None);
        assert_eq!(
            policy.translate_event(&HardwareEvent::WifiApStateChanged {
                state: WifiApState::Disabling
            }),
            Some(FiveState::TurningOff)
        );
        assert_eq!(
            policy.translate_event(&HardwareEvent::WifiStateChanged {
                state: WifiState::Enabled
            }),
            None
        );
    }
}
