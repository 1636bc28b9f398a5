//! USB tethering policy.
//!
//! Unlike the radios, the state is derived rather than read: tethered
//! interfaces matching the USB patterns mean enabled; a connected cable with
//! storage not exported means disabled (ready to tether); anything else,
//! including mass-storage sharing, is unavailable. Two independent signals
//! feed it: USB connection changes and storage-share changes.

use radio_protocol::{FiveState, HardwareEvent, RadioKind};
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::RadioPolicy;
use crate::hardware::{StorageMonitor, TetheringManager};

pub struct UsbTetherPolicy {
    tethering: Option<Arc<dyn TetheringManager>>,
    storage: Option<Arc<dyn StorageMonitor>>,
    usb_connected: AtomicBool,
}

impl UsbTetherPolicy {
    pub fn new(
        tethering: Option<Arc<dyn TetheringManager>>,
        storage: Option<Arc<dyn StorageMonitor>>,
    ) -> Self {
        Self {
            tethering,
            storage,
            usb_connected: AtomicBool::new(false),
        }
    }

    pub fn usb_connected(&self) -> bool {
        self.usb_connected.load(Ordering::SeqCst)
    }

    fn mass_storage_shared(&self) -> bool {
        self.storage
            .as_ref()
            .map(|storage| storage.is_mass_storage_shared())
            .unwrap_or(false)
    }
}

/// Compiles interface patterns as whole-name matches. Invalid patterns are skipped.
fn compile_usb_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(regex) => Some(regex),
            Err(err) => {
                tracing::warn!(pattern = %pattern, error = %err, "Skipping invalid USB tether pattern");
                None
            }
        })
        .collect()
}

fn any_usb_iface(ifaces: &[String], patterns: &[Regex]) -> bool {
    ifaces
        .iter()
        .any(|iface| patterns.iter().any(|regex| regex.is_match(iface)))
}

impl RadioPolicy for UsbTetherPolicy {
    fn kind(&self) -> RadioKind {
        RadioKind::UsbTether
    }

    fn actual_state(&self) -> FiveState {
        let Some(tethering) = &self.tethering else {
            return FiveState::Unknown;
        };

        let patterns = compile_usb_patterns(&tethering.tetherable_usb_regexs());
        let mass_storage_shared = self.mass_storage_shared();
        let usb_available = self.usb_connected() && !mass_storage_shared;

        if any_usb_iface(&tethering.tethered_ifaces(), &patterns) {
            return FiveState::Enabled;
        }
        if usb_available {
            return FiveState::Disabled;
        }

        tracing::debug!(
            usb_connected = self.usb_connected(),
            mass_storage_shared,
            errored = any_usb_iface(&tethering.tethering_errored_ifaces(), &patterns),
            "USB tethering unavailable"
        );
        FiveState::Unavailable
    }

    fn request_state_change(&self, desired_on: bool) {
        let Some(tethering) = &self.tethering else {
            tracing::debug!("No tethering manager; dropping state change");
            return;
        };
        if let Err(err) = tethering.set_usb_tethering(desired_on) {
            tracing::warn!(error = %err, desired_on, "USB tethering state change rejected");
        }
    }

    fn translate_event(&self, event: &HardwareEvent) -> Option<FiveState> {
        match event {
            HardwareEvent::UsbStateChanged { connected } => {
                self.usb_connected.store(*connected, Ordering::SeqCst);
                Some(self.actual_state())
            }
            HardwareEvent::MediaShared { shared } => {
                tracing::debug!(shared, "Storage share changed");
                Some(self.actual_state())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::HardwareError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeTethering {
        tethered: Mutex<Vec<String>>,
        errored: Mutex<Vec<String>>,
        regexs: Vec<String>,
        requests: Mutex<Vec<bool>>,
    }

    impl TetheringManager for FakeTethering {
        fn tethered_ifaces(&self) -> Vec<String> {
            self.tethered.lock().unwrap().clone()
        }

        fn tethering_errored_ifaces(&self) -> Vec<String> {
            self.errored.lock().unwrap().clone()
        }

        fn tetherable_usb_regexs(&self) -> Vec<String> {
            self.regexs.clone()
        }

        fn set_usb_tethering(&self, enabled: bool) -> Result<(), HardwareError> {
            self.requests.lock().unwrap().push(enabled);
            Ok(())
        }
    }

    struct FakeStorage(AtomicBool);

    impl StorageMonitor for FakeStorage {
        fn is_mass_storage_shared(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn setup() -> (Arc<FakeTethering>, Arc<FakeStorage>, UsbTetherPolicy) {
        let tethering = Arc::new(FakeTethering {
            regexs: vec!["usb\\d".to_string(), "rndis\\d".to_string()],
            ..Default::default()
        });
        let storage = Arc::new(FakeStorage(AtomicBool::new(false)));
        let policy = UsbTetherPolicy::new(Some(tethering.clone()), Some(storage.clone()));
        (tethering, storage, policy)
    }

    #[test]
    fn disconnected_cable_is_unavailable() {
        let (_tethering, _storage, policy) = setup();
        assert_eq!(policy.actual_state(), FiveState::Unavailable);
    }

    #[test]
    fn connected_cable_is_disabled_until_tethered() {
        let (tethering, _storage, policy) = setup();

        let state = policy.translate_event(&HardwareEvent::UsbStateChanged { connected: true });
        assert_eq!(state, Some(FiveState::Disabled));

        tethering.tethered.lock().unwrap().push("rndis0".to_string());
        assert_eq!(policy.actual_state(), FiveState::Enabled);
    }

    #[test]
    fn mass_storage_blocks_tethering() {
        let (_tethering, storage, policy) = setup();
        policy.translate_event(&HardwareEvent::UsbStateChanged { connected: true });

        storage.0.store(true, Ordering::SeqCst);
        let state = policy.translate_event(&HardwareEvent::MediaShared { shared: true });
        assert_eq!(state, Some(FiveState::Unavailable));
    }

    #[test]
    fn errored_interface_is_unavailable() {
        let (tethering, _storage, policy) = setup();
        tethering.errored.lock().unwrap().push("usb0".to_string());
        assert_eq!(policy.actual_state(), FiveState::Unavailable);
    }

    #[test]
    fn patterns_must_match_whole_interface_name() {
        let (tethering, _storage, policy) = setup();
        tethering
            .tethered
            .lock()
            .unwrap()
            .push("wlan-usb0-bridge".to_string());
        assert_eq!(policy.actual_state(), FiveState::Unavailable);
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let patterns = compile_usb_patterns(&["usb(".to_string(), "usb\\d".to_string()]);
        assert_eq!(patterns.len(), 1);
        assert!(any_usb_iface(&["usb1".to_string()], &patterns));
    }

    #[test]
    fn missing_tethering_manager_is_unknown() {
        let policy = UsbTetherPolicy::new(None, None);
        assert_eq!(policy.actual_state(), FiveState::Unknown);
    }

    #[test]
    fn requests_reach_tethering_manager() {
        let (tethering, _storage, policy) = setup();
        policy.request_state_change(true);
        assert_eq!(*tethering.requests.lock().unwrap(), vec![true]);
    }

    #[test]
    fn ignores_radio_events() {
        let (_tethering, _storage, policy) = setup();
        assert_eq!(
            policy.translate_event(&HardwareEvent::WifiStateChanged {
                state: radio_protocol::WifiState::Enabled
            }),
            None
        );
    }
}
