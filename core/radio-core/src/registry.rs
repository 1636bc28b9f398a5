//! Process-wide set of reconciliation engines, one per radio kind.
//!
//! Built once at startup from injected hardware managers; there are no
//! statically initialised trackers.

use radio_protocol::{FiveState, HardwareEvent, RadioKind, TriState};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::RadioConfig;
use crate::error::{RadioError, Result};
use crate::hardware::{
    BluetoothAdapter, StorageMonitor, TetheringManager, WifiManager, WimaxController,
};
use crate::policies::{
    BluetoothPolicy, RadioPolicy, UsbTetherPolicy, WifiApPolicy, WifiPolicy, WimaxPolicy,
};
use crate::tracker::{StateListener, StateTracker, TrackerSnapshot};

/// Platform managers available to this process. `None` means the hardware is absent.
#[derive(Clone, Default)]
pub struct RadioHardware {
    pub wifi: Option<Arc<dyn WifiManager>>,
    pub bluetooth: Option<Arc<dyn BluetoothAdapter>>,
    pub wimax: Option<Arc<dyn WimaxController>>,
    pub tethering: Option<Arc<dyn TetheringManager>>,
    pub storage: Option<Arc<dyn StorageMonitor>>,
}

pub struct RadioRegistry {
    trackers: BTreeMap<RadioKind, Arc<StateTracker>>,
}

impl RadioRegistry {
    pub fn new(hardware: RadioHardware, config: &RadioConfig) -> Self {
        let policies = Self::create_policies(hardware)
            .into_iter()
            .filter(|policy| {
                let enabled = config.is_enabled(policy.kind());
                if !enabled {
                    tracing::info!(radio = %policy.kind(), "Radio disabled by config");
                }
                enabled
            })
            .collect();
        Self::with_policies(policies)
    }

    /// Builds a registry from arbitrary policies. A later policy for the same kind wins.
    pub fn with_policies(policies: Vec<Arc<dyn RadioPolicy>>) -> Self {
        let trackers = policies
            .into_iter()
            .map(|policy| (policy.kind(), Arc::new(StateTracker::new(policy))))
            .collect();
        Self { trackers }
    }

    fn create_policies(hardware: RadioHardware) -> Vec<Arc<dyn RadioPolicy>> {
        vec![
            Arc::new(WifiPolicy::new(hardware.wifi.clone())),
            Arc::new(WifiApPolicy::new(hardware.wifi)),
            Arc::new(BluetoothPolicy::new(hardware.bluetooth)),
            Arc::new(WimaxPolicy::new(hardware.wimax)),
            Arc::new(UsbTetherPolicy::new(hardware.tethering, hardware.storage)),
        ]
    }

    /// Seeds every tracker from a fresh hardware read.
    pub fn sync_from_hardware(&self) {
        for tracker in self.trackers.values() {
            let state = tracker.actual_state();
            tracing::debug!(radio = %tracker.kind(), state = %state, "Initial hardware state");
            tracker.set_current_state(state);
        }
    }

    pub fn kinds(&self) -> Vec<RadioKind> {
        self.trackers.keys().copied().collect()
    }

    pub fn tracker(&self, kind: RadioKind) -> Result<&Arc<StateTracker>> {
        self.trackers
            .get(&kind)
            .ok_or(RadioError::RadioNotRegistered(kind))
    }

    pub fn toggle(&self, kind: RadioKind) -> Result<()> {
        self.tracker(kind)?.toggle();
        Ok(())
    }

    pub fn state(&self, kind: RadioKind) -> Result<FiveState> {
        Ok(self.tracker(kind)?.state())
    }

    pub fn actual_state(&self, kind: RadioKind) -> Result<FiveState> {
        Ok(self.tracker(kind)?.actual_state())
    }

    pub fn tri_state(&self, kind: RadioKind) -> Result<TriState> {
        Ok(self.tracker(kind)?.tri_state())
    }

    pub fn is_turning_on(&self, kind: RadioKind) -> Result<bool> {
        Ok(self.tracker(kind)?.is_turning_on())
    }

    /// Offers the event to every tracker; returns the kinds that accepted it.
    pub fn dispatch_event(&self, event: &HardwareEvent) -> Vec<RadioKind> {
        let accepted: Vec<RadioKind> = self
            .trackers
            .values()
            .filter(|tracker| tracker.on_actual_state_change(event))
            .map(|tracker| tracker.kind())
            .collect();

        if accepted.is_empty() {
            tracing::debug!(action = event.action(), "Event matched no registered radio");
        }
        accepted
    }

    pub fn subscribe(&self, kind: RadioKind, listener: StateListener) -> Result<()> {
        self.tracker(kind)?.subscribe(listener);
        Ok(())
    }

    pub fn subscribe_all(&self, listener: StateListener) {
        for tracker in self.trackers.values() {
            tracker.subscribe(Arc::clone(&listener));
        }
    }

    pub fn snapshots(&self) -> Vec<TrackerSnapshot> {
        self.trackers
            .values()
            .map(|tracker| tracker.snapshot())
            .collect()
    }

    pub fn join_pending_transitions(&self) {
        for tracker in self.trackers.values() {
            tracker.join_pending_transition();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadiosConfig;
    use crate::policies::test_utils::FakePolicy;
    use radio_protocol::WifiState;

    #[test]
    fn default_hardware_registers_every_kind_as_unknown() {
        let registry = RadioRegistry::new(RadioHardware::default(), &RadioConfig::default());
        assert_eq!(registry.kinds(), RadioKind::ALL.to_vec());
        for kind in RadioKind::ALL {
            assert_eq!(registry.actual_state(kind).unwrap(), FiveState::Unknown);
        }
    }

    #[test]
    fn config_skips_disabled_radios() {
        let config = RadioConfig {
            radios: RadiosConfig {
                disabled: vec![RadioKind::Wimax],
            },
        };
        let registry = RadioRegistry::new(RadioHardware::default(), &config);

        assert!(!registry.kinds().contains(&RadioKind::Wimax));
        assert!(matches!(
            registry.toggle(RadioKind::Wimax),
            Err(RadioError::RadioNotRegistered(RadioKind::Wimax))
        ));
    }

    #[test]
    fn events_route_to_matching_tracker_only() {
        let wifi = Arc::new(FakePolicy::new(RadioKind::Wifi, FiveState::Disabled));
        let registry = RadioRegistry::with_policies(vec![wifi]);

        let accepted = registry.dispatch_event(&HardwareEvent::WifiStateChanged {
            state: WifiState::Enabling,
        });
        assert_eq!(accepted, vec![RadioKind::Wifi]);
        assert_eq!(registry.state(RadioKind::Wifi).unwrap(), FiveState::TurningOn);

        let accepted = registry.dispatch_event(&HardwareEvent::MediaShared { shared: true });
        assert!(accepted.is_empty());
    }

    #[test]
    fn sync_from_hardware_seeds_bookkeeping() {
        let wifi = Arc::new(FakePolicy::new(RadioKind::Wifi, FiveState::Enabled));
        let registry = RadioRegistry::with_policies(vec![wifi]);
        assert_eq!(registry.state(RadioKind::Wifi).unwrap(), FiveState::Unknown);

        registry.sync_from_hardware();
        assert_eq!(registry.state(RadioKind::Wifi).unwrap(), FiveState::Enabled);
    }
}
