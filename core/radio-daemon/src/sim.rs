//! Simulated radio hardware.
//!
//! Stands in for the platform managers so the daemon can run anywhere. Each
//! setter behaves like a slow driver: it reports the transitional state at
//! once, blocks for the configured latency, then reports the settled state.
//! Reports travel over the same channel real broadcasts would, so the
//! trackers only learn about changes through the event pump.

use radio_core::{
    BluetoothAdapter, HardwareError, RadioHardware, StorageMonitor, TetheringManager, WifiManager,
    WimaxController,
};
use radio_protocol::{BluetoothState, HardwareEvent, RadioKind, WifiApState, WifiState, WimaxState};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;

use crate::config::SimulationConfig;
use crate::events::{EventSource, InboundEvent};

const USB_TETHER_IFACE: &str = "rndis0";

#[derive(Debug, Clone, Copy)]
struct SimState {
    wifi: WifiState,
    wifi_ap: WifiApState,
    bluetooth: BluetoothState,
    wimax: WimaxState,
    usb_connected: bool,
    mass_storage_shared: bool,
    usb_tethered: bool,
}

pub struct SimulatedHardware {
    config: SimulationConfig,
    state: Mutex<SimState>,
    events: Sender<InboundEvent>,
}

impl SimulatedHardware {
    pub fn new(config: SimulationConfig, events: Sender<InboundEvent>) -> Self {
        let on = |kind: RadioKind| config.starts_on(kind);
        let state = SimState {
            wifi: if on(RadioKind::Wifi) {
                WifiState::Enabled
            } else {
                WifiState::Disabled
            },
            wifi_ap: if on(RadioKind::WifiAp) {
                WifiApState::Enabled
            } else {
                WifiApState::Disabled
            },
            bluetooth: if on(RadioKind::Bluetooth) {
                BluetoothState::On
            } else {
                BluetoothState::Off
            },
            wimax: if on(RadioKind::Wimax) {
                WimaxState::Enabled
            } else {
                WimaxState::Disabled
            },
            usb_connected: config.usb_connected,
            mass_storage_shared: config.mass_storage_shared,
            usb_tethered: on(RadioKind::UsbTether),
        };

        Self {
            config,
            state: Mutex::new(state),
            events,
        }
    }

    /// Exposes the simulated managers for every radio whose hardware is present.
    pub fn hardware(self: &Arc<Self>) -> RadioHardware {
        let present = |kind: RadioKind| self.config.is_present(kind);
        let mut hardware = RadioHardware::default();

        if present(RadioKind::Wifi) || present(RadioKind::WifiAp) {
            hardware.wifi = Some(self.clone());
        }
        if present(RadioKind::Bluetooth) {
            hardware.bluetooth = Some(self.clone());
        }
        if present(RadioKind::Wimax) {
            hardware.wimax = Some(self.clone());
        }
        if present(RadioKind::UsbTether) {
            hardware.tethering = Some(self.clone());
            hardware.storage = Some(self.clone());
        }
        hardware
    }

    /// Mirrors an externally injected broadcast into the simulated hardware,
    /// so a client can plug a cable or flip a radio behind the trackers' backs.
    pub fn absorb(&self, event: &HardwareEvent) {
        let mut state = self.lock_state();
        match *event {
            HardwareEvent::WifiStateChanged { state: value } => state.wifi = value,
            HardwareEvent::WifiApStateChanged { state: value } => state.wifi_ap = value,
            HardwareEvent::BluetoothStateChanged { state: value } => state.bluetooth = value,
            HardwareEvent::Wimax4gStateChanged { state: value }
            | HardwareEvent::WimaxEnabledChanged { state: value } => state.wimax = value,
            HardwareEvent::UsbStateChanged { connected } => {
                state.usb_connected = connected;
                if !connected {
                    state.usb_tethered = false;
                }
            }
            HardwareEvent::MediaShared { shared } => state.mass_storage_shared = shared,
        }
    }

    /// Re-sends the USB broadcasts a late subscriber would receive as sticky
    /// intents, so the tether policy starts from the configured cable state.
    pub fn announce_sticky_state(&self) {
        if !self.config.is_present(RadioKind::UsbTether) {
            return;
        }
        let state = *self.lock_state();
        self.emit(HardwareEvent::MediaShared {
            shared: state.mass_storage_shared,
        });
        self.emit(HardwareEvent::UsbStateChanged {
            connected: state.usb_connected,
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, SimState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: HardwareEvent) {
        tracing::debug!(action = event.action(), "Simulated broadcast");
        if self
            .events
            .send(InboundEvent::new(EventSource::Hardware, event))
            .is_err()
        {
            tracing::warn!("Event pump gone; dropping simulated broadcast");
        }
    }

    fn ensure_present(&self, kind: RadioKind) -> Result<(), HardwareError> {
        if self.config.is_present(kind) {
            Ok(())
        } else {
            Err(HardwareError::NotPresent)
        }
    }

    /// Runs one driver transition: transitional report, latency, settled report.
    /// Radios configured to stall never send the settled report.
    fn transition<S: Copy>(
        &self,
        kind: RadioKind,
        [transitional, settled]: [S; 2],
        apply: fn(&mut SimState, S),
        event: fn(S) -> HardwareEvent,
    ) -> Result<(), HardwareError> {
        self.ensure_present(kind)?;

        apply(&mut self.lock_state(), transitional);
        self.emit(event(transitional));

        if self.config.stalls(kind) {
            tracing::warn!(radio = %kind, "Simulated driver stalled mid-transition");
            return Ok(());
        }

        thread::sleep(self.config.transition_delay());
        apply(&mut self.lock_state(), settled);
        self.emit(event(settled));
        Ok(())
    }
}

impl WifiManager for SimulatedHardware {
    fn wifi_state(&self) -> WifiState {
        self.lock_state().wifi
    }

    fn wifi_ap_state(&self) -> WifiApState {
        self.lock_state().wifi_ap
    }

    fn set_wifi_enabled(&self, enabled: bool) -> Result<(), HardwareError> {
        let steps = if enabled {
            [WifiState::Enabling, WifiState::Enabled]
        } else {
            [WifiState::Disabling, WifiState::Disabled]
        };
        self.transition(
            RadioKind::Wifi,
            steps,
            |sim, value| sim.wifi = value,
            |state| HardwareEvent::WifiStateChanged { state },
        )
    }

    fn set_wifi_ap_enabled(&self, enabled: bool) -> Result<(), HardwareError> {
        let steps = if enabled {
            [WifiApState::Enabling, WifiApState::Enabled]
        } else {
            [WifiApState::Disabling, WifiApState::Disabled]
        };
        self.transition(
            RadioKind::WifiAp,
            steps,
            |sim, value| sim.wifi_ap = value,
            |state| HardwareEvent::WifiApStateChanged { state },
        )
    }
}

impl BluetoothAdapter for SimulatedHardware {
    fn state(&self) -> BluetoothState {
        self.lock_state().bluetooth
    }

    fn enable(&self) -> Result<(), HardwareError> {
        self.transition(
            RadioKind::Bluetooth,
            [BluetoothState::TurningOn, BluetoothState::On],
            |sim, value| sim.bluetooth = value,
            |state| HardwareEvent::BluetoothStateChanged { state },
        )
    }

    fn disable(&self) -> Result<(), HardwareError> {
        self.transition(
            RadioKind::Bluetooth,
            [BluetoothState::TurningOff, BluetoothState::Off],
            |sim, value| sim.bluetooth = value,
            |state| HardwareEvent::BluetoothStateChanged { state },
        )
    }
}

impl WimaxController for SimulatedHardware {
    fn is_supported(&self) -> bool {
        self.config.is_present(RadioKind::Wimax)
    }

    fn state(&self) -> WimaxState {
        self.lock_state().wimax
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), HardwareError> {
        let steps = if enabled {
            [WimaxState::Enabling, WimaxState::Enabled]
        } else {
            [WimaxState::Disabling, WimaxState::Disabled]
        };
        self.transition(
            RadioKind::Wimax,
            steps,
            |sim, value| sim.wimax = value,
            |state| HardwareEvent::Wimax4gStateChanged { state },
        )
    }
}

impl TetheringManager for SimulatedHardware {
    fn tethered_ifaces(&self) -> Vec<String> {
        if self.lock_state().usb_tethered {
            vec![USB_TETHER_IFACE.to_string()]
        } else {
            vec![]
        }
    }

    fn tethering_errored_ifaces(&self) -> Vec<String> {
        vec![]
    }

    fn tetherable_usb_regexs(&self) -> Vec<String> {
        self.config.usb_regexs.clone()
    }

    fn set_usb_tethering(&self, enabled: bool) -> Result<(), HardwareError> {
        self.ensure_present(RadioKind::UsbTether)?;
        {
            let state = self.lock_state();
            if enabled && (!state.usb_connected || state.mass_storage_shared) {
                return Err(HardwareError::Rejected("usb not available".to_string()));
            }
        }

        if self.config.stalls(RadioKind::UsbTether) {
            tracing::warn!("Simulated tethering request stalled");
            return Ok(());
        }

        thread::sleep(self.config.transition_delay());
        let connected = {
            let mut state = self.lock_state();
            state.usb_tethered = enabled;
            state.usb_connected
        };
        // Tethering has no dedicated broadcast; the USB state change carries it.
        self.emit(HardwareEvent::UsbStateChanged { connected });
        Ok(())
    }
}

impl StorageMonitor for SimulatedHardware {
    fn is_mass_storage_shared(&self) -> bool {
        self.lock_state().mass_storage_shared
    }
}
