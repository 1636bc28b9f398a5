//! Platform capability traits injected into radio policies.
//!
//! Each trait stands in for one platform manager. Policies receive them as
//! constructor arguments so tests and the simulated daemon backend can supply
//! fakes. Setters talk to drivers and may block for a user-noticeable time;
//! callers run them on a transition worker, never on an event thread.

use radio_protocol::{BluetoothState, WifiApState, WifiState, WimaxState};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HardwareError {
    #[error("driver rejected request: {0}")]
    Rejected(String),

    #[error("hardware not present")]
    NotPresent,
}

/// Station and access-point control for the shared Wi-Fi chip.
pub trait WifiManager: Send + Sync {
    fn wifi_state(&self) -> WifiState;
    fn wifi_ap_state(&self) -> WifiApState;
    fn set_wifi_enabled(&self, enabled: bool) -> Result<(), HardwareError>;
    fn set_wifi_ap_enabled(&self, enabled: bool) -> Result<(), HardwareError>;
}

pub trait BluetoothAdapter: Send + Sync {
    fn state(&self) -> BluetoothState;
    fn enable(&self) -> Result<(), HardwareError>;
    fn disable(&self) -> Result<(), HardwareError>;
}

pub trait WimaxController: Send + Sync {
    fn is_supported(&self) -> bool;
    fn state(&self) -> WimaxState;
    fn set_enabled(&self, enabled: bool) -> Result<(), HardwareError>;
}

/// Interface-level view of tethering.
///
/// Regex patterns identify which interfaces belong to USB tethering; they
/// must match an interface name in full.
pub trait TetheringManager: Send + Sync {
    fn tethered_ifaces(&self) -> Vec<String>;
    fn tethering_errored_ifaces(&self) -> Vec<String>;
    fn tetherable_usb_regexs(&self) -> Vec<String>;
    fn set_usb_tethering(&self, enabled: bool) -> Result<(), HardwareError>;
}

pub trait StorageMonitor: Send + Sync {
    /// True while external storage is exported to a USB host.
    fn is_mass_storage_shared(&self) -> bool;
}
