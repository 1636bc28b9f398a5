//! Daemon configuration: the core `[radios]` section plus simulated hardware.

use radio_core::RadiosConfig;
use radio_protocol::RadioKind;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_TRANSITION_MS: u64 = 750;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub radios: RadiosConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl DaemonConfig {
    pub fn radio_config(&self) -> radio_core::RadioConfig {
        radio_core::RadioConfig {
            radios: self.radios.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Radios whose hardware exists; the rest read as unknown.
    pub present: Vec<RadioKind>,
    /// Radios that start switched on.
    pub initial_on: Vec<RadioKind>,
    pub transition_ms: u64,
    /// Radios whose driver starts a transition but never reports completion.
    pub fail_kinds: Vec<RadioKind>,
    pub usb_connected: bool,
    pub mass_storage_shared: bool,
    pub usb_regexs: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            present: RadioKind::ALL.to_vec(),
            initial_on: vec![RadioKind::Wifi],
            transition_ms: DEFAULT_TRANSITION_MS,
            fail_kinds: vec![],
            usb_connected: false,
            mass_storage_shared: false,
            usb_regexs: vec!["usb\\d".to_string(), "rndis\\d".to_string()],
        }
    }
}

impl SimulationConfig {
    pub fn is_present(&self, kind: RadioKind) -> bool {
        self.present.contains(&kind)
    }

    pub fn starts_on(&self, kind: RadioKind) -> bool {
        self.initial_on.contains(&kind)
    }

    pub fn stalls(&self, kind: RadioKind) -> bool {
        self.fail_kinds.contains(&kind)
    }

    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}
