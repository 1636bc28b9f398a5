//! # radio-core
//!
//! Radio state reconciliation engine: keeps each hardware-backed toggle
//! (Wi-Fi, access point, Bluetooth, WiMAX, USB tethering) consistent between
//! what the user asked for and what the hardware reports, despite drivers
//! taking a variable amount of time to switch.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Driver calls run on worker threads.
//! - **Thread-safe trackers**: Each tracker guards its bookkeeping with one mutex.
//! - **Graceful degradation**: Absent hardware reads as `Unknown`; toggles never fail.
//! - **Injected platform**: Policies receive their managers; nothing is global.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use radio_core::{RadioConfig, RadioHardware, RadioRegistry};
//! use radio_protocol::RadioKind;
//!
//! let registry = RadioRegistry::new(hardware, &RadioConfig::default());
//! registry.sync_from_hardware();
//! registry.toggle(RadioKind::Wifi)?;
//! registry.dispatch_event(&event);
//! ```

pub mod config;
pub mod error;
pub mod hardware;
pub mod policies;
pub mod registry;
pub mod tracker;
pub mod transition;

pub use config::{load_config, RadioConfig, RadiosConfig};
pub use error::{RadioError, Result};
pub use hardware::{
    BluetoothAdapter, HardwareError, StorageMonitor, TetheringManager, WifiManager,
    WimaxController,
};
pub use policies::RadioPolicy;
pub use registry::{RadioHardware, RadioRegistry};
pub use tracker::{StateListener, StateTracker, TrackerSnapshot};
pub use transition::{TransitionHandle, TransitionSnapshot};
