//! IPC protocol types and shared radio state vocabulary for radiod.
//!
//! This crate is shared by the daemon, the core library, and clients so the
//! state names and event namespaces cannot drift between them. The daemon
//! remains the authority on validation, but clients reuse the same types to
//! construct valid requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// Radio vocabulary
// ═══════════════════════════════════════════════════════════════════════════════

/// Hardware-backed binary subsystems managed by a reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadioKind {
    Wifi,
    WifiAp,
    Bluetooth,
    Wimax,
    UsbTether,
}

impl RadioKind {
    pub const ALL: [RadioKind; 5] = [
        RadioKind::Wifi,
        RadioKind::WifiAp,
        RadioKind::Bluetooth,
        RadioKind::Wimax,
        RadioKind::UsbTether,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Wifi => "wifi",
            Self::WifiAp => "wifi_ap",
            Self::Bluetooth => "bluetooth",
            Self::Wimax => "wimax",
            Self::UsbTether => "usb_tether",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl fmt::Display for RadioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Externally observable classification of a radio's condition.
///
/// `Intermediate` is only produced by the tri-state collapse; hardware
/// observations use the other six values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiveState {
    Enabled,
    Disabled,
    TurningOn,
    TurningOff,
    Intermediate,
    Unknown,
    Unavailable,
}

impl FiveState {
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::TurningOn | Self::TurningOff)
    }

    pub fn to_tri_state(self) -> TriState {
        match self {
            Self::Enabled => TriState::Enabled,
            Self::Disabled => TriState::Disabled,
            _ => TriState::Intermediate,
        }
    }
}

impl fmt::Display for FiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::TurningOn => "turning_on",
            Self::TurningOff => "turning_off",
            Self::Intermediate => "intermediate",
            Self::Unknown => "unknown",
            Self::Unavailable => "unavailable",
        };
        write!(f, "{}", label)
    }
}

/// Simplified projection for consumers that don't need transition detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    Enabled,
    Disabled,
    Intermediate,
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Intermediate => "intermediate",
        };
        write!(f, "{}", label)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Raw hardware enumerations. Unrecognised values decode as `Unknown`.
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiState {
    Disabling,
    Disabled,
    Enabling,
    Enabled,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiApState {
    Disabling,
    Disabled,
    Enabling,
    Enabled,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BluetoothState {
    Off,
    TurningOn,
    On,
    TurningOff,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WimaxState {
    Disabling,
    Disabled,
    Enabling,
    Enabled,
    #[serde(other)]
    Unknown,
}

/// Inbound hardware state-change notification, tagged by its event namespace.
///
/// Several policies share one event bus; each accepts only its own actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HardwareEvent {
    WifiStateChanged {
        state: WifiState,
    },
    WifiApStateChanged {
        state: WifiApState,
    },
    BluetoothStateChanged {
        state: BluetoothState,
    },
    #[serde(rename = "wimax_4g_state_changed")]
    Wimax4gStateChanged {
        state: WimaxState,
    },
    WimaxEnabledChanged {
        state: WimaxState,
    },
    UsbStateChanged {
        connected: bool,
    },
    MediaShared {
        shared: bool,
    },
}

impl HardwareEvent {
    pub fn action(&self) -> &'static str {
        match self {
            Self::WifiStateChanged { .. } => "wifi_state_changed",
            Self::WifiApStateChanged { .. } => "wifi_ap_state_changed",
            Self::BluetoothStateChanged { .. } => "bluetooth_state_changed",
            Self::Wimax4gStateChanged { .. } => "wimax_4g_state_changed",
            Self::WimaxEnabledChanged { .. } => "wimax_enabled_changed",
            Self::UsbStateChanged { .. } => "usb_state_changed",
            Self::MediaShared { .. } => "media_shared",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request / response envelope
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Method {
    GetHealth,
    ListRadios,
    GetState,
    GetTriState,
    Toggle,
    Event,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Request {
    pub protocol_version: u32,
    pub method: Method,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(method: Method, id: Option<String>, params: Option<Value>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            method,
            id,
            params,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl Response {
    pub fn ok(id: Option<String>, data: Value) -> Self {
        Self {
            ok: true,
            id,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(id: Option<String>, code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(ErrorInfo::new(code, message)),
        }
    }

    pub fn error_with_info(id: Option<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            id,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RadioParams {
    radio: String,
}

/// Extracts the target radio from `{"radio": "<kind>"}`.
pub fn parse_radio_params(params: Value) -> Result<RadioKind, ErrorInfo> {
    let parsed: RadioParams = serde_json::from_value(params).map_err(|err| {
        ErrorInfo::new(
            "invalid_params",
            format!("radio params are invalid: {}", err),
        )
    })?;

    let radio = parsed.radio.trim();
    if radio.is_empty() {
        return Err(ErrorInfo::new("missing_field", "radio is required"));
    }

    RadioKind::from_id(radio)
        .ok_or_else(|| ErrorInfo::new("unknown_radio", format!("unknown radio kind: {}", radio)))
}

pub fn parse_event(params: Value) -> Result<HardwareEvent, ErrorInfo> {
    serde_json::from_value(params).map_err(|err| {
        ErrorInfo::new(
            "invalid_params",
            format!("event payload is invalid: {}", err),
        )
    })
}
