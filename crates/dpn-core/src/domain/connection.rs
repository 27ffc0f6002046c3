//! Connection state, hardware variants, and the pairing challenge.
//!
//! # Session lifecycle (for beginners)
//!
//! A session progresses through these phases:
//!
//! ```text
//!                 begin_address_connection
//! Disconnected ──────────────────────────►  Connecting  ──►  Connected
//!      │  ▲                                     │
//!      │  └──────────── collaborator failure ───┘
//!      │
//!      │ select_hardware_variant                submit_pin (match)
//!      └──────────────────────►  PairingPending ─────────────────► Connected
//!                                   │   ▲
//!                     cancel_pairing│   │ submit_pin (mismatch)
//!                                   ▼   └─────┘
//!                              Disconnected
//! ```
//!
//! These types only describe the states; the transitions themselves are
//! driven by `ConnectionSession` in the `dpn-console` application layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fixed literal that prefixes every generated device identifier.
pub const DEVICE_ID_PREFIX: &str = "device-";

/// Number of random alphanumeric characters following [`DEVICE_ID_PREFIX`].
const DEVICE_ID_TOKEN_LEN: usize = 9;

/// One of the two fixed hardware accessories that can pair with the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareVariant {
    /// TP-Link wired hardware.
    A,
    /// ATTINY85 wireless hardware.
    B,
}

impl HardwareVariant {
    /// Human-readable accessory name shown in the console.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::A => "TP-Link Wired Hardware",
            Self::B => "ATTINY85 Wireless Hardware",
        }
    }
}

/// Error returned when a string does not name a hardware variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown hardware variant '{0}' (expected a/tplink or b/attiny85)")]
pub struct UnknownVariant(pub String);

impl FromStr for HardwareVariant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "tplink" => Ok(Self::A),
            "b" | "attiny85" => Ok(Self::B),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// How the current link was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkType {
    AddressBased,
    HardwareVariantA,
    HardwareVariantB,
}

impl NetworkType {
    /// Short label shown in the status panel.
    pub fn label(self) -> &'static str {
        match self {
            Self::AddressBased => "dpn",
            Self::HardwareVariantA => "tplink",
            Self::HardwareVariantB => "attiny85",
        }
    }
}

impl From<HardwareVariant> for NetworkType {
    fn from(variant: HardwareVariant) -> Self {
        match variant {
            HardwareVariant::A => Self::HardwareVariantA,
            HardwareVariant::B => Self::HardwareVariantB,
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observable connection state owned by a session.
///
/// Starts all-empty and disconnected.  A successful address connection
/// overwrites it; there is no explicit teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub is_connected: bool,
    pub device_id: Option<String>,
    pub network_type: Option<NetworkType>,
    pub peer_count: u32,
}

/// Where a session currently sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Disconnected,
    Connecting,
    PairingPending,
    Connected,
}

/// Transient challenge that exists only while the PIN dialog is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingChallenge {
    variant: HardwareVariant,
    pending_pin: String,
}

impl PairingChallenge {
    /// Opens a challenge for `variant` with an empty pending PIN.
    pub fn new(variant: HardwareVariant) -> Self {
        Self {
            variant,
            pending_pin: String::new(),
        }
    }

    pub fn variant(&self) -> HardwareVariant {
        self.variant
    }

    /// The PIN most recently entered into the dialog (empty after a mismatch).
    pub fn pending_pin(&self) -> &str {
        &self.pending_pin
    }

    /// Records the PIN typed into the dialog.
    pub fn enter_pin(&mut self, pin: &str) {
        self.pending_pin.clear();
        self.pending_pin.push_str(pin);
    }

    /// Clears the entered PIN while keeping the dialog open.
    pub fn clear_pin(&mut self) {
        self.pending_pin.clear();
    }
}

/// Generates a fresh device identifier: [`DEVICE_ID_PREFIX`] followed by a
/// short random lowercase alphanumeric token.
///
/// The token is taken from a v4 UUID, so two sessions generating identifiers
/// at the same instant still receive independent values.
pub fn generate_device_id() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{DEVICE_ID_PREFIX}{}", &token[..DEVICE_ID_TOKEN_LEN])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
