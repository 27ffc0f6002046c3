//! ConnectionSession: the connect-by-address and hardware-pairing state machine.
//!
//! The session exclusively owns the [`ConnectionState`] and the active
//! [`PairingChallenge`].  It offers two ways to reach `Connected`:
//!
//! - **Address path** – validate the IPv4 address, generate a device id, and
//!   ask the networking collaborator ([`DpnNetwork`]) to initialise.  On
//!   success the device id, `dpn` network type, and peer count are recorded.
//!   Each accepted attempt starts from an empty state, so on failure the
//!   session is left empty and `Disconnected`; the error is logged and
//!   nothing retries.
//!
//! - **Hardware path** – select a variant to open a PIN challenge, then
//!   submit PINs until one matches.  No identity is assigned on this path:
//!   the device id and peer count from any earlier state are left as they
//!   were.
//!
//! # Architecture
//!
//! The session depends only on the [`DpnNetwork`] trait and on domain types
//! from `dpn-core`.  The TCP implementation lives in the infrastructure layer
//! and is injected at construction time, so the session is fully unit-testable.
//!
//! Only one `initialize` can be outstanding per session: the address path
//! takes `&mut self` across the await.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dpn_core::{
    generate_device_id, is_valid_ipv4, ConnectionState, HardwareVariant, NetworkType,
    PairingAuthenticator, PairingChallenge, SessionPhase,
};
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors reported by the networking collaborator.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The peer could not be reached.
    #[error("peer {address} unreachable: {source}")]
    Unreachable {
        address: String,
        #[source]
        source: std::io::Error,
    },
    /// The peer did not answer in time.
    #[error("peer {address} did not respond within {after:?}")]
    Timeout { address: String, after: Duration },
    /// The address could not be turned into a socket address.
    #[error("invalid peer address {0}")]
    InvalidAddress(String),
}

/// The external networking collaborator.
///
/// Infrastructure implementations open real sockets; test implementations
/// record calls and return canned results.
#[async_trait]
pub trait DpnNetwork: Send + Sync {
    /// Initialises the link to `address` under the identity `device_id`.
    async fn initialize(&self, device_id: &str, address: &str) -> Result<(), NetworkError>;

    /// Number of peers currently reachable on the link.
    fn peer_count(&self) -> u32;

    /// Endpoint the link is attached to, for display.
    fn session_endpoint(&self) -> String;
}

/// Error type for session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The address is not a valid IPv4 dotted quad.  No state changed.
    #[error("Please enter a valid IP address")]
    Validation { address: String },
    /// The submitted PIN did not match.  The PIN dialog stays open.
    #[error("Invalid PIN")]
    Authentication,
    /// The networking collaborator failed to initialise.  The session is
    /// back to `Disconnected`.
    #[error("connection failed: {0}")]
    ConnectionFailure(#[source] NetworkError),
    /// The operation is not allowed in the current phase.
    #[error("cannot {operation} while {phase:?}")]
    InvalidState {
        operation: &'static str,
        phase: SessionPhase,
    },
}

/// Display snapshot of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub state: ConnectionState,
    pub endpoint: Option<String>,
    pub pairing_variant: Option<HardwareVariant>,
}

impl SessionStatus {
    /// Device id, or `"Not Assigned"` on the hardware path / before connecting.
    pub fn device_id_label(&self) -> &str {
        self.state.device_id.as_deref().unwrap_or("Not Assigned")
    }

    /// Network type label, or `"Not Connected"`.
    pub fn network_label(&self) -> &'static str {
        self.state
            .network_type
            .map(NetworkType::label)
            .unwrap_or("Not Connected")
    }
}

/// The connection/pairing state machine for one console session.
pub struct ConnectionSession {
    network: Arc<dyn DpnNetwork>,
    authenticator: PairingAuthenticator,
    phase: SessionPhase,
    state: ConnectionState,
    challenge: Option<PairingChallenge>,
    endpoint: Option<String>,
}

impl ConnectionSession {
    /// Creates a disconnected session with empty connection state.
    pub fn new(network: Arc<dyn DpnNetwork>, authenticator: PairingAuthenticator) -> Self {
        Self {
            network,
            authenticator,
            phase: SessionPhase::Disconnected,
            state: ConnectionState::default(),
            challenge: None,
            endpoint: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn challenge(&self) -> Option<&PairingChallenge> {
        self.challenge.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.phase == SessionPhase::Connected
    }

    /// Snapshot for the status panel.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase,
            state: self.state.clone(),
            endpoint: self.endpoint.clone(),
            pairing_variant: self.challenge.as_ref().map(PairingChallenge::variant),
        }
    }

    /// Connects to the peer at `address`.
    ///
    /// Once the address is accepted, the previous connection state and
    /// endpoint are reset before the collaborator is called; a failed attempt
    /// therefore leaves the session empty and `Disconnected`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Validation`] if `address` is not a valid IPv4 address
    ///   (no state change).
    /// - [`SessionError::InvalidState`] while a PIN challenge is open.
    /// - [`SessionError::ConnectionFailure`] if the collaborator fails; the
    ///   session returns to `Disconnected`.
    pub async fn begin_address_connection(&mut self, address: &str) -> Result<(), SessionError> {
        if !is_valid_ipv4(address) {
            return Err(SessionError::Validation {
                address: address.to_string(),
            });
        }
        if self.phase == SessionPhase::PairingPending {
            return Err(self.invalid("connect by address"));
        }

        self.phase = SessionPhase::Connecting;
        self.state = ConnectionState::default();
        self.endpoint = None;

        let device_id = generate_device_id();
        info!("connecting to {address} as {device_id}");

        match self.network.initialize(&device_id, address).await {
            Ok(()) => {
                self.state = ConnectionState {
                    is_connected: true,
                    device_id: Some(device_id),
                    network_type: Some(NetworkType::AddressBased),
                    peer_count: self.network.peer_count(),
                };
                self.endpoint = Some(self.network.session_endpoint());
                self.phase = SessionPhase::Connected;
                info!(
                    "connected to {address} ({} peer(s))",
                    self.state.peer_count
                );
                Ok(())
            }
            Err(e) => {
                error!("connection error: {e}");
                self.phase = SessionPhase::Disconnected;
                Err(SessionError::ConnectionFailure(e))
            }
        }
    }

    /// Opens a PIN challenge for `variant`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the session is
    /// `Disconnected`.
    pub fn select_hardware_variant(&mut self, variant: HardwareVariant) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Disconnected {
            return Err(self.invalid("select hardware"));
        }
        self.challenge = Some(PairingChallenge::new(variant));
        self.phase = SessionPhase::PairingPending;
        info!("pairing with {}", variant.display_name());
        Ok(())
    }

    /// Submits `pin` for the open challenge.
    ///
    /// On a match the challenge is discarded and the session becomes
    /// `Connected` with the variant's network type.  On a mismatch the
    /// challenge stays open with its entered PIN cleared.  There is no attempt
    /// limit.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Authentication`] on a mismatch.
    /// - [`SessionError::InvalidState`] when no challenge is open.
    pub fn submit_pin(&mut self, pin: &str) -> Result<(), SessionError> {
        let Some(challenge) = self.challenge.as_mut() else {
            return Err(self.invalid("submit PIN"));
        };
        challenge.enter_pin(pin);
        let variant = challenge.variant();

        if self
            .authenticator
            .verify(variant, challenge.pending_pin())
            .is_err()
        {
            challenge.clear_pin();
            warn!("invalid PIN for {}", variant.display_name());
            return Err(SessionError::Authentication);
        }

        self.challenge = None;
        self.state.is_connected = true;
        self.state.network_type = Some(NetworkType::from(variant));
        self.phase = SessionPhase::Connected;
        info!("paired with {}", variant.display_name());
        Ok(())
    }

    /// Closes the PIN dialog and returns to `Disconnected`.
    ///
    /// Returns `false` if no challenge was open.
    pub fn cancel_pairing(&mut self) -> bool {
        if self.challenge.take().is_none() {
            return false;
        }
        self.phase = SessionPhase::Disconnected;
        info!("pairing cancelled");
        true
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            phase: self.phase,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
