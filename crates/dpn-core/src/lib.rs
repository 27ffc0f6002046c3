//! # dpn-core
//!
//! Shared library for the Secure DPN console containing the domain entities,
//! validation rules, pairing authentication, and the cryptographic primitive.
//!
//! This crate is used by the console application.  It has zero dependencies
//! on OS APIs, UI frameworks, network sockets, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A DPN ("Device-Paired Network") link is a simulated secure connection
//! between this machine and a remote peer.  It is established either by typing
//! the peer's IPv4 address or by pairing a hardware accessory that is gated by
//! a 4-character PIN.  Once connected, the link is exercised through simulated
//! file transfers, a single-slot file handoff, and ephemeral messaging.
//!
//! This crate (`dpn-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure business rules: the IPv4 address validator, the
//!   connection state and pairing challenge types, the PIN authenticator, the
//!   transfer progress state machine, and the handoff `FileRecord`.
//!
//! - **`crypto`** – The encryption primitive used by the encryption tool:
//!   256-bit key generation and AES-256-GCM encrypt/decrypt.

pub mod crypto;
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `dpn_core::ConnectionState` instead of `dpn_core::domain::connection::ConnectionState`.
pub use crypto::{generate_key, AesGcmCipher, Cipher, CryptoError};
pub use domain::address::{is_valid_ipv4, parse_ipv4};
pub use domain::connection::{
    generate_device_id, ConnectionState, HardwareVariant, NetworkType, PairingChallenge,
    SessionPhase, UnknownVariant, DEVICE_ID_PREFIX,
};
pub use domain::handoff::{guess_mime_type, FileRecord, NotAvailableReason};
pub use domain::pairing::{PairingAuthenticator, PairingError, PairingSecrets};
pub use domain::transfer::{TransferPhase, TransferState, TRANSFER_STEP};
