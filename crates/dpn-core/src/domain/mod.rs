//! Domain entities for the Secure DPN console.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from OS APIs, network libraries, storage drivers, or UI
//!   frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Here the rules are: what counts as a valid peer address, which PIN unlocks
//! which hardware accessory, how a transfer advances from 0 to 100, and what a
//! handed-off file record looks like.  The application layer in
//! `dpn-console` drives these rules over time; the domain never sleeps, never
//! spawns, and never touches the disk.

/// IPv4 dotted-quad validation for address-based connections.
pub mod address;

/// Connection state, hardware variants, and the pairing challenge.
pub mod connection;

/// The single-slot handoff record and MIME type guessing.
pub mod handoff;

/// PIN verification against injected per-variant secrets.
pub mod pairing;

/// Transfer progress state machine.
pub mod transfer;
