//! Network infrastructure for the console.
//!
//! # Sub-modules
//!
//! - **`tcp_probe`** – The [`DpnNetwork`](crate::application::connect_session::DpnNetwork)
//!   implementation used by the binary.  It checks that the peer accepts a TCP
//!   connection on the configured probe port and reports the session endpoint.

pub mod tcp_probe;
