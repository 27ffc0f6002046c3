//! Infrastructure layer for the console.
//!
//! Contains OS-facing adapters: the TCP probe networking collaborator,
//! file-system storage (configuration and the handoff slot), and the command
//! bridge the terminal front end calls into.
//!
//! **Dependency rule**: this layer may depend on `application` and `dpn_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod network;
pub mod storage;
pub mod ui_bridge;
