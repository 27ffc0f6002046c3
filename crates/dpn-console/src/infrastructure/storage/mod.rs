//! Storage infrastructure: configuration file and handoff slot persistence.
//!
//! - **`config`** – Reads the TOML configuration file from the
//!   platform-appropriate directory, with defaults for everything on first run.
//! - **`slot_store`** – The JSON-file and in-memory implementations of the
//!   handoff slot's [`SlotStore`](crate::application::handoff_slot::SlotStore)
//!   port.

pub mod config;
pub mod slot_store;
