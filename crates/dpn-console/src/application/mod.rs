//! Application layer use cases for the DPN console.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules in `dpn-core`) and the infrastructure (sockets, files,
//! the terminal).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "pair with
//!   the TP-Link accessory once the right PIN is typed").
//! - **Depend on abstractions** (traits such as [`connect_session::DpnNetwork`]
//!   and [`handoff_slot::SlotStore`]) rather than concrete implementations.
//! - **Contain no OS calls**.  Timers are the one exception: the transfer
//!   tracker and diagnostic console run on Tokio tasks.
//!
//! # Sub-modules
//!
//! - **`connect_session`** – The connection/pairing state machine: connect by
//!   IPv4 address through the networking collaborator, or pair a hardware
//!   accessory by PIN.
//!
//! - **`track_transfer`** – Drives the single simulated transfer from 0 to
//!   100 in steps of 10.
//!
//! - **`handoff_slot`** – The one-record file handoff between an uploader and
//!   a different downloader.
//!
//! - **`message_log`** – Append-only list of chat messages.
//!
//! - **`diagnostics`** – The scripted diagnostic console.
//!
//! - **`encryption`** – Text encryption tool on top of the cipher primitive.
//!
//! - **`task`** – Cancellable, single-flight timer tasks shared by the
//!   tracker and the diagnostic console.

pub mod connect_session;
pub mod diagnostics;
pub mod encryption;
pub mod handoff_slot;
pub mod message_log;
pub mod task;
pub mod track_transfer;
