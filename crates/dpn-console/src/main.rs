//! Secure DPN Console entry point.
//!
//! Loads the configuration, wires the infrastructure adapters into
//! [`AppState`], and runs an interactive line-oriented console on stdin.
//!
//! # Usage
//!
//! ```text
//! dpn-console [OPTIONS]
//!
//! Options:
//!   --config <PATH>        Config file [default: platform config dir]
//!   --identity <EMAIL>     Identity for handoff slot calls
//!   --pin-a <PIN>          PIN of the TP-Link accessory
//!   --pin-b <PIN>          PIN of the ATTINY85 accessory
//!   --slot-path <PATH>     Handoff slot file
//!   --write-config         Write the effective config file and exit
//! ```
//!
//! Every option can also come from the environment (`DPN_CONFIG`,
//! `DPN_IDENTITY`, `DPN_PIN_A`, `DPN_PIN_B`, `DPN_SLOT_PATH`).  CLI args take
//! precedence over the environment, which takes precedence over the file.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ AppState::new()          -- session, tracker, handoff slot, …
//!  └─ background tasks
//!       ├─ diagnostic line printer
//!       └─ transfer progress printer
//!  └─ prompt loop              -- ConsoleCommand → ui_bridge command
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dpn_console::infrastructure::network::tcp_probe::{ProbeConfig, TcpProbeNetwork};
use dpn_console::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config_to, AppConfig,
};
use dpn_console::infrastructure::storage::slot_store::JsonFileSlotStore;
use dpn_console::infrastructure::ui_bridge::{self as bridge, console_command, AppState, CommandResult};
use dpn_console::infrastructure::ui_bridge::console_command::{ConsoleCommand, TextInput};
use dpn_core::TransferPhase;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Secure DPN console.
#[derive(Debug, Parser)]
#[command(name = "dpn-console", about = "Interactive Secure DPN console", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "DPN_CONFIG")]
    config: Option<PathBuf>,

    /// Identity used for handoff slot uploads and downloads.
    #[arg(long, env = "DPN_IDENTITY")]
    identity: Option<String>,

    /// PIN of the TP-Link wired accessory.
    #[arg(long, env = "DPN_PIN_A", hide_env_values = true)]
    pin_a: Option<String>,

    /// PIN of the ATTINY85 wireless accessory.
    #[arg(long, env = "DPN_PIN_B", hide_env_values = true)]
    pin_b: Option<String>,

    /// Path of the handoff slot file.
    #[arg(long, env = "DPN_SLOT_PATH")]
    slot_path: Option<PathBuf>,

    /// Write the effective configuration (file, env, and CLI merged) to the
    /// config file and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    /// Loads the config file and applies the CLI/env overrides on top.
    fn into_app_config(self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(self, config: &mut AppConfig) {
        if let Some(identity) = self.identity {
            config.console.identity = identity;
        }
        if let Some(pin) = self.pin_a {
            config.pairing.variant_a_pin = pin;
        }
        if let Some(pin) = self.pin_b {
            config.pairing.variant_b_pin = pin;
        }
        if let Some(path) = self.slot_path {
            config.storage.slot_path = Some(path);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Saves `config` to `target`, or to the platform config file when `None`.
fn write_config_file(config: &AppConfig, target: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let path = match target {
        Some(path) => path,
        None => config_file_path().context("failed to resolve config path")?,
    };
    save_config_to(config, &path)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let write_config = cli.write_config;
    let config_target = cli.config.clone();
    let config = cli.into_app_config()?;

    if write_config {
        let path = write_config_file(&config, config_target)?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    // `RUST_LOG` wins; otherwise the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.console.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let slot_path = config.slot_path().context("failed to resolve handoff slot path")?;
    info!("handoff slot at {}", slot_path.display());

    let network = Arc::new(TcpProbeNetwork::new(ProbeConfig {
        port: config.network.probe_port,
        timeout: config.connect_timeout(),
        scheme: config.network.endpoint_scheme.clone(),
    }));
    let store = Arc::new(JsonFileSlotStore::new(slot_path));
    let (state, mut diag_lines) =
        AppState::new(config, network, store).context("invalid configuration")?;

    // ── Diagnostic line printer ───────────────────────────────────────────────
    tokio::spawn(async move {
        while let Some(line) = diag_lines.recv().await {
            println!("[{}] {line}", chrono::Local::now().format("%H:%M:%S"));
        }
    });

    // ── Transfer progress printer ─────────────────────────────────────────────
    let mut transfer_rx = state.tracker.subscribe();
    tokio::spawn(async move {
        while transfer_rx.changed().await.is_ok() {
            let s = *transfer_rx.borrow_and_update();
            match s.phase {
                TransferPhase::Transferring => println!("  transfer {:>3}%", s.progress),
                TransferPhase::Completed => println!("  transfer complete"),
                TransferPhase::Cancelled => println!("  transfer cancelled at {}%", s.progress),
                TransferPhase::Pending => {}
            }
        }
    });

    println!("Secure DPN console. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl+C, shutting down");
                break;
            }
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        match ConsoleCommand::parse(&line) {
            Ok(ConsoleCommand::Quit) => break,
            Ok(cmd) => dispatch(Arc::clone(&state), cmd).await,
            Err(e) => println!("{e}"),
        }
    }

    info!("Secure DPN console stopped");
    Ok(())
}

/// Runs one command and prints its result.
async fn dispatch(state: Arc<AppState>, cmd: ConsoleCommand) {
    match cmd {
        ConsoleCommand::Status => print_status(bridge::get_status(state).await),
        ConsoleCommand::Connect(address) => {
            println!("connecting to {address}...");
            print_status(bridge::connect_by_address(state, &address).await);
        }
        ConsoleCommand::Pair(variant) => report(bridge::select_hardware(state, &variant).await, |name| {
            format!("pairing with {name}; enter the PIN with 'pin <code>'")
        }),
        ConsoleCommand::Pin(pin) => print_status(bridge::submit_pin(state, &pin).await),
        ConsoleCommand::CancelPairing => report(bridge::cancel_pairing(state).await, |closed| {
            (if *closed { "pairing cancelled" } else { "no pairing in progress" }).to_string()
        }),
        ConsoleCommand::Transfer(direction) => {
            report(bridge::start_transfer(state, direction).await, |_| {
                format!("{direction} started")
            })
        }
        ConsoleCommand::StopTransfer => report(bridge::cancel_transfer(state).await, |stopped| {
            (if *stopped { "cancelling transfer" } else { "no transfer running" }).to_string()
        }),
        ConsoleCommand::Progress => report(bridge::get_transfer(state).await, |t| {
            format!("{} {}%", t.phase, t.progress)
        }),
        ConsoleCommand::Upload(path) => report(bridge::upload_file(state, &path).await, |f| {
            format!("uploading \"{}\" ({} bytes, {})", f.name, f.size_bytes, f.mime_type)
        }),
        ConsoleCommand::Download => {
            // The notice only arrives after the transfer; keep the prompt free.
            tokio::spawn(async move {
                report(bridge::download_file(state).await, |d| d.notice.clone());
            });
        }
        ConsoleCommand::Withdraw => report(bridge::withdraw_file(state).await, |removed| {
            (if *removed { "your file was removed from the slot" } else { "no file of yours in the slot" })
                .to_string()
        }),
        ConsoleCommand::Message(text) => {
            report(bridge::post_message(state, &text).await, |posted| {
                (if *posted { "sent" } else { "empty message ignored" }).to_string()
            })
        }
        ConsoleCommand::Messages => report(bridge::get_messages(state).await, |messages| {
            if messages.is_empty() {
                "no messages".to_string()
            } else {
                messages
                    .iter()
                    .map(|m| format!("  {m}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }),
        ConsoleCommand::Diagnostics => {
            report(bridge::run_diagnostics(state).await, |_| "running diagnostics".to_string())
        }
        ConsoleCommand::WhoAmI(None) => report(bridge::get_identity(state).await, |id| id.clone()),
        ConsoleCommand::WhoAmI(Some(identity)) => {
            report(bridge::set_identity(state, &identity).await, |id| {
                format!("identity is now {id}")
            })
        }
        ConsoleCommand::Encrypt { input, key } => {
            let result = match input {
                TextInput::Inline(text) => bridge::encrypt_text(state, &text, key).await,
                TextInput::File(path) => bridge::encrypt_file(state, &path, key).await,
            };
            report(result, |e| {
                format!("ciphertext: {}\nkey:        {}", e.ciphertext, e.key)
            })
        }
        ConsoleCommand::Decrypt { key, input } => {
            let result = match input {
                TextInput::Inline(ciphertext) => bridge::decrypt_text(state, &key, &ciphertext).await,
                TextInput::File(path) => bridge::decrypt_file(state, &key, &path).await,
            };
            report(result, |p| format!("plaintext: {p}"))
        }
        ConsoleCommand::Help => println!("{}", console_command::HELP),
        ConsoleCommand::Quit => {}
    }
}

fn report<T: Serialize>(result: CommandResult<T>, render: impl FnOnce(&T) -> String) {
    match (result.data, result.error) {
        (Some(data), _) => println!("{}", render(&data)),
        (None, Some(error)) => println!("error: {error}"),
        (None, None) => warn!("command returned neither data nor error"),
    }
}

fn print_status(result: CommandResult<bridge::StatusDto>) {
    report(result, |s| {
        let mut out = format!(
            "Status:       {}\nDevice ID:    {}\nNetwork Type: {}\nPeers:        {}",
            if s.connected { "Connected" } else { "Disconnected" },
            s.device_id,
            s.network_type,
            s.peer_count,
        );
        if let Some(endpoint) = &s.endpoint {
            out.push_str(&format!("\nConnected to: {endpoint}"));
        }
        if let Some(accessory) = &s.pairing_with {
            out.push_str(&format!("\nAwaiting PIN: {accessory}"));
        }
        out
    });
}

// ── Tests ─────────────────────────────────────────────────────────────────────
