//! Parsing of the lines typed at the console prompt.
//!
//! Each line is one command word followed by its arguments:
//!
//! ```text
//! connect 192.168.1.10       pair tplink        pin 1230
//! upload ./report.pdf        msg hello there    encrypt --key k1 secret text
//! encrypt --file notes.txt   decrypt k1 --file notes.enc
//! ```
//!
//! Free-text arguments (`msg`, `encrypt`) keep everything after the command
//! word, including inner spaces.  A message is taken verbatim: only the one
//! separator after `msg` is dropped.

use std::path::PathBuf;

use thiserror::Error;

use crate::application::track_transfer::TransferDirection;

/// Help text printed by the `help` command.
pub const HELP: &str = "\
commands:
  status                      show network status
  connect <ipv4>              connect to a peer by address
  pair <a|tplink|b|attiny85>  pair a hardware accessory
  pin <code>                  submit the accessory PIN
  cancel                      close the PIN dialog
  send | receive              start a transfer (connected only)
  stop                        cancel the running transfer
  progress                    show transfer progress
  upload <path>               publish a file to the handoff slot
  download                    fetch the handoff slot file
  withdraw                    remove your own file from the handoff slot
  msg <text>                  post a message
  messages                    list messages
  diag                        run the diagnostic console
  whoami [identity]           show or switch identity
  encrypt [--key <k>] <text>  encrypt text (random key if none given)
  encrypt [--key <k>] --file <path>
                              encrypt the text of a file
  decrypt <key> <ciphertext>  decrypt text
  decrypt <key> --file <path> decrypt ciphertext stored in a file
  help                        show this help
  quit                        exit";

/// Where the text for `encrypt`/`decrypt` comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    /// Typed at the prompt.
    Inline(String),
    /// Read from a text file.
    File(PathBuf),
}

/// One parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Status,
    Connect(String),
    Pair(String),
    Pin(String),
    CancelPairing,
    Transfer(TransferDirection),
    StopTransfer,
    Progress,
    Upload(PathBuf),
    Download,
    Withdraw,
    Message(String),
    Messages,
    Diagnostics,
    WhoAmI(Option<String>),
    Encrypt { input: TextInput, key: Option<String> },
    Decrypt { key: String, input: TextInput },
    Help,
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (type 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl ConsoleCommand {
    /// Parses one input line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim_start();
        let (word, raw_rest) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));
        let rest = raw_rest.trim();
        if word.is_empty() {
            return Err(ParseError::Empty);
        }

        let cmd = match word.to_ascii_lowercase().as_str() {
            "status" => Self::Status,
            "connect" => Self::Connect(single(rest, "connect <ipv4>")?),
            "pair" => Self::Pair(single(rest, "pair <a|tplink|b|attiny85>")?),
            "pin" => Self::Pin(single(rest, "pin <code>")?),
            "cancel" => Self::CancelPairing,
            "send" => Self::Transfer(TransferDirection::Send),
            "receive" => Self::Transfer(TransferDirection::Receive),
            "stop" => Self::StopTransfer,
            "progress" => Self::Progress,
            "upload" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("upload <path>"));
                }
                Self::Upload(PathBuf::from(rest))
            }
            "download" => Self::Download,
            "withdraw" => Self::Withdraw,
            "msg" => {
                if rest.is_empty() {
                    return Err(ParseError::Usage("msg <text>"));
                }
                Self::Message(raw_rest.to_string())
            }
            "messages" => Self::Messages,
            "diag" => Self::Diagnostics,
            "whoami" => Self::WhoAmI((!rest.is_empty()).then(|| rest.to_string())),
            "encrypt" => parse_encrypt(rest)?,
            "decrypt" => parse_decrypt(rest)?,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => return Err(ParseError::Unknown(word.to_string())),
        };
        Ok(cmd)
    }
}

/// Exactly one whitespace-free argument.
fn single(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Ok(arg.to_string()),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// `--file <path>` or free text.  The path runs to the end of the line.
fn text_input(rest: &str, usage: &'static str) -> Result<TextInput, ParseError> {
    if let Some(after) = rest.strip_prefix("--file") {
        let path = after.trim();
        if path.is_empty() || !after.starts_with(char::is_whitespace) {
            return Err(ParseError::Usage(usage));
        }
        return Ok(TextInput::File(PathBuf::from(path)));
    }
    if rest.is_empty() {
        return Err(ParseError::Usage(usage));
    }
    Ok(TextInput::Inline(rest.to_string()))
}

fn parse_encrypt(rest: &str) -> Result<ConsoleCommand, ParseError> {
    const USAGE: &str = "encrypt [--key <k>] <text> | encrypt [--key <k>] --file <path>";
    let (key, rest) = match rest.strip_prefix("--key") {
        Some(after) => {
            let after = after.trim_start();
            let (key, rest) = after
                .split_once(char::is_whitespace)
                .ok_or(ParseError::Usage(USAGE))?;
            (Some(key.to_string()), rest.trim())
        }
        None => (None, rest),
    };
    Ok(ConsoleCommand::Encrypt {
        input: text_input(rest, USAGE)?,
        key,
    })
}

fn parse_decrypt(rest: &str) -> Result<ConsoleCommand, ParseError> {
    const USAGE: &str = "decrypt <key> <ciphertext> | decrypt <key> --file <path>";
    let (key, rest) = rest
        .split_once(char::is_whitespace)
        .ok_or(ParseError::Usage(USAGE))?;
    let input = text_input(rest.trim(), USAGE)?;
    if let TextInput::Inline(ciphertext) = &input {
        if ciphertext.split_whitespace().count() != 1 {
            return Err(ParseError::Usage(USAGE));
        }
    }
    Ok(ConsoleCommand::Decrypt {
        key: key.to_string(),
        input,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
