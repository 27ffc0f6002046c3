//! PIN verification for hardware pairing.
//!
//! Each [`HardwareVariant`] is bound to a fixed 4-character secret.  The
//! secrets are injected at startup (from the config file or environment) and
//! never appear as literals in the verification logic.
//!
//! There is deliberately no attempt counter, lockout, or backoff here: a
//! mismatched PIN is reported and the caller may try again immediately.

use std::fmt;

use thiserror::Error;

use super::connection::HardwareVariant;

/// Required length of every pairing secret, in characters.
pub const PIN_LENGTH: usize = 4;

/// Errors raised while configuring or verifying pairing secrets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PairingError {
    /// The submitted PIN does not match the selected variant's secret.
    #[error("Invalid PIN")]
    InvalidPin,
    /// A configured secret does not have exactly [`PIN_LENGTH`] characters.
    #[error("secret for hardware variant {variant:?} must be {PIN_LENGTH} characters, got {len}")]
    MalformedSecret { variant: HardwareVariant, len: usize },
    /// Both variants were configured with the same secret.
    #[error("hardware variants A and B must use distinct secrets")]
    DuplicateSecrets,
}

/// The per-variant PIN secrets.
///
/// `Debug` is implemented by hand so secrets never end up in log output.
#[derive(Clone, PartialEq, Eq)]
pub struct PairingSecrets {
    variant_a: String,
    variant_b: String,
}

impl PairingSecrets {
    /// Validates and stores the two secrets.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::MalformedSecret`] if either secret is not
    /// exactly [`PIN_LENGTH`] characters, and [`PairingError::DuplicateSecrets`]
    /// if both are equal.
    pub fn new(
        variant_a: impl Into<String>,
        variant_b: impl Into<String>,
    ) -> Result<Self, PairingError> {
        let variant_a = variant_a.into();
        let variant_b = variant_b.into();
        check_length(HardwareVariant::A, &variant_a)?;
        check_length(HardwareVariant::B, &variant_b)?;
        if variant_a == variant_b {
            return Err(PairingError::DuplicateSecrets);
        }
        Ok(Self {
            variant_a,
            variant_b,
        })
    }

    fn secret_for(&self, variant: HardwareVariant) -> &str {
        match variant {
            HardwareVariant::A => &self.variant_a,
            HardwareVariant::B => &self.variant_b,
        }
    }
}

impl fmt::Debug for PairingSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairingSecrets")
            .field("variant_a", &"****")
            .field("variant_b", &"****")
            .finish()
    }
}

fn check_length(variant: HardwareVariant, secret: &str) -> Result<(), PairingError> {
    let len = secret.chars().count();
    if len != PIN_LENGTH {
        return Err(PairingError::MalformedSecret { variant, len });
    }
    Ok(())
}

/// Validates submitted PINs against the secret bound to a hardware variant.
#[derive(Debug, Clone)]
pub struct PairingAuthenticator {
    secrets: PairingSecrets,
}

impl PairingAuthenticator {
    pub fn new(secrets: PairingSecrets) -> Self {
        Self { secrets }
    }

    /// Checks `pin` against the secret for `variant`.  Only an exact match
    /// succeeds; surrounding whitespace is significant.
    ///
    /// # Errors
    ///
    /// Returns [`PairingError::InvalidPin`] on any mismatch.
    pub fn verify(&self, variant: HardwareVariant, pin: &str) -> Result<(), PairingError> {
        if pin == self.secrets.secret_for(variant) {
            Ok(())
        } else {
            Err(PairingError::InvalidPin)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
