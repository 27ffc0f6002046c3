//! Integration tests for the dpn-core public API.
//!
//! These tests exercise the validator, pairing rules, transfer stepping, and
//! cipher together through the crate-root re-exports, the same way the
//! console application consumes them.

use dpn_core::{
    generate_device_id, is_valid_ipv4, AesGcmCipher, Cipher, HardwareVariant, PairingAuthenticator,
    PairingChallenge, PairingError, PairingSecrets, TransferPhase, TransferState,
    DEVICE_ID_PREFIX,
};

// ── Address validator ─────────────────────────────────────────────────────────

/// Reference model: four groups, ASCII digits only, numeric value ≤ 255.
fn model_is_valid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('.').collect();
    groups.len() == 4
        && groups.iter().all(|g| {
            !g.is_empty()
                && g.bytes().all(|b| b.is_ascii_digit())
                && g.trim_start_matches('0').len() <= 3
                && g.parse::<u32>().map(|v| v <= 255).unwrap_or(false)
        })
}

#[test]
fn test_validator_examples() {
    assert!(is_valid_ipv4("192.168.1.1"));
    assert!(!is_valid_ipv4("256.1.1.1"));
    assert!(!is_valid_ipv4("1.2.3"));
    assert!(!is_valid_ipv4("1.2.3.4.5"));
}

#[test]
fn test_validator_agrees_with_model_over_generated_inputs() {
    // Build candidates from a small alphabet of group fragments so the cross
    // product covers separators, ranges, padding, and junk.
    let fragments = ["0", "1", "09", "255", "256", "999", "0255", "", "a", "-1", " 1"];
    let mut checked = 0;
    for a in fragments {
        for b in fragments {
            for c in ["1", "255", ""] {
                for tail in ["", ".7", ".7.8", ".300"] {
                    let candidate = format!("{a}.{b}.{c}{tail}");
                    assert_eq!(
                        is_valid_ipv4(&candidate),
                        model_is_valid(&candidate),
                        "disagreement on {candidate:?}"
                    );
                    checked += 1;
                }
            }
        }
    }
    assert!(checked > 1000);
}

#[test]
fn test_validator_matches_std_parser_for_canonical_addresses() {
    for candidate in ["0.0.0.0", "10.0.0.1", "172.16.254.3", "255.255.255.255"] {
        assert!(is_valid_ipv4(candidate));
        assert!(candidate.parse::<std::net::Ipv4Addr>().is_ok());
    }
}

// ── Pairing ───────────────────────────────────────────────────────────────────

#[test]
fn test_each_variant_accepts_only_its_own_secret() {
    let auth = PairingAuthenticator::new(PairingSecrets::new("1230", "3210").unwrap());

    assert_eq!(auth.verify(HardwareVariant::A, "1230"), Ok(()));
    assert_eq!(auth.verify(HardwareVariant::B, "3210"), Ok(()));
    assert_eq!(
        auth.verify(HardwareVariant::A, "3210"),
        Err(PairingError::InvalidPin)
    );
    assert_eq!(
        auth.verify(HardwareVariant::B, "1230"),
        Err(PairingError::InvalidPin)
    );
    assert_eq!(
        auth.verify(HardwareVariant::A, "0000"),
        Err(PairingError::InvalidPin)
    );
}

#[test]
fn test_new_challenge_starts_with_empty_pin() {
    let mut challenge = PairingChallenge::new(HardwareVariant::B);
    assert_eq!(challenge.pending_pin(), "");

    challenge.enter_pin("12");
    assert_eq!(challenge.pending_pin(), "12");
    challenge.clear_pin();
    assert_eq!(challenge.pending_pin(), "");
    assert_eq!(challenge.variant(), HardwareVariant::B);
}

// ── Transfer stepping ─────────────────────────────────────────────────────────

#[test]
fn test_started_run_steps_through_every_tenth_and_completes_on_tenth_step() {
    let mut state = TransferState::started();
    let mut seen = vec![state.progress];

    for step in 1..=10 {
        let completed = state.advance();
        seen.push(state.progress);
        assert_eq!(completed, step == 10, "step {step}");
    }

    assert_eq!(seen, (0..=100).step_by(10).collect::<Vec<u8>>());
    assert_eq!(state.phase, TransferPhase::Completed);
}

// ── Identity and crypto ───────────────────────────────────────────────────────

#[test]
fn test_device_ids_from_parallel_threads_do_not_collide() {
    let handles: Vec<_> = (0..8)
        .map(|_| std::thread::spawn(generate_device_id))
        .collect();
    let mut ids: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(ids.iter().all(|id| id.starts_with(DEVICE_ID_PREFIX)));
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}

#[test]
fn test_cipher_is_usable_through_trait_object() {
    let cipher: Box<dyn Cipher> = Box::new(AesGcmCipher::new());
    let sealed = cipher.encrypt("hello", "manual key").unwrap();
    assert_eq!(cipher.decrypt(&sealed, "manual key").unwrap(), "hello");
}
