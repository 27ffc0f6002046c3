//! IPv4 dotted-quad validation.
//!
//! The console only accepts a peer address that is *syntactically* an IPv4
//! dotted quad: exactly four `.`-separated groups, each a run of ASCII decimal
//! digits whose numeric value lies in `0..=255`.
//!
//! # Why not `std::net::Ipv4Addr::from_str`?
//!
//! The standard library parser rejects octets with leading zeros (`"010"`),
//! because some platforms interpret them as octal.  Peer addresses typed into
//! the console are compared by numeric value only, so `"192.168.001.001"` is
//! accepted here and means the same host as `"192.168.1.1"`.

use std::net::Ipv4Addr;

/// Number of groups in a dotted quad.
const GROUP_COUNT: usize = 4;

/// Returns `true` if `candidate` is a syntactically valid IPv4 dotted quad.
///
/// This is a pure, total predicate: it never panics and has no failure mode
/// other than returning `false`.
///
/// # Examples
///
/// ```rust
/// use dpn_core::is_valid_ipv4;
///
/// assert!(is_valid_ipv4("192.168.1.1"));
/// assert!(!is_valid_ipv4("256.1.1.1"));
/// assert!(!is_valid_ipv4("1.2.3"));
/// ```
pub fn is_valid_ipv4(candidate: &str) -> bool {
    parse_ipv4(candidate).is_some()
}

/// Parses `candidate` under the same rules as [`is_valid_ipv4`], returning the
/// address it denotes.  Leading zeros are dropped, so `"010.0.0.1"` yields
/// `10.0.0.1`.
pub fn parse_ipv4(candidate: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; GROUP_COUNT];
    let mut groups = 0usize;
    for group in candidate.split('.') {
        if groups == GROUP_COUNT {
            return None;
        }
        octets[groups] = parse_octet(group)?;
        groups += 1;
    }
    (groups == GROUP_COUNT).then(|| Ipv4Addr::from(octets))
}

/// Parses one dotted-quad group: non-empty, digits only, value ≤ 255.
fn parse_octet(group: &str) -> Option<u8> {
    if group.is_empty() || !group.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Leading zeros carry no value; strip them before the range check so an
    // arbitrarily long run of zeros cannot overflow the accumulator.
    let significant = group.trim_start_matches('0');
    if significant.len() > 3 {
        return None;
    }
    let value = significant
        .bytes()
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
    u8::try_from(value).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_typical_private_address() {
        assert!(is_valid_ipv4("192.168.1.1"));
    }

    #[test]
    fn test_accepts_boundary_octets() {
        assert!(is_valid_ipv4("0.0.0.0"));
        assert!(is_valid_ipv4("255.255.255.255"));
    }

    #[test]
    fn test_rejects_octet_above_255() {
        assert!(!is_valid_ipv4("256.1.1.1"));
        assert!(!is_valid_ipv4("1.1.1.300"));
    }

    #[test]
    fn test_rejects_wrong_group_count() {
        assert!(!is_valid_ipv4("1.2.3"));
        assert!(!is_valid_ipv4("1.2.3.4.5"));
        assert!(!is_valid_ipv4("1"));
    }

    #[test]
    fn test_rejects_empty_groups() {
        assert!(!is_valid_ipv4(""));
        assert!(!is_valid_ipv4("..."));
        assert!(!is_valid_ipv4("1..2.3"));
        assert!(!is_valid_ipv4("1.2.3."));
        assert!(!is_valid_ipv4(".1.2.3"));
    }

    #[test]
    fn test_rejects_extraneous_characters() {
        assert!(!is_valid_ipv4("1.2.3.4 "));
        assert!(!is_valid_ipv4(" 1.2.3.4"));
        assert!(!is_valid_ipv4("1.2.3.a"));
        assert!(!is_valid_ipv4("+1.2.3.4"));
        assert!(!is_valid_ipv4("1.-2.3.4"));
        assert!(!is_valid_ipv4("1.2.3.4/24"));
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        // Arabic-Indic digit one (U+0661) is a Unicode digit but not ASCII.
        assert!(!is_valid_ipv4("\u{0661}.2.3.4"));
    }

    #[test]
    fn test_accepts_leading_zeros_by_numeric_value() {
        assert!(is_valid_ipv4("192.168.001.001"));
        assert!(is_valid_ipv4("000.00.0.0255"));
    }

    #[test]
    fn test_long_zero_prefix_does_not_overflow() {
        let group = format!("{}255", "0".repeat(64));
        assert!(is_valid_ipv4(&format!("{group}.1.1.1")));
        let too_big = format!("{}256", "0".repeat(64));
        assert!(!is_valid_ipv4(&format!("{too_big}.1.1.1")));
    }

    #[test]
    fn test_rejects_four_significant_digits() {
        assert!(!is_valid_ipv4("1000.1.1.1"));
    }

    #[test]
    fn test_parse_ipv4_normalises_leading_zeros() {
        assert_eq!(
            parse_ipv4("192.168.001.010"),
            Some(Ipv4Addr::new(192, 168, 1, 10))
        );
        assert_eq!(parse_ipv4("1.2.3.4.5"), None);
    }
}
