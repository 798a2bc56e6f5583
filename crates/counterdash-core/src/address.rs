//! Address normalization and display formatting.
//!
//! Starknet addresses are felts. Depending on where they come from they show
//! up as big integers, `0x` hex strings with or without leading zeros, or
//! decimal strings. Equality is decided on the canonical form: 64 lowercase
//! hex digits, zero-padded, no prefix.
//!
//! The ownership check built on this is a UX hint only. The contract
//! enforces authorization on-chain.

use crate::value::{BigInt, RawValue};
use alloy_primitives::U256;

/// Width of a felt in hex characters (32 bytes).
pub const FELT_HEX_WIDTH: usize = 64;

/// Canonical form of an address, or `""` when no address is present.
pub fn normalize(input: &RawValue) -> String {
    if input.is_absent() {
        return String::new();
    }
    if let Some(int) = input.as_integer() {
        return pad_felt(format!("{:x}", int.magnitude()));
    }
    match input {
        RawValue::Str(s) => normalize_str(s),
        other => normalize_str(&other.to_display_string()),
    }
}

fn normalize_str(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return pad_felt(rest.to_lowercase());
    }
    // An unprefixed run of decimal digits is a decimal felt, unless it is
    // already canonical width, which is read as hex.
    if s.len() != FELT_HEX_WIDTH && s.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(v) = U256::from_str_radix(s, 10) {
            return pad_felt(format!("{v:x}"));
        }
    }
    pad_felt(s.to_lowercase())
}

fn pad_felt(hex: String) -> String {
    format!("{hex:0>width$}", width = FELT_HEX_WIDTH)
}

/// Address equality on canonical forms. Two absent (falsy) addresses never
/// match each other.
pub fn equals(a: &RawValue, b: &RawValue) -> bool {
    if !a.is_truthy() && !b.is_truthy() {
        return false;
    }
    normalize(a) == normalize(b)
}

/// Whether the connected account owns the contract. Requires both addresses
/// to be present.
pub fn is_owner(current: &RawValue, owner: &RawValue) -> bool {
    current.is_truthy() && owner.is_truthy() && equals(current, owner)
}

/// `0x`-prefixed display form used for initiators, owners and transaction
/// hashes.
///
/// Absent values render as `"Unknown"`. Integers and numeric strings are
/// re-rendered in hex; strings already starting with `0x` pass through
/// untouched; anything unparseable is shown as-is.
pub fn format_hex(input: &RawValue) -> String {
    if !input.is_truthy() {
        return "Unknown".to_string();
    }
    if let RawValue::BigInt(b) = input {
        return format!("0x{}", b.to_hex());
    }
    let s = input.to_display_string();
    if s.starts_with("0x") {
        return s;
    }
    match parse_integer_literal(&s) {
        Some(v) => format!("0x{}", v.to_hex()),
        None => s,
    }
}

/// Abbreviated address for headers: `0x1234...abcd`.
pub fn shorten(input: &RawValue) -> String {
    if !input.is_truthy() {
        return "Loading...".to_string();
    }
    let full = match input {
        RawValue::BigInt(b) => format!("0x{}", b.to_hex()),
        other => other.to_display_string(),
    };
    let chars: Vec<char> = full.chars().collect();
    let head: String = chars.iter().take(6).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{head}...{tail}")
}

/// Lenient integer literal parsing:
/// surrounding whitespace is ignored, blank input is zero, `0x`/`0o`/`0b`
/// prefixes select the radix, and only plain decimals may carry a sign.
fn parse_integer_literal(s: &str) -> Option<BigInt> {
    let t = s.trim();
    if t.is_empty() {
        return Some(BigInt::ZERO);
    }
    let prefixed = |p: [&str; 2], radix: u64| -> Option<Option<BigInt>> {
        let digits = t.strip_prefix(p[0]).or_else(|| t.strip_prefix(p[1]))?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix as u32)) {
            return Some(None);
        }
        Some(U256::from_str_radix(digits, radix).ok().map(BigInt::from_u256))
    };
    if let Some(v) = prefixed(["0x", "0X"], 16) {
        return v;
    }
    if let Some(v) = prefixed(["0o", "0O"], 8) {
        return v;
    }
    if let Some(v) = prefixed(["0b", "0B"], 2) {
        return v;
    }
    BigInt::parse_decimal(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OWNER: &str = "0x04a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f";

    #[test]
    fn absent_normalizes_to_empty() {
        assert_eq!(normalize(&RawValue::Undefined), "");
        assert_eq!(normalize(&RawValue::Null), "");
        assert_eq!(normalize(&RawValue::from("")), "");
    }

    #[test]
    fn zero_address_is_not_absent() {
        assert_eq!(normalize(&RawValue::from(0u64)), "0".repeat(64));
    }

    #[test]
    fn integer_hex_and_decimal_forms_agree() {
        let n = 0xabcdefu64;
        let expected = normalize(&RawValue::from(n));
        assert_eq!(expected.len(), 64);
        assert!(expected.ends_with("abcdef"));
        assert_eq!(normalize(&RawValue::from("0xABCDEF")), expected);
        assert_eq!(normalize(&RawValue::from("0x0000abcdef")), expected);
        assert_eq!(normalize(&RawValue::from(n.to_string())), expected);
        assert_eq!(normalize(&RawValue::Number(n as f64)), expected);
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        for input in ["0x123", "0x0000000000000000000000000000000000000000000000000000000000000999", OWNER] {
            let canonical = normalize(&RawValue::from(input));
            assert_eq!(normalize(&RawValue::from(canonical.as_str())), canonical);
            assert!(equals(&RawValue::from(canonical.as_str()), &RawValue::from(input)));
        }
        assert!(normalize(&RawValue::from("0x123")).ends_with("0123"));
    }

    #[test]
    fn only_one_prefix_is_stripped() {
        assert_eq!(normalize(&RawValue::from("0x0xab")), format!("{:0>64}", "0xab"));
    }

    #[test]
    fn garbage_is_deterministic() {
        let a = normalize(&RawValue::from("Not-An-Address"));
        assert_eq!(a, normalize(&RawValue::from("not-an-address")));
        assert!(a.ends_with("not-an-address"));
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_forms() {
        let once = normalize(&RawValue::from(OWNER));
        assert_eq!(normalize(&RawValue::from(once.clone())), once);
    }

    #[test]
    fn equals_is_case_and_padding_insensitive() {
        assert!(equals(&RawValue::from("0xABC"), &RawValue::from("0x0abc")));
        assert!(equals(
            &RawValue::from(OWNER),
            &RawValue::from(OWNER.to_uppercase().replacen("0X", "0x", 1))
        ));
    }

    #[test]
    fn absent_never_matches_absent() {
        assert!(!equals(&RawValue::Undefined, &RawValue::Undefined));
        assert!(!equals(&RawValue::Null, &RawValue::from("")));
        assert!(!equals(&RawValue::Undefined, &RawValue::from("0x1")));
    }

    #[test]
    fn owner_check_requires_both_sides() {
        let owner = RawValue::from(OWNER);
        assert!(is_owner(&RawValue::from(OWNER), &owner));
        assert!(!is_owner(&RawValue::Undefined, &owner));
        assert!(!is_owner(&RawValue::from("0x1"), &owner));
    }

    #[test]
    fn format_hex_cases() {
        assert_eq!(format_hex(&RawValue::Undefined), "Unknown");
        assert_eq!(format_hex(&RawValue::from(0u64)), "Unknown");
        assert_eq!(format_hex(&RawValue::from(255u64)), "0xff");
        assert_eq!(format_hex(&RawValue::from("0xABC")), "0xABC");
        assert_eq!(format_hex(&RawValue::from("4096")), "0x1000");
        assert_eq!(format_hex(&RawValue::from("0XFF")), "0xff");
        assert_eq!(format_hex(&RawValue::from("alice")), "alice");
        assert_eq!(format_hex(&RawValue::from(json!({"a": 1}))), "[object Object]");
    }

    #[test]
    fn shorten_cases() {
        assert_eq!(shorten(&RawValue::Null), "Loading...");
        assert_eq!(shorten(&RawValue::from(OWNER)), "0x04a1...7e8f");
        assert_eq!(shorten(&RawValue::from(0xdeadbeefu64)), "0xdead...beef");
    }
}
