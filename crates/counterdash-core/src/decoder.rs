//! Display decoding for contract values of unknown shape.
//!
//! `decode` turns any [`RawValue`] into a display string by running an
//! ordered list of shape matchers; the first one that recognises the value
//! wins. It never fails. When a value carries no recognisable number the
//! result degrades to a diagnostic string (`{key, key}`, `Empty Object`).
//!
//! u256 values split into `{low, high}` are displayed from `low` alone.
//! That loses the high limb for values of 2^128 and above; callers that need
//! the full value use [`decode_strict`], which fails loudly instead.

use crate::error::DecodeError;
use crate::reason::ChangeReason;
use crate::value::{BigInt, RawObject, RawValue, OBJECT_PLACEHOLDER};
use alloy_primitives::U256;

/// Shown when there is no value at all.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown for an object with no keys and no usable conversion.
pub const EMPTY_OBJECT: &str = "Empty Object";

/// Field names probed, in order, on object-shaped values.
const WRAPPER_FIELDS: [&str; 6] = ["value", "low", "words", "inner", "val", "_value"];

/// Marker flag set by big-number wrapper objects.
const BIG_NUMBER_MARKER: &str = "_isBigNumber";

/// Which shape matcher produced a decoded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeRule {
    Absent,
    BigInt,
    Primitive,
    WrapperField(&'static str),
    BigNumberMarker,
    CustomDisplay,
    PrimitiveConversion,
    KeyListing,
    EmptyObject,
}

impl DecodeRule {
    /// `true` when no numeric value was found and the output is a
    /// diagnostic placeholder.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            DecodeRule::Absent | DecodeRule::KeyListing | DecodeRule::EmptyObject
        )
    }
}

/// A display string together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub rule: DecodeRule,
}

type Matcher = fn(&RawValue) -> Option<Decoded>;

/// Shape matchers in priority order.
const MATCHERS: [Matcher; 8] = [
    match_absent,
    match_bigint,
    match_primitive,
    match_wrapper_field,
    match_big_number_marker,
    match_custom_display,
    match_primitive_conversion,
    match_key_listing,
];

/// Decode a value for display. Total: always returns a string.
pub fn decode(value: &RawValue) -> String {
    decode_traced(value).text
}

/// Like [`decode`], also reporting which rule matched.
pub fn decode_traced(value: &RawValue) -> Decoded {
    let decoded = MATCHERS
        .iter()
        .find_map(|matcher| matcher(value))
        .unwrap_or_else(|| Decoded {
            text: EMPTY_OBJECT.to_string(),
            rule: DecodeRule::EmptyObject,
        });
    if decoded.rule.is_fallback() && !value.is_absent() {
        tracing::warn!(rule = ?decoded.rule, text = %decoded.text, "value decoded to fallback");
    }
    decoded
}

fn hit(text: String, rule: DecodeRule) -> Option<Decoded> {
    Some(Decoded { text, rule })
}

fn match_absent(v: &RawValue) -> Option<Decoded> {
    v.is_absent()
        .then(|| Decoded {
            text: NOT_AVAILABLE.to_string(),
            rule: DecodeRule::Absent,
        })
}

fn match_bigint(v: &RawValue) -> Option<Decoded> {
    match v {
        RawValue::BigInt(b) => hit(b.to_string(), DecodeRule::BigInt),
        _ => None,
    }
}

fn match_primitive(v: &RawValue) -> Option<Decoded> {
    match v {
        RawValue::Str(_) | RawValue::Number(_) | RawValue::Bool(_) => {
            hit(v.to_display_string(), DecodeRule::Primitive)
        }
        _ => None,
    }
}

fn match_wrapper_field(v: &RawValue) -> Option<Decoded> {
    let obj = v.as_object()?;
    for field in WRAPPER_FIELDS {
        let Some(inner) = obj.get_defined(field) else {
            continue;
        };
        if field == "words" {
            let RawValue::Array(words) = inner else {
                continue;
            };
            let text = match words.first() {
                Some(first) if first.is_truthy() => first.to_display_string(),
                _ => "0".to_string(),
            };
            return hit(text, DecodeRule::WrapperField(field));
        }
        return hit(inner.to_display_string(), DecodeRule::WrapperField(field));
    }
    None
}

fn match_big_number_marker(v: &RawValue) -> Option<Decoded> {
    let obj = v.as_object()?;
    obj.get(BIG_NUMBER_MARKER)
        .filter(|flag| flag.is_truthy())
        .and_then(|_| hit(obj.display_string(), DecodeRule::BigNumberMarker))
}

fn match_custom_display(v: &RawValue) -> Option<Decoded> {
    let text = match v {
        RawValue::Object(o) => o.display_string(),
        RawValue::Array(_) => v.to_display_string(),
        _ => return None,
    };
    (text != OBJECT_PLACEHOLDER)
        .then_some(text)
        .and_then(|text| hit(text, DecodeRule::CustomDisplay))
}

fn match_primitive_conversion(v: &RawValue) -> Option<Decoded> {
    let primitive = v.as_object()?.custom_primitive()?;
    match primitive {
        RawValue::Str(_) | RawValue::Number(_) | RawValue::BigInt(_) => {
            hit(primitive.to_display_string(), DecodeRule::PrimitiveConversion)
        }
        _ => None,
    }
}

fn match_key_listing(v: &RawValue) -> Option<Decoded> {
    let keys = v.keys();
    if keys.is_empty() {
        return None;
    }
    hit(format!("{{{}}}", keys.join(", ")), DecodeRule::KeyListing)
}

// ─── Strict decoding ─────────────────────────────────────────────────────────

/// Bits per limb in a `words` array (bn.js layout).
const WORD_BITS: usize = 26;

/// Full-precision decode into an unsigned 256-bit integer.
///
/// Accepts the same shapes as [`decode`] but combines u256 `{low, high}`
/// limbs and multi-word arrays instead of dropping the upper part, and
/// returns an error for anything that is not an unsigned integer.
pub fn decode_strict(value: &RawValue) -> Result<U256, DecodeError> {
    let result = match value {
        RawValue::Undefined | RawValue::Null => Err(DecodeError::Absent),
        RawValue::BigInt(b) => unsigned(*b),
        RawValue::Number(_) => match value.as_integer() {
            Some(b) => unsigned(b),
            None => Err(DecodeError::NotAnInteger {
                value: value.to_display_string(),
            }),
        },
        RawValue::Str(s) => parse_unsigned(s),
        RawValue::Bool(_) | RawValue::Array(_) => Err(DecodeError::NotAnInteger {
            value: value.to_display_string(),
        }),
        RawValue::Object(obj) => strict_object(obj),
    };
    if let Err(e) = &result {
        tracing::debug!(error = %e, "strict decode failed");
    }
    result
}

fn unsigned(b: BigInt) -> Result<U256, DecodeError> {
    if b.is_negative() {
        return Err(DecodeError::Negative {
            value: b.to_string(),
        });
    }
    Ok(b.magnitude())
}

fn parse_unsigned(s: &str) -> Result<U256, DecodeError> {
    let t = s.trim();
    let not_integer = || DecodeError::NotAnInteger {
        value: s.to_string(),
    };
    if let Some(digits) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(not_integer());
        }
        return U256::from_str_radix(digits, 16).map_err(|_| DecodeError::Overflow);
    }
    if t.starts_with('-') {
        return match BigInt::parse_decimal(t) {
            Some(b) => unsigned(b),
            None => Err(not_integer()),
        };
    }
    if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
        return Err(not_integer());
    }
    U256::from_str_radix(t, 10).map_err(|_| DecodeError::Overflow)
}

fn strict_object(obj: &RawObject) -> Result<U256, DecodeError> {
    if let (Some(low), Some(high)) = (obj.get_defined("low"), obj.get_defined("high")) {
        let low = limb(low, "low", 128)?;
        let high = limb(high, "high", 128)?;
        return Ok(low + (high << 128));
    }
    for field in WRAPPER_FIELDS {
        let Some(inner) = obj.get_defined(field) else {
            continue;
        };
        if field == "words" {
            let RawValue::Array(words) = inner else {
                continue;
            };
            return combine_words(words);
        }
        return decode_strict(inner);
    }
    if obj.get(BIG_NUMBER_MARKER).is_some_and(RawValue::is_truthy) || obj.custom_display().is_some()
    {
        return parse_unsigned(&obj.display_string());
    }
    if let Some(primitive) = obj.custom_primitive() {
        return decode_strict(primitive);
    }
    Err(DecodeError::NoNumericField {
        keys: obj.keys().collect::<Vec<_>>().join(", "),
    })
}

fn limb(v: &RawValue, name: &'static str, bits: usize) -> Result<U256, DecodeError> {
    let value = decode_strict(v)?;
    if value.bit_len() > bits {
        return Err(DecodeError::LimbOutOfRange {
            limb: name,
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn combine_words(words: &[RawValue]) -> Result<U256, DecodeError> {
    let mut acc = U256::ZERO;
    for (i, word) in words.iter().enumerate() {
        let w = limb(word, "words", WORD_BITS)?;
        if w.is_zero() {
            continue;
        }
        let shift = i * WORD_BITS;
        if shift + w.bit_len() > 256 {
            return Err(DecodeError::Overflow);
        }
        acc += w << shift;
    }
    Ok(acc)
}

// ─── Change reasons ──────────────────────────────────────────────────────────

/// Decode the `reason` argument of a `CounterChanged` event.
///
/// Accepted encodings, in order:
/// - enum wrapper `{variant: {Increased: {}, Reset: undefined, ...}}`: the
///   first member that holds a value names the variant (the first member
///   regardless if none does);
/// - single-key object `{Increased: {}}`: the first key;
/// - plain string `"reset"`.
///
/// Tags outside the four contract variants are passed through upper-cased.
pub fn decode_reason(value: &RawValue) -> ChangeReason {
    match value {
        RawValue::Object(_) | RawValue::Array(_) => reason_from_object(value),
        RawValue::Str(s) => ChangeReason::from_tag(s.to_uppercase()),
        _ => ChangeReason::Unknown,
    }
}

fn reason_from_object(value: &RawValue) -> ChangeReason {
    if let Some(variant) = value
        .get("variant")
        .filter(|v| matches!(v, RawValue::Object(_) | RawValue::Array(_)))
    {
        let keys = variant.keys();
        let active = keys.iter().find(|k| {
            member(variant, k).is_some_and(|v| !v.is_undefined())
        });
        if let Some(key) = active.or_else(|| keys.first()) {
            return ChangeReason::from_tag(key.to_uppercase());
        }
    }

    if let Some(first) = value.keys().first() {
        return ChangeReason::from_tag(first.to_uppercase());
    }

    let text = value.to_display_string();
    if text != OBJECT_PLACEHOLDER {
        return ChangeReason::from_tag(text.to_uppercase());
    }
    ChangeReason::Unknown
}

fn member<'a>(container: &'a RawValue, key: &str) -> Option<&'a RawValue> {
    match container {
        RawValue::Object(o) => o.get(key),
        RawValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}
