//! Loosely-typed contract values.
//!
//! Contract reads and event arguments arrive in whatever shape the
//! contract-interaction library produced: a bare felt, a `{low, high}` u256,
//! a tagged-union wrapper, a plain string. `RawValue` captures every one of
//! those shapes so decoders can match on structure instead of probing
//! properties at runtime.

use alloy_primitives::U256;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder produced by the default string conversion of an object.
pub const OBJECT_PLACEHOLDER: &str = "[object Object]";

// ─── BigInt ───────────────────────────────────────────────────────────────────

/// A signed 256-bit integer, wide enough for any felt or u256 the client
/// hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BigInt {
    negative: bool,
    magnitude: U256,
}

impl BigInt {
    pub const ZERO: BigInt = BigInt {
        negative: false,
        magnitude: U256::ZERO,
    };

    pub fn from_u256(magnitude: U256) -> Self {
        Self {
            negative: false,
            magnitude,
        }
    }

    /// Negative value with the given magnitude. `-0` collapses to zero.
    pub fn negative(magnitude: U256) -> Self {
        Self {
            negative: !magnitude.is_zero(),
            magnitude,
        }
    }

    pub fn magnitude(&self) -> U256 {
        self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    /// Parse an optionally signed decimal literal, ignoring surrounding
    /// whitespace. Returns `None` for empty input, stray characters, or
    /// values that do not fit in 256 bits.
    pub fn parse_decimal(s: &str) -> Option<Self> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let magnitude = U256::from_str_radix(digits, 10).ok()?;
        Some(if negative {
            Self::negative(magnitude)
        } else {
            Self::from_u256(magnitude)
        })
    }

    /// Parse a `0x`/`0X`-prefixed hex literal.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        U256::from_str_radix(digits, 16).ok().map(Self::from_u256)
    }

    /// Lowercase hex digits without prefix; negative values carry a leading `-`.
    pub fn to_hex(&self) -> String {
        if self.negative {
            format!("-{:x}", self.magnitude)
        } else {
            format!("{:x}", self.magnitude)
        }
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}

impl From<U256> for BigInt {
    fn from(v: U256) -> Self {
        Self::from_u256(v)
    }
}

impl From<u64> for BigInt {
    fn from(v: u64) -> Self {
        Self::from_u256(U256::from(v))
    }
}

impl From<u128> for BigInt {
    fn from(v: u128) -> Self {
        Self::from_u256(U256::from(v))
    }
}

impl From<i64> for BigInt {
    fn from(v: i64) -> Self {
        let magnitude = U256::from(v.unsigned_abs());
        if v < 0 {
            Self::negative(magnitude)
        } else {
            Self::from_u256(magnitude)
        }
    }
}

// ─── RawObject ───────────────────────────────────────────────────────────────

/// An object-shaped value. Field order is the order the fields were
/// produced in, which matters for "first key" tag decoding.
///
/// `display` and `primitive` model objects that carry their own string or
/// primitive conversion (big-number wrappers from other libraries). Values
/// decoded from JSON never have either.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawObject {
    fields: IndexMap<String, RawValue>,
    display: Option<String>,
    primitive: Option<Box<RawValue>>,
}

impl RawObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Attach a custom string conversion.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Attach a custom primitive conversion.
    pub fn with_primitive(mut self, primitive: impl Into<RawValue>) -> Self {
        self.primitive = Some(Box::new(primitive.into()));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    /// Field lookup that treats an explicitly `Undefined` member as missing.
    pub fn get_defined(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key).filter(|v| !v.is_undefined())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The object's string conversion: the custom one if set, otherwise
    /// [`OBJECT_PLACEHOLDER`].
    pub fn display_string(&self) -> String {
        self.display
            .clone()
            .unwrap_or_else(|| OBJECT_PLACEHOLDER.to_string())
    }

    pub fn custom_display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn custom_primitive(&self) -> Option<&RawValue> {
        self.primitive.as_deref()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawObject {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            display: None,
            primitive: None,
        }
    }
}

// ─── RawValue ────────────────────────────────────────────────────────────────

/// A contract value or event argument whose shape is not statically known.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    /// A member that exists but holds no value.
    #[default]
    Undefined,
    Null,
    BigInt(BigInt),
    /// A fixed-size (double precision) number.
    Number(f64),
    Str(String),
    Bool(bool),
    Array(Vec<RawValue>),
    Object(RawObject),
}

impl RawValue {
    /// Build an object value from `(key, value)` pairs, preserving order.
    pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<RawValue>,
    {
        RawValue::Object(fields.into_iter().collect())
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, RawValue::Undefined)
    }

    /// `true` for `Null` and `Undefined`.
    pub fn is_absent(&self) -> bool {
        matches!(self, RawValue::Null | RawValue::Undefined)
    }

    /// Truthiness as the UI layer judged it: zero, empty strings, `false`,
    /// `NaN` and absent values are falsy; arrays and objects never are.
    pub fn is_truthy(&self) -> bool {
        match self {
            RawValue::Undefined | RawValue::Null => false,
            RawValue::BigInt(b) => !b.is_zero(),
            RawValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RawValue::Str(s) => !s.is_empty(),
            RawValue::Bool(b) => *b,
            RawValue::Array(_) | RawValue::Object(_) => true,
        }
    }

    /// Strings, numbers, big integers and booleans.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            RawValue::BigInt(_) | RawValue::Number(_) | RawValue::Str(_) | RawValue::Bool(_)
        )
    }

    pub fn as_object(&self) -> Option<&RawObject> {
        match self {
            RawValue::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Object member lookup. Non-objects have no members.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Own enumerable key names: object fields in order, array indices.
    pub fn keys(&self) -> Vec<String> {
        match self {
            RawValue::Object(o) => o.keys().map(str::to_string).collect(),
            RawValue::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /// Integral value of a big integer or a whole, finite number.
    pub fn as_integer(&self) -> Option<BigInt> {
        match self {
            RawValue::BigInt(b) => Some(*b),
            RawValue::Number(n) => number_to_bigint(*n),
            _ => None,
        }
    }

    /// Generic string conversion, the same rendering the dashboard applied
    /// when it interpolated a value into text.
    pub fn to_display_string(&self) -> String {
        match self {
            RawValue::Undefined => "undefined".to_string(),
            RawValue::Null => "null".to_string(),
            RawValue::BigInt(b) => b.to_string(),
            RawValue::Number(n) => format_number(*n),
            RawValue::Str(s) => s.clone(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Array(items) => items
                .iter()
                .map(|v| {
                    if v.is_absent() {
                        String::new()
                    } else {
                        v.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            RawValue::Object(o) => o.display_string(),
        }
    }

    /// Lossy conversion back to JSON. Values outside the JSON number range
    /// become decimal strings; custom conversions on objects are dropped.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            RawValue::Undefined | RawValue::Null => Value::Null,
            RawValue::BigInt(b) => bigint_to_json(b),
            RawValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            RawValue::Str(s) => Value::String(s.clone()),
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Array(items) => Value::Array(items.iter().map(RawValue::to_json).collect()),
            RawValue::Object(o) => Value::Object(
                o.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn bigint_to_json(b: &BigInt) -> serde_json::Value {
    let as_u64 = u64::try_from(b.magnitude()).ok();
    match (b.is_negative(), as_u64) {
        (false, Some(v)) => serde_json::Value::from(v),
        (true, Some(v)) if v <= i64::MAX as u64 => serde_json::Value::from(-(v as i64)),
        _ => serde_json::Value::String(b.to_string()),
    }
}

/// Whole finite numbers convert exactly; anything else has no integer form.
fn number_to_bigint(n: f64) -> Option<BigInt> {
    if !n.is_finite() || n.fract() != 0.0 {
        return None;
    }
    let magnitude = n.abs();
    if magnitude > u128::MAX as f64 {
        return None;
    }
    let magnitude = U256::from(magnitude as u128);
    Some(if n < 0.0 {
        BigInt::negative(magnitude)
    } else {
        BigInt::from_u256(magnitude)
    })
}

/// Render a double the way the dashboard displayed it: whole numbers
/// without a fractional part, `NaN`/`Infinity` spelled out, exponent form
/// from 1e21 upwards.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.abs() >= 1e21 {
        let s = format!("{n:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl From<serde_json::Value> for RawValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => json_number(&n),
            Value::String(s) => RawValue::Str(s),
            Value::Array(items) => RawValue::Array(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => RawValue::Object(map.into_iter().collect()),
        }
    }
}

/// Integer literals of any width become `BigInt`; only fractional or
/// exponent forms fall back to a double.
fn json_number(n: &serde_json::Number) -> RawValue {
    if let Some(u) = n.as_u64() {
        return RawValue::BigInt(BigInt::from(u));
    }
    if let Some(i) = n.as_i64() {
        return RawValue::BigInt(BigInt::from(i));
    }
    match BigInt::parse_decimal(&n.to_string()) {
        Some(b) => RawValue::BigInt(b),
        None => RawValue::Number(n.as_f64().unwrap_or(f64::NAN)),
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Str(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Str(s)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<u64> for RawValue {
    fn from(v: u64) -> Self {
        RawValue::BigInt(BigInt::from(v))
    }
}

impl From<u128> for RawValue {
    fn from(v: u128) -> Self {
        RawValue::BigInt(BigInt::from(v))
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::BigInt(BigInt::from(v))
    }
}

impl From<U256> for RawValue {
    fn from(v: U256) -> Self {
        RawValue::BigInt(BigInt::from_u256(v))
    }
}

impl From<BigInt> for RawValue {
    fn from(v: BigInt) -> Self {
        RawValue::BigInt(v)
    }
}

impl From<RawObject> for RawValue {
    fn from(o: RawObject) -> Self {
        RawValue::Object(o)
    }
}

impl From<Vec<RawValue>> for RawValue {
    fn from(items: Vec<RawValue>) -> Self {
        RawValue::Array(items)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Undefined)
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(RawValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_integers_become_bigints() {
        assert_eq!(RawValue::from(json!(42)), RawValue::BigInt(BigInt::from(42u64)));
        assert_eq!(RawValue::from(json!(-7)), RawValue::BigInt(BigInt::from(-7i64)));
        assert_eq!(RawValue::from(json!(1.5)), RawValue::Number(1.5));
    }

    #[test]
    fn json_integers_wider_than_u64_stay_exact() {
        let v: RawValue = serde_json::from_str("18446744073709551617").unwrap();
        let expected = U256::from(u64::MAX) + U256::from(2u64);
        assert_eq!(v, RawValue::BigInt(BigInt::from_u256(expected)));
        assert_eq!(v.to_display_string(), "18446744073709551617");

        // 2^251 + 17·2^192, the largest felt.
        let felt = "3618502788666131213697322783095070105623107215331596699973092056135872020480";
        let v: RawValue = serde_json::from_str(felt).unwrap();
        assert_eq!(v.to_display_string(), felt);
        assert_eq!(
            crate::normalize(&v),
            crate::normalize(&RawValue::from(felt))
        );

        let v: RawValue = serde_json::from_str("-18446744073709551617").unwrap();
        assert_eq!(v, RawValue::BigInt(BigInt::negative(expected)));

        let v: RawValue = serde_json::from_str("2.5e3").unwrap();
        assert_eq!(v, RawValue::Number(2500.0));
    }

    #[test]
    fn object_keys_keep_wire_order() {
        let v: RawValue = serde_json::from_str(r#"{"zeta":1,"alpha":2,"mid":3}"#).unwrap();
        assert_eq!(v.keys(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn display_string_matches_dashboard_rendering() {
        assert_eq!(RawValue::Number(3.0).to_display_string(), "3");
        assert_eq!(RawValue::Number(0.25).to_display_string(), "0.25");
        assert_eq!(RawValue::Number(f64::NAN).to_display_string(), "NaN");
        assert_eq!(RawValue::Number(1e21).to_display_string(), "1e+21");
        assert_eq!(RawValue::Null.to_display_string(), "null");
        assert_eq!(
            RawValue::from(json!([1, null, "x"])).to_display_string(),
            "1,,x"
        );
        assert_eq!(RawValue::from(json!({"a": 1})).to_display_string(), OBJECT_PLACEHOLDER);
        let custom = RawObject::new().with_display("12345");
        assert_eq!(RawValue::Object(custom).to_display_string(), "12345");
    }

    #[test]
    fn truthiness() {
        assert!(!RawValue::BigInt(BigInt::ZERO).is_truthy());
        assert!(!RawValue::from("").is_truthy());
        assert!(!RawValue::Number(f64::NAN).is_truthy());
        assert!(RawValue::from(json!({})).is_truthy());
        assert!(RawValue::from("0").is_truthy());
    }

    #[test]
    fn bigint_parsing() {
        assert_eq!(BigInt::parse_decimal(" 255 ").unwrap().to_hex(), "ff");
        assert_eq!(BigInt::parse_decimal("-16").unwrap().to_hex(), "-10");
        assert!(BigInt::parse_decimal("").is_none());
        assert!(BigInt::parse_decimal("12a").is_none());
        assert_eq!(BigInt::parse_hex("0xFF").unwrap(), BigInt::from(255u64));
        assert!(BigInt::parse_hex("ff").is_none());
        assert_eq!(BigInt::negative(U256::ZERO), BigInt::ZERO);
    }

    #[test]
    fn large_bigint_serializes_as_string() {
        let big = BigInt::from_u256(U256::from(u128::MAX) + U256::from(1u64));
        let json = serde_json::to_value(RawValue::BigInt(big)).unwrap();
        assert_eq!(json, json!("340282366920938463463374607431768211456"));
    }
}
