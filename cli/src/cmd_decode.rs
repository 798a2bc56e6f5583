//! `counterdash normalize | equals | decode | reason`: one-shot value tools.

use anyhow::{anyhow, Result};
use counterdash_core::{
    address, decode_reason, decode_strict, decode_traced, RawValue,
};

/// Read a command-line value: JSON when it parses, a plain string otherwise.
pub fn parse_value(input: &str) -> RawValue {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(v) => RawValue::from(v),
        Err(_) => RawValue::from(input),
    }
}

pub fn normalize(input: &str) -> Result<()> {
    let canonical = address::normalize(&parse_value(input));
    if canonical.is_empty() {
        return Err(anyhow!("address is empty"));
    }
    println!("{canonical}");
    Ok(())
}

pub fn equals(a: &str, b: &str) -> Result<()> {
    let (a, b) = (parse_value(a), parse_value(b));
    println!("{}", address::equals(&a, &b));
    Ok(())
}

pub fn decode(input: &str, strict: bool) -> Result<()> {
    let value = parse_value(input);
    if strict {
        let n = decode_strict(&value).map_err(|e| anyhow!("strict decode failed: {e}"))?;
        println!("{n}");
    } else {
        let decoded = decode_traced(&value);
        if decoded.rule.is_fallback() {
            tracing::warn!(rule = ?decoded.rule, "no numeric value found");
        }
        println!("{}", decoded.text);
    }
    Ok(())
}

pub fn reason(input: &str) -> Result<()> {
    let reason = decode_reason(&parse_value(input));
    println!("{} {} ({})", reason.icon(), reason, reason.color_class());
    Ok(())
}
