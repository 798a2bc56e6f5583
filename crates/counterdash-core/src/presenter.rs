//! Display projection of counter and ownership events.
//!
//! Presentation is a lazy, order-preserving map: every input event yields
//! exactly one presented entry. How many entries the UI actually shows is
//! the caller's business.

use crate::address::format_hex;
use crate::decoder::{decode_reason, decode_traced};
use crate::event::{CounterEvent, OwnershipTransferredEvent};
use crate::reason::ChangeReason;
use crate::value::RawValue;
use serde::Serialize;

/// A counter change ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedCounterChange {
    pub reason: ChangeReason,
    /// Heading, e.g. `Counter INCREASED`.
    pub title: String,
    pub icon: &'static str,
    pub color_class: &'static str,
    pub previous_value: String,
    pub new_value: String,
    pub changed_by: String,
    pub block_number: Option<u64>,
    /// Only set when the event carries a transaction hash.
    pub transaction: Option<String>,
    /// How many of the two values fell back to a placeholder.
    #[serde(skip)]
    pub decode_fallbacks: usize,
}

/// An ownership transfer ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedOwnershipTransfer {
    pub title: &'static str,
    pub icon: &'static str,
    pub previous_owner: Option<String>,
    pub new_owner: Option<String>,
    pub block_number: Option<u64>,
    pub transaction: Option<String>,
}

/// Present counter changes in input order.
pub fn present<'a, I>(events: I) -> impl Iterator<Item = PresentedCounterChange> + 'a
where
    I: IntoIterator<Item = &'a CounterEvent>,
    I::IntoIter: 'a,
{
    events.into_iter().map(present_counter_change)
}

/// Present ownership transfers in input order.
pub fn present_ownership<'a, I>(events: I) -> impl Iterator<Item = PresentedOwnershipTransfer> + 'a
where
    I: IntoIterator<Item = &'a OwnershipTransferredEvent>,
    I::IntoIter: 'a,
{
    events.into_iter().map(present_ownership_transfer)
}

pub fn present_counter_change(event: &CounterEvent) -> PresentedCounterChange {
    let reason = decode_reason(&event.reason);
    let previous = decode_traced(&event.old_value);
    let new = decode_traced(&event.new_value);
    let decode_fallbacks = [&previous, &new]
        .iter()
        .filter(|d| d.rule.is_fallback())
        .count();

    PresentedCounterChange {
        title: format!("Counter {reason}"),
        icon: reason.icon(),
        color_class: reason.color_class(),
        reason,
        previous_value: previous.text,
        new_value: new.text,
        changed_by: format_hex(&event.caller),
        block_number: event.block_number,
        transaction: optional_hex(&event.transaction_hash),
        decode_fallbacks,
    }
}

pub fn present_ownership_transfer(event: &OwnershipTransferredEvent) -> PresentedOwnershipTransfer {
    PresentedOwnershipTransfer {
        title: "OWNERSHIP TRANSFERRED",
        icon: "👑",
        previous_owner: optional_hex(&event.previous_owner),
        new_owner: optional_hex(&event.new_owner),
        block_number: event.block_number,
        transaction: optional_hex(&event.transaction_hash),
    }
}

fn optional_hex(v: &RawValue) -> Option<String> {
    v.is_truthy().then(|| format_hex(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter_event(reason: serde_json::Value, old: u64, new: u64) -> CounterEvent {
        CounterEvent {
            reason: reason.into(),
            old_value: old.into(),
            new_value: new.into(),
            caller: RawValue::from("0x0abc"),
            block_number: Some(10),
            transaction_hash: RawValue::from("0x77"),
        }
    }

    #[test]
    fn reset_event_styling() {
        let ev = counter_event(json!({"variant": {"Reset": {}}}), 5, 0);
        let p = present_counter_change(&ev);
        assert_eq!(p.reason, ChangeReason::Reset);
        assert_eq!(p.icon, "🔄");
        assert_eq!(p.color_class, "text-yellow-500");
        assert_eq!(p.title, "Counter RESET");
        assert_eq!(p.previous_value, "5");
        assert_eq!(p.new_value, "0");
        assert_eq!(p.transaction.as_deref(), Some("0x77"));
    }

    #[test]
    fn order_and_count_preserved() {
        let events = vec![
            counter_event(json!("Increased"), 0, 1),
            counter_event(json!("Decreased"), 1, 0),
            counter_event(json!({"Set": {}}), 0, 9),
        ];
        let out: Vec<_> = present(&events).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].icon, "📈");
        assert_eq!(out[1].color_class, "text-red-500");
        assert_eq!(out[2].new_value, "9");
    }

    #[test]
    fn decimal_caller_rendered_as_hex() {
        let mut ev = counter_event(json!("Increased"), 0, 1);
        ev.caller = RawValue::from("2748");
        assert_eq!(present_counter_change(&ev).changed_by, "0xabc");
        ev.caller = RawValue::Undefined;
        assert_eq!(present_counter_change(&ev).changed_by, "Unknown");
    }

    #[test]
    fn missing_values_and_fallbacks() {
        let ev = CounterEvent {
            reason: json!({"Mystery": {}}).into(),
            old_value: RawValue::Undefined,
            new_value: json!({"a": 1}).into(),
            ..Default::default()
        };
        let p = present_counter_change(&ev);
        assert_eq!(p.previous_value, "N/A");
        assert_eq!(p.new_value, "{a}");
        assert_eq!(p.decode_fallbacks, 2);
        assert_eq!(p.icon, "📊");
        assert_eq!(p.transaction, None);
    }

    #[test]
    fn ownership_transfer_owners_only_when_present() {
        let ev = OwnershipTransferredEvent {
            previous_owner: RawValue::from(0u64),
            new_owner: RawValue::from(0xabcu64),
            block_number: Some(1),
            transaction_hash: RawValue::Undefined,
        };
        let p = present_ownership_transfer(&ev);
        assert_eq!(p.previous_owner, None);
        assert_eq!(p.new_owner.as_deref(), Some("0xabc"));
        assert_eq!(p.icon, "👑");
    }
}
