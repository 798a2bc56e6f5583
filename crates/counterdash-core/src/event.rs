//! Raw and typed counter events.

use crate::selector::{sn_keccak, Selector};
use crate::value::RawValue;
use serde::{Deserialize, Serialize};

/// Event emitted by the counter contract on every value change.
pub const COUNTER_CHANGED: &str = "CounterChanged";

/// Event emitted by the Ownable component.
pub const OWNERSHIP_TRANSFERRED: &str = "OwnershipTransferred";

/// An event as delivered by the event-history collaborator: positional
/// metadata plus loosely-typed, named arguments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvent {
    pub block_number: Option<u64>,
    pub transaction_hash: RawValue,
    pub args: RawValue,
}

impl RawEvent {
    /// A named argument, `Undefined` when missing.
    pub fn arg(&self, name: &str) -> RawValue {
        self.args.get(name).cloned().unwrap_or_default()
    }
}

/// One historical counter change. Fields keep their wire shape; decoding
/// happens at presentation time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CounterEvent {
    pub reason: RawValue,
    pub old_value: RawValue,
    pub new_value: RawValue,
    pub caller: RawValue,
    pub block_number: Option<u64>,
    pub transaction_hash: RawValue,
}

impl From<&RawEvent> for CounterEvent {
    fn from(raw: &RawEvent) -> Self {
        Self {
            reason: raw.arg("reason"),
            old_value: raw.arg("old_value"),
            new_value: raw.arg("new_value"),
            caller: raw.arg("caller"),
            block_number: raw.block_number,
            transaction_hash: raw.transaction_hash.clone(),
        }
    }
}

/// An ownership transfer of the counter contract.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OwnershipTransferredEvent {
    pub previous_owner: RawValue,
    pub new_owner: RawValue,
    pub block_number: Option<u64>,
    pub transaction_hash: RawValue,
}

impl From<&RawEvent> for OwnershipTransferredEvent {
    fn from(raw: &RawEvent) -> Self {
        Self {
            previous_owner: raw.arg("previous_owner"),
            new_owner: raw.arg("new_owner"),
            block_number: raw.block_number,
            transaction_hash: raw.transaction_hash.clone(),
        }
    }
}

/// Parameters of an event-history request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    pub contract: String,
    pub event: String,
    pub from_block: u64,
    /// Keep following new events after the historical backfill.
    pub watch: bool,
}

impl EventQuery {
    pub fn new(contract: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            event: event.into(),
            from_block: 0,
            watch: true,
        }
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = block;
        self
    }

    pub fn watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// First event key to filter on.
    pub fn selector(&self) -> Selector {
        sn_keccak(&self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_event_from_scaffold_shape() {
        let raw: RawEvent = serde_json::from_value(json!({
            "blockNumber": 812,
            "transactionHash": "0x5e1f",
            "args": {
                "reason": {"variant": {"Increased": {}}},
                "old_value": 1,
                "new_value": 2,
                "caller": "0x0abc"
            }
        }))
        .unwrap();
        let ev = CounterEvent::from(&raw);
        assert_eq!(ev.block_number, Some(812));
        assert_eq!(ev.new_value, RawValue::from(2u64));
        assert_eq!(ev.caller, RawValue::from("0x0abc"));
    }

    #[test]
    fn missing_args_are_undefined() {
        let raw: RawEvent = serde_json::from_value(json!({"blockNumber": 1})).unwrap();
        let ev = OwnershipTransferredEvent::from(&raw);
        assert!(ev.previous_owner.is_undefined());
        assert!(ev.transaction_hash.is_undefined());
    }

    #[test]
    fn query_defaults() {
        let q = EventQuery::new("CounterContract", COUNTER_CHANGED);
        assert_eq!(q.from_block, 0);
        assert!(q.watch);
        assert_eq!(q.selector(), sn_keccak("CounterChanged"));
    }
}
