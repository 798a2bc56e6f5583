//! Golden fixture integration tests.
//!
//! Each fixture under `fixtures/events/` holds event records in the shape the
//! event-history hook delivers them, together with the entries the dashboard
//! is expected to render for them.

use counterdash_core::{
    present, present_ownership, CounterEvent, OwnershipTransferredEvent, RawEvent,
};

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// The fixtures live two levels above the crate root.
fn fixture_path(name: &str) -> std::path::PathBuf {
    let mut p = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("../../fixtures/events");
    p.push(name);
    p
}

fn load_fixture(name: &str) -> (Vec<RawEvent>, Vec<serde_json::Value>) {
    let text = std::fs::read_to_string(fixture_path(name)).expect("fixture not found");
    let fixture: serde_json::Value = serde_json::from_str(&text).expect("invalid fixture JSON");
    let events: Vec<RawEvent> =
        serde_json::from_value(fixture["events"].clone()).expect("invalid events");
    let expected = fixture["expected"]
        .as_array()
        .expect("missing expected")
        .clone();
    assert_eq!(events.len(), expected.len(), "{name}: events/expected mismatch");
    (events, expected)
}

fn opt_str(v: &serde_json::Value) -> Option<&str> {
    v.as_str()
}

// ─── CounterChanged ───────────────────────────────────────────────────────────

#[test]
fn counter_history_golden() {
    let (raw, expected) = load_fixture("counter-history.json");
    let events: Vec<CounterEvent> = raw.iter().map(CounterEvent::from).collect();
    let presented: Vec<_> = present(&events).collect();

    assert_eq!(presented.len(), expected.len());
    for (i, (got, want)) in presented.iter().zip(&expected).enumerate() {
        assert_eq!(got.title, want["title"].as_str().unwrap(), "entry {i}: title");
        assert_eq!(got.icon, want["icon"].as_str().unwrap(), "entry {i}: icon");
        assert_eq!(
            got.color_class,
            want["color_class"].as_str().unwrap(),
            "entry {i}: color"
        );
        assert_eq!(
            got.previous_value,
            want["previous_value"].as_str().unwrap(),
            "entry {i}: previous value"
        );
        assert_eq!(
            got.new_value,
            want["new_value"].as_str().unwrap(),
            "entry {i}: new value"
        );
        assert_eq!(
            got.changed_by,
            want["changed_by"].as_str().unwrap(),
            "entry {i}: changed by"
        );
        assert_eq!(got.block_number, want["block_number"].as_u64(), "entry {i}: block");
        assert_eq!(
            got.transaction.as_deref(),
            opt_str(&want["transaction"]),
            "entry {i}: transaction"
        );
    }
}

#[test]
fn counter_history_serializes_for_json_output() {
    let (raw, _) = load_fixture("counter-history.json");
    let events: Vec<CounterEvent> = raw.iter().map(CounterEvent::from).collect();
    let first = present(&events).next().unwrap();
    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["reason"], "INCREASED");
    assert_eq!(json["icon"], "📈");
    assert!(json.get("decode_fallbacks").is_none());
}

#[test]
fn fallback_entry_is_counted() {
    let (raw, _) = load_fixture("counter-history.json");
    let events: Vec<CounterEvent> = raw.iter().map(CounterEvent::from).collect();
    let fallbacks: usize = present(&events).map(|p| p.decode_fallbacks).sum();
    // null previous value and `{a: 1}` in the last entry
    assert_eq!(fallbacks, 2);
}

// ─── OwnershipTransferred ─────────────────────────────────────────────────────

#[test]
fn ownership_history_golden() {
    let (raw, expected) = load_fixture("ownership-history.json");
    let events: Vec<OwnershipTransferredEvent> =
        raw.iter().map(OwnershipTransferredEvent::from).collect();

    for (i, (got, want)) in present_ownership(&events).zip(&expected).enumerate() {
        assert_eq!(got.title, "OWNERSHIP TRANSFERRED");
        assert_eq!(got.icon, "👑");
        assert_eq!(
            got.previous_owner.as_deref(),
            opt_str(&want["previous_owner"]),
            "entry {i}: previous owner"
        );
        assert_eq!(
            got.new_owner.as_deref(),
            opt_str(&want["new_owner"]),
            "entry {i}: new owner"
        );
        assert_eq!(
            got.transaction.as_deref(),
            opt_str(&want["transaction"]),
            "entry {i}: transaction"
        );
    }
}
