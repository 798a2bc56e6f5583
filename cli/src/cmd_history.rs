//! `counterdash history`: render event histories from JSON files.
//!
//! Input format: either an array of events or an object with an `events`
//! array (the golden fixture layout). Each event:
//! ```json
//! {
//!   "blockNumber": 812,
//!   "transactionHash": "0x5e1f...",
//!   "args": { "reason": {"variant": {"Increased": {}}}, "old_value": 0, "new_value": 1, "caller": "0x04a1..." }
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use counterdash_client::{DashboardConfig, HistoryView, EMPTY_HISTORY};
use counterdash_core::{CounterEvent, OwnershipTransferredEvent, RawEvent};
use std::path::Path;

pub fn run(
    file: &Path,
    ownership: Option<&Path>,
    config: &DashboardConfig,
    json: bool,
) -> Result<()> {
    let counter: Vec<CounterEvent> = read_events(file)?.iter().map(CounterEvent::from).collect();
    let ownership: Vec<OwnershipTransferredEvent> = match ownership {
        Some(p) => read_events(p)?
            .iter()
            .map(OwnershipTransferredEvent::from)
            .collect(),
        None => Vec::new(),
    };

    let view = HistoryView::build(&counter, &ownership, config.display);
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

fn read_events(path: &Path) -> Result<Vec<RawEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let events = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut obj) => obj
            .remove("events")
            .ok_or_else(|| anyhow!("{}: no \"events\" array", path.display()))?,
        _ => return Err(anyhow!("{}: expected an array of events", path.display())),
    };
    serde_json::from_value(events).with_context(|| format!("invalid events in {}", path.display()))
}

/// Text rendering shared with the demo.
pub fn print_view(view: &HistoryView) {
    println!("📜 Counter Event History");
    println!("Debug: {}", view.summary());
    if view.is_empty() {
        println!("{EMPTY_HISTORY}");
        return;
    }

    if view.total_counter_changes > 0 {
        println!();
        println!("🎯 Counter Change Events ({})", view.total_counter_changes);
        for change in &view.counter_changes {
            println!("  {} {}  [{}]", change.icon, change.title, change.color_class);
            println!(
                "     {} → {}   by {}",
                change.previous_value, change.new_value, change.changed_by
            );
            let block = change
                .block_number
                .map_or_else(|| "-".to_string(), |b| b.to_string());
            match &change.transaction {
                Some(tx) => println!("     block {block}   tx {tx}"),
                None => println!("     block {block}"),
            }
        }
    }

    if view.total_ownership_transfers > 0 {
        println!();
        println!(
            "👤 Ownership Transfer Events ({})",
            view.total_ownership_transfers
        );
        for transfer in &view.ownership_transfers {
            println!("  {} {}", transfer.icon, transfer.title);
            if let Some(prev) = &transfer.previous_owner {
                println!("     from {prev}");
            }
            if let Some(new) = &transfer.new_owner {
                println!("     to   {new}");
            }
            if let Some(tx) = &transfer.transaction {
                println!("     tx   {tx}");
            }
        }
    }
}
