//! `counterdash demo`: a scripted dashboard session against the in-memory
//! counter contract.

use anyhow::Result;
use counterdash_client::{
    memory::FEE_TOKEN, ActionOutcome, ContractClient, CounterController, DashboardConfig,
    EventHistory, MemoryClient,
};
use counterdash_core::{shorten, DashboardError, RawValue};
use std::sync::Arc;
use tracing::warn;

const DEMO_OWNER: &str = "0x04a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f";

pub async fn run(config: DashboardConfig) -> Result<()> {
    let client = MemoryClient::new(DEMO_OWNER);
    let shared: Arc<dyn ContractClient> = Arc::new(client.clone());
    let controller = CounterController::new(Arc::clone(&shared), config.clone());
    let history = EventHistory::new(Arc::clone(&shared), &config);

    println!("Connected: {}", shorten(&shared.account()));
    let watcher = history.follow(controller.child_token()).await?;

    controller.refresh().await?;
    print_state(&controller);

    report("increment", controller.increment().await);
    report("increment", controller.increment().await);
    report("set 10", controller.set("10").await);
    report("decrement", controller.decrement().await);
    report(
        &format!("reset (approves {} {FEE_TOKEN})", config.reset_fee),
        controller.reset().await,
    );
    print_state(&controller);

    controller.shutdown();
    if let Some(handle) = watcher {
        handle.await?;
    }

    println!();
    crate::cmd_history::print_view(&history.load().await?);
    Ok(())
}

fn report(label: &str, result: Result<ActionOutcome, DashboardError>) {
    match result {
        Ok(outcome) => println!(
            "{label:<40} tx {}  → counter {}",
            shorten(&RawValue::from(outcome.tx_hash.as_str())),
            outcome.state.value
        ),
        Err(e) => {
            warn!(action = label, error = %e, "action failed");
            println!("{label:<40} failed: {e}");
        }
    }
}

fn print_state(controller: &CounterController) {
    println!();
    println!("Counter: {}", controller.state());
    if let Some(controls) = controller.controls() {
        println!(
            "Owner: {}   [{}]",
            controls.owner_label,
            controls.access.label()
        );
        println!(
            "Controls: + {}  - {}  🔄 {}  set {}",
            on_off(controls.increment),
            on_off(controls.decrement),
            on_off(controls.reset),
            on_off(controls.set)
        );
        println!("{}", controls.hint());
    }
    println!();
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
