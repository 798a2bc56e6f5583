//! # counterdash-client
//!
//! The async half of the counter dashboard. [`ContractClient`] is the seam
//! to the contract-interaction library; [`MemoryClient`] simulates the
//! counter contract behind it for tests and demos. [`CounterController`]
//! and [`EventHistory`] drive the control panel and the history panel on
//! top of any client.

pub mod client;
pub mod config;
pub mod controller;
pub mod history;
pub mod memory;

pub use client::{
    ContractCall, ContractClient, DeployedContract, ExecutionStatus, RawEventStream, Receipt,
    TransactionHash,
};
pub use config::{DashboardConfig, DisplayCaps, EventNames, SettleDelays};
pub use controller::{
    parse_set_value, Access, Action, ActionOutcome, Controls, CounterController, CounterState,
    Loadable, SetValueInput,
};
pub use history::{EventHistory, HistoryView, EMPTY_HISTORY};
pub use memory::MemoryClient;
