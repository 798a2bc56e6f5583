//! Dashboard configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.

use alloy_primitives::U256;
use counterdash_core::{DashboardError, COUNTER_CHANGED, OWNERSHIP_TRANSFERRED};
use counterdash_observability::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Names of the events the history panel follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNames {
    #[serde(default = "default_counter_changed")]
    pub counter_changed: String,
    #[serde(default = "default_ownership_transferred")]
    pub ownership_transferred: String,
}

fn default_counter_changed() -> String { COUNTER_CHANGED.into() }
fn default_ownership_transferred() -> String { OWNERSHIP_TRANSFERRED.into() }

impl Default for EventNames {
    fn default() -> Self {
        Self {
            counter_changed: default_counter_changed(),
            ownership_transferred: default_ownership_transferred(),
        }
    }
}

/// How many entries of each history the view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCaps {
    #[serde(default = "default_counter_cap")]
    pub counter_changes: usize,
    #[serde(default = "default_ownership_cap")]
    pub ownership_transfers: usize,
}

fn default_counter_cap() -> usize { 25 }
fn default_ownership_cap() -> usize { 10 }

impl Default for DisplayCaps {
    fn default() -> Self {
        Self {
            counter_changes: default_counter_cap(),
            ownership_transfers: default_ownership_cap(),
        }
    }
}

/// Extra wait after a receipt before re-reading, per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettleDelays {
    #[serde(default)]
    pub increment_ms: u64,
    #[serde(default)]
    pub decrement_ms: u64,
    #[serde(default)]
    pub set_ms: u64,
    #[serde(default)]
    pub reset_ms: u64,
}

/// Top-level dashboard configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Name of the counter contract as the client knows it.
    #[serde(default = "default_contract")]
    pub contract: String,
    /// Token charged by `reset_counter`.
    #[serde(default = "default_fee_token")]
    pub fee_token: String,
    /// Amount approved before a reset, as a decimal string (18 decimals).
    #[serde(default = "default_reset_fee")]
    pub reset_fee: String,
    #[serde(default)]
    pub events: EventNames,
    #[serde(default)]
    pub from_block: u64,
    /// Follow new events after loading history.
    #[serde(default = "bool_true")]
    pub watch: bool,
    #[serde(default)]
    pub display: DisplayCaps,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default)]
    pub settle: SettleDelays,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_contract() -> String { "CounterContract".into() }
fn default_fee_token() -> String { "Strk".into() }
fn default_reset_fee() -> String { "1000000000000000000".into() }
fn default_receipt_timeout_ms() -> u64 { 60_000 }
fn bool_true() -> bool { true }

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            contract: default_contract(),
            fee_token: default_fee_token(),
            reset_fee: default_reset_fee(),
            events: EventNames::default(),
            from_block: 0,
            watch: true,
            display: DisplayCaps::default(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            settle: SettleDelays::default(),
            log: LogConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, DashboardError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| DashboardError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file.
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DashboardError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.contract.trim().is_empty() {
            return Err(DashboardError::Config("contract name is empty".into()));
        }
        if self.fee_token.trim().is_empty() {
            return Err(DashboardError::Config("fee token name is empty".into()));
        }
        if self.receipt_timeout_ms == 0 {
            return Err(DashboardError::Config("receipt_timeout_ms must be positive".into()));
        }
        self.reset_fee_amount()?;
        Ok(())
    }

    pub fn reset_fee_amount(&self) -> Result<U256, DashboardError> {
        U256::from_str_radix(self.reset_fee.trim(), 10)
            .map_err(|e| DashboardError::Config(format!("reset_fee '{}': {e}", self.reset_fee)))
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = DashboardConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg, DashboardConfig::default());
        assert_eq!(cfg.display.counter_changes, 25);
        assert_eq!(cfg.display.ownership_transfers, 10);
        assert_eq!(cfg.receipt_timeout(), Duration::from_secs(60));
        assert_eq!(
            cfg.reset_fee_amount().unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert!(cfg.watch);
    }

    #[test]
    fn partial_override() {
        let yaml = r#"
contract: MyCounter
display:
  counter_changes: 5
settle:
  reset_ms: 2000
log:
  level: debug
"#;
        let cfg = DashboardConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.contract, "MyCounter");
        assert_eq!(cfg.display.counter_changes, 5);
        assert_eq!(cfg.display.ownership_transfers, 10);
        assert_eq!(cfg.settle.reset_ms, 2000);
        assert_eq!(cfg.settle.set_ms, 0);
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.events.counter_changed, "CounterChanged");
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            DashboardConfig::from_yaml("reset_fee: one"),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_yaml("receipt_timeout_ms: 0"),
            Err(DashboardError::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_yaml("contract: [1, 2"),
            Err(DashboardError::Config(_))
        ));
    }
}
