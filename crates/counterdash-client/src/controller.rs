//! `CounterController`: the control panel behind the dashboard.
//!
//! Loads the counter and its owner, derives which controls are available,
//! validates set-value input, and runs the four write actions. After a write
//! is accepted the controller waits for its receipt, bounded by the receipt
//! timeout and by the controller's own lifetime, and only then re-reads.

use crate::client::{ContractCall, ContractClient, ExecutionStatus, Receipt, TransactionHash};
use crate::config::DashboardConfig;
use counterdash_core::{decode_strict, is_owner, shorten, ClientError, DashboardError, RawValue};
use counterdash_observability::DashboardMetrics;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

// ─── View state ───────────────────────────────────────────────────────────────

/// A value the view renders as `...` while loading and `failed` on error.
#[derive(Debug, Clone, PartialEq)]
pub enum Loadable<T> {
    Loading,
    Failed(String),
    Ready(T),
}

impl<T> Loadable<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Loadable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loadable::Loading => f.write_str("..."),
            Loadable::Failed(_) => f.write_str("failed"),
            Loadable::Ready(v) => v.fmt(f),
        }
    }
}

/// Last state read from the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterState {
    pub value: u32,
    /// `Undefined` when the owner could not be read.
    pub owner: RawValue,
}

impl fmt::Display for CounterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Badge next to the set-value field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    Denied,
}

impl Access {
    pub fn label(&self) -> &'static str {
        match self {
            Access::Owner => "Owner Access",
            Access::Denied => "Access Denied",
        }
    }
}

/// Which controls are enabled for the current state and account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    pub increment: bool,
    pub decrement: bool,
    pub reset: bool,
    pub set: bool,
    pub access: Access,
    /// Shortened owner address for the header.
    pub owner_label: String,
}

impl Controls {
    pub fn derive(state: &CounterState, account: &RawValue) -> Self {
        let owner = is_owner(account, &state.owner);
        Self {
            increment: true,
            decrement: state.value != 0,
            reset: state.value != 0,
            set: owner,
            access: if owner { Access::Owner } else { Access::Denied },
            owner_label: shorten(&state.owner),
        }
    }

    pub fn hint(&self) -> &'static str {
        if self.decrement {
            "Use +/- to control the counter, 🔄 to reset (costs 1 STRK)"
        } else {
            "Use + to start counting"
        }
    }
}

// ─── Set-value input ──────────────────────────────────────────────────────────

/// Text field for the owner-only set action. Only digits are ever accepted
/// into the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetValueInput {
    text: String,
}

impl SetValueInput {
    /// Replace the field contents if `candidate` is empty or all digits.
    /// Returns whether the edit was accepted.
    pub fn edit(&mut self, candidate: &str) -> bool {
        if candidate.is_empty() || candidate.bytes().all(|b| b.is_ascii_digit()) {
            self.text = candidate.to_string();
            true
        } else {
            false
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn parse(&self) -> Result<u32, DashboardError> {
        parse_set_value(&self.text)
    }
}

/// Validate a set-value entry: a non-negative decimal that fits the
/// contract's `u32`.
pub fn parse_set_value(text: &str) -> Result<u32, DashboardError> {
    let t = text.trim();
    let digits = t.strip_prefix('-').unwrap_or(t);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DashboardError::InvalidInput("Please enter a valid number".into()));
    }
    if t.starts_with('-') && digits.bytes().any(|b| b != b'0') {
        return Err(DashboardError::InvalidInput(
            "Please enter a non-negative number".into(),
        ));
    }
    digits
        .parse::<u32>()
        .map_err(|_| DashboardError::InvalidInput(format!("{digits} does not fit in u32")))
}

// ─── Actions ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Increment,
    Decrement,
    Set,
    Reset,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Increment => "increment",
            Action::Decrement => "decrement",
            Action::Set => "set",
            Action::Reset => "reset",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a confirmed write.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub action: Action,
    pub tx_hash: TransactionHash,
    pub receipt: Receipt,
    /// State re-read after confirmation.
    pub state: CounterState,
}

// ─── Controller ───────────────────────────────────────────────────────────────

pub struct CounterController {
    client: Arc<dyn ContractClient>,
    config: DashboardConfig,
    metrics: DashboardMetrics,
    cancel: CancellationToken,
    state: RwLock<Loadable<CounterState>>,
}

impl CounterController {
    pub fn new(client: Arc<dyn ContractClient>, config: DashboardConfig) -> Self {
        Self {
            client,
            config,
            metrics: DashboardMetrics::global(),
            cancel: CancellationToken::new(),
            state: RwLock::new(Loadable::Loading),
        }
    }

    pub fn with_metrics(mut self, metrics: DashboardMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// A token cancelled together with this controller, for tasks that
    /// should not outlive it.
    pub fn child_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    /// Stop waiting on pending receipts. In-flight actions return
    /// `Cancelled` and do not re-read.
    pub fn shutdown(&self) {
        info!("counter controller shutting down");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> Loadable<CounterState> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, state: Loadable<CounterState>) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Controls for the connected account, once the counter has loaded.
    pub fn controls(&self) -> Option<Controls> {
        let account = self.client.account();
        self.state()
            .ready()
            .map(|state| Controls::derive(state, &account))
    }

    /// Read the counter and its owner. A failed counter read marks the state
    /// `Failed`; a failed owner read only leaves the owner unknown.
    pub async fn refresh(&self) -> Result<CounterState, DashboardError> {
        let contract = self.config.contract.as_str();
        let value = match self.read_counter(contract).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "counter read failed");
                self.set_state(Loadable::Failed(e.to_string()));
                return Err(e);
            }
        };
        let owner = match self.client.read(contract, "owner").await {
            Ok(owner) => owner,
            Err(e) => {
                warn!(error = %e, "owner read failed");
                RawValue::Undefined
            }
        };
        let state = CounterState { value, owner };
        self.set_state(Loadable::Ready(state.clone()));
        Ok(state)
    }

    async fn read_counter(&self, contract: &str) -> Result<u32, DashboardError> {
        let read_error = |source| DashboardError::Read {
            function: "get_counter".into(),
            source,
        };
        let raw = self.client.read(contract, "get_counter").await.map_err(read_error)?;
        decode_strict(&raw)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                read_error(ClientError::Other(format!(
                    "counter is not a u32: {}",
                    raw.to_display_string()
                )))
            })
    }

    fn known_value(&self) -> Option<u32> {
        self.state().ready().map(|s| s.value)
    }

    pub async fn increment(&self) -> Result<ActionOutcome, DashboardError> {
        let call = ContractCall::new(&self.config.contract, "increase_counter");
        self.run(Action::Increment, vec![call]).await
    }

    pub async fn decrement(&self) -> Result<ActionOutcome, DashboardError> {
        if self.known_value() == Some(0) {
            return Err(DashboardError::InvalidInput("Cannot decrease below zero".into()));
        }
        let call = ContractCall::new(&self.config.contract, "decrease_counter");
        self.run(Action::Decrement, vec![call]).await
    }

    /// Set the counter to the value in `input`. Owner only.
    pub async fn set(&self, input: &str) -> Result<ActionOutcome, DashboardError> {
        let value = parse_set_value(input)?;
        if let Some(controls) = self.controls() {
            if !controls.set {
                return Err(DashboardError::NotOwner {
                    action: "set the counter",
                });
            }
        }
        let call = ContractCall::new(&self.config.contract, "set_counter").arg(u64::from(value));
        self.run(Action::Set, vec![call]).await
    }

    /// Approve the reset fee on the fee token and reset, as one transaction.
    pub async fn reset(&self) -> Result<ActionOutcome, DashboardError> {
        if self.known_value() == Some(0) {
            return Err(DashboardError::InvalidInput("Counter is already zero".into()));
        }
        let contract = &self.config.contract;
        let deployed = self
            .client
            .deployed_info(contract)
            .await
            .map_err(|source| DashboardError::Write {
                action: Action::Reset.as_str(),
                source,
            })?
            .ok_or_else(|| DashboardError::NotDeployed {
                contract: contract.clone(),
            })?;
        let fee = self.config.reset_fee_amount()?;

        let calls = vec![
            ContractCall::new(&self.config.fee_token, "approve")
                .arg(deployed.address.as_str())
                .arg(fee),
            ContractCall::new(contract, "reset_counter"),
        ];
        self.run(Action::Reset, calls).await
    }

    async fn run(
        &self,
        action: Action,
        calls: Vec<ContractCall>,
    ) -> Result<ActionOutcome, DashboardError> {
        if self.cancel.is_cancelled() {
            return Err(DashboardError::Cancelled);
        }

        let submitted = match <[ContractCall; 1]>::try_from(calls) {
            Ok([call]) => self.client.write(call).await,
            Err(calls) => self.client.multi_write(calls).await,
        };
        let tx_hash = submitted.map_err(|source| {
            error!(%action, error = %source, "transaction submission failed");
            self.metrics.record_failed(action.as_str(), "submit");
            DashboardError::Write {
                action: action.as_str(),
                source,
            }
        })?;
        info!(%action, %tx_hash, "transaction submitted");
        self.metrics.record_submitted(action.as_str());

        let receipt = self.confirm(action, &tx_hash).await.map_err(|e| {
            if !e.is_cancelled() {
                error!(%action, %tx_hash, error = %e, "transaction not confirmed");
                self.metrics.record_failed(action.as_str(), "confirm");
            }
            e
        })?;

        self.settle(action).await?;
        let state = self.refresh().await?;
        Ok(ActionOutcome {
            action,
            tx_hash,
            receipt,
            state,
        })
    }

    async fn confirm(
        &self,
        action: Action,
        tx_hash: &TransactionHash,
    ) -> Result<Receipt, DashboardError> {
        let started = Instant::now();
        let timeout = self.config.receipt_timeout();

        let receipt = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DashboardError::Cancelled),
            r = tokio::time::timeout(timeout, self.client.wait_for_receipt(tx_hash)) => match r {
                Err(_) => {
                    return Err(DashboardError::ReceiptTimeout {
                        tx_hash: tx_hash.to_string(),
                        ms: self.config.receipt_timeout_ms,
                    })
                }
                Ok(Err(source)) => {
                    return Err(DashboardError::Write {
                        action: action.as_str(),
                        source,
                    })
                }
                Ok(Ok(receipt)) => receipt,
            },
        };

        if let ExecutionStatus::Reverted { reason } = &receipt.status {
            return Err(DashboardError::Write {
                action: action.as_str(),
                source: ClientError::Receipt {
                    tx_hash: tx_hash.to_string(),
                    reason: reason.clone(),
                },
            });
        }

        let ms = started.elapsed().as_secs_f64() * 1_000.0;
        self.metrics.record_latency(ms, action.as_str());
        info!(%action, %tx_hash, block = ?receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }

    async fn settle(&self, action: Action) -> Result<(), DashboardError> {
        let settle = &self.config.settle;
        let ms = match action {
            Action::Increment => settle.increment_ms,
            Action::Decrement => settle.decrement_ms,
            Action::Set => settle.set_ms,
            Action::Reset => settle.reset_ms,
        };
        if ms > 0 {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(DashboardError::Cancelled),
                _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
            }
        }
        if self.cancel.is_cancelled() {
            return Err(DashboardError::Cancelled);
        }
        Ok(())
    }
}

impl Drop for CounterController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_value_validation() {
        assert_eq!(parse_set_value("42").unwrap(), 42);
        assert_eq!(parse_set_value(" 7 ").unwrap(), 7);
        assert_eq!(parse_set_value("-0").unwrap(), 0);
        assert_eq!(
            parse_set_value("").unwrap_err().to_string(),
            "Please enter a valid number"
        );
        assert_eq!(
            parse_set_value("12a").unwrap_err().to_string(),
            "Please enter a valid number"
        );
        assert_eq!(
            parse_set_value("-3").unwrap_err().to_string(),
            "Please enter a non-negative number"
        );
        assert!(matches!(
            parse_set_value("4294967296"),
            Err(DashboardError::InvalidInput(_))
        ));
    }

    #[test]
    fn input_accepts_digits_only() {
        let mut input = SetValueInput::default();
        assert!(input.edit("12"));
        assert!(!input.edit("12a"));
        assert!(!input.edit("-1"));
        assert_eq!(input.as_str(), "12");
        assert!(input.edit(""));
        assert!(input.parse().is_err());
    }

    #[test]
    fn zero_disables_decrement_and_reset() {
        let owner = RawValue::from("0x0abc");
        let state = CounterState {
            value: 0,
            owner: owner.clone(),
        };
        let controls = Controls::derive(&state, &owner);
        assert!(controls.increment);
        assert!(!controls.decrement);
        assert!(!controls.reset);
        assert!(controls.set);
        assert_eq!(controls.access.label(), "Owner Access");
        assert_eq!(controls.hint(), "Use + to start counting");
    }

    #[test]
    fn set_requires_connected_owner() {
        let state = CounterState {
            value: 3,
            owner: RawValue::from(2748u64),
        };
        let stranger = Controls::derive(&state, &RawValue::from("0x0def"));
        assert!(!stranger.set);
        assert_eq!(stranger.access, Access::Denied);
        assert!(stranger.decrement);

        let disconnected = Controls::derive(&state, &RawValue::Undefined);
        assert!(!disconnected.set);

        let owner = Controls::derive(&state, &RawValue::from("0xABC"));
        assert!(owner.set);
        assert_eq!(owner.owner_label, "0xabc...xabc");
    }

    #[test]
    fn loadable_display() {
        let loading: Loadable<CounterState> = Loadable::Loading;
        assert_eq!(loading.to_string(), "...");
        let failed: Loadable<CounterState> = Loadable::Failed("boom".into());
        assert_eq!(failed.to_string(), "failed");
        let ready = Loadable::Ready(CounterState {
            value: 9,
            owner: RawValue::Undefined,
        });
        assert_eq!(ready.to_string(), "9");
    }
}
