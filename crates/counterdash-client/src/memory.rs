//! In-memory `ContractClient` implementation.
//!
//! Simulates the counter contract and the STRK fee token in process, with the
//! same entry points, revert reasons and event shapes the dashboard sees on a
//! devnet. Suitable for testing and the CLI demo.
//! Thread-safe via `Arc<RwLock<Inner>>`.

use crate::client::{
    ContractCall, ContractClient, DeployedContract, ExecutionStatus, RawEventStream, Receipt,
    TransactionHash,
};
use alloy_primitives::U256;
use async_trait::async_trait;
use counterdash_core::{
    address::normalize, decode_strict, is_owner, BigInt, ClientError, EventQuery, RawEvent,
    RawObject, RawValue, COUNTER_CHANGED, OWNERSHIP_TRANSFERRED,
};
use futures::channel::mpsc;
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};
use tracing::debug;

pub const COUNTER_CONTRACT: &str = "CounterContract";
pub const FEE_TOKEN: &str = "Strk";

/// Devnet address of the counter contract.
pub const COUNTER_ADDRESS: &str =
    "0x02d2a4804f83c34227314dba41d5c2f8a546a500d34e30bb5078fd36b5af2d77";

/// Address of the STRK token contract.
pub const STRK_ADDRESS: &str = "0x04718f5a0fc34cc1af16a1cdee98ffb20c31f5cd61d6ab07201858f4287c938d";

const COUNTER_CLASS_HASH: &str =
    "0x05f1a1b4bd3a6ac4e3f1b4a4d6bba4a6c8e1b5a1e63d1c3e1e2e2f0b4a9c7d11";

/// 1 STRK, the amount `reset_counter` moves from the caller to the owner.
pub const RESET_FEE: u64 = 1_000_000_000_000_000_000;

// ─── Contract state ───────────────────────────────────────────────────────────

/// Mutable contract storage. A transaction runs against a copy and is
/// committed only when every call in it succeeds.
#[derive(Debug, Clone)]
struct Ledger {
    counter: u32,
    owner: RawValue,
    /// normalized holder → balance
    balances: HashMap<String, U256>,
    /// (normalized holder, normalized spender) → allowance
    allowances: HashMap<(String, String), U256>,
}

/// An event produced while executing a transaction, before it has a block.
struct Emitted {
    name: &'static str,
    args: RawObject,
}

struct Inner {
    ledger: Ledger,
    account: RawValue,
    reset_fee: U256,
    contracts: HashMap<String, DeployedContract>,
    block_number: u64,
    nonce: u64,
    history: Vec<(String, RawEvent)>,
    receipts: HashMap<String, Receipt>,
    watchers: Vec<(String, mpsc::UnboundedSender<Result<RawEvent, ClientError>>)>,
    receipt_delay: Duration,
    reads: HashMap<String, usize>,
    /// function name → error returned by the next call to it
    failures: HashMap<String, ClientError>,
}

impl Inner {
    fn new(owner: RawValue) -> Self {
        let mut contracts = HashMap::new();
        contracts.insert(
            COUNTER_CONTRACT.to_string(),
            DeployedContract {
                address: COUNTER_ADDRESS.to_string(),
                class_hash: Some(COUNTER_CLASS_HASH.to_string()),
            },
        );
        contracts.insert(
            FEE_TOKEN.to_string(),
            DeployedContract {
                address: STRK_ADDRESS.to_string(),
                class_hash: None,
            },
        );

        let reset_fee = U256::from(RESET_FEE);
        let mut balances = HashMap::new();
        balances.insert(normalize(&owner), reset_fee * U256::from(10u64));

        let mut inner = Self {
            ledger: Ledger {
                counter: 0,
                owner: owner.clone(),
                balances,
                allowances: HashMap::new(),
            },
            account: owner.clone(),
            reset_fee,
            contracts,
            block_number: 0,
            nonce: 0,
            history: Vec::new(),
            receipts: HashMap::new(),
            watchers: Vec::new(),
            receipt_delay: Duration::ZERO,
            reads: HashMap::new(),
            failures: HashMap::new(),
        };

        // The Ownable initializer emits the first transfer at deployment.
        inner.include(vec![Emitted {
            name: OWNERSHIP_TRANSFERRED,
            args: RawObject::new()
                .with_field("previous_owner", BigInt::ZERO)
                .with_field("new_owner", felt(&owner)),
        }]);
        inner
    }

    fn take_failure(&mut self, function: &str) -> Option<ClientError> {
        self.failures.remove(function)
    }

    /// Seal a transaction into a new block: assign a hash, record its events
    /// and receipt, and notify live watchers.
    fn include(&mut self, emitted: Vec<Emitted>) -> TransactionHash {
        self.block_number += 1;
        self.nonce += 1;
        let tx_hash = TransactionHash(format!("0x{:064x}", self.nonce));

        for ev in emitted {
            let raw = RawEvent {
                block_number: Some(self.block_number),
                transaction_hash: RawValue::from(tx_hash.as_str()),
                args: RawValue::Object(ev.args),
            };
            self.watchers.retain(|(name, sender)| {
                name != ev.name || sender.unbounded_send(Ok(raw.clone())).is_ok()
            });
            self.history.push((ev.name.to_string(), raw));
        }

        self.receipts.insert(
            tx_hash.0.clone(),
            Receipt {
                tx_hash: tx_hash.clone(),
                block_number: Some(self.block_number),
                status: ExecutionStatus::Succeeded,
            },
        );
        tx_hash
    }

    fn check_deployed(&self, contract: &str) -> Result<(), ClientError> {
        if self.contracts.contains_key(contract) {
            Ok(())
        } else {
            Err(ClientError::UnknownContract {
                contract: contract.to_string(),
            })
        }
    }

    fn address_of(&self, contract: &str) -> String {
        self.contracts
            .get(contract)
            .map(|c| normalize(&RawValue::from(c.address.as_str())))
            .unwrap_or_default()
    }
}

// ─── Execution ────────────────────────────────────────────────────────────────

/// Execution context of one transaction.
struct Execution<'a> {
    inner: &'a Inner,
    caller: RawValue,
    ledger: Ledger,
    emitted: Vec<Emitted>,
}

impl Execution<'_> {
    fn run(&mut self, call: &ContractCall) -> Result<(), ClientError> {
        self.inner.check_deployed(&call.contract)?;
        match (call.contract.as_str(), call.function.as_str()) {
            (COUNTER_CONTRACT, "increase_counter") => {
                let old = self.ledger.counter;
                let new = old
                    .checked_add(1)
                    .ok_or_else(|| revert(call, "u32_add Overflow"))?;
                self.set_counter(old, new, "Increased");
            }
            (COUNTER_CONTRACT, "decrease_counter") => {
                let old = self.ledger.counter;
                let new = old
                    .checked_sub(1)
                    .ok_or_else(|| revert(call, "Counter can't be negative"))?;
                self.set_counter(old, new, "Decreased");
            }
            (COUNTER_CONTRACT, "set_counter") => {
                self.only_owner(call)?;
                let value = call
                    .args
                    .first()
                    .and_then(|v| decode_strict(v).ok())
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| revert(call, "Failed to deserialize param #1"))?;
                let old = self.ledger.counter;
                self.set_counter(old, value, "Set");
            }
            (COUNTER_CONTRACT, "reset_counter") => {
                let owner = normalize(&self.ledger.owner);
                let spender = self.inner.address_of(COUNTER_CONTRACT);
                let fee = self.inner.reset_fee;
                self.transfer_from(call, &spender, &owner, fee)?;
                let old = self.ledger.counter;
                self.set_counter(old, 0, "Reset");
            }
            (COUNTER_CONTRACT, "transfer_ownership") => {
                self.only_owner(call)?;
                let new_owner = call
                    .args
                    .first()
                    .filter(|v| v.is_truthy())
                    .cloned()
                    .ok_or_else(|| revert(call, "New owner is the zero address"))?;
                let previous = std::mem::replace(&mut self.ledger.owner, new_owner.clone());
                self.emitted.push(Emitted {
                    name: OWNERSHIP_TRANSFERRED,
                    args: RawObject::new()
                        .with_field("previous_owner", felt(&previous))
                        .with_field("new_owner", felt(&new_owner)),
                });
            }
            (FEE_TOKEN, "approve") => {
                let spender = call
                    .args
                    .first()
                    .filter(|v| v.is_truthy())
                    .map(normalize)
                    .ok_or_else(|| revert(call, "ERC20: approve to 0"))?;
                let amount = call
                    .args
                    .get(1)
                    .and_then(|v| decode_strict(v).ok())
                    .ok_or_else(|| revert(call, "Failed to deserialize param #2"))?;
                self.ledger
                    .allowances
                    .insert((normalize(&self.caller), spender), amount);
            }
            _ => {
                return Err(ClientError::UnknownFunction {
                    contract: call.contract.clone(),
                    function: call.function.clone(),
                })
            }
        }
        Ok(())
    }

    fn only_owner(&self, call: &ContractCall) -> Result<(), ClientError> {
        if is_owner(&self.caller, &self.ledger.owner) {
            Ok(())
        } else {
            Err(revert(call, "Caller is not the owner"))
        }
    }

    fn set_counter(&mut self, old: u32, new: u32, variant: &str) {
        self.ledger.counter = new;
        self.emitted.push(Emitted {
            name: COUNTER_CHANGED,
            args: RawObject::new()
                .with_field("caller", felt(&self.caller))
                .with_field("old_value", u64::from(old))
                .with_field("new_value", u64::from(new))
                .with_field("reason", reason_enum(variant)),
        });
    }

    /// Move `amount` of STRK from the caller to `to`, spending the
    /// allowance the caller granted `spender`.
    fn transfer_from(
        &mut self,
        call: &ContractCall,
        spender: &str,
        to: &str,
        amount: U256,
    ) -> Result<(), ClientError> {
        let from = normalize(&self.caller);
        let key = (from.clone(), spender.to_string());
        let allowance = self.ledger.allowances.get(&key).copied().unwrap_or_default();
        if allowance < amount {
            return Err(revert(call, "ERC20: insufficient allowance"));
        }
        let balance = self.ledger.balances.get(&from).copied().unwrap_or_default();
        if balance < amount {
            return Err(revert(call, "ERC20: insufficient balance"));
        }
        self.ledger.allowances.insert(key, allowance - amount);
        self.ledger.balances.insert(from, balance - amount);
        *self.ledger.balances.entry(to.to_string()).or_default() += amount;
        Ok(())
    }
}

fn revert(call: &ContractCall, reason: &str) -> ClientError {
    ClientError::Reverted {
        contract: call.contract.clone(),
        function: call.function.clone(),
        reason: reason.to_string(),
    }
}

/// Contract addresses come back from the chain as bare integers.
fn felt(address: &RawValue) -> RawValue {
    let hex = normalize(address);
    BigInt::parse_hex(&format!("0x{hex}"))
        .map(RawValue::BigInt)
        .unwrap_or_else(|| address.clone())
}

/// A Cairo enum as the contract library decodes it: every variant is a
/// member, only the active one holds a value.
fn reason_enum(active: &str) -> RawValue {
    let variant: RawObject = ["Increased", "Decreased", "Reset", "Set"]
        .into_iter()
        .map(|name| {
            let value = if name == active {
                RawValue::Object(RawObject::new())
            } else {
                RawValue::Undefined
            };
            (name, value)
        })
        .collect();
    RawValue::Object(RawObject::new().with_field("variant", variant))
}

// ─── MemoryClient ─────────────────────────────────────────────────────────────

/// Thread-safe in-memory contract client.
#[derive(Clone)]
pub struct MemoryClient {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryClient {
    /// Deploy a fresh counter owned by `owner`, with `owner` connected and
    /// holding 10 STRK.
    pub fn new(owner: impl Into<RawValue>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new(owner.into()))),
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch the connected account. `Undefined` disconnects.
    pub fn connect(&self, account: impl Into<RawValue>) {
        self.state_mut().account = account.into();
    }

    /// Credit STRK to an account.
    pub fn fund(&self, account: impl Into<RawValue>, amount: U256) {
        let key = normalize(&account.into());
        *self.state_mut().ledger.balances.entry(key).or_default() += amount;
    }

    pub fn balance_of(&self, account: impl Into<RawValue>) -> U256 {
        let key = normalize(&account.into());
        self.state()
            .ledger
            .balances
            .get(&key)
            .copied()
            .unwrap_or_default()
    }

    /// Current counter value, bypassing the read path.
    pub fn counter(&self) -> u32 {
        self.state().ledger.counter
    }

    /// Overwrite the counter without emitting an event.
    pub fn seed_counter(&self, value: u32) {
        self.state_mut().ledger.counter = value;
    }

    /// Remove a contract from the network.
    pub fn undeploy(&self, contract: &str) {
        self.state_mut().contracts.remove(contract);
    }

    /// Delay before `wait_for_receipt` resolves.
    pub fn set_receipt_delay(&self, delay: Duration) {
        self.state_mut().receipt_delay = delay;
    }

    /// Make the next call to `function` (read or write) fail with `error`.
    pub fn fail_next(&self, function: &str, error: ClientError) {
        self.state_mut().failures.insert(function.to_string(), error);
    }

    /// How many times a view function has been read.
    pub fn read_count(&self, function: &str) -> usize {
        self.state().reads.get(function).copied().unwrap_or(0)
    }

    fn execute(&self, calls: Vec<ContractCall>) -> Result<TransactionHash, ClientError> {
        let mut inner = self.state_mut();
        if calls.is_empty() {
            return Err(ClientError::Rejected("empty transaction".into()));
        }
        if !inner.account.is_truthy() {
            return Err(ClientError::Rejected("no account connected".into()));
        }
        for call in &calls {
            if let Some(err) = inner.take_failure(&call.function) {
                return Err(err);
            }
        }

        let mut exec = Execution {
            inner: &inner,
            caller: inner.account.clone(),
            ledger: inner.ledger.clone(),
            emitted: Vec::new(),
        };
        for call in &calls {
            exec.run(call)?;
        }
        let Execution {
            ledger, emitted, ..
        } = exec;

        inner.ledger = ledger;
        let tx_hash = inner.include(emitted);
        debug!(%tx_hash, calls = calls.len(), block = inner.block_number, "transaction included");
        Ok(tx_hash)
    }
}

#[async_trait]
impl ContractClient for MemoryClient {
    fn account(&self) -> RawValue {
        self.state().account.clone()
    }

    async fn read(&self, contract: &str, function: &str) -> Result<RawValue, ClientError> {
        let mut inner = self.state_mut();
        *inner.reads.entry(function.to_string()).or_default() += 1;
        if let Some(err) = inner.take_failure(function) {
            return Err(err);
        }
        inner.check_deployed(contract)?;
        match (contract, function) {
            (COUNTER_CONTRACT, "get_counter") => Ok(RawValue::from(u64::from(inner.ledger.counter))),
            (COUNTER_CONTRACT, "owner") => Ok(felt(&inner.ledger.owner)),
            _ => Err(ClientError::UnknownFunction {
                contract: contract.to_string(),
                function: function.to_string(),
            }),
        }
    }

    async fn write(&self, call: ContractCall) -> Result<TransactionHash, ClientError> {
        self.execute(vec![call])
    }

    async fn multi_write(&self, calls: Vec<ContractCall>) -> Result<TransactionHash, ClientError> {
        self.execute(calls)
    }

    /// Newest first, as the event-history hook delivers them.
    async fn event_history(&self, query: &EventQuery) -> Result<Vec<RawEvent>, ClientError> {
        let inner = self.state();
        inner.check_deployed(&query.contract)?;
        Ok(inner
            .history
            .iter()
            .rev()
            .filter(|(name, ev)| {
                *name == query.event && ev.block_number.unwrap_or(0) >= query.from_block
            })
            .map(|(_, ev)| ev.clone())
            .collect())
    }

    async fn watch_events(&self, query: &EventQuery) -> Result<RawEventStream, ClientError> {
        let mut inner = self.state_mut();
        inner.check_deployed(&query.contract)?;
        let (tx, rx) = mpsc::unbounded();
        inner.watchers.push((query.event.clone(), tx));
        Ok(Box::pin(rx))
    }

    async fn deployed_info(&self, contract: &str) -> Result<Option<DeployedContract>, ClientError> {
        Ok(self.state().contracts.get(contract).cloned())
    }

    async fn wait_for_receipt(&self, tx: &TransactionHash) -> Result<Receipt, ClientError> {
        let delay = self.state().receipt_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.state()
            .receipts
            .get(tx.as_str())
            .cloned()
            .ok_or_else(|| ClientError::Receipt {
                tx_hash: tx.to_string(),
                reason: "unknown transaction".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use counterdash_core::{decode, decode_reason, ChangeReason, CounterEvent};

    const OWNER: &str = "0x04a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f";
    const OTHER: &str = "0x0abc";

    fn call(contract: &str, function: &str) -> ContractCall {
        ContractCall::new(contract, function)
    }

    #[tokio::test]
    async fn increase_emits_counter_changed() {
        let client = MemoryClient::new(OWNER);
        client.write(call(COUNTER_CONTRACT, "increase_counter")).await.unwrap();
        assert_eq!(client.counter(), 1);

        let events = client
            .event_history(&EventQuery::new(COUNTER_CONTRACT, COUNTER_CHANGED))
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        let ev = CounterEvent::from(&events[0]);
        assert_eq!(decode_reason(&ev.reason), ChangeReason::Increased);
        assert_eq!(decode(&ev.new_value), "1");
        assert!(counterdash_core::equals(&ev.caller, &RawValue::from(OWNER)));
    }

    #[tokio::test]
    async fn decrease_below_zero_reverts() {
        let client = MemoryClient::new(OWNER);
        let err = client
            .write(call(COUNTER_CONTRACT, "decrease_counter"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Reverted { .. }));
        assert_eq!(client.counter(), 0);
    }

    #[tokio::test]
    async fn set_counter_is_owner_only() {
        let client = MemoryClient::new(OWNER);
        client.connect(OTHER);
        let err = client
            .write(call(COUNTER_CONTRACT, "set_counter").arg(5u64))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "call CounterContract.set_counter reverted: Caller is not the owner");

        client.connect(OWNER);
        client
            .write(call(COUNTER_CONTRACT, "set_counter").arg(5u64))
            .await
            .unwrap();
        assert_eq!(client.counter(), 5);
    }

    #[tokio::test]
    async fn reset_needs_approval_in_same_transaction() {
        let client = MemoryClient::new(OWNER);
        client.seed_counter(7);
        client.connect(OTHER);
        client.fund(OTHER, U256::from(RESET_FEE));

        let err = client
            .write(call(COUNTER_CONTRACT, "reset_counter"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient allowance"));

        let approve = call(FEE_TOKEN, "approve")
            .arg(COUNTER_ADDRESS)
            .arg(U256::from(RESET_FEE));
        client
            .multi_write(vec![approve, call(COUNTER_CONTRACT, "reset_counter")])
            .await
            .unwrap();
        assert_eq!(client.counter(), 0);
        assert_eq!(client.balance_of(OTHER), U256::ZERO);
        assert_eq!(
            client.balance_of(OWNER),
            U256::from(RESET_FEE) * U256::from(11u64)
        );
    }

    #[tokio::test]
    async fn failed_multicall_is_atomic() {
        let client = MemoryClient::new(OWNER);
        client.seed_counter(3);
        client.connect(OTHER);
        // approval succeeds, reset fails on balance: nothing is committed
        let approve = call(FEE_TOKEN, "approve")
            .arg(COUNTER_ADDRESS)
            .arg(U256::from(RESET_FEE));
        let err = client
            .multi_write(vec![approve, call(COUNTER_CONTRACT, "reset_counter")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("insufficient balance"));
        assert_eq!(client.counter(), 3);
        assert!(client.state().ledger.allowances.is_empty());
    }

    #[tokio::test]
    async fn ownership_history_starts_at_deployment() {
        let client = MemoryClient::new(OWNER);
        client
            .write(call(COUNTER_CONTRACT, "transfer_ownership").arg(OTHER))
            .await
            .unwrap();
        let events = client
            .event_history(&EventQuery::new(COUNTER_CONTRACT, OWNERSHIP_TRANSFERRED))
            .await
            .unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].arg("previous_owner"), RawValue::from(BigInt::ZERO));
        assert!(events[0].block_number > events[1].block_number);
        let owner = client.read(COUNTER_CONTRACT, "owner").await.unwrap();
        assert!(counterdash_core::equals(&owner, &RawValue::from(OTHER)));
    }

    #[tokio::test]
    async fn unknown_contract_and_function() {
        let client = MemoryClient::new(OWNER);
        assert!(matches!(
            client.read("Nope", "get_counter").await,
            Err(ClientError::UnknownContract { .. })
        ));
        assert!(matches!(
            client.read(COUNTER_CONTRACT, "nope").await,
            Err(ClientError::UnknownFunction { .. })
        ));
        client.undeploy(COUNTER_CONTRACT);
        assert_eq!(client.deployed_info(COUNTER_CONTRACT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn watchers_receive_new_events() {
        use futures::StreamExt;

        let client = MemoryClient::new(OWNER);
        let mut stream = client
            .watch_events(&EventQuery::new(COUNTER_CONTRACT, COUNTER_CHANGED))
            .await
            .unwrap();
        client.write(call(COUNTER_CONTRACT, "increase_counter")).await.unwrap();
        let ev = stream.next().await.unwrap().unwrap();
        assert_eq!(decode(&ev.arg("new_value")), "1");
    }

    #[tokio::test]
    async fn receipts_are_recorded() {
        let client = MemoryClient::new(OWNER);
        let tx = client.write(call(COUNTER_CONTRACT, "increase_counter")).await.unwrap();
        let receipt = client.wait_for_receipt(&tx).await.unwrap();
        assert!(receipt.is_success());
        assert_eq!(receipt.block_number, Some(2));
    }

    #[tokio::test]
    async fn disconnected_account_cannot_write() {
        let client = MemoryClient::new(OWNER);
        client.connect(RawValue::Undefined);
        assert!(matches!(
            client.write(call(COUNTER_CONTRACT, "increase_counter")).await,
            Err(ClientError::Rejected(_))
        ));
    }
}
