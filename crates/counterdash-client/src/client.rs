//! `ContractClient` trait: abstraction over the contract-interaction library.
//!
//! Wallet sessions, RPC transport, signing and event indexing all live behind
//! this trait. The dashboard only ever talks to a `dyn ContractClient`.

use async_trait::async_trait;
use counterdash_core::{ClientError, EventQuery, RawEvent, RawValue};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;

/// A live feed of raw events for one query.
pub type RawEventStream = Pin<Box<dyn Stream<Item = Result<RawEvent, ClientError>> + Send>>;

/// Hash of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionHash(pub String);

impl TransactionHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One contract invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract: String,
    pub function: String,
    #[serde(default)]
    pub args: Vec<RawValue>,
}

impl ContractCall {
    pub fn new(contract: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<RawValue>) -> Self {
        self.args.push(value.into());
        self
    }
}

/// Final state of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Succeeded,
    Reverted { reason: String },
}

/// Receipt of an included transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TransactionHash,
    pub block_number: Option<u64>,
    pub status: ExecutionStatus,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
    }
}

/// Deployment record of a named contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContract {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_hash: Option<String>,
}

/// The external collaborator the dashboard delegates all chain access to.
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// The connected account, `Undefined` while no wallet is connected.
    fn account(&self) -> RawValue {
        RawValue::Undefined
    }

    /// Call a view function. Refetching is simply another call.
    async fn read(&self, contract: &str, function: &str) -> Result<RawValue, ClientError>;

    /// Submit a single invocation. Returns once the transaction is accepted,
    /// not once it is included.
    async fn write(&self, call: ContractCall) -> Result<TransactionHash, ClientError>;

    /// Submit several invocations as one atomic transaction.
    async fn multi_write(&self, calls: Vec<ContractCall>) -> Result<TransactionHash, ClientError>;

    /// Historical events matching `query`, in the order the indexer returns
    /// them.
    async fn event_history(&self, query: &EventQuery) -> Result<Vec<RawEvent>, ClientError>;

    /// Events emitted after the call. Clients without a live feed return an
    /// empty stream.
    async fn watch_events(&self, _query: &EventQuery) -> Result<RawEventStream, ClientError> {
        Ok(Box::pin(futures::stream::empty()))
    }

    /// Address and class hash of a named contract, `None` when the contract
    /// is not deployed on the connected network.
    async fn deployed_info(&self, contract: &str) -> Result<Option<DeployedContract>, ClientError>;

    /// Resolve once the transaction is included.
    async fn wait_for_receipt(&self, tx: &TransactionHash) -> Result<Receipt, ClientError>;
}
