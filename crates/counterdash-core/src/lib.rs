//! # counterdash-core
//!
//! Pure, synchronous building blocks of the counter dashboard: the
//! loosely-typed value model, address normalization, display decoding of
//! contract values and change reasons, and the presentation of event
//! histories. Nothing in this crate performs I/O.

pub mod address;
pub mod decoder;
pub mod error;
pub mod event;
pub mod presenter;
pub mod reason;
pub mod selector;
pub mod value;

pub use address::{equals, format_hex, is_owner, normalize, shorten};
pub use decoder::{decode, decode_reason, decode_strict, decode_traced, DecodeRule, Decoded};
pub use error::{ClientError, DashboardError, DecodeError};
pub use event::{
    CounterEvent, EventQuery, OwnershipTransferredEvent, RawEvent, COUNTER_CHANGED,
    OWNERSHIP_TRANSFERRED,
};
pub use presenter::{
    present, present_ownership, PresentedCounterChange, PresentedOwnershipTransfer,
};
pub use reason::ChangeReason;
pub use selector::{sn_keccak, Selector};
pub use value::{BigInt, RawObject, RawValue};
