//! Starknet selector computation.
//!
//! An event's first key is `sn_keccak(name)`: keccak256 of the bare event
//! name, truncated to 250 bits so it fits in a felt.
//!   sn_keccak("Transfer")
//!   → 0x0099cd8bde557814842a3121e8ddfd433a539b8c9f14bf31ebf108d12e6196e9

use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

/// A 250-bit Starknet selector, stored as `0x` + 64 lowercase hex digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector(String);

impl Selector {
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the selector of an event or entry-point name.
pub fn sn_keccak(name: &str) -> Selector {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(name.as_bytes());
    hasher.finalize(&mut output);
    // keep the low 250 bits
    output[0] &= 0x03;
    Selector(format!("0x{}", hex::encode(output)))
}
