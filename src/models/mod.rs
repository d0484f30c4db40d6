// src/models/mod.rs
//! Data structures read from and written to the registries.

pub mod did;
pub mod document;

use ethers_core::types::U256;

/// Narrows an on-chain `uint256` to `u64`, saturating at `u64::MAX`.
pub(crate) fn saturating_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
