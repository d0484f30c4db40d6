// src/utils/crypto.rs
//! Keccak-256 helpers for the `bytes32` tags the registries use.
//!
//! Roles, statuses, document types and signature types are all stored on-chain as
//! `keccak256(name)`, the same value Solidity computes with
//! `keccak256(abi.encodePacked("NAME"))`.

use ethers_core::types::H256;
use ethers_core::utils::keccak256;

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Returns the `bytes32` tag for a well-known name, e.g. `tag("VERIFIER_ROLE")`.
pub fn tag(name: &str) -> H256 {
    H256::from(hash_data(name.as_bytes()))
}
