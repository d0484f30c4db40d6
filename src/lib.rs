// src/lib.rs
//! # DID / Document Registry Client
//!
//! Client for a pair of EVM registry contracts: a DID registry where verifiers
//! attest identities at graded trust levels, and a document registry where
//! documents are registered against DIDs and collect signatures.
//!
//! ## Architecture Overview
//! 1. **Blockchain Layer**: [`blockchain::chain_client::ChainClient`] for JSON-RPC reads
//!    and session-signed submissions
//! 2. **Contract Layer**: typed adapters over both registries and the read traits
//!    the services depend on
//! 3. **Services Layer**: verification aggregation, signature reconciliation,
//!    registry views and the REST API
//! 4. **Utilities**: metadata codec, tag hashing and display formatting

pub mod blockchain;
pub mod config;
pub mod contracts;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod testing;
