// src/blockchain/mod.rs
//! JSON-RPC connectivity and the signing session.

pub mod chain_client;
pub mod session;
