// src/services/mod.rs
//! Read-side services and the HTTP API.

pub mod api_server;
pub mod registry_views;
pub mod signature_reconciler;
pub mod verification_aggregator;
