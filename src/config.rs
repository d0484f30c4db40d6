// src/config.rs
//! Runtime configuration.
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults
//! 2. Optional `registry.toml` in the working directory
//! 3. `REGISTRY_*` environment variables (a `.env` file is loaded by `main`)
//!
//! ## Environment Variables
//! - `REGISTRY_RPC_URL`: JSON-RPC endpoint (default: http://localhost:8545)
//! - `REGISTRY_DID_REGISTRY_ADDRESS`: Deployed DIDRegistry contract address
//! - `REGISTRY_DOCUMENT_REGISTRY_ADDRESS`: Deployed DocumentRegistry contract address
//! - `REGISTRY_PRIVATE_KEY`: (Optional) hex key enabling submissions
//! - `REGISTRY_LISTEN_ADDR`: (Optional) API bind address (default: 127.0.0.1:3000)
//! - `REGISTRY_STATUS_PRECEDENCE`: (Optional) `revoked` or `expired`
//! - `REGISTRY_TIE_BREAK`: (Optional) `newest_timestamp`, `latest_expiration` or `verifier_order`

use crate::error::RegistryError;
use crate::services::verification_aggregator::{AggregationPolicy, StatusPrecedence, TieBreak};
use config::{Config, Environment, File};
use ethers_core::types::Address;
use serde::Deserialize;
use std::net::SocketAddr;
use std::str::FromStr;

/// Fully resolved settings for the client and the API server.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rpc_url: String,
    pub did_registry_address: String,
    pub document_registry_address: String,
    #[serde(default)]
    pub private_key: Option<String>,
    pub listen_addr: String,
    pub status_precedence: StatusPrecedence,
    pub tie_break: TieBreak,
}

impl Settings {
    /// Loads settings from `registry.toml` (if present) and `REGISTRY_*` variables.
    pub fn load() -> Result<Self, RegistryError> {
        Self::load_from(Environment::with_prefix("REGISTRY"))
    }

    /// Loads settings with an explicit environment source.
    pub fn load_from(env: Environment) -> Result<Self, RegistryError> {
        let settings: Settings = Config::builder()
            .set_default("rpc_url", "http://localhost:8545")?
            .set_default("listen_addr", "127.0.0.1:3000")?
            .set_default("status_precedence", "revoked")?
            .set_default("tie_break", "newest_timestamp")?
            .add_source(File::with_name("registry").required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), RegistryError> {
        self.did_registry()?;
        self.document_registry()?;
        self.listen_addr()?;
        Ok(())
    }

    pub fn did_registry(&self) -> Result<Address, RegistryError> {
        parse_address("did_registry_address", &self.did_registry_address)
    }

    pub fn document_registry(&self) -> Result<Address, RegistryError> {
        parse_address("document_registry_address", &self.document_registry_address)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, RegistryError> {
        SocketAddr::from_str(&self.listen_addr)
            .map_err(|e| RegistryError::Config(format!("listen_addr `{}`: {}", self.listen_addr, e)))
    }

    /// Display policy handed to the verification aggregator.
    pub fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy {
            status_precedence: self.status_precedence,
            tie_break: self.tie_break,
        }
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, RegistryError> {
    Address::from_str(value).map_err(|e| RegistryError::Config(format!("{} `{}`: {}", field, value, e)))
}
