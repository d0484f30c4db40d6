// src/main.rs

//! # DID / Document Registry Client - Main Entry Point
//!
//! Loads configuration, connects to the chain and starts the API server.
//!
//! ## Initialization Sequence
//! 1. Load `.env` and settings (see [`did_registry_client::config`])
//! 2. Connect to the JSON-RPC endpoint, with a signing session when a private key
//!    is configured
//! 3. Build the registry adapters, views and submitter
//! 4. Start API server

use anyhow::{Context, Result};
use did_registry_client::blockchain::chain_client::ChainClient;
use did_registry_client::blockchain::session::Session;
use did_registry_client::config::Settings;
use did_registry_client::contracts::did_registry::DidRegistry;
use did_registry_client::contracts::document_registry::DocumentRegistry;
use did_registry_client::services::api_server::{ApiServer, Submitter};
use did_registry_client::services::registry_views::RegistryViews;
use did_registry_client::services::verification_aggregator::VerificationAggregator;
use dotenv::dotenv;
use log::{info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let settings = Settings::load().context("failed to load settings")?;

    let client = match &settings.private_key {
        Some(key) => {
            let session = Session::from_private_key(key)?;
            ChainClient::with_session(&settings.rpc_url, session)
                .await
                .context("failed to connect signing client")?
        }
        None => {
            warn!("no private key configured, serving read-only");
            ChainClient::read_only(&settings.rpc_url)?
        }
    };
    let session_address = client.session_address();
    let client = Arc::new(client);

    let dids = DidRegistry::new(client.clone(), settings.did_registry()?);
    let documents = DocumentRegistry::new(client, settings.document_registry()?);

    let aggregator = VerificationAggregator::new(settings.aggregation_policy());
    info!("aggregation policy: {:?}", aggregator.policy());

    let views = RegistryViews::new(
        Arc::new(dids.clone()),
        Arc::new(documents.clone()),
        aggregator,
        session_address,
    );
    let submitter = session_address.map(|_| Submitter::new(dids, documents));

    let api_server = ApiServer::new(views, submitter);
    api_server
        .run(settings.listen_addr()?)
        .await
        .context("API server terminated")?;
    Ok(())
}
