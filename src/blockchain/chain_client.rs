// src/blockchain/chain_client.rs
//! EVM JSON-RPC client.
//!
//! Provides a high-level interface for the registry contracts:
//! - Read-only contract queries (`eth_call`) through a plain provider
//! - Submit-and-confirm transactions through an optional signing [`Session`]
//! - Log queries for event lookups

use crate::blockchain::session::Session;
use crate::error::RegistryError;
use ethers::providers::{is_local_endpoint, Http, Middleware, Provider, DEFAULT_LOCAL_POLL_INTERVAL};
use ethers::signers::{LocalWallet, Signer};
use ethers::middleware::SignerMiddleware;
use ethers_contract::Contract;
use ethers_core::{
    abi::{Abi, Detokenize, Tokenize},
    types::{Address, Filter, Log, TransactionReceipt, H256, U256},
};
use log::{debug, info};
use std::sync::Arc;

type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Blockchain client for contract queries and transaction submission.
///
/// Reads always go through the bare provider. Writes require a [`Session`];
/// a client built without one is read-only and every submission fails with
/// [`RegistryError::NoSession`].
#[derive(Clone)]
pub struct ChainClient {
    /// JSON-RPC provider
    provider: Arc<Provider<Http>>,
    /// Signer middleware, present only when a session is attached
    signer: Option<Arc<SigningClient>>,
}

impl ChainClient {
    /// Creates a read-only client.
    ///
    /// # Arguments
    /// * `rpc_url` - JSON-RPC endpoint URL
    ///
    /// # Errors
    /// Returns error if the URL cannot be parsed
    pub fn read_only(rpc_url: &str) -> Result<Self, RegistryError> {
        let mut provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| RegistryError::Provider(format!("invalid rpc url `{}`: {}", rpc_url, e)))?;
        // Local dev nodes mine immediately; poll receipts faster than the 7s default
        if is_local_endpoint(rpc_url) {
            provider.set_interval(DEFAULT_LOCAL_POLL_INTERVAL);
        }
        Ok(Self {
            provider: Arc::new(provider),
            signer: None,
        })
    }

    /// Creates a client able to submit transactions.
    ///
    /// The session's wallet is bound to the chain id reported by the node.
    ///
    /// # Errors
    /// Returns error if:
    /// - The URL cannot be parsed
    /// - Chain ID cannot be retrieved
    pub async fn with_session(rpc_url: &str, session: Session) -> Result<Self, RegistryError> {
        let client = Self::read_only(rpc_url)?;
        let chain_id = client.provider.get_chainid().await?.as_u64();
        let wallet = session.into_wallet().with_chain_id(chain_id);
        info!("signing session for {:#x} on chain {}", wallet.address(), chain_id);

        let signer = SignerMiddleware::new((*client.provider).clone(), wallet);
        Ok(Self {
            provider: client.provider,
            signer: Some(Arc::new(signer)),
        })
    }

    /// Address of the session account, if any.
    pub fn session_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    /// Queries a smart contract (read-only operation).
    ///
    /// # Arguments
    /// * `contract_address` - Address of the target contract
    /// * `abi` - Parsed contract ABI
    /// * `method` - Method name to call
    /// * `params` - Method parameters
    ///
    /// # Errors
    /// Returns [`RegistryError::Contract`] if the method is unknown, the call reverts,
    /// or the return value cannot be decoded
    pub async fn query_contract<R: Detokenize>(
        &self,
        contract_address: Address,
        abi: &Abi,
        method: &str,
        params: impl Tokenize,
    ) -> Result<R, RegistryError> {
        let contract = Contract::new(contract_address, abi.clone(), self.provider.clone());
        debug!("eth_call {}@{:#x}", method, contract_address);

        contract
            .method::<_, R>(method, params)
            .map_err(|e| RegistryError::contract(method, e))?
            .call()
            .await
            .map_err(|e| RegistryError::contract(method, e))
    }

    /// Sends a transaction and waits for its receipt.
    ///
    /// # Arguments
    /// * `contract_address` - Address of the target contract
    /// * `abi` - Parsed contract ABI
    /// * `method` - Method name to call
    /// * `params` - Method parameters
    /// * `action` - Human readable action used in error messages
    ///
    /// # Errors
    /// Returns error if:
    /// - No session is configured
    /// - The signer rejects the request ([`RegistryError::Rejected`])
    /// - The transaction is dropped or the node fails ([`RegistryError::Submission`])
    /// - The transaction reverts ([`RegistryError::Reverted`])
    ///
    /// # Gas Usage
    /// Uses fixed gas limit of 3,000,000
    pub async fn send_transaction(
        &self,
        contract_address: Address,
        abi: &Abi,
        method: &str,
        params: impl Tokenize,
        action: &str,
    ) -> Result<TransactionReceipt, RegistryError> {
        let signer = self.signer.clone().ok_or(RegistryError::NoSession)?;
        let contract = Contract::new(contract_address, abi.clone(), signer);

        let call = contract
            .method::<_, H256>(method, params)
            .map_err(|e| RegistryError::contract(method, e))?
            .gas(U256::from(3_000_000u64));

        let pending = call
            .send()
            .await
            .map_err(|e| RegistryError::submission(action, e))?;
        let tx_hash = format!("{:#x}", pending.tx_hash());
        info!("{} submitted: {}", action, tx_hash);

        let receipt = pending
            .await
            .map_err(|e| RegistryError::submission(action, e))?
            .ok_or_else(|| RegistryError::submission(action, format!("transaction {} was dropped", tx_hash)))?;

        if receipt.status.map(|s| s.as_u64()) == Some(0) {
            return Err(RegistryError::Reverted { tx_hash });
        }
        debug!("{} confirmed in block {:?}", action, receipt.block_number);
        Ok(receipt)
    }

    /// Fetches logs matching `filter`.
    pub async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>, RegistryError> {
        self.provider.get_logs(filter).await.map_err(Into::into)
    }
}
