// src/contracts/did_registry.rs
//! DID Registry smart contract interface implementation.
//!
//! Provides an abstraction layer over the `DIDRegistry` contract. Supports DID
//! lifecycle (create, update, deactivate), verification issuance and revocation,
//! role management, pausing, and the per-verifier queries the aggregator needs.

use crate::blockchain::chain_client::ChainClient;
use crate::contracts::{first_indexed_topic, DidReader, VerificationSource};
use crate::error::RegistryError;
use crate::models::did::{
    DidMetadata, RawVerification, VerificationLevel, VerificationRecord, VERIFIER_ROLE,
};
use crate::utils::crypto::hash_data;
use async_trait::async_trait;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::{Address, BlockNumber, Bytes, Filter, Log, TransactionReceipt, H256, U256};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;

/// Parsed `DIDRegistry` ABI (compile-time included).
pub static DID_REGISTRY_ABI: Lazy<Abi> = Lazy::new(|| {
    Abi::load(&include_bytes!("../abi/DIDRegistry.json")[..]).expect("Failed to load DIDRegistry ABI")
});

/// DID Registry smart contract interface.
///
/// This struct provides high-level methods to interact with the DID Registry contract:
/// - DID creation, update and deactivation
/// - Verification issuance and revocation
/// - DID and verification queries
/// - Role and pause management
#[derive(Clone)]
pub struct DidRegistry {
    /// Shared chain client
    client: Arc<ChainClient>,
    /// Address of the deployed DIDRegistry contract
    address: Address,
}

impl DidRegistry {
    /// Creates a new DidRegistry instance.
    ///
    /// # Arguments
    /// * `client` - Shared chain client (read-only or with a session)
    /// * `address` - Address of deployed DIDRegistry contract
    pub fn new(client: Arc<ChainClient>, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn query<R: Detokenize>(&self, method: &str, params: impl Tokenize) -> Result<R, RegistryError> {
        self.client
            .query_contract(self.address, &DID_REGISTRY_ABI, method, params)
            .await
    }

    /// `DIDCreated` logs of this registry since genesis.
    fn created_filter(&self) -> Result<Filter, RegistryError> {
        let signature = DID_REGISTRY_ABI
            .event("DIDCreated")
            .map_err(|e| RegistryError::contract("DIDCreated", e))?
            .signature();
        Ok(Filter::new()
            .address(self.address)
            .topic0(signature)
            .from_block(BlockNumber::Earliest))
    }

    async fn submit(
        &self,
        method: &str,
        params: impl Tokenize,
        action: &str,
    ) -> Result<TransactionReceipt, RegistryError> {
        self.client
            .send_transaction(self.address, &DID_REGISTRY_ABI, method, params, action)
            .await
    }

    // =====================
    // DID Management
    // =====================

    /// Creates a new DID owned by the session account.
    ///
    /// # Arguments
    /// * `identifiers` - Identifier strings (emails, handles, ...); each is
    ///   stored on-chain as its keccak256 hash
    ///
    /// # Returns
    /// The new DID id, read from the `DIDCreated` event
    pub async fn create_did(&self, identifiers: &[String]) -> Result<H256, RegistryError> {
        let hashed = hash_identifiers(identifiers)?;
        let receipt = self.submit("createDID", (hashed,), "create DID").await?;
        let did_id = first_indexed_topic(&DID_REGISTRY_ABI, &receipt, self.address, "DIDCreated")?;
        info!("created DID {:#x}", did_id);
        Ok(did_id)
    }

    /// Replaces the identifiers of an existing DID.
    pub async fn update_did(&self, did_id: H256, identifiers: &[String]) -> Result<(), RegistryError> {
        let hashed = hash_identifiers(identifiers)?;
        self.submit("updateDID", (did_id, hashed), "update DID").await?;
        Ok(())
    }

    pub async fn deactivate_did(&self, did_id: H256) -> Result<(), RegistryError> {
        self.submit("deactivateDID", (did_id,), "deactivate DID").await?;
        Ok(())
    }

    // =====================
    // Verification Management
    // =====================

    /// Adds (or replaces) the session verifier's verification of `did_id`.
    ///
    /// # Arguments
    /// * `did_id` - DID being verified
    /// * `level` - Trust tier; `None` is rejected
    /// * `expiration` - Expiry, seconds since epoch
    /// * `metadata` - Encoded metadata, see [`crate::utils::metadata::encode`]
    pub async fn add_verification(
        &self,
        did_id: H256,
        level: VerificationLevel,
        expiration: u64,
        metadata: Bytes,
    ) -> Result<(), RegistryError> {
        if level == VerificationLevel::None {
            return Err(RegistryError::InvalidInput("verification level must be at least Basic".into()));
        }
        self.submit(
            "addVerification",
            (did_id, U256::from(level.as_u64()), U256::from(expiration), metadata),
            "add verification",
        )
        .await?;
        Ok(())
    }

    /// Revokes the session verifier's verification of `did_id`.
    pub async fn revoke_verification(&self, did_id: H256) -> Result<(), RegistryError> {
        self.submit("revokeVerification", (did_id,), "revoke verification").await?;
        Ok(())
    }

    // =====================
    // Role Management
    // =====================

    pub async fn grant_role(&self, role: H256, account: Address) -> Result<(), RegistryError> {
        self.submit("grantRole", (role, account), "grant role").await?;
        Ok(())
    }

    pub async fn revoke_role(&self, role: H256, account: Address) -> Result<(), RegistryError> {
        self.submit("revokeRole", (role, account), "revoke role").await?;
        Ok(())
    }

    // =====================
    // System Management
    // =====================

    pub async fn pause(&self) -> Result<(), RegistryError> {
        self.submit("pause", (), "pause contract").await?;
        Ok(())
    }

    pub async fn unpause(&self) -> Result<(), RegistryError> {
        self.submit("unpause", (), "unpause contract").await?;
        Ok(())
    }

    pub async fn paused(&self) -> Result<bool, RegistryError> {
        self.query("paused", ()).await
    }
}

#[async_trait]
impl VerificationSource for DidRegistry {
    async fn verifier_set(&self) -> Result<Vec<Address>, RegistryError> {
        self.query("getRoleMemberArray", (*VERIFIER_ROLE,)).await
    }

    async fn verification(&self, did_id: H256, verifier: Address) -> Result<VerificationRecord, RegistryError> {
        let raw: RawVerification = self.query("getVerification", (did_id, verifier)).await?;
        Ok(VerificationRecord::from(raw))
    }
}

#[async_trait]
impl DidReader for DidRegistry {
    async fn did_owner(&self, did_id: H256) -> Result<Address, RegistryError> {
        self.query("getDIDOwner", (did_id,)).await
    }

    async fn did_identifiers(&self, did_id: H256) -> Result<Vec<H256>, RegistryError> {
        self.query("getDIDIdentifiers", (did_id,)).await
    }

    async fn did_metadata(&self, did_id: H256) -> Result<DidMetadata, RegistryError> {
        let raw: (U256, U256, bool) = self.query("getDIDMetadata", (did_id,)).await?;
        Ok(DidMetadata::from(raw))
    }

    async fn is_verified(&self, did_id: H256) -> Result<bool, RegistryError> {
        self.query("isVerified", (did_id,)).await
    }

    async fn has_role(&self, role: H256, account: Address) -> Result<bool, RegistryError> {
        self.query("hasRole", (role, account)).await
    }

    /// Finds the DID currently owned by `owner`.
    ///
    /// Scans `DIDCreated` logs for the owner, takes the most recent one and
    /// confirms the DID is still owned by that address.
    async fn did_by_owner(&self, owner: Address) -> Result<Option<H256>, RegistryError> {
        let filter = self.created_filter()?.topic2(H256::from(owner));

        let logs = self.client.get_logs(&filter).await?;
        let did_id = match logs.last().and_then(|log| log.topics.get(1).copied()) {
            Some(did_id) => did_id,
            None => return Ok(None),
        };

        let current_owner = self.did_owner(did_id).await?;
        debug!("DID {:#x} created by {:#x}, now owned by {:#x}", did_id, owner, current_owner);
        Ok((current_owner == owner).then_some(did_id))
    }

    /// Lists every DID from the full `DIDCreated` history.
    async fn all_dids(&self) -> Result<Vec<H256>, RegistryError> {
        let logs = self.client.get_logs(&self.created_filter()?).await?;
        let dids = created_dids(&logs);
        debug!("{} DIDCreated logs, {} distinct DIDs", logs.len(), dids.len());
        Ok(dids)
    }
}

/// DID ids carried by `DIDCreated` logs, first occurrence kept.
fn created_dids(logs: &[Log]) -> Vec<H256> {
    let mut seen = HashSet::new();
    logs.iter()
        .filter_map(|log| log.topics.get(1).copied())
        .filter(|did_id| seen.insert(*did_id))
        .collect()
}

/// Hashes identifier strings into the `bytes32` values the contract stores.
///
/// Blank entries are dropped; the rest are hashed exactly as given.
pub fn hash_identifiers(identifiers: &[String]) -> Result<Vec<H256>, RegistryError> {
    let hashed: Vec<H256> = identifiers
        .iter()
        .filter(|id| !id.trim().is_empty())
        .map(|id| H256::from(hash_data(id.as_bytes())))
        .collect();
    if hashed.is_empty() {
        return Err(RegistryError::InvalidInput("at least one identifier is required".into()));
    }
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::tag;
    use ethers_core::abi::{self, Token};
    use mockito::{mock, Matcher};

    fn word(token: Token) -> String {
        format!("0x{}", ethers_core::utils::hex::encode(abi::encode(&[token])))
    }

    fn registry_at(url: &str) -> DidRegistry {
        let client = ChainClient::read_only(url).unwrap();
        DidRegistry::new(Arc::new(client), Address::repeat_byte(0x42))
    }

    #[test]
    fn test_abi_contains_expected_methods() {
        for method in ["getVerification", "getRoleMemberArray", "createDID", "addVerification"] {
            assert!(DID_REGISTRY_ABI.function(method).is_ok(), "missing {}", method);
        }
        assert!(DID_REGISTRY_ABI.event("DIDCreated").is_ok());
    }

    #[test]
    fn test_hash_identifiers_skips_blanks() {
        let hashed = hash_identifiers(&["alice@example.com".to_string(), "  ".to_string()]).unwrap();
        assert_eq!(hashed, vec![tag("alice@example.com")]);
        assert!(matches!(
            hash_identifiers(&[String::new()]),
            Err(RegistryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_hash_identifiers_keeps_surrounding_whitespace() {
        let hashed = hash_identifiers(&[" alice".to_string()]).unwrap();
        assert_eq!(hashed, vec![tag(" alice")]);
        assert_ne!(hashed, vec![tag("alice")]);
    }

    #[test]
    fn test_created_dids_dedupes_in_order() {
        let created = |id: u8| Log {
            topics: vec![H256::repeat_byte(0xaa), H256::repeat_byte(id), H256::from(Address::repeat_byte(id))],
            ..Default::default()
        };
        let logs = vec![
            created(0x02),
            created(0x01),
            created(0x02),
            Log::default(),
            created(0x03),
        ];
        assert_eq!(
            created_dids(&logs),
            vec![H256::repeat_byte(0x02), H256::repeat_byte(0x01), H256::repeat_byte(0x03)]
        );
    }

    #[tokio::test]
    async fn test_did_owner_over_json_rpc() {
        let owner = Address::repeat_byte(0x05);
        let body = format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#,
            word(Token::Address(owner))
        );
        let _m = mock("POST", "/")
            .match_body(Matcher::PartialJsonString(r#"{"method":"eth_call"}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        let registry = registry_at(&mockito::server_url());
        let result = registry.did_owner(H256::repeat_byte(0x01)).await.unwrap();
        assert_eq!(result, owner);
    }

    #[tokio::test]
    async fn test_all_dids_over_json_rpc() {
        let signature = format!("{:#x}", DID_REGISTRY_ABI.event("DIDCreated").unwrap().signature());
        let log = |id: u8| {
            format!(
                r#"{{"address":"{:#x}","topics":["{}","{:#x}","{:#x}"],"data":"0x"}}"#,
                Address::repeat_byte(0x42),
                signature,
                H256::repeat_byte(id),
                H256::from(Address::repeat_byte(0x05)),
            )
        };
        let body = format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":[{},{},{}]}}"#,
            log(0x0b),
            log(0x0a),
            log(0x0b)
        );
        let _m = mock("POST", "/")
            .match_body(Matcher::PartialJsonString(r#"{"method":"eth_getLogs"}"#.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        let registry = registry_at(&mockito::server_url());
        let dids = registry.all_dids().await.unwrap();
        assert_eq!(dids, vec![H256::repeat_byte(0x0b), H256::repeat_byte(0x0a)]);
    }

    #[tokio::test]
    async fn test_submission_without_session_fails() {
        let registry = registry_at("http://localhost:8545");
        let result = registry.revoke_verification(H256::zero()).await;
        assert!(matches!(result, Err(RegistryError::NoSession)));
    }

    #[tokio::test]
    async fn test_add_verification_rejects_level_none() {
        let registry = registry_at("http://localhost:8545");
        let result = registry
            .add_verification(H256::zero(), VerificationLevel::None, 0, Bytes::default())
            .await;
        assert!(matches!(result, Err(RegistryError::InvalidInput(_))));
    }
}
