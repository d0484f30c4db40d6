// src/contracts/mod.rs
//! Smart contract interfaces.
//!
//! The read traits below are the only boundary the aggregation and view code
//! depends on. [`did_registry::DidRegistry`] and
//! [`document_registry::DocumentRegistry`] implement them against the deployed
//! contracts; tests implement them in memory.

pub mod did_registry;
pub mod document_registry;

use crate::error::RegistryError;
use crate::models::did::{DidMetadata, DidRecord, VerificationRecord, VERIFIER_ROLE};
use crate::models::document::{DocumentRecord, DocumentSignature};
use async_trait::async_trait;
use ethers_core::abi::Abi;
use ethers_core::types::{Address, TransactionReceipt, H256};
use std::str::FromStr;

/// Per-verifier verification lookups.
#[async_trait]
pub trait VerificationSource: Send + Sync {
    /// Current members of `VERIFIER_ROLE`.
    async fn verifier_set(&self) -> Result<Vec<Address>, RegistryError>;

    /// The record `verifier` holds for `did_id`; a zero verifier means none.
    async fn verification(&self, did_id: H256, verifier: Address) -> Result<VerificationRecord, RegistryError>;
}

/// Read access to DID records.
#[async_trait]
pub trait DidReader: VerificationSource {
    async fn did_owner(&self, did_id: H256) -> Result<Address, RegistryError>;
    async fn did_identifiers(&self, did_id: H256) -> Result<Vec<H256>, RegistryError>;
    async fn did_metadata(&self, did_id: H256) -> Result<DidMetadata, RegistryError>;

    /// The DID currently owned by `owner`, if any.
    async fn did_by_owner(&self, owner: Address) -> Result<Option<H256>, RegistryError>;

    /// Every DID ever created, once each, in creation order.
    async fn all_dids(&self) -> Result<Vec<H256>, RegistryError>;

    /// Contract-side check: any active, unexpired verification.
    async fn is_verified(&self, did_id: H256) -> Result<bool, RegistryError>;

    async fn has_role(&self, role: H256, account: Address) -> Result<bool, RegistryError>;

    async fn is_verifier(&self, account: Address) -> Result<bool, RegistryError> {
        self.has_role(*VERIFIER_ROLE, account).await
    }

    /// Owner, identifiers and lifecycle metadata of `did_id`, fetched concurrently.
    ///
    /// # Errors
    /// Fails if any of the three reads fails, or with [`RegistryError::NotFound`]
    /// when the DID has no owner
    async fn did_record(&self, did_id: H256) -> Result<DidRecord, RegistryError> {
        let (owner, identifiers, metadata) = tokio::try_join!(
            self.did_owner(did_id),
            self.did_identifiers(did_id),
            self.did_metadata(did_id),
        )?;
        if owner == Address::zero() {
            return Err(RegistryError::NotFound(format!("DID {:#x}", did_id)));
        }
        Ok(DidRecord {
            id: did_id,
            owner,
            identifiers,
            created: metadata.created,
            updated: metadata.updated,
            active: metadata.active,
        })
    }
}

/// Required signers and recorded signatures of a document.
#[async_trait]
pub trait SignatureSource: Send + Sync {
    async fn required_signers(&self, document_id: H256) -> Result<Vec<String>, RegistryError>;
    async fn signatures(&self, document_id: H256) -> Result<Vec<DocumentSignature>, RegistryError>;
}

/// Read access to document records.
#[async_trait]
pub trait DocumentReader: SignatureSource {
    async fn document(&self, document_id: H256) -> Result<DocumentRecord, RegistryError>;

    /// Contract-side completeness check, for comparison with the local reconciliation.
    async fn has_all_required_signatures(&self, document_id: H256) -> Result<bool, RegistryError>;
}

/// Parses a `0x`-prefixed 32-byte identifier.
pub fn parse_bytes32(value: &str) -> Result<H256, RegistryError> {
    H256::from_str(value.trim()).map_err(|_| RegistryError::InvalidInput(format!("`{}` is not a bytes32 value", value)))
}

/// Parses a 20-byte account address.
pub fn parse_address(value: &str) -> Result<Address, RegistryError> {
    Address::from_str(value.trim()).map_err(|_| RegistryError::InvalidInput(format!("`{}` is not an address", value)))
}

/// Returns the first indexed argument of `event` emitted by `contract` in `receipt`.
pub(crate) fn first_indexed_topic(
    abi: &Abi,
    receipt: &TransactionReceipt,
    contract: Address,
    event: &str,
) -> Result<H256, RegistryError> {
    let signature = abi
        .event(event)
        .map_err(|e| RegistryError::contract(event, e))?
        .signature();

    receipt
        .logs
        .iter()
        .filter(|log| log.address == contract)
        .find(|log| log.topics.first() == Some(&signature))
        .and_then(|log| log.topics.get(1).copied())
        .ok_or_else(|| RegistryError::MissingEvent(event.to_string()))
}
