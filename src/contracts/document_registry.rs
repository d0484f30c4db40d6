// src/contracts/document_registry.rs
//! Document Registry smart contract interface.
//!
//! Provides a high-level API for the `DocumentRegistry` contract: registering
//! documents with their required signers, signing, revoking, updating metadata,
//! and reading documents together with their signatures.

use crate::blockchain::chain_client::ChainClient;
use crate::contracts::{first_indexed_topic, DocumentReader, SignatureSource};
use crate::error::RegistryError;
use crate::models::document::{
    DocumentRecord, DocumentSignature, DocumentType, RawDocument, RawSignature, SignatureType,
};
use async_trait::async_trait;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::{Address, TransactionReceipt, H256, U256};
use log::info;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Parsed `DocumentRegistry` ABI (compile-time included).
pub static DOCUMENT_REGISTRY_ABI: Lazy<Abi> = Lazy::new(|| {
    Abi::load(&include_bytes!("../abi/DocumentRegistry.json")[..]).expect("Failed to load DocumentRegistry ABI")
});

/// Parameters of a new document registration.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub content_hash: H256,
    pub document_type: DocumentType,
    /// Expiry, seconds since epoch
    pub expires_at: u64,
    pub metadata: String,
    /// DIDs that must sign before the document is complete
    pub required_signers: Vec<H256>,
}

/// Document Registry smart contract wrapper.
///
/// This struct provides methods to interact with the Document Registry contract:
/// - Register documents and their required signers
/// - Sign, revoke and update documents
/// - Read documents, signatures and signer lists
#[derive(Clone)]
pub struct DocumentRegistry {
    /// Shared chain client
    client: Arc<ChainClient>,
    /// Address of the deployed DocumentRegistry contract
    address: Address,
}

impl DocumentRegistry {
    /// Creates a new DocumentRegistry instance.
    ///
    /// # Arguments
    /// * `client` - Shared chain client (read-only or with a session)
    /// * `address` - Address of deployed DocumentRegistry contract
    pub fn new(client: Arc<ChainClient>, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn query<R: Detokenize>(&self, method: &str, params: impl Tokenize) -> Result<R, RegistryError> {
        self.client
            .query_contract(self.address, &DOCUMENT_REGISTRY_ABI, method, params)
            .await
    }

    async fn submit(
        &self,
        method: &str,
        params: impl Tokenize,
        action: &str,
    ) -> Result<TransactionReceipt, RegistryError> {
        self.client
            .send_transaction(self.address, &DOCUMENT_REGISTRY_ABI, method, params, action)
            .await
    }

    /// Registers a new document owned by the session account.
    ///
    /// # Returns
    /// The new document id, read from the `DocumentRegistered` event
    ///
    /// # Errors
    /// Rejects an `Unknown` document type before submitting; the contract itself
    /// reverts when the owner has no active DID
    pub async fn register_document(&self, document: NewDocument) -> Result<H256, RegistryError> {
        if document.document_type == DocumentType::Unknown {
            return Err(RegistryError::InvalidInput("unknown document type".into()));
        }
        let receipt = self
            .submit(
                "registerDocument",
                (
                    document.content_hash,
                    document.document_type.tag(),
                    U256::from(document.expires_at),
                    document.metadata,
                    document.required_signers,
                ),
                "register document",
            )
            .await?;
        let document_id = first_indexed_topic(&DOCUMENT_REGISTRY_ABI, &receipt, self.address, "DocumentRegistered")?;
        info!("registered document {:#x}", document_id);
        Ok(document_id)
    }

    /// Signs `document_id` as the session account's DID.
    pub async fn sign_document(
        &self,
        document_id: H256,
        signature_type: SignatureType,
        metadata: String,
    ) -> Result<(), RegistryError> {
        if signature_type == SignatureType::Unknown {
            return Err(RegistryError::InvalidInput("unknown signature type".into()));
        }
        self.submit(
            "signDocument",
            (document_id, signature_type.tag(), metadata),
            "sign document",
        )
        .await?;
        Ok(())
    }

    pub async fn revoke_document(&self, document_id: H256) -> Result<(), RegistryError> {
        self.submit("revokeDocument", (document_id,), "revoke document").await?;
        Ok(())
    }

    /// Replaces the document metadata; the contract bumps `version`.
    pub async fn update_metadata(&self, document_id: H256, metadata: String) -> Result<(), RegistryError> {
        self.submit("updateMetadata", (document_id, metadata), "update metadata").await?;
        Ok(())
    }
}

#[async_trait]
impl SignatureSource for DocumentRegistry {
    async fn required_signers(&self, document_id: H256) -> Result<Vec<String>, RegistryError> {
        let signers: Vec<H256> = self.query("getRequiredSigners", (document_id,)).await?;
        Ok(signers.iter().map(|signer| format!("{:#x}", signer)).collect())
    }

    async fn signatures(&self, document_id: H256) -> Result<Vec<DocumentSignature>, RegistryError> {
        let raw: Vec<RawSignature> = self.query("getSignatures", (document_id,)).await?;
        Ok(raw.into_iter().map(DocumentSignature::from).collect())
    }
}

#[async_trait]
impl DocumentReader for DocumentRegistry {
    async fn document(&self, document_id: H256) -> Result<DocumentRecord, RegistryError> {
        let raw: RawDocument = self.query("documents", (document_id,)).await?;
        let record = DocumentRecord::from_raw(document_id, raw);
        if !record.exists() {
            return Err(RegistryError::NotFound(format!("document {:#x}", document_id)));
        }
        Ok(record)
    }

    async fn has_all_required_signatures(&self, document_id: H256) -> Result<bool, RegistryError> {
        self.query("hasAllRequiredSignatures", (document_id,)).await
    }
}
