// src/testing.rs
//! In-memory registries used by unit tests.

use crate::contracts::{DidReader, DocumentReader, SignatureSource, VerificationSource};
use crate::error::RegistryError;
use crate::models::did::{DidMetadata, VerificationRecord, VerificationStatus, VERIFIER_ROLE};
use crate::models::document::{DocumentRecord, DocumentSignature, DocumentStatus, DocumentType, SignatureType};
use crate::services::signature_reconciler::reconcile;
use async_trait::async_trait;
use ethers_core::types::{Address, Bytes, H256};
use std::collections::{HashMap, HashSet};

pub const NOW: u64 = 1_700_000_000;
pub const DAY: u64 = 24 * 60 * 60;

pub fn verifier(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub fn did(n: u8) -> H256 {
    H256::repeat_byte(n)
}

/// An active record from `verifier(n)` at `level`, issued at `NOW - DAY`.
pub fn active(n: u8, level: u64, expiration: u64) -> VerificationRecord {
    VerificationRecord {
        verifier: verifier(n),
        level,
        timestamp: NOW - DAY,
        expiration,
        status: VerificationStatus::Active,
        metadata: Bytes::default(),
    }
}

pub fn revoked(n: u8, level: u64, expiration: u64) -> VerificationRecord {
    VerificationRecord {
        status: VerificationStatus::Revoked,
        ..active(n, level, expiration)
    }
}

#[derive(Default)]
pub struct FakeDidRegistry {
    pub verifiers: Vec<Address>,
    pub verifier_set_fails: bool,
    pub records: HashMap<(H256, Address), VerificationRecord>,
    pub failing_verifiers: HashSet<Address>,
    pub owners: HashMap<H256, Address>,
    pub identifiers: HashMap<H256, Vec<H256>>,
    /// Creation history as `all_dids` reports it
    pub created: Vec<H256>,
    pub failing_dids: HashSet<H256>,
}

impl FakeDidRegistry {
    pub fn with_records(did_id: H256, records: Vec<VerificationRecord>) -> Self {
        let mut fake = FakeDidRegistry::default();
        for record in records {
            fake.verifiers.push(record.verifier);
            fake.records.insert((did_id, record.verifier), record);
        }
        fake.owners.insert(did_id, Address::repeat_byte(0xee));
        fake.created.push(did_id);
        fake
    }
}

#[async_trait]
impl VerificationSource for FakeDidRegistry {
    async fn verifier_set(&self) -> Result<Vec<Address>, RegistryError> {
        if self.verifier_set_fails {
            return Err(RegistryError::contract("getRoleMemberArray", "execution reverted"));
        }
        Ok(self.verifiers.clone())
    }

    async fn verification(&self, did_id: H256, verifier: Address) -> Result<VerificationRecord, RegistryError> {
        if self.failing_verifiers.contains(&verifier) {
            return Err(RegistryError::Provider("connection reset".into()));
        }
        Ok(self
            .records
            .get(&(did_id, verifier))
            .cloned()
            .unwrap_or_else(VerificationRecord::empty))
    }
}

#[async_trait]
impl DidReader for FakeDidRegistry {
    async fn did_owner(&self, did_id: H256) -> Result<Address, RegistryError> {
        if self.failing_dids.contains(&did_id) {
            return Err(RegistryError::Provider("connection reset".into()));
        }
        Ok(self.owners.get(&did_id).copied().unwrap_or_else(Address::zero))
    }

    async fn did_identifiers(&self, did_id: H256) -> Result<Vec<H256>, RegistryError> {
        Ok(self.identifiers.get(&did_id).cloned().unwrap_or_default())
    }

    async fn did_metadata(&self, did_id: H256) -> Result<DidMetadata, RegistryError> {
        Ok(DidMetadata {
            created: NOW - 10 * DAY,
            updated: NOW - DAY,
            active: self.owners.contains_key(&did_id),
        })
    }

    async fn is_verified(&self, did_id: H256) -> Result<bool, RegistryError> {
        Ok(self
            .records
            .iter()
            .any(|((id, _), record)| *id == did_id && record.is_active() && !record.is_expired_at(NOW)))
    }

    async fn has_role(&self, role: H256, account: Address) -> Result<bool, RegistryError> {
        Ok(role == *VERIFIER_ROLE && self.verifiers.contains(&account))
    }

    async fn did_by_owner(&self, owner: Address) -> Result<Option<H256>, RegistryError> {
        Ok(self
            .owners
            .iter()
            .find(|(_, current)| **current == owner)
            .map(|(did_id, _)| *did_id))
    }

    async fn all_dids(&self) -> Result<Vec<H256>, RegistryError> {
        Ok(self.created.clone())
    }
}

pub fn document(id: H256) -> DocumentRecord {
    DocumentRecord {
        id,
        content_hash: H256::repeat_byte(0xcc),
        document_type: DocumentType::Contract,
        owner: Address::repeat_byte(0xee),
        associated_did: did(0xee),
        created_at: NOW - DAY,
        expires_at: u64::MAX,
        status: DocumentStatus::Active,
        metadata: r#"{"details":"Lease agreement","timestamp":"2024-01-01T00:00:00.000Z"}"#.to_string(),
        version: 1,
    }
}

pub fn signature(signer: &str, signature_type: SignatureType) -> DocumentSignature {
    DocumentSignature {
        signer: signer.to_string(),
        timestamp: NOW,
        signature_type,
        metadata: "{}".to_string(),
    }
}

#[derive(Default)]
pub struct FakeDocumentRegistry {
    pub documents: HashMap<H256, DocumentRecord>,
    pub required: HashMap<H256, Vec<String>>,
    pub signatures: HashMap<H256, Vec<DocumentSignature>>,
}

impl FakeDocumentRegistry {
    pub fn insert(&mut self, record: DocumentRecord, required: Vec<String>, signatures: Vec<DocumentSignature>) {
        self.required.insert(record.id, required);
        self.signatures.insert(record.id, signatures);
        self.documents.insert(record.id, record);
    }
}

#[async_trait]
impl SignatureSource for FakeDocumentRegistry {
    async fn required_signers(&self, document_id: H256) -> Result<Vec<String>, RegistryError> {
        Ok(self.required.get(&document_id).cloned().unwrap_or_default())
    }

    async fn signatures(&self, document_id: H256) -> Result<Vec<DocumentSignature>, RegistryError> {
        Ok(self.signatures.get(&document_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl DocumentReader for FakeDocumentRegistry {
    async fn document(&self, document_id: H256) -> Result<DocumentRecord, RegistryError> {
        self.documents
            .get(&document_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("document {:#x}", document_id)))
    }

    async fn has_all_required_signatures(&self, document_id: H256) -> Result<bool, RegistryError> {
        let required = self.required_signers(document_id).await?;
        let signatures = self.signatures(document_id).await?;
        Ok(reconcile(&required, &signatures).complete)
    }
}
