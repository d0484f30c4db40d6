// src/services/registry_views.rs
//! Read-side views over both registries.
//!
//! A view bundles everything a front-end shows for one DID or one document:
//! on-chain records, decoded metadata, display names, the aggregated verification
//! summary and the signature reconciliation. Views are rebuilt from the chain on
//! every request; nothing is cached.

use crate::contracts::{DidReader, DocumentReader};
use crate::error::RegistryError;
use crate::models::did::{DidRecord, VerificationRecord};
use crate::models::document::{DocumentRecord, DocumentSignature};
use crate::services::signature_reconciler::{reconcile, Reconciliation};
use crate::services::verification_aggregator::{
    collect_records, unix_now, verifier_set_or_fallback, VerificationAggregator, VerificationSummary,
};
use crate::utils::formatting::format_hash;
use crate::utils::metadata::{self, DecodedMetadata};
use ethers_core::types::{Address, H256};
use futures::future::join_all;
use log::warn;
use serde::Serialize;
use std::sync::Arc;

/// One row of the DID directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryEntry {
    pub id: H256,
    pub owner: Address,
    /// Contract-side `isVerified`
    pub verified: bool,
    pub active: bool,
    pub summary: VerificationSummary,
}

/// One verifier's record with its metadata decoded.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationView {
    #[serde(flatten)]
    pub record: VerificationRecord,
    pub label: &'static str,
    pub expired: bool,
    pub decoded: DecodedMetadata,
}

impl VerificationView {
    fn new(record: VerificationRecord, now: u64) -> Self {
        VerificationView {
            label: record.tier().label(),
            expired: record.is_expired_at(now),
            decoded: metadata::decode_bytes(&record.metadata),
            record,
        }
    }
}

/// A DID with every verifier's record and the aggregated summary.
#[derive(Debug, Clone, Serialize)]
pub struct DidView {
    #[serde(flatten)]
    pub did: DidRecord,
    pub verifications: Vec<VerificationView>,
    pub summary: VerificationSummary,
}

/// A signature with its metadata decoded.
#[derive(Debug, Clone, Serialize)]
pub struct SignatureView {
    #[serde(flatten)]
    pub signature: DocumentSignature,
    pub signature_type_name: &'static str,
    pub decoded: DecodedMetadata,
}

/// A document with its signatures and signing progress.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentView {
    #[serde(flatten)]
    pub document: DocumentRecord,
    pub document_type_name: &'static str,
    pub status_name: &'static str,
    pub content_hash_display: String,
    pub expired: bool,
    pub decoded: DecodedMetadata,
    pub required_signers: Vec<String>,
    pub signatures: Vec<SignatureView>,
    pub reconciliation: Reconciliation,
}

/// Builds [`DidView`]s and [`DocumentView`]s from injected registry readers.
#[derive(Clone)]
pub struct RegistryViews {
    dids: Arc<dyn DidReader>,
    documents: Arc<dyn DocumentReader>,
    aggregator: VerificationAggregator,
    /// Verifier of last resort when the verifier set cannot be read
    session_address: Option<Address>,
}

impl RegistryViews {
    /// Creates the view builder.
    ///
    /// # Arguments
    /// * `dids` - DID registry reader
    /// * `documents` - Document registry reader
    /// * `aggregator` - Aggregation policy holder
    /// * `session_address` - Session account, used as fallback verifier
    pub fn new(
        dids: Arc<dyn DidReader>,
        documents: Arc<dyn DocumentReader>,
        aggregator: VerificationAggregator,
        session_address: Option<Address>,
    ) -> Self {
        Self {
            dids,
            documents,
            aggregator,
            session_address,
        }
    }

    pub fn dids(&self) -> &dyn DidReader {
        self.dids.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentReader {
        self.documents.as_ref()
    }

    /// Aggregated verification summary of `did_id` against the verifier set.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] when the DID has no owner, or the owner
    /// lookup error
    pub async fn verification_summary(&self, did_id: H256) -> Result<VerificationSummary, RegistryError> {
        if self.dids.did_owner(did_id).await? == Address::zero() {
            return Err(RegistryError::NotFound(format!("DID {:#x}", did_id)));
        }
        Ok(self
            .aggregator
            .resolve_for_did(self.dids.as_ref(), did_id, self.session_address)
            .await)
    }

    /// Every created DID with its owner, status flags and aggregated summary.
    ///
    /// The verifier set is read once for the whole directory. DIDs whose rows
    /// fail to load are logged and left out; the rest keep creation order.
    ///
    /// # Errors
    /// Fails only when the DID list itself cannot be read
    pub async fn did_directory(&self) -> Result<Vec<DirectoryEntry>, RegistryError> {
        let did_ids = self.dids.all_dids().await?;
        let verifiers = verifier_set_or_fallback(self.dids.as_ref(), self.session_address).await;
        let now = unix_now();

        let results = join_all(did_ids.iter().map(|id| self.directory_entry(*id, &verifiers, now))).await;

        Ok(did_ids
            .iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("skipping DID {:#x}: {}", id, e);
                    None
                }
            })
            .collect())
    }

    async fn directory_entry(
        &self,
        did_id: H256,
        verifiers: &[Address],
        now: u64,
    ) -> Result<DirectoryEntry, RegistryError> {
        let source = self.dids.as_ref();
        let (owner, verified, metadata) = tokio::try_join!(
            source.did_owner(did_id),
            source.is_verified(did_id),
            source.did_metadata(did_id),
        )?;
        let summary = self.aggregator.resolve_at(source, did_id, verifiers, now).await;

        Ok(DirectoryEntry {
            id: did_id,
            owner,
            verified,
            active: metadata.active,
            summary,
        })
    }

    /// Full view of one DID.
    ///
    /// # Errors
    /// Fails when the DID record itself cannot be read; individual verification
    /// fetches that fail are left out of the view
    pub async fn did_view(&self, did_id: H256) -> Result<DidView, RegistryError> {
        let did = self.dids.did_record(did_id).await?;
        let verifiers = verifier_set_or_fallback(self.dids.as_ref(), self.session_address).await;
        let records = collect_records(self.dids.as_ref(), did_id, &verifiers).await;

        let now = unix_now();
        let summary = self.aggregator.summarize(&records, now);
        let verifications = records
            .into_iter()
            .map(|record| VerificationView::new(record, now))
            .collect();

        Ok(DidView {
            did,
            verifications,
            summary,
        })
    }

    /// Full view of one document.
    pub async fn document_view(&self, document_id: H256) -> Result<DocumentView, RegistryError> {
        let source = self.documents.as_ref();
        let (document, required_signers, signatures) = tokio::try_join!(
            source.document(document_id),
            source.required_signers(document_id),
            source.signatures(document_id),
        )?;

        let reconciliation = reconcile(&required_signers, &signatures);
        let signatures = signatures
            .into_iter()
            .map(|signature| SignatureView {
                signature_type_name: signature.signature_type.name(),
                decoded: metadata::decode(&signature.metadata),
                signature,
            })
            .collect();

        Ok(DocumentView {
            document_type_name: document.document_type.name(),
            status_name: document.status.name(),
            content_hash_display: format_hash(document.content_hash),
            expired: document.is_expired_at(unix_now()),
            decoded: metadata::decode(&document.metadata),
            document,
            required_signers,
            signatures,
            reconciliation,
        })
    }

    /// Views of several documents, fetched concurrently.
    ///
    /// Documents that fail to load are logged and left out; the remaining views
    /// keep the order of `document_ids`.
    pub async fn document_views(&self, document_ids: &[H256]) -> Vec<DocumentView> {
        let results = join_all(document_ids.iter().map(|id| self.document_view(*id))).await;

        document_ids
            .iter()
            .zip(results)
            .filter_map(|(id, result)| match result {
                Ok(view) => Some(view),
                Err(e) => {
                    warn!("skipping document {:#x}: {}", id, e);
                    None
                }
            })
            .collect()
    }
}
