// src/services/signature_reconciler.rs
//! Document signature reconciliation.
//!
//! Compares a document's required signers against the signatures recorded for it
//! and splits the signers into signed and pending, keeping the required order.

use crate::contracts::SignatureSource;
use crate::error::RegistryError;
use crate::models::document::DocumentSignature;
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Signing progress of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub signed: Vec<String>,
    pub pending: Vec<String>,
    pub complete: bool,
}

/// Canonical form of a signer identifier used for matching.
///
/// Address-shaped values (`0x` followed by 40 hex digits) are lowercased through
/// an address parse; anything else is compared as-is.
pub fn normalize_identifier(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let is_address_shaped = trimmed.len() == 42
        && trimmed.starts_with("0x")
        && trimmed[2..].chars().all(|c| c.is_ascii_hexdigit());

    if is_address_shaped {
        if let Ok(address) = Address::from_str(trimmed) {
            return format!("{:#x}", address);
        }
    }
    trimmed.to_string()
}

/// Splits `required` into signed and pending signers.
///
/// # Arguments
/// * `required` - Required signer identifiers, in contract order
/// * `signatures` - Recorded signatures, any order
///
/// # Returns
/// A [`Reconciliation`] whose `signed` and `pending` lists follow `required`;
/// `complete` holds when nothing is pending (so an empty `required` is complete)
pub fn reconcile(required: &[String], signatures: &[DocumentSignature]) -> Reconciliation {
    let signers: HashSet<String> = signatures
        .iter()
        .map(|signature| normalize_identifier(&signature.signer))
        .collect();

    let (signed, pending): (Vec<String>, Vec<String>) = required
        .iter()
        .cloned()
        .partition(|signer| signers.contains(&normalize_identifier(signer)));

    Reconciliation {
        complete: pending.is_empty(),
        signed,
        pending,
    }
}

/// Fetches required signers and signatures concurrently and reconciles them.
pub async fn reconcile_document<S>(source: &S, document_id: H256) -> Result<Reconciliation, RegistryError>
where
    S: SignatureSource + ?Sized,
{
    let (required, signatures) = tokio::try_join!(
        source.required_signers(document_id),
        source.signatures(document_id),
    )?;
    Ok(reconcile(&required, &signatures))
}
