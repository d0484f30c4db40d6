// src/models/did.rs
//! DID and verification data models.
//!
//! Mirrors the records returned by the `DIDRegistry` contract:
//! - `getDIDOwner` / `getDIDIdentifiers` / `getDIDMetadata` make up a [`DidRecord`]
//! - `getVerification(didId, verifier)` returns one [`VerificationRecord`]

use crate::models::saturating_u64;
use crate::utils::crypto::tag;
use ethers_core::types::{Address, Bytes, H256, U256};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Role whose members may attest verifications.
pub static VERIFIER_ROLE: Lazy<H256> = Lazy::new(|| tag("VERIFIER_ROLE"));
/// Role allowed to pause the registry and manage roles.
pub static ADMIN_ROLE: Lazy<H256> = Lazy::new(|| tag("ADMIN_ROLE"));

/// Resolves a role name (`verifier`, `admin`, case-insensitive) to its tag.
pub fn role_from_name(name: &str) -> Option<H256> {
    match name.trim().to_ascii_lowercase().as_str() {
        "verifier" | "verifier_role" => Some(*VERIFIER_ROLE),
        "admin" | "admin_role" => Some(*ADMIN_ROLE),
        _ => None,
    }
}

static ACTIVE_STATUS: Lazy<H256> = Lazy::new(|| tag("ACTIVE"));
static REVOKED_STATUS: Lazy<H256> = Lazy::new(|| tag("REVOKED"));

/// Ordinal trust tier of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    None = 0,
    Basic = 1,
    Enhanced = 2,
    Premium = 3,
}

impl VerificationLevel {
    /// Maps a raw on-chain level; values outside the known tiers map to `None`.
    pub fn from_raw(raw: u64) -> Self {
        match raw {
            1 => VerificationLevel::Basic,
            2 => VerificationLevel::Enhanced,
            3 => VerificationLevel::Premium,
            _ => VerificationLevel::None,
        }
    }

    pub fn as_u64(self) -> u64 {
        self as u64
    }

    /// Label shown to end users (Account / ID / KYC).
    pub fn label(self) -> &'static str {
        match self {
            VerificationLevel::None => "None",
            VerificationLevel::Basic => "Account",
            VerificationLevel::Enhanced => "ID",
            VerificationLevel::Premium => "KYC",
        }
    }
}

impl TryFrom<u64> for VerificationLevel {
    type Error = String;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        match raw {
            0..=3 => Ok(Self::from_raw(raw)),
            other => Err(format!("unknown verification level {}", other)),
        }
    }
}

/// Status tag stored on a verification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    Active,
    Revoked,
    /// Any tag the client does not recognise; treated as inactive.
    Unknown,
}

impl VerificationStatus {
    pub fn from_tag(status: H256) -> Self {
        if status == *ACTIVE_STATUS {
            VerificationStatus::Active
        } else if status == *REVOKED_STATUS {
            VerificationStatus::Revoked
        } else {
            VerificationStatus::Unknown
        }
    }

    pub fn tag(self) -> H256 {
        match self {
            VerificationStatus::Active => *ACTIVE_STATUS,
            VerificationStatus::Revoked => *REVOKED_STATUS,
            VerificationStatus::Unknown => H256::zero(),
        }
    }
}

/// Raw ABI shape of `getVerification`: (verifier, level, timestamp, expiration, status, metadata).
pub type RawVerification = (Address, U256, U256, U256, H256, Bytes);

/// One verifier's attestation for one DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Issuing verifier; the zero address means no record was issued
    pub verifier: Address,
    /// Raw level as stored on-chain
    pub level: u64,
    /// Issuance time, seconds since epoch
    pub timestamp: u64,
    /// Expiry time, seconds since epoch
    pub expiration: u64,
    pub status: VerificationStatus,
    /// Opaque metadata bytes, usually ABI-encoded JSON
    pub metadata: Bytes,
}

impl VerificationRecord {
    /// The record the contract returns for a verifier that never attested.
    pub fn empty() -> Self {
        VerificationRecord {
            verifier: Address::zero(),
            level: 0,
            timestamp: 0,
            expiration: 0,
            status: VerificationStatus::Unknown,
            metadata: Bytes::default(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.verifier == Address::zero()
    }

    /// A record is expired once `expiration < now`, whatever its status.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expiration < now
    }

    pub fn is_active(&self) -> bool {
        self.status == VerificationStatus::Active
    }

    pub fn tier(&self) -> VerificationLevel {
        VerificationLevel::from_raw(self.level)
    }
}

impl From<RawVerification> for VerificationRecord {
    fn from((verifier, level, timestamp, expiration, status, metadata): RawVerification) -> Self {
        VerificationRecord {
            verifier,
            level: saturating_u64(level),
            timestamp: saturating_u64(timestamp),
            expiration: saturating_u64(expiration),
            status: VerificationStatus::from_tag(status),
            metadata,
        }
    }
}

/// Lifecycle metadata returned by `getDIDMetadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidMetadata {
    pub created: u64,
    pub updated: u64,
    pub active: bool,
}

impl From<(U256, U256, bool)> for DidMetadata {
    fn from((created, updated, active): (U256, U256, bool)) -> Self {
        DidMetadata {
            created: saturating_u64(created),
            updated: saturating_u64(updated),
            active,
        }
    }
}

/// A registered DID as assembled from the registry's query methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidRecord {
    pub id: H256,
    pub owner: Address,
    /// keccak256 hashes of the identifiers supplied at creation/update
    pub identifiers: Vec<H256>,
    pub created: u64,
    pub updated: u64,
    pub active: bool,
}
