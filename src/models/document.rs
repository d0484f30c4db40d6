// src/models/document.rs
//! Document registry data models.
//!
//! Document type, status and signature type are stored on-chain as `bytes32`
//! keccak tags; the enums here map them back to names.

use crate::models::saturating_u64;
use crate::utils::crypto::tag;
use ethers_core::types::{Address, H256, U256};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Generates a tag-backed enum with `from_tag`, `tag`, `name` and `from_name`.
macro_rules! tagged_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant,)+
            Unknown,
        }

        impl $name {
            const KNOWN: &'static [($name, &'static str)] = &[$(($name::$variant, $label)),+];

            pub fn from_tag(value: H256) -> Self {
                static TAGS: Lazy<Vec<(H256, $name)>> = Lazy::new(|| {
                    $name::KNOWN.iter().map(|(variant, label)| (tag(label), *variant)).collect()
                });
                TAGS.iter()
                    .find(|(known, _)| *known == value)
                    .map(|(_, variant)| *variant)
                    .unwrap_or($name::Unknown)
            }

            /// Case-insensitive lookup by name.
            pub fn from_name(name: &str) -> Option<Self> {
                $name::KNOWN
                    .iter()
                    .find(|(_, label)| label.eq_ignore_ascii_case(name.trim()))
                    .map(|(variant, _)| *variant)
            }

            pub fn name(self) -> &'static str {
                $name::KNOWN
                    .iter()
                    .find(|(variant, _)| *variant == self)
                    .map(|(_, label)| *label)
                    .unwrap_or("Unknown")
            }

            /// On-chain tag; `Unknown` maps to the zero hash.
            pub fn tag(self) -> H256 {
                match self {
                    $name::Unknown => H256::zero(),
                    known => tag(known.name()),
                }
            }
        }
    };
}

tagged_enum!(
    /// Category a document was registered under.
    DocumentType {
        General => "GENERAL",
        Contract => "CONTRACT",
        Certificate => "CERTIFICATE",
        License => "LICENSE",
        Identity => "IDENTITY",
        Legal => "LEGAL",
        Financial => "FINANCIAL",
    }
);

tagged_enum!(
    DocumentStatus {
        Active => "ACTIVE",
        Expired => "EXPIRED",
        Revoked => "REVOKED",
    }
);

tagged_enum!(
    /// Kind of signature a signer attached to a document.
    SignatureType {
        Approve => "APPROVE",
        Reject => "REJECT",
        Acknowledge => "ACKNOWLEDGE",
    }
);

/// Raw ABI shape of the public `documents(bytes32)` getter.
pub type RawDocument = (H256, H256, Address, H256, U256, U256, H256, String, U256);

/// Raw ABI shape of one `getSignatures` entry: (signerDid, timestamp, signatureType, metadata).
pub type RawSignature = (H256, U256, H256, String);

/// A registered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: H256,
    pub content_hash: H256,
    pub document_type: DocumentType,
    pub owner: Address,
    /// DID the document was registered under
    pub associated_did: H256,
    pub created_at: u64,
    pub expires_at: u64,
    pub status: DocumentStatus,
    pub metadata: String,
    /// Incremented on every metadata update, starting at 1
    pub version: u64,
}

impl DocumentRecord {
    pub fn from_raw(id: H256, raw: RawDocument) -> Self {
        let (content_hash, document_type, owner, did, created_at, expires_at, status, metadata, version) = raw;
        DocumentRecord {
            id,
            content_hash,
            document_type: DocumentType::from_tag(document_type),
            owner,
            associated_did: did,
            created_at: saturating_u64(created_at),
            expires_at: saturating_u64(expires_at),
            status: DocumentStatus::from_tag(status),
            metadata,
            version: saturating_u64(version),
        }
    }

    /// The public getter returns a zeroed struct for unknown ids.
    pub fn exists(&self) -> bool {
        self.owner != Address::zero()
    }

    /// Whether the document has passed `expires_at`, independent of its stored status.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at < now
    }
}

/// A signature recorded against a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSignature {
    /// Identifier of the signer (a DID or an address)
    pub signer: String,
    pub timestamp: u64,
    pub signature_type: SignatureType,
    pub metadata: String,
}

impl From<RawSignature> for DocumentSignature {
    fn from((signer, timestamp, signature_type, metadata): RawSignature) -> Self {
        DocumentSignature {
            signer: format!("{:#x}", signer),
            timestamp: saturating_u64(timestamp),
            signature_type: SignatureType::from_tag(signature_type),
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_map_back_to_variants() {
        assert_eq!(DocumentType::from_tag(tag("LICENSE")), DocumentType::License);
        assert_eq!(DocumentStatus::from_tag(tag("REVOKED")), DocumentStatus::Revoked);
        assert_eq!(SignatureType::from_tag(tag("ACKNOWLEDGE")), SignatureType::Acknowledge);
        assert_eq!(DocumentType::from_tag(H256::repeat_byte(7)), DocumentType::Unknown);
        assert_eq!(DocumentType::Unknown.name(), "Unknown");
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(SignatureType::from_name("approve"), Some(SignatureType::Approve));
        assert_eq!(DocumentType::from_name(" Certificate "), Some(DocumentType::Certificate));
        assert_eq!(DocumentType::from_name("memo"), None);
        assert_eq!(DocumentStatus::Active.tag(), tag("ACTIVE"));
    }

    #[test]
    fn test_document_from_raw() {
        let id = H256::repeat_byte(1);
        let raw: RawDocument = (
            H256::repeat_byte(2),
            tag("GENERAL"),
            Address::repeat_byte(3),
            H256::repeat_byte(4),
            U256::from(100),
            U256::from(200),
            tag("ACTIVE"),
            "{}".to_string(),
            U256::from(1),
        );
        let record = DocumentRecord::from_raw(id, raw);
        assert!(record.exists());
        assert_eq!(record.document_type, DocumentType::General);
        assert_eq!(record.status, DocumentStatus::Active);
        assert_eq!(record.version, 1);
        assert!(record.is_expired_at(201));
        assert!(!record.is_expired_at(200));
    }

    #[test]
    fn test_signature_signer_is_lowercase_hex() {
        let raw: RawSignature = (H256::repeat_byte(0xAB), U256::from(5), tag("REJECT"), String::new());
        let signature = DocumentSignature::from(raw);
        assert_eq!(signature.signer, format!("0x{}", "ab".repeat(32)));
        assert_eq!(signature.signature_type, SignatureType::Reject);
    }
}
