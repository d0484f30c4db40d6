// src/blockchain/session.rs
//! Explicit signing session.
//!
//! The wallet used for submissions is passed around as a value instead of being
//! looked up from ambient state. Only the submission layer ever needs it.

use crate::error::RegistryError;
use ethers::signers::{LocalWallet, Signer};
use ethers_core::types::Address;
use std::fmt;
use std::str::FromStr;

/// Signing identity for submitting transactions.
#[derive(Clone)]
pub struct Session {
    wallet: LocalWallet,
}

impl Session {
    /// Builds a session from a hex-encoded private key (with or without `0x`).
    ///
    /// # Errors
    /// Returns [`RegistryError::Config`] if the key is not a valid secp256k1 key
    pub fn from_private_key(private_key: &str) -> Result<Self, RegistryError> {
        let key = private_key.trim().trim_start_matches("0x");
        let wallet = LocalWallet::from_str(key)
            .map_err(|e| RegistryError::Config(format!("invalid private key: {}", e)))?;
        Ok(Self { wallet })
    }

    /// Account that signs submissions.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub(crate) fn into_wallet(self) -> LocalWallet {
        self.wallet
    }
}

impl fmt::Debug for Session {
    // Never print key material
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &format_args!("{:#x}", self.address()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // First default Hardhat/Anvil development account
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_session_derives_address() {
        let session = Session::from_private_key(DEV_KEY).unwrap();
        assert_eq!(
            format!("{:#x}", session.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_debug_hides_key() {
        let session = Session::from_private_key(DEV_KEY).unwrap();
        let printed = format!("{:?}", session);
        assert!(printed.contains("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"));
        assert!(!printed.contains("ac0974bec39a17e3"));
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        assert!(matches!(
            Session::from_private_key("xyz"),
            Err(RegistryError::Config(_))
        ));
    }
}
