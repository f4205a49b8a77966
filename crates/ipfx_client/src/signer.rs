//! Signer capability. The client borrows one per submission and never stores it.

use crate::types::{Address, ADDRESS_LENGTH};
use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

/// Authentication scheme byte appended to the public key for single-key Ed25519 accounts.
const ED25519_SCHEME: u8 = 0x00;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("signing refused: {0}")]
    Refused(String),
}

/// Anything that can sign for an account: an in-process key, a wallet bridge, a remote signer.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;
    fn public_key(&self) -> [u8; 32];
    /// Ed25519 signature over the node-provided signing message.
    async fn sign(&self, message: &[u8]) -> Result<[u8; 64], SignerError>;
}

/// Address of a fresh single-key Ed25519 account: `sha3_256(public_key || 0x00)`.
pub fn derive_address(public_key: &[u8; 32]) -> Address {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key);
    hasher.update([ED25519_SCHEME]);
    let digest: [u8; ADDRESS_LENGTH] = hasher.finalize().into();
    Address::new(digest)
}

/// In-process Ed25519 key supplied by the caller (scripts, CLI).
pub struct Ed25519Signer {
    key: SigningKey,
    address: Address,
}

impl Ed25519Signer {
    /// From a 32-byte hex secret (with or without `0x`). Address derived from the key.
    pub fn from_hex(secret_hex: &str) -> Result<Self, SignerError> {
        let digits = secret_hex.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let bytes = hex::decode(digits).map_err(|e| SignerError::InvalidKey(e.to_string()))?;
        let secret: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignerError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len())))?;
        Ok(Self::from_bytes(&secret))
    }

    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        let key = SigningKey::from_bytes(secret);
        let address = derive_address(key.verifying_key().as_bytes());
        Self { key, address }
    }

    /// For accounts whose auth key was rotated: the address no longer follows from the key.
    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for Ed25519Signer {
    fn address(&self) -> Address {
        self.address
    }

    fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    async fn sign(&self, message: &[u8]) -> Result<[u8; 64], SignerError> {
        Ok(self.key.sign(message).to_bytes())
    }
}
