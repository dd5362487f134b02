use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use thiserror::Error;

const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),

    #[error("Invalid address length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// 20-byte account identity, displayed as `0x`-prefixed hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Generate a random address
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; ADDRESS_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Derive a deterministic address from a label (last 20 bytes of Keccak-256)
    pub fn from_label(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
        Self(bytes)
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parse a `0x`-prefixed hex address
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| AddressError::InvalidFormat("missing 0x prefix".into()))?;

        let decoded =
            hex::decode(digits).map_err(|e| AddressError::InvalidFormat(e.to_string()))?;

        if decoded.len() != ADDRESS_LEN {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN,
                got: decoded.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable
        write!(f, "0x{}..", hex::encode(&self.0[..4]))
    }
}
