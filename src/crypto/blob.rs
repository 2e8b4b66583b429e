//! Fixed-width header of an encrypted blob.
//!
//! Blob layout:
//! ```text
//! SALT (16) | NONCE (12) | CIPHERTEXT ‖ TAG (len(plaintext) + 16)
//! ```
//! There is no magic or version field; the layout is served as-is to clients.

use super::{FINGERPRINT_LEN, HEADER_LEN, MIN_BLOB_LEN, NONCE_LEN, SALT_LEN};
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHeader {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
}

impl BlobHeader {
    pub fn new(salt: [u8; SALT_LEN], nonce: [u8; NONCE_LEN]) -> Self {
        Self { salt, nonce }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        buf.extend_from_slice(&self.salt);
        buf.extend_from_slice(&self.nonce);
        buf
    }

    /// Parses the header and returns it with the offset of ciphertext‖tag.
    ///
    /// Rejects anything shorter than a sealed empty plaintext.
    pub fn from_bytes(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < MIN_BLOB_LEN {
            return Err(Error::MalformedBlob {
                len: data.len(),
                min: MIN_BLOB_LEN,
            });
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&data[..SALT_LEN]);

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[SALT_LEN..HEADER_LEN]);

        Ok((Self { salt, nonce }, HEADER_LEN))
    }
}

/// SHA-256 over the whole blob, used to bind a verifier record to its blob.
pub fn fingerprint(blob: &[u8]) -> [u8; FINGERPRINT_LEN] {
    Sha256::digest(blob).into()
}
