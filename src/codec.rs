//! Whole-buffer authenticated encryption of the dataset.

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, BlobHeader, KdfParams};
use crate::error::Result;

/// Seals and opens blobs of the form `salt ‖ nonce ‖ ciphertext ‖ tag`.
///
/// Every `encode` draws a new salt, and therefore a new key, so a nonce is
/// never reused under the same key.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    kdf: KdfParams,
}

impl Codec {
    pub fn new(kdf: KdfParams) -> Self {
        Self { kdf }
    }

    pub fn encode(&self, plaintext: &[u8], password: &[u8]) -> Result<Vec<u8>> {
        let salt = crypto::generate_salt()?;
        let nonce = crypto::generate_nonce()?;
        let key = crypto::derive_key(password, &salt, self.kdf);

        let sealed = crypto::encrypt(&key, &nonce, plaintext)?;

        let mut blob = BlobHeader::new(salt, nonce).to_bytes();
        blob.extend_from_slice(&sealed);

        debug!(plaintext_len = plaintext.len(), blob_len = blob.len(), "sealed blob");
        Ok(blob)
    }

    pub fn decode(&self, blob: &[u8], password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let (header, offset) = BlobHeader::from_bytes(blob)?;
        let key = crypto::derive_key(password, header.salt(), self.kdf);

        let plaintext = crypto::decrypt(&key, header.nonce(), &blob[offset..])?;

        debug!(blob_len = blob.len(), plaintext_len = plaintext.len(), "opened blob");
        Ok(plaintext)
    }
}
