//! Password verifier: a public `(salt, digest, iterations)` triple.
//!
//! The record is shipped next to the application and is not a secret. It lets
//! a candidate password be checked without touching the encrypted blob.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::crypto::{self, FINGERPRINT_LEN, KEY_LEN, KdfParams, SALT_LEN};
use crate::error::{Error, Result};

pub const ENV_SALT: &str = "DATALOCK_VERIFIER_SALT";
pub const ENV_DIGEST: &str = "DATALOCK_VERIFIER_DIGEST";
pub const ENV_ITERATIONS: &str = "DATALOCK_VERIFIER_ITERATIONS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierTriple {
    salt: [u8; SALT_LEN],
    digest: [u8; KEY_LEN],
    kdf: KdfParams,
}

impl VerifierTriple {
    /// Builds a verifier for `password` under a freshly drawn salt.
    pub fn generate(password: &[u8], kdf: KdfParams) -> Result<Self> {
        let salt = crypto::generate_salt()?;
        Ok(Self::with_salt(password, salt, kdf))
    }

    pub fn with_salt(password: &[u8], salt: [u8; SALT_LEN], kdf: KdfParams) -> Self {
        let mut digest = [0u8; KEY_LEN];
        crypto::derive(password, &salt, kdf, &mut digest);
        Self { salt, digest, kdf }
    }

    pub fn from_parts(salt: [u8; SALT_LEN], digest: [u8; KEY_LEN], kdf: KdfParams) -> Self {
        Self { salt, digest, kdf }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn digest(&self) -> &[u8; KEY_LEN] {
        &self.digest
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    /// Returns `true` iff `candidate` derives to the stored digest.
    pub fn check(&self, candidate: &[u8]) -> bool {
        let mut computed = zeroize::Zeroizing::new([0u8; KEY_LEN]);
        crypto::derive(candidate, &self.salt, self.kdf, computed.as_mut_slice());

        let accepted: bool = computed.as_slice().ct_eq(self.digest.as_slice()).into();
        debug!(accepted, "verifier check");
        accepted
    }
}

/// Serialized form of a verifier, as stored in `verifier.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifierRecord {
    pub salt: String,
    pub digest: String,
    pub iterations: u32,
    /// SHA-256 of the blob packaged alongside this verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl VerifierRecord {
    pub fn new(triple: &VerifierTriple, blob_fingerprint: Option<[u8; FINGERPRINT_LEN]>) -> Self {
        Self {
            salt: hex::encode(triple.salt),
            digest: hex::encode(triple.digest),
            iterations: triple.kdf.iterations(),
            blob_sha256: blob_fingerprint.map(hex::encode),
            created: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    pub fn triple(&self) -> Result<VerifierTriple> {
        let salt = decode_field::<SALT_LEN>("salt", &self.salt)?;
        let digest = decode_field::<KEY_LEN>("digest", &self.digest)?;
        let kdf = KdfParams::new(self.iterations)
            .map_err(|_| Error::InvalidVerifier("iterations must be a positive integer".into()))?;

        Ok(VerifierTriple::from_parts(salt, digest, kdf))
    }

    pub fn blob_fingerprint(&self) -> Result<Option<[u8; FINGERPRINT_LEN]>> {
        self.blob_sha256
            .as_deref()
            .map(|value| decode_field::<FINGERPRINT_LEN>("blob_sha256", value))
            .transpose()
    }

    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|e| Error::InvalidVerifier(e.to_string()))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut out =
            serde_json::to_vec_pretty(self).map_err(|e| Error::InvalidVerifier(e.to_string()))?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| Error::VerifierIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Reads the record from `DATALOCK_VERIFIER_*` variables.
    ///
    /// Returns `Ok(None)` when none of them is set and an error when only
    /// some are.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>> {
        let salt = lookup(ENV_SALT);
        let digest = lookup(ENV_DIGEST);
        let iterations = lookup(ENV_ITERATIONS);

        match (salt, digest, iterations) {
            (None, None, None) => Ok(None),
            (Some(salt), Some(digest), Some(iterations)) => {
                let iterations = iterations.trim().parse().map_err(|_| {
                    Error::InvalidVerifier(format!("{ENV_ITERATIONS} is not an integer"))
                })?;
                Ok(Some(Self {
                    salt,
                    digest,
                    iterations,
                    blob_sha256: None,
                    created: None,
                }))
            }
            _ => Err(Error::InvalidVerifier(format!(
                "{ENV_SALT}, {ENV_DIGEST} and {ENV_ITERATIONS} must be set together"
            ))),
        }
    }
}

/// Decodes a hex or standard base64 field of exactly `N` bytes.
fn decode_field<const N: usize>(name: &str, value: &str) -> Result<[u8; N]> {
    let value = value.trim();
    let bytes = match hex::decode(value) {
        Ok(bytes) if bytes.len() == N => bytes,
        from_hex => STANDARD
            .decode(value)
            .ok()
            .or(from_hex.ok())
            .ok_or_else(|| Error::InvalidVerifier(format!("{name} is neither hex nor base64")))?,
    };

    bytes.try_into().map_err(|b: Vec<u8>| {
        Error::InvalidVerifier(format!("{name} must decode to {N} bytes, got {}", b.len()))
    })
}
