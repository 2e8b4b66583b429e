use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// PBKDF2 iteration count used when none is configured.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(Error::InvalidKdf("pbkdf2 iterations must be >= 1"));
        }
        Ok(())
    }
}

/// Fills `out` with PBKDF2-HMAC-SHA-256 output for the password and salt.
///
/// Deterministic: identical inputs always produce identical bytes. The salt
/// length and iteration count are guaranteed by their types, so the only
/// remaining precondition is a non-empty output buffer.
///
/// # Panics
///
/// Panics if `out` is empty.
pub fn derive(password: &[u8], salt: &[u8; SALT_LEN], kdf: KdfParams, out: &mut [u8]) {
    assert!(!out.is_empty(), "KDF output length must be non-zero");
    pbkdf2_hmac::<Sha256>(password, salt, kdf.iterations, out);
}

/// Derives a 256-bit key, wiped from memory when dropped.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    kdf: KdfParams,
) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    derive(password, salt, kdf, key.as_mut_slice());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(1_000).unwrap()
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 16];

        let k1 = derive_key(b"password", &salt, fast());
        let k2 = derive_key(b"password", &salt, fast());

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn kdf_iterations_affect_output() {
        let salt = [7u8; 16];

        let k1 = derive_key(b"pw", &salt, KdfParams::new(1_000).unwrap());
        let k2 = derive_key(b"pw", &salt, KdfParams::new(1_001).unwrap());

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn kdf_salt_affects_output() {
        let k1 = derive_key(b"pw", &[1u8; 16], fast());
        let k2 = derive_key(b"pw", &[2u8; 16], fast());

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn prf_is_hmac_sha256() {
        // P = "password", S = "salt", c = 1, dkLen = 32
        let mut rfc = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut rfc);
        assert_eq!(
            hex::encode(rfc),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn kdf_output_length_is_respected() {
        let mut short = [0u8; 16];
        let mut long = [0u8; 32];
        derive(b"pw", &[3u8; 16], fast(), &mut short);
        derive(b"pw", &[3u8; 16], fast(), &mut long);

        assert_eq!(short, long[..16]);
    }

    #[test]
    #[should_panic(expected = "KDF output length must be non-zero")]
    fn kdf_rejects_empty_output() {
        derive(b"pw", &[0u8; 16], fast(), &mut []);
    }

    #[test]
    fn kdf_zero_iterations_fail() {
        assert!(KdfParams::new(0).is_err());
    }

    #[test]
    fn kdf_default_is_100k() {
        assert_eq!(KdfParams::default().iterations(), 100_000);
    }
}
