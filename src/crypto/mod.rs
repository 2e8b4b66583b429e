//! Cryptographic primitives for packaging and unlocking the dataset.
//!
//! Provides password key derivation, AES-256-GCM sealing, and the blob header.

pub mod aead;
pub mod blob;
pub mod kdf;

pub use aead::{decrypt, encrypt, generate_nonce, generate_salt};
pub use blob::{BlobHeader, fingerprint};
pub use kdf::{KdfParams, derive, derive_key};

/// Length of a salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (12 bytes for AES-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the encryption key and verifier digest (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;
/// Length of the fixed blob header: salt followed by nonce.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_LEN;
/// Smallest valid blob: header plus the tag of an empty plaintext.
pub const MIN_BLOB_LEN: usize = HEADER_LEN + TAG_LEN;
/// Length of a blob fingerprint (SHA-256).
pub const FINGERPRINT_LEN: usize = 32;
