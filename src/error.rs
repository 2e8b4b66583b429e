use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of failures, used by callers to decide how to react
/// (re-prompt, alert, retry, or abort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed verifier record, undersized blob, bad parameters. Not retried.
    Configuration,
    /// The password did not match the verifier. Re-prompt.
    Authentication,
    /// AEAD verification failed after the password was accepted.
    Integrity,
    /// The blob could not be fetched. Retryable by the user.
    Transport,
    /// Randomness or worker failures.
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid KDF parameters: {0}")]
    InvalidKdf(&'static str),

    #[error("invalid verifier record: {0}")]
    InvalidVerifier(String),

    #[error("failed to read verifier record {}", path.display())]
    VerifierIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encrypted blob is malformed: {len} bytes, expected at least {min}")]
    MalformedBlob { len: usize, min: usize },

    #[error("encrypted blob does not match the verifier fingerprint")]
    BlobMismatch,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("decryption failed: the blob is corrupted or was not packaged with this password")]
    Integrity,

    #[error("failed to fetch encrypted blob")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("encryption failed")]
    Encryption,

    #[error("OS random generator unavailable")]
    Randomness,

    #[error("background task failed")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidKdf(_)
            | Error::InvalidVerifier(_)
            | Error::VerifierIo { .. }
            | Error::MalformedBlob { .. }
            | Error::BlobMismatch => ErrorKind::Configuration,
            Error::AuthenticationFailed => ErrorKind::Authentication,
            Error::Integrity => ErrorKind::Integrity,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Encryption | Error::Randomness | Error::Task(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
