mod codec;
pub mod crypto;
mod error;
pub mod package;
pub mod runtime;
mod storage;
mod verifier;

pub use crate::codec::Codec;
pub use crate::crypto::KdfParams;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::package::{Package, PackageReport, package, package_files};
pub use crate::runtime::{AuthSession, BlobSource, FileSource, MemorySource, Orchestrator, Unlock};
pub use crate::storage::Storage;
pub use crate::verifier::{VerifierRecord, VerifierTriple};

/// Default location of the plaintext dataset produced by the exporter.
pub const DEFAULT_INPUT: &str = "output/game_data.arrow";
/// Default location of the sealed dataset served to clients.
pub const DEFAULT_BLOB: &str = "public/game_data.arrow.enc";
/// Default location of the verifier record shipped with the application.
pub const DEFAULT_VERIFIER: &str = "public/verifier.json";
