//! Build-time packaging: one password in, a verifier record and a sealed blob out.

use std::path::Path;

use anyhow::{Context, bail};
use tracing::info;
use zeroize::Zeroizing;

use crate::codec::Codec;
use crate::crypto::{self, FINGERPRINT_LEN, KdfParams};
use crate::error::Result;
use crate::storage::Storage;
use crate::verifier::{VerifierRecord, VerifierTriple};

/// The two artifacts of one packaging run. They are only valid together.
#[derive(Debug)]
pub struct Package {
    pub verifier: VerifierTriple,
    pub blob: Vec<u8>,
}

impl Package {
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        crypto::fingerprint(&self.blob)
    }

    /// The verifier record bound to this package's blob.
    pub fn record(&self) -> VerifierRecord {
        VerifierRecord::new(&self.verifier, Some(self.fingerprint()))
    }
}

/// Summary of a `package_files` run, printed by the CLI.
#[derive(Debug, Clone)]
pub struct PackageReport {
    pub plaintext_len: usize,
    pub blob_len: usize,
    pub iterations: u32,
    pub fingerprint: [u8; FINGERPRINT_LEN],
}

/// Derives a fresh verifier and seals `plaintext`, both from `password`.
///
/// The verifier salt and the blob salt are drawn independently.
pub fn package(password: &[u8], plaintext: &[u8], kdf: KdfParams) -> Result<Package> {
    let verifier = VerifierTriple::generate(password, kdf)?;
    let blob = Codec::new(kdf).encode(plaintext, password)?;

    Ok(Package { verifier, blob })
}

/// Reads the dataset at `input` and publishes the verifier record and blob.
///
/// Both artifacts are computed before either is written. The verifier goes
/// first, then the blob; callers deploying them must replace both together.
pub fn package_files(
    password: Zeroizing<String>,
    input: &Path,
    blob_out: &Path,
    verifier_out: &Path,
    kdf: KdfParams,
) -> anyhow::Result<PackageReport> {
    if blob_out == verifier_out {
        bail!("blob and verifier outputs must be different files");
    }

    let plaintext = Zeroizing::new(
        std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?,
    );

    let package = package(password.as_bytes(), &plaintext, kdf)
        .context("failed to package dataset")?;
    drop(password);

    let record = package.record();
    Storage::new(verifier_out).save(&record.to_json()?)?;
    Storage::new(blob_out).save(&package.blob)?;

    let report = PackageReport {
        plaintext_len: plaintext.len(),
        blob_len: package.blob.len(),
        iterations: kdf.iterations(),
        fingerprint: package.fingerprint(),
    };

    info!(
        input = %input.display(),
        blob = %blob_out.display(),
        verifier = %verifier_out.display(),
        plaintext_len = report.plaintext_len,
        blob_len = report.blob_len,
        iterations = report.iterations,
        "packaged dataset"
    );

    Ok(report)
}
