//! Runtime unlock flow: verify the password, fetch the blob, open it.
//!
//! Attempts are serialized. Each call to [`Orchestrator::submit`] takes a
//! ticket; an attempt whose ticket is no longer the latest when it resumes
//! from a suspension point is dropped without touching the session.

mod session;
mod source;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

pub use session::AuthSession;
pub use source::{BlobSource, FileSource, MemorySource};

use crate::codec::Codec;
use crate::crypto::{self, FINGERPRINT_LEN};
use crate::error::{Error, Result};
use crate::verifier::{VerifierRecord, VerifierTriple};

/// Result of an attempt that did not fail.
#[derive(Debug)]
pub enum Unlock {
    /// The decrypted dataset, for the consumer.
    Dataset(Zeroizing<Vec<u8>>),
    /// A newer attempt (or a logout) arrived; this one's result was discarded.
    Superseded,
}

pub struct Orchestrator<S> {
    verifier: Arc<VerifierTriple>,
    codec: Codec,
    expected_fingerprint: Option<[u8; FINGERPRINT_LEN]>,
    source: S,
    session: watch::Sender<AuthSession>,
    latest: AtomicU64,
    in_flight: Mutex<()>,
}

impl<S: BlobSource> Orchestrator<S> {
    /// The blob is opened with the verifier's iteration count.
    pub fn new(verifier: VerifierTriple, source: S) -> Self {
        let codec = Codec::new(verifier.kdf());
        Self {
            verifier: Arc::new(verifier),
            codec,
            expected_fingerprint: None,
            source,
            session: watch::Sender::new(AuthSession::default()),
            latest: AtomicU64::new(0),
            in_flight: Mutex::new(()),
        }
    }

    /// Builds an orchestrator from a shipped record, binding it to the blob
    /// fingerprint when the record carries one.
    pub fn from_record(record: &VerifierRecord, source: S) -> Result<Self> {
        let mut orchestrator = Self::new(record.triple()?, source);
        orchestrator.expected_fingerprint = record.blob_fingerprint()?;
        Ok(orchestrator)
    }

    pub fn session(&self) -> AuthSession {
        self.session.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSession> {
        self.session.subscribe()
    }

    /// Clears the session and invalidates any attempt still in flight.
    pub fn logout(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.session.send_replace(AuthSession::default());
        info!("session cleared");
    }

    /// Registers an unlock attempt and returns the future that runs it.
    ///
    /// The attempt counts as submitted when this is called, not when the
    /// future is first polled.
    pub fn submit(
        &self,
        candidate: Zeroizing<String>,
    ) -> impl Future<Output = Result<Unlock>> + '_ {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.attempt(ticket, candidate)
    }

    fn is_stale(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) != ticket
    }

    /// Marks the session authenticated unless `ticket` went stale.
    ///
    /// The check runs under the session lock, so a concurrent `logout` either
    /// invalidates the ticket first or clears the session afterwards.
    fn commit_unlock(&self, ticket: u64) -> bool {
        self.session.send_if_modified(|session| {
            if self.is_stale(ticket) {
                return false;
            }
            *session = AuthSession::unlocked(Utc::now());
            true
        })
    }

    async fn attempt(&self, ticket: u64, candidate: Zeroizing<String>) -> Result<Unlock> {
        let _guard = self.in_flight.lock().await;
        if self.is_stale(ticket) {
            debug!(ticket, "attempt superseded before start");
            return Ok(Unlock::Superseded);
        }

        let verifier = Arc::clone(&self.verifier);
        let (accepted, candidate) = task::spawn_blocking(move || {
            let accepted = verifier.check(candidate.as_bytes());
            (accepted, candidate)
        })
        .await?;

        if self.is_stale(ticket) {
            debug!(ticket, "attempt superseded after verification");
            return Ok(Unlock::Superseded);
        }
        if !accepted {
            warn!("password rejected");
            return Err(Error::AuthenticationFailed);
        }

        let fetched = self.source.fetch().await;
        if self.is_stale(ticket) {
            debug!(ticket, "attempt superseded after fetch");
            return Ok(Unlock::Superseded);
        }
        let blob = fetched.inspect_err(|e| warn!(error = %e, "blob fetch failed"))?;

        if let Some(expected) = self.expected_fingerprint {
            if crypto::fingerprint(&blob) != expected {
                self.session.send_replace(AuthSession::default());
                error!("fetched blob does not match the verifier record");
                return Err(Error::BlobMismatch);
            }
        }

        let codec = self.codec;
        let opened = task::spawn_blocking(move || codec.decode(&blob, candidate.as_bytes())).await?;

        if self.is_stale(ticket) {
            debug!(ticket, "attempt superseded after decryption");
            return Ok(Unlock::Superseded);
        }

        match opened {
            Ok(plaintext) => {
                if !self.commit_unlock(ticket) {
                    debug!(ticket, "attempt superseded before commit");
                    return Ok(Unlock::Superseded);
                }
                info!(bytes = plaintext.len(), "dataset unlocked");
                Ok(Unlock::Dataset(plaintext))
            }
            Err(e) => {
                self.session.send_replace(AuthSession::default());
                error!(error = %e, "password accepted but blob could not be opened");
                Err(e)
            }
        }
    }
}
