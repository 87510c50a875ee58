//! Proof generation orchestration.
//!
//! Owns the pieces a withdrawal attempt needs before a backend can run:
//! fetching the proving artifacts from wherever the deployment hosts them,
//! assembling the witness, and enforcing that at most one proof generation
//! is in flight per session. Artifacts are fetched per attempt and are not
//! cached here; a deployment that wants caching wraps its [`ArtifactStore`].

use crate::backend::groth16::{Groth16Backend, WitnessCalculator};
use crate::backend::zkvm::Sp1Backend;
use crate::backend::{ProofArtifact, ProofBackend};
use crate::derive::SpendingNote;
use crate::error::CoreError;
use crate::tree::AuthPath;
use crate::witness::WithdrawWitness;
use async_trait::async_trait;
use ethers::types::Address;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Artifact name of the compiled zkVM guest program.
pub const ZKVM_PROGRAM_ARTIFACT: &str = "withdraw_sp1.elf";

/// Artifact name of the Groth16 proving key + matrices bundle.
pub const GROTH16_ARTIFACT: &str = "withdraw_groth16.bin";

/// Source of proving artifacts.
///
/// # Errors
/// Implementations report every failure as [`CoreError::ArtifactFetch`],
/// which callers may retry.
#[async_trait]
pub trait ArtifactStore {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, CoreError>;
}

#[async_trait]
impl ArtifactStore for Box<dyn ArtifactStore + Send + Sync> {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, CoreError> {
        (**self).fetch(name).await
    }
}

/// Fetches artifacts over HTTP from a static file host.
pub struct HttpArtifactStore {
    base: String,
    client: reqwest::Client,
}

impl HttpArtifactStore {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.base.trim_end_matches('/'), name)
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, CoreError> {
        let url = self.url_for(name);
        log::info!("fetching proving artifact from {url}");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CoreError::ArtifactFetch {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let bytes = response.bytes().await.map_err(|e| CoreError::ArtifactFetch {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }
}

/// Reads artifacts from a local directory.
pub struct DirArtifactStore {
    dir: PathBuf,
}

impl DirArtifactStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactStore for DirArtifactStore {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>, CoreError> {
        let path = self.dir.join(name);
        tokio::fs::read(&path)
            .await
            .map_err(|e| CoreError::ArtifactFetch {
                name: name.to_string(),
                reason: format!("{}: {e}", path.display()),
            })
    }
}

/// Observable state of the orchestrator's single proving slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofStatus {
    Idle,
    Generating,
}

/// Session-scoped coordinator for withdrawal proof attempts.
pub struct ProofOrchestrator<S> {
    store: S,
    in_flight: AtomicBool,
}

impl<S: ArtifactStore> ProofOrchestrator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Current state of the proving slot.
    #[must_use]
    pub fn status(&self) -> ProofStatus {
        if self.in_flight.load(Ordering::SeqCst) {
            ProofStatus::Generating
        } else {
            ProofStatus::Idle
        }
    }

    /// Fetches the zkVM guest program and builds Backend A.
    pub async fn load_zkvm_backend(&self) -> Result<Sp1Backend, CoreError> {
        let elf = self.store.fetch(ZKVM_PROGRAM_ARTIFACT).await?;
        log::debug!("zkvm guest program loaded: {} bytes", elf.len());
        Ok(Sp1Backend::new(elf))
    }

    /// Fetches the Groth16 proving bundle and builds Backend B around the
    /// given witness calculator.
    pub async fn load_groth16_backend<W: WitnessCalculator>(
        &self,
        calculator: W,
    ) -> Result<Groth16Backend<W>, CoreError> {
        let bytes = self.store.fetch(GROTH16_ARTIFACT).await?;
        log::debug!("groth16 proving bundle loaded: {} bytes", bytes.len());
        Groth16Backend::from_artifact_bytes(&bytes, calculator)
    }

    /// Runs one withdrawal proof attempt.
    ///
    /// Assembles the witness from the note, the fetched path, and the
    /// recipient, then hands it to the backend. The in-flight guard rejects
    /// a second attempt while one is running; the slot is released on every
    /// exit, success or failure.
    ///
    /// # Errors
    /// - [`CoreError::ProofInFlight`] if an attempt is already running.
    /// - [`CoreError::PathUnavailable`] if the path is the placeholder.
    /// - Whatever the backend's prove step reports.
    pub fn prove_withdrawal(
        &self,
        backend: &dyn ProofBackend,
        note: &SpendingNote,
        path: &AuthPath,
        recipient: Address,
    ) -> Result<ProofArtifact, CoreError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::ProofInFlight);
        }

        let result = WithdrawWitness::assemble(note, path, recipient)
            .and_then(|witness| backend.prove(&witness));

        self.in_flight.store(false, Ordering::SeqCst);
        if let Err(err) = &result {
            log::warn!("withdrawal proof attempt failed: {err}");
        }
        result
    }
}
