//! Proof backends.
//!
//! Two interchangeable zero-knowledge argument systems consume the shared
//! [`WithdrawWitness`](crate::witness::WithdrawWitness) but are otherwise
//! independent pipelines with incompatible byte encodings:
//!
//! - [`Sp1Backend`](zkvm::Sp1Backend): interpreted-circuit family. A fetched
//!   guest program is executed against the witness, then proved with a
//!   universal STARK prover.
//! - [`Groth16Backend`](groth16::Groth16Backend): QAP family with a
//!   per-circuit trusted setup. A fetched proving-key artifact plus an
//!   external witness calculator.
//!
//! Every backend self-verifies before returning; a proof that fails the
//! local check is never surfaced as usable.

pub mod groth16;
pub mod zkvm;

use crate::error::CoreError;
use crate::field::field_to_bytes;
use crate::witness::WithdrawWitness;
use sha3::{Digest, Keccak256};

/// Which proof system produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Backend A: interpreted circuit program + universal prover (zkVM).
    Zkvm,
    /// Backend B: Groth16 over BN254 with a per-circuit proving key.
    Groth16,
}

impl BackendKind {
    /// The payload discriminant: `true` for Backend A.
    #[must_use]
    pub fn flag(self) -> bool {
        matches!(self, BackendKind::Zkvm)
    }

    /// Inverse of [`BackendKind::flag`].
    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            BackendKind::Zkvm
        } else {
            BackendKind::Groth16
        }
    }
}

/// A generated proof, tagged with the backend that produced it. The bytes
/// are opaque to everything except that backend's verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifact {
    pub kind: BackendKind,
    pub proof: Vec<u8>,
}

/// Shared capability of the two proof systems: prove knowledge of a valid,
/// unspent deposit for a witness, self-verifying before returning.
pub trait ProofBackend {
    /// The tag stamped onto artifacts this backend produces.
    fn kind(&self) -> BackendKind;

    /// Executes the witness, proves, and self-verifies.
    ///
    /// # Errors
    /// - [`CoreError::WitnessUnsatisfied`] if the private inputs violate the
    ///   circuit constraints (fatal to the attempt).
    /// - [`CoreError::ProofVerification`] if the local self-check fails; no
    ///   artifact is returned in that case.
    /// - [`CoreError::Backend`] for prover-internal failures.
    fn prove(&self, witness: &WithdrawWitness) -> Result<ProofArtifact, CoreError>;

    /// Re-verifies an artifact against the witness's public inputs.
    fn verify(&self, artifact: &ProofArtifact, witness: &WithdrawWitness)
        -> Result<bool, CoreError>;
}

/// Deterministic fake backend for tests and dry runs.
///
/// Produces a keccak digest of the public inputs in place of a proof. Not a
/// proof system; exists so orchestration can be exercised without proving
/// artifacts.
pub struct MockBackend {
    kind: BackendKind,
}

impl MockBackend {
    #[must_use]
    pub fn new(kind: BackendKind) -> Self {
        Self { kind }
    }

    fn digest(witness: &WithdrawWitness) -> Vec<u8> {
        let mut hasher = Keccak256::new();
        for input in witness.public_inputs() {
            hasher.update(field_to_bytes(input));
        }
        hasher.finalize().to_vec()
    }
}

impl ProofBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn prove(&self, witness: &WithdrawWitness) -> Result<ProofArtifact, CoreError> {
        Ok(ProofArtifact {
            kind: self.kind,
            proof: Self::digest(witness),
        })
    }

    fn verify(
        &self,
        artifact: &ProofArtifact,
        witness: &WithdrawWitness,
    ) -> Result<bool, CoreError> {
        Ok(artifact.kind == self.kind && artifact.proof == Self::digest(witness))
    }
}
