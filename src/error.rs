//! Error taxonomy for the shielded pool client core.
//!
//! Every failure a caller can observe is one of these variants. Asynchronous
//! failures are caught at the operation boundary that triggered them and
//! surfaced as a `CoreError`; no operation reports success while leaving a
//! partially completed proof behind.

use thiserror::Error;

/// Errors produced by the client core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed numeric or string input, caught before any derivation runs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network failure while retrieving a proving artifact (circuit program,
    /// proving key). Retryable.
    #[error("failed to fetch proving artifact '{name}': {reason}")]
    ArtifactFetch { name: String, reason: String },

    /// The private inputs violate the circuit constraints (wrong secret,
    /// nullifier, or path). Fatal to the attempt; the user must correct
    /// their inputs.
    #[error("witness rejected by the circuit: {0}")]
    WitnessUnsatisfied(String),

    /// The freshly generated proof failed local self-verification. The proof
    /// is discarded and never returned to the caller.
    #[error("generated proof failed local verification")]
    ProofVerification,

    /// The authentication path for this leaf has not been published yet (the
    /// collaborator returned the all-zero placeholder array).
    #[error("authentication path unavailable for leaf {leaf_index}; the tree has not published it yet")]
    PathUnavailable { leaf_index: u64 },

    /// A proof generation is already in flight for this session.
    #[error("a proof generation is already in flight")]
    ProofInFlight,

    /// A read call against the settlement hook failed or returned data that
    /// does not decode to the expected shape. Retryable.
    #[error("chain read failed: {0}")]
    ChainRead(String),

    /// The settlement transaction reverted (duplicate commitment, spent
    /// nullifier, unknown root). The contract is the final authority; the
    /// client can only check these optimistically.
    #[error("settlement write rejected: {0}")]
    ChainWrite(String),

    /// Withdrawal payload bytes do not match the expected tuple shape.
    #[error("payload encoding: {0}")]
    Payload(String),

    /// Hash permutation failure (bad input width for the fixed parameter set).
    #[error("hashing failed: {0}")]
    Hash(String),

    /// Proving backend failure that is neither a witness violation nor a
    /// verification failure (key deserialization, prover internals).
    #[error("proving backend failure: {0}")]
    Backend(String),
}

impl CoreError {
    /// Whether the operation can be retried as-is (transient network
    /// failures), as opposed to requiring corrected inputs.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::ArtifactFetch { .. } | CoreError::ChainRead(_)
        )
    }
}
