//! Shielded Pool Client Core
//!
//! This library is the client-side protocol core of a shielded liquidity
//! pool: deposits publish a Poseidon commitment into an on-chain Merkle
//! forest maintained by a settlement hook, and withdrawals prove knowledge
//! of an unspent commitment in zero knowledge without revealing which one.
//!
//! # Components
//!
//! - [`DeriveContext`]: commitment and nullifier-hash derivation
//! - [`PoolKey`]: canonical pool identity hashing
//! - [`HookClient`]: authentication-path reads against the settlement hook
//! - [`ProofOrchestrator`]: artifact fetching and proof attempt coordination
//! - [`ProofBackend`]: the two interchangeable proof systems (zkVM, Groth16)
//! - [`WithdrawalPayload`]: hook-data wire encoding
//!
//! # Example
//!
//! ```no_run
//! use shielded_pool_core::{DeriveContext, payload::deposit_data};
//!
//! let mut ctx = DeriveContext::new()?;
//! let note = ctx.note_from_strings("my nullifier", "my secret")?;
//! let hook_data = deposit_data(note.commitment);
//! # Ok::<(), shielded_pool_core::CoreError>(())
//! ```

pub mod backend;
pub mod config;
pub mod derive;
pub mod error;
pub mod field;
pub mod orchestrator;
pub mod payload;
pub mod pool;
pub mod tree;
pub mod witness;

pub use backend::{BackendKind, ProofArtifact, ProofBackend};
pub use derive::{DeriveContext, SpendingNote};
pub use error::CoreError;
pub use orchestrator::{ArtifactStore, ProofOrchestrator, ProofStatus};
pub use payload::WithdrawalPayload;
pub use pool::PoolKey;
pub use tree::{AuthPath, HookClient};
pub use witness::WithdrawWitness;

/// Depth of each Merkle tree in the forest.
///
/// Every tree holds up to 2^20 commitments; when one fills, the hook rolls
/// over to a fresh tree and the tree number increments. Authentication paths
/// are always exactly this many siblings plus the root, so witness shape is
/// independent of how full the tree is.
///
/// Prover and settlement contract must agree on this value; the circuits are
/// compiled for it, and changing it requires regenerating every proving
/// artifact.
pub const TREE_DEPTH: usize = tree::TREE_DEPTH;
