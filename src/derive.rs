//! Deterministic derivation of commitments and nullifier hashes.
//!
//! User secrets are arbitrary strings. Each is hashed into a field element
//! with Keccak-256 reduced mod P, then combined with the circom-parameter
//! Poseidon permutation:
//!
//! - `nullifier_hash = Poseidon1(nullifier)`, published at withdrawal time.
//! - `commitment = Poseidon2(nullifier, secret)`, published at deposit time.
//!
//! The Poseidon parameter set must match the one baked into both proof
//! backends; `light-poseidon`'s `new_circom` constructors carry exactly that
//! set. All derivations are pure: identical inputs always produce identical
//! outputs, and changed inputs are handled by simply re-deriving.

use crate::error::CoreError;
use crate::field::reduce_to_field;
use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};
use sha3::{Digest, Keccak256};

/// Hashes an arbitrary-length string into a field element.
///
/// Keccak-256 over the UTF-8 bytes, reduced modulo the field prime.
///
/// # Examples
///
/// ```
/// use shielded_pool_core::derive::hash_preimage;
///
/// // Pure: the same preimage always maps to the same field element.
/// assert_eq!(hash_preimage("abc"), hash_preimage("abc"));
/// assert_ne!(hash_preimage("abc"), hash_preimage("abd"));
/// ```
#[must_use]
pub fn hash_preimage(text: &str) -> Fr {
    let digest: [u8; 32] = Keccak256::digest(text.as_bytes()).into();
    reduce_to_field(&digest)
}

/// Session context holding the two fixed-width Poseidon permutations.
///
/// Constructed once per session and passed into operations that derive
/// hashes, rather than living in an ambient singleton. Construction only
/// fails if the fixed parameter set cannot be instantiated, which would mean
/// a broken build rather than bad user input.
pub struct DeriveContext {
    single: Poseidon<Fr>,
    pair: Poseidon<Fr>,
}

impl DeriveContext {
    /// Creates the context with the circom parameter set for widths 1 and 2.
    pub fn new() -> Result<Self, CoreError> {
        let single = Poseidon::<Fr>::new_circom(1)
            .map_err(|e| CoreError::Hash(format!("poseidon width-1 setup: {e}")))?;
        let pair = Poseidon::<Fr>::new_circom(2)
            .map_err(|e| CoreError::Hash(format!("poseidon width-2 setup: {e}")))?;
        Ok(Self { single, pair })
    }

    /// Computes the nullifier hash `Poseidon1(nullifier)`.
    pub fn nullifier_hash(&mut self, nullifier: Fr) -> Result<Fr, CoreError> {
        self.single
            .hash(&[nullifier])
            .map_err(|e| CoreError::Hash(format!("poseidon width-1: {e}")))
    }

    /// Computes the commitment `Poseidon2(nullifier, secret)`.
    ///
    /// Nullifier-first ordering is significant: swapping the arguments
    /// produces a different commitment.
    pub fn commitment(&mut self, nullifier: Fr, secret: Fr) -> Result<Fr, CoreError> {
        self.pair
            .hash(&[nullifier, secret])
            .map_err(|e| CoreError::Hash(format!("poseidon width-2: {e}")))
    }

    /// Derives the full spending note from the user's secret strings.
    ///
    /// Both strings must be non-empty; the commitment only exists once both
    /// halves of the pair are present.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`] if either string is empty.
    pub fn note_from_strings(
        &mut self,
        nullifier_text: &str,
        secret_text: &str,
    ) -> Result<SpendingNote, CoreError> {
        if nullifier_text.is_empty() {
            return Err(CoreError::InvalidInput(
                "nullifier string must not be empty".to_string(),
            ));
        }
        if secret_text.is_empty() {
            return Err(CoreError::InvalidInput(
                "secret string must not be empty".to_string(),
            ));
        }

        let nullifier = hash_preimage(nullifier_text);
        let secret = hash_preimage(secret_text);
        let nullifier_hash = self.nullifier_hash(nullifier)?;
        let commitment = self.commitment(nullifier, secret)?;

        log::debug!(
            "derived note: nullifier_hash={}, commitment={}",
            crate::field::field_to_hex(nullifier_hash),
            crate::field::field_to_hex(commitment)
        );

        Ok(SpendingNote {
            nullifier,
            secret,
            nullifier_hash,
            commitment,
        })
    }
}

/// The derived values for one deposit: each secret/nullifier pair is used
/// exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendingNote {
    /// Keccak-reduced nullifier field element (private input).
    pub nullifier: Fr,
    /// Keccak-reduced secret field element (private input).
    pub secret: Fr,
    /// `Poseidon1(nullifier)`, published at withdrawal time.
    pub nullifier_hash: Fr,
    /// `Poseidon2(nullifier, secret)`, published at deposit time.
    pub commitment: Fr,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{field_from_hex, field_to_hex};

    #[test]
    fn test_hash_preimage_golden_vectors() {
        // keccak256("abc") mod P and keccak256("def") mod P, computed with a
        // reference Keccak implementation.
        assert_eq!(
            field_to_hex(hash_preimage("abc")),
            "0x1d9f1708091409260f8435f1a5477e0a989dfe9ac0ab2fa5a862fffbb12d6c44"
        );
        assert_eq!(
            field_to_hex(hash_preimage("def")),
            "0x03fc2e28deb9fbf998463b39c1e29a3bd57ccdb13229b69f0aeb2818b08cda9b"
        );
    }

    #[test]
    fn test_poseidon_parameter_set_matches_circom() {
        // circomlib reference vectors: Poseidon1(1) and Poseidon2(1, 2).
        let mut ctx = DeriveContext::new().unwrap();
        assert_eq!(
            field_to_hex(ctx.nullifier_hash(Fr::from(1u64)).unwrap()),
            "0x29176100eaa962bdc1fe6c654d6a3c130e96a4d1168b33848b897dc502820133"
        );
        assert_eq!(
            field_to_hex(ctx.commitment(Fr::from(1u64), Fr::from(2u64)).unwrap()),
            "0x115cc0f5e7d690413df64c6b9662e9cf2a3617f2743245519e19607a4417189a"
        );
    }

    #[test]
    fn test_note_golden_vectors() {
        // End-to-end values for the ("abc", "def") pair: keccak reduction
        // composed with the circom Poseidon permutations, computed with the
        // reference parameter generation.
        let mut ctx = DeriveContext::new().unwrap();
        let note = ctx.note_from_strings("abc", "def").unwrap();
        assert_eq!(
            field_to_hex(note.nullifier_hash),
            "0x16ab046854669e213e5c89733c41ea523b4bdfa4ef94b8598ce922f2a50caf0c"
        );
        assert_eq!(
            field_to_hex(note.commitment),
            "0x1ccaea3532ddd0754eb2a89f9d5e61c591686904233d52fab44e5f87bebb16d5"
        );
    }

    #[test]
    fn test_commitment_is_deterministic_and_input_sensitive() {
        let mut ctx = DeriveContext::new().unwrap();
        let a = ctx.note_from_strings("abc", "def").unwrap();
        let b = ctx.note_from_strings("abc", "def").unwrap();
        assert_eq!(a, b);

        let other_secret = ctx.note_from_strings("abc", "deg").unwrap();
        let other_nullifier = ctx.note_from_strings("abd", "def").unwrap();
        assert_ne!(a.commitment, other_secret.commitment);
        assert_ne!(a.commitment, other_nullifier.commitment);
        // Nullifier hash only depends on the nullifier.
        assert_eq!(a.nullifier_hash, other_secret.nullifier_hash);
        assert_ne!(a.nullifier_hash, other_nullifier.nullifier_hash);
    }

    #[test]
    fn test_commitment_argument_order_is_significant() {
        let mut ctx = DeriveContext::new().unwrap();
        let n = hash_preimage("abc");
        let s = hash_preimage("def");
        assert_ne!(
            ctx.commitment(n, s).unwrap(),
            ctx.commitment(s, n).unwrap()
        );
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let mut ctx = DeriveContext::new().unwrap();
        assert!(matches!(
            ctx.note_from_strings("", "def"),
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            ctx.note_from_strings("abc", ""),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_note_nullifier_hash_matches_direct_derivation() {
        let mut ctx = DeriveContext::new().unwrap();
        let note = ctx.note_from_strings("abc", "def").unwrap();
        let direct = ctx
            .nullifier_hash(field_from_hex(
                "0x1d9f1708091409260f8435f1a5477e0a989dfe9ac0ab2fa5a862fffbb12d6c44",
            )
            .unwrap())
            .unwrap();
        assert_eq!(note.nullifier_hash, direct);
    }
}
