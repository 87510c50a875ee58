//! Backend A: interpreted circuit program + universal prover (SP1 zkVM).
//!
//! The fetched artifact is a compiled guest program. The backend streams the
//! witness to the guest in a fixed order, executes it to obtain the full
//! trace (witness-execution failure means the private inputs violate the
//! guest's constraints), proves with the universal STARK prover (no
//! per-circuit setup) and self-verifies, including a byte-exact check that
//! the committed public values match the witness, before returning the
//! bincode-encoded proof.

use crate::backend::{BackendKind, ProofArtifact, ProofBackend};
use crate::error::CoreError;
use crate::field::field_to_bytes;
use crate::tree::TREE_DEPTH;
use crate::witness::WithdrawWitness;
use sp1_sdk::{ProverClient, SP1ProofWithPublicValues, SP1Stdin};

/// SP1 proving pipeline over a fetched guest program.
pub struct Sp1Backend {
    elf: Vec<u8>,
}

impl Sp1Backend {
    #[must_use]
    pub fn new(elf: Vec<u8>) -> Self {
        Self { elf }
    }

    /// Serializes the witness in the order the guest reads it: the ten
    /// public inputs, then the private inputs.
    fn stdin(witness: &WithdrawWitness) -> Result<SP1Stdin, CoreError> {
        if witness.path_elements.len() != TREE_DEPTH {
            return Err(CoreError::WitnessUnsatisfied(format!(
                "path has {} siblings, expected {TREE_DEPTH}",
                witness.path_elements.len()
            )));
        }

        let mut stdin = SP1Stdin::new();
        for public in witness.public_inputs() {
            stdin.write(&field_to_bytes(public));
        }
        stdin.write(&field_to_bytes(witness.nullifier));
        stdin.write(&field_to_bytes(witness.secret));

        let mut elements = [[0u8; 32]; TREE_DEPTH];
        for (slot, element) in elements.iter_mut().zip(&witness.path_elements) {
            *slot = field_to_bytes(*element);
        }
        stdin.write(&elements);
        stdin.write(&witness.path_indices);
        Ok(stdin)
    }

    /// The public-values stream the guest commits: the ten public inputs as
    /// 32-byte words, in witness order.
    fn expected_public_values(witness: &WithdrawWitness) -> Vec<u8> {
        let mut expected = Vec::with_capacity(10 * 32);
        for public in witness.public_inputs() {
            expected.extend_from_slice(&field_to_bytes(public));
        }
        expected
    }
}

impl ProofBackend for Sp1Backend {
    fn kind(&self) -> BackendKind {
        BackendKind::Zkvm
    }

    fn prove(&self, witness: &WithdrawWitness) -> Result<ProofArtifact, CoreError> {
        let stdin = Self::stdin(witness)?;
        let client = ProverClient::new();

        // Execute the circuit program first: a guest rejection here means
        // the private inputs do not satisfy its constraints.
        client
            .execute(&self.elf, stdin.clone())
            .run()
            .map_err(|e| CoreError::WitnessUnsatisfied(format!("guest execution: {e}")))?;

        let (pk, vk) = client.setup(&self.elf);
        let proof = client
            .prove(&pk, stdin)
            .run()
            .map_err(|e| CoreError::Backend(format!("sp1 prover: {e}")))?;

        client.verify(&proof, &vk).map_err(|e| {
            log::warn!("discarding sp1 proof that failed local verification: {e}");
            CoreError::ProofVerification
        })?;
        if proof.public_values.as_slice() != Self::expected_public_values(witness) {
            log::warn!("discarding sp1 proof whose committed publics diverge from the witness");
            return Err(CoreError::ProofVerification);
        }

        let bytes = bincode::serialize(&proof)
            .map_err(|e| CoreError::Backend(format!("proof serialization: {e}")))?;
        log::debug!("sp1 proof generated: {} bytes", bytes.len());
        Ok(ProofArtifact {
            kind: BackendKind::Zkvm,
            proof: bytes,
        })
    }

    fn verify(
        &self,
        artifact: &ProofArtifact,
        witness: &WithdrawWitness,
    ) -> Result<bool, CoreError> {
        if artifact.kind != BackendKind::Zkvm {
            return Ok(false);
        }
        let proof: SP1ProofWithPublicValues = bincode::deserialize(&artifact.proof)
            .map_err(|e| CoreError::Backend(format!("proof deserialization: {e}")))?;

        let client = ProverClient::new();
        let (_, vk) = client.setup(&self.elf);
        if client.verify(&proof, &vk).is_err() {
            return Ok(false);
        }
        Ok(proof.public_values.as_slice() == Self::expected_public_values(witness))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::DeriveContext;
    use crate::tree::{AuthPath, RAW_PATH_LEN};
    use ethers::types::Address;

    fn witness() -> WithdrawWitness {
        let note = DeriveContext::new()
            .unwrap()
            .note_from_strings("abc", "def")
            .unwrap();
        let mut raw = [[0u8; 32]; RAW_PATH_LEN];
        raw[0][31] = 7;
        raw[RAW_PATH_LEN - 1][31] = 9;
        let path = AuthPath::from_chain(&raw, 6).unwrap();
        WithdrawWitness::assemble(&note, &path, Address::zero()).unwrap()
    }

    #[test]
    fn test_expected_public_values_layout() {
        let w = witness();
        let expected = Sp1Backend::expected_public_values(&w);
        assert_eq!(expected.len(), 10 * 32);
        assert_eq!(&expected[..32], &field_to_bytes(w.root));
        assert_eq!(&expected[32..64], &field_to_bytes(w.nullifier_hash));
    }

    #[test]
    fn test_stdin_assembly_succeeds_for_full_path() {
        assert!(Sp1Backend::stdin(&witness()).is_ok());
    }

    #[test]
    fn test_stdin_rejects_truncated_path() {
        let mut w = witness();
        w.path_elements.truncate(7);
        assert!(matches!(
            Sp1Backend::stdin(&w),
            Err(CoreError::WitnessUnsatisfied(_))
        ));
    }
}
