//! Backend B: Groth16 over BN254 (QAP family, per-circuit trusted setup).
//!
//! The fetched artifact bundles the circuit's proving key and constraint
//! matrices. The full variable assignment comes from a witness calculator,
//! an external circuit-specific program (the deployment ships a
//! WASM-compiled one) behind the [`WitnessCalculator`] seam. Proving runs
//! the Groth16 reduction directly over matrices + assignment, self-verifies
//! with the prepared verifying key, and returns the compressed proof bytes.

use crate::backend::{BackendKind, ProofArtifact, ProofBackend};
use crate::error::CoreError;
use crate::witness::WithdrawWitness;
use ark_bn254::{Bn254, Fr};
use ark_ff::One;
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, ProvingKey};
use ark_relations::r1cs::ConstraintMatrices;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{rngs::StdRng, SeedableRng};
use ark_std::UniformRand;
use std::io::Read;

const ARTIFACT_MAGIC: &[u8; 4] = b"SPG1";

/// Produces the circuit's full variable assignment (instance segment first,
/// leading constant one included) from the logical witness values.
///
/// This is the seam for the external witness-calculator program; an
/// implementation that cannot satisfy the constraints for the given inputs
/// must return [`CoreError::WitnessUnsatisfied`].
pub trait WitnessCalculator {
    fn calculate(&self, witness: &WithdrawWitness) -> Result<Vec<Fr>, CoreError>;
}

/// A witness calculator backed by an assignment computed out-of-process.
///
/// Validates that the instance segment actually binds the witness's public
/// inputs before handing the assignment to the prover.
pub struct PrecomputedAssignment {
    assignment: Vec<Fr>,
}

impl PrecomputedAssignment {
    #[must_use]
    pub fn new(assignment: Vec<Fr>) -> Self {
        Self { assignment }
    }

    /// Loads an assignment from a JSON array of 32-byte hex strings.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::InvalidInput(format!("cannot read assignment file {}: {e}", path.display()))
        })?;
        let entries: Vec<String> = serde_json::from_str(&content)
            .map_err(|e| CoreError::InvalidInput(format!("assignment file is not a JSON string array: {e}")))?;
        let assignment = entries
            .iter()
            .map(|entry| {
                crate::field::field_from_hex(entry)
                    .map_err(|e| CoreError::InvalidInput(format!("assignment entry: {e}")))
            })
            .collect::<Result<Vec<Fr>, CoreError>>()?;
        Ok(Self::new(assignment))
    }
}

impl WitnessCalculator for PrecomputedAssignment {
    fn calculate(&self, witness: &WithdrawWitness) -> Result<Vec<Fr>, CoreError> {
        let publics = witness.public_inputs();
        if self.assignment.len() <= publics.len() {
            return Err(CoreError::WitnessUnsatisfied(
                "assignment shorter than the public input segment".to_string(),
            ));
        }
        if self.assignment[0] != Fr::one() {
            return Err(CoreError::WitnessUnsatisfied(
                "assignment does not start with the constant one".to_string(),
            ));
        }
        if self.assignment[1..=publics.len()] != publics[..] {
            return Err(CoreError::WitnessUnsatisfied(
                "assignment public inputs do not match the witness".to_string(),
            ));
        }
        Ok(self.assignment.clone())
    }
}

/// The fetched proving material: proving key plus constraint matrices.
pub struct Groth16Artifact {
    pub proving_key: ProvingKey<Bn254>,
    pub matrices: ConstraintMatrices<Fr>,
}

fn write_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn read_u64(reader: &mut &[u8]) -> Result<u64, CoreError> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|e| CoreError::Backend(format!("truncated groth16 artifact: {e}")))?;
    Ok(u64::from_le_bytes(buf))
}

fn write_matrix(out: &mut Vec<u8>, matrix: &[Vec<(Fr, usize)>]) -> Result<(), CoreError> {
    write_u64(out, matrix.len() as u64);
    for row in matrix {
        write_u64(out, row.len() as u64);
        for (coeff, index) in row {
            coeff
                .serialize_compressed(&mut *out)
                .map_err(|e| CoreError::Backend(format!("matrix coefficient: {e}")))?;
            write_u64(out, *index as u64);
        }
    }
    Ok(())
}

fn read_matrix(reader: &mut &[u8]) -> Result<Vec<Vec<(Fr, usize)>>, CoreError> {
    let rows = read_u64(reader)? as usize;
    let mut matrix = Vec::with_capacity(rows);
    for _ in 0..rows {
        let terms = read_u64(reader)? as usize;
        let mut row = Vec::with_capacity(terms);
        for _ in 0..terms {
            let coeff = Fr::deserialize_compressed(&mut *reader)
                .map_err(|e| CoreError::Backend(format!("matrix coefficient: {e}")))?;
            let index = read_u64(reader)? as usize;
            row.push((coeff, index));
        }
        matrix.push(row);
    }
    Ok(matrix)
}

fn non_zero(matrix: &[Vec<(Fr, usize)>]) -> usize {
    matrix.iter().map(Vec::len).sum()
}

impl Groth16Artifact {
    /// Serializes the bundle for distribution through the artifact store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let mut out = Vec::new();
        out.extend_from_slice(ARTIFACT_MAGIC);
        self.proving_key
            .serialize_compressed(&mut out)
            .map_err(|e| CoreError::Backend(format!("proving key serialization: {e}")))?;
        write_u64(&mut out, self.matrices.num_instance_variables as u64);
        write_u64(&mut out, self.matrices.num_witness_variables as u64);
        write_u64(&mut out, self.matrices.num_constraints as u64);
        write_matrix(&mut out, &self.matrices.a)?;
        write_matrix(&mut out, &self.matrices.b)?;
        write_matrix(&mut out, &self.matrices.c)?;
        Ok(out)
    }

    /// Parses a fetched bundle.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut reader = bytes;
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| CoreError::Backend(format!("truncated groth16 artifact: {e}")))?;
        if &magic != ARTIFACT_MAGIC {
            return Err(CoreError::Backend(
                "groth16 artifact has wrong magic bytes".to_string(),
            ));
        }
        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(&mut reader)
            .map_err(|e| CoreError::Backend(format!("proving key deserialization: {e}")))?;
        let num_instance_variables = read_u64(&mut reader)? as usize;
        let num_witness_variables = read_u64(&mut reader)? as usize;
        let num_constraints = read_u64(&mut reader)? as usize;
        let a = read_matrix(&mut reader)?;
        let b = read_matrix(&mut reader)?;
        let c = read_matrix(&mut reader)?;
        let matrices = ConstraintMatrices {
            num_instance_variables,
            num_witness_variables,
            num_constraints,
            a_num_non_zero: non_zero(&a),
            b_num_non_zero: non_zero(&b),
            c_num_non_zero: non_zero(&c),
            a,
            b,
            c,
        };
        Ok(Self {
            proving_key,
            matrices,
        })
    }
}

/// Groth16 proving pipeline over a fetched artifact.
pub struct Groth16Backend<W> {
    artifact: Groth16Artifact,
    pvk: PreparedVerifyingKey<Bn254>,
    calculator: W,
}

impl<W: WitnessCalculator> Groth16Backend<W> {
    pub fn new(artifact: Groth16Artifact, calculator: W) -> Self {
        let pvk = prepare_verifying_key(&artifact.proving_key.vk);
        Self {
            artifact,
            pvk,
            calculator,
        }
    }

    /// Parses the fetched artifact bytes and builds the backend.
    pub fn from_artifact_bytes(bytes: &[u8], calculator: W) -> Result<Self, CoreError> {
        Ok(Self::new(Groth16Artifact::from_bytes(bytes)?, calculator))
    }
}

impl<W: WitnessCalculator> ProofBackend for Groth16Backend<W> {
    fn kind(&self) -> BackendKind {
        BackendKind::Groth16
    }

    fn prove(&self, witness: &WithdrawWitness) -> Result<ProofArtifact, CoreError> {
        let assignment = self.calculator.calculate(witness)?;
        let matrices = &self.artifact.matrices;
        if assignment.len() != matrices.num_instance_variables + matrices.num_witness_variables {
            return Err(CoreError::WitnessUnsatisfied(format!(
                "assignment has {} variables, circuit expects {}",
                assignment.len(),
                matrices.num_instance_variables + matrices.num_witness_variables
            )));
        }

        let mut rng = StdRng::from_entropy();
        let r = Fr::rand(&mut rng);
        let s = Fr::rand(&mut rng);
        let proof = Groth16::<Bn254>::create_proof_with_reduction_and_matrices(
            &self.artifact.proving_key,
            r,
            s,
            matrices,
            matrices.num_instance_variables,
            matrices.num_constraints,
            &assignment,
        )
        .map_err(|e| CoreError::Backend(format!("groth16 prover: {e}")))?;

        // Local self-check before the proof ever leaves this function.
        let publics = witness.public_inputs();
        let valid = Groth16::<Bn254>::verify_proof(&self.pvk, &proof, &publics)
            .map_err(|e| CoreError::Backend(format!("groth16 verifier: {e}")))?;
        if !valid {
            log::warn!("discarding groth16 proof that failed local verification");
            return Err(CoreError::ProofVerification);
        }

        let mut bytes = Vec::new();
        proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| CoreError::Backend(format!("proof serialization: {e}")))?;
        log::debug!("groth16 proof generated: {} bytes", bytes.len());
        Ok(ProofArtifact {
            kind: BackendKind::Groth16,
            proof: bytes,
        })
    }

    fn verify(
        &self,
        artifact: &ProofArtifact,
        witness: &WithdrawWitness,
    ) -> Result<bool, CoreError> {
        if artifact.kind != BackendKind::Groth16 {
            return Ok(false);
        }
        let proof = Proof::<Bn254>::deserialize_compressed(artifact.proof.as_slice())
            .map_err(|e| CoreError::Backend(format!("proof deserialization: {e}")))?;
        Groth16::<Bn254>::verify_proof(&self.pvk, &proof, &witness.public_inputs())
            .map_err(|e| CoreError::Backend(format!("groth16 verifier: {e}")))
    }
}
