//! The shared witness schema consumed by both proof backends.
//!
//! Both backends prove the same logical statement over the same values; only
//! their pipelines and byte encodings differ. The witness is assembled once
//! per attempt and is attempt-local: it must never be reused across
//! withdrawal attempts.

use crate::derive::SpendingNote;
use crate::error::CoreError;
use crate::field::{address_to_field, square_mod_p};
use crate::tree::{AuthPath, TREE_DEPTH};
use ark_bn254::Fr;
use ethers::types::Address;

/// Relayer address fixed to zero by this deployment.
pub const RELAYER: Fr = ark_ff::MontFp!("0");
/// Relayer fee fixed to zero by this deployment.
pub const FEE: Fr = ark_ff::MontFp!("0");
/// Refund amount fixed to zero by this deployment.
pub const REFUND: Fr = ark_ff::MontFp!("0");

/// Complete witness for one withdrawal attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawWitness {
    // Public inputs.
    pub root: Fr,
    pub nullifier_hash: Fr,
    pub recipient: Fr,
    pub relayer: Fr,
    pub fee: Fr,
    pub refund: Fr,
    // Anti-malleability square bindings (also public).
    pub recipient_square: Fr,
    pub relayer_square: Fr,
    pub fee_square: Fr,
    pub refund_square: Fr,
    // Private inputs.
    pub nullifier: Fr,
    pub secret: Fr,
    pub path_elements: Vec<Fr>,
    pub path_indices: [u8; TREE_DEPTH],
}

impl WithdrawWitness {
    /// Assembles the witness for a withdrawal attempt.
    ///
    /// The root is taken from the path the tree client actually returned,
    /// never from a caller-supplied value, and a placeholder path is
    /// refused outright.
    ///
    /// # Errors
    /// Returns [`CoreError::PathUnavailable`] if the path is the all-zero
    /// placeholder.
    pub fn assemble(
        note: &SpendingNote,
        path: &AuthPath,
        recipient: Address,
    ) -> Result<Self, CoreError> {
        if path.is_placeholder() {
            return Err(CoreError::PathUnavailable {
                leaf_index: path.leaf_index,
            });
        }

        let recipient_field = address_to_field(recipient);
        Ok(Self {
            root: path.root_as_field(),
            nullifier_hash: note.nullifier_hash,
            recipient: recipient_field,
            relayer: RELAYER,
            fee: FEE,
            refund: REFUND,
            recipient_square: square_mod_p(recipient_field),
            relayer_square: square_mod_p(RELAYER),
            fee_square: square_mod_p(FEE),
            refund_square: square_mod_p(REFUND),
            nullifier: note.nullifier,
            secret: note.secret,
            path_elements: path.elements_as_fields(),
            path_indices: path.indices,
        })
    }

    /// The public inputs in the canonical order both backends expose them:
    /// root, nullifierHash, recipient, relayer, fee, refund,
    /// recipientSquare, relayerSquare, feeSquare, refundSquare.
    #[must_use]
    pub fn public_inputs(&self) -> Vec<Fr> {
        vec![
            self.root,
            self.nullifier_hash,
            self.recipient,
            self.relayer,
            self.fee,
            self.refund,
            self.recipient_square,
            self.relayer_square,
            self.fee_square,
            self.refund_square,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::DeriveContext;
    use crate::tree::{AuthPath, RAW_PATH_LEN};
    use crate::field::field_to_hex;

    fn note() -> SpendingNote {
        DeriveContext::new()
            .unwrap()
            .note_from_strings("abc", "def")
            .unwrap()
    }

    fn real_path() -> AuthPath {
        let mut raw = [[0u8; 32]; RAW_PATH_LEN];
        for (i, entry) in raw.iter_mut().enumerate() {
            entry[31] = i as u8 + 1;
        }
        AuthPath::from_chain(&raw, 5).unwrap()
    }

    #[test]
    fn test_assemble_refuses_placeholder_path() {
        let placeholder = AuthPath::from_chain(&[[0u8; 32]; RAW_PATH_LEN], 5).unwrap();
        let result = WithdrawWitness::assemble(&note(), &placeholder, Address::zero());
        assert!(matches!(
            result,
            Err(CoreError::PathUnavailable { leaf_index: 5 })
        ));
    }

    #[test]
    fn test_disabled_relayer_fields_are_zero() {
        let recipient: Address = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
            .parse()
            .unwrap();
        let witness = WithdrawWitness::assemble(&note(), &real_path(), recipient).unwrap();
        assert_eq!(witness.relayer, Fr::from(0u64));
        assert_eq!(witness.fee, Fr::from(0u64));
        assert_eq!(witness.refund, Fr::from(0u64));
        assert_eq!(witness.relayer_square, Fr::from(0u64));
        assert_eq!(witness.fee_square, Fr::from(0u64));
        assert_eq!(witness.refund_square, Fr::from(0u64));
    }

    #[test]
    fn test_recipient_square_binding() {
        let recipient: Address = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
            .parse()
            .unwrap();
        let witness = WithdrawWitness::assemble(&note(), &real_path(), recipient).unwrap();
        assert_eq!(
            field_to_hex(witness.recipient_square),
            "0x0cf4f1978be3cb0c654a1f80591b4f0e8fccb33bac19f1cf509465572c756280"
        );
        assert_eq!(
            witness.recipient_square,
            square_mod_p(witness.recipient)
        );
    }

    #[test]
    fn test_public_input_order() {
        let witness = WithdrawWitness::assemble(&note(), &real_path(), Address::zero()).unwrap();
        let publics = witness.public_inputs();
        assert_eq!(publics.len(), 10);
        assert_eq!(publics[0], witness.root);
        assert_eq!(publics[1], witness.nullifier_hash);
        assert_eq!(publics[6], witness.recipient_square);
    }

    #[test]
    fn test_root_comes_from_the_path() {
        let path = real_path();
        let witness = WithdrawWitness::assemble(&note(), &path, Address::zero()).unwrap();
        assert_eq!(witness.root, path.root_as_field());
        assert_eq!(witness.path_elements.len(), TREE_DEPTH);
        assert_eq!(witness.path_indices, path.indices);
    }
}
