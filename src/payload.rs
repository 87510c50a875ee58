//! Wire encoding of hook data for deposits and withdrawals.
//!
//! Withdrawals travel as one ABI-encoded
//! `tuple(bool, bytes32, bytes32, address, bytes)`: backend flag, nullifier
//! hash, root, recipient, opaque proof bytes. The proof bytes are never
//! inspected here; routing is by the flag alone. Deposits carry just the
//! 32-byte big-endian commitment.

use crate::backend::BackendKind;
use crate::error::CoreError;
use crate::field::field_to_bytes;
use ark_bn254::Fr;
use ethers::abi::{self, ParamType, Token};
use ethers::types::Address;

/// Decoded form of the withdrawal hook data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalPayload {
    /// Which verifier the settlement contract must route the proof to.
    pub backend: BackendKind,
    /// Published nullifier hash, 32-byte big-endian field element.
    pub nullifier_hash: [u8; 32],
    /// Merkle root the proof was generated against.
    pub root: [u8; 32],
    /// Address the funds are released to.
    pub recipient: Address,
    /// Proof bytes, opaque to everything but the flagged backend.
    pub proof: Vec<u8>,
}

impl WithdrawalPayload {
    /// ABI-encodes the payload as the single withdrawal tuple.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        abi::encode(&[Token::Tuple(vec![
            Token::Bool(self.backend.flag()),
            Token::FixedBytes(self.nullifier_hash.to_vec()),
            Token::FixedBytes(self.root.to_vec()),
            Token::Address(self.recipient),
            Token::Bytes(self.proof.clone()),
        ])])
    }

    /// Decodes withdrawal hook data back into its parts.
    ///
    /// # Errors
    /// Returns [`CoreError::Payload`] if the bytes do not decode as the
    /// expected tuple.
    pub fn decode(data: &[u8]) -> Result<Self, CoreError> {
        let tokens = abi::decode(
            &[ParamType::Tuple(vec![
                ParamType::Bool,
                ParamType::FixedBytes(32),
                ParamType::FixedBytes(32),
                ParamType::Address,
                ParamType::Bytes,
            ])],
            data,
        )
        .map_err(|e| CoreError::Payload(format!("withdrawal tuple: {e}")))?;

        let Some(Token::Tuple(fields)) = tokens.into_iter().next() else {
            return Err(CoreError::Payload(
                "withdrawal tuple: missing tuple token".to_string(),
            ));
        };
        let mut fields = fields.into_iter();
        let (
            Some(Token::Bool(flag)),
            Some(Token::FixedBytes(nullifier_hash)),
            Some(Token::FixedBytes(root)),
            Some(Token::Address(recipient)),
            Some(Token::Bytes(proof)),
        ) = (
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
            fields.next(),
        )
        else {
            return Err(CoreError::Payload(
                "withdrawal tuple: unexpected field shape".to_string(),
            ));
        };

        Ok(Self {
            backend: BackendKind::from_flag(flag),
            nullifier_hash: fixed32(&nullifier_hash)?,
            root: fixed32(&root)?,
            recipient,
            proof,
        })
    }
}

fn fixed32(bytes: &[u8]) -> Result<[u8; 32], CoreError> {
    bytes
        .try_into()
        .map_err(|_| CoreError::Payload(format!("expected 32 bytes, got {}", bytes.len())))
}

/// Hook data for a deposit: the commitment as a 32-byte big-endian word.
#[must_use]
pub fn deposit_data(commitment: Fr) -> [u8; 32] {
    field_to_bytes(commitment)
}
