//! Client for the externally maintained Merkle forest.
//!
//! This core never builds trees. It reads a fixed-size authentication path
//! (`bytes32[21]`: 20 siblings leaf-to-root plus the root) from the
//! settlement hook and shapes it into sibling list, index bits, and root.
//! Paths are fetched fresh per withdrawal attempt and never cached across
//! attempts.

use crate::error::CoreError;
use crate::field::reduce_to_field;
use ark_bn254::Fr;
use ethers::abi::{self, ParamType, Token};
use ethers::providers::Middleware;
use ethers::types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest, U256};
use sha3::{Digest, Keccak256};
use std::sync::Arc;

/// Depth of each tree in the forest.
pub const TREE_DEPTH: usize = 20;

/// Number of entries in the raw on-chain path array (siblings + root).
pub const RAW_PATH_LEN: usize = TREE_DEPTH + 1;

/// Computes the 20 direction bits for a leaf index.
///
/// Bit `i` equals `(leaf_index >> i) & 1`, least-significant-bit first,
/// aligned with the sibling ordering returned by the hook.
///
/// # Errors
/// Returns [`CoreError::InvalidInput`] if the index does not fit in the
/// tree (`leaf_index >= 2^20`).
///
/// # Examples
///
/// ```
/// use shielded_pool_core::tree::path_indices;
///
/// let bits = path_indices(5).unwrap();
/// assert_eq!(&bits[..4], &[1, 0, 1, 0]);
/// ```
pub fn path_indices(leaf_index: u64) -> Result<[u8; TREE_DEPTH], CoreError> {
    if leaf_index >= 1 << TREE_DEPTH {
        return Err(CoreError::InvalidInput(format!(
            "leaf index {leaf_index} exceeds tree capacity 2^{TREE_DEPTH}"
        )));
    }
    let mut bits = [0u8; TREE_DEPTH];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = ((leaf_index >> i) & 1) as u8;
    }
    Ok(bits)
}

/// A shaped authentication path for one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPath {
    /// Sibling hashes, leaf-to-root order.
    pub elements: Vec<[u8; 32]>,
    /// Direction bits, least-significant-bit first.
    pub indices: [u8; TREE_DEPTH],
    /// Root the siblings terminate in (21st entry of the raw array).
    pub root: [u8; 32],
    /// Leaf position the path authenticates.
    pub leaf_index: u64,
}

impl AuthPath {
    /// Shapes the raw on-chain `bytes32[21]` array into a path.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`] if the leaf index is out of range.
    pub fn from_chain(raw: &[[u8; 32]; RAW_PATH_LEN], leaf_index: u64) -> Result<Self, CoreError> {
        let indices = path_indices(leaf_index)?;
        Ok(Self {
            elements: raw[..TREE_DEPTH].to_vec(),
            indices,
            root: raw[TREE_DEPTH],
            leaf_index,
        })
    }

    /// Whether this is the all-zero placeholder the hook returns when the
    /// path is not yet available.
    ///
    /// A placeholder is indistinguishable at this layer from a legitimate
    /// leaf-0 path in a freshly initialized all-zero tree, so proof
    /// generation must refuse it outright rather than guess.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.root == [0u8; 32] && self.elements.iter().all(|e| *e == [0u8; 32])
    }

    /// The sibling hashes as field elements.
    #[must_use]
    pub fn elements_as_fields(&self) -> Vec<Fr> {
        self.elements.iter().map(reduce_to_field).collect()
    }

    /// The root as a field element.
    #[must_use]
    pub fn root_as_field(&self) -> Fr {
        reduce_to_field(&self.root)
    }
}

fn selector(signature: &str) -> [u8; 4] {
    let digest: [u8; 32] = Keccak256::digest(signature.as_bytes()).into();
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Read client for the settlement hook contract.
///
/// Each getter issues a plain `eth_call`; the hook is the only authority on
/// roots. Callers must never treat an arbitrary root as trusted: a proof
/// root must be a value this client actually returned for the claimed
/// `(poolId, treeNumber, index)`.
pub struct HookClient<M> {
    hook: Address,
    client: Arc<M>,
}

impl<M: Middleware> HookClient<M> {
    pub fn new(hook: Address, client: Arc<M>) -> Self {
        Self { hook, client }
    }

    async fn call(&self, calldata: Vec<u8>) -> Result<Vec<u8>, CoreError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(self.hook)
            .data(calldata)
            .into();
        let raw = self
            .client
            .call(&tx, None)
            .await
            .map_err(|e| CoreError::ChainRead(format!("hook call failed: {e}")))?;
        Ok(raw.to_vec())
    }

    /// `getPath(bytes32,uint256,uint256) -> bytes32[21]`
    pub async fn get_path(
        &self,
        pool_id: [u8; 32],
        tree_number: U256,
        leaf_index: U256,
    ) -> Result<[[u8; 32]; RAW_PATH_LEN], CoreError> {
        let mut calldata = selector("getPath(bytes32,uint256,uint256)").to_vec();
        calldata.extend(abi::encode(&[
            Token::FixedBytes(pool_id.to_vec()),
            Token::Uint(tree_number),
            Token::Uint(leaf_index),
        ]));
        let raw = self.call(calldata).await?;

        let tokens = abi::decode(
            &[ParamType::FixedArray(
                Box::new(ParamType::FixedBytes(32)),
                RAW_PATH_LEN,
            )],
            &raw,
        )
        .map_err(|e| CoreError::ChainRead(format!("getPath return malformed: {e}")))?;

        let Some(Token::FixedArray(entries)) = tokens.into_iter().next() else {
            return Err(CoreError::ChainRead(
                "getPath return malformed: missing array".to_string(),
            ));
        };

        let mut path = [[0u8; 32]; RAW_PATH_LEN];
        for (slot, token) in path.iter_mut().zip(entries) {
            let Token::FixedBytes(bytes) = token else {
                return Err(CoreError::ChainRead(
                    "getPath return malformed: non-bytes32 entry".to_string(),
                ));
            };
            if bytes.len() != 32 {
                return Err(CoreError::ChainRead(
                    "getPath return malformed: entry width".to_string(),
                ));
            }
            slot.copy_from_slice(&bytes);
        }
        Ok(path)
    }

    /// Fetches and shapes the authentication path for a leaf.
    pub async fn fetch_auth_path(
        &self,
        pool_id: [u8; 32],
        tree_number: U256,
        leaf_index: u64,
    ) -> Result<AuthPath, CoreError> {
        let raw = self
            .get_path(pool_id, tree_number, U256::from(leaf_index))
            .await?;
        AuthPath::from_chain(&raw, leaf_index)
    }

    /// `currentTreeNumber(bytes32) -> uint256`
    pub async fn current_tree_number(&self, pool_id: [u8; 32]) -> Result<U256, CoreError> {
        self.call_uint("currentTreeNumber(bytes32)", pool_id).await
    }

    /// `nextLeafIndex(bytes32) -> uint256`
    pub async fn next_leaf_index(&self, pool_id: [u8; 32]) -> Result<U256, CoreError> {
        self.call_uint("nextLeafIndex(bytes32)", pool_id).await
    }

    async fn call_uint(&self, signature: &str, pool_id: [u8; 32]) -> Result<U256, CoreError> {
        let mut calldata = selector(signature).to_vec();
        calldata.extend(abi::encode(&[Token::FixedBytes(pool_id.to_vec())]));
        let raw = self.call(calldata).await?;
        if raw.len() != 32 {
            return Err(CoreError::ChainRead(format!(
                "{signature} returned {} bytes, expected 32",
                raw.len()
            )));
        }
        Ok(U256::from_big_endian(&raw))
    }
}
