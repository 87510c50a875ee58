//! Pool identity derivation.
//!
//! The external Merkle forest is namespaced per pool configuration. The
//! namespace key is the Keccak-256 of the ABI encoding of the pool key tuple
//! `(address currency0, address currency1, uint24 fee, int24 tickSpacing,
//! address hooks)`; field order and widths must match the on-chain
//! contract's own encoding exactly, or derived ids will not correspond to
//! the same tree.

use crate::error::CoreError;
use ethers::abi::{encode, Token};
use ethers::types::{Address, I256, U256};
use sha3::{Digest, Keccak256};

/// Largest fee representable as a uint24.
const MAX_FEE: u32 = (1 << 24) - 1;
/// int24 range for tick spacing.
const MIN_TICK_SPACING: i32 = -(1 << 23);
const MAX_TICK_SPACING: i32 = (1 << 23) - 1;

/// A trading-pair/hook configuration.
///
/// Order-sensitive: swapping `currency0`/`currency1` yields a different id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolKey {
    pub currency0: Address,
    pub currency1: Address,
    /// Fee in hundredths of a bip (uint24 on chain).
    pub fee: u32,
    /// Tick spacing (int24 on chain).
    pub tick_spacing: i32,
    pub hooks: Address,
}

impl PoolKey {
    /// Derives the 32-byte pool identity for this key.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidInput`] if `fee` does not fit in a uint24
    /// or `tick_spacing` does not fit in an int24. The on-chain encoder
    /// rejects such values, so an id derived from them could never name a
    /// real pool.
    pub fn id(&self) -> Result<[u8; 32], CoreError> {
        if self.fee > MAX_FEE {
            return Err(CoreError::InvalidInput(format!(
                "pool fee {} exceeds uint24 range",
                self.fee
            )));
        }
        if !(MIN_TICK_SPACING..=MAX_TICK_SPACING).contains(&self.tick_spacing) {
            return Err(CoreError::InvalidInput(format!(
                "tick spacing {} outside int24 range",
                self.tick_spacing
            )));
        }
        let encoded = encode(&[
            Token::Address(self.currency0),
            Token::Address(self.currency1),
            Token::Uint(U256::from(self.fee)),
            Token::Int(I256::from(self.tick_spacing).into_raw()),
            Token::Address(self.hooks),
        ]);
        Ok(Keccak256::digest(&encoded).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> PoolKey {
        PoolKey {
            currency0: "0x1111111111111111111111111111111111111111".parse().unwrap(),
            currency1: "0x2222222222222222222222222222222222222222".parse().unwrap(),
            fee: 3000,
            tick_spacing: 60,
            hooks: "0x3333333333333333333333333333333333333333".parse().unwrap(),
        }
    }

    #[test]
    fn test_pool_id_golden_vector() {
        // keccak256(abi.encode(c0, c1, 3000, 60, hook)), computed with a
        // reference ABI encoder.
        assert_eq!(
            hex::encode(key().id().unwrap()),
            "8fb7b92b30a9dad7d151b759803df3c5d0f891657eccc3797757e0860fbe193d"
        );
    }

    #[test]
    fn test_pool_id_is_order_sensitive() {
        let base = key();
        let swapped = PoolKey {
            currency0: base.currency1,
            currency1: base.currency0,
            ..base
        };
        assert_ne!(base.id().unwrap(), swapped.id().unwrap());
        assert_eq!(
            hex::encode(swapped.id().unwrap()),
            "5a8cacb6a91580f2d18951d4940a28d8284c41b71b283a139610af470d2ae649"
        );
    }

    #[test]
    fn test_pool_id_negative_tick_spacing_sign_extends() {
        // int24 values are sign-extended to a full word before hashing.
        let negative = PoolKey {
            fee: 500,
            tick_spacing: -10,
            ..key()
        };
        assert_eq!(
            hex::encode(negative.id().unwrap()),
            "40e8600cbf8ab4242c4fceeeafda5b79e96a8f66e596ee3a39140d089a49dcf5"
        );
    }

    #[test]
    fn test_pool_id_rejects_fee_beyond_uint24() {
        let oversized = PoolKey {
            fee: 1 << 24,
            ..key()
        };
        assert!(matches!(
            oversized.id(),
            Err(CoreError::InvalidInput(_))
        ));
        // The uint24 boundary itself is fine.
        assert!(PoolKey { fee: MAX_FEE, ..key() }.id().is_ok());
    }

    #[test]
    fn test_pool_id_rejects_tick_spacing_beyond_int24() {
        for tick_spacing in [1 << 23, -(1 << 23) - 1] {
            let out_of_range = PoolKey {
                tick_spacing,
                ..key()
            };
            assert!(matches!(
                out_of_range.id(),
                Err(CoreError::InvalidInput(_))
            ));
        }
        assert!(PoolKey { tick_spacing: MIN_TICK_SPACING, ..key() }.id().is_ok());
        assert!(PoolKey { tick_spacing: MAX_TICK_SPACING, ..key() }.id().is_ok());
    }

    #[test]
    fn test_pool_id_changes_with_every_field() {
        let base = key();
        let variants = [
            PoolKey { fee: 500, ..base },
            PoolKey { tick_spacing: 10, ..base },
            PoolKey {
                hooks: "0x4444444444444444444444444444444444444444".parse().unwrap(),
                ..base
            },
        ];
        for variant in &variants {
            assert_ne!(base.id().unwrap(), variant.id().unwrap());
        }
    }
}
