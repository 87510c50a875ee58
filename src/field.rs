//! Arithmetic over the proving system's scalar field.
//!
//! All secrets, nullifiers, hashes, and commitments live in the BN254 scalar
//! field with prime
//! `P = 0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001`.
//! The exact prime is mandatory: any deviation breaks compatibility with the
//! externally verified circuits, so the field type comes from `ark-bn254`
//! rather than a hand-rolled modulus.

use anyhow::Result;
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use ethers::types::Address;

/// The scalar-field prime as a big-endian hex string (no prefix).
pub const FIELD_MODULUS_HEX: &str =
    "30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001";

/// Reduces a 256-bit value to a field element.
///
/// Interprets the input as an unsigned big-endian integer and reduces it
/// modulo the field prime.
///
/// # Arguments
///
/// * `bytes` - 32-byte big-endian value to reduce
///
/// # Examples
///
/// ```
/// use shielded_pool_core::field::reduce_to_field;
/// use ark_bn254::Fr;
///
/// assert_eq!(reduce_to_field(&[0u8; 32]), Fr::from(0u64));
/// ```
#[inline]
#[must_use]
pub fn reduce_to_field(bytes: &[u8; 32]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Computes `x * x mod P`.
///
/// Used to produce the anti-malleability square bindings (`recipientSquare`,
/// `relayerSquare`, `feeSquare`, `refundSquare`) carried as extra public
/// inputs; the circuit enforces `x * x == xSquare`, which closes a
/// malleability class where an adversary substitutes an equivalent-looking
/// but differently encoded field value.
#[inline]
#[must_use]
pub fn square_mod_p(x: Fr) -> Fr {
    x * x
}

/// Converts a field element to its canonical 32-byte big-endian encoding.
#[must_use]
pub fn field_to_bytes(x: Fr) -> [u8; 32] {
    let repr = x.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - repr.len()..].copy_from_slice(&repr);
    out
}

/// Converts a 20-byte address to a field element (as a uint160, which always
/// fits below the prime).
#[must_use]
pub fn address_to_field(address: Address) -> Fr {
    let mut padded = [0u8; 32];
    padded[12..].copy_from_slice(address.as_bytes());
    reduce_to_field(&padded)
}

fn strip_hex_prefix(input: &str) -> &str {
    input
        .trim()
        .strip_prefix("0x")
        .or_else(|| input.trim().strip_prefix("0X"))
        .unwrap_or_else(|| input.trim())
}

/// Validates and strips the hex prefix from a string.
///
/// # Arguments
///
/// * `input` - The hex string to validate (may include "0x" or "0X" prefix)
/// * `expected_len` - Expected length of the hex string after stripping
///
/// # Errors
/// Returns an error if:
/// - The hex string has incorrect length
/// - The hex string contains non-hex characters
pub fn validate_and_strip_hex(input: &str, expected_len: usize) -> Result<String> {
    let stripped = strip_hex_prefix(input);

    if stripped.len() != expected_len {
        return Err(anyhow::anyhow!(
            "Invalid hex string: must be {} characters (got {})",
            expected_len,
            stripped.len()
        ));
    }

    if !stripped.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow::anyhow!(
            "Invalid hex string: contains non-hex characters"
        ));
    }

    Ok(stripped.to_string())
}

/// Parses a field element from a 64-character hex string, reducing mod P.
///
/// # Errors
/// Returns an error if the string is not 64 hex characters (after an
/// optional `0x` prefix).
pub fn field_from_hex(input: &str) -> Result<Fr> {
    let stripped = validate_and_strip_hex(input, 64)?;
    let bytes = hex::decode(stripped)?;
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(reduce_to_field(&arr))
}

/// Formats a field element as a 64-character lowercase hex string with a
/// `0x` prefix.
#[must_use]
pub fn field_to_hex(x: Fr) -> String {
    format!("0x{}", hex::encode(field_to_bytes(x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn modulus() -> BigUint {
        BigUint::parse_bytes(FIELD_MODULUS_HEX.as_bytes(), 16).unwrap()
    }

    fn to_biguint(x: Fr) -> BigUint {
        BigUint::from_bytes_be(&field_to_bytes(x))
    }

    #[test]
    fn test_reduce_zero() {
        assert_eq!(reduce_to_field(&[0u8; 32]), Fr::from(0u64));
    }

    #[test]
    fn test_reduce_max_256_bit_value() {
        // 2^256 - 1 mod P, pinned against an independent bignum computation.
        let reduced = reduce_to_field(&[0xffu8; 32]);
        assert_eq!(
            field_to_hex(reduced),
            "0x0e0a77c19a07df2f666ea36f7879462e36fc76959f60cd29ac96341c4ffffffa"
        );
        assert!(to_biguint(reduced) < modulus());
    }

    #[test]
    fn test_reduce_always_below_modulus() {
        let samples: [[u8; 32]; 3] = [[0x7fu8; 32], [0x30u8; 32], [0x01u8; 32]];
        for bytes in &samples {
            assert!(to_biguint(reduce_to_field(bytes)) < modulus());
        }
    }

    #[test]
    fn test_square_edge_cases() {
        assert_eq!(square_mod_p(Fr::from(0u64)), Fr::from(0u64));
        assert_eq!(square_mod_p(Fr::from(1u64)), Fr::from(1u64));

        // (P - 1)^2 = 1 mod P
        let minus_one = Fr::from(0u64) - Fr::from(1u64);
        assert_eq!(square_mod_p(minus_one), Fr::from(1u64));
    }

    #[test]
    fn test_square_matches_bignum() {
        // x = 2^200 + 12345
        let mut bytes = [0u8; 32];
        bytes[6] = 0x01;
        bytes[30] = 0x30;
        bytes[31] = 0x39;
        let x = reduce_to_field(&bytes);
        let expected = (to_biguint(x).pow(2)) % modulus();
        assert_eq!(to_biguint(square_mod_p(x)), expected);
        assert_eq!(
            field_to_hex(square_mod_p(x)),
            "0x0f803f186c4656a258fe9be538338699ce0da7d21499ae4d1bc54f3187ce5869"
        );
    }

    #[test]
    fn test_square_of_recipient_address() {
        let address: Address = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
            .parse()
            .unwrap();
        let square = square_mod_p(address_to_field(address));
        assert_eq!(
            field_to_hex(square),
            "0x0cf4f1978be3cb0c654a1f80591b4f0e8fccb33bac19f1cf509465572c756280"
        );
    }

    #[test]
    fn test_field_bytes_round_trip() {
        let x = Fr::from(0xdeadbeefu64);
        assert_eq!(reduce_to_field(&field_to_bytes(x)), x);
    }

    #[test]
    fn test_field_from_hex_valid() {
        let x = field_from_hex("0x0000000000000000000000000000000000000000000000000000000000000005")
            .unwrap();
        assert_eq!(x, Fr::from(5u64));
    }

    #[test]
    fn test_field_from_hex_wrong_length() {
        assert!(field_from_hex("0x1234").is_err());
    }

    #[test]
    fn test_field_from_hex_invalid_characters() {
        let result = field_from_hex(
            "0xzzzz000000000000000000000000000000000000000000000000000000000000",
        );
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("non-hex characters"));
    }

    #[test]
    fn test_validate_and_strip_hex_uppercase_prefix() {
        let result = validate_and_strip_hex("0X1234ABCD", 8);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "1234ABCD");
    }
}
