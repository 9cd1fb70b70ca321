//! Minimal ABI helpers for zero-argument calls returning a single static word.

use sha3::{Digest, Keccak256};
use shared::{
    domain::{AbiKind, ContractValue},
    error::ChainError,
};

const WORD_LEN: usize = 32;

pub fn selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Calldata for a function without arguments: just the selector.
pub fn encode_call(signature: &str) -> String {
    format!("0x{}", hex::encode(selector(signature)))
}

pub fn decode_output(kind: AbiKind, raw: &str) -> Result<ContractValue, ChainError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(digits)
        .map_err(|err| ChainError::decode(format!("return data is not hex: {err}")))?;
    if bytes.is_empty() {
        return Err(ChainError::decode(
            "empty return data; is the contract deployed on this network?",
        ));
    }
    if bytes.len() < WORD_LEN {
        return Err(ChainError::decode(format!(
            "return data too short: {} bytes",
            bytes.len()
        )));
    }
    let word = &bytes[..WORD_LEN];

    match kind {
        AbiKind::Uint256 => {
            if word[..16].iter().any(|byte| *byte != 0) {
                return Err(ChainError::decode("uint256 value exceeds 128 bits"));
            }
            let mut low = [0u8; 16];
            low.copy_from_slice(&word[16..]);
            Ok(ContractValue::Uint(u128::from_be_bytes(low)))
        }
        AbiKind::Bool => {
            if word[..WORD_LEN - 1].iter().any(|byte| *byte != 0) {
                return Err(ChainError::decode("bool word has non-zero padding"));
            }
            match word[WORD_LEN - 1] {
                0 => Ok(ContractValue::Bool(false)),
                1 => Ok(ContractValue::Bool(true)),
                other => Err(ChainError::decode(format!("invalid bool value {other}"))),
            }
        }
    }
}

/// Parses a JSON-RPC hex quantity such as `0x1b4`.
pub fn parse_quantity(raw: &str) -> Result<u64, ChainError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::decode(format!("quantity missing 0x prefix: {raw}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|err| ChainError::decode(format!("invalid quantity {raw}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(last: &[u8]) -> String {
        let mut bytes = vec![0u8; WORD_LEN - last.len()];
        bytes.extend_from_slice(last);
        format!("0x{}", hex::encode(bytes))
    }

    #[test]
    fn computes_known_erc20_selector() {
        assert_eq!(
            hex::encode(selector("transfer(address,uint256)")),
            "a9059cbb"
        );
    }

    #[test]
    fn calldata_is_prefixed_selector() {
        let data = encode_call("start()");
        assert_eq!(data.len(), 10);
        assert!(data.starts_with("0x"));
    }

    #[test]
    fn decodes_uint_word() {
        let value = decode_output(AbiKind::Uint256, &word(&[0x0e, 0x4d])).expect("decode");
        assert_eq!(value, ContractValue::Uint(3661));
    }

    #[test]
    fn rejects_uint_wider_than_128_bits() {
        let mut bytes = vec![0u8; WORD_LEN];
        bytes[0] = 1;
        let raw = format!("0x{}", hex::encode(bytes));
        assert!(matches!(
            decode_output(AbiKind::Uint256, &raw),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn decodes_bool_word() {
        assert_eq!(
            decode_output(AbiKind::Bool, &word(&[1])).expect("decode"),
            ContractValue::Bool(true)
        );
        assert_eq!(
            decode_output(AbiKind::Bool, &word(&[0])).expect("decode"),
            ContractValue::Bool(false)
        );
        assert!(decode_output(AbiKind::Bool, &word(&[2])).is_err());
    }

    #[test]
    fn empty_return_data_is_a_decode_error() {
        assert!(matches!(
            decode_output(AbiKind::Uint256, "0x"),
            Err(ChainError::Decode(_))
        ));
    }

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x1b4").expect("quantity"), 436);
        assert!(parse_quantity("12").is_err());
    }
}
