//! TRON address and TRC20 ABI helpers
//!
//! Addresses are base58check strings over 21 bytes (`0x41` prefix + 20-byte
//! account id). ABI words drop the prefix and left-pad to 32 bytes.

use sha2::{Digest, Sha256};

use crate::chain::{ChainError, ContractCall};
use crate::types::Address;

/// Mainnet address prefix byte
pub const ADDRESS_PREFIX: u8 = 0x41;

const ADDRESS_LEN: usize = 21;
const CHECKSUM_LEN: usize = 4;
const WORD_LEN: usize = 32;

/// TRC20 methods whose arguments are `(address, uint256)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trc20Method {
    Transfer,
    Approve,
}

impl Trc20Method {
    pub fn signature(&self) -> &'static str {
        match self {
            Trc20Method::Transfer => "transfer(address,uint256)",
            Trc20Method::Approve => "approve(address,uint256)",
        }
    }
}

impl std::str::FromStr for Trc20Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transfer" | "transfer(address,uint256)" => Ok(Self::Transfer),
            "approve" | "approve(address,uint256)" => Ok(Self::Approve),
            _ => Err(format!("Unsupported TRC20 method: {s}")),
        }
    }
}

/// Decode a base58check TRON address into its 21 raw bytes
pub fn decode_address(address: &Address) -> Result<[u8; ADDRESS_LEN], ChainError> {
    let raw = bs58::decode(address.as_str())
        .into_vec()
        .map_err(|e| ChainError::InvalidAddress(format!("{address}: {e}")))?;
    if raw.len() != ADDRESS_LEN + CHECKSUM_LEN {
        return Err(ChainError::InvalidAddress(format!(
            "{address}: expected {} bytes, got {}",
            ADDRESS_LEN + CHECKSUM_LEN,
            raw.len()
        )));
    }

    let (payload, checksum) = raw.split_at(ADDRESS_LEN);
    if checksum != &double_sha256(payload)[..CHECKSUM_LEN] {
        return Err(ChainError::InvalidAddress(format!("{address}: bad checksum")));
    }
    if payload[0] != ADDRESS_PREFIX {
        return Err(ChainError::InvalidAddress(format!(
            "{address}: unexpected prefix 0x{:02x}",
            payload[0]
        )));
    }

    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(payload);
    Ok(out)
}

/// Encode 21 raw bytes as a base58check address
pub fn encode_address(raw: &[u8; ADDRESS_LEN]) -> Address {
    let mut buf = raw.to_vec();
    buf.extend_from_slice(&double_sha256(raw)[..CHECKSUM_LEN]);
    Address::new(bs58::encode(buf).into_string())
}

/// Validate an address without keeping the decoded bytes
pub fn validate_address(address: &Address) -> Result<(), ChainError> {
    decode_address(address).map(|_| ())
}

fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// ABI word for an address argument
pub fn address_word(address: &Address) -> Result<[u8; WORD_LEN], ChainError> {
    let raw = decode_address(address)?;
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 20..].copy_from_slice(&raw[1..]);
    Ok(word)
}

/// ABI word for a uint256 argument
pub fn uint_word(value: u64) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Decode a uint256 word, failing if it does not fit in a u64
pub fn decode_uint_word(hex_word: &str) -> Result<u64, ChainError> {
    let bytes = hex::decode(hex_word.trim_start_matches("0x"))
        .map_err(|e| ChainError::Decode(format!("invalid uint256 hex: {e}")))?;
    if bytes.len() != WORD_LEN {
        return Err(ChainError::Decode(format!(
            "uint256 word must be {WORD_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    if bytes[..WORD_LEN - 8].iter().any(|b| *b != 0) {
        return Err(ChainError::Decode("uint256 value exceeds u64".to_string()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&bytes[WORD_LEN - 8..]);
    Ok(u64::from_be_bytes(tail))
}

/// Build the contract call for a TRC20 `(address, uint256)` method
pub fn trc20_call(
    method: Trc20Method,
    owner: &Address,
    contract: &Address,
    recipient: &Address,
    amount: u64,
) -> Result<ContractCall, ChainError> {
    validate_address(owner)?;
    validate_address(contract)?;

    let mut params = Vec::with_capacity(WORD_LEN * 2);
    params.extend_from_slice(&address_word(recipient)?);
    params.extend_from_slice(&uint_word(amount));

    Ok(ContractCall {
        owner: owner.clone(),
        contract: contract.clone(),
        method_signature: method.signature().to_string(),
        params,
    })
}

/// Node error messages arrive hex-encoded; fall back to the raw text
pub fn decode_node_message(message: &str) -> String {
    match hex::decode(message) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) if !text.is_empty() => text,
            _ => message.to_string(),
        },
        Err(_) => message.to_string(),
    }
}
