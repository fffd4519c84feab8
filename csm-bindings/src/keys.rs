use std::path::Path;

use csm_io::read_json;
use ethers::{
    types::{Bytes, U256},
    utils::hex,
};
use serde::{Deserialize, Serialize};

use crate::error::{CsmError, Result};

pub const PUBKEY_LENGTH: usize = 48;
pub const SIGNATURE_LENGTH: usize = 96;

/// Keys in the layout the module expects: `count` items concatenated back to back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedKeys {
    pub count: U256,
    pub pubkeys: Bytes,
    pub signatures: Bytes,
}

impl PackedKeys {
    pub fn len(&self) -> usize {
        self.pubkeys.len() / PUBKEY_LENGTH
    }

    pub fn is_empty(&self) -> bool {
        self.pubkeys.is_empty()
    }
}

pub fn split_pubkeys(data: &[u8]) -> Result<Vec<Bytes>> {
    split_fixed(data, PUBKEY_LENGTH, "public key")
}

pub fn split_signatures(data: &[u8]) -> Result<Vec<Bytes>> {
    split_fixed(data, SIGNATURE_LENGTH, "signature")
}

fn split_fixed(data: &[u8], width: usize, what: &'static str) -> Result<Vec<Bytes>> {
    if data.len() % width != 0 {
        return Err(CsmError::InvalidKeyLength { what, expected: width, actual: data.len() });
    }
    Ok(data.chunks(width).map(|chunk| Bytes::from(chunk.to_vec())).collect())
}

/// Pairs split public keys with their signatures.
pub fn split_keys_with_signatures(
    pubkeys: &[u8],
    signatures: &[u8],
) -> Result<Vec<(Bytes, Bytes)>> {
    let pubkeys = split_pubkeys(pubkeys)?;
    let signatures = split_signatures(signatures)?;
    if pubkeys.len() != signatures.len() {
        return Err(CsmError::KeyCountMismatch {
            pubkeys: pubkeys.len(),
            signatures: signatures.len(),
        });
    }
    Ok(pubkeys.into_iter().zip(signatures).collect())
}

pub fn pack_keys<P: AsRef<[u8]>, S: AsRef<[u8]>>(keys: &[(P, S)]) -> Result<PackedKeys> {
    let mut pubkeys = Vec::with_capacity(keys.len() * PUBKEY_LENGTH);
    let mut signatures = Vec::with_capacity(keys.len() * SIGNATURE_LENGTH);
    for (pubkey, signature) in keys {
        let (pubkey, signature) = (pubkey.as_ref(), signature.as_ref());
        if pubkey.len() != PUBKEY_LENGTH {
            return Err(CsmError::InvalidKeyLength {
                what: "public key",
                expected: PUBKEY_LENGTH,
                actual: pubkey.len(),
            });
        }
        if signature.len() != SIGNATURE_LENGTH {
            return Err(CsmError::InvalidKeyLength {
                what: "signature",
                expected: SIGNATURE_LENGTH,
                actual: signature.len(),
            });
        }
        pubkeys.extend_from_slice(pubkey);
        signatures.extend_from_slice(signature);
    }
    Ok(PackedKeys {
        count: U256::from(keys.len()),
        pubkeys: pubkeys.into(),
        signatures: signatures.into(),
    })
}

/// One entry of a `deposit_data-*.json` file written by the staking deposit CLI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositDataEntry {
    pub pubkey: String,
    pub withdrawal_credentials: String,
    pub amount: u64,
    pub signature: String,
    #[serde(default)]
    pub deposit_message_root: String,
    #[serde(default)]
    pub deposit_data_root: String,
    #[serde(default)]
    pub fork_version: String,
    #[serde(default)]
    pub network_name: String,
    #[serde(default)]
    pub deposit_cli_version: String,
}

impl DepositDataEntry {
    pub fn decode(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        Ok((decode_hex(&self.pubkey)?, decode_hex(&self.signature)?))
    }
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    Ok(hex::decode(value.trim_start_matches("0x"))?)
}

pub fn load_deposit_data(path: &Path) -> Result<Vec<DepositDataEntry>> {
    Ok(read_json(path)?)
}

pub fn pack_deposit_data(entries: &[DepositDataEntry]) -> Result<PackedKeys> {
    let decoded = entries.iter().map(DepositDataEntry::decode).collect::<Result<Vec<_>>>()?;
    pack_keys(&decoded)
}
