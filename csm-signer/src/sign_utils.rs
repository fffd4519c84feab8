use ethers::{
    abi::{encode, Token},
    types::{Address, Signature, H256},
    utils::keccak256,
};

use crate::CsmWallet;

pub fn sign_hash(hash: H256, wallet: &CsmWallet) -> Result<Signature, SigningError> {
    Ok(wallet.signer().sign_hash(hash)?)
}

pub fn recover_from_hash(hash: H256, signature: &Signature) -> Result<Address, SigningError> {
    Ok(signature.recover(hash)?)
}

/// Signs the keccak hash of the ABI-encoded string. Used to prove control of a manager or reward
/// address off-chain.
pub fn sign_string(string: &str, wallet: &CsmWallet) -> Result<Signature, SigningError> {
    sign_hash(hash_string(string), wallet)
}

pub fn recover_from_string(string: &str, signature: &Signature) -> Result<Address, SigningError> {
    recover_from_hash(hash_string(string), signature)
}

fn hash_string(string: &str) -> H256 {
    H256::from(&keccak256(encode(&[Token::String(string.to_string())])))
}

/// Splits a signature into the `(v, r, s)` triple expected by on-chain `ecrecover` callers.
pub fn split_signature(signature: &Signature) -> (u8, [u8; 32], [u8; 32]) {
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    signature.r.to_big_endian(&mut r);
    signature.s.to_big_endian(&mut s);
    (signature.v as u8, r, s)
}

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Wallet signing error: {0}")]
    WalletSigningError(#[from] ethers::signers::WalletError),
    #[error("Signature recovery error: {0}")]
    RecoveryError(#[from] ethers::types::SignatureError),
}
