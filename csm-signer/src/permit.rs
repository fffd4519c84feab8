//! EIP-2612 permits for the bond tokens. The accounting contract pulls stETH or wstETH bond with
//! `permit` + `transferFrom`, so the operator signs a typed-data approval off-chain instead of
//! sending a separate `approve` transaction.
use std::convert::Infallible;

use ethers::{
    abi::{encode, Token},
    signers::Signer,
    types::{transaction::eip712::EIP712Domain, transaction::eip712::Eip712, Address, U256},
    utils::keccak256,
};
use serde::{Deserialize, Serialize};

use crate::{sign_utils::split_signature, sign_utils::SigningError, CsmWallet};

pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

/// EIP-712 domain name and version of a permit-capable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDomain {
    pub name: &'static str,
    pub version: &'static str,
}

pub const STETH_DOMAIN: TokenDomain = TokenDomain { name: "Liquid staked Ether 2.0", version: "2" };

pub const WSTETH_DOMAIN: TokenDomain =
    TokenDomain { name: "Wrapped liquid staked Ether 2.0", version: "1" };

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermitMessage {
    pub domain: TokenDomain,
    pub chain_id: u64,
    pub verifying_contract: Address,
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub nonce: U256,
    pub deadline: U256,
}

impl Eip712 for PermitMessage {
    type Error = Infallible;

    fn domain(&self) -> Result<EIP712Domain, Self::Error> {
        Ok(EIP712Domain {
            name: Some(self.domain.name.to_string()),
            version: Some(self.domain.version.to_string()),
            chain_id: Some(self.chain_id.into()),
            verifying_contract: Some(self.verifying_contract),
            salt: None,
        })
    }

    fn type_hash() -> Result<[u8; 32], Self::Error> {
        Ok(keccak256(PERMIT_TYPE))
    }

    fn struct_hash(&self) -> Result<[u8; 32], Self::Error> {
        Ok(keccak256(encode(&[
            Token::FixedBytes(Self::type_hash()?.to_vec()),
            Token::Address(self.owner),
            Token::Address(self.spender),
            Token::Uint(self.value),
            Token::Uint(self.nonce),
            Token::Uint(self.deadline),
        ])))
    }
}

/// The `(value, deadline, v, r, s)` tuple submitted alongside stETH/wstETH bond calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPermit {
    pub value: U256,
    pub deadline: U256,
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl SignedPermit {
    /// A permit with zero value and an empty signature. The accounting contract skips the
    /// `permit` call when the existing allowance already covers the bond.
    pub fn empty() -> Self {
        Self { value: U256::zero(), deadline: U256::zero(), v: 0, r: [0u8; 32], s: [0u8; 32] }
    }
}

pub async fn sign_permit(
    wallet: &CsmWallet,
    message: &PermitMessage,
) -> Result<SignedPermit, SigningError> {
    let signature = wallet.sign_typed_data(message).await?;
    let (v, r, s) = split_signature(&signature);
    Ok(SignedPermit { value: message.value, deadline: message.deadline, v, r, s })
}
