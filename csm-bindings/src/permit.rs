use csm_signer::{
    permit::{sign_permit, PermitMessage, SignedPermit, TokenDomain, STETH_DOMAIN, WSTETH_DOMAIN},
    CsmWallet,
};
use ethers::{
    providers::Middleware,
    signers::Signer,
    types::{Address, U256},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    addresses::Deployment,
    contracts::{PermitInput, StETHPermitAbi},
    error::Result,
};

impl From<SignedPermit> for PermitInput {
    fn from(permit: SignedPermit) -> Self {
        PermitInput {
            value: permit.value,
            deadline: permit.deadline,
            v: permit.v,
            r: permit.r,
            s: permit.s,
        }
    }
}

/// Tokens the accounting contract accepts as bond through `permit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondToken {
    StEth,
    WstEth,
}

impl BondToken {
    pub fn domain(&self) -> TokenDomain {
        match self {
            BondToken::StEth => STETH_DOMAIN,
            BondToken::WstEth => WSTETH_DOMAIN,
        }
    }

    pub fn address(&self, deployment: &Deployment) -> Address {
        match self {
            BondToken::StEth => deployment.steth,
            BondToken::WstEth => deployment.wsteth,
        }
    }
}

/// Signs a permit letting `spender` pull `value` of `token` from the wallet. The nonce is read
/// from the token so the signature is valid for the next `permit` call only.
pub async fn sign_bond_permit<M: Middleware + 'static>(
    token: &StETHPermitAbi<M>,
    domain: TokenDomain,
    wallet: &CsmWallet,
    spender: Address,
    value: U256,
    deadline: U256,
) -> Result<PermitInput> {
    let owner = wallet.address();
    let nonce = token.nonces(owner).call().await?;
    debug!("Signing {} permit for {owner:?} with nonce {nonce}", domain.name);
    let message = PermitMessage {
        domain,
        chain_id: wallet.chain_id(),
        verifying_contract: token.address(),
        owner,
        spender,
        value,
        nonce,
        deadline,
    };
    Ok(sign_permit(wallet, &message).await?.into())
}
