use std::{ops::Deref, sync::Arc};

use ethers::{
    providers::Middleware,
    types::{Address, Chain, U256},
};
use serde::Serialize;

use crate::{addresses, client::CsModule, contracts::CSAccountingAbi, error::Result};

/// Bond accounting wrapper. Derefs to the generated handle like `CsModule`.
#[derive(Clone, Debug)]
pub struct CsAccounting<M> {
    inner: CSAccountingAbi<M>,
}

impl<M> Deref for CsAccounting<M> {
    type Target = CSAccountingAbi<M>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Bond held by an operator against the bond its keys require, both in stETH wei.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BondSummary {
    pub current: U256,
    pub required: U256,
}

impl BondSummary {
    pub fn deficit(&self) -> U256 {
        self.required.saturating_sub(self.current)
    }

    pub fn excess(&self) -> U256 {
        self.current.saturating_sub(self.required)
    }
}

impl From<(U256, U256)> for BondSummary {
    fn from((current, required): (U256, U256)) -> Self {
        Self { current, required }
    }
}

impl<M: Middleware + 'static> CsAccounting<M> {
    pub fn new(client: Arc<M>, chain: Chain) -> Result<Self> {
        Ok(Self::at(addresses::accounting(chain)?, client))
    }

    pub fn at(address: Address, client: Arc<M>) -> Self {
        Self { inner: CSAccountingAbi::new(address, client) }
    }

    /// Follows the module's own `accounting()` pointer, which also works on local deployments.
    pub async fn from_module(module: &CsModule<M>) -> Result<Self> {
        let address = module.accounting().call().await?;
        Ok(Self::at(address, module.client()))
    }

    pub async fn bond_summary(&self, node_operator_id: U256) -> Result<BondSummary> {
        Ok(self.inner.get_bond_summary(node_operator_id).call().await?.into())
    }

    /// ETH that must accompany `additional_keys` new keys.
    pub async fn required_bond_for_next_keys(
        &self,
        node_operator_id: U256,
        additional_keys: U256,
    ) -> Result<U256> {
        Ok(self
            .inner
            .get_required_bond_for_next_keys(node_operator_id, additional_keys)
            .call()
            .await?)
    }

    pub async fn unbonded_keys(&self, node_operator_id: U256) -> Result<U256> {
        Ok(self.inner.get_unbonded_keys_count(node_operator_id).call().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mocked_module, push_response};
    use ethers::abi::Token;

    #[test]
    fn test_bond_deficit_and_excess() {
        let short = BondSummary { current: U256::from(2), required: U256::from(5) };
        assert_eq!(short.deficit(), U256::from(3));
        assert_eq!(short.excess(), U256::zero());

        let long = BondSummary::from((U256::from(9), U256::from(5)));
        assert_eq!(long.deficit(), U256::zero());
        assert_eq!(long.excess(), U256::from(4));
    }

    #[tokio::test]
    async fn test_accounting_through_module() {
        let (inner, mock) = mocked_module();
        let module = CsModule::at(inner.address(), inner.client());
        let accounting_address = Address::repeat_byte(0x4d);
        // LIFO: bond summary answer first, then the accounting() lookup
        push_response(&mock, &[Token::Uint(U256::exp10(18)), Token::Uint(U256::exp10(18) * 2)]);
        push_response(&mock, &[Token::Address(accounting_address)]);

        let accounting = CsAccounting::from_module(&module).await.unwrap();
        assert_eq!(accounting.address(), accounting_address);

        let summary = accounting.bond_summary(U256::from(1)).await.unwrap();
        assert_eq!(summary.deficit(), U256::exp10(18));
    }

    #[tokio::test]
    async fn test_required_bond() {
        let (inner, mock) = mocked_module();
        let accounting = CsAccounting::at(Address::repeat_byte(0x4d), inner.client());
        push_response(&mock, &[Token::Uint(U256::exp10(18) * 13 / 10)]);

        let bond = accounting.required_bond_for_next_keys(U256::zero(), U256::one()).await.unwrap();
        assert_eq!(bond, U256::exp10(18) * 13 / 10);
    }
}
