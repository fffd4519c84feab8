//! Generated bindings. Everything in this module comes out of `abigen!`; hand-written helpers
//! live in the sibling modules.
use ethers::{
    abi::Abi,
    contract::abigen,
    providers::{Http, Provider, Ws},
};
use once_cell::sync::Lazy;

use crate::provider::CsmProvider;

pub type CSModuleHttp = CSModuleAbi<Provider<Http>>;
pub type CSModuleWs = CSModuleAbi<Provider<Ws>>;
pub type CSModuleSigned = CSModuleAbi<CsmProvider>;
pub type CSAccountingSigned = CSAccountingAbi<CsmProvider>;
pub type StETHPermitSigned = StETHPermitAbi<CsmProvider>;

abigen!(
    CSModuleAbi,
    "abi/CSModule.json",
    event_derives(serde::Deserialize, serde::Serialize)
);

abigen!(
    CSAccountingAbi,
    r#"[
        function getBond(uint256 nodeOperatorId) external view returns (uint256)
        function getBondShares(uint256 nodeOperatorId) external view returns (uint256)
        function getBondSummary(uint256 nodeOperatorId) external view returns (uint256 current, uint256 required)
        function getUnbondedKeysCount(uint256 nodeOperatorId) external view returns (uint256)
        function getRequiredBondForNextKeys(uint256 nodeOperatorId, uint256 additionalKeys) external view returns (uint256)
        function getRequiredBondForNextKeysWstETH(uint256 nodeOperatorId, uint256 additionalKeys) external view returns (uint256)
        event BondDepositedETH(uint256 indexed nodeOperatorId, address from, uint256 amount)
        event BondDepositedStETH(uint256 indexed nodeOperatorId, address from, uint256 amount)
        event BondDepositedWstETH(uint256 indexed nodeOperatorId, address from, uint256 amount)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

abigen!(
    StETHPermitAbi,
    r#"[
        function name() external view returns (string)
        function nonces(address owner) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
        function DOMAIN_SEPARATOR() external view returns (bytes32)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#,
);

/// Raw module ABI, used to decode logs by name without going through the generated enum.
pub static MODULE_ABI: Lazy<Abi> = Lazy::new(|| {
    serde_json::from_str(include_str!("../abi/CSModule.json"))
        .unwrap_or_else(|e| panic!("bundled CSModule ABI is malformed: {e}"))
});

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::{
        contract::EthEvent,
        types::H256,
        utils::{id, keccak256},
    };

    #[test]
    fn test_module_abi_parses() {
        assert!(MODULE_ABI.function("getNodeOperator").is_ok());
        assert!(MODULE_ABI.event("NodeOperatorAdded").is_ok());
    }

    #[test]
    fn test_event_topics_match_signatures() {
        assert_eq!(
            NodeOperatorAddedFilter::signature(),
            H256::from(keccak256("NodeOperatorAdded(uint256,address,address)"))
        );
        assert_eq!(
            SigningKeyAddedFilter::signature(),
            H256::from(keccak256("SigningKeyAdded(uint256,bytes)"))
        );
        assert_eq!(
            BatchEnqueuedFilter::signature(),
            H256::from(keccak256("BatchEnqueued(uint256,uint256)"))
        );
    }

    #[test]
    fn test_node_operator_selector() {
        let function = MODULE_ABI.function("getNodeOperator").unwrap();
        assert_eq!(function.short_signature(), id("getNodeOperator(uint256)"));
    }
}
