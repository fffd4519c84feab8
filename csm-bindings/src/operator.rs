use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{
    contracts::NodeOperator,
    error::{CsmError, Result},
};

/// How the module treats an operator's target validator limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLimitMode {
    Disabled = 0,
    Soft = 1,
    Forced = 2,
}

impl TryFrom<u64> for TargetLimitMode {
    type Error = CsmError;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            0 => Ok(Self::Disabled),
            1 => Ok(Self::Soft),
            2 => Ok(Self::Forced),
            other => Err(CsmError::TargetLimitMode(other)),
        }
    }
}

impl TryFrom<u8> for TargetLimitMode {
    type Error = CsmError;

    fn try_from(value: u8) -> Result<Self> {
        Self::try_from(value as u64)
    }
}

impl TryFrom<U256> for TargetLimitMode {
    type Error = CsmError;

    fn try_from(value: U256) -> Result<Self> {
        if value > U256::from(u64::MAX) {
            return Err(CsmError::TargetLimitMode(u64::MAX));
        }
        Self::try_from(value.as_u64())
    }
}

impl From<TargetLimitMode> for U256 {
    fn from(mode: TargetLimitMode) -> Self {
        U256::from(mode as u8)
    }
}

/// Derived read-outs over the raw `NodeOperator` record. Counters come straight from storage, so
/// everything saturates instead of trusting the relations between them.
pub trait NodeOperatorExt {
    fn target_limit_mode(&self) -> Result<TargetLimitMode>;
    fn unvetted_keys(&self) -> u32;
    fn active_keys(&self) -> u32;
    fn has_pending_manager_change(&self) -> bool;
    fn has_pending_reward_change(&self) -> bool;
}

impl NodeOperatorExt for NodeOperator {
    fn target_limit_mode(&self) -> Result<TargetLimitMode> {
        TargetLimitMode::try_from(self.target_limit_mode)
    }

    fn unvetted_keys(&self) -> u32 {
        self.total_added_keys.saturating_sub(self.total_vetted_keys)
    }

    fn active_keys(&self) -> u32 {
        self.total_deposited_keys.saturating_sub(self.total_withdrawn_keys)
    }

    fn has_pending_manager_change(&self) -> bool {
        self.proposed_manager_address != Address::zero()
    }

    fn has_pending_reward_change(&self) -> bool {
        self.proposed_reward_address != Address::zero()
    }
}

/// Named form of the tuple returned by `getNodeOperatorSummary`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeOperatorSummary {
    pub target_limit_mode: U256,
    pub target_validators_count: U256,
    pub stuck_validators_count: U256,
    pub refunded_validators_count: U256,
    pub stuck_penalty_end_timestamp: U256,
    pub total_exited_validators: U256,
    pub total_deposited_validators: U256,
    pub depositable_validators_count: U256,
}

impl From<(U256, U256, U256, U256, U256, U256, U256, U256)> for NodeOperatorSummary {
    fn from(value: (U256, U256, U256, U256, U256, U256, U256, U256)) -> Self {
        let (
            target_limit_mode,
            target_validators_count,
            stuck_validators_count,
            refunded_validators_count,
            stuck_penalty_end_timestamp,
            total_exited_validators,
            total_deposited_validators,
            depositable_validators_count,
        ) = value;
        Self {
            target_limit_mode,
            target_validators_count,
            stuck_validators_count,
            refunded_validators_count,
            stuck_penalty_end_timestamp,
            total_exited_validators,
            total_deposited_validators,
            depositable_validators_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingModuleSummary {
    pub total_exited_validators: U256,
    pub total_deposited_validators: U256,
    pub depositable_validators_count: U256,
}

impl From<(U256, U256, U256)> for StakingModuleSummary {
    fn from((exited, deposited, depositable): (U256, U256, U256)) -> Self {
        Self {
            total_exited_validators: exited,
            total_deposited_validators: deposited,
            depositable_validators_count: depositable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operator() -> NodeOperator {
        NodeOperator {
            total_added_keys: 10,
            total_withdrawn_keys: 1,
            total_deposited_keys: 6,
            total_vetted_keys: 8,
            target_limit_mode: 1,
            manager_address: Address::repeat_byte(1),
            reward_address: Address::repeat_byte(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_target_limit_mode_conversions() {
        assert_eq!(TargetLimitMode::try_from(0u8).unwrap(), TargetLimitMode::Disabled);
        assert_eq!(TargetLimitMode::try_from(U256::from(2)).unwrap(), TargetLimitMode::Forced);
        assert!(matches!(TargetLimitMode::try_from(3u64), Err(CsmError::TargetLimitMode(3))));
        assert_eq!(U256::from(TargetLimitMode::Soft), U256::one());
    }

    #[test]
    fn test_derived_counts() {
        let op = operator();
        assert_eq!(op.unvetted_keys(), 2);
        assert_eq!(op.active_keys(), 5);
        assert_eq!(op.target_limit_mode().unwrap(), TargetLimitMode::Soft);
    }

    #[test]
    fn test_counts_saturate() {
        let op = NodeOperator { total_vetted_keys: 5, total_withdrawn_keys: 3, ..Default::default() };
        assert_eq!(op.unvetted_keys(), 0);
        assert_eq!(op.active_keys(), 0);
    }

    #[test]
    fn test_pending_address_changes() {
        let mut op = operator();
        assert!(!op.has_pending_manager_change());
        op.proposed_reward_address = Address::repeat_byte(9);
        assert!(op.has_pending_reward_change());
        assert!(!op.has_pending_manager_change());
    }

    #[test]
    fn test_summary_from_tuple() {
        let summary = NodeOperatorSummary::from((
            U256::from(2),
            U256::from(100),
            U256::zero(),
            U256::zero(),
            U256::zero(),
            U256::from(3),
            U256::from(40),
            U256::from(7),
        ));
        assert_eq!(summary.target_validators_count, U256::from(100));
        assert_eq!(summary.depositable_validators_count, U256::from(7));
    }
}
