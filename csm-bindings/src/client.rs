use std::{ops::Deref, sync::Arc};

use ethers::{
    abi::Detokenize,
    contract::{parse_log, ContractCall},
    providers::Middleware,
    types::{Address, Bytes, Chain, TransactionReceipt, H256, U256, U64},
};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    addresses,
    contracts::{
        CSModuleAbi, CSModuleAbiEvents, NodeOperator, NodeOperatorManagementProperties,
        PermitInput,
    },
    error::{CsmError, Result},
    events::EventRecord,
    keys::{split_keys_with_signatures, split_pubkeys, PackedKeys},
    operator::{NodeOperatorSummary, StakingModuleSummary},
    provider::{signer_chain, CsmProvider},
    queue::{walk_deposit_queue, QueuedBatch},
};

pub const OPERATOR_PAGE_SIZE: u64 = 1_000;

/// A staking module wrapper with constructor helpers and the calls a node operator needs. This
/// struct implements `Deref` to the generated handle, so every raw contract method stays
/// reachable.
#[derive(Clone, Debug)]
pub struct CsModule<M> {
    inner: CSModuleAbi<M>,
}

impl<M> Deref for CsModule<M> {
    type Target = CSModuleAbi<M>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Flags and counters describing the module as a whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    pub paused: bool,
    pub public_release: bool,
    pub nonce: U256,
    pub key_removal_charge: U256,
    pub accounting: Address,
    pub node_operators_count: U256,
    pub active_node_operators_count: U256,
}

impl<M: Middleware + 'static> CsModule<M> {
    pub fn new(client: Arc<M>, chain: Chain) -> Result<Self> {
        let address = addresses::module(chain)?;
        Ok(Self::at(address, client))
    }

    pub fn at(address: Address, client: Arc<M>) -> Self {
        Self { inner: CSModuleAbi::new(address, client) }
    }

    pub async fn node_operator(&self, node_operator_id: U256) -> Result<NodeOperator> {
        Ok(self.inner.get_node_operator(node_operator_id).call().await?)
    }

    pub async fn node_operator_summary(&self, node_operator_id: U256) -> Result<NodeOperatorSummary> {
        Ok(self.inner.get_node_operator_summary(node_operator_id).call().await?.into())
    }

    pub async fn module_summary(&self) -> Result<StakingModuleSummary> {
        Ok(self.inner.get_staking_module_summary().call().await?.into())
    }

    pub async fn status(&self) -> Result<ModuleStatus> {
        Ok(ModuleStatus {
            paused: self.inner.is_paused().call().await?,
            public_release: self.inner.public_release().call().await?,
            nonce: self.inner.get_nonce().call().await?,
            key_removal_charge: self.inner.key_removal_charge().call().await?,
            accounting: self.inner.accounting().call().await?,
            node_operators_count: self.inner.get_node_operators_count().call().await?,
            active_node_operators_count: self
                .inner
                .get_active_node_operators_count()
                .call()
                .await?,
        })
    }

    /// Every registered node operator id, read page by page until a short page comes back.
    pub async fn operator_ids(&self) -> Result<Vec<U256>> {
        let mut ids = Vec::new();
        let mut offset = 0u64;
        loop {
            let page = self
                .inner
                .get_node_operator_ids(offset.into(), OPERATOR_PAGE_SIZE.into())
                .call()
                .await?;
            let fetched = page.len() as u64;
            ids.extend(page);
            if fetched < OPERATOR_PAGE_SIZE {
                break;
            }
            offset += fetched;
        }
        debug!("Found {} node operators", ids.len());
        Ok(ids)
    }

    pub async fn signing_keys(
        &self,
        node_operator_id: U256,
        start: U256,
        count: U256,
    ) -> Result<Vec<Bytes>> {
        let keys = self.inner.get_signing_keys(node_operator_id, start, count).call().await?;
        split_pubkeys(&keys)
    }

    pub async fn signing_keys_with_signatures(
        &self,
        node_operator_id: U256,
        start: U256,
        count: U256,
    ) -> Result<Vec<(Bytes, Bytes)>> {
        let (keys, signatures) = self
            .inner
            .get_signing_keys_with_signatures(node_operator_id, start, count)
            .call()
            .await?;
        split_keys_with_signatures(&keys, &signatures)
    }

    pub async fn queued_batches(&self, limit: usize) -> Result<Vec<QueuedBatch>> {
        walk_deposit_queue(&self.inner, limit).await
    }

    /// Registers a new node operator, paying the bond in ETH.
    pub async fn join_with_eth(
        &self,
        keys: &PackedKeys,
        management: NodeOperatorManagementProperties,
        referrer: Address,
        bond: U256,
    ) -> Result<TransactionReceipt> {
        self.send(self.join_with_eth_call(keys, management, referrer, bond)).await
    }

    fn join_with_eth_call(
        &self,
        keys: &PackedKeys,
        management: NodeOperatorManagementProperties,
        referrer: Address,
        bond: U256,
    ) -> ContractCall<M, ()> {
        self.inner
            .add_node_operator_eth(
                keys.count,
                keys.pubkeys.clone(),
                keys.signatures.clone(),
                management,
                Vec::new(),
                referrer,
            )
            .value(bond)
    }

    /// Registers a new node operator, pulling the bond in stETH through `permit`.
    pub async fn join_with_steth(
        &self,
        keys: &PackedKeys,
        management: NodeOperatorManagementProperties,
        permit: PermitInput,
        referrer: Address,
    ) -> Result<TransactionReceipt> {
        let call = self.inner.add_node_operator_st_eth(
            keys.count,
            keys.pubkeys.clone(),
            keys.signatures.clone(),
            management,
            permit,
            Vec::new(),
            referrer,
        );
        self.send(call).await
    }

    pub async fn submit_keys_eth(
        &self,
        node_operator_id: U256,
        keys: &PackedKeys,
        bond: U256,
    ) -> Result<TransactionReceipt> {
        self.send(self.submit_keys_eth_call(node_operator_id, keys, bond)).await
    }

    fn submit_keys_eth_call(
        &self,
        node_operator_id: U256,
        keys: &PackedKeys,
        bond: U256,
    ) -> ContractCall<M, ()> {
        self.inner
            .add_validator_keys_eth(
                node_operator_id,
                keys.count,
                keys.pubkeys.clone(),
                keys.signatures.clone(),
            )
            .value(bond)
    }

    pub async fn submit_keys_steth(
        &self,
        node_operator_id: U256,
        keys: &PackedKeys,
        permit: PermitInput,
    ) -> Result<TransactionReceipt> {
        let call = self.inner.add_validator_keys_st_eth(
            node_operator_id,
            keys.count,
            keys.pubkeys.clone(),
            keys.signatures.clone(),
            permit,
        );
        self.send(call).await
    }

    pub async fn top_up_bond_eth(
        &self,
        node_operator_id: U256,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        self.send(self.inner.deposit_eth(node_operator_id).value(amount)).await
    }

    pub async fn delete_keys(
        &self,
        node_operator_id: U256,
        start: U256,
        count: U256,
    ) -> Result<TransactionReceipt> {
        self.send(self.inner.remove_keys(node_operator_id, start, count)).await
    }

    pub async fn propose_manager(
        &self,
        node_operator_id: U256,
        proposed: Address,
    ) -> Result<TransactionReceipt> {
        let call =
            self.inner.propose_node_operator_manager_address_change(node_operator_id, proposed);
        self.send(call).await
    }

    pub async fn confirm_manager(&self, node_operator_id: U256) -> Result<TransactionReceipt> {
        self.send(self.inner.confirm_node_operator_manager_address_change(node_operator_id)).await
    }

    pub async fn propose_reward_address(
        &self,
        node_operator_id: U256,
        proposed: Address,
    ) -> Result<TransactionReceipt> {
        let call =
            self.inner.propose_node_operator_reward_address_change(node_operator_id, proposed);
        self.send(call).await
    }

    pub async fn confirm_reward_address(
        &self,
        node_operator_id: U256,
    ) -> Result<TransactionReceipt> {
        self.send(self.inner.confirm_node_operator_reward_address_change(node_operator_id)).await
    }

    /// Claims bond rewards as stETH. An empty proof only claims from excess bond.
    pub async fn claim_steth_rewards(
        &self,
        node_operator_id: U256,
        amount: U256,
        cumulative_fee_shares: U256,
        proof: Vec<[u8; 32]>,
    ) -> Result<TransactionReceipt> {
        let call =
            self.inner.claim_rewards_st_eth(node_operator_id, amount, cumulative_fee_shares, proof);
        self.send(call).await
    }

    async fn send<D: Detokenize>(&self, call: ContractCall<M, D>) -> Result<TransactionReceipt> {
        let pending = call.send().await?;
        let tx_hash = pending.tx_hash();
        info!("Sent transaction {tx_hash:?}");
        let receipt = pending.await?;
        ensure_success(tx_hash, receipt)
    }

    /// Module events emitted in a mined transaction. Logs from other contracts are ignored.
    pub fn parse_receipt_events(&self, receipt: &TransactionReceipt) -> Vec<CSModuleAbiEvents> {
        let address = self.inner.address();
        receipt
            .logs
            .iter()
            .filter(|log| log.address == address)
            .filter_map(|log| match parse_log::<CSModuleAbiEvents>(log.clone()) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!("Skipping receipt log {:?}: {e}", log.log_index);
                    None
                }
            })
            .collect()
    }

    pub fn receipt_records(&self, receipt: &TransactionReceipt) -> Vec<EventRecord> {
        let address = self.inner.address();
        receipt
            .logs
            .iter()
            .filter(|log| log.address == address)
            .filter_map(EventRecord::from_log)
            .collect()
    }
}

impl CsModule<CsmProvider> {
    /// Resolves the module address from the chain the provider's signer is bound to.
    pub fn for_provider(provider: Arc<CsmProvider>) -> Result<Self> {
        let chain = signer_chain(&provider)?;
        info!("Using staking module on {chain} for {:?}", provider.signer().address());
        Self::new(provider, chain)
    }
}

fn ensure_success(tx_hash: H256, receipt: Option<TransactionReceipt>) -> Result<TransactionReceipt> {
    let receipt = receipt.ok_or(CsmError::NoTransactionReceipt)?;
    if receipt.status == Some(U64::zero()) {
        return Err(CsmError::TransactionReverted(tx_hash));
    }
    info!("Transaction {tx_hash:?} mined in block {:?}", receipt.block_number);
    Ok(receipt)
}
