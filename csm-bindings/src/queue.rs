use ethers::{providers::Middleware, types::U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{contracts::CSModuleAbi, error::Result};

/// One deposit queue entry. On-chain it is a single word laid out as
/// `| 64 bits node operator id | 64 bits keys count | 128 bits next index |`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub node_operator_id: u64,
    pub keys_count: u64,
    pub next: u128,
}

impl Batch {
    pub fn decode(raw: U256) -> Self {
        let node_operator_id = (raw >> 192).low_u64();
        let keys_count = (raw >> 128).low_u64();
        let next = raw.low_u128();
        Self { node_operator_id, keys_count, next }
    }

    pub fn encode(&self) -> U256 {
        (U256::from(self.node_operator_id) << 192)
            | (U256::from(self.keys_count) << 128)
            | U256::from(self.next)
    }

    /// A zero word marks a slot that was never written.
    pub fn is_nil(&self) -> bool {
        *self == Self::default()
    }
}

impl From<U256> for Batch {
    fn from(raw: U256) -> Self {
        Self::decode(raw)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedBatch {
    pub index: u128,
    pub batch: Batch,
}

/// Reads up to `limit` batches starting at the queue head, following each batch's `next` link
/// until the tail is reached.
pub async fn walk_deposit_queue<M: Middleware + 'static>(
    module: &CSModuleAbi<M>,
    limit: usize,
) -> Result<Vec<QueuedBatch>> {
    let (head, tail) = module.deposit_queue().call().await?;
    debug!("Deposit queue head {head} tail {tail}");

    let mut batches = Vec::new();
    let mut index = head;
    while index != tail && batches.len() < limit {
        let batch = Batch::decode(module.deposit_queue_item(index).call().await?);
        if batch.is_nil() {
            break;
        }
        batches.push(QueuedBatch { index, batch });
        index = batch.next;
    }
    Ok(batches)
}

/// Keys waiting in the queue per node operator, in queue order of first appearance.
pub fn keys_per_operator(batches: &[QueuedBatch]) -> Vec<(u64, u64)> {
    let mut totals: Vec<(u64, u64)> = Vec::new();
    for QueuedBatch { batch, .. } in batches {
        match totals.iter_mut().find(|(id, _)| *id == batch.node_operator_id) {
            Some((_, keys)) => *keys += batch.keys_count,
            None => totals.push((batch.node_operator_id, batch.keys_count)),
        }
    }
    totals
}
