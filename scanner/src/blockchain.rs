use std::io::Write;

use csm_bindings::{
    addresses,
    connect_ws,
    ethers::{
        providers::Middleware,
        types::{Address, Log, U256},
    },
    events::{fetch_logs_between, operator_filter, EventRecord},
    provider::chain_from_id,
};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{Result, ScannerError};

/// Writes decoded module events as JSON lines, dropping events of other operators when a filter
/// is set.
pub struct Reporter<W> {
    out: W,
    node_operator_id: Option<U256>,
    latest_block: u64,
    reported: usize,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, node_operator_id: Option<U256>) -> Self {
        Self { out, node_operator_id, latest_block: 0, reported: 0 }
    }

    /// Returns whether the log was written out.
    pub fn report(&mut self, log: &Log) -> Result<bool> {
        let Some(record) = EventRecord::from_log(log) else {
            return Ok(false);
        };
        if self.node_operator_id.is_some() && record.node_operator_id != self.node_operator_id {
            return Ok(false);
        }
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        self.out.flush()?;

        if let Some(block) = record.block_number {
            self.latest_block = self.latest_block.max(block);
        }
        self.reported += 1;
        Ok(true)
    }

    pub fn latest_block(&self) -> u64 {
        self.latest_block
    }

    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Streams every module event from `from_block` on. The live subscription is opened before the
/// backfill so no block falls between the two. Subscribed logs already covered by the backfill,
/// or older than `from_block`, are dropped.
pub async fn fetch<W: Write>(
    rpc_url: &str,
    address: Option<Address>,
    from_block: u64,
    node_operator_id: Option<U256>,
    out: W,
) -> Result<()> {
    info!("Starting event listener under {rpc_url}");
    let provider = connect_ws(rpc_url).await?;
    let chain_id = provider.get_chainid().await?.as_u64();
    let address = match address {
        Some(address) => address,
        None => addresses::module(chain_from_id(chain_id)?)?,
    };
    debug!("Chain id is {chain_id}, listening at {address:?}");

    let filter = operator_filter(address, node_operator_id);
    let mut stream = provider.subscribe_logs(&filter).await?;
    let head = provider.get_block_number().await?.as_u64();

    let mut reporter = Reporter::new(out, node_operator_id);
    if from_block <= head {
        let logs = fetch_logs_between(&provider, address, from_block, head, node_operator_id).await?;
        for log in &logs {
            reporter.report(log)?;
        }
    }
    info!("Backfilled {} events up to block {head}, listening...", reporter.reported());

    while let Some(log) = stream.next().await {
        if log.removed == Some(true) {
            warn!("Log {:?} was removed by a reorg", log.transaction_hash);
            continue;
        }
        if !is_live(&log, from_block, head) {
            continue;
        }
        reporter.report(&log)?;
    }

    debug!("Subscription ended after block {}", reporter.latest_block());
    Err(ScannerError::SubscriptionClosed)
}

/// Whether a subscribed log is past both the backfilled head and the requested start block.
fn is_live(log: &Log, from_block: u64, head: u64) -> bool {
    match log.block_number {
        Some(block) => block.as_u64() > head && block.as_u64() >= from_block,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csm_bindings::{
        contracts::{NodeOperatorAddedFilter, SigningKeyAddedFilter},
        ethers::{
            abi::{encode, Token},
            contract::EthEvent,
            types::{Bytes, H256, U64},
        },
    };
    use serde_json::Value;

    fn log(event: H256, node_operator_id: u64, data: Vec<u8>, block: u64) -> Log {
        let mut topics = vec![event, H256::from_low_u64_be(node_operator_id)];
        if event == NodeOperatorAddedFilter::signature() {
            topics.push(H256::from(Address::repeat_byte(0xaa)));
            topics.push(H256::from(Address::repeat_byte(0xbb)));
        }
        Log {
            address: Address::repeat_byte(0xcc),
            topics,
            data: Bytes::from(data),
            block_number: Some(U64::from(block)),
            ..Default::default()
        }
    }

    #[test]
    fn test_reporter_writes_json_lines() {
        let mut reporter = Reporter::new(Vec::new(), None);
        let added = log(NodeOperatorAddedFilter::signature(), 4, vec![], 10);
        let key = log(
            SigningKeyAddedFilter::signature(),
            4,
            encode(&[Token::Bytes(vec![0x11; 48])]),
            12,
        );
        assert!(reporter.report(&added).unwrap());
        assert!(reporter.report(&key).unwrap());
        assert_eq!(reporter.latest_block(), 12);

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let lines: Vec<Value> =
            output.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["name"], "NodeOperatorAdded");
        assert_eq!(lines[1]["name"], "SigningKeyAdded");
        assert_eq!(lines[1]["block_number"], 12);
    }

    #[test]
    fn test_reporter_filters_operator() {
        let mut reporter = Reporter::new(Vec::new(), Some(U256::from(4)));
        assert!(!reporter.report(&log(NodeOperatorAddedFilter::signature(), 5, vec![], 1)).unwrap());
        assert!(reporter.report(&log(NodeOperatorAddedFilter::signature(), 4, vec![], 2)).unwrap());
        assert_eq!(reporter.reported(), 1);
    }

    #[test]
    fn test_reporter_skips_foreign_logs() {
        let mut reporter = Reporter::new(Vec::new(), None);
        assert!(!reporter.report(&log(H256::repeat_byte(0x42), 1, vec![], 1)).unwrap());
        assert!(reporter.into_inner().is_empty());
    }

    #[test]
    fn test_backfilled_logs_are_skipped() {
        let old = log(NodeOperatorAddedFilter::signature(), 1, vec![], 100);
        let new = log(NodeOperatorAddedFilter::signature(), 1, vec![], 101);
        assert!(!is_live(&old, 0, 100));
        assert!(is_live(&new, 0, 100));
    }

    #[test]
    fn test_logs_before_start_block_are_skipped() {
        // start block ahead of the chain head, so nothing was backfilled
        let early = log(NodeOperatorAddedFilter::signature(), 1, vec![], 150);
        let first = log(NodeOperatorAddedFilter::signature(), 1, vec![], 200);
        assert!(!is_live(&early, 200, 120));
        assert!(is_live(&first, 200, 120));
    }
}
