use std::{pin::Pin, sync::Arc};

use ethers::{
    abi::{RawLog, Token},
    contract::{parse_log, ContractError, Event, LogMeta},
    providers::{Middleware, PubsubClient},
    types::{Address, BigEndianHash, BlockNumber, Filter, Log, H256, I256, U256},
    utils::hex,
};
use futures::Stream;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    contracts::{CSModuleAbi, CSModuleAbiEvents, MODULE_ABI},
    error::{CsmError, Result},
};

pub const PAGE_SIZE: u64 = 50_000;

const NODE_OPERATOR_ID_PARAM: &str = "nodeOperatorId";

pub type EventStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Log filter over every module event, optionally narrowed to one node operator. All
/// operator-scoped events index the operator id as their first topic.
pub fn operator_filter(address: Address, node_operator_id: Option<U256>) -> Filter {
    let filter = Filter::new().address(address);
    match node_operator_id {
        Some(id) => filter.topic1(H256::from_uint(&id)),
        None => filter,
    }
}

pub fn module_filter(
    address: Address,
    from: BlockNumber,
    to: BlockNumber,
    node_operator_id: Option<U256>,
) -> Filter {
    operator_filter(address, node_operator_id).from_block(from).to_block(to)
}

/// Decodes a mined module log. Pending logs carry no block metadata and are skipped.
pub fn decode_event(log: &Log) -> Option<(CSModuleAbiEvents, LogMeta)> {
    if log.block_number.is_none() ||
        log.block_hash.is_none() ||
        log.transaction_hash.is_none() ||
        log.transaction_index.is_none() ||
        log.log_index.is_none()
    {
        debug!("Skipping pending log from {:?}", log.address);
        return None;
    }
    let meta = LogMeta::from(log);
    match parse_log::<CSModuleAbiEvents>(log.clone()) {
        Ok(event) => Some((event, meta)),
        Err(e) => {
            debug!("Skipping undecodable log {:?}: {e}", log.transaction_hash);
            None
        }
    }
}

/// Fetches all module logs in `[start, end]` with `eth_getLogs`, `PAGE_SIZE` blocks per request.
/// The pages never reach past `end`.
pub async fn fetch_logs_between<M: Middleware>(
    provider: &M,
    address: Address,
    start: u64,
    end: u64,
    node_operator_id: Option<U256>,
) -> Result<Vec<Log>> {
    info!("Fetching module events between {start} and {end}");
    let mut logs = Vec::new();
    let mut page_start = start;
    while page_start <= end {
        let page_end = page_start.saturating_add(PAGE_SIZE - 1).min(end);
        let filter =
            module_filter(address, page_start.into(), page_end.into(), node_operator_id);
        let page =
            provider.get_logs(&filter).await.map_err(|e| CsmError::LogQuery(e.to_string()))?;
        debug!("Blocks {page_start}..={page_end}: {} logs", page.len());
        logs.extend(page);
        match page_end.checked_add(1) {
            Some(next) => page_start = next,
            None => break,
        }
    }
    info!("Fetched {} module events between {start} and {end}", logs.len());
    Ok(logs)
}

pub async fn fetch_events_between<M: Middleware>(
    provider: &M,
    address: Address,
    start: u64,
    end: u64,
) -> Result<Vec<(CSModuleAbiEvents, LogMeta)>> {
    let logs = fetch_logs_between(provider, address, start, end, None).await?;
    Ok(logs.iter().filter_map(decode_event).collect())
}

pub type ModuleEvents<M> = Event<Arc<M>, M, CSModuleAbiEvents>;

pub fn module_events<M: Middleware>(module: &CSModuleAbi<M>, from_block: u64) -> ModuleEvents<M> {
    module.events().from_block(from_block)
}

/// Live stream of decoded module events. The stream borrows the event builder, so callers keep
/// the `ModuleEvents` alive for as long as they poll.
pub async fn subscribe_events<'a, M>(
    events: &'a ModuleEvents<M>,
) -> Result<EventStream<'a, std::result::Result<(CSModuleAbiEvents, LogMeta), ContractError<M>>>>
where
    M: Middleware + 'static,
    <M as Middleware>::Provider: PubsubClient,
{
    let stream = events.subscribe_with_meta().await?;
    Ok(Box::pin(stream))
}

/// JSON-friendly view of a module log, decoded against the raw ABI.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub name: String,
    pub node_operator_id: Option<U256>,
    pub params: Map<String, Value>,
    pub address: Address,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
    pub log_index: Option<U256>,
}

impl EventRecord {
    pub fn from_log(log: &Log) -> Option<Self> {
        let topic = log.topics.first()?;
        let event = MODULE_ABI.events().find(|event| event.signature() == *topic)?;
        let parsed = event
            .parse_log(RawLog { topics: log.topics.clone(), data: log.data.to_vec() })
            .map_err(|e| debug!("Could not parse {} log: {e}", event.name))
            .ok()?;

        let mut node_operator_id = None;
        let mut params = Map::new();
        for param in parsed.params {
            if param.name == NODE_OPERATOR_ID_PARAM {
                node_operator_id = param.value.clone().into_uint();
            }
            params.insert(param.name, token_to_json(param.value));
        }

        Some(Self {
            name: event.name.clone(),
            node_operator_id,
            params,
            address: log.address,
            block_number: log.block_number.map(|n| n.as_u64()),
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
        })
    }
}

fn token_to_json(token: Token) -> Value {
    match token {
        Token::Address(address) => Value::String(format!("{address:?}")),
        Token::Uint(value) => Value::String(value.to_string()),
        Token::Int(value) => Value::String(I256::from_raw(value).to_string()),
        Token::Bool(value) => Value::Bool(value),
        Token::String(value) => Value::String(value),
        Token::Bytes(bytes) | Token::FixedBytes(bytes) => {
            Value::String(format!("0x{}", hex::encode(bytes)))
        }
        Token::Array(tokens) | Token::FixedArray(tokens) | Token::Tuple(tokens) => {
            Value::Array(tokens.into_iter().map(token_to_json).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contracts::{NodeOperatorAddedFilter, SigningKeyAddedFilter},
        test_utils::{mocked_module, module_address},
    };
    use ethers::{
        abi::encode,
        contract::EthEvent,
        providers::{MockProvider, Provider},
        types::{Bytes, ValueOrArray, U64},
    };

    fn log(topics: Vec<H256>, data: Vec<u8>) -> Log {
        Log {
            address: Address::repeat_byte(0xcc),
            topics,
            data: Bytes::from(data),
            block_number: Some(U64::from(120)),
            block_hash: Some(H256::repeat_byte(2)),
            transaction_hash: Some(H256::repeat_byte(1)),
            transaction_index: Some(U64::from(0)),
            log_index: Some(U256::from(3)),
            ..Default::default()
        }
    }

    fn node_operator_added() -> Log {
        log(
            vec![
                NodeOperatorAddedFilter::signature(),
                H256::from_low_u64_be(17),
                H256::from(Address::repeat_byte(0xaa)),
                H256::from(Address::repeat_byte(0xbb)),
            ],
            vec![],
        )
    }

    #[test]
    fn test_decode_typed_event() {
        let (event, meta) = decode_event(&node_operator_added()).unwrap();
        match event {
            CSModuleAbiEvents::NodeOperatorAddedFilter(added) => {
                assert_eq!(added.node_operator_id, U256::from(17));
                assert_eq!(added.manager_address, Address::repeat_byte(0xaa));
                assert_eq!(added.reward_address, Address::repeat_byte(0xbb));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(meta.block_number, U64::from(120));
    }

    #[test]
    fn test_record_from_log() {
        let pubkey = vec![0x11u8; 48];
        let log = log(
            vec![SigningKeyAddedFilter::signature(), H256::from_low_u64_be(5)],
            encode(&[Token::Bytes(pubkey.clone())]),
        );
        let record = EventRecord::from_log(&log).unwrap();
        assert_eq!(record.name, "SigningKeyAdded");
        assert_eq!(record.node_operator_id, Some(U256::from(5)));
        assert_eq!(record.params["pubkey"], Value::String(format!("0x{}", hex::encode(pubkey))));
        assert_eq!(record.block_number, Some(120));
    }

    #[test]
    fn test_record_without_operator() {
        let topic = H256::from(ethers::utils::keccak256("NonceChanged(uint256)"));
        let log = log(vec![topic], encode(&[Token::Uint(U256::from(44))]));
        let record = EventRecord::from_log(&log).unwrap();
        assert_eq!(record.name, "NonceChanged");
        assert_eq!(record.node_operator_id, None);
        assert_eq!(record.params["nonce"], Value::String("44".to_string()));
    }

    #[test]
    fn test_unknown_topic_is_skipped() {
        let log = log(vec![H256::repeat_byte(0x42)], vec![]);
        assert!(EventRecord::from_log(&log).is_none());
        assert!(decode_event(&log).is_none());
    }

    #[test]
    fn test_pending_log_is_skipped() {
        let mut log = node_operator_added();
        log.block_hash = None;
        assert!(decode_event(&log).is_none());
        assert!(EventRecord::from_log(&log).is_some());
    }

    #[test]
    fn test_operator_filter_sets_topic() {
        let filter = module_filter(
            Address::repeat_byte(0xcc),
            BlockNumber::Number(1.into()),
            BlockNumber::Latest,
            Some(U256::from(9)),
        );
        let topic = filter.topics[1].clone().unwrap();
        assert_eq!(topic, ValueOrArray::Value(Some(H256::from_low_u64_be(9))));
        assert!(operator_filter(Address::repeat_byte(0xcc), None).topics[1].is_none());
    }

    fn push_logs(mock: &MockProvider, logs: Vec<Log>) {
        mock.push::<Vec<Log>, _>(logs).unwrap();
    }

    #[tokio::test]
    async fn test_backfill_stops_at_end_block() {
        let (provider, mock) = Provider::mocked();
        push_logs(&mock, vec![]);

        let logs =
            fetch_logs_between(&provider, module_address(), 10, 20, Some(U256::from(9))).await.unwrap();
        assert!(logs.is_empty());

        let expected = module_filter(module_address(), 10.into(), 20.into(), Some(U256::from(9)));
        mock.assert_request("eth_getLogs", [expected]).unwrap();
        assert!(mock.assert_request("eth_blockNumber", ()).is_err());
    }

    #[tokio::test]
    async fn test_backfill_pages_are_contiguous() {
        let (provider, mock) = Provider::mocked();
        let mut late = node_operator_added();
        late.block_number = Some(U64::from(55_000));
        // served last in, first out
        push_logs(&mock, vec![late]);
        push_logs(&mock, vec![node_operator_added()]);

        let logs = fetch_logs_between(&provider, module_address(), 0, 60_000, None).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].block_number, Some(U64::from(120)));
        assert_eq!(logs[1].block_number, Some(U64::from(55_000)));

        let first = module_filter(module_address(), 0.into(), 49_999.into(), None);
        let second = module_filter(module_address(), 50_000.into(), 60_000.into(), None);
        mock.assert_request("eth_getLogs", [first]).unwrap();
        mock.assert_request("eth_getLogs", [second]).unwrap();
    }

    #[tokio::test]
    async fn test_empty_range_sends_no_request() {
        let (provider, mock) = Provider::mocked();
        let logs = fetch_logs_between(&provider, module_address(), 21, 20, None).await.unwrap();
        assert!(logs.is_empty());
        assert!(mock.assert_request("eth_getLogs", ()).is_err());
    }

    #[tokio::test]
    async fn test_fetch_events_drops_pending_logs() {
        let (provider, mock) = Provider::mocked();
        let mut pending = node_operator_added();
        pending.block_hash = None;
        pending.transaction_index = None;
        push_logs(&mock, vec![node_operator_added(), pending]);

        let events = fetch_events_between(&provider, module_address(), 100, 200).await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0].0, CSModuleAbiEvents::NodeOperatorAddedFilter(_)));
        assert_eq!(events[0].1.block_number, U64::from(120));
    }

    #[tokio::test]
    async fn test_module_events_start_block() {
        let (module, _mock) = mocked_module();
        let events = module_events(&module, 4_000);
        assert_eq!(events.filter.get_from_block(), Some(U64::from(4_000)));
        assert_eq!(events.filter.address, Some(ValueOrArray::Value(module_address())));
    }
}
