use csm_io::IoError;
use csm_signer::sign_utils::SigningError;
use ethers::{
    contract::{ContractError, ContractRevert},
    providers::{JsonRpcError, Middleware, MiddlewareError as _, ProviderError, WsClientError},
    types::{Bytes, Chain, H256},
    utils::hex::FromHexError,
};
use thiserror::Error;

use crate::contracts::CSModuleAbiErrors;

pub type Result<T> = std::result::Result<T, CsmError>;

#[derive(Debug, Error)]
pub enum CsmError {
    #[error("Chain not supported {0}")]
    ChainNotSupported(Chain),

    #[error("Unknown chain id {0}")]
    UnknownChainId(u64),

    #[error("Environment variable {0} must hold a contract address for local deployments")]
    LocalAddress(String),

    #[error("Contract reverted: {}", revert_reason(.decoded, .data))]
    Revert { data: Bytes, decoded: Option<CSModuleAbiErrors> },

    #[error("JSON RPC Error {0}")]
    JsonRpc(JsonRpcError),

    #[error("Contract call failed: {0}")]
    Contract(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Log query failed: {0}")]
    LogQuery(String),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    WsClient(#[from] WsClientError),

    #[error(transparent)]
    Abi(#[from] ethers::abi::Error),

    #[error(transparent)]
    Hex(#[from] FromHexError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("Invalid {what} data: expected a multiple of {expected} bytes, got {actual}")]
    InvalidKeyLength { what: &'static str, expected: usize, actual: usize },

    #[error("Key count mismatch: {pubkeys} public keys and {signatures} signatures")]
    KeyCountMismatch { pubkeys: usize, signatures: usize },

    #[error("Unknown target limit mode {0}")]
    TargetLimitMode(u64),

    #[error("Transaction dropped before a receipt was produced")]
    NoTransactionReceipt,

    #[error("Transaction {0:?} reverted")]
    TransactionReverted(H256),
}

fn revert_reason(decoded: &Option<CSModuleAbiErrors>, data: &Bytes) -> String {
    match decoded {
        Some(error) => format!("{error:?}"),
        None => data.to_string(),
    }
}

impl CsmError {
    /// Builds a revert error, attaching the module's custom error when the selector is known.
    pub fn revert(data: Bytes) -> Self {
        let decoded = CSModuleAbiErrors::decode_with_selector(&data);
        CsmError::Revert { data, decoded }
    }

    pub fn decoded_revert(&self) -> Option<&CSModuleAbiErrors> {
        match self {
            CsmError::Revert { decoded, .. } => decoded.as_ref(),
            _ => None,
        }
    }
}

impl<M: Middleware + 'static> From<ContractError<M>> for CsmError {
    fn from(value: ContractError<M>) -> Self {
        if let Some(data) = value.as_revert() {
            return CsmError::revert(data.clone());
        }
        match value {
            ContractError::MiddlewareError { e } => match e.as_error_response() {
                Some(err) => from_rpc_error(err),
                None => CsmError::Contract(Box::new(e)),
            },
            ContractError::ProviderError { e } => match e.as_error_response() {
                Some(err) => from_rpc_error(err),
                None => CsmError::Provider(e),
            },
            other => CsmError::Contract(Box::new(other)),
        }
    }
}

fn from_rpc_error(err: &JsonRpcError) -> CsmError {
    match err.as_revert_data() {
        Some(data) => CsmError::revert(data),
        None => CsmError::JsonRpc(err.clone()),
    }
}
