use csm_bindings::{
    ethers::providers::{ProviderError, WsClientError},
    CsmError,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error(transparent)]
    CsmError(#[from] CsmError),

    #[error(transparent)]
    ProviderError(#[from] ProviderError),

    #[error(transparent)]
    WSClientError(#[from] WsClientError),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    OutputError(#[from] std::io::Error),

    #[error("Log subscription closed")]
    SubscriptionClosed,
}

pub type Result<T> = std::result::Result<T, ScannerError>;
