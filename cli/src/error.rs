use ethers::types::H256;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    ConfigError(#[from] crate::config::ConfigError),

    #[error(transparent)]
    CsmError(#[from] csm_bindings::CsmError),

    #[error(transparent)]
    KeyfileError(#[from] csm_signer::keyfile::KeyfileError),

    #[error(transparent)]
    WalletError(#[from] csm_signer::CsmWalletError),

    #[error(transparent)]
    DialoguerError(#[from] dialoguer::Error),

    #[error(transparent)]
    TracingFilterError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),

    #[error(transparent)]
    EthConversionError(#[from] ethers::utils::ConversionError),

    #[error("Unknown network {0}. Use mainnet, holesky or local")]
    ChainParseError(String),

    #[error("No ECDSA keyfile configured. Run `csm config import-key` or `csm config set-keyfile` first")]
    NoKeyfile,

    #[error("Transaction {0:?} not found or not mined yet")]
    ReceiptNotFound(H256),

    #[error("Deposit data file contains no keys")]
    EmptyDepositData,
}
