use csm_signer::CsmWallet;
use ethers::{
    middleware::{signer::SignerMiddlewareError, SignerMiddleware},
    providers::{Http, Middleware, Provider, Ws},
    signers::Signer,
    types::Chain,
};
use tracing::debug;

use crate::error::{CsmError, Result};

pub type CsmProvider = SignerMiddleware<Provider<Http>, CsmWallet>;
pub type CsmProviderError = SignerMiddlewareError<Provider<Http>, CsmWallet>;

const WS_RECONNECTS: usize = 5;

/// Connects to an HTTP RPC endpoint and binds a signer to the reported chain id. Without a
/// wallet a throwaway key is generated, which is enough for view calls.
pub async fn connect_provider(rpc_url: &str, wallet: Option<CsmWallet>) -> Result<CsmProvider> {
    let provider = Provider::<Http>::try_from(rpc_url)?;
    let chain_id = provider.get_chainid().await?.as_u64();
    debug!("Connected to {rpc_url} with chain id {chain_id}");
    let wallet = wallet.unwrap_or_default().with_chain_id(chain_id);
    Ok(SignerMiddleware::new(provider, wallet))
}

pub async fn connect_ws(rpc_url: &str) -> Result<Provider<Ws>> {
    Ok(Provider::<Ws>::connect_with_reconnects(rpc_url, WS_RECONNECTS).await?)
}

pub fn chain_from_id(chain_id: u64) -> Result<Chain> {
    Chain::try_from(chain_id).map_err(|_| CsmError::UnknownChainId(chain_id))
}

/// Chain the signer of a connected provider was bound to.
pub fn signer_chain(provider: &CsmProvider) -> Result<Chain> {
    chain_from_id(provider.signer().chain_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_from_id() {
        assert_eq!(chain_from_id(1).unwrap(), Chain::Mainnet);
        assert_eq!(chain_from_id(17000).unwrap(), Chain::Holesky);
        assert_eq!(chain_from_id(31337).unwrap(), Chain::AnvilHardhat);
        assert!(matches!(chain_from_id(u64::MAX), Err(CsmError::UnknownChainId(u64::MAX))));
    }

    #[tokio::test]
    async fn test_bad_url_is_rejected() {
        let err = connect_provider("not a url", None).await.unwrap_err();
        assert!(matches!(err, CsmError::Url(_)));
    }
}
