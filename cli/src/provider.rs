use std::sync::Arc;

use csm_bindings::{connect_provider, CsAccounting, CsModule, CsmProvider};
use csm_signer::CsmWallet;
use ethers::types::Chain;
use tracing::debug;

use crate::{config::CsmConfig, error::Error};

/// Provider for view calls. A throwaway signer is attached, so no keyfile is needed.
pub async fn read_only(config: &CsmConfig, chain: Chain) -> Result<Arc<CsmProvider>, Error> {
    let rpc_url = config.get_default_rpc_url(chain)?;
    debug!("Connecting read-only to {rpc_url}");
    Ok(Arc::new(connect_provider(&rpc_url, None).await?))
}

/// Provider signing with the configured default keyfile. The decrypted wallet is returned as
/// well for permit signing.
pub async fn signing(
    config: &CsmConfig,
    chain: Chain,
) -> Result<(Arc<CsmProvider>, CsmWallet), Error> {
    let rpc_url = config.get_default_rpc_url(chain)?;
    let wallet = config.wallet()?;
    debug!("Connecting to {rpc_url} as {:?}", wallet.address());
    let provider = connect_provider(&rpc_url, Some(wallet)).await?;
    let wallet = provider.signer().clone();
    Ok((Arc::new(provider), wallet))
}

pub fn module(provider: Arc<CsmProvider>, chain: Chain) -> Result<CsModule<CsmProvider>, Error> {
    Ok(CsModule::new(provider, chain)?)
}

pub async fn accounting(
    module: &CsModule<CsmProvider>,
) -> Result<CsAccounting<CsmProvider>, Error> {
    Ok(CsAccounting::from_module(module).await?)
}
