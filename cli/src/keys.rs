use std::{
    path::PathBuf,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use clap::Parser;
use csm_bindings::{
    addresses::Deployment,
    contracts::StETHPermitAbi,
    keys::{load_deposit_data, pack_deposit_data},
    permit::{sign_bond_permit, BondToken},
};
use ethers::types::{Chain, U256};
use tracing::info;

use crate::{
    config::CsmConfig,
    error::Error,
    print_receipt,
    provider::{accounting, module, signing},
};

const PERMIT_VALIDITY: Duration = Duration::from_secs(60 * 60);

#[derive(Parser, Debug, Clone)]
pub enum KeysCommands {
    #[command(
        name = "add",
        about = "Upload validator keys from a deposit data file, bonding in ETH or stETH <ID> <DEPOSIT_DATA>"
    )]
    Add {
        id: u64,
        deposit_data: PathBuf,
        #[arg(long)]
        steth: bool,
    },
    #[command(name = "remove", about = "Remove not yet deposited keys <ID> <START> <COUNT>")]
    Remove { id: u64, start: u64, count: u64 },
}

pub async fn parse_keys_subcommands(
    subcmd: KeysCommands,
    config: &CsmConfig,
    chain: Chain,
) -> Result<(), Error> {
    match subcmd {
        KeysCommands::Add { id, deposit_data, steth } => {
            let packed = pack_deposit_data(&load_deposit_data(&deposit_data)?)?;
            if packed.is_empty() {
                return Err(Error::EmptyDepositData);
            }
            let (provider, wallet) = signing(config, chain).await?;
            let module = module(provider.clone(), chain)?;
            let accounting = accounting(&module).await?;
            let id = U256::from(id);
            let bond = accounting.required_bond_for_next_keys(id, packed.count).await?;
            info!("Adding {} keys to operator {id} with a bond of {bond}", packed.len());

            let receipt = if steth {
                let token = BondToken::StEth;
                let deployment = Deployment::for_chain(chain)?;
                let token_contract =
                    StETHPermitAbi::new(token.address(&deployment), provider.clone());
                let permit = sign_bond_permit(
                    &token_contract,
                    token.domain(),
                    &wallet,
                    accounting.address(),
                    bond,
                    permit_deadline(),
                )
                .await?;
                module.submit_keys_steth(id, &packed, permit).await?
            } else {
                module.submit_keys_eth(id, &packed, bond).await?
            };
            print_receipt(&module, &receipt)?;
        }
        KeysCommands::Remove { id, start, count } => {
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            let receipt = module.delete_keys(id.into(), start.into(), count.into()).await?;
            print_receipt(&module, &receipt)?;
        }
    }
    Ok(())
}

/// Unix timestamp an hour from now.
pub fn permit_deadline() -> U256 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    U256::from((now + PERMIT_VALIDITY).as_secs())
}
