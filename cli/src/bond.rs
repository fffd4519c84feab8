use clap::Parser;
use ethers::{
    types::{Chain, U256},
    utils::{format_ether, parse_ether},
};

use crate::{
    config::CsmConfig,
    error::Error,
    print_receipt,
    provider::{accounting, module, read_only, signing},
};

#[derive(Parser, Debug, Clone)]
pub enum BondCommands {
    #[command(name = "summary", about = "Get current and required bond for a node operator <ID>")]
    Summary { id: u64 },
    #[command(name = "top-up", about = "Deposit extra ETH bond for a node operator <ID> <AMOUNT_ETH>")]
    TopUp { id: u64, amount: String },
    #[command(
        name = "claim",
        about = "Claim excess bond as stETH without a rewards proof <ID> <AMOUNT_ETH>"
    )]
    Claim { id: u64, amount: String },
}

pub async fn parse_bond_subcommands(
    subcmd: BondCommands,
    config: &CsmConfig,
    chain: Chain,
) -> Result<(), Error> {
    match subcmd {
        BondCommands::Summary { id } => {
            let module = module(read_only(config, chain).await?, chain)?;
            let accounting = accounting(&module).await?;
            let id = U256::from(id);
            let summary = accounting.bond_summary(id).await?;
            println!("Current bond:  {} stETH", format_ether(summary.current));
            println!("Required bond: {} stETH", format_ether(summary.required));
            if !summary.deficit().is_zero() {
                println!("Missing bond:  {} stETH", format_ether(summary.deficit()));
            } else {
                println!("Excess bond:   {} stETH", format_ether(summary.excess()));
            }
            println!("Unbonded keys: {}", accounting.unbonded_keys(id).await?);
        }
        BondCommands::TopUp { id, amount } => {
            let amount = parse_ether(amount)?;
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            print_receipt(&module, &module.top_up_bond_eth(id.into(), amount).await?)?;
        }
        BondCommands::Claim { id, amount } => {
            let amount = parse_ether(amount)?;
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            let receipt =
                module.claim_steth_rewards(id.into(), amount, U256::zero(), Vec::new()).await?;
            print_receipt(&module, &receipt)?;
        }
    }
    Ok(())
}
