use std::path::PathBuf;

use clap::Parser;
use csm_bindings::{
    addresses::Deployment,
    contracts::{NodeOperatorManagementProperties, StETHPermitAbi},
    keys::{load_deposit_data, pack_deposit_data},
    operator::NodeOperatorExt,
    permit::{sign_bond_permit, BondToken},
};
use ethers::types::{Address, Chain, U256};
use tracing::info;

use crate::{
    config::CsmConfig,
    error::Error,
    keys::permit_deadline,
    print_json, print_receipt,
    provider::{accounting, module, read_only, signing},
};

#[derive(Parser, Debug, Clone)]
pub enum OperatorCommands {
    #[command(name = "get", about = "Get the node operator record <ID>")]
    Get { id: u64 },
    #[command(name = "summary", about = "Get the staking router summary for a node operator <ID>")]
    Summary { id: u64 },
    #[command(name = "keys", about = "List a node operator's signing keys <ID>")]
    Keys {
        id: u64,
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Number of keys to read, defaults to every added key
        #[arg(long)]
        count: Option<u64>,
    },
    #[command(name = "list", about = "List all node operator ids")]
    List,
    #[command(
        name = "create",
        about = "Create a node operator from a deposit data file, bonding in ETH or stETH <DEPOSIT_DATA>"
    )]
    Create {
        deposit_data: PathBuf,
        #[arg(long)]
        steth: bool,
        /// Manager address, defaults to the signer
        #[arg(long)]
        manager_address: Option<Address>,
        /// Reward address, defaults to the signer
        #[arg(long)]
        reward_address: Option<Address>,
        #[arg(long)]
        extended_manager_permissions: bool,
        #[arg(long)]
        referrer: Option<Address>,
    },
    #[command(name = "propose-manager", about = "Propose a new manager address <ID> <ADDRESS>")]
    ProposeManager { id: u64, address: Address },
    #[command(name = "confirm-manager", about = "Confirm a proposed manager address <ID>")]
    ConfirmManager { id: u64 },
    #[command(name = "propose-reward", about = "Propose a new reward address <ID> <ADDRESS>")]
    ProposeReward { id: u64, address: Address },
    #[command(name = "confirm-reward", about = "Confirm a proposed reward address <ID>")]
    ConfirmReward { id: u64 },
}

pub async fn parse_operator_subcommands(
    subcmd: OperatorCommands,
    config: &CsmConfig,
    chain: Chain,
) -> Result<(), Error> {
    match subcmd {
        OperatorCommands::Get { id } => {
            let module = module(read_only(config, chain).await?, chain)?;
            let operator = module.node_operator(id.into()).await?;
            println!("{operator:#?}");
            println!("Target limit mode: {:?}", operator.target_limit_mode()?);
            println!("Unvetted keys: {}", operator.unvetted_keys());
            println!("Active keys: {}", operator.active_keys());
            if operator.has_pending_manager_change() {
                println!("Pending manager: {:?}", operator.proposed_manager_address);
            }
            if operator.has_pending_reward_change() {
                println!("Pending reward address: {:?}", operator.proposed_reward_address);
            }
        }
        OperatorCommands::Summary { id } => {
            let module = module(read_only(config, chain).await?, chain)?;
            print_json(&module.node_operator_summary(id.into()).await?)?;
        }
        OperatorCommands::Keys { id, start, count } => {
            let module = module(read_only(config, chain).await?, chain)?;
            let count = match count {
                Some(count) => count,
                None => {
                    let added = module.node_operator(id.into()).await?.total_added_keys as u64;
                    added.saturating_sub(start)
                }
            };
            let keys = module
                .signing_keys_with_signatures(id.into(), start.into(), count.into())
                .await?;
            for (index, (pubkey, signature)) in keys.iter().enumerate() {
                println!("{}: {pubkey} {signature}", start + index as u64);
            }
        }
        OperatorCommands::List => {
            let module = module(read_only(config, chain).await?, chain)?;
            let ids = module.operator_ids().await?;
            println!("{} node operators", ids.len());
            for id in ids {
                println!("{id}");
            }
        }
        OperatorCommands::Create {
            deposit_data,
            steth,
            manager_address,
            reward_address,
            extended_manager_permissions,
            referrer,
        } => {
            let packed = pack_deposit_data(&load_deposit_data(&deposit_data)?)?;
            if packed.is_empty() {
                return Err(Error::EmptyDepositData);
            }
            let (provider, wallet) = signing(config, chain).await?;
            let module = module(provider.clone(), chain)?;
            let accounting = accounting(&module).await?;
            // Unregistered ids read as empty operators on the default bond curve
            let bond = accounting.required_bond_for_next_keys(U256::MAX, packed.count).await?;
            info!("Creating node operator with {} keys and a bond of {bond}", packed.len());

            let management = NodeOperatorManagementProperties {
                manager_address: manager_address.unwrap_or_default(),
                reward_address: reward_address.unwrap_or_default(),
                extended_manager_permissions,
            };
            let referrer = referrer.unwrap_or_default();
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
                module.join_with_steth(&packed, management, permit, referrer).await?
            } else {
                module.join_with_eth(&packed, management, referrer, bond).await?
            };
            print_receipt(&module, &receipt)?;
        }
        OperatorCommands::ProposeManager { id, address } => {
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            print_receipt(&module, &module.propose_manager(id.into(), address).await?)?;
        }
        OperatorCommands::ConfirmManager { id } => {
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            print_receipt(&module, &module.confirm_manager(id.into()).await?)?;
        }
        OperatorCommands::ProposeReward { id, address } => {
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            print_receipt(&module, &module.propose_reward_address(id.into(), address).await?)?;
        }
        OperatorCommands::ConfirmReward { id } => {
            let (provider, _) = signing(config, chain).await?;
            let module = module(provider, chain)?;
            print_receipt(&module, &module.confirm_reward_address(id.into()).await?)?;
        }
    }
    Ok(())
}
