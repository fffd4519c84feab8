use clap::Parser;
use csm_bindings::queue::keys_per_operator;
use ethers::types::Chain;

use crate::{
    config::CsmConfig,
    error::Error,
    print_json,
    provider::{module, read_only},
};

#[derive(Parser, Debug, Clone)]
pub enum ModuleCommands {
    #[command(name = "summary", about = "Get exited, deposited and depositable validator totals")]
    Summary,
    #[command(name = "queue", about = "Walk the deposit queue from its head")]
    Queue {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    #[command(name = "status", about = "Get pause state, public release, nonce and key removal charge")]
    Status,
}

pub async fn parse_module_subcommands(
    subcmd: ModuleCommands,
    config: &CsmConfig,
    chain: Chain,
) -> Result<(), Error> {
    let module = module(read_only(config, chain).await?, chain)?;
    match subcmd {
        ModuleCommands::Summary => print_json(&module.module_summary().await?)?,
        ModuleCommands::Queue { limit } => {
            let batches = module.queued_batches(limit).await?;
            for queued in &batches {
                println!(
                    "#{}: operator {} with {} keys",
                    queued.index, queued.batch.node_operator_id, queued.batch.keys_count
                );
            }
            println!("Keys queued per operator:");
            for (operator, keys) in keys_per_operator(&batches) {
                println!("  {operator}: {keys}");
            }
        }
        ModuleCommands::Status => print_json(&module.status().await?)?,
    }
    Ok(())
}
