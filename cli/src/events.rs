use clap::Parser;
use csm_bindings::events::{fetch_logs_between, EventRecord};
use ethers::{
    providers::Middleware,
    types::{Chain, H256, U256},
};

use crate::{
    config::CsmConfig,
    error::Error,
    print_json, print_receipt,
    provider::{module, read_only},
};

#[derive(Parser, Debug, Clone)]
pub enum EventsCommands {
    #[command(name = "receipt", about = "Decode the module events of a mined transaction <TX_HASH>")]
    Receipt { tx_hash: H256 },
    #[command(name = "range", about = "Print module events between two blocks <FROM> [TO]")]
    Range {
        from: u64,
        /// Defaults to the latest block
        to: Option<u64>,
        #[arg(long)]
        operator: Option<u64>,
    },
}

pub async fn parse_events_subcommands(
    subcmd: EventsCommands,
    config: &CsmConfig,
    chain: Chain,
) -> Result<(), Error> {
    let provider = read_only(config, chain).await?;
    let module = module(provider.clone(), chain)?;
    match subcmd {
        EventsCommands::Receipt { tx_hash } => {
            let receipt = provider
                .provider()
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(csm_bindings::CsmError::from)?
                .ok_or(Error::ReceiptNotFound(tx_hash))?;
            print_receipt(&module, &receipt)?;
        }
        EventsCommands::Range { from, to, operator } => {
            let to = match to {
                Some(to) => to,
                None => provider
                    .provider()
                    .get_block_number()
                    .await
                    .map_err(csm_bindings::CsmError::from)?
                    .as_u64(),
            };
            let logs = fetch_logs_between(
                provider.provider(),
                module.address(),
                from,
                to,
                operator.map(U256::from),
            )
            .await?;
            for record in logs.iter().filter_map(EventRecord::from_log) {
                print_json(&record)?;
            }
        }
    }
    Ok(())
}
