use clap::Parser;
use csm_bindings::ethers::types::{Address, U256};
use scanner::blockchain;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::FmtSubscriber;

#[derive(Clone, Parser, Debug)]
#[command(name = "csm-scanner", version, about = "Streams Community Staking Module events as JSON lines")]
pub struct Params {
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    #[arg(long, env = "START_BLOCK", default_value_t = 0)]
    pub start_block: u64,

    /// Module address, defaults to the deployment of the connected chain
    #[arg(long, env = "ADDRESS")]
    pub address: Option<Address>,

    #[arg(long, env = "NODE_OPERATOR_ID")]
    pub node_operator_id: Option<u64>,

    #[arg(long, env = "LOG_LEVEL", default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let params = Params::parse();

    start_tracing(params.log_level)?;

    info!("CSM scanner starting...");

    blockchain::fetch(
        &params.rpc_url,
        params.address,
        params.start_block,
        params.node_operator_id.map(U256::from),
        std::io::stdout(),
    )
    .await?;

    Ok(())
}

// Events go to stdout, so logs are kept on stderr
fn start_tracing(level: LevelFilter) -> Result<(), anyhow::Error> {
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
