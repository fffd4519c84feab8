use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use csm_cli::{
    bond, config,
    config::{parse_network, CsmConfig},
    error::Error,
    events, keys, module, operator,
};

#[derive(Parser, Debug)]
#[command(name = "csm", version, about = "The command line interface for Community Staking Module node operators")]
struct Args {
    #[command(subcommand)]
    cmd: Commands,

    /// The network to connect to: mainnet, holesky, local
    #[arg(long, short, env = "CSM_NETWORK", default_value = "holesky")]
    network: String,

    /// Log level for this tool's own crates, overridden by RUST_LOG
    #[arg(long, env = "CSM_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(name = "config", about = "Manage rpc urls, keys, and keyfile settings")]
    Config {
        #[command(subcommand)]
        subcmd: config::ConfigCommands,
    },
    #[command(name = "operator", about = "Request information, create, or manage a node operator")]
    Operator {
        #[command(subcommand)]
        subcmd: operator::OperatorCommands,
    },
    #[command(name = "module", about = "Request staking module state")]
    Module {
        #[command(subcommand)]
        subcmd: module::ModuleCommands,
    },
    #[command(name = "bond", about = "Inspect or top up a node operator's bond")]
    Bond {
        #[command(subcommand)]
        subcmd: bond::BondCommands,
    },
    #[command(name = "keys", about = "Add or remove validator keys")]
    Keys {
        #[command(subcommand)]
        subcmd: keys::KeysCommands,
    },
    #[command(name = "events", about = "Decode module events")]
    Events {
        #[command(subcommand)]
        subcmd: events::EventsCommands,
    },
}

fn log_filter(level: &str) -> Result<EnvFilter, Error> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::builder()
            .parse(format!("csm={level},csm_cli={level},csm_bindings={level},csm_signer={level}"))?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    tracing_subscriber::registry().with(fmt::layer()).with(log_filter(&args.log_level)?).init();

    let chain = parse_network(&args.network)?;
    let mut config = CsmConfig::load_from_default_path()?;
    match args.cmd {
        Commands::Config { subcmd } => config::parse_config_subcommands(subcmd, &mut config).await?,
        Commands::Operator { subcmd } => {
            operator::parse_operator_subcommands(subcmd, &config, chain).await?
        }
        Commands::Module { subcmd } => module::parse_module_subcommands(subcmd, &config, chain).await?,
        Commands::Bond { subcmd } => bond::parse_bond_subcommands(subcmd, &config, chain).await?,
        Commands::Keys { subcmd } => keys::parse_keys_subcommands(subcmd, &config, chain).await?,
        Commands::Events { subcmd } => events::parse_events_subcommands(subcmd, &config, chain).await?,
    }

    Ok(())
}
