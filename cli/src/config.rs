use std::path::PathBuf;

use clap::Parser;
use csm_io::{read_toml, write_toml, IoError};
use csm_signer::{
    keyfile::{load_ecdsa_keyfile, EcdsaKeyfile, KeyfileError},
    CsmWallet, CsmWalletError,
};
use dialoguer::{Input, Password};
use ethers::types::Chain;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::{debug, info};

use crate::error::Error;

pub const CONFIG_FILE: &str = "csm-config.toml";

pub static DEFAULT_CONFIG_PATH: Lazy<PathBuf> =
    Lazy::new(|| dirs::home_dir().unwrap_or_default().join(".csm"));

#[derive(Parser, Debug, Clone)]
pub enum ConfigCommands {
    #[command(
        name = "set-rpc",
        about = "Set default URLs to use when connecting to 'mainnet', 'holesky', and 'local' RPC urls <NETWORK> <RPC_URL>"
    )]
    SetRpc { network: String, rpc_url: String },
    #[command(name = "get-rpc", about = "Get the default RPC URL for 'mainnet', 'holesky', or 'local'")]
    GetRpc { network: String },
    #[command(
        name = "import-key",
        about = "Import a private key, encrypt it into a keyfile and make it the default signer"
    )]
    ImportKey { private_key: String, keyname: Option<String>, password: Option<String> },
    #[command(
        name = "create-key",
        about = "Create a new private key and optionally store it as the default signer"
    )]
    CreateKey {
        #[arg(long)]
        store: bool,
        keyname: Option<String>,
        password: Option<String>,
    },
    #[command(
        name = "set-keyfile",
        about = "Use an existing encrypted keyfile as the default signer <KEYFILE_PATH> <PASSWORD_ENV_VAR>"
    )]
    SetKeyfile { path: PathBuf, pw_env_var: String, name: Option<String> },
    #[command(name = "get", about = "Print the whole configuration")]
    Get,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsmConfig {
    /// Directory holding the config file and generated keyfiles
    path: PathBuf,
    pub mainnet_rpc_url: String,
    pub holesky_rpc_url: String,
    pub local_rpc_url: String,
    /// Keyfile used to sign manager transactions and bond permits
    pub default_ecdsa_keyfile: Option<EcdsaKeyfile>,
}

impl Default for CsmConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_CONFIG_PATH.to_owned(),
            mainnet_rpc_url: "https://rpc.flashbots.net/fast".to_string(),
            holesky_rpc_url: "https://ethereum-holesky-rpc.publicnode.com".to_string(),
            local_rpc_url: "http://localhost:8545".to_string(),
            default_ecdsa_keyfile: None,
        }
    }
}

impl CsmConfig {
    pub fn new_at_path(path: PathBuf) -> Self {
        Self { path, ..Default::default() }
    }

    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config: Self = read_toml(&path.join(CONFIG_FILE))?;
        Ok(config)
    }

    /// Loads the config under `path`, starting from defaults when none was stored yet.
    pub fn load_or_default(path: PathBuf) -> Result<Self, ConfigError> {
        if path.join(CONFIG_FILE).exists() {
            Self::load(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::new_at_path(path))
        }
    }

    pub fn load_from_default_path() -> Result<Self, ConfigError> {
        Self::load_or_default(DEFAULT_CONFIG_PATH.to_owned())
    }

    pub fn store(&self) -> Result<(), ConfigError> {
        write_toml(&self.get_file(), self)?;
        Ok(())
    }

    pub fn get_dir(&self) -> PathBuf {
        self.path.clone()
    }

    pub fn get_file(&self) -> PathBuf {
        self.path.join(CONFIG_FILE)
    }

    pub fn set_default_rpc_url(&mut self, chain: Chain, rpc: &str) -> Result<(), ConfigError> {
        match chain {
            Chain::Mainnet => self.mainnet_rpc_url = rpc.to_string(),
            Chain::Holesky => self.holesky_rpc_url = rpc.to_string(),
            Chain::AnvilHardhat => self.local_rpc_url = rpc.to_string(),
            _ => return Err(ConfigError::UnsupportedChain(chain)),
        }
        info!("Set {chain} rpc url to {rpc}");
        Ok(())
    }

    pub fn get_default_rpc_url(&self, chain: Chain) -> Result<String, ConfigError> {
        match chain {
            Chain::Mainnet => Ok(self.mainnet_rpc_url.clone()),
            Chain::Holesky => Ok(self.holesky_rpc_url.clone()),
            Chain::AnvilHardhat => Ok(self.local_rpc_url.clone()),
            _ => Err(ConfigError::UnsupportedChain(chain)),
        }
    }

    /// Decrypts the default keyfile, reading the password from its environment variable and
    /// prompting for it when the variable is unset.
    pub fn wallet(&self) -> Result<CsmWallet, Error> {
        let keyfile = self.default_ecdsa_keyfile.as_ref().ok_or(Error::NoKeyfile)?;
        match keyfile.decrypt_env() {
            Ok(wallet) => Ok(wallet),
            Err(KeyfileError::EnvVarError(..)) => {
                let password = Password::new()
                    .with_prompt(format!("Enter the password for keyfile {}", keyfile.name))
                    .interact()?;
                Ok(keyfile.decrypt(password)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    ConfigIo(#[from] IoError),
    #[error(transparent)]
    WalletError(#[from] CsmWalletError),
    #[error("Chain {0} has no configurable rpc url")]
    UnsupportedChain(Chain),
}

/// Maps the network names accepted on the command line to chains.
pub fn parse_network(network: &str) -> Result<Chain, Error> {
    match network.to_lowercase().as_str() {
        "mainnet" => Ok(Chain::Mainnet),
        "holesky" => Ok(Chain::Holesky),
        "local" | "anvil" => Ok(Chain::AnvilHardhat),
        other => Err(Error::ChainParseError(other.to_string())),
    }
}

pub async fn parse_config_subcommands(
    subcmd: ConfigCommands,
    config: &mut CsmConfig,
) -> Result<(), Error> {
    match subcmd {
        ConfigCommands::SetRpc { network, rpc_url } => {
            config.set_default_rpc_url(parse_network(&network)?, &rpc_url)?;
            config.store()?;
        }
        ConfigCommands::GetRpc { network } => {
            let chain = parse_network(&network)?;
            println!("Url for {chain} is {}", config.get_default_rpc_url(chain)?);
        }
        ConfigCommands::ImportKey { private_key, keyname, password } => {
            let wallet = CsmWallet::from_private_key(private_key)?;
            store_default_key(config, &wallet, keyname, password)?;
        }
        ConfigCommands::CreateKey { store, keyname, password } => {
            let wallet = CsmWallet::new();
            println!("Please back up your private key in a safe place!");
            println!("Private key: {}", wallet.to_private_key());
            println!("Public Address: {:?}", wallet.address());
            if store {
                store_default_key(config, &wallet, keyname, password)?;
            }
        }
        ConfigCommands::SetKeyfile { path, pw_env_var, name } => {
            let name = name.unwrap_or_else(|| keyfile_stem(&path));
            let keyfile = load_ecdsa_keyfile(path, &name, &pw_env_var)?;
            println!("Default signer set to {:?}", keyfile.address);
            config.default_ecdsa_keyfile = Some(keyfile);
            config.store()?;
        }
        ConfigCommands::Get => {
            println!("{config:#?}");
        }
    }
    Ok(())
}

fn store_default_key(
    config: &mut CsmConfig,
    wallet: &CsmWallet,
    keyname: Option<String>,
    password: Option<String>,
) -> Result<(), Error> {
    let keyname = match keyname {
        Some(name) => name,
        None => Input::new().with_prompt("Enter a name for the key").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Enter a password to encrypt the private key")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    csm_io::create_dir_all(&config.get_dir()).map_err(ConfigError::from)?;
    let path = wallet
        .encrypt_and_store(&config.get_dir(), format!("{keyname}.json"), password)
        .map_err(ConfigError::from)?;
    println!("Key for {:?} stored at {}", wallet.address(), path.display());

    let pw_env_var = format!("CSM_{}_PASSWORD", keyname.to_uppercase().replace('-', "_"));
    println!("Export {pw_env_var} to sign without a password prompt");
    config.default_ecdsa_keyfile =
        Some(EcdsaKeyfile::new(path, wallet.address(), &keyname, &pw_env_var));
    config.store()?;
    Ok(())
}

fn keyfile_stem(path: &std::path::Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}
