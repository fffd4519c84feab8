use super::CsmWallet;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use std::{env, path::PathBuf};

/// Pointer to an encrypted ECDSA keyfile plus the name of the environment variable that holds
/// its password. The password itself is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EcdsaKeyfile {
    pub path: PathBuf,
    pub address: Address,
    pub name: String,
    pub pw_env_var: String,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyfileError {
    #[error("Could not decrypt keyfile {0}")]
    KeyfileDecryptionError(String),
    #[error("Password variable {1} for keyfile {0} is neither exported nor in .env")]
    EnvVarError(String, String),
}

impl EcdsaKeyfile {
    pub fn new(path: PathBuf, address: Address, name: &str, pw_env_var: &str) -> Self {
        Self { path, address, name: name.to_owned(), pw_env_var: pw_env_var.to_owned() }
    }

    pub fn decrypt(&self, password: String) -> Result<CsmWallet, KeyfileError> {
        CsmWallet::from_keystore(self.path.clone(), &password)
            .map_err(|_| KeyfileError::KeyfileDecryptionError(self.path.display().to_string()))
    }

    /// Exported variables win over `.env` entries.
    pub fn decrypt_env(&self) -> Result<CsmWallet, KeyfileError> {
        let password = env::var(&self.pw_env_var)
            .or_else(|_| dotenvy::var(&self.pw_env_var))
            .map_err(|_| KeyfileError::EnvVarError(self.name.clone(), self.pw_env_var.clone()))?;
        self.decrypt(password)
    }
}

/// Registers an existing keystore. It is decrypted once, which checks the password variable
/// and yields the signer address recorded in the config.
pub fn load_ecdsa_keyfile(
    path: PathBuf,
    name: &str,
    pw_env_var: &str,
) -> Result<EcdsaKeyfile, KeyfileError> {
    let unverified = EcdsaKeyfile::new(path, Address::zero(), name, pw_env_var);
    let address = unverified.decrypt_env()?.address();
    Ok(EcdsaKeyfile { address, ..unverified })
}
