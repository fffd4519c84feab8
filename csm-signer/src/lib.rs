use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use async_trait::async_trait;
use csm_io::{create_dir_all, read_json, write_json, IoError};
use ethers::{
    core::{
        rand::thread_rng,
        types::Signature,
        utils::hex,
    },
    signers::{LocalWallet, Signer, WalletError},
    types::{
        transaction::{eip2718::TypedTransaction, eip712::Eip712},
        Address,
    },
};
use serde_json::{Map, Value};
use tracing::debug;

pub mod keyfile;
pub mod permit;
pub mod sign_utils;

/// Local ECDSA signer. It signs node operator manager transactions and stETH/wstETH bond
/// permits, and it is the signer bound into the bindings' `SignerMiddleware`.
#[derive(Clone, Debug, PartialEq)]
pub struct CsmWallet {
    local_wallet: LocalWallet,
}

#[derive(thiserror::Error, Debug)]
pub enum CsmWalletError {
    #[error(transparent)]
    WalletError(#[from] WalletError),
    #[error(transparent)]
    IoError(#[from] IoError),
}

impl CsmWallet {
    /// Fresh random key.
    pub fn new() -> Self {
        Self { local_wallet: LocalWallet::new(&mut thread_rng()) }
    }

    /// Accepts the hex key with or without a `0x` prefix, as wallets export it either way.
    pub fn from_private_key(private_key: String) -> Result<Self, CsmWalletError> {
        let key = private_key.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);
        Ok(Self { local_wallet: LocalWallet::from_str(key)? })
    }

    pub fn from_keystore(path: PathBuf, password: &str) -> Result<Self, CsmWalletError> {
        debug!("Decrypting keystore {}", path.display());
        Ok(Self { local_wallet: LocalWallet::decrypt_keystore(path, password)? })
    }

    /// Writes the key as an encrypted V3 keystore at `dir/name`. The plain address is added to
    /// the file the way geth does, so the signer can be identified without the password.
    pub fn encrypt_and_store(
        &self,
        dir: &Path,
        name: String,
        password: String,
    ) -> Result<PathBuf, CsmWalletError> {
        create_dir_all(dir)?;
        let secret = self.local_wallet.signer().to_bytes();
        LocalWallet::encrypt_keystore(dir, &mut thread_rng(), secret, &password, Some(&name))?;

        let path = dir.join(name);
        tag_keystore_address(&path, self.address())?;
        Ok(path)
    }

    pub fn to_private_key(&self) -> String {
        hex::encode(self.local_wallet.signer().to_bytes())
    }

    pub fn signer(&self) -> LocalWallet {
        self.local_wallet.clone()
    }

    pub fn address(&self) -> Address {
        self.local_wallet.address()
    }
}

impl Default for CsmWallet {
    fn default() -> Self {
        Self::new()
    }
}

fn tag_keystore_address(path: &Path, address: Address) -> Result<(), IoError> {
    let mut keystore: Map<String, Value> = read_json(path)?;
    keystore.insert("address".to_string(), Value::String(hex::encode(address)));
    write_json(path, &keystore)
}

#[async_trait]
impl Signer for CsmWallet {
    type Error = WalletError;

    fn address(&self) -> Address {
        self.local_wallet.address()
    }

    fn chain_id(&self) -> u64 {
        self.local_wallet.chain_id()
    }

    fn with_chain_id<T: Into<u64>>(self, chain_id: T) -> Self {
        Self { local_wallet: self.local_wallet.with_chain_id(chain_id) }
    }

    async fn sign_message<S: Send + Sync + AsRef<[u8]>>(
        &self,
        message: S,
    ) -> Result<Signature, Self::Error> {
        self.local_wallet.sign_message(message).await
    }

    async fn sign_transaction(&self, tx: &TypedTransaction) -> Result<Signature, Self::Error> {
        self.local_wallet.sign_transaction(tx).await
    }

    async fn sign_typed_data<T: Eip712 + Send + Sync>(
        &self,
        payload: &T,
    ) -> Result<Signature, Self::Error> {
        self.local_wallet.sign_typed_data(payload).await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_private_key_prefix_is_optional() {
        let wallet = CsmWallet::new();
        let exported = wallet.to_private_key();
        assert_eq!(exported.len(), 64);
        assert!(exported.chars().all(|c| c.is_ascii_hexdigit()));
        let bare = CsmWallet::from_private_key(exported).unwrap();
        let prefixed =
            CsmWallet::from_private_key(format!("0x{}\n", wallet.to_private_key())).unwrap();
        assert_eq!(bare.address(), wallet.address());
        assert_eq!(prefixed.address(), wallet.address());
    }

    #[test]
    fn test_keystore_round_trip_in_new_dir() {
        let dir = tempdir().unwrap();
        let keys_dir = dir.path().join("keys");
        let wallet = CsmWallet::new();
        let path = wallet
            .encrypt_and_store(&keys_dir, "manager.json".to_string(), "hunter22".to_string())
            .unwrap();
        assert_eq!(path, keys_dir.join("manager.json"));

        let restored = CsmWallet::from_keystore(path.clone(), "hunter22").unwrap();
        assert_eq!(restored.address(), wallet.address());
        assert!(CsmWallet::from_keystore(path, "wrong").is_err());
    }

    #[test]
    fn test_keystore_is_tagged_with_address() {
        let dir = tempdir().unwrap();
        let wallet = CsmWallet::new();
        let path = wallet
            .encrypt_and_store(dir.path(), "reward.json".to_string(), "pw".to_string())
            .unwrap();
        let stored: Map<String, Value> = read_json(&path).unwrap();
        assert_eq!(stored["address"], Value::String(hex::encode(wallet.address())));
        assert!(stored.contains_key("crypto"));
    }

    #[test]
    fn test_chain_id_binding() {
        let wallet = CsmWallet::new().with_chain_id(17000u64);
        assert_eq!(wallet.chain_id(), 17000);
    }
}
