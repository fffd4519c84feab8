use csm_macros::h160;
use ethers::types::{Address, Chain};

use crate::error::{CsmError, Result};

// Lido CSM deployments:
// https://docs.lido.fi/deployed-contracts/#community-staking-module

/// Addresses of the contracts a node operator touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub module: Address,
    pub accounting: Address,
    pub steth: Address,
    pub wsteth: Address,
}

impl Deployment {
    pub fn for_chain(chain: Chain) -> Result<Self> {
        match chain {
            Chain::Mainnet => Ok(Self {
                module: h160!(0xdA7dE2ECdDfccC6c3AF10108Db212ACBBf9EA83F),
                accounting: h160!(0x4d72BFF1BeaC69925F8Bd12526a39BAAb069e5Da),
                steth: h160!(0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84),
                wsteth: h160!(0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0),
            }),
            Chain::Holesky => Ok(Self {
                module: h160!(0x4562c3e63c2e586cD1651B958C22F88135aCAd4f),
                accounting: h160!(0xc093e53e8F4b55A223c18A2Da6fA00e60DD5EFE1),
                steth: h160!(0x3F1c547b21f65e10480dE3ad8E19fAAC46C95034),
                wsteth: h160!(0x8d09a4502Cc8Cf1547aD300E066060D043f6982D),
            }),
            Chain::AnvilHardhat => Ok(Self {
                module: local_address("LOCALHOST_CSMODULE")?,
                accounting: local_address("LOCALHOST_CSACCOUNTING")?,
                steth: local_address("LOCALHOST_STETH")?,
                wsteth: local_address("LOCALHOST_WSTETH")?,
            }),
            _ => Err(CsmError::ChainNotSupported(chain)),
        }
    }
}

pub fn module(chain: Chain) -> Result<Address> {
    Ok(Deployment::for_chain(chain)?.module)
}

pub fn accounting(chain: Chain) -> Result<Address> {
    Ok(Deployment::for_chain(chain)?.accounting)
}

fn local_address(var: &str) -> Result<Address> {
    std::env::var(var)
        .ok()
        .and_then(|address| address.parse().ok())
        .ok_or_else(|| CsmError::LocalAddress(var.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_chains_resolve() {
        let mainnet = Deployment::for_chain(Chain::Mainnet).unwrap();
        let holesky = Deployment::for_chain(Chain::Holesky).unwrap();
        assert_eq!(
            mainnet.module,
            "0xdA7dE2ECdDfccC6c3AF10108Db212ACBBf9EA83F".parse::<Address>().unwrap()
        );
        assert_ne!(mainnet.module, holesky.module);
        assert_ne!(mainnet.steth, mainnet.wsteth);
    }

    #[test]
    fn test_unsupported_chain() {
        let err = Deployment::for_chain(Chain::Sepolia).unwrap_err();
        assert!(matches!(err, CsmError::ChainNotSupported(Chain::Sepolia)));
    }

    #[test]
    fn test_local_addresses_from_env() {
        std::env::set_var("LOCALHOST_CSMODULE", "0x0000000000000000000000000000000000000001");
        std::env::set_var("LOCALHOST_CSACCOUNTING", "0x0000000000000000000000000000000000000002");
        std::env::set_var("LOCALHOST_STETH", "0x0000000000000000000000000000000000000003");
        std::env::set_var("LOCALHOST_WSTETH", "not an address");

        let err = Deployment::for_chain(Chain::AnvilHardhat).unwrap_err();
        assert!(matches!(err, CsmError::LocalAddress(var) if var == "LOCALHOST_WSTETH"));

        std::env::set_var("LOCALHOST_WSTETH", "0x0000000000000000000000000000000000000004");
        let local = Deployment::for_chain(Chain::AnvilHardhat).unwrap();
        assert_eq!(local.module, Address::from_low_u64_be(1));
        assert_eq!(local.wsteth, Address::from_low_u64_be(4));
    }
}
