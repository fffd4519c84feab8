pub mod accounting;
pub mod addresses;
pub mod client;
pub mod contracts;
pub mod error;
pub mod events;
pub mod keys;
pub mod operator;
pub mod permit;
pub mod provider;
pub mod queue;

pub use ethers;

pub use accounting::CsAccounting;
pub use client::CsModule;
pub use error::{CsmError, Result};
pub use provider::{connect_provider, connect_ws, CsmProvider, CsmProviderError};

#[cfg(test)]
pub(crate) mod test_utils;
