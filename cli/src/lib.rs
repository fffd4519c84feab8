use csm_bindings::{CsModule, CsmProvider};
use ethers::types::TransactionReceipt;
use serde::Serialize;

pub mod bond;
pub mod config;
pub mod error;
pub mod events;
pub mod keys;
pub mod module;
pub mod operator;
pub mod provider;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), error::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the transaction hash and every module event the transaction emitted.
pub fn print_receipt(
    module: &CsModule<CsmProvider>,
    receipt: &TransactionReceipt,
) -> Result<(), error::Error> {
    println!("Transaction {:?} in block {:?}", receipt.transaction_hash, receipt.block_number);
    for record in module.receipt_records(receipt) {
        print_json(&record)?;
    }
    Ok(())
}
