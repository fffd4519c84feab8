use std::sync::Arc;

use ethers::{
    abi::{encode, Token},
    providers::{MockProvider, Provider},
    types::{Address, Bytes},
};

use crate::contracts::CSModuleAbi;

pub(crate) type MockModule = CSModuleAbi<Provider<MockProvider>>;

pub(crate) fn module_address() -> Address {
    Address::repeat_byte(0xcc)
}

pub(crate) fn mocked_module() -> (MockModule, MockProvider) {
    let (provider, mock) = Provider::mocked();
    (CSModuleAbi::new(module_address(), Arc::new(provider)), mock)
}

/// Queues the ABI encoding of `tokens` as the next `eth_call` result. Responses are served last
/// in, first out.
pub(crate) fn push_response(mock: &MockProvider, tokens: &[Token]) {
    mock.push::<Bytes, _>(Bytes::from(encode(tokens))).unwrap();
}
