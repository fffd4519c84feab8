use std::{error::Error, fmt};

use proc_macro::TokenStream;
use quote::quote;

const ADDRESS_HEX_LENGTH: usize = 40;

#[derive(Debug, PartialEq, Eq)]
enum HexError {
    InvalidCharacter(char),
    InvalidStringLength(usize),
}

impl Error for HexError {}

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidCharacter(char) => write!(f, "invalid hex character {char}"),
            Self::InvalidStringLength(length) => {
                write!(f, "address must be {ADDRESS_HEX_LENGTH} hex digits, got {length}")
            }
        }
    }
}

fn decode_address(input: &str) -> Result<[u8; 20], HexError> {
    let hex = input.trim();
    let hex = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")).unwrap_or(hex);
    if hex.len() != ADDRESS_HEX_LENGTH {
        return Err(HexError::InvalidStringLength(hex.len()));
    }

    let nibble = |char: u8| -> Result<u8, HexError> {
        match char {
            b'A'..=b'F' => Ok(char - b'A' + 10),
            b'a'..=b'f' => Ok(char - b'a' + 10),
            b'0'..=b'9' => Ok(char - b'0'),
            _ => Err(HexError::InvalidCharacter(char as char)),
        }
    };

    let mut bytes = [0u8; 20];
    for (byte, chunk) in bytes.iter_mut().zip(hex.as_bytes().chunks(2)) {
        *byte = nibble(chunk[0])? << 4 | nibble(chunk[1])?;
    }
    Ok(bytes)
}

/// Expands an unquoted `0x`-prefixed address literal into an `ethers::types::H160` constant
/// expression. Malformed literals are rejected at compile time.
#[proc_macro]
pub fn h160(input: TokenStream) -> TokenStream {
    match decode_address(&input.to_string()) {
        Ok(bytes) => quote! { ::ethers::types::H160([#(#bytes,)*]) }.into(),
        Err(e) => {
            let message = e.to_string();
            quote! { compile_error!(#message) }.into()
        }
    }
}
