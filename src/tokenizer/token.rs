use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One indexed term.
///
/// `position` is the document position of the `math` root the term comes
/// from. `position_increment` is what the search engine adds to its
/// running position before this token: the first token of a group
/// advances by the positions passed since the previous group, every other
/// token stays at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub term: String,
    pub weight: f32,
    pub position: usize,
    pub position_increment: u32,
}

/// CBOR payload of a token stream
pub fn encode_tokens(tokens: &[Token]) -> Result<Vec<u8>> {
    Ok(serde_cbor::to_vec(&tokens)?)
}

pub fn decode_tokens(bytes: &[u8]) -> Result<Vec<Token>> {
    Ok(serde_cbor::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_keeps_weights_and_positions() {
        let tokens = vec![
            Token {
                term: "r(i(a)o(+)i(b))".to_string(),
                weight: 0.2,
                position: 0,
                position_increment: 1,
            },
            Token {
                term: "i(c)".to_string(),
                weight: 0.343,
                position: 1,
                position_increment: 1,
            },
        ];
        let bytes = encode_tokens(&tokens).unwrap();
        assert_eq!(decode_tokens(&bytes).unwrap(), tokens);
        assert!(decode_tokens(&bytes[..bytes.len() - 1]).is_err());
    }
}
