//! Error types for mterm-tokenizer

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid tables, dictionaries or module options.
    /// Raised at construction time, the pipeline cannot run without them.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Markup rejected by the bundled parser
    #[error("Parse error: {0}")]
    Parse(String),

    /// CBOR snapshot encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_cbor::Error),
}

impl Error {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Parse(err.to_string())
    }
}
