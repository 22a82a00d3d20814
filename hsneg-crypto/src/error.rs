//! Provider failures.
//!
//! Negotiation code converts these into its own error type; only the
//! distinction between a bad peer key and a local failure matters there.

use std::fmt;

/// Shorthand used by every provider trait.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a provider call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provider does not implement the named primitive.
    UnsupportedAlgorithm(String),

    /// A peer key_exchange value does not decode for its group.
    InvalidPublicKey,

    /// A locally held ephemeral key is unusable.
    InvalidPrivateKey,

    /// The agreement produced a degenerate secret.
    KeyExchangeFailed,

    /// The entropy source refused to produce bytes.
    RandomGenerationFailed,
}

impl Error {
    /// True when the failure was caused by bytes the peer sent.
    pub fn is_peer_error(&self) -> bool {
        matches!(self, Error::InvalidPublicKey)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Error::UnsupportedAlgorithm(what) => return write!(f, "unsupported by provider: {}", what),
            Error::InvalidPublicKey => "peer public key rejected",
            Error::InvalidPrivateKey => "ephemeral private key unusable",
            Error::KeyExchangeFailed => "key agreement yielded no secret",
            Error::RandomGenerationFailed => "entropy source unavailable",
        };
        f.write_str(text)
    }
}

impl std::error::Error for Error {}
