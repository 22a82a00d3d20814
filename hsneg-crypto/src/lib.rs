//! Crypto seam for the hsneg handshake negotiation core.
//!
//! `hsneg-core` asks a [`CryptoProvider`] for three things only: digests
//! (transcript hashes and cookie MACs), entropy (cookie secrets) and
//! ephemeral key agreement for key_share groups. Everything else about a
//! crypto backend stays outside negotiation.
//!
//! ```rust,ignore
//! use hsneg_crypto::{CryptoProvider, HashAlgorithm, KeyExchangeAlgorithm};
//!
//! fn share(provider: &dyn CryptoProvider) -> hsneg_crypto::Result<Vec<u8>> {
//!     let kex = provider.key_exchange(KeyExchangeAlgorithm::X25519)?;
//!     let (_private, public) = kex.generate_keypair()?;
//!     let _ch_hash = provider.digest(HashAlgorithm::Sha256, public.as_bytes())?;
//!     Ok(public.as_bytes().to_vec())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod error;
pub mod hash;
pub mod key_exchange;
pub mod random;

pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use key_exchange::{
    KeyExchange, KeyExchangeAlgorithm, KeyExchangeFamily, PrivateKey, PublicKey, SharedSecret,
};
pub use random::Random;

/// A crypto backend.
///
/// A single instance serves every connection of an `SslContext` and its
/// cookie manager, hence `Send + Sync + 'static`.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Construct the backend.
    fn new() -> Self
    where
        Self: Sized;

    /// Fresh digest state, or `UnsupportedAlgorithm`.
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// The backend's entropy source.
    fn random(&self) -> &dyn Random;

    /// Key agreement for one named group, or `UnsupportedAlgorithm`.
    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>>;

    /// Whether [`key_exchange`](Self::key_exchange) succeeds for `algorithm`.
    ///
    /// Named group availability is decided by this.
    fn supports_key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> bool {
        self.key_exchange(algorithm).is_ok()
    }

    /// Digest of a single buffer.
    fn digest(&self, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        let mut state = self.hash(algorithm)?;
        state.update(data);
        Ok(state.finalize())
    }
}
