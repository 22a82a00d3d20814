//! # RustCrypto-based Cryptography Provider for hsneg
//!
//! Implements [`hsneg_crypto::CryptoProvider`] on top of the RustCrypto
//! crates.
//!
//! ## Supported Algorithms
//!
//! - **Hash**: SHA-256, SHA-384, SHA-512 (`sha2`)
//! - **Key Exchange**: X25519 (`x25519-dalek`), ECDH P-256 / P-384
//!   (`p256`, `p384`), FFDHE 2048-8192 per RFC 7919 (`num-bigint`)
//! - **RNG**: OS entropy via `rand::rngs::OsRng`
//!
//! X448 and secp521r1 are not provided; groups built on them are reported
//! unavailable by [`CryptoProvider::supports_key_exchange`].
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hsneg_crypto::CryptoProvider;
//! use hsneg_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider = RustCryptoProvider::new();
//! assert!(provider.supports_key_exchange(hsneg_crypto::KeyExchangeAlgorithm::X25519));
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use hsneg_crypto::{CryptoProvider, Hash, HashAlgorithm, KeyExchange, KeyExchangeAlgorithm, Random, Result};

pub mod ffdhe;
pub mod hash;
pub mod kex;
pub mod random;

use random::OsRandom;

/// Cryptography provider using RustCrypto implementations.
///
/// This provider is `Send + Sync` and can be safely shared across threads.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    random: OsRandom,
}

impl CryptoProvider for RustCryptoProvider {
    fn new() -> Self {
        Self { random: OsRandom }
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
        kex::create_key_exchange(algorithm)
    }
}
