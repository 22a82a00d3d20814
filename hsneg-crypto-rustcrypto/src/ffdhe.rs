//! Finite field Diffie-Hellman over the RFC 7919 named groups.
//!
//! The safe primes are derived from their published definition
//!
//! ```text
//! p = 2^b - 2^(b-64) + {[2^(b-130) e] + X} * 2^64 - 1
//! ```
//!
//! where `e` is Euler's number, `[.]` is the floor and `X` is the
//! per-group constant from RFC 7919 Appendix A. The generator is 2.

use std::sync::OnceLock;

use hsneg_crypto::{
    key_exchange::{KeyExchangeAlgorithm, PrivateKey, PublicKey, SharedSecret},
    Error, KeyExchange, Random, Result,
};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::random::OsRandom;

/// Extra precision carried while summing the series for `e`.
const GUARD_BITS: usize = 64;

/// Parameters of one RFC 7919 group.
#[derive(Debug)]
struct GroupParams {
    bits: usize,
    x: u64,
    /// Private exponent size in bits (RFC 7919 Section 5.2 minimums).
    exponent_bits: usize,
}

const fn params(algorithm: KeyExchangeAlgorithm) -> Option<GroupParams> {
    match algorithm {
        KeyExchangeAlgorithm::Ffdhe2048 => Some(GroupParams { bits: 2048, x: 560316, exponent_bits: 225 }),
        KeyExchangeAlgorithm::Ffdhe3072 => Some(GroupParams { bits: 3072, x: 2625351, exponent_bits: 275 }),
        KeyExchangeAlgorithm::Ffdhe4096 => Some(GroupParams { bits: 4096, x: 5736041, exponent_bits: 325 }),
        KeyExchangeAlgorithm::Ffdhe6144 => Some(GroupParams { bits: 6144, x: 15705020, exponent_bits: 375 }),
        KeyExchangeAlgorithm::Ffdhe8192 => Some(GroupParams { bits: 8192, x: 10965728, exponent_bits: 400 }),
        _ => None,
    }
}

/// Returns `floor(2^k * e)`.
fn scaled_e(k: usize) -> BigUint {
    // e = sum 1/n!, each term truncated with GUARD_BITS of headroom
    let mut term = BigUint::one() << (k + GUARD_BITS);
    let mut sum = BigUint::zero();
    let mut n = 1u32;
    while !term.is_zero() {
        sum += &term;
        term /= n;
        n += 1;
    }
    sum >> GUARD_BITS
}

fn derive_prime(bits: usize, x: u64) -> BigUint {
    let one = BigUint::one();
    let high = (&one << bits) - (&one << (bits - 64));
    let middle = (scaled_e(bits - 130) + BigUint::from(x)) << 64;
    high + middle - one
}

fn prime_for(algorithm: KeyExchangeAlgorithm, group: &GroupParams) -> &'static BigUint {
    static P2048: OnceLock<BigUint> = OnceLock::new();
    static P3072: OnceLock<BigUint> = OnceLock::new();
    static P4096: OnceLock<BigUint> = OnceLock::new();
    static P6144: OnceLock<BigUint> = OnceLock::new();
    static P8192: OnceLock<BigUint> = OnceLock::new();

    let cell = match algorithm {
        KeyExchangeAlgorithm::Ffdhe2048 => &P2048,
        KeyExchangeAlgorithm::Ffdhe3072 => &P3072,
        KeyExchangeAlgorithm::Ffdhe4096 => &P4096,
        KeyExchangeAlgorithm::Ffdhe6144 => &P6144,
        _ => &P8192,
    };
    cell.get_or_init(|| derive_prime(group.bits, group.x))
}

/// Left-pads `value` to `len` bytes, big-endian.
fn to_fixed_be(value: &BigUint, len: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    let mut out = vec![0u8; len.saturating_sub(raw.len())];
    out.extend_from_slice(&raw);
    out
}

/// FFDHE key exchange for a single RFC 7919 group.
#[derive(Debug)]
pub struct Ffdhe {
    algorithm: KeyExchangeAlgorithm,
    prime: &'static BigUint,
    exponent_bits: usize,
}

impl Ffdhe {
    /// Creates the key exchange for `algorithm`, which must be an FFDHE group.
    pub fn new(algorithm: KeyExchangeAlgorithm) -> Result<Self> {
        let group = params(algorithm).ok_or_else(|| {
            Error::UnsupportedAlgorithm(format!("{} is not a finite field group", algorithm.name()))
        })?;
        Ok(Self {
            algorithm,
            prime: prime_for(algorithm, &group),
            exponent_bits: group.exponent_bits,
        })
    }

    /// The group prime.
    pub fn prime(&self) -> &BigUint {
        self.prime
    }

    fn prime_len(&self) -> usize {
        self.algorithm.public_key_size()
    }

    /// Decodes `y`, requiring the full prime-length encoding and `1 < y < p-1`.
    fn decode_public(&self, bytes: &[u8]) -> Result<BigUint> {
        if bytes.len() != self.prime_len() {
            return Err(Error::InvalidPublicKey);
        }
        let y = BigUint::from_bytes_be(bytes);
        let upper = self.prime - BigUint::one();
        if y <= BigUint::one() || y >= upper {
            return Err(Error::InvalidPublicKey);
        }
        Ok(y)
    }
}

impl KeyExchange for Ffdhe {
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)> {
        let len = (self.exponent_bits + 7) / 8;
        let mut exponent_bytes = vec![0u8; len];
        let exponent = loop {
            OsRandom.fill(&mut exponent_bytes)?;
            let candidate = BigUint::from_bytes_be(&exponent_bytes);
            if candidate > BigUint::one() {
                break candidate;
            }
        };

        let public = BigUint::from(2u32).modpow(&exponent, self.prime);
        Ok((
            PrivateKey::from_bytes(exponent_bytes),
            PublicKey::from_bytes(to_fixed_be(&public, self.prime_len())),
        ))
    }

    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret> {
        if private_key.as_bytes().is_empty() {
            return Err(Error::InvalidPrivateKey);
        }
        let y = self.decode_public(peer_public_key)?;
        let exponent = BigUint::from_bytes_be(private_key.as_bytes());
        let shared = y.modpow(&exponent, self.prime);
        if shared <= BigUint::one() {
            return Err(Error::KeyExchangeFailed);
        }
        // RFC 8446 7.4.1: padded with leading zeros to the size of the prime
        Ok(SharedSecret::from_bytes(to_fixed_be(&shared, self.prime_len())))
    }

    fn check_public_key(&self, peer_public_key: &[u8]) -> Result<()> {
        self.decode_public(peer_public_key).map(|_| ())
    }

    fn algorithm(&self) -> KeyExchangeAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffdhe2048_prime_matches_rfc7919() {
        let kex = Ffdhe::new(KeyExchangeAlgorithm::Ffdhe2048).unwrap();
        let hex = kex.prime().to_str_radix(16);
        assert_eq!(kex.prime().bits(), 2048);
        assert!(hex.starts_with("ffffffffffffffffadf85458a2bb4a9a"), "{}", &hex[..32]);
        assert!(hex.ends_with("886b423861285c97ffffffffffffffff"), "{}", &hex[hex.len() - 32..]);
    }

    #[test]
    fn test_all_primes_have_declared_size() {
        for alg in [
            KeyExchangeAlgorithm::Ffdhe3072,
            KeyExchangeAlgorithm::Ffdhe4096,
            KeyExchangeAlgorithm::Ffdhe6144,
            KeyExchangeAlgorithm::Ffdhe8192,
        ] {
            let kex = Ffdhe::new(alg).unwrap();
            assert_eq!(kex.prime().bits() as usize, alg.public_key_size() * 8);
            let hex = kex.prime().to_str_radix(16);
            assert!(hex.starts_with("ffffffffffffffffadf85458a2bb4a9a"));
            assert!(hex.ends_with("ffffffffffffffff"));
        }
    }

    #[test]
    fn test_ffdhe2048_agreement() {
        let kex = Ffdhe::new(KeyExchangeAlgorithm::Ffdhe2048).unwrap();
        let (a_priv, a_pub) = kex.generate_keypair().unwrap();
        let (b_priv, b_pub) = kex.generate_keypair().unwrap();

        assert_eq!(a_pub.as_bytes().len(), 256);
        let a = kex.exchange(&a_priv, b_pub.as_bytes()).unwrap();
        let b = kex.exchange(&b_priv, a_pub.as_bytes()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.as_bytes().len(), 256);
    }

    #[test]
    fn test_public_value_range_checks() {
        let kex = Ffdhe::new(KeyExchangeAlgorithm::Ffdhe2048).unwrap();

        let mut one = vec![0u8; 256];
        one[255] = 1;
        assert_eq!(kex.check_public_key(&one), Err(Error::InvalidPublicKey));

        let p_minus_one = to_fixed_be(&(kex.prime() - BigUint::one()), 256);
        assert_eq!(kex.check_public_key(&p_minus_one), Err(Error::InvalidPublicKey));

        let mut two = vec![0u8; 256];
        two[255] = 2;
        assert!(kex.check_public_key(&two).is_ok());

        // short encodings are rejected even when the value is in range
        assert_eq!(kex.check_public_key(&[2u8]), Err(Error::InvalidPublicKey));
    }

    #[test]
    fn test_non_ffdhe_algorithm_rejected() {
        assert!(Ffdhe::new(KeyExchangeAlgorithm::X25519).is_err());
    }
}
