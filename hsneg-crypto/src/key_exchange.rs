//! Ephemeral key agreement behind key_share groups.

use crate::Result;
use zeroize::Zeroize;

/// Primitive behind a TLS named group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyExchangeAlgorithm {
    /// NIST P-256
    Secp256r1,
    /// NIST P-384
    Secp384r1,
    /// NIST P-521
    Secp521r1,
    /// Curve25519
    X25519,
    /// Curve448
    X448,
    /// RFC 7919 2048-bit group
    Ffdhe2048,
    /// RFC 7919 3072-bit group
    Ffdhe3072,
    /// RFC 7919 4096-bit group
    Ffdhe4096,
    /// RFC 7919 6144-bit group
    Ffdhe6144,
    /// RFC 7919 8192-bit group
    Ffdhe8192,
}

/// Elliptic curve or finite field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeFamily {
    /// ECDHE, Montgomery curves included
    Ecdhe,
    /// FFDHE
    Ffdhe,
}

struct Params {
    codepoint: u16,
    name: &'static str,
    share_len: usize,
    bits: u32,
    family: KeyExchangeFamily,
}

const fn ec(codepoint: u16, name: &'static str, share_len: usize, bits: u32) -> Params {
    Params { codepoint, name, share_len, bits, family: KeyExchangeFamily::Ecdhe }
}

// Shares are the big-endian public value left-padded to the prime length.
const fn ff(codepoint: u16, name: &'static str, bits: u32) -> Params {
    Params {
        codepoint,
        name,
        share_len: (bits / 8) as usize,
        bits,
        family: KeyExchangeFamily::Ffdhe,
    }
}

impl KeyExchangeAlgorithm {
    /// Every algorithm, ordered by codepoint.
    pub const ALL: [KeyExchangeAlgorithm; 10] = [
        Self::Secp256r1,
        Self::Secp384r1,
        Self::Secp521r1,
        Self::X25519,
        Self::X448,
        Self::Ffdhe2048,
        Self::Ffdhe3072,
        Self::Ffdhe4096,
        Self::Ffdhe6144,
        Self::Ffdhe8192,
    ];

    const fn params(self) -> Params {
        match self {
            // NIST curves travel as uncompressed SEC1 points.
            Self::Secp256r1 => ec(0x0017, "secp256r1", 1 + 2 * 32, 256),
            Self::Secp384r1 => ec(0x0018, "secp384r1", 1 + 2 * 48, 384),
            Self::Secp521r1 => ec(0x0019, "secp521r1", 1 + 2 * 66, 521),
            Self::X25519 => ec(0x001D, "x25519", 32, 255),
            Self::X448 => ec(0x001E, "x448", 56, 448),
            Self::Ffdhe2048 => ff(0x0100, "ffdhe2048", 2048),
            Self::Ffdhe3072 => ff(0x0101, "ffdhe3072", 3072),
            Self::Ffdhe4096 => ff(0x0102, "ffdhe4096", 4096),
            Self::Ffdhe6144 => ff(0x0103, "ffdhe6144", 6144),
            Self::Ffdhe8192 => ff(0x0104, "ffdhe8192", 8192),
        }
    }

    /// Length of a key_share `key_exchange` value.
    pub const fn public_key_size(self) -> usize {
        self.params().share_len
    }

    /// Length of the agreed secret.
    ///
    /// ECDHE yields the x-coordinate, FFDHE the padded group element.
    pub const fn shared_secret_size(self) -> usize {
        match self {
            Self::Secp256r1 | Self::Secp384r1 | Self::Secp521r1 => (self.public_key_size() - 1) / 2,
            _ => self.public_key_size(),
        }
    }

    /// Group size in bits, compared against key size constraints.
    pub const fn key_bits(self) -> u32 {
        self.params().bits
    }

    /// ECDHE or FFDHE.
    pub const fn family(self) -> KeyExchangeFamily {
        self.params().family
    }

    /// supported_groups codepoint.
    pub const fn iana_codepoint(self) -> u16 {
        self.params().codepoint
    }

    /// Reverse of [`iana_codepoint`](Self::iana_codepoint).
    pub const fn from_u16(value: u16) -> Option<Self> {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i].iana_codepoint() == value {
                return Some(Self::ALL[i]);
            }
            i += 1;
        }
        None
    }

    /// Named group name.
    pub const fn name(self) -> &'static str {
        self.params().name
    }
}

macro_rules! secret_bytes {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Zeroize)]
        #[zeroize(drop)]
        pub struct $name {
            bytes: Vec<u8>,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($name), "({} bytes, redacted)"), self.bytes.len())
            }
        }

        impl $name {
            /// Take ownership of raw key material.
            pub fn from_bytes(bytes: Vec<u8>) -> Self {
                Self { bytes }
            }

            /// Raw key material.
            pub fn as_bytes(&self) -> &[u8] {
                &self.bytes
            }
        }
    };
}

secret_bytes! {
    /// Ephemeral private value, wiped on drop.
    PrivateKey
}

secret_bytes! {
    /// Agreed secret handed to the key schedule, wiped on drop.
    SharedSecret
}

/// Public value exactly as it appears in a key_share entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Wrap an encoded share.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The encoded share.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Key agreement for a single group.
///
/// ```rust,no_run
/// use hsneg_crypto::{KeyExchange, Result, SharedSecret};
///
/// fn agree(kex: &dyn KeyExchange, peer_share: &[u8]) -> Result<(Vec<u8>, SharedSecret)> {
///     kex.check_public_key(peer_share)?;
///     let (private, public) = kex.generate_keypair()?;
///     Ok((public.as_bytes().to_vec(), kex.exchange(&private, peer_share)?))
/// }
/// ```
pub trait KeyExchange: Send + Sync {
    /// Fresh ephemeral pair; the public half is wire encoded.
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)>;

    /// Combine our private value with the peer's share.
    ///
    /// `InvalidPublicKey` for a malformed share, `KeyExchangeFailed` for a
    /// degenerate result.
    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret>;

    /// Validate a peer share (length, curve membership, range).
    fn check_public_key(&self, peer_public_key: &[u8]) -> Result<()>;

    /// Group implemented here.
    fn algorithm(&self) -> KeyExchangeAlgorithm;

    /// Expected share length.
    fn public_key_size(&self) -> usize {
        self.algorithm().public_key_size()
    }
}
