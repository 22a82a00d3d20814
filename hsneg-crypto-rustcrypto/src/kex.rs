//! Key agreement backends: x25519-dalek, p256, p384 and the FFDHE groups.

use hsneg_crypto::{
    key_exchange::{KeyExchangeAlgorithm, PrivateKey, PublicKey, SharedSecret},
    Error, KeyExchange, Random, Result,
};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroize;

use crate::ffdhe::Ffdhe;
use crate::random::OsRandom;

/// Key agreement backend for `algorithm`.
///
/// X448 and secp521r1 have no backend here and report `UnsupportedAlgorithm`.
pub fn create_key_exchange(algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
    use KeyExchangeAlgorithm as A;

    let kex: Box<dyn KeyExchange> = match algorithm {
        A::X25519 => Box::new(X25519),
        A::Secp256r1 => Box::new(EcdhP256),
        A::Secp384r1 => Box::new(EcdhP384),
        A::X448 | A::Secp521r1 => {
            return Err(Error::UnsupportedAlgorithm(format!("{} key exchange", algorithm.name())))
        },
        ffdhe => Box::new(Ffdhe::new(ffdhe)?),
    };
    Ok(kex)
}

/// RFC 7748 X25519 over raw 32-byte u-coordinates.
///
/// An all-zero result means the peer sent a small-order point (RFC 8446
/// Section 7.4.2).
#[derive(Debug)]
struct X25519;

impl KeyExchange for X25519 {
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)> {
        let mut scalar = [0u8; 32];
        OsRandom.fill(&mut scalar)?;
        let share = x25519_dalek::x25519(scalar, x25519_dalek::X25519_BASEPOINT_BYTES);
        let private = PrivateKey::from_bytes(scalar.to_vec());
        scalar.zeroize();
        Ok((private, PublicKey::from_bytes(share.to_vec())))
    }

    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret> {
        self.check_public_key(peer_public_key)?;
        let mut scalar = <[u8; 32]>::try_from(private_key.as_bytes())
            .map_err(|_| Error::InvalidPrivateKey)?;
        let mut u = [0u8; 32];
        u.copy_from_slice(peer_public_key);

        let shared = x25519_dalek::x25519(scalar, u);
        scalar.zeroize();
        if shared == [0u8; 32] {
            return Err(Error::KeyExchangeFailed);
        }
        Ok(SharedSecret::from_bytes(shared.to_vec()))
    }

    fn check_public_key(&self, peer_public_key: &[u8]) -> Result<()> {
        match peer_public_key.len() {
            32 => Ok(()),
            _ => Err(Error::InvalidPublicKey),
        }
    }

    fn algorithm(&self) -> KeyExchangeAlgorithm {
        KeyExchangeAlgorithm::X25519
    }
}

// NIST curves: shares are uncompressed SEC1 points, the only form TLS 1.3
// allows, and the secret is the x-coordinate.
macro_rules! nist_ecdh {
    ($name:ident, $curve:ident, $algorithm:ident) => {
        #[derive(Debug)]
        struct $name;

        impl $name {
            fn peer_point(share: &[u8]) -> Result<$curve::PublicKey> {
                let expected = KeyExchangeAlgorithm::$algorithm.public_key_size();
                if share.len() != expected || share.first() != Some(&0x04) {
                    return Err(Error::InvalidPublicKey);
                }
                $curve::PublicKey::from_sec1_bytes(share).map_err(|_| Error::InvalidPublicKey)
            }
        }

        impl KeyExchange for $name {
            fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)> {
                let secret = $curve::SecretKey::random(&mut rand::rngs::OsRng);
                let share = secret.public_key().to_encoded_point(false);
                Ok((
                    PrivateKey::from_bytes(secret.to_bytes().to_vec()),
                    PublicKey::from_bytes(share.as_bytes().to_vec()),
                ))
            }

            fn exchange(
                &self,
                private_key: &PrivateKey,
                peer_public_key: &[u8],
            ) -> Result<SharedSecret> {
                let secret = $curve::SecretKey::from_slice(private_key.as_bytes())
                    .map_err(|_| Error::InvalidPrivateKey)?;
                let peer = Self::peer_point(peer_public_key)?;
                let shared = $curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
                Ok(SharedSecret::from_bytes(shared.raw_secret_bytes().to_vec()))
            }

            fn check_public_key(&self, peer_public_key: &[u8]) -> Result<()> {
                Self::peer_point(peer_public_key).map(drop)
            }

            fn algorithm(&self) -> KeyExchangeAlgorithm {
                KeyExchangeAlgorithm::$algorithm
            }
        }
    };
}

nist_ecdh!(EcdhP256, p256, Secp256r1);
nist_ecdh!(EcdhP384, p384, Secp384r1);
