//! SHA-2 hash functions using the `sha2` crate.

use hsneg_crypto::{Hash, HashAlgorithm, Result};
use sha2::Digest;

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    match algorithm {
        HashAlgorithm::Sha256 => Ok(Box::new(Sha2Hash::<sha2::Sha256>::new(algorithm))),
        HashAlgorithm::Sha384 => Ok(Box::new(Sha2Hash::<sha2::Sha384>::new(algorithm))),
        HashAlgorithm::Sha512 => Ok(Box::new(Sha2Hash::<sha2::Sha512>::new(algorithm))),
    }
}

/// A SHA-2 family digest.
struct Sha2Hash<D> {
    hasher: D,
    algorithm: HashAlgorithm,
}

impl<D: Digest> Sha2Hash<D> {
    fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            hasher: D::new(),
            algorithm,
        }
    }
}

impl<D: Digest + Send> Hash for Sha2Hash<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.hasher, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Digest::finalize(self.hasher).to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
        let mut hash = create_hash(algorithm).unwrap();
        hash.update(data);
        hash.finalize()
    }

    #[test]
    fn test_output_sizes() {
        for alg in [HashAlgorithm::Sha256, HashAlgorithm::Sha384, HashAlgorithm::Sha512] {
            assert_eq!(digest(alg, b"").len(), alg.output_size());
            assert_eq!(create_hash(alg).unwrap().output_size(), alg.output_size());
        }
    }

    #[test]
    fn test_sha256_empty() {
        let out = digest(HashAlgorithm::Sha256, b"");
        assert_eq!(&out[..8], &[0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14]);
    }

    #[test]
    fn test_incremental_matches_one_shot() {
        let mut hash = create_hash(HashAlgorithm::Sha384).unwrap();
        hash.update(b"hello ");
        hash.update(b"world");
        assert_eq!(hash.finalize(), digest(HashAlgorithm::Sha384, b"hello world"));
    }
}
