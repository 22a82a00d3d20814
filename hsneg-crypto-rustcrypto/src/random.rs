//! Cryptographically secure random number generation from the OS.

use hsneg_crypto::{Error, Random, Result};
use rand::RngCore;

/// Random number generator backed by `rand::rngs::OsRng`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        rand::rngs::OsRng
            .try_fill_bytes(dest)
            .map_err(|_| Error::RandomGenerationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_generation() {
        let rng = OsRandom;

        let mut buf1 = [0u8; 32];
        let mut buf2 = [0u8; 32];

        rng.fill(&mut buf1).unwrap();
        rng.fill(&mut buf2).unwrap();

        assert_ne!(&buf1[..], &[0u8; 32][..]);
        assert_ne!(&buf1[..], &buf2[..]);
    }

    #[test]
    fn test_generate_length() {
        let rng = OsRandom;
        assert_eq!(rng.generate(64).unwrap().len(), 64);
    }
}
