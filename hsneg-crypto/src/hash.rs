//! Digests for transcripts and HelloRetryRequest cookies.

/// Digest selected by a cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Name as used by algorithm constraints ("sha256", ...).
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha384 => "sha384",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

/// Incremental digest state.
///
/// `finalize` takes the boxed state so a transcript can fork a copy,
/// hash it and keep absorbing into the original.
pub trait Hash: Send {
    /// Absorb `data`.
    fn update(&mut self, data: &[u8]);

    /// Consume the state and return the digest.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Which digest this state computes.
    fn algorithm(&self) -> HashAlgorithm;

    /// Digest length in bytes.
    fn output_size(&self) -> usize {
        self.algorithm().output_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_grow_with_strength() {
        assert!(HashAlgorithm::Sha256.output_size() < HashAlgorithm::Sha384.output_size());
        assert_eq!(HashAlgorithm::Sha512.output_size(), 64);
        assert_eq!(HashAlgorithm::Sha384.name(), "sha384");
    }
}
